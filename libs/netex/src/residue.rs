//! Residue: geometry no stage could explain is copied into the output cell as
//! pure-layer shapes.

use geometry::prelude::*;
use layir::{Element, Shape};
use tracing::{span, Level};

use crate::cell::CellState;
use crate::diag::IssueKind;
use crate::error::Result;
use crate::merge::{GeoMerge, MergedRegion, PolygonMerge};
use crate::scale::{polygon_to_external, rect_to_external};
use crate::tech::LayerId;

pub fn extract(state: &mut CellState) -> Result<()> {
    let span = span!(Level::INFO, "residue");
    let _guard = span.enter();

    let mut layers = state.working.layers();
    layers.sort();
    for layer in layers {
        let routable = state.tech().arc_for_layer(layer).is_some();
        for region in state.working.regions(layer) {
            for piece in split_holes(&region) {
                emit(state, layer, &piece);
            }
            let Some(bbox) = region.bbox() else {
                continue;
            };
            if routable && !state.opts().preserve_layers && !state.is_reported(layer, bbox) {
                let name = state.tech().layer_name(layer);
                state.issue(Some(bbox), IssueKind::UnresolvedRegion { layer: name });
            }
        }
    }

    let pending: Vec<(LayerId, Rect)> = state
        .cuts
        .iter()
        .flat_map(|(&layer, index)| index.pending().map(move |c| (layer, c.rect)))
        .collect();
    for (layer, rect) in pending {
        emit(state, layer, &rect.to_polygon());
    }
    let malformed = std::mem::take(&mut state.malformed);
    for (layer, poly) in &malformed {
        emit(state, *layer, poly);
    }
    state.malformed = malformed;

    tracing::debug!(shapes = state.stats.residue, "copied residue");
    Ok(())
}

/// Adds `poly`, given in internal units, to the output cell as a pure-layer shape.
fn emit(state: &mut CellState, layer: LayerId, poly: &Polygon) {
    let shape: geometry::shape::Shape = match poly.as_rect() {
        Some(rect) => rect_to_external(rect).into(),
        None => polygon_to_external(poly).normalized().into(),
    };
    state.cell.add_element(Element::Shape(Shape::new(layer, shape)));
    state.stats.residue += 1;
}

/// Splits a region into hole-free polygons.
///
/// The region is cut into vertical strips at the x-coordinates of its hole
/// vertices. No hole lies strictly inside a strip, so every piece is simple.
pub fn split_holes(region: &MergedRegion) -> Vec<Polygon> {
    if region.holes.is_empty() {
        return vec![region.outline.clone()];
    }
    let Some(bbox) = region.bbox() else {
        return Vec::new();
    };
    let mut xs: Vec<i64> = region
        .holes
        .iter()
        .flat_map(|h| h.points().iter().map(|p| p.x))
        .filter(|&x| x > bbox.left() && x < bbox.right())
        .collect();
    xs.push(bbox.left());
    xs.push(bbox.right());
    xs.sort_unstable();
    xs.dedup();

    const REGION: u8 = 0;
    const STRIP: u8 = 1;
    let mut source = GeoMerge::new();
    source.add_region(REGION, region);
    let mut out = Vec::new();
    for pair in xs.windows(2) {
        let strip = Rect::from_sides(pair[0], bbox.bot(), pair[1], bbox.top());
        source.clear(STRIP);
        source.add(STRIP, &strip.to_polygon());
        let mut piece = GeoMerge::new();
        source.intersect_into(REGION, STRIP, &mut piece, REGION);
        for r in piece.regions(REGION) {
            if !r.holes.is_empty() {
                tracing::warn!(?r, "strip of a holed region still has holes");
            }
            out.push(r.outline);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ring_splits_into_simple_pieces() {
        let mut merge = GeoMerge::new();
        merge.add(0u8, &Rect::from_sides(0, 0, 100, 100).to_polygon());
        merge.subtract(0, &Rect::from_sides(40, 40, 60, 60).to_polygon());
        let region = merge.regions(0).remove(0);
        assert_eq!(region.holes.len(), 1);

        let pieces = split_holes(&region);
        assert_eq!(pieces.len(), 4);
        let total: f64 = pieces.iter().map(Polygon::area).sum();
        assert_relative_eq!(total, region.area(), epsilon = 1e-6);
        assert!(pieces.iter().all(|p| p.as_rect().is_some()));
    }

    #[test]
    fn simple_region_is_unchanged() {
        let region = MergedRegion {
            outline: Rect::from_sides(0, 0, 10, 10).to_polygon(),
            holes: Vec::new(),
        };
        assert_eq!(split_holes(&region), vec![region.outline.clone()]);
    }
}
