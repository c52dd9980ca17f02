//! Per-layer polygon merging.
//!
//! Extraction stages consult and mutate merged geometry only through the
//! [`PolygonMerge`] trait. [`GeoMerge`] implements it with the boolean
//! operations of the `geo` crate.

use std::hash::Hash;

use geo::algorithm::bool_ops::BooleanOps;
use geo::orient::{Direction, Orient};
use geo::{Area, Coord, Intersects, LineString, MultiPolygon};
use geometry::prelude::*;
use indexmap::IndexMap;

/// Absolute area below which a boolean-operation residue counts as empty.
const AREA_EPS: f64 = 1e-3;

/// One connected region of merged geometry, in internal units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRegion {
    /// The outer boundary, counterclockwise.
    pub outline: Polygon,
    /// Holes, each counterclockwise.
    pub holes: Vec<Polygon>,
}

impl MergedRegion {
    pub fn area(&self) -> f64 {
        self.outline.area() - self.holes.iter().map(Polygon::area).sum::<f64>()
    }

    pub fn bbox(&self) -> Option<Rect> {
        self.outline.bbox()
    }

    /// The region as a rectangle, if it is one.
    pub fn as_rect(&self) -> Option<Rect> {
        if self.holes.is_empty() {
            self.outline.as_rect()
        } else {
            None
        }
    }

    /// Every boundary edge, oriented so that the region's interior lies on its left.
    pub fn edges(&self) -> Vec<Edge> {
        let mut out: Vec<Edge> = self.outline.edges().filter(|e| !e.is_degenerate()).collect();
        for hole in &self.holes {
            out.extend(
                hole.edges()
                    .filter(|e| !e.is_degenerate())
                    .map(|e| e.reversed()),
            );
        }
        out
    }

    pub fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            ring(&self.outline),
            self.holes.iter().map(ring).collect(),
        )
    }
}

/// A mapping from layers to merged regions.
pub trait PolygonMerge<L> {
    /// Adds `poly` to the geometry on `layer`.
    fn add(&mut self, layer: L, poly: &Polygon);

    /// Removes `poly` from the geometry on `layer`.
    fn subtract(&mut self, layer: L, poly: &Polygon);

    /// Replaces the geometry on `dest_layer` of `dest` with the intersection of
    /// layers `a` and `b` of `self`.
    fn intersect_into(&self, a: L, b: L, dest: &mut Self, dest_layer: L)
    where
        Self: Sized;

    /// Returns `true` if `poly` lies entirely inside the geometry on `layer`.
    fn contains(&self, layer: L, poly: &Polygon) -> bool;

    /// Returns `true` if `poly` overlaps the geometry on `layer` with positive area.
    fn intersects(&self, layer: L, poly: &Polygon) -> bool;

    /// Enumerates the connected regions on `layer`.
    fn regions(&self, layer: L) -> Vec<MergedRegion>;

    /// The total area on `layer`.
    fn area(&self, layer: L) -> f64;

    /// Layers holding any geometry, in insertion order.
    fn layers(&self) -> Vec<L>;

    /// Returns `true` if `layer` holds no geometry.
    fn is_empty(&self, layer: L) -> bool {
        self.area(layer) <= AREA_EPS
    }
}

/// A [`PolygonMerge`] storing one `geo` multipolygon per layer.
#[derive(Debug, Clone)]
pub struct GeoMerge<L> {
    layers: IndexMap<L, MultiPolygon<f64>>,
}

impl<L> Default for GeoMerge<L> {
    fn default() -> Self {
        Self {
            layers: IndexMap::new(),
        }
    }
}

impl<L: Copy + Eq + Hash> GeoMerge<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a whole region, holes included.
    pub fn add_region(&mut self, layer: L, region: &MergedRegion) {
        let other = MultiPolygon::new(vec![region.to_geo()]);
        self.apply(layer, |cur| cur.union(&other));
    }

    /// Removes every piece of geometry on `layer`.
    pub fn clear(&mut self, layer: L) {
        self.layers.shift_remove(&layer);
    }

    /// The area of the symmetric difference between `layer` of `self` and of `other`.
    pub fn difference_area(&self, other: &Self, layer: L) -> f64 {
        let empty = MultiPolygon::new(Vec::new());
        let a = self.layers.get(&layer).unwrap_or(&empty);
        let b = other.layers.get(&layer).unwrap_or(&empty);
        a.difference(b).unsigned_area() + b.difference(a).unsigned_area()
    }

    /// Regions on `layer` that touch or overlap `poly`.
    pub fn regions_touching(&self, layer: L, poly: &Polygon) -> Vec<MergedRegion> {
        let target = to_geo(poly);
        self.regions(layer)
            .into_iter()
            .filter(|r| r.to_geo().intersects(&target))
            .collect()
    }

    fn apply(&mut self, layer: L, f: impl FnOnce(&MultiPolygon<f64>) -> MultiPolygon<f64>) {
        let cur = self
            .layers
            .entry(layer)
            .or_insert_with(|| MultiPolygon::new(Vec::new()));
        let next = f(cur);
        *cur = next;
    }
}

impl<L: Copy + Eq + Hash> PolygonMerge<L> for GeoMerge<L> {
    fn add(&mut self, layer: L, poly: &Polygon) {
        if poly.area() <= 0. {
            return;
        }
        let other = MultiPolygon::new(vec![to_geo(poly)]);
        self.apply(layer, |cur| cur.union(&other));
    }

    fn subtract(&mut self, layer: L, poly: &Polygon) {
        if poly.area() <= 0. || !self.layers.contains_key(&layer) {
            return;
        }
        let other = MultiPolygon::new(vec![to_geo(poly)]);
        self.apply(layer, |cur| cur.difference(&other));
    }

    fn intersect_into(&self, a: L, b: L, dest: &mut Self, dest_layer: L) {
        let empty = MultiPolygon::new(Vec::new());
        let ga = self.layers.get(&a).unwrap_or(&empty);
        let gb = self.layers.get(&b).unwrap_or(&empty);
        dest.layers.insert(dest_layer, ga.intersection(gb));
    }

    fn contains(&self, layer: L, poly: &Polygon) -> bool {
        let Some(cur) = self.layers.get(&layer) else {
            return false;
        };
        let area = poly.area();
        if area <= 0. {
            return poly
                .points()
                .iter()
                .all(|p| cur.intersects(&coord(*p)));
        }
        let other = MultiPolygon::new(vec![to_geo(poly)]);
        other.difference(cur).unsigned_area() <= AREA_EPS + area * 1e-9
    }

    fn intersects(&self, layer: L, poly: &Polygon) -> bool {
        let Some(cur) = self.layers.get(&layer) else {
            return false;
        };
        if poly.area() <= 0. {
            return false;
        }
        let other = MultiPolygon::new(vec![to_geo(poly)]);
        other.intersection(cur).unsigned_area() > AREA_EPS
    }

    fn regions(&self, layer: L) -> Vec<MergedRegion> {
        let Some(cur) = self.layers.get(&layer) else {
            return Vec::new();
        };
        let mut out: Vec<MergedRegion> = cur
            .0
            .iter()
            .filter(|p| p.unsigned_area() > AREA_EPS)
            .filter_map(from_geo)
            .collect();
        // Boolean operations do not promise a stable output order.
        out.sort_by_key(|r| {
            let b = r.bbox().unwrap_or_default();
            (b.left(), b.bot(), b.right(), b.top())
        });
        out
    }

    fn area(&self, layer: L) -> f64 {
        self.layers
            .get(&layer)
            .map(|m| m.unsigned_area())
            .unwrap_or(0.)
    }

    fn layers(&self) -> Vec<L> {
        self.layers
            .iter()
            .filter(|(_, m)| m.unsigned_area() > AREA_EPS)
            .map(|(l, _)| *l)
            .collect()
    }
}

/// Returns `true` if the two polygons overlap or share boundary points.
pub fn touches(a: &Polygon, b: &Polygon) -> bool {
    to_geo(a).intersects(&to_geo(b))
}

fn coord(p: Point) -> Coord<f64> {
    Coord {
        x: p.x as f64,
        y: p.y as f64,
    }
}

fn ring(poly: &Polygon) -> LineString<f64> {
    LineString::new(poly.points().iter().copied().map(coord).collect())
}

/// Converts a polygon to a hole-free `geo` polygon.
pub fn to_geo(poly: &Polygon) -> geo::Polygon<f64> {
    geo::Polygon::new(ring(poly), Vec::new())
}

fn round_ring(ls: &LineString<f64>) -> Polygon {
    let mut pts: Vec<Point> = ls.coords().map(|c| Point::from_f64(c.x, c.y)).collect();
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    Polygon::from_verts(pts).normalized()
}

fn from_geo(poly: &geo::Polygon<f64>) -> Option<MergedRegion> {
    let poly = poly.orient(Direction::Default);
    let outline = round_ring(poly.exterior());
    if outline.points().len() < 3 {
        return None;
    }
    let holes = poly
        .interiors()
        .iter()
        .map(round_ring)
        .filter(|h| h.points().len() >= 3)
        .collect();
    Some(MergedRegion { outline, holes })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn rect(l: i64, b: i64, r: i64, t: i64) -> Polygon {
        Rect::from_sides(l, b, r, t).to_polygon()
    }

    #[test]
    fn overlapping_rects_merge_into_one_region() {
        let mut merge = GeoMerge::new();
        merge.add(0u8, &rect(0, 0, 100, 10));
        merge.add(0u8, &rect(90, 0, 100, 100));
        let regions = merge.regions(0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].outline.points().len(), 6);
        assert_relative_eq!(merge.area(0), 1000. + 900.);
        assert!(merge.contains(0, &rect(0, 0, 100, 10)));
        assert!(!merge.contains(0, &rect(0, 0, 100, 11)));
    }

    #[test]
    fn subtract_then_add_restores_layer() {
        let mut merge = GeoMerge::new();
        merge.add(1u8, &rect(0, 0, 100, 100));
        merge.add(1u8, &rect(200, 0, 250, 30));
        let before = merge.clone();
        let footprint = rect(20, 20, 60, 60);
        merge.subtract(1, &footprint);
        assert_relative_eq!(merge.area(1), 10000. + 1500. - 1600.);
        assert_eq!(merge.regions(1)[0].holes.len(), 1);
        merge.add(1, &footprint);
        assert!(merge.difference_area(&before, 1) < AREA_EPS);
    }

    #[test]
    fn intersection_goes_to_destination_layer() {
        let mut merge = GeoMerge::new();
        merge.add(0u8, &rect(0, 0, 20, 100));
        merge.add(1u8, &rect(-30, 40, 50, 70));
        let mut scratch = GeoMerge::new();
        merge.intersect_into(0, 1, &mut scratch, 7);
        let regions = scratch.regions(7);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].as_rect(), Some(Rect::from_sides(0, 40, 20, 70)));
    }

    #[test]
    fn touching_is_not_intersecting() {
        let mut merge = GeoMerge::new();
        merge.add(0u8, &rect(0, 0, 10, 10));
        assert!(!merge.intersects(0, &rect(10, 0, 20, 10)));
        assert!(touches(&rect(0, 0, 10, 10), &rect(10, 0, 20, 10)));
        assert_eq!(merge.regions_touching(0, &rect(10, 0, 20, 10)).len(), 1);
        assert!(merge.contains(0, &Polygon::from_verts(vec![Point::new(10, 5)])));
    }

    #[test]
    fn hole_edges_keep_interior_on_the_left() {
        let mut merge = GeoMerge::new();
        merge.add(0u8, &rect(0, 0, 30, 30));
        merge.subtract(0, &rect(10, 10, 20, 20));
        let region = &merge.regions(0)[0];
        for edge in region.edges() {
            let (ux, uy) = edge.unit();
            let mid = edge.point_at(edge.length() / 2.);
            let beside = Point::from_f64(mid.0 - uy, mid.1 + ux);
            assert!(region.to_geo().intersects(&coord(beside)), "{edge:?}");
        }
    }
}
