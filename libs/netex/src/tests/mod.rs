use geometry::prelude::*;
use layir::{Cell, CellId, Element, Library, LibraryBuilder, Shape};

use crate::layers::LayerMap;
use crate::merge::{GeoMerge, PolygonMerge};
use crate::opts::ExtractOpts;
use crate::progress::NoProgress;
use crate::scale::polygon_to_internal;
use crate::tech::{sample, LayerId, Technology};
use crate::{extract, ExtractResult};

mod bridges;
mod devices;
mod exports;
mod hierarchy;
mod wires;

pub(crate) fn rect(l: i64, b: i64, r: i64, t: i64) -> Rect {
    Rect::from_sides(l, b, r, t)
}

/// A pure-layer cell with the given shapes, in external units.
pub(crate) fn layout(name: &str, shapes: &[(LayerId, Rect)]) -> Cell<LayerId> {
    let mut cell = Cell::new(name);
    for &(layer, r) in shapes {
        cell.add_element(Shape::new(layer, r));
    }
    cell
}

/// Builds a library holding only `cell`.
pub(crate) fn single(cell: Cell<LayerId>) -> (Library<LayerId>, CellId) {
    let mut lib = LibraryBuilder::new();
    let id = lib.add_cell(cell);
    (lib.build().unwrap(), id)
}

pub(crate) fn run(lib: &Library<LayerId>, root: CellId, opts: &ExtractOpts) -> ExtractResult {
    extract(lib, root, &sample::cmos(), opts, &NoProgress).unwrap()
}

pub(crate) fn root_cell(result: &ExtractResult) -> &Cell<LayerId> {
    result.library.try_cell(result.root.unwrap()).unwrap()
}

/// Asserts that every node and wire of `out` lies inside the shapes of `source`.
pub(crate) fn assert_contained(tech: &Technology, source: &Cell<LayerId>, out: &Cell<LayerId>) {
    let map = LayerMap::new(tech);
    let mut original = GeoMerge::new();
    for element in source.elements() {
        if let Element::Shape(s) = element {
            let poly = polygon_to_internal(&s.shape().to_polygon());
            original.add(map.canonical(*s.layer()), &poly);
        }
    }
    let check = |what: &str, shapes: Vec<(LayerId, Polygon)>| {
        for (layer, poly) in shapes {
            if tech.is_implied_well(layer) {
                continue;
            }
            assert!(
                original.contains(map.canonical(layer), &poly),
                "{what} adds area on {}",
                tech.layer_name(layer)
            );
        }
    };
    for (_, node) in out.nodes() {
        check(node.proto(), tech.node_shapes(node).unwrap());
    }
    for (_, wire) in out.wires() {
        check(wire.proto(), tech.wire_shapes(wire).unwrap());
    }
}

/// The number of pure-layer shapes in `cell`.
pub(crate) fn shape_count(cell: &Cell<LayerId>) -> usize {
    cell.elements()
        .filter(|e| matches!(e, Element::Shape(_)))
        .count()
}
