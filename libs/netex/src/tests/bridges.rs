use layir::{Direction, Instance, Port, Terminal};
use test_log::test;

use super::*;
use crate::diag::IssueKind;
use crate::tech::sample::*;

fn pad() -> Cell<LayerId> {
    let mut cell = layout("pad", &[(METAL1, rect(-2, -2, 2, 2))]);
    let mut port = Port::new(Direction::InOut);
    port.add_element(Shape::new(METAL1, rect(-2, -2, 2, 2)));
    cell.add_port("a", port);
    cell
}

/// A via over a pad, centered at `(x, y)`.
fn via_stack(x: i64, y: i64) -> [(LayerId, Rect); 3] {
    [
        (METAL1, rect(x - 2, y - 2, x + 2, y + 2)),
        (METAL2, rect(x - 2, y - 2, x + 2, y + 2)),
        (VIA1, rect(x - 1, y - 1, x + 1, y + 1)),
    ]
}

/// A top cell holding `shapes` and one pad instance per entry of `pads`.
fn with_pads(shapes: &[(LayerId, Rect)], pads: &[(&str, i64, i64)]) -> (Library<LayerId>, CellId) {
    let mut lib = LibraryBuilder::new();
    let pad = lib.add_cell(pad());
    let mut top = layout("top", shapes);
    for &(name, dx, dy) in pads {
        top.add_instance(Instance::with_transformation(
            pad,
            name,
            Transformation::translate(dx, dy),
        ));
    }
    let top = lib.add_cell(top);
    (lib.build().unwrap(), top)
}

#[test]
fn scrap_on_a_wire_end_gets_a_stub() {
    // The scrap hangs under the right end of the bar, too short for a wire of its own.
    let cell = layout(
        "stub",
        &[(METAL1, rect(0, 0, 14, 4)), (METAL1, rect(10, -2, 14, 0))],
    );
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.bridges, 1);
    assert_eq!(result.stats.wires, 2);
    assert_eq!(result.stats.residue, 0);
    assert!(result.issues.is_empty(), "{:?}", result.issues);

    let out = root_cell(&result);
    let stub = out
        .wires()
        .map(|(_, w)| w)
        .find(|w| w.ends().iter().any(|e| e.location() == Point::new(120, -20)))
        .unwrap();
    assert_eq!(stub.width(), 40);
    assert!(stub.ends().iter().any(|e| e.location() == Point::new(120, 20)));
    assert_contained(&sample::cmos(), lib.try_cell(id).unwrap(), out);
}

#[test]
fn aligned_ports_are_joined_by_one_wire() {
    let mut shapes = vec![(METAL1, rect(2, -2, 4, 2))];
    shapes.extend(via_stack(0, 0));
    shapes.extend(via_stack(6, 0));
    let (lib, top) = with_pads(&shapes, &[("l", 0, 0), ("r", 6, 0)]);
    let result = run(&lib, top, &ExtractOpts::default());

    assert_eq!(result.stats.contacts, 2);
    assert_eq!(result.stats.bridges, 1);
    assert_eq!(result.stats.wires, 1);
    assert_eq!(result.stats.pins, 0);
    assert_eq!(result.stats.residue, 0);
    assert!(result.issues.is_empty(), "{:?}", result.issues);

    let out = root_cell(&result);
    let (_, wire) = out.wires().next().unwrap();
    let mut ends: Vec<Point> = wire.ends().iter().map(|e| e.location()).collect();
    ends.sort_by_key(|p| p.x);
    assert_eq!(ends, vec![Point::new(0, 0), Point::new(60, 0)]);
    let pads: Vec<Terminal> = out.instances().map(|(id, _)| Terminal::Instance(id)).collect();
    let mut joined: Vec<Terminal> = wire.ends().iter().map(|e| e.terminal()).collect();
    joined.retain(|t| pads.contains(t));
    joined.dedup();
    assert_eq!(joined.len(), 2);
    assert_contained(&sample::cmos(), lib.try_cell(top).unwrap(), out);
}

#[test]
fn misaligned_ports_are_joined_through_a_corner_pin() {
    // Without centerline passes every leftover region reaches the bridging stage.
    let opts = ExtractOpts {
        max_centerline_passes: 0,
        ..Default::default()
    };
    let shapes = [(METAL1, rect(-2, -2, 2, 8)), (METAL1, rect(-2, 4, 8, 8))];
    let (lib, top) = with_pads(&shapes, &[("l", 0, 0), ("r", 6, 6)]);
    let result = run(&lib, top, &opts);

    assert_eq!(result.stats.bridges, 1);
    assert_eq!(result.stats.wires, 2);
    assert_eq!(result.stats.pins, 1);
    assert_eq!(result.stats.residue, 0);

    let out = root_cell(&result);
    let (pin, node) = out.nodes().next().unwrap();
    assert_eq!(node.center(), Point::new(0, 60));
    for (_, wire) in out.wires() {
        assert_eq!(wire.width(), 40);
        assert!(wire.ends().iter().any(|e| e.terminal() == Terminal::Node(pin)));
    }
    assert_contained(&sample::cmos(), lib.try_cell(top).unwrap(), out);
}

#[test]
fn bridge_leaving_the_layout_is_refused() {
    // The right pad sits one unit higher, so neither bend stays on metal.
    let mut shapes = vec![(METAL1, rect(2, -2, 4, 2))];
    shapes.extend(via_stack(0, 0));
    shapes.extend(via_stack(6, 1));
    let (lib, top) = with_pads(&shapes, &[("l", 0, 0), ("r", 6, 1)]);
    let result = run(&lib, top, &ExtractOpts::default());

    assert_eq!(result.stats.contacts, 2);
    assert_eq!(result.stats.bridges, 0);
    assert_eq!(result.stats.wires, 0);
    assert_eq!(result.stats.residue, 1);
    let out = root_cell(&result);
    assert_eq!(out.wires().count(), 0);
    assert_contained(&sample::cmos(), lib.try_cell(top).unwrap(), out);
}

#[test]
fn scrap_touching_three_networks_is_left_alone() {
    let mut lib = LibraryBuilder::new();
    let pad = lib.add_cell(pad());
    // A 2 x 2 scrap of metal, too narrow for a wire, with a pad on three sides.
    let mut top = layout("top", &[(METAL1, rect(0, 0, 2, 2))]);
    for (name, dx, dy) in [("w", -2, 1), ("e", 4, 1), ("n", 1, 4)] {
        top.add_instance(Instance::with_transformation(
            pad,
            name,
            Transformation::translate(dx, dy),
        ));
    }
    let top = lib.add_cell(top);
    let lib = lib.build().unwrap();
    let result = run(&lib, top, &ExtractOpts::default());

    assert_eq!(result.stats.wires, 0);
    assert_eq!(result.stats.bridges, 0);
    assert_eq!(result.stats.residue, 1);
    let ambiguous: Vec<_> = result
        .issues
        .iter()
        .filter(|i| matches!(i.kind, IssueKind::AmbiguousBridge { .. }))
        .collect();
    assert_eq!(ambiguous.len(), 1);
    assert_eq!(ambiguous[0].kind, IssueKind::AmbiguousBridge { networks: 3 });
    assert_eq!(ambiguous[0].location, Some(rect(0, 0, 2, 2)));
    assert!(!result
        .issues
        .iter()
        .any(|i| matches!(i.kind, IssueKind::UnresolvedRegion { .. })));
}
