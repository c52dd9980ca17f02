use layir::Terminal;
use test_log::test;

use super::*;
use crate::tech::sample::*;

#[test]
fn l_shaped_metal_becomes_two_wires() {
    let cell = layout(
        "l",
        &[(METAL1, rect(0, 0, 40, 4)), (METAL1, rect(36, 0, 40, 40))],
    );
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.wires, 2);
    assert_eq!(result.stats.pins, 3);
    assert_eq!(result.stats.residue, 0);
    assert!(result.issues.is_empty(), "{:?}", result.issues);

    let out = root_cell(&result);
    let wires: Vec<_> = out.wires().map(|(_, w)| w.clone()).collect();
    assert!(wires.iter().all(|w| w.width() == 40));
    // Both wires end on the pin at the corner.
    let corner = Point::new(380, 20);
    let shared: Vec<Terminal> = wires
        .iter()
        .map(|w| {
            w.ends()
                .iter()
                .find(|e| e.location() == corner)
                .map(|e| e.terminal())
                .unwrap()
        })
        .collect();
    assert_eq!(shared[0], shared[1]);
    assert_contained(&sample::cmos(), lib.try_cell(id).unwrap(), out);
}

#[test]
fn odd_width_bar_is_centered_between_units() {
    let cell = layout("odd", &[(METAL1, rect(0, 0, 40, 3))]);
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.wires, 1);
    assert_eq!(result.stats.pins, 2);
    assert_eq!(result.stats.residue, 0);
    assert!(result.issues.is_empty(), "{:?}", result.issues);

    let out = root_cell(&result);
    let (_, wire) = out.wires().next().unwrap();
    assert_eq!(wire.width(), 30);
    let mut ends: Vec<Point> = wire.ends().iter().map(|e| e.location()).collect();
    ends.sort_by_key(|p| p.x);
    assert_eq!(ends, vec![Point::new(15, 15), Point::new(385, 15)]);
    assert_contained(&sample::cmos(), lib.try_cell(id).unwrap(), out);
}

#[test]
fn odd_width_corner_shares_one_pin() {
    let cell = layout(
        "odd-l",
        &[(METAL1, rect(0, 0, 40, 3)), (METAL1, rect(37, 0, 40, 40))],
    );
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.wires, 2);
    assert_eq!(result.stats.pins, 3);
    assert_eq!(result.stats.residue, 0);
    assert!(result.issues.is_empty(), "{:?}", result.issues);

    let out = root_cell(&result);
    let corner = Point::new(385, 15);
    let shared: Vec<Terminal> = out
        .wires()
        .map(|(_, w)| {
            assert_eq!(w.width(), 30);
            w.ends()
                .iter()
                .find(|e| e.location() == corner)
                .map(|e| e.terminal())
                .unwrap()
        })
        .collect();
    assert_eq!(shared.len(), 2);
    assert_eq!(shared[0], shared[1]);
    assert_contained(&sample::cmos(), lib.try_cell(id).unwrap(), out);
}

#[test]
fn wire_ends_on_the_contact_it_runs_into() {
    let cell = layout(
        "tail",
        &[
            (METAL1, rect(-2, -2, 30, 2)),
            (METAL2, rect(-2, -2, 2, 2)),
            (VIA1, rect(-1, -1, 1, 1)),
        ],
    );
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.contacts, 1);
    assert_eq!(result.stats.wires, 1);
    assert_eq!(result.stats.pins, 1);
    assert_eq!(result.stats.residue, 0);

    let out = root_cell(&result);
    let (contact, _) = out.nodes().next().unwrap();
    let (_, wire) = out.wires().next().unwrap();
    assert!(wire
        .ends()
        .iter()
        .any(|e| e.terminal() == Terminal::Node(contact)));
    assert_contained(&sample::cmos(), lib.try_cell(id).unwrap(), out);
}

#[test]
fn preserved_layers_are_copied_as_shapes() {
    let cell = layout(
        "bar",
        &[(METAL1, rect(0, 0, 40, 4)), (METAL2, rect(0, 10, 4, 40))],
    );
    let (lib, id) = single(cell);
    let opts = ExtractOpts {
        preserve_layers: true,
        ..Default::default()
    };
    let result = run(&lib, id, &opts);

    assert_eq!(result.stats.wires, 0);
    assert_eq!(result.stats.residue, 2);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    let out = root_cell(&result);
    assert_eq!(shape_count(out), 2);
    assert!(out.elements().any(|e| match e {
        Element::Shape(s) => *s.layer() == METAL1 && s.shape().rect() == Some(rect(0, 0, 40, 4)),
        Element::Text(_) => false,
    }));
}

#[test]
fn extraction_is_deterministic() {
    let cell = layout(
        "mixed",
        &[
            (METAL1, rect(-2, -2, 30, 2)),
            (METAL1, rect(26, -2, 30, 30)),
            (METAL2, rect(-2, -2, 2, 2)),
            (VIA1, rect(-1, -1, 1, 1)),
        ],
    );
    let (lib, id) = single(cell);
    let describe = |result: &ExtractResult| {
        let out = root_cell(result);
        let nodes: Vec<_> = out.nodes().map(|(_, n)| format!("{n:?}")).collect();
        let wires: Vec<_> = out.wires().map(|(_, w)| format!("{w:?}")).collect();
        (nodes, wires, result.stats)
    };
    let first = describe(&run(&lib, id, &ExtractOpts::default()));
    let second = describe(&run(&lib, id, &ExtractOpts::default()));
    assert_eq!(first, second);
    assert!(!first.1.is_empty());
}
