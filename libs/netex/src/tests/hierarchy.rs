use layir::{Direction, Instance, Node, Port, Terminal};
use test_log::test;

use super::*;
use crate::diag::IssueKind;
use crate::progress::{CancelFlag, NoProgress};
use crate::tech::sample::*;
use crate::Outcome;

fn via_cell(name: &str) -> Cell<LayerId> {
    let mut cell = layout(
        name,
        &[
            (METAL1, rect(-2, -2, 2, 2)),
            (METAL2, rect(-2, -2, 2, 2)),
            (VIA1, rect(-1, -1, 1, 1)),
        ],
    );
    let mut port = Port::new(Direction::InOut);
    port.add_element(Shape::new(METAL1, rect(-2, -2, 2, 2)));
    cell.add_port("a", port);
    cell
}

/// A top cell with two instances of a via cell named `child`.
fn two_vias(child: &str) -> (Library<LayerId>, CellId, CellId) {
    let mut lib = LibraryBuilder::new();
    let via = lib.add_cell(via_cell(child));
    let mut top = Cell::new("top");
    top.add_instance(Instance::new(via, "v0"));
    top.add_instance(Instance::with_transformation(
        via,
        "v1",
        Transformation::translate(20, 0),
    ));
    let top = lib.add_cell(top);
    (lib.build().unwrap(), top, via)
}

#[test]
fn kept_sub_cell_is_extracted_once() {
    let (lib, top, via) = two_vias("via");
    let opts = ExtractOpts {
        recursive: true,
        ..Default::default()
    };
    let result = run(&lib, top, &opts);

    assert!(result.is_complete());
    assert_eq!(result.stats.cells_total, 2);
    assert_eq!(result.stats.cells_processed, 2);
    assert_eq!(result.stats.contacts, 1);
    assert_eq!(result.cells.len(), 2);

    let out_via = result.cells[&via];
    let out_top = root_cell(&result);
    assert_eq!(out_top.instances().count(), 2);
    assert!(out_top.instances().all(|(_, i)| i.child() == out_via));
    assert_eq!(
        out_top.try_instance_named("v1").unwrap().transformation(),
        Transformation::translate(20, 0)
    );

    let extracted = result.library.try_cell(out_via).unwrap();
    let attachment = extracted.try_port("a").unwrap().attachment().unwrap();
    assert!(matches!(attachment.terminal, Terminal::Node(_)));
    assert_eq!(attachment.port.as_str(), "via");
}

#[test]
fn sub_cells_are_copied_unless_recursive() {
    let (lib, top, via) = two_vias("via");
    let result = run(&lib, top, &ExtractOpts::default());

    assert_eq!(result.stats.cells_processed, 1);
    assert_eq!(result.stats.contacts, 0);
    let copied = result.library.try_cell(result.cells[&via]).unwrap();
    assert_eq!(shape_count(copied), 3);
    assert_eq!(copied.nodes().count(), 0);
    assert_eq!(root_cell(&result).instances().count(), 2);
}

#[test]
fn matching_sub_cells_are_flattened() {
    let (lib, top, via) = two_vias("via");
    let opts = ExtractOpts {
        flatten: vec!["^via$".into()],
        ..Default::default()
    };
    let result = run(&lib, top, &opts);

    assert_eq!(result.stats.cells_processed, 1);
    assert_eq!(result.stats.contacts, 2);
    assert!(!result.cells.contains_key(&via));
    let out = root_cell(&result);
    assert_eq!(out.instances().count(), 0);
    let mut centers: Vec<Point> = out.nodes().map(|(_, n)| n.center()).collect();
    centers.sort();
    assert_eq!(centers, vec![Point::new(0, 0), Point::new(200, 0)]);
    assert_contained(&sample::cmos(), &flat(&lib, top), out);
}

#[test]
fn parametric_cells_can_be_flattened() {
    let (lib, top, _) = two_vias("via$3");
    let opts = ExtractOpts {
        flatten_pcells: true,
        ..Default::default()
    };
    let result = run(&lib, top, &opts);
    assert_eq!(result.stats.contacts, 2);
}

#[test]
fn cancellation_aborts_the_run() {
    let (lib, top, _) = two_vias("via");
    let flag = CancelFlag::new();
    flag.cancel();
    let result = extract(&lib, top, &sample::cmos(), &ExtractOpts::default(), &flag).unwrap();

    assert_eq!(result.outcome, Outcome::Aborted);
    assert!(!result.is_complete());
    assert_eq!(result.root, None);
    assert_eq!(result.stats.cells_processed, 0);
}

/// A top cell holding `bad` and a via cell named `good` side by side.
fn siblings(bad: Cell<LayerId>) -> (Library<LayerId>, CellId, CellId) {
    let mut lib = LibraryBuilder::new();
    let bad = lib.add_cell(bad);
    let good = lib.add_cell(via_cell("good"));
    let mut top = Cell::new("top");
    top.add_instance(Instance::new(bad, "b"));
    top.add_instance(Instance::with_transformation(
        good,
        "g",
        Transformation::translate(100, 0),
    ));
    let top = lib.add_cell(top);
    (lib.build().unwrap(), top, good)
}

#[test]
fn unknown_prototypes_are_skipped() {
    let mut bad = via_cell("bad");
    bad.add_node(Node::new("no-such-node", Point::new(0, 0), 40, 40));
    let (lib, top, good) = siblings(bad);
    let opts = ExtractOpts {
        recursive: true,
        ..Default::default()
    };
    let result = run(&lib, top, &opts);

    assert!(result.is_complete());
    assert_eq!(result.stats.cells_processed, 3);
    assert_eq!(result.stats.contacts, 2);
    assert_eq!(result.num_errors(), 0);
    let skipped: Vec<_> = result
        .issues
        .iter()
        .filter(|i| matches!(i.kind, IssueKind::SkippedElement { .. }))
        .collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].cell.as_str(), "bad");
    let extracted = result.library.try_cell(result.cells[&good]).unwrap();
    assert_eq!(extracted.nodes().count(), 1);
}

#[test]
fn failed_cell_does_not_stop_its_siblings() {
    // Without a metal-2 pin, no wire can end in open metal-2.
    let mut tech = sample::cmos();
    tech.nodes.retain(|n| n.name != "metal-2-pin");
    let (lib, top, good) = siblings(layout("bad", &[(METAL2, rect(0, 0, 40, 4))]));
    let opts = ExtractOpts {
        recursive: true,
        ..Default::default()
    };
    let result = extract(&lib, top, &tech, &opts, &NoProgress).unwrap();

    assert!(result.is_complete());
    assert_eq!(result.stats.cells_processed, 3);
    assert_eq!(result.stats.contacts, 1);
    assert!(result.issues.iter().any(|i| i.cell.as_str() == "bad"
        && matches!(&i.kind, IssueKind::Invariant { message } if message.contains("metal-2"))));
    assert!(result.issues.iter().any(|i| i.cell.as_str() == "top"
        && i.kind == IssueKind::ChildFailed { child: "bad".into() }));
    let extracted = result.library.try_cell(result.cells[&good]).unwrap();
    assert_eq!(extracted.nodes().count(), 1);
    assert!(root_cell(&result).instances().count() == 2);
}

/// The shapes of `top` with its sub-cells flattened, for containment checks.
fn flat(lib: &Library<LayerId>, top: CellId) -> Cell<LayerId> {
    let mut out = Cell::new("flat");
    for (_, inst) in lib.try_cell(top).unwrap().instances() {
        for element in lib.try_cell(inst.child()).unwrap().elements() {
            if let Element::Shape(s) = element {
                let shape = s.shape().clone().transform(inst.transformation());
                out.add_element(Shape::new(*s.layer(), shape));
            }
        }
    }
    out
}
