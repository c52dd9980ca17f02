use layir::{Direction, Node, Port, PortAttachment, Terminal};
use test_log::test;

use super::*;
use crate::diag::IssueKind;
use crate::tech::sample::*;

fn exported(cell: &mut Cell<LayerId>, name: &str, layer: LayerId, r: Rect) {
    let mut port = Port::new(Direction::Input);
    port.add_element(Shape::new(layer, r));
    cell.add_port(name, port);
}

#[test]
fn export_moves_to_the_wire_under_it() {
    let mut cell = layout("bar", &[(METAL1, rect(0, 0, 40, 4))]);
    exported(&mut cell, "in", METAL1, rect(0, 0, 4, 4));
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.wires, 1);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    let out = root_cell(&result);
    let port = out.try_port("in").unwrap();
    assert_eq!(port.direction(), Direction::Input);
    assert_eq!(port.elements().count(), 1);

    let attachment = port.attachment().unwrap();
    let Terminal::Node(pin) = attachment.terminal else {
        panic!("export attached to an instance");
    };
    assert_eq!(out.try_node(pin).unwrap().center(), Point::new(20, 20));
}

#[test]
fn unmatched_export_gets_its_own_pin() {
    let mut cell = layout("bar", &[(METAL1, rect(0, 0, 40, 4))]);
    exported(&mut cell, "out", METAL2, rect(100, 100, 104, 104));
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert!(result
        .issues
        .iter()
        .any(|i| i.kind == IssueKind::ExportUnmatched { name: "out".into() }));
    let out = root_cell(&result);
    let attachment = out.try_port("out").unwrap().attachment().unwrap();
    let Terminal::Node(pin) = attachment.terminal else {
        panic!("export attached to an instance");
    };
    let pin = out.try_node(pin).unwrap();
    assert_eq!(pin.proto(), "metal-2-pin");
    assert_eq!(pin.center(), Point::new(1020, 1020));
}

#[test]
fn exported_pin_without_wires_is_kept() {
    let mut cell = Cell::new("lonely");
    let pin = cell.add_node(Node::new("metal-1-pin", Point::new(50, 50), 0, 0));
    cell.add_port(
        "p",
        Port::new(Direction::InOut).with_attachment(PortAttachment::new(pin, "metal-1")),
    );
    let (lib, id) = single(cell);
    let result = run(&lib, id, &ExtractOpts::default());

    assert!(result.issues.is_empty(), "{:?}", result.issues);
    assert_eq!(result.stats.pins, 1);
    let out = root_cell(&result);
    let attachment = out.try_port("p").unwrap().attachment().unwrap();
    let Terminal::Node(pin) = attachment.terminal else {
        panic!("export attached to an instance");
    };
    assert_eq!(out.try_node(pin).unwrap().center(), Point::new(50, 50));
    assert_eq!(attachment.port.as_str(), "metal-1");
}
