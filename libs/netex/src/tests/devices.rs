use test_log::test;

use super::*;
use crate::diag::{IssueKind, RejectReason};
use crate::tech::sample::*;

/// An n-channel transistor with a 2 x 4 gate centered at (0, 2), drawing its
/// diffusion on `diff`.
fn nmos(diff: LayerId) -> Vec<(LayerId, Rect)> {
    vec![
        (POLY, rect(-1, -2, 1, 6)),
        (diff, rect(-4, 0, 4, 4)),
        (NSELECT, rect(-4, -2, 4, 6)),
    ]
}

#[test]
fn gate_over_diffusion_becomes_a_transistor() {
    let (lib, id) = single(layout("nmos", &nmos(NACTIVE)));
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.transistors, 1);
    assert_eq!(result.stats.residue, 0);
    assert!(result.issues.is_empty(), "{:?}", result.issues);

    let out = root_cell(&result);
    let (_, node) = out.nodes().next().unwrap();
    assert_eq!(node.proto(), "nmos");
    assert_eq!(node.center(), Point::new(0, 20));
    assert_eq!(node.size(), (80, 80));
    assert_contained(&sample::cmos(), lib.try_cell(id).unwrap(), out);
}

#[test]
fn select_layer_types_plain_diffusion() {
    let (lib, id) = single(layout("nmos", &nmos(ACTIVE)));
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.transistors, 1);
    assert_eq!(result.stats.residue, 0);
}

#[test]
fn transistor_in_opposite_well_is_rejected() {
    let mut shapes = nmos(NACTIVE);
    shapes.push((NWELL, rect(-6, -4, 6, 8)));
    let (lib, id) = single(layout("nmos", &shapes));
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.transistors, 0);
    let reasons = result
        .issues
        .iter()
        .find_map(|i| match &i.kind {
            IssueKind::UnresolvedTransistor { reasons } => Some(reasons.clone()),
            _ => None,
        })
        .unwrap();
    assert!(reasons
        .iter()
        .any(|r| matches!(r.reason, RejectReason::OppositeWell { .. })));
}

#[test]
fn bent_gate_becomes_a_traced_transistor() {
    // The poly turns a corner over the diffusion and runs two units past it.
    let shapes = [
        (POLY, rect(-1, -2, 1, 11)),
        (POLY, rect(-1, 9, 16, 11)),
        (NACTIVE, rect(-4, 0, 14, 14)),
        (NSELECT, rect(-5, -3, 17, 15)),
    ];
    let (lib, id) = single(layout("bent", &shapes));
    let result = run(&lib, id, &ExtractOpts::default());

    assert_eq!(result.stats.transistors, 1);
    assert!(!result
        .issues
        .iter()
        .any(|i| matches!(i.kind, IssueKind::UnresolvedTransistor { .. })));

    let out = root_cell(&result);
    let node = out
        .nodes()
        .map(|(_, n)| n)
        .find(|n| n.proto() == "nmos")
        .unwrap();
    let mut trace = node.trace().unwrap().to_vec();
    if trace[0] == Point::new(0, 0) {
        trace.reverse();
    }
    assert_eq!(
        trace,
        vec![Point::new(140, 100), Point::new(0, 100), Point::new(0, 0)]
    );
    assert_eq!(node.size().0, 20);
    assert_contained(&sample::cmos(), lib.try_cell(id).unwrap(), out);
}
