//! A small two-metal CMOS technology in a p-type substrate.

use arcstr::ArcStr;

use super::*;

pub const METAL1: LayerId = LayerId(0);
pub const METAL2: LayerId = LayerId(1);
pub const POLY: LayerId = LayerId(2);
pub const GATE_POLY: LayerId = LayerId(3);
pub const NACTIVE: LayerId = LayerId(4);
pub const PACTIVE: LayerId = LayerId(5);
pub const ACTIVE: LayerId = LayerId(6);
pub const NSELECT: LayerId = LayerId(7);
pub const PSELECT: LayerId = LayerId(8);
pub const NWELL: LayerId = LayerId(9);
pub const PWELL: LayerId = LayerId(10);
pub const CONTACT: LayerId = LayerId(11);
pub const VIA1: LayerId = LayerId(12);

fn arc(name: &str, layer: LayerId, min_width: i64) -> ArcProto {
    ArcProto {
        name: name.into(),
        layers: vec![ArcLayer {
            layer,
            width_offset: 0,
        }],
        min_width,
        pin: arcstr::format!("{name}-pin"),
    }
}

fn pin(arc: &ArcProto) -> NodeProto {
    NodeProto {
        name: arc.pin.clone(),
        function: NodeFunction::Pin,
        width: 0,
        height: 0,
        layers: Vec::new(),
        ports: vec![PortProto {
            name: arc.name.clone(),
            insets: [0; 4],
            arcs: vec![arc.name.clone()],
        }],
        multicut: None,
    }
}

fn port(name: &str, insets: [i64; 4], arcs: &[&str]) -> PortProto {
    PortProto {
        name: name.into(),
        insets,
        arcs: arcs.iter().map(|&a| ArcStr::from(a)).collect(),
    }
}

/// A 6 x 6 diffusion contact; `extra` lists the implant and well layers it carries.
fn diff_contact(
    name: &str,
    function: NodeFunction,
    diff: LayerId,
    extra: &[LayerId],
    arcs: &[&str],
) -> NodeProto {
    let mut layers = vec![
        NodeLayer::new(METAL1, [1; 4]),
        NodeLayer::new(diff, [1; 4]),
        NodeLayer::new(CONTACT, [2; 4]),
    ];
    layers.extend(extra.iter().map(|&l| NodeLayer::new(l, [0; 4])));
    NodeProto {
        name: name.into(),
        function,
        width: 6,
        height: 6,
        layers,
        ports: vec![port("con", [1; 4], arcs)],
        multicut: Some(MultiCut {
            size: 2,
            spacing: 2,
            inset: 2,
        }),
    }
}

/// An 8 x 7 transistor with a vertical 2-unit gate over 3 units of diffusion.
fn transistor(name: &str, ty: DiffType, diff: LayerId, extra: &[LayerId], arc: &str) -> NodeProto {
    let mut layers = vec![
        NodeLayer::new(GATE_POLY, [3, 0, 3, 0]),
        NodeLayer::new(diff, [0, 2, 0, 2]),
    ];
    layers.extend(extra.iter().map(|&l| NodeLayer::new(l, [0; 4])));
    NodeProto {
        name: name.into(),
        function: NodeFunction::Transistor(ty),
        width: 8,
        height: 7,
        layers,
        ports: vec![
            port("g", [3, 0, 3, 0], &["polysilicon-1"]),
            port("s", [0, 2, 5, 2], &[arc]),
            port("d", [5, 2, 0, 2], &[arc]),
        ],
        multicut: None,
    }
}

/// Builds the sample technology.
pub fn cmos() -> Technology {
    let layers = vec![
        Layer::new("metal-1", LayerFunction::Metal(1)),
        Layer::new("metal-2", LayerFunction::Metal(2)),
        Layer::new(
            "polysilicon-1",
            LayerFunction::Poly {
                level: 1,
                gate: false,
            },
        ),
        Layer::new(
            "transistor-poly",
            LayerFunction::Poly {
                level: 1,
                gate: true,
            },
        )
        .with_equivalent(POLY),
        Layer::new("n-active", LayerFunction::Diffusion(Some(DiffType::N))),
        Layer::new("p-active", LayerFunction::Diffusion(Some(DiffType::P))),
        Layer::new("active", LayerFunction::Diffusion(None)),
        Layer::new("n-select", LayerFunction::Select(DiffType::N)),
        Layer::new("p-select", LayerFunction::Select(DiffType::P)),
        Layer::new("n-well", LayerFunction::Well(DiffType::N)),
        Layer::new("p-well", LayerFunction::Well(DiffType::P)),
        Layer::new("contact", LayerFunction::Cut(1)),
        Layer::new("via1", LayerFunction::Cut(2)),
    ];

    let arcs = vec![
        arc("metal-1", METAL1, 3),
        arc("metal-2", METAL2, 3),
        arc("polysilicon-1", POLY, 2),
        arc("n-active", NACTIVE, 3),
        arc("p-active", PACTIVE, 3),
    ];

    let mut nodes: Vec<NodeProto> = arcs.iter().map(pin).collect();
    nodes.push(NodeProto {
        name: "metal-1-metal-2-con".into(),
        function: NodeFunction::Contact,
        width: 4,
        height: 4,
        layers: vec![
            NodeLayer::new(METAL1, [0; 4]),
            NodeLayer::new(METAL2, [0; 4]),
            NodeLayer::new(VIA1, [1; 4]),
        ],
        ports: vec![port("via", [1; 4], &["metal-1", "metal-2"])],
        multicut: Some(MultiCut {
            size: 2,
            spacing: 2,
            inset: 1,
        }),
    });
    nodes.push(NodeProto {
        name: "metal-1-polysilicon-1-con".into(),
        function: NodeFunction::Contact,
        width: 4,
        height: 4,
        layers: vec![
            NodeLayer::new(METAL1, [0; 4]),
            NodeLayer::new(POLY, [0; 4]),
            NodeLayer::new(CONTACT, [1; 4]),
        ],
        ports: vec![port("con", [1; 4], &["metal-1", "polysilicon-1"])],
        multicut: Some(MultiCut {
            size: 2,
            spacing: 2,
            inset: 1,
        }),
    });
    nodes.push(diff_contact(
        "metal-1-n-active-con",
        NodeFunction::Contact,
        NACTIVE,
        &[NSELECT],
        &["metal-1", "n-active"],
    ));
    nodes.push(diff_contact(
        "metal-1-p-active-con",
        NodeFunction::Contact,
        PACTIVE,
        &[PSELECT, NWELL],
        &["metal-1", "p-active"],
    ));
    nodes.push(diff_contact(
        "metal-1-n-well-con",
        NodeFunction::WellContact(DiffType::N),
        NACTIVE,
        &[NSELECT, NWELL],
        &["metal-1"],
    ));
    nodes.push(diff_contact(
        "metal-1-p-well-con",
        NodeFunction::WellContact(DiffType::P),
        PACTIVE,
        &[PSELECT, PWELL],
        &["metal-1"],
    ));
    nodes.push(transistor("nmos", DiffType::N, NACTIVE, &[NSELECT], "n-active"));
    nodes.push(transistor(
        "pmos",
        DiffType::P,
        PACTIVE,
        &[PSELECT, NWELL],
        "p-active",
    ));

    Technology {
        name: "sample-cmos".into(),
        layers,
        arcs,
        nodes,
        substrate: DiffType::P,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_constants_match_names() {
        let tech = cmos();
        assert_eq!(tech.layer_named("metal-1"), Some(METAL1));
        assert_eq!(tech.layer_named("transistor-poly"), Some(GATE_POLY));
        assert_eq!(tech.layer_named("via1"), Some(VIA1));
        assert_eq!(tech.diffusion_layer(DiffType::P), Some(PACTIVE));
        assert!(tech.is_implied_well(PWELL));
        assert!(!tech.is_implied_well(NWELL));
    }

    #[test]
    fn every_arc_has_a_pin() {
        let tech = cmos();
        for arc in &tech.arcs {
            assert!(tech.pin_for_arc(arc).is_ok(), "{}", arc.name);
        }
    }

    #[test]
    fn transistor_gate_is_two_by_three() {
        let tech = cmos();
        let nmos = tech.node("nmos").unwrap();
        assert_eq!(nmos.gate_insets(&tech), Some(Sides::new(3, 2, 3, 2)));
    }
}
