//! Candidate contact and transistor templates derived from node prototypes.
//!
//! Templates are expressed in internal units relative to a reference box: the
//! cut (or cut array) for contacts, the gate region for transistors. Each
//! prototype yields up to four rotated variants, see [`variants`].

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexMap;

use crate::layers::LayerMap;
use crate::scale::to_internal;
use crate::tech::{
    DiffType, LayerFunction, LayerId, MultiCut, NodeFunction, NodeLayer, NodeProto, Technology,
};

/// A layer a template requires, as a per-side distance from the reference box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLayer {
    /// Canonical layer.
    pub layer: LayerId,
    /// How far the layer extends past each side of the reference box.
    pub surround: Sides<i64>,
}

impl TemplateLayer {
    /// The layer's rectangle around reference box `reference`.
    pub fn rect(&self, reference: Rect) -> Option<Rect> {
        reference.expand_sides(self.surround)
    }
}

/// Geometry shared by contact and transistor templates: a body and its layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Distance from each side of the reference box to the node body.
    pub body: Sides<i64>,
    pub layers: Vec<TemplateLayer>,
}

impl Frame {
    fn rotated(&self, rotation: Rotation) -> Self {
        Self {
            body: self.body.rotate(rotation),
            layers: self
                .layers
                .iter()
                .map(|l| TemplateLayer {
                    layer: l.layer,
                    surround: l.surround.rotate(rotation),
                })
                .collect(),
        }
    }
}

/// Returns the rotations under which `frame` yields distinct templates.
///
/// `square_reference` tells whether the reference box is square, in which case
/// a quarter turn of a symmetric frame reproduces the unrotated template.
///
/// ```
/// # use netex::template::{variants, Frame};
/// # use geometry::prelude::*;
/// let square = Frame { body: Sides::uniform(10), layers: vec![] };
/// assert_eq!(variants(&square, true), vec![Rotation::R0]);
/// assert_eq!(variants(&square, false), vec![Rotation::R0, Rotation::R90]);
/// let long = Frame { body: Sides::new(10, 0, 10, 0), layers: vec![] };
/// assert_eq!(variants(&long, true), vec![Rotation::R0, Rotation::R90]);
/// let lopsided = Frame { body: Sides::new(10, 0, 5, 0), layers: vec![] };
/// assert_eq!(variants(&lopsided, true).len(), 4);
/// ```
pub fn variants(frame: &Frame, square_reference: bool) -> Vec<Rotation> {
    let mut seen: Vec<(Frame, bool)> = Vec::new();
    Rotation::ALL
        .into_iter()
        .filter(|&r| {
            let key = (frame.rotated(r), r.is_transposing() && !square_reference);
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        })
        .collect()
}

/// A contact template for one rotation of a contact prototype.
#[derive(Debug, Clone)]
pub struct ContactTemplate {
    pub proto: ArcStr,
    pub function: NodeFunction,
    /// Canonical cut layer.
    pub cut_layer: LayerId,
    /// Cut width and height in this rotation.
    pub cut_size: (i64, i64),
    pub multicut: Option<MultiCut>,
    /// Body and non-cut layers, relative to the cut (or cut array) bounding box.
    pub frame: Frame,
    /// Canonical layers that must not appear under the cut.
    pub forbidden: Vec<LayerId>,
    pub rotation: Rotation,
    /// Default body area, used for ordering.
    pub area: i128,
    /// Default body size, unrotated.
    pub default_size: (i64, i64),
}

/// A transistor template for one rotation of a transistor prototype.
#[derive(Debug, Clone)]
pub struct TransistorTemplate {
    pub proto: ArcStr,
    pub ty: DiffType,
    pub gate_layer: LayerId,
    pub diff_layer: LayerId,
    /// Body and layers relative to the gate region.
    pub frame: Frame,
    pub rotation: Rotation,
    /// Minimum gate length (across the poly) and width (along it), unrotated.
    pub min_gate: (i64, i64),
    pub complexity: usize,
    pub area: i128,
}

/// Every template of a technology, in matching order.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    /// Contact templates per canonical cut layer, largest area first.
    pub contacts: IndexMap<LayerId, Vec<ContactTemplate>>,
    /// Transistor templates, most layers first, then largest first.
    pub transistors: Vec<TransistorTemplate>,
}

impl Templates {
    pub fn new(tech: &Technology, map: &LayerMap) -> Self {
        let mut contacts: IndexMap<LayerId, Vec<ContactTemplate>> = IndexMap::new();
        let mut transistors = Vec::new();
        for proto in &tech.nodes {
            match proto.function {
                NodeFunction::Contact | NodeFunction::WellContact(_) => {
                    if let Some((cut, base)) = contact_base(tech, map, proto) {
                        contacts.entry(cut).or_default().extend(base);
                    }
                }
                NodeFunction::Transistor(ty) => {
                    transistors.extend(transistor_base(tech, map, proto, ty));
                }
                NodeFunction::Pin => {}
            }
        }

        for group in contacts.values_mut() {
            let mut all: Vec<LayerId> = group
                .iter()
                .flat_map(|t| t.frame.layers.iter().map(|l| l.layer))
                .collect();
            all.sort();
            all.dedup();
            for t in group.iter_mut() {
                t.forbidden = all
                    .iter()
                    .copied()
                    .filter(|l| !t.frame.layers.iter().any(|tl| tl.layer == *l))
                    .collect();
            }
            group.sort_by(|a, b| {
                b.area
                    .cmp(&a.area)
                    .then_with(|| a.proto.cmp(&b.proto))
                    .then_with(|| a.rotation.cmp(&b.rotation))
            });
        }
        transistors.sort_by(|a: &TransistorTemplate, b| {
            b.complexity
                .cmp(&a.complexity)
                .then_with(|| b.area.cmp(&a.area))
                .then_with(|| a.proto.cmp(&b.proto))
                .then_with(|| a.rotation.cmp(&b.rotation))
        });

        Self {
            contacts,
            transistors,
        }
    }

    pub fn contacts_for(&self, cut_layer: LayerId) -> &[ContactTemplate] {
        self.contacts
            .get(&cut_layer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn insets(proto_layer: &NodeLayer) -> Sides<i64> {
    proto_layer.sides().map(|_, v| to_internal(v))
}

fn contact_base(
    tech: &Technology,
    map: &LayerMap,
    proto: &NodeProto,
) -> Option<(LayerId, Vec<ContactTemplate>)> {
    let cut = proto
        .layers
        .iter()
        .find(|l| tech.layer_function(l.layer).is_cut())?;
    let cut_insets = insets(cut);
    let w = to_internal(proto.width);
    let h = to_internal(proto.height);
    let cut_size = (
        w - cut_insets[Side::Left] - cut_insets[Side::Right],
        h - cut_insets[Side::Bot] - cut_insets[Side::Top],
    );
    let layers = proto
        .layers
        .iter()
        .filter(|l| !tech.layer_function(l.layer).is_cut() && !tech.is_implied_well(l.layer))
        .map(|l| {
            let li = insets(l);
            TemplateLayer {
                layer: map.canonical(l.layer),
                surround: Sides::new(
                    cut_insets[Side::Left] - li[Side::Left],
                    cut_insets[Side::Bot] - li[Side::Bot],
                    cut_insets[Side::Right] - li[Side::Right],
                    cut_insets[Side::Top] - li[Side::Top],
                ),
            }
        })
        .collect();
    let frame = Frame {
        body: cut_insets,
        layers,
    };
    let multicut = proto.multicut.map(|m| m.scaled(crate::scale::SCALE));
    let square_cut = cut_size.0 == cut_size.1;
    let out = variants(&frame, square_cut)
        .into_iter()
        .map(|rotation| ContactTemplate {
            proto: proto.name.clone(),
            function: proto.function,
            cut_layer: map.canonical(cut.layer),
            cut_size: if rotation.is_transposing() {
                (cut_size.1, cut_size.0)
            } else {
                cut_size
            },
            multicut,
            frame: frame.rotated(rotation),
            forbidden: Vec::new(),
            rotation,
            area: w as i128 * h as i128,
            default_size: (w, h),
        })
        .collect();
    Some((map.canonical(cut.layer), out))
}

fn transistor_base(
    tech: &Technology,
    map: &LayerMap,
    proto: &NodeProto,
    ty: DiffType,
) -> Vec<TransistorTemplate> {
    let Some(gate) = proto.gate_insets(tech) else {
        return Vec::new();
    };
    let gate = gate.map(|_, v| to_internal(v));
    let poly = proto.layer_where(tech, |f| matches!(f, LayerFunction::Poly { .. }));
    let diff = proto.layer_where(tech, |f| matches!(f, LayerFunction::Diffusion(_)));
    let (Some(poly), Some(diff)) = (poly, diff) else {
        return Vec::new();
    };
    let w = to_internal(proto.width);
    let h = to_internal(proto.height);
    let layers: Vec<TemplateLayer> = proto
        .layers
        .iter()
        .filter(|l| !tech.is_implied_well(l.layer))
        .map(|l| {
            let li = insets(l);
            TemplateLayer {
                layer: map.canonical(l.layer),
                surround: Sides::new(
                    gate[Side::Left] - li[Side::Left],
                    gate[Side::Bot] - li[Side::Bot],
                    gate[Side::Right] - li[Side::Right],
                    gate[Side::Top] - li[Side::Top],
                ),
            }
        })
        .collect();
    let frame = Frame { body: gate, layers };
    let min_gate = (
        w - gate[Side::Left] - gate[Side::Right],
        h - gate[Side::Bot] - gate[Side::Top],
    );
    Rotation::ALL
        .into_iter()
        .map(|rotation| TransistorTemplate {
            proto: proto.name.clone(),
            ty,
            gate_layer: map.canonical(poly.layer),
            diff_layer: map.canonical(diff.layer),
            frame: frame.rotated(rotation),
            rotation,
            min_gate,
            complexity: frame.layers.len(),
            area: w as i128 * h as i128,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tech::sample::{self, *};

    fn templates() -> Templates {
        let tech = sample::cmos();
        let map = LayerMap::new(&tech);
        Templates::new(&tech, &map)
    }

    #[test]
    fn square_via_has_one_variant() {
        let t = templates();
        let vias = t.contacts_for(VIA1);
        assert_eq!(vias.len(), 1);
        assert_eq!(vias[0].rotation, Rotation::R0);
        assert_eq!(vias[0].cut_size, (20, 20));
        assert_eq!(vias[0].frame.body, Sides::uniform(10));
        assert!(vias[0]
            .frame
            .layers
            .iter()
            .all(|l| l.surround == Sides::uniform(10)));
    }

    #[test]
    fn contacts_are_ordered_largest_first_with_forbidden_layers() {
        let t = templates();
        let cons = t.contacts_for(CONTACT);
        let names: Vec<_> = cons.iter().map(|c| c.proto.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "metal-1-n-active-con",
                "metal-1-n-well-con",
                "metal-1-p-active-con",
                "metal-1-p-well-con",
                "metal-1-polysilicon-1-con",
            ]
        );
        let poly_con = cons.last().unwrap();
        assert!(poly_con.forbidden.contains(&NACTIVE));
        assert!(!poly_con.forbidden.contains(&POLY));
        // The p-well is implied by the substrate and never required or forbidden.
        assert!(cons.iter().all(|c| !c.forbidden.contains(&PWELL)));
        let nwell_con = &cons[1];
        assert!(!nwell_con.forbidden.contains(&NWELL));
        assert!(cons[0].forbidden.contains(&NWELL));
    }

    #[test]
    fn transistor_templates_cover_all_rotations() {
        let t = templates();
        let pmos: Vec<_> = t.transistors.iter().filter(|t| t.proto == "pmos").collect();
        assert_eq!(pmos.len(), 4);
        // pmos carries the n-well, so it is tried before nmos.
        assert_eq!(t.transistors[0].proto, "pmos");
        let r0 = pmos.iter().find(|t| t.rotation == Rotation::R0).unwrap();
        assert_eq!(r0.min_gate, (20, 30));
        assert_eq!(r0.gate_layer, POLY);
        let gate = r0.frame.layers.iter().find(|l| l.layer == POLY).unwrap();
        assert_eq!(gate.surround, Sides::new(0, 20, 0, 20));
        let r90 = pmos.iter().find(|t| t.rotation == Rotation::R90).unwrap();
        let gate = r90.frame.layers.iter().find(|l| l.layer == POLY).unwrap();
        assert_eq!(gate.surround, Sides::new(20, 0, 20, 0));
    }
}
