//! Canonical layer assignment.

use indexmap::IndexMap;

use crate::tech::{DiffType, LayerFunction, LayerId, Technology};

/// Maps every technology layer to the canonical layer used as its merge key.
///
/// Layers with an explicit equivalent map to it. Gate poly collapses onto the
/// plain poly layer of the same level, and metals and typed diffusions map to
/// the first layer with the same function.
#[derive(Debug, Clone)]
pub struct LayerMap {
    canonical: IndexMap<LayerId, LayerId>,
}

impl LayerMap {
    pub fn new(tech: &Technology) -> Self {
        let mut canonical = IndexMap::new();
        for id in tech.layer_ids() {
            let target = tech
                .layer(id)
                .and_then(|l| l.equivalent)
                .unwrap_or_else(|| first_with_function(tech, id));
            canonical.insert(id, target);
        }
        // Follow equivalence chains to their end.
        let keys: Vec<_> = canonical.keys().copied().collect();
        for id in keys {
            let mut target = canonical[&id];
            for _ in 0..canonical.len() {
                let next = canonical.get(&target).copied().unwrap_or(target);
                if next == target {
                    break;
                }
                target = next;
            }
            canonical.insert(id, target);
        }
        Self { canonical }
    }

    /// The canonical layer for `layer`. Unknown layers map to themselves.
    pub fn canonical(&self, layer: LayerId) -> LayerId {
        self.canonical.get(&layer).copied().unwrap_or(layer)
    }

    /// Returns `true` if `a` and `b` share a canonical layer.
    pub fn same(&self, a: LayerId, b: LayerId) -> bool {
        self.canonical(a) == self.canonical(b)
    }

    /// The distinct canonical layers, in technology order.
    pub fn canonical_layers(&self) -> Vec<LayerId> {
        let mut out: Vec<LayerId> = self.canonical.values().copied().collect();
        out.sort();
        out.dedup();
        out
    }

    /// The canonical diffusion layer of polarity `ty`.
    pub fn diffusion(&self, tech: &Technology, ty: DiffType) -> Option<LayerId> {
        tech.diffusion_layer(ty).map(|l| self.canonical(l))
    }
}

fn first_with_function(tech: &Technology, id: LayerId) -> LayerId {
    let target = match tech.layer_function(id) {
        LayerFunction::Poly { level, .. } => Some(LayerFunction::Poly { level, gate: false }),
        f @ (LayerFunction::Metal(_) | LayerFunction::Diffusion(Some(_))) => Some(f),
        _ => None,
    };
    target
        .and_then(|f| tech.layer_ids().find(|&l| tech.layer_function(l) == f))
        .unwrap_or(id)
}
