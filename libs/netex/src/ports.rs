//! Spatial index of realized ports and wires.

use arcstr::ArcStr;
use geometry::prelude::*;
use layir::{Terminal, WireId};

use crate::cuts::RectIndex;
use crate::merge::touches;
use crate::networks::NetKey;
use crate::tech::LayerId;

/// The realized object an index entry stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Port `port` of a node or of an instance export.
    Port { terminal: Terminal, port: ArcStr },
    Wire(WireId),
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub owner: Owner,
    /// Shape in internal units.
    pub shape: Polygon,
    /// Canonical layers the object connects on.
    pub layers: Vec<LayerId>,
    pub net: NetKey,
}

impl Entry {
    pub fn is_port(&self) -> bool {
        matches!(self.owner, Owner::Port { .. })
    }

    /// The terminal and port name, for port entries.
    pub fn port(&self) -> Option<(Terminal, &ArcStr)> {
        match &self.owner {
            Owner::Port { terminal, port } => Some((*terminal, port)),
            Owner::Wire(_) => None,
        }
    }

    fn hits(&self, layer: LayerId, shape: &Polygon) -> bool {
        self.layers.contains(&layer) && shapes_touch(&self.shape, shape)
    }
}

/// Returns `true` if two shapes, either of which may be degenerate, share a point.
pub fn shapes_touch(a: &Polygon, b: &Polygon) -> bool {
    match (a.area() > 0., b.area() > 0.) {
        (true, true) => touches(a, b),
        (false, true) => a.points().iter().any(|p| b.encloses(p)),
        (true, false) => b.points().iter().any(|p| a.encloses(p)),
        (false, false) => a.points().iter().any(|p| b.points().contains(p)),
    }
}

/// Realized ports and wires, looked up by location.
#[derive(Debug, Clone, Default)]
pub struct PortIndex {
    entries: Vec<Entry>,
    index: RectIndex<usize>,
}

impl PortIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: Entry) -> usize {
        let id = self.entries.len();
        if let Some(bbox) = entry.shape.bbox() {
            self.index.insert(bbox, id);
        }
        self.entries.push(entry);
        id
    }

    pub fn get(&self, id: usize) -> &Entry {
        &self.entries[id]
    }

    /// The first port on `layer` whose shape contains `p`.
    pub fn port_at(&self, layer: LayerId, p: Point) -> Option<usize> {
        self.index
            .query(Rect::from_point(p))
            .into_iter()
            .find(|&id| {
                let e = &self.entries[id];
                e.is_port() && e.layers.contains(&layer) && e.shape.encloses(&p)
            })
    }

    /// Entries on `layer` whose shapes touch `shape`, in insertion order.
    pub fn touching(&self, layer: LayerId, shape: &Polygon) -> Vec<usize> {
        let Some(bbox) = shape.bbox() else {
            return Vec::new();
        };
        self.index
            .query(bbox)
            .into_iter()
            .filter(|&id| self.entries[id].hits(layer, shape))
            .collect()
    }

    /// The entry for port `port` of `terminal`.
    pub fn find_port(&self, terminal: Terminal, port: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.port().is_some_and(|(t, p)| t == terminal && p == port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::Networks;
    use crate::tech::sample::*;

    #[test]
    fn point_ports_are_found_by_location() {
        let mut cell = layir::Cell::<LayerId>::new("ports");
        let pin = cell.add_node(layir::Node::new("metal-1-pin", Point::new(10, 10), 0, 0));
        let mut nets = Networks::new();
        let mut index = PortIndex::new();
        let id = index.insert(Entry {
            owner: Owner::Port {
                terminal: pin.into(),
                port: "metal-1".into(),
            },
            shape: Polygon::from_verts(vec![Point::new(10, 10)]),
            layers: vec![METAL1],
            net: nets.new_net(),
        });
        assert_eq!(index.port_at(METAL1, Point::new(10, 10)), Some(id));
        assert_eq!(index.port_at(METAL2, Point::new(10, 10)), None);
        assert_eq!(index.port_at(METAL1, Point::new(11, 10)), None);

        let target = Rect::from_sides(0, 0, 10, 20).to_polygon();
        assert_eq!(index.touching(METAL1, &target), vec![id]);
        assert_eq!(index.find_port(pin.into(), "metal-1"), Some(id));
    }
}
