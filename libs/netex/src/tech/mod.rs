//! Technology catalog: layers, arc prototypes and node prototypes.
//!
//! Prototype dimensions are given in external units. Placed nodes and wires
//! are in internal units, and so are the polygons returned by the decomposition
//! functions ([`Technology::node_shapes`], [`Technology::wire_shapes`], ...).
//! See [`crate::scale`].

pub mod sample;

use arcstr::ArcStr;
use geometry::path::{offset_chain, path_outline};
use geometry::prelude::*;
use layir::{Node, Wire};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};
use crate::scale::to_internal;

/// Identifies a layer of a [`Technology`].
#[derive(
    Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct LayerId(pub u32);

/// Doping polarity of diffusion, select and well layers.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum DiffType {
    N,
    P,
}

/// Polarity of a well. Wells share the [`DiffType`] classification.
pub type WellType = DiffType;

impl DiffType {
    pub fn opposite(&self) -> Self {
        match self {
            Self::N => Self::P,
            Self::P => Self::N,
        }
    }
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::N => write!(f, "n"),
            Self::P => write!(f, "p"),
        }
    }
}

/// What a layer is used for.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum LayerFunction {
    Metal(u8),
    Poly { level: u8, gate: bool },
    /// Diffusion. `None` means the polarity is given by the surrounding select layer.
    Diffusion(Option<DiffType>),
    Cut(u8),
    Well(WellType),
    Select(DiffType),
    Substrate,
    Other,
}

impl LayerFunction {
    pub fn is_cut(&self) -> bool {
        matches!(self, Self::Cut(_))
    }

    pub fn is_well(&self) -> bool {
        matches!(self, Self::Well(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub name: ArcStr,
    pub function: LayerFunction,
    /// The layer this one is equivalent to for connectivity purposes.
    pub equivalent: Option<LayerId>,
}

impl Layer {
    pub fn new(name: impl Into<ArcStr>, function: LayerFunction) -> Self {
        Self {
            name: name.into(),
            function,
            equivalent: None,
        }
    }

    pub fn with_equivalent(mut self, layer: LayerId) -> Self {
        self.equivalent = Some(layer);
        self
    }
}

/// One layer drawn by an arc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcLayer {
    pub layer: LayerId,
    /// The layer is drawn `width_offset` narrower than the arc's nominal width.
    pub width_offset: i64,
}

/// A routing arc (wire) prototype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcProto {
    pub name: ArcStr,
    pub layers: Vec<ArcLayer>,
    pub min_width: i64,
    /// The name of the pin prototype used to terminate free ends.
    pub pin: ArcStr,
}

impl ArcProto {
    /// The layer carrying the arc's connectivity.
    pub fn layer(&self) -> Option<LayerId> {
        self.layers.first().map(|l| l.layer)
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum NodeFunction {
    Pin,
    Contact,
    /// A tap connecting to the given well (or, for the substrate polarity, the substrate).
    WellContact(WellType),
    Transistor(DiffType),
}

/// A layer drawn by a node, inset from the node body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLayer {
    pub layer: LayerId,
    /// Distances from each side of the node body to the layer's edge.
    /// Negative values make the layer larger than the body.
    pub insets: [i64; 4],
}

impl NodeLayer {
    pub fn new(layer: LayerId, insets: [i64; 4]) -> Self {
        Self { layer, insets }
    }

    /// Insets as [`Sides`], in external units.
    pub fn sides(&self) -> Sides<i64> {
        let [l, b, r, t] = self.insets;
        Sides::new(l, b, r, t)
    }
}

/// A connection point of a node prototype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortProto {
    pub name: ArcStr,
    pub insets: [i64; 4],
    /// Names of the arc prototypes that may attach to this port.
    pub arcs: Vec<ArcStr>,
}

impl PortProto {
    pub fn sides(&self) -> Sides<i64> {
        let [l, b, r, t] = self.insets;
        Sides::new(l, b, r, t)
    }
}

/// Multi-cut layout rule: cuts of `size` separated by `spacing`, kept `inset`
/// away from the node body's edge.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct MultiCut {
    pub size: i64,
    pub spacing: i64,
    pub inset: i64,
}

impl MultiCut {
    /// The number of cuts that fit along a body dimension of length `len`.
    ///
    /// All quantities share one unit. At least one cut is always placed.
    ///
    /// ```
    /// # use netex::tech::MultiCut;
    /// let rule = MultiCut { size: 2, spacing: 3, inset: 1 };
    /// assert_eq!(rule.count(4), 1);
    /// assert_eq!(rule.count(9), 2);
    /// assert_eq!(rule.count(13), 2);
    /// assert_eq!(rule.count(14), 3);
    /// ```
    pub fn count(&self, len: i64) -> i64 {
        ((len - 2 * self.inset + self.spacing) / (self.size + self.spacing)).max(1)
    }

    /// The total length of `n` cuts and the spacing between them.
    pub fn array_len(&self, n: i64) -> i64 {
        n * self.size + (n - 1) * self.spacing
    }

    /// Scales every dimension by `factor`.
    pub fn scaled(&self, factor: i64) -> Self {
        Self {
            size: self.size * factor,
            spacing: self.spacing * factor,
            inset: self.inset * factor,
        }
    }

    /// The cut rectangles of a node whose body is `body`, centered in the body.
    pub fn cuts(&self, body: Rect) -> Vec<Rect> {
        let nx = self.count(body.width());
        let ny = self.count(body.height());
        let x0 = body.left() + (body.width() - self.array_len(nx)) / 2;
        let y0 = body.bot() + (body.height() - self.array_len(ny)) / 2;
        let pitch = self.size + self.spacing;
        let mut out = Vec::with_capacity((nx * ny) as usize);
        for j in 0..ny {
            for i in 0..nx {
                let x = x0 + i * pitch;
                let y = y0 + j * pitch;
                out.push(Rect::from_sides(x, y, x + self.size, y + self.size));
            }
        }
        out
    }
}

/// A primitive node prototype: pin, contact, well tap or transistor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeProto {
    pub name: ArcStr,
    pub function: NodeFunction,
    /// Default body width.
    pub width: i64,
    /// Default body height.
    pub height: i64,
    pub layers: Vec<NodeLayer>,
    pub ports: Vec<PortProto>,
    pub multicut: Option<MultiCut>,
}

impl NodeProto {
    pub fn port(&self, name: &str) -> Option<&PortProto> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// The first layer with the given function predicate.
    pub fn layer_where(
        &self,
        tech: &Technology,
        f: impl Fn(LayerFunction) -> bool,
    ) -> Option<&NodeLayer> {
        self.layers
            .iter()
            .find(|l| tech.layer(l.layer).is_some_and(|layer| f(layer.function)))
    }

    /// Insets of the gate region (poly ∩ diffusion) of a transistor prototype.
    ///
    /// The gate spans the poly layer horizontally and the diffusion layer vertically.
    pub fn gate_insets(&self, tech: &Technology) -> Option<Sides<i64>> {
        let poly = self.layer_where(tech, |f| matches!(f, LayerFunction::Poly { .. }))?;
        let diff = self.layer_where(tech, |f| matches!(f, LayerFunction::Diffusion(_)))?;
        Some(Sides::new(
            poly.insets[0],
            diff.insets[1],
            poly.insets[2],
            diff.insets[3],
        ))
    }
}

/// A complete technology catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
    pub name: ArcStr,
    pub layers: Vec<Layer>,
    pub arcs: Vec<ArcProto>,
    pub nodes: Vec<NodeProto>,
    /// Polarity of the substrate. Wells of this polarity are implied and may be
    /// missing from layout data.
    pub substrate: DiffType,
}

/// A polygon on a layer, in internal units.
pub type LayerPolygon = (LayerId, Polygon);

/// A port of a placed node: name, shape in internal units, and connectable layers.
#[derive(Debug, Clone)]
pub struct PlacedPort {
    pub name: ArcStr,
    pub shape: Polygon,
    pub layers: Vec<LayerId>,
}

impl Technology {
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0 as usize)
    }

    pub fn layer_function(&self, id: LayerId) -> LayerFunction {
        self.layer(id)
            .map(|l| l.function)
            .unwrap_or(LayerFunction::Other)
    }

    /// The layer's name, or a placeholder for unknown layers.
    pub fn layer_name(&self, id: LayerId) -> ArcStr {
        self.layer(id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| arcstr::format!("layer#{}", id.0))
    }

    pub fn layer_named(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.name == name)
            .map(|i| LayerId(i as u32))
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        (0..self.layers.len()).map(|i| LayerId(i as u32))
    }

    pub fn arc(&self, name: &str) -> Option<&ArcProto> {
        self.arcs.iter().find(|a| a.name == name)
    }

    /// The default arc prototype routing `layer`.
    pub fn arc_for_layer(&self, layer: LayerId) -> Option<&ArcProto> {
        self.arcs.iter().find(|a| a.layer() == Some(layer))
    }

    pub fn node(&self, name: &str) -> Option<&NodeProto> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn try_node(&self, name: &str) -> Result<&NodeProto> {
        self.node(name)
            .ok_or_else(|| ExtractError::UnknownPrototype(name.into()))
    }

    pub fn pin_for_arc(&self, arc: &ArcProto) -> Result<&NodeProto> {
        self.node(&arc.pin)
            .filter(|n| n.function == NodeFunction::Pin)
            .ok_or_else(|| ExtractError::NoPinForArc(arc.name.clone()))
    }

    /// The first diffusion layer with an explicit polarity of `ty`.
    pub fn diffusion_layer(&self, ty: DiffType) -> Option<LayerId> {
        self.layer_ids()
            .find(|&l| self.layer_function(l) == LayerFunction::Diffusion(Some(ty)))
    }

    /// Whether `layer` is a well of the substrate's own polarity, which layouts may omit.
    pub fn is_implied_well(&self, layer: LayerId) -> bool {
        self.layer_function(layer) == LayerFunction::Well(self.substrate)
    }

    /// Decomposes a node into layer polygons in internal units.
    pub fn node_shapes(&self, node: &Node) -> Result<Vec<LayerPolygon>> {
        let proto = self.try_node(node.proto())?;
        if let Some(trace) = node.trace() {
            return Ok(self.trace_shapes(proto, node, trace));
        }
        let body = body(node);
        let trans = node.transformation();
        let mut out = Vec::new();
        for layer in &proto.layers {
            let is_cut = self.layer_function(layer.layer).is_cut();
            match (is_cut, proto.multicut) {
                (true, Some(rule)) => {
                    for cut in rule.scaled(crate::scale::SCALE).cuts(body) {
                        out.push((layer.layer, cut.transform(trans).to_polygon()));
                    }
                }
                _ => {
                    if let Some(r) = body.shrink_sides(layer.sides().map(|_, v| to_internal(v))) {
                        if !r.is_degenerate() {
                            out.push((layer.layer, r.transform(trans).to_polygon()));
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// The ports of a placed node, with shapes in internal units.
    pub fn node_ports(&self, node: &Node) -> Result<Vec<PlacedPort>> {
        let proto = self.try_node(node.proto())?;
        let mut out = Vec::with_capacity(proto.ports.len());
        for port in &proto.ports {
            let layers = port
                .arcs
                .iter()
                .filter_map(|a| self.arc(a).and_then(ArcProto::layer))
                .collect();
            let shape = match node.trace() {
                Some(trace) => self.trace_port_shape(proto, port, node, trace),
                None => {
                    let body = body(node);
                    let r = body
                        .shrink_sides(port.sides().map(|_, v| to_internal(v)))
                        .unwrap_or_else(|| Rect::from_point(body.center()));
                    Some(r.transform(node.transformation()).to_polygon())
                }
            };
            if let Some(shape) = shape {
                out.push(PlacedPort {
                    name: port.name.clone(),
                    shape,
                    layers,
                });
            }
        }
        Ok(out)
    }

    /// Decomposes a wire into layer polygons in internal units.
    pub fn wire_shapes(&self, wire: &Wire) -> Result<Vec<LayerPolygon>> {
        let proto = self
            .arc(wire.proto())
            .ok_or_else(|| ExtractError::UnknownPrototype(wire.proto().clone()))?;
        Ok(self.arc_shapes(
            proto,
            wire.width(),
            [wire.head().location(), wire.tail().location()],
            [wire.head().extended(), wire.tail().extended()],
        ))
    }

    /// The layer polygons of a wire of prototype `proto` and width `width`
    /// between points `ends`, all in internal units.
    pub fn arc_shapes(
        &self,
        proto: &ArcProto,
        width: i64,
        ends: [Point; 2],
        extended: [bool; 2],
    ) -> Vec<LayerPolygon> {
        let [head, tail] = ends;
        proto
            .layers
            .iter()
            .filter_map(|layer| {
                let width = width - to_internal(layer.width_offset);
                if width <= 0 {
                    return None;
                }
                segment_outline(head, tail, width, extended[0], extended[1])
                    .map(|poly| (layer.layer, poly))
            })
            .collect()
    }

    fn trace_shapes(&self, proto: &NodeProto, node: &Node, trace: &[Point]) -> Vec<LayerPolygon> {
        let Some(gate) = proto.gate_insets(self) else {
            return Vec::new();
        };
        let half = node.size().0 / 2;
        proto
            .layers
            .iter()
            .filter_map(|layer| {
                let across = to_internal(gate[Side::Left] - layer.insets[0]);
                let start = to_internal(gate[Side::Bot] - layer.insets[1]);
                let end = to_internal(gate[Side::Top] - layer.insets[3]);
                path_outline(trace, half + across, start, end).map(|p| (layer.layer, p))
            })
            .collect()
    }

    fn trace_port_shape(
        &self,
        proto: &NodeProto,
        port: &PortProto,
        node: &Node,
        trace: &[Point],
    ) -> Option<Polygon> {
        let gate = proto.gate_insets(self)?;
        let poly = proto.layer_where(self, |f| matches!(f, LayerFunction::Poly { .. }))?;
        let diff = proto.layer_where(self, |f| matches!(f, LayerFunction::Diffusion(_)))?;
        let half = node.size().0 / 2;
        let routes_poly = port.arcs.iter().any(|a| {
            self.arc(a)
                .and_then(ArcProto::layer)
                .is_some_and(|l| matches!(self.layer_function(l), LayerFunction::Poly { .. }))
        });
        if routes_poly {
            let start = to_internal(gate[Side::Bot] - poly.insets[1]);
            let end = to_internal(gate[Side::Top] - poly.insets[3]);
            return path_outline(trace, half, start, end);
        }
        let outer = half + to_internal(gate[Side::Left] - diff.insets[0]);
        // Diffusion ports sit on the side of the gate their insets leave open.
        let sign = if port.insets[2] > port.insets[0] { 1 } else { -1 };
        let mut verts = offset_chain(trace, sign * half);
        let mut far = offset_chain(trace, sign * outer);
        far.reverse();
        verts.extend(far);
        (verts.len() >= 4).then(|| Polygon::from_verts(verts).normalized())
    }
}

/// The outline of a straight segment of the given width, in internal units.
///
/// Zero-length segments with both ends extended become squares.
pub fn segment_outline(
    head: Point,
    tail: Point,
    width: i64,
    head_ext: bool,
    tail_ext: bool,
) -> Option<Polygon> {
    let half = width / 2;
    if head == tail {
        return (head_ext && tail_ext).then(|| Rect::from_center(head, width, width).to_polygon());
    }
    path_outline(
        &[head, tail],
        half,
        if head_ext { half } else { 0 },
        if tail_ext { half } else { 0 },
    )
}

fn body(node: &Node) -> Rect {
    let (w, h) = node.size();
    Rect::from_center(Point::zero(), w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::rect_to_internal;

    #[test]
    fn contact_decomposes_into_layers_and_cuts() {
        let tech = sample::cmos();
        let node = Node::new("metal-1-metal-2-con", Point::new(100, 0), 40, 90);
        let shapes = tech.node_shapes(&node).unwrap();
        let via = tech.layer_named("via1").unwrap();
        let m1 = tech.layer_named("metal-1").unwrap();
        let cuts: Vec<_> = shapes
            .iter()
            .filter(|(l, _)| *l == via)
            .map(|(_, p)| p.as_rect().unwrap())
            .collect();
        // Two cuts fit along the 9-unit height; the array is centered.
        assert_eq!(
            cuts,
            vec![
                Rect::from_sides(90, -30, 110, -10),
                Rect::from_sides(90, 10, 110, 30),
            ]
        );
        let metal = shapes.iter().find(|(l, _)| *l == m1).unwrap();
        assert_eq!(metal.1.as_rect(), Some(Rect::from_sides(80, -45, 120, 45)));
    }

    #[test]
    fn rotated_transistor_swaps_gate_orientation() {
        let tech = sample::cmos();
        let node = Node::new("nmos", Point::zero(), 80, 70).with_orientation(Rotation::R90);
        let shapes = tech.node_shapes(&node).unwrap();
        let poly = tech.layer_named("transistor-poly").unwrap();
        let gate = shapes.iter().find(|(l, _)| *l == poly).unwrap();
        // Unrotated, the gate poly is a vertical 2 x 7 stripe.
        assert_eq!(gate.1.as_rect(), Some(Rect::from_sides(-35, -10, 35, 10)));
    }

    #[test]
    fn wire_ends_extend_by_half_width() {
        let tech = sample::cmos();
        let mut cell = layir::Cell::<LayerId>::new("wire");
        let a = cell.add_node(Node::new("metal-1-pin", Point::new(0, 0), 0, 0));
        let b = cell.add_node(Node::new("metal-1-pin", Point::new(100, 0), 0, 0));
        let wire = Wire::new(
            "metal-1",
            40,
            layir::WireEnd::new(a, "metal-1", Point::new(0, 0)),
            layir::WireEnd::new(b, "metal-1", Point::new(100, 0)).with_extended(false),
        );
        let shapes = tech.wire_shapes(&wire).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(
            shapes[0].1.as_rect(),
            Some(rect_to_internal(Rect::from_sides(-2, -2, 10, 2)))
        );
    }

    #[test]
    fn pins_have_point_ports() {
        let tech = sample::cmos();
        let node = Node::new("metal-1-pin", Point::new(30, 45), 0, 0);
        assert!(tech.node_shapes(&node).unwrap().is_empty());
        let ports = tech.node_ports(&node).unwrap();
        assert_eq!(ports.len(), 1);
        // Pins may sit half a unit off the external grid.
        assert_eq!(ports[0].shape.bbox(), Some(Rect::from_point(Point::new(30, 45))));
        assert_eq!(ports[0].layers, vec![tech.layer_named("metal-1").unwrap()]);
    }
}
