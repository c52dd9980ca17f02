//! Primitive nodes and the wires (arcs) that join them.

use arcstr::ArcStr;
use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{InstanceId, NodeId};

/// An instance of a technology node prototype (pin, contact, transistor, ...).
///
/// Placement is given by a center point, an unrotated size and an orientation.
/// Placement coordinates may use a finer grid than the shapes of the cell
/// holding the node; the technology decides the ratio.
/// Nodes with a trace (angled or serpentine transistors) follow the trace
/// instead of a rectangular body.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Node {
    proto: ArcStr,
    pub(crate) name: ArcStr,
    center: Point,
    width: i64,
    height: i64,
    orientation: Orientation,
    trace: Option<Vec<Point>>,
}

impl Node {
    /// Creates an unnamed node of prototype `proto`.
    ///
    /// The cell assigns a unique `proto@N` name when the node is added.
    pub fn new(proto: impl Into<ArcStr>, center: Point, width: i64, height: i64) -> Self {
        Self {
            proto: proto.into(),
            name: ArcStr::new(),
            center,
            width,
            height,
            orientation: Orientation::default(),
            trace: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_orientation(mut self, orientation: impl Into<Orientation>) -> Self {
        self.orientation = orientation.into();
        self
    }

    /// Sets the trace: an ordered list of points in cell coordinates.
    pub fn with_trace(mut self, trace: Vec<Point>) -> Self {
        self.trace = Some(trace);
        self
    }

    #[inline]
    pub fn proto(&self) -> &ArcStr {
        &self.proto
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    /// The size before orientation is applied.
    #[inline]
    pub fn size(&self) -> (i64, i64) {
        (self.width, self.height)
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn trace(&self) -> Option<&[Point]> {
        self.trace.as_deref()
    }

    /// The transformation mapping prototype coordinates (centered on the origin)
    /// to cell coordinates.
    pub fn transformation(&self) -> Transformation {
        Transformation::from_offset_and_orientation(self.center, self.orientation)
    }

    /// The rectangular body of the node in cell coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_center(Point::zero(), self.width, self.height).transform(self.transformation())
    }

    /// Sets the size before orientation is applied.
    pub fn set_size(&mut self, width: i64, height: i64) {
        self.width = width;
        self.height = height;
    }

    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }
}

impl TranslateMut for Node {
    fn translate_mut(&mut self, p: Point) {
        self.center.translate_mut(p);
        self.trace.translate_mut(p);
    }
}

impl TransformMut for Node {
    fn transform_mut(&mut self, trans: Transformation) {
        self.center.transform_mut(trans);
        self.orientation = self.orientation.apply(trans.orientation());
        self.trace.transform_mut(trans);
    }
}

/// The object a wire end or export connects to.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Terminal {
    /// A primitive node in the same cell.
    Node(NodeId),
    /// A sub-cell instance; the port name refers to one of the child's exports.
    Instance(InstanceId),
}

impl From<NodeId> for Terminal {
    fn from(value: NodeId) -> Self {
        Self::Node(value)
    }
}

impl From<InstanceId> for Terminal {
    fn from(value: InstanceId) -> Self {
        Self::Instance(value)
    }
}

/// One end of a [`Wire`].
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct WireEnd {
    terminal: Terminal,
    port: ArcStr,
    location: Point,
    extended: bool,
}

impl WireEnd {
    /// An end at `location`, attached to port `port` of `terminal`.
    ///
    /// Ends are extended by half the wire width unless marked otherwise.
    pub fn new(terminal: impl Into<Terminal>, port: impl Into<ArcStr>, location: Point) -> Self {
        Self {
            terminal: terminal.into(),
            port: port.into(),
            location,
            extended: true,
        }
    }

    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    #[inline]
    pub fn terminal(&self) -> Terminal {
        self.terminal
    }

    /// The node this end is attached to, if it is attached to a node.
    pub fn node(&self) -> Option<NodeId> {
        match self.terminal {
            Terminal::Node(node) => Some(node),
            Terminal::Instance(_) => None,
        }
    }

    #[inline]
    pub fn port(&self) -> &ArcStr {
        &self.port
    }

    #[inline]
    pub fn location(&self) -> Point {
        self.location
    }

    #[inline]
    pub fn extended(&self) -> bool {
        self.extended
    }

    pub fn set_terminal(&mut self, terminal: impl Into<Terminal>) {
        self.terminal = terminal.into();
    }

    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    pub fn set_extended(&mut self, extended: bool) {
        self.extended = extended;
    }
}

/// A straight routing wire (arc) of a given width between two node ports.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    proto: ArcStr,
    pub(crate) name: ArcStr,
    width: i64,
    ends: [WireEnd; 2],
}

impl Wire {
    /// Creates an unnamed wire of prototype `proto` from `head` to `tail`.
    pub fn new(proto: impl Into<ArcStr>, width: i64, head: WireEnd, tail: WireEnd) -> Self {
        Self {
            proto: proto.into(),
            name: ArcStr::new(),
            width,
            ends: [head, tail],
        }
    }

    pub fn with_name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn proto(&self) -> &ArcStr {
        &self.proto
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.width
    }

    #[inline]
    pub fn head(&self) -> &WireEnd {
        &self.ends[0]
    }

    #[inline]
    pub fn tail(&self) -> &WireEnd {
        &self.ends[1]
    }

    #[inline]
    pub fn ends(&self) -> &[WireEnd; 2] {
        &self.ends
    }

    #[inline]
    pub fn ends_mut(&mut self) -> &mut [WireEnd; 2] {
        &mut self.ends
    }

    pub fn set_width(&mut self, width: i64) {
        self.width = width;
    }

    /// The wire's center segment.
    pub fn edge(&self) -> Edge {
        Edge::new(self.ends[0].location, self.ends[1].location)
    }
}

impl TranslateMut for Wire {
    fn translate_mut(&mut self, p: Point) {
        for end in self.ends.iter_mut() {
            end.location.translate_mut(p);
        }
    }
}

impl TransformMut for Wire {
    fn transform_mut(&mut self, trans: Transformation) {
        for end in self.ends.iter_mut() {
            end.location.transform_mut(trans);
        }
    }
}
