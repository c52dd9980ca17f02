//! A hierarchical layout database of cells, instances, primitive nodes and wires.

pub mod id;
pub mod node;


use std::{
    collections::{HashMap, HashSet, VecDeque},
    ops::Deref,
};

use crate::id::Id;
use arcstr::ArcStr;
use geometry::prelude::Transformation;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use uniquify::Names;

pub use node::{Node, Terminal, Wire, WireEnd};

pub struct Cells;

// The reason this uses [`Cells`] instead of [`Cell`]
// is because `Cell` has a generic type parameter.
pub type CellId = Id<Cells>;
pub type InstanceId = Id<Instance>;
pub type NodeId = Id<Node>;
pub type WireId = Id<Wire>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryBuilder<L> {
    cell_id: CellId,
    cells: IndexMap<CellId, Cell<L>>,
    name_map: HashMap<ArcStr, CellId>,
    names: Names<CellId>,
}

#[derive(Debug, Clone)]
pub struct Library<L>(LibraryBuilder<L>);

/// A cell: pure-layer shapes, primitive nodes, wires, sub-cell instances and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell<L> {
    name: ArcStr,
    instance_id: InstanceId,
    instances: IndexMap<InstanceId, Instance>,
    instance_name_map: HashMap<ArcStr, InstanceId>,
    elements: Vec<Element<L>>,
    ports: IndexMap<ArcStr, Port<L>>,
    node_id: NodeId,
    nodes: IndexMap<NodeId, Node>,
    node_names: Names<NodeId>,
    wire_id: WireId,
    wires: IndexMap<WireId, Wire>,
    wire_names: Names<WireId>,
}

/// A location at which this cell should be connected.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Port<L> {
    direction: Direction,
    elements: Vec<Element<L>>,
    attachment: Option<PortAttachment>,
}

/// The node port or instance export an export is electrically attached to.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct PortAttachment {
    pub terminal: Terminal,
    pub port: ArcStr,
}

impl PortAttachment {
    pub fn new(terminal: impl Into<Terminal>, port: impl Into<ArcStr>) -> Self {
        Self {
            terminal: terminal.into(),
            port: port.into(),
        }
    }
}

/// Port directions.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Input.
    Input,
    /// Output.
    Output,
    /// Input or output.
    #[default]
    InOut,
}

/// A primitive layout element.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Element<L> {
    /// A primitive layout shape.
    Shape(Shape<L>),
    /// A primitive text annotation.
    Text(Text<L>),
}

/// A primitive layout shape consisting of a layer and a geometric shape.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Shape<L> {
    layer: L,
    shape: geometry::shape::Shape,
}

/// A primitive text annotation consisting of a layer, string, and location.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Text<L> {
    layer: L,
    text: ArcStr,
    trans: Transformation,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    child: CellId,
    name: ArcStr,
    trans: Transformation,
}

impl<L> Default for LibraryBuilder<L> {
    fn default() -> Self {
        Self {
            cell_id: Id::new(),
            names: Default::default(),
            name_map: Default::default(),
            cells: Default::default(),
        }
    }
}

impl<L> LibraryBuilder<L> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a cell to the library, renaming it if its name is already taken.
    pub fn add_cell(&mut self, mut cell: Cell<L>) -> CellId {
        let id = self.cell_id.alloc();
        cell.name = self.names.assign_name(id, &cell.name);
        self.name_map.insert(cell.name.clone(), id);
        self.cells.insert(id, cell);
        id
    }

    pub fn try_cell(&self, id: CellId) -> Option<&Cell<L>> {
        self.cells.get(&id)
    }

    pub fn try_cell_mut(&mut self, id: CellId) -> Option<&mut Cell<L>> {
        self.cells.get_mut(&id)
    }

    pub fn try_cell_named(&self, name: &str) -> Option<&Cell<L>> {
        self.try_cell(*self.name_map.get(name)?)
    }

    /// Gets the cell ID corresponding to the given name.
    pub fn try_cell_id_named(&self, name: &str) -> Option<CellId> {
        self.name_map.get(name).copied()
    }

    /// Iterates over the `(id, cell)` pairs in this library.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell<L>)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    /// The number of cells in the library.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the library has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns cell IDs in topological order: every cell appears after all cells it instantiates.
    ///
    /// Instances of cells that are not in the library are ignored.
    pub fn topological_order(&self) -> Vec<CellId> {
        self.topological_order_from(self.cells.keys().copied())
    }

    /// Like [`LibraryBuilder::topological_order`], restricted to `roots` and the cells they use.
    pub fn topological_order_from(&self, roots: impl IntoIterator<Item = CellId>) -> Vec<CellId> {
        let mut state = IndexSet::new();
        for cell in roots {
            self.dfs_postorder(cell, &mut state);
        }
        state.into_iter().collect()
    }

    fn dfs_postorder(&self, id: CellId, state: &mut IndexSet<CellId>) {
        // Explicit stack so deep hierarchies cannot overflow the call stack.
        let mut stack = vec![(id, false)];
        let mut visiting = HashSet::new();
        while let Some((id, expanded)) = stack.pop() {
            if state.contains(&id) {
                continue;
            }
            if expanded {
                state.insert(id);
                continue;
            }
            if !visiting.insert(id) {
                continue;
            }
            let Some(cell) = self.try_cell(id) else {
                continue;
            };
            stack.push((id, true));
            for (_, inst) in cell.instances().collect::<Vec<_>>().into_iter().rev() {
                if !state.contains(&inst.child()) {
                    stack.push((inst.child(), false));
                }
            }
        }
    }

    /// The list of cell IDs instantiated by the given root cells.
    ///
    /// The list returned will include the root cell IDs.
    pub fn cells_used_by(&self, roots: impl IntoIterator<Item = CellId>) -> Vec<CellId> {
        let mut stack = VecDeque::new();
        let mut visited = IndexSet::new();
        for root in roots {
            stack.push_back(root);
        }

        while let Some(id) = stack.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(cell) = self.try_cell(id) {
                for (_, inst) in cell.instances() {
                    stack.push_back(inst.child);
                }
            }
        }

        visited.into_iter().collect()
    }

    pub fn build(self) -> Result<Library<L>, BuildError> {
        for (_, cell) in self.cells() {
            for (_, inst) in cell.instances() {
                if !self.cells.contains_key(&inst.child()) {
                    return Err(BuildError::MissingChild {
                        cell: cell.name().clone(),
                        instance: inst.name().clone(),
                    });
                }
            }
        }
        Ok(Library(self))
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum BuildError {
    #[error("instance `{instance}` of cell `{cell}` refers to a cell that is not in the library")]
    MissingChild { cell: ArcStr, instance: ArcStr },
}

impl<L> Deref for Library<L> {
    type Target = LibraryBuilder<L>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<L> Library<L> {
    /// Converts the library back into a builder for further modification.
    pub fn into_builder(self) -> LibraryBuilder<L> {
        self.0
    }
}

impl<L> Cell<L> {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            instance_id: Id::new(),
            instances: Default::default(),
            instance_name_map: Default::default(),
            elements: Default::default(),
            ports: Default::default(),
            node_id: Id::new(),
            nodes: Default::default(),
            node_names: Default::default(),
            wire_id: Id::new(),
            wires: Default::default(),
            wire_names: Default::default(),
        }
    }

    /// The name of the cell.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Iterate over the ports of this cell.
    #[inline]
    pub fn ports(&self) -> impl Iterator<Item = (&ArcStr, &Port<L>)> {
        self.ports.iter()
    }

    pub fn add_port(&mut self, name: impl Into<ArcStr>, port: Port<L>) {
        self.ports.insert(name.into(), port);
    }

    /// Get a port of this cell by name.
    #[inline]
    pub fn try_port(&self, name: &str) -> Option<&Port<L>> {
        self.ports.get(name)
    }

    /// Get the instance associated with the given ID.
    #[inline]
    pub fn try_instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Gets the instance with the given name.
    pub fn try_instance_named(&self, name: &str) -> Option<&Instance> {
        self.try_instance(*self.instance_name_map.get(name)?)
    }

    /// Add the given instance to the cell.
    #[inline]
    pub fn add_instance(&mut self, instance: Instance) -> InstanceId {
        let id = self.instance_id.alloc();
        self.instance_name_map.insert(instance.name.clone(), id);
        self.instances.insert(id, instance);
        id
    }

    /// Iterate over the instances of this cell.
    #[inline]
    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances.iter().map(|x| (*x.0, x.1))
    }

    pub fn instances_mut(&mut self) -> impl Iterator<Item = (InstanceId, &mut Instance)> {
        self.instances.iter_mut().map(|x| (*x.0, x.1))
    }

    pub fn add_element(&mut self, element: impl Into<Element<L>>) {
        self.elements.push(element.into())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element<L>> {
        self.elements.iter()
    }

    /// Adds a primitive node, giving it a unique `proto@N` name if it has none.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.node_id.alloc();
        node.name = if node.name.is_empty() {
            self.node_names.assign_indexed(id, node.proto())
        } else {
            self.node_names.assign_name(id, &node.name)
        };
        self.nodes.insert(id, node);
        id
    }

    /// Get the node associated with the given ID.
    #[inline]
    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    #[inline]
    pub fn try_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Iterate over the primitive nodes of this cell, in insertion order.
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|x| (*x.0, x.1))
    }

    /// Adds a wire, giving it a unique `proto@N` name if it has none.
    pub fn add_wire(&mut self, mut wire: Wire) -> WireId {
        let id = self.wire_id.alloc();
        wire.name = if wire.name.is_empty() {
            self.wire_names.assign_indexed(id, wire.proto())
        } else {
            self.wire_names.assign_name(id, &wire.name)
        };
        self.wires.insert(id, wire);
        id
    }

    #[inline]
    pub fn try_wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(&id)
    }

    #[inline]
    pub fn try_wire_mut(&mut self, id: WireId) -> Option<&mut Wire> {
        self.wires.get_mut(&id)
    }

    /// Iterate over the wires of this cell, in insertion order.
    #[inline]
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires.iter().map(|x| (*x.0, x.1))
    }

    /// Iterate over the wires with an end on the given node.
    pub fn wires_on(&self, node: NodeId) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires()
            .filter(move |(_, w)| w.ends().iter().any(|e| e.node() == Some(node)))
    }
}

impl<L> Port<L> {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            elements: Default::default(),
            attachment: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element<L>> {
        self.elements.iter()
    }

    pub fn add_element(&mut self, element: impl Into<Element<L>>) {
        self.elements.push(element.into())
    }

    /// The object this export is attached to, if any.
    pub fn attachment(&self) -> Option<&PortAttachment> {
        self.attachment.as_ref()
    }

    pub fn with_attachment(mut self, attachment: PortAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn set_attachment(&mut self, attachment: Option<PortAttachment>) {
        self.attachment = attachment;
    }
}

impl<L> From<Shape<L>> for Element<L> {
    fn from(value: Shape<L>) -> Self {
        Self::Shape(value)
    }
}

impl<L> From<Text<L>> for Element<L> {
    fn from(value: Text<L>) -> Self {
        Self::Text(value)
    }
}

impl<L> Shape<L> {
    #[inline]
    pub fn new(layer: L, shape: impl Into<geometry::shape::Shape>) -> Self {
        Self {
            layer,
            shape: shape.into(),
        }
    }

    #[inline]
    pub fn layer(&self) -> &L {
        &self.layer
    }

    #[inline]
    pub fn shape(&self) -> &geometry::shape::Shape {
        &self.shape
    }
}

impl<L> Text<L> {
    #[inline]
    pub fn new(layer: L, text: impl Into<ArcStr>) -> Self {
        Self {
            layer,
            text: text.into(),
            trans: Default::default(),
        }
    }

    #[inline]
    pub fn with_transformation(
        layer: L,
        text: impl Into<ArcStr>,
        trans: impl Into<Transformation>,
    ) -> Self {
        Self {
            layer,
            text: text.into(),
            trans: trans.into(),
        }
    }

    #[inline]
    pub fn layer(&self) -> &L {
        &self.layer
    }

    #[inline]
    pub fn text(&self) -> &ArcStr {
        &self.text
    }

    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }
}

impl Instance {
    pub fn new(child: CellId, name: impl Into<ArcStr>) -> Self {
        Self {
            child,
            name: name.into(),
            trans: Default::default(),
        }
    }

    pub fn with_transformation(
        child: CellId,
        name: impl Into<ArcStr>,
        transformation: impl Into<Transformation>,
    ) -> Self {
        Self {
            child,
            name: name.into(),
            trans: transformation.into(),
        }
    }

    /// Returns a copy of this instance pointing at a different cell.
    pub fn with_child(&self, child: CellId) -> Self {
        Self {
            child,
            ..self.clone()
        }
    }

    #[inline]
    pub fn child(&self) -> CellId {
        self.child
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }
}
