//! Geometry collection.
//!
//! Flattens a source cell into a [`CellState`]: the shapes, nodes and wires of
//! the cell and of every flattened sub-cell are decomposed into polygons and
//! merged per canonical layer. Instances of kept sub-cells are carried over to
//! the output cell, and their exports become ports that wires can end on.

use std::collections::HashSet;

use geometry::prelude::*;
use indexmap::IndexMap;
use layir::{CellId, Element, Instance, Library, LibraryBuilder, NodeId, Terminal};
use tracing::{span, Level};

use crate::cell::{CellState, SourceExport};
use crate::diag::IssueKind;
use crate::error::{ExtractError, Result};
use crate::merge::{GeoMerge, PolygonMerge};
use crate::opts::FlattenRule;
use crate::ports::{Entry, Owner};
use crate::residue::split_holes;
use crate::scale::{polygon_to_internal, transformation_to_internal};
use crate::tech::{LayerFunction, LayerId, LayerPolygon, NodeFunction};

/// Flattening deeper than this is taken to be a cyclic hierarchy.
const MAX_DEPTH: usize = 256;

/// Collects the geometry of `source` into `state`.
///
/// `memo` maps already extracted source cells to their cells in `out`; every
/// kept sub-cell of `source` must be in it.
pub fn collect(
    state: &mut CellState,
    lib: &Library<LayerId>,
    source: CellId,
    out: &LibraryBuilder<LayerId>,
    memo: &IndexMap<CellId, CellId>,
) -> Result<()> {
    let span = span!(Level::INFO, "collect");
    let _guard = span.enter();

    let tech = state.tech();
    let top = lib
        .try_cell(source)
        .ok_or_else(|| ExtractError::UnknownCell(arcstr::format!("{source:?}")))?;
    let deferred = deferred_pins(state, top);

    let mut shapes: Vec<LayerPolygon> = Vec::new();
    let mut stack = vec![(source, Transformation::default(), String::new(), 0usize)];
    while let Some((id, trans, prefix, depth)) = stack.pop() {
        if depth > MAX_DEPTH {
            return Err(state.invariant("flattened hierarchy is too deep; is it cyclic?"));
        }
        let cell = lib
            .try_cell(id)
            .ok_or_else(|| ExtractError::UnknownCell(arcstr::format!("{id:?}")))?;
        for element in cell.elements() {
            match element {
                Element::Shape(s) => {
                    let poly = s.shape().clone().transform(trans).to_polygon();
                    shapes.push((*s.layer(), polygon_to_internal(&poly)));
                }
                // Annotations of flattened sub-cells are dropped.
                Element::Text(_) if depth == 0 => state.cell.add_element(element.clone()),
                Element::Text(_) => {}
            }
        }
        let placement = transformation_to_internal(trans);
        for (nid, node) in cell.nodes() {
            if depth == 0 && deferred.contains(&nid) {
                continue;
            }
            let node = node.clone().transform(placement);
            match tech.node_shapes(&node) {
                Ok(s) => shapes.extend(s),
                Err(e) => state.issue(
                    Some(node.bounds()),
                    IssueKind::SkippedElement {
                        name: node.name().clone(),
                        message: e.to_string(),
                    },
                ),
            }
        }
        for (_, wire) in cell.wires() {
            let wire = wire.clone().transform(placement);
            match tech.wire_shapes(&wire) {
                Ok(s) => shapes.extend(s),
                Err(e) => state.issue(
                    Some(Rect::new(wire.head().location(), wire.tail().location())),
                    IssueKind::SkippedElement {
                        name: wire.name().clone(),
                        message: e.to_string(),
                    },
                ),
            }
        }
        let instances: Vec<&Instance> = cell.instances().map(|(_, inst)| inst).collect();
        for inst in instances.into_iter().rev() {
            let child = lib
                .try_cell(inst.child())
                .ok_or_else(|| ExtractError::UnknownCell(inst.name().clone()))?;
            let name = if prefix.is_empty() {
                inst.name().to_string()
            } else {
                format!("{prefix}/{}", inst.name())
            };
            let t = Transformation::cascade(trans, inst.transformation());
            if state.ctx.rule.should_flatten(child.name()) {
                stack.push((inst.child(), t, name, depth + 1));
            } else {
                keep_instance(state, inst.child(), name, t, out, memo)?;
            }
        }
    }
    tracing::debug!(shapes = shapes.len(), "collected geometry");

    classify(state, shapes);
    state.exports = source_exports(state, lib, top, &deferred);
    Ok(())
}

/// Exported pins of `top` with no wires. They carry no geometry, so they are
/// placed only when their export is re-attached.
///
/// Pins of unknown prototypes are left for [`collect`] to report.
fn deferred_pins(state: &CellState, top: &layir::Cell<LayerId>) -> HashSet<NodeId> {
    let mut out = HashSet::new();
    for (_, port) in top.ports() {
        let Some(Terminal::Node(id)) = port.attachment().map(|a| a.terminal) else {
            continue;
        };
        let Some(node) = top.try_node(id) else {
            continue;
        };
        let Ok(proto) = state.tech().try_node(node.proto()) else {
            continue;
        };
        if proto.function == NodeFunction::Pin && top.wires_on(id).next().is_none() {
            out.insert(id);
        }
    }
    out
}

/// Adds an instance of an extracted sub-cell and registers its exports.
fn keep_instance(
    state: &mut CellState,
    child: CellId,
    name: String,
    trans: Transformation,
    out: &LibraryBuilder<LayerId>,
    memo: &IndexMap<CellId, CellId>,
) -> Result<()> {
    let Some(&target) = memo.get(&child) else {
        return Err(state.invariant(format!("sub-cell of instance `{name}` is not extracted yet")));
    };
    let cell = out
        .try_cell(target)
        .ok_or_else(|| state.invariant(format!("extracted sub-cell of `{name}` is missing")))?;
    let id = state
        .cell
        .add_instance(Instance::with_transformation(target, name, trans));
    for (port, export) in cell.ports() {
        let net = state.nets.new_net();
        for element in export.elements() {
            let Element::Shape(s) = element else {
                continue;
            };
            let poly = s.shape().clone().transform(trans).to_polygon();
            state.ports.insert(Entry {
                owner: Owner::Port {
                    terminal: id.into(),
                    port: port.clone(),
                },
                shape: polygon_to_internal(&poly),
                layers: vec![state.canonical(*s.layer())],
                net,
            });
        }
    }
    Ok(())
}

/// Adds collected shapes to the state, typing diffusion of unknown polarity
/// by the select layers over it.
fn classify(state: &mut CellState, shapes: Vec<LayerPolygon>) {
    let tech = state.tech();
    let mut scratch: GeoMerge<LayerId> = GeoMerge::new();
    let mut untyped: Vec<LayerId> = Vec::new();
    let mut selects = Vec::new();
    for (layer, poly) in shapes {
        match tech.layer_function(layer) {
            LayerFunction::Diffusion(None) => {
                let layer = state.canonical(layer);
                if !untyped.contains(&layer) {
                    untyped.push(layer);
                }
                scratch.add(layer, &poly);
                continue;
            }
            LayerFunction::Select(ty) => {
                let canonical = state.canonical(layer);
                if !selects.contains(&(canonical, ty)) {
                    selects.push((canonical, ty));
                }
                scratch.add(canonical, &poly);
            }
            _ => {}
        }
        state.add_shape(layer, &poly);
    }

    for layer in untyped {
        for &(select, ty) in &selects {
            let Some(target) = state.ctx.map.diffusion(tech, ty) else {
                continue;
            };
            let mut typed = GeoMerge::new();
            scratch.intersect_into(layer, select, &mut typed, target);
            for region in typed.regions(target) {
                for poly in split_holes(&region) {
                    scratch.subtract(layer, &poly);
                    state.add_shape(target, &poly);
                }
            }
        }
        for region in scratch.regions(layer) {
            for poly in split_holes(&region) {
                state.add_shape(layer, &poly);
            }
        }
    }
}

/// A representative point of an export shape: the center of its bounding box
/// when the shape covers it, else its first vertex.
fn anchor_point(poly: &Polygon) -> Option<Point> {
    let center = poly.bbox()?.center();
    if poly.encloses(&center) {
        Some(center)
    } else {
        poly.points().first().copied()
    }
}

fn source_exports(
    state: &CellState,
    lib: &Library<LayerId>,
    top: &layir::Cell<LayerId>,
    deferred: &HashSet<NodeId>,
) -> Vec<SourceExport> {
    let tech = state.tech();
    let mut out = Vec::new();
    for (name, port) in top.ports() {
        let mut export = SourceExport {
            name: name.clone(),
            direction: port.direction(),
            elements: port.elements().cloned().collect(),
            location: None,
            pin: None,
        };
        if let Some(attachment) = port.attachment() {
            match attachment.terminal {
                Terminal::Node(id) => {
                    if let Some(node) = top.try_node(id) {
                        if deferred.contains(&id) {
                            export.pin = Some(node.clone());
                        } else {
                            export.location = tech
                                .node_ports(node)
                                .ok()
                                .and_then(|ports| {
                                    ports.into_iter().find(|p| p.name == attachment.port)
                                })
                                .and_then(|p| {
                                    let layer = *p.layers.first()?;
                                    Some((state.canonical(layer), anchor_point(&p.shape)?))
                                });
                        }
                    }
                }
                Terminal::Instance(id) => {
                    export.location = top.try_instance(id).and_then(|inst| {
                        let child = lib.try_cell(inst.child())?;
                        let shape = child
                            .try_port(&attachment.port)?
                            .elements()
                            .find_map(|e| match e {
                                Element::Shape(s) => Some(s),
                                Element::Text(_) => None,
                            })?;
                        let poly = shape
                            .shape()
                            .clone()
                            .transform(inst.transformation())
                            .to_polygon();
                        Some((
                            state.canonical(*shape.layer()),
                            anchor_point(&polygon_to_internal(&poly))?,
                        ))
                    });
                }
            }
        }
        if export.location.is_none() && export.pin.is_none() {
            export.location = export_location(state, &export.elements);
        }
        out.push(export);
    }
    out
}

/// Picks the location of an export from its shapes, preferring routable layers.
fn export_location(state: &CellState, elements: &[Element<LayerId>]) -> Option<(LayerId, Point)> {
    let tech = state.tech();
    let shapes: Vec<(LayerId, Polygon)> = elements
        .iter()
        .filter_map(|e| match e {
            Element::Shape(s) => Some((
                state.canonical(*s.layer()),
                polygon_to_internal(&s.shape().to_polygon()),
            )),
            Element::Text(_) => None,
        })
        .collect();
    shapes
        .iter()
        .find(|(l, _)| tech.arc_for_layer(*l).is_some())
        .or_else(|| shapes.first())
        .and_then(|(l, p)| Some((*l, anchor_point(p)?)))
}

/// Source cells instantiated by `id` and kept, looking through flattened
/// sub-cells.
pub fn kept_children(lib: &Library<LayerId>, id: CellId, rule: &FlattenRule) -> Vec<CellId> {
    let mut out = Vec::new();
    let mut stack = vec![(id, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let Some(cell) = lib.try_cell(id) else {
            continue;
        };
        if depth > MAX_DEPTH {
            break;
        }
        for (_, inst) in cell.instances() {
            let Some(child) = lib.try_cell(inst.child()) else {
                continue;
            };
            if rule.should_flatten(child.name()) {
                stack.push((inst.child(), depth + 1));
            } else if !out.contains(&inst.child()) {
                out.push(inst.child());
            }
        }
    }
    out
}
