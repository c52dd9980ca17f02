//! The working state of one cell's extraction and the stage pipeline.

use arcstr::ArcStr;
use diagnostics::IssueSet;
use geometry::prelude::*;
use indexmap::IndexMap;
use layir::{Cell, Direction, Element, Node, NodeId, Wire, WireId};
use tracing::{span, Level};

use crate::cuts::CutIndex;
use crate::diag::{ExtractIssue, IssueKind, RejectReason};
use crate::error::{ExtractError, Result};
use crate::layers::LayerMap;
use crate::merge::{GeoMerge, PolygonMerge};
use crate::networks::Networks;
use crate::opts::{ExtractOpts, FlattenRule};
use crate::ports::{Entry, Owner, PortIndex};
use crate::progress::Progress;
use crate::scale::{rect_to_external, to_internal};
use crate::tech::{ArcProto, LayerId, NodeFunction, Technology};
use crate::template::Templates;
use crate::ExtractStats;
use crate::{bridge, contact, exports, residue, transistor, wire};

/// Everything shared by the extraction of all cells of one run.
pub struct Context<'a> {
    pub tech: &'a Technology,
    pub opts: &'a ExtractOpts,
    pub map: LayerMap,
    pub templates: Templates,
    pub rule: FlattenRule,
    pub progress: &'a dyn Progress,
}

impl<'a> Context<'a> {
    pub fn new(
        tech: &'a Technology,
        opts: &'a ExtractOpts,
        progress: &'a dyn Progress,
    ) -> Result<Self> {
        let map = LayerMap::new(tech);
        let templates = Templates::new(tech, &map);
        Ok(Self {
            tech,
            opts,
            rule: opts.flatten_rule()?,
            map,
            templates,
            progress,
        })
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.progress.is_cancelled() {
            Err(ExtractError::Aborted)
        } else {
            Ok(())
        }
    }
}

/// An export of the source cell, waiting to be re-attached.
#[derive(Debug, Clone)]
pub struct SourceExport {
    pub name: ArcStr,
    pub direction: Direction,
    /// The export's shapes, in external units.
    pub elements: Vec<Element<LayerId>>,
    /// Canonical layer and internal-unit location used to find the matching port.
    pub location: Option<(LayerId, Point)>,
    /// An exported pin without wires, placed only when the export is re-attached.
    pub pin: Option<Node>,
}

/// The working state of one cell.
///
/// Every stage reads and mutates this state in place. `original` holds the
/// collected geometry and never changes after collection; `working` loses
/// the footprint of every realized node and wire.
pub struct CellState<'a> {
    pub ctx: &'a Context<'a>,
    /// The output cell.
    pub cell: Cell<LayerId>,
    pub original: GeoMerge<LayerId>,
    pub working: GeoMerge<LayerId>,
    /// Pending cuts per canonical cut layer.
    pub cuts: IndexMap<LayerId, CutIndex>,
    /// Cut polygons that are not axis-aligned rectangles.
    pub malformed: Vec<(LayerId, Polygon)>,
    pub ports: PortIndex,
    pub nets: Networks,
    pub issues: IssueSet<ExtractIssue>,
    pub stats: ExtractStats,
    pub exports: Vec<SourceExport>,
    /// Regions already covered by a diagnostic, in internal units.
    pub reported: Vec<(LayerId, Rect)>,
}

impl<'a> CellState<'a> {
    pub fn new(ctx: &'a Context<'a>, name: impl Into<ArcStr>) -> Self {
        Self {
            ctx,
            cell: Cell::new(name),
            original: GeoMerge::new(),
            working: GeoMerge::new(),
            cuts: IndexMap::new(),
            malformed: Vec::new(),
            ports: PortIndex::new(),
            nets: Networks::new(),
            issues: IssueSet::new(),
            stats: ExtractStats::default(),
            exports: Vec::new(),
            reported: Vec::new(),
        }
    }

    #[inline]
    pub fn tech(&self) -> &'a Technology {
        self.ctx.tech
    }

    #[inline]
    pub fn opts(&self) -> &'a ExtractOpts {
        self.ctx.opts
    }

    #[inline]
    pub fn canonical(&self, layer: LayerId) -> LayerId {
        self.ctx.map.canonical(layer)
    }

    pub fn name(&self) -> &ArcStr {
        self.cell.name()
    }

    /// Records an issue located at `location`, given in internal units.
    pub fn issue(&mut self, location: Option<Rect>, kind: IssueKind) {
        let issue = ExtractIssue::new(
            self.cell.name().clone(),
            location.map(rect_to_external),
            kind,
        );
        self.issues.add_and_emit(issue);
    }

    pub fn invariant(&self, message: impl Into<String>) -> ExtractError {
        ExtractError::invariant(self.cell.name(), message)
    }

    /// Adds collected geometry on technology layer `layer`, in internal units.
    pub fn add_shape(&mut self, layer: LayerId, poly: &Polygon) {
        let layer = self.canonical(layer);
        if self.tech().layer_function(layer).is_cut() {
            match poly.normalized().as_rect() {
                Some(rect) => {
                    self.cuts
                        .entry(layer)
                        .or_insert_with(|| CutIndex::new(layer))
                        .insert(rect);
                    self.original.add(layer, poly);
                }
                None => {
                    self.issue(poly.bbox(), IssueKind::MalformedCut);
                    self.malformed.push((layer, poly.clone()));
                }
            }
        } else {
            self.original.add(layer, poly);
            self.working.add(layer, poly);
        }
    }

    /// Checks that every shape of `node` lies inside the collected geometry.
    ///
    /// Cut layers are skipped; callers compare cuts against the [`CutIndex`].
    /// Wells the layout may omit are skipped too.
    pub fn node_fits(&self, node: &Node) -> Result<std::result::Result<(), RejectReason>> {
        let tech = self.tech();
        for (layer, poly) in tech.node_shapes(node)? {
            if tech.layer_function(layer).is_cut() || tech.is_implied_well(layer) {
                continue;
            }
            if !self.original.contains(self.canonical(layer), &poly) {
                return Ok(Err(RejectReason::NotContained {
                    layer: tech.layer_name(layer),
                }));
            }
        }
        Ok(Ok(()))
    }

    /// Returns `true` if a wire of `arc` between points `ends` lies inside the
    /// collected geometry. Width and ends are in internal units.
    pub fn arc_fits(&self, arc: &ArcProto, width: i64, ends: [Point; 2], extended: [bool; 2]) -> bool {
        let shapes = self.tech().arc_shapes(arc, width, ends, extended);
        !shapes.is_empty()
            && shapes
                .iter()
                .all(|(l, p)| self.original.contains(self.canonical(*l), p))
    }

    /// Routable canonical layers holding working geometry, with their arcs.
    pub fn routable_layers(&self) -> Vec<(LayerId, &'a ArcProto)> {
        let tech = self.tech();
        let mut out: Vec<_> = self
            .working
            .layers()
            .into_iter()
            .filter(|&l| !tech.layer_function(l).is_cut())
            .filter_map(|l| tech.arc_for_layer(l).map(|arc| (l, arc)))
            .collect();
        out.sort_by_key(|(l, _)| *l);
        out
    }

    /// Places a pin of `arc` at `location`, in internal units.
    pub fn place_pin(&mut self, arc: &ArcProto, location: Point) -> Result<(NodeId, ArcStr)> {
        let proto = self.tech().pin_for_arc(arc)?;
        let port = proto
            .ports
            .first()
            .map(|p| p.name.clone())
            .ok_or_else(|| self.invariant(format!("pin `{}` has no port", proto.name)))?;
        let node = Node::new(
            proto.name.clone(),
            location,
            to_internal(proto.width),
            to_internal(proto.height),
        );
        Ok((self.place_node(node)?, port))
    }

    /// Adds a realized node to the output cell and registers its ports.
    ///
    /// Contacts and pins get one network for all ports; transistor ports each
    /// get their own.
    pub fn place_node(&mut self, node: Node) -> Result<NodeId> {
        let tech = self.tech();
        let proto = tech.try_node(node.proto())?;
        let ports = tech.node_ports(&node)?;
        let id = self.cell.add_node(node);
        let shared = self.nets.new_net();
        for port in ports {
            let net = match proto.function {
                NodeFunction::Transistor(_) => self.nets.new_net(),
                _ => shared,
            };
            let layers = port.layers.iter().map(|&l| self.canonical(l)).collect();
            self.ports.insert(Entry {
                owner: Owner::Port {
                    terminal: id.into(),
                    port: port.name,
                },
                shape: port.shape,
                layers,
                net,
            });
        }
        match proto.function {
            NodeFunction::Pin => self.stats.pins += 1,
            NodeFunction::Contact | NodeFunction::WellContact(_) => self.stats.contacts += 1,
            NodeFunction::Transistor(_) => self.stats.transistors += 1,
        }
        Ok(id)
    }

    /// Removes the footprint of a realized node from the working geometry.
    pub fn consume_node(&mut self, id: NodeId) -> Result<()> {
        let node = self
            .cell
            .try_node(id)
            .ok_or_else(|| self.invariant("consumed node is not in the cell"))?;
        let shapes = self.tech().node_shapes(node)?;
        for (layer, poly) in shapes {
            if !self.tech().layer_function(layer).is_cut() {
                self.working.subtract(self.canonical(layer), &poly);
            }
        }
        Ok(())
    }

    /// Adds a realized wire, joins the networks of its ends and removes its
    /// footprint from the working geometry.
    pub fn place_wire(&mut self, wire: Wire) -> Result<WireId> {
        let shapes = self.tech().wire_shapes(&wire)?;
        let mut net = None;
        for end in wire.ends() {
            let entry = self
                .ports
                .find_port(end.terminal(), end.port())
                .ok_or_else(|| {
                    self.invariant(format!("wire end port `{}` is not placed", end.port()))
                })?;
            let end_net = self.ports.get(entry).net;
            match net {
                None => net = Some(end_net),
                Some(n) => self.nets.union(n, end_net),
            }
        }
        let net = net.unwrap_or_else(|| self.nets.new_net());
        let id = self.cell.add_wire(wire);
        for (layer, poly) in &shapes {
            self.working.subtract(self.canonical(*layer), poly);
        }
        if let Some((layer, poly)) = shapes.into_iter().next() {
            let layers = vec![self.canonical(layer)];
            self.ports.insert(Entry {
                owner: Owner::Wire(id),
                shape: poly,
                layers,
                net,
            });
        }
        self.stats.wires += 1;
        Ok(id)
    }

    /// Returns `true` if a diagnostic already covers `rect` on `layer`.
    pub fn is_reported(&self, layer: LayerId, rect: Rect) -> bool {
        self.reported
            .iter()
            .any(|(l, r)| *l == layer && r.intersection(rect).is_some())
    }
}

/// Runs the extraction stages on a collected cell, in order.
pub fn run_stages(state: &mut CellState) -> Result<()> {
    let span = span!(Level::INFO, "cell", name = %state.name());
    let _guard = span.enter();

    state.ctx.check_cancelled()?;
    contact::extract(state)?;
    state.ctx.check_cancelled()?;
    transistor::extract(state)?;
    if !state.opts().preserve_layers {
        state.ctx.check_cancelled()?;
        wire::extract(state)?;
        state.ctx.check_cancelled()?;
        bridge::extract(state)?;
    }
    state.ctx.check_cancelled()?;
    residue::extract(state)?;
    exports::reconcile(state)?;
    Ok(())
}
