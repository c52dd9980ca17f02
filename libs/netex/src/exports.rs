//! Re-attaches the source cell's exports to realized ports.

use geometry::prelude::*;
use layir::{Port, PortAttachment};
use tracing::{span, Level};

use crate::cell::{CellState, SourceExport};
use crate::diag::IssueKind;
use crate::error::Result;
use crate::ports::Owner;

pub fn reconcile(state: &mut CellState) -> Result<()> {
    let span = span!(Level::INFO, "exports");
    let _guard = span.enter();

    let exports = std::mem::take(&mut state.exports);
    for export in &exports {
        let attachment = attach(state, export)?;
        tracing::trace!(name = %export.name, attached = attachment.is_some(), "reconciled export");
        let mut port = Port::new(export.direction);
        for element in &export.elements {
            port.add_element(element.clone());
        }
        port.set_attachment(attachment);
        state.cell.add_port(export.name.clone(), port);
    }
    Ok(())
}

fn attach(state: &mut CellState, export: &SourceExport) -> Result<Option<PortAttachment>> {
    if let Some(pin) = export.pin.clone() {
        let proto = state.tech().try_node(pin.proto())?;
        let port = proto
            .ports
            .first()
            .map(|p| p.name.clone())
            .ok_or_else(|| state.invariant(format!("pin `{}` has no port", proto.name)))?;
        let id = state.place_node(pin)?;
        return Ok(Some(PortAttachment::new(id, port)));
    }

    let Some((layer, p)) = export.location else {
        state.issue(
            None,
            IssueKind::ExportUnmatched {
                name: export.name.clone(),
            },
        );
        return Ok(None);
    };

    if let Some(id) = state.ports.port_at(layer, p) {
        if let Some((terminal, port)) = state.ports.get(id).port() {
            return Ok(Some(PortAttachment::new(terminal, port.clone())));
        }
    }

    // A wire running through the export takes it at its nearest end.
    let spot = Rect::from_point(p).to_polygon();
    for id in state.ports.touching(layer, &spot) {
        let Owner::Wire(wire) = state.ports.get(id).owner else {
            continue;
        };
        let Some(wire) = state.cell.try_wire(wire) else {
            continue;
        };
        let nearest = wire.ends().iter().min_by_key(|e| e.location().dist2(p));
        if let Some(end) = nearest {
            return Ok(Some(PortAttachment::new(end.terminal(), end.port().clone())));
        }
    }

    state.issue(
        Some(Rect::from_point(p)),
        IssueKind::ExportUnmatched {
            name: export.name.clone(),
        },
    );
    let Some(arc) = state.tech().arc_for_layer(layer) else {
        return Ok(None);
    };
    let (node, port) = state.place_pin(arc, p)?;
    Ok(Some(PortAttachment::new(node, port)))
}
