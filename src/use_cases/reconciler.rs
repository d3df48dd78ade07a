// Marker reconciliation: brings the canvas marker set in line with a frame.
//
// Markers are keyed by entity id per layer and never leave this module; the
// canvas only ever sees create/move/restyle/remove calls.

use crate::domain::geo::project;
use crate::domain::ports::{MapCanvas, MarkerHandle, MarkerKind};
use crate::domain::style::{
    IconSettings, MarkerStyle, projectile_marker_style, unit_marker_style,
};
use crate::domain::{FactionTable, LatLon};
use crate::use_cases::store::EntityFrame;
use std::collections::HashMap;

/// Inputs to styling that live outside the frame.
#[derive(Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub selected_id: Option<&'a str>,
    pub factions: &'a FactionTable,
    pub icons: &'a IconSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub moved: usize,
    pub restyled: usize,
    pub removed: usize,
    /// The selected unit's marker was removed in this pass.
    pub selected_removed: bool,
}

struct MarkerSlot {
    handle: MarkerHandle,
    style: MarkerStyle,
}

struct MarkerLayer {
    kind: MarkerKind,
    slots: HashMap<String, MarkerSlot>,
}

impl MarkerLayer {
    fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            slots: HashMap::new(),
        }
    }

    fn upsert(
        &mut self,
        canvas: &mut dyn MapCanvas,
        id: &str,
        position: LatLon,
        style: MarkerStyle,
        report: &mut ReconcileReport,
    ) {
        match self.slots.get_mut(id) {
            Some(slot) => {
                canvas.move_marker(slot.handle, position);
                report.moved += 1;
                // Restyle in place so the canvas keeps its interaction handlers.
                if slot.style != style {
                    canvas.restyle_marker(slot.handle, &style);
                    slot.style = style;
                    report.restyled += 1;
                }
            }
            None => {
                let handle = canvas.add_marker(self.kind, id, position, &style);
                self.slots.insert(id.to_string(), MarkerSlot { handle, style });
                report.created += 1;
            }
        }
    }

    fn restyle(&mut self, canvas: &mut dyn MapCanvas, id: &str, style: MarkerStyle) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if slot.style != style => {
                canvas.restyle_marker(slot.handle, &style);
                slot.style = style;
                true
            }
            _ => false,
        }
    }

    fn remove_absent(
        &mut self,
        canvas: &mut dyn MapCanvas,
        is_present: impl Fn(&str) -> bool,
    ) -> Vec<String> {
        let stale: Vec<String> = self
            .slots
            .keys()
            .filter(|id| !is_present(id.as_str()))
            .cloned()
            .collect();
        for id in &stale {
            if let Some(slot) = self.slots.remove(id) {
                canvas.remove_marker(slot.handle);
            }
        }
        stale
    }

    fn clear(&mut self, canvas: &mut dyn MapCanvas) -> usize {
        let removed = self.slots.len();
        for (_, slot) in self.slots.drain() {
            canvas.remove_marker(slot.handle);
        }
        removed
    }
}

pub struct MarkerReconciler {
    canvas: Box<dyn MapCanvas>,
    units: MarkerLayer,
    projectiles: MarkerLayer,
}

impl MarkerReconciler {
    pub fn new(canvas: Box<dyn MapCanvas>) -> Self {
        Self {
            canvas,
            units: MarkerLayer::new(MarkerKind::Unit),
            projectiles: MarkerLayer::new(MarkerKind::Projectile),
        }
    }

    pub fn canvas_mut(&mut self) -> &mut dyn MapCanvas {
        self.canvas.as_mut()
    }

    /// One reconciliation pass at `elapsed_sec` past the frame's reference time.
    pub fn reconcile(
        &mut self,
        frame: &EntityFrame,
        elapsed_sec: f64,
        ctx: ReconcileContext<'_>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let canvas = self.canvas.as_mut();

        for unit in frame.units() {
            let position = project(
                unit.latitude,
                unit.longitude,
                unit.heading,
                unit.speed_mps,
                elapsed_sec,
            );
            let style = unit_marker_style(unit, ctx.selected_id, ctx.factions, ctx.icons);
            self.units
                .upsert(canvas, &unit.id, position, style, &mut report);
        }

        for projectile in frame.projectiles() {
            let position = project(
                projectile.latitude,
                projectile.longitude,
                projectile.heading,
                projectile.speed_mps,
                elapsed_sec,
            );
            let style = projectile_marker_style(projectile, ctx.icons);
            self.projectiles
                .upsert(canvas, &projectile.id, position, style, &mut report);
        }

        let removed_units = self
            .units
            .remove_absent(canvas, |id| frame.contains_unit(id));
        let removed_projectiles = self
            .projectiles
            .remove_absent(canvas, |id| frame.contains_projectile(id));

        report.removed = removed_units.len() + removed_projectiles.len();
        report.selected_removed = ctx
            .selected_id
            .is_some_and(|selected| removed_units.iter().any(|id| id == selected));
        report
    }

    /// Re-applies unit styles without moving markers (selection toggles).
    pub fn restyle_units(&mut self, frame: &EntityFrame, ctx: ReconcileContext<'_>) -> usize {
        let canvas = self.canvas.as_mut();
        let mut restyled = 0;
        for unit in frame.units() {
            let style = unit_marker_style(unit, ctx.selected_id, ctx.factions, ctx.icons);
            if self.units.restyle(canvas, &unit.id, style) {
                restyled += 1;
            }
        }
        restyled
    }

    /// Removes every marker from the canvas.
    pub fn clear(&mut self) -> usize {
        let canvas = self.canvas.as_mut();
        self.units.clear(canvas) + self.projectiles.clear(canvas)
    }

    pub fn unit_marker_count(&self) -> usize {
        self.units.slots.len()
    }

    pub fn has_unit_marker(&self, id: &str) -> bool {
        self.units.slots.contains_key(id)
    }

    pub fn has_projectile_marker(&self, id: &str) -> bool {
        self.projectiles.slots.contains_key(id)
    }
}
