//! Structural comparison of two simulations.
//!
//! Used to check that a replay (or a reloaded snapshot) reached the same state
//! as the run it is compared against.

use std::collections::BTreeSet;
use std::fmt::Write;

use tickwork_engine::Simulation;
use tickwork_foundation::{ComponentType, EntityId, Tick};

// =============================================================================
// Types
// =============================================================================

/// How much detail a diff records for entities alive on both sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffGranularity {
    /// Only record which entities differ.
    Entity,
    /// Record each differing component with both byte values.
    #[default]
    Component,
}

/// A difference in one component between the two sides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentChange {
    /// The component type.
    pub component: ComponentType,
    /// Bytes on the left side (None if absent).
    pub left: Option<Vec<u8>>,
    /// Bytes on the right side (None if absent).
    pub right: Option<Vec<u8>>,
}

impl ComponentChange {
    /// Returns true if the component exists only on the right.
    #[must_use]
    pub fn is_added(&self) -> bool {
        self.left.is_none() && self.right.is_some()
    }

    /// Returns true if the component exists only on the left.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.left.is_some() && self.right.is_none()
    }

    /// Returns true if the component exists on both sides with different bytes.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Differences for one entity alive on both sides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDiff {
    /// The entity.
    pub entity: EntityId,
    /// Component changes; empty at [`DiffGranularity::Entity`].
    pub changes: Vec<ComponentChange>,
}

/// Everything that differs between two simulations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationDiff {
    /// Ticks of the left and right side.
    pub ticks: (Tick, Tick),
    /// Next event sequence numbers of the left and right side.
    pub next_sequences: (u64, u64),
    /// Entities alive only on the left.
    pub left_only: Vec<EntityId>,
    /// Entities alive only on the right.
    pub right_only: Vec<EntityId>,
    /// Entities alive on both sides with differing components.
    pub modified: Vec<EntityDiff>,
    /// Whether the component or event registries differ.
    pub registries_differ: bool,
    /// Whether the pending event queues differ.
    pub pending_events_differ: bool,
    /// Whether the ready event queues differ.
    pub ready_events_differ: bool,
}

impl SimulationDiff {
    /// Returns true if the two sides are equivalent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.0 == self.ticks.1
            && self.next_sequences.0 == self.next_sequences.1
            && self.left_only.is_empty()
            && self.right_only.is_empty()
            && self.modified.is_empty()
            && !self.registries_differ
            && !self.pending_events_differ
            && !self.ready_events_differ
    }

    /// Returns the number of entities that differ.
    #[must_use]
    pub fn affected_count(&self) -> usize {
        self.left_only.len() + self.right_only.len() + self.modified.len()
    }
}

// =============================================================================
// Diff Computation
// =============================================================================

/// Compares two simulations.
///
/// Entities are matched by full id, so a slot reused with a different
/// generation shows up on both `left_only` and `right_only`.
#[must_use]
pub fn diff_simulations(
    left: &Simulation,
    right: &Simulation,
    granularity: DiffGranularity,
) -> SimulationDiff {
    let mut diff = SimulationDiff {
        ticks: (left.tick(), right.tick()),
        next_sequences: (
            left.state().next_sequence(),
            right.state().next_sequence(),
        ),
        ..SimulationDiff::default()
    };

    for entity in left.entities() {
        if !right.is_alive(entity) {
            diff.left_only.push(entity);
        } else if let Some(entity_diff) = diff_entity(left, right, entity, granularity) {
            diff.modified.push(entity_diff);
        }
    }
    diff.right_only = right.entities().filter(|&e| !left.is_alive(e)).collect();

    let (l, r) = (left.state(), right.state());
    diff.registries_differ = !l.world().registry().iter().eq(r.world().registry().iter())
        || !l.event_registry().iter().eq(r.event_registry().iter());
    diff.pending_events_differ = !l.events().pending().eq(r.events().pending());
    diff.ready_events_differ = !l.events().ready().eq(r.events().ready());
    diff
}

fn diff_entity(
    left: &Simulation,
    right: &Simulation,
    entity: EntityId,
    granularity: DiffGranularity,
) -> Option<EntityDiff> {
    let types: BTreeSet<ComponentType> = left
        .component_types(entity)
        .into_iter()
        .chain(right.component_types(entity))
        .flatten()
        .collect();

    let mut changes = Vec::new();
    for component in types {
        let l = left.component_bytes(entity, component).ok();
        let r = right.component_bytes(entity, component).ok();
        if l == r {
            continue;
        }
        if granularity == DiffGranularity::Entity {
            return Some(EntityDiff {
                entity,
                changes: Vec::new(),
            });
        }
        changes.push(ComponentChange {
            component,
            left: l.map(<[u8]>::to_vec),
            right: r.map(<[u8]>::to_vec),
        });
    }

    (!changes.is_empty()).then_some(EntityDiff { entity, changes })
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats a one-line summary of a diff.
#[must_use]
pub fn diff_summary(diff: &SimulationDiff) -> String {
    if diff.is_empty() {
        return "No differences".to_string();
    }

    let mut parts = Vec::new();
    if diff.ticks.0 != diff.ticks.1 {
        parts.push(format!("tick {} vs {}", diff.ticks.0, diff.ticks.1));
    }
    if !diff.left_only.is_empty() {
        parts.push(format!("{} left only", diff.left_only.len()));
    }
    if !diff.right_only.is_empty() {
        parts.push(format!("{} right only", diff.right_only.len()));
    }
    if !diff.modified.is_empty() {
        parts.push(format!("{} modified", diff.modified.len()));
    }
    if diff.registries_differ {
        parts.push("registries differ".to_string());
    }
    if diff.pending_events_differ || diff.ready_events_differ {
        parts.push("event queues differ".to_string());
    }
    if diff.next_sequences.0 != diff.next_sequences.1 {
        parts.push(format!(
            "sequence {} vs {}",
            diff.next_sequences.0, diff.next_sequences.1
        ));
    }
    parts.join(", ")
}

/// Formats a diff for display, one line per difference.
#[must_use]
pub fn format_diff(diff: &SimulationDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", diff_summary(diff));

    for entity in &diff.left_only {
        let _ = writeln!(out, "- {entity}");
    }
    for entity in &diff.right_only {
        let _ = writeln!(out, "+ {entity}");
    }
    for entity_diff in &diff.modified {
        let _ = writeln!(out, "~ {}", entity_diff.entity);
        for change in &entity_diff.changes {
            let _ = match (&change.left, &change.right) {
                (Some(l), Some(r)) => writeln!(out, "    {}: {l:02x?} -> {r:02x?}", change.component),
                (Some(l), None) => writeln!(out, "    -{}: {l:02x?}", change.component),
                (None, Some(r)) => writeln!(out, "    +{}: {r:02x?}", change.component),
                (None, None) => Ok(()),
            };
        }
    }

    out.trim_end().to_string()
}

// =============================================================================
// Tests
// =============================================================================
