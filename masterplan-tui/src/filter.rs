//! Task filtering by phase, owner and free text.

use std::collections::BTreeSet;

use crate::models::{Owner, PhasePalette, Task};

/// Owner filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerFilter {
    #[default]
    All,
    Only(Owner),
}

impl OwnerFilter {
    /// Cycle All -> sena -> LS -> Joint -> All
    pub fn next(&self) -> Self {
        let owners = Owner::all();
        match self {
            OwnerFilter::All => OwnerFilter::Only(owners[0]),
            OwnerFilter::Only(owner) => owners
                .iter()
                .position(|o| o == owner)
                .and_then(|i| owners.get(i + 1))
                .map_or(OwnerFilter::All, |o| OwnerFilter::Only(*o)),
        }
    }

    pub fn matches(&self, owner: Owner) -> bool {
        match self {
            OwnerFilter::All => true,
            OwnerFilter::Only(o) => *o == owner,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OwnerFilter::All => "All",
            OwnerFilter::Only(o) => o.key(),
        }
    }
}

/// Current filter predicate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// Enabled phases
    pub phases: BTreeSet<String>,
    pub owner: OwnerFilter,
    pub query: String,
}

impl FilterState {
    /// Everything visible: all palette phases enabled, no owner, no query
    pub fn all(palette: &PhasePalette) -> Self {
        Self {
            phases: palette.names().map(str::to_string).collect(),
            owner: OwnerFilter::All,
            query: String::new(),
        }
    }

    /// Toggle a phase; returns whether it is now enabled
    pub fn toggle_phase(&mut self, phase: &str) -> bool {
        if self.phases.remove(phase) {
            false
        } else {
            self.phases.insert(phase.to_string());
            true
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.phases.contains(&task.phase) || !self.owner.matches(task.owner) {
            return false;
        }
        let query = self.query.trim();
        query.is_empty()
            || task.name.contains(query)
            || task.phase.contains(query)
            || task.id.to_string().contains(query)
            || task.owner_display.contains(query)
    }

    /// Tasks passing the filter, in catalog order
    pub fn apply<'a>(&self, catalog: &'a [Task]) -> Vec<&'a Task> {
        catalog.iter().filter(|t| self.matches(t)).collect()
    }
}
