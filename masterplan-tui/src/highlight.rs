//! Dependency reachability engine.
//!
//! Given the selected task, collects everything causally connected to it:
//! its transitive dependencies (ancestors) and the tasks that transitively
//! depend on it (descendants). Always runs over the whole, unfiltered catalog.

use std::collections::BTreeSet;

use crate::models::{Task, TaskId};

/// Highlight state of the chart
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Highlight {
    /// No selection: every row at full opacity
    #[default]
    All,
    /// Ids connected to the selected task (always includes it)
    Chain(BTreeSet<TaskId>),
}

impl Highlight {
    /// Whether a row should render at full opacity
    pub fn is_lit(&self, id: TaskId) -> bool {
        match self {
            Highlight::All => true,
            Highlight::Chain(ids) => ids.contains(&id),
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Highlight::All => None,
            Highlight::Chain(ids) => Some(ids.len()),
        }
    }
}

/// Compute the highlight set for `selected`.
///
/// Terminates on cyclic or dangling `deps`: an id enters the visited set at
/// most once and is never revisited. An id missing from the catalog yields a
/// chain containing only that id.
pub fn compute_highlight(catalog: &[Task], selected: Option<TaskId>) -> Highlight {
    let Some(selected) = selected else {
        return Highlight::All;
    };

    let mut chain = BTreeSet::from([selected]);

    // Upstream: depth-first over deps.
    let mut stack = vec![selected];
    while let Some(current) = stack.pop() {
        let Some(task) = catalog.iter().find(|t| t.id == current) else {
            continue;
        };
        for &dep in &task.deps {
            if chain.insert(dep) {
                stack.push(dep);
            }
        }
    }

    // Downstream: rescan the catalog until a full pass finds nothing new.
    let mut downstream = BTreeSet::from([selected]);
    loop {
        let found: Vec<TaskId> = catalog
            .iter()
            .filter(|t| !downstream.contains(&t.id))
            .filter(|t| t.deps.iter().any(|d| downstream.contains(d)))
            .map(|t| t.id)
            .collect();
        if found.is_empty() {
            break;
        }
        downstream.extend(found);
    }

    chain.extend(downstream);
    Highlight::Chain(chain)
}
