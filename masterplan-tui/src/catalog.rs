//! Plan catalog: tasks, milestones, phase palette and default goals.
//!
//! The built-in plan ships as embedded JSON; an alternative plan file with the
//! same schema can be loaded at start-up. The catalog is immutable once loaded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::{Goal, Milestone, PhaseDef, PhasePalette, Task, TaskId};

/// Built-in plan (kick-off 2025-08-18, Go/No-Go 2025-11-14)
const BUILTIN_PLAN: &str = include_str!("../assets/plan.json");

/// Errors raised while loading a plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read plan file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid plan JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),
    #[error("duplicate goal sheet for {0:?}")]
    DuplicateGoal(String),
}

/// Authoring problems that are tolerated at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    DanglingDependency { task: TaskId, dep: TaskId },
    EndBeforeStart { task: TaskId },
    UnknownPhase { task: TaskId, phase: String },
}

impl std::fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanWarning::DanglingDependency { task, dep } => {
                write!(f, "task {} depends on unknown task {}", task, dep)
            }
            PlanWarning::EndBeforeStart { task } => {
                write!(f, "task {} ends before it starts", task)
            }
            PlanWarning::UnknownPhase { task, phase } => {
                write!(f, "task {} uses phase {:?} missing from the palette", task, phase)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanFile {
    #[serde(default)]
    phases: Vec<PhaseDef>,
    tasks: Vec<Task>,
    #[serde(default)]
    milestones: Vec<Milestone>,
    #[serde(default)]
    goals: Vec<Goal>,
}

/// Loaded plan
#[derive(Debug, Clone)]
pub struct Plan {
    pub palette: PhasePalette,
    pub tasks: Vec<Task>,
    pub milestones: Vec<Milestone>,
    /// Seed values for the goal sheet
    pub goals: Vec<Goal>,
}

impl Plan {
    /// The plan compiled into the binary
    pub fn builtin() -> Result<Self, PlanError> {
        Self::from_json(BUILTIN_PLAN)
    }

    /// Load a plan file from disk
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let json = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let plan = Self::from_json(&json)?;
        info!(path = %path.display(), tasks = plan.tasks.len(), "plan loaded");
        Ok(plan)
    }

    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let file: PlanFile = serde_json::from_str(json)?;

        let mut ids = HashSet::new();
        for task in &file.tasks {
            if !ids.insert(task.id) {
                return Err(PlanError::DuplicateTask(task.id));
            }
        }

        let mut people = HashSet::new();
        for goal in &file.goals {
            if !people.insert(goal.person.as_str()) {
                return Err(PlanError::DuplicateGoal(goal.person.clone()));
            }
        }

        let plan = Self {
            palette: PhasePalette::new(file.phases),
            tasks: file.tasks,
            milestones: file.milestones,
            goals: file.goals,
        };

        for warning in plan.warnings() {
            warn!("{}", warning);
        }

        Ok(plan)
    }

    /// Look up a task by id
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Earliest start and latest end over the whole catalog
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.tasks.iter().map(|t| t.start).min()?;
        let end = self.tasks.iter().map(|t| t.end).max()?;
        Some((start, end))
    }

    /// Authoring problems found in the catalog
    pub fn warnings(&self) -> Vec<PlanWarning> {
        let ids: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        let known_phases: HashSet<&str> = self.palette.names().collect();

        let mut warnings = Vec::new();
        for task in &self.tasks {
            for &dep in &task.deps {
                if !ids.contains(&dep) {
                    warnings.push(PlanWarning::DanglingDependency { task: task.id, dep });
                }
            }
            if task.end < task.start {
                warnings.push(PlanWarning::EndBeforeStart { task: task.id });
            }
            if !known_phases.contains(task.phase.as_str()) {
                warnings.push(PlanWarning::UnknownPhase {
                    task: task.id,
                    phase: task.phase.clone(),
                });
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builtin_plan_is_consistent() {
        let plan = Plan::builtin().unwrap();
        assert_eq!(plan.tasks.len(), 38);
        assert_eq!(plan.milestones.len(), 8);
        assert_eq!(plan.palette.phases().len(), 10);
        assert_eq!(plan.goals.len(), 3);
        assert_eq!(plan.warnings(), vec![]);
        assert_eq!(plan.bounds(), Some((date(2025, 8, 18), date(2025, 11, 14))));
    }

    #[test]
    fn test_builtin_gate_dependencies() {
        let plan = Plan::builtin().unwrap();
        let gate = plan.task(7).unwrap();
        assert_eq!(gate.deps, vec![3, 4, 5, 6]);
        assert_eq!(gate.start, gate.end);
        assert!(plan.task(99).is_none());
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let json = r#"{"tasks": [
            {"id": 1, "phase": "P", "name": "a", "owner": "sena", "ownerDisplay": "sena",
             "start": "2025-01-01", "end": "2025-01-02", "deliverable": ""},
            {"id": 1, "phase": "P", "name": "b", "owner": "sena", "ownerDisplay": "sena",
             "start": "2025-01-01", "end": "2025-01-02", "deliverable": ""}
        ]}"#;
        assert!(matches!(Plan::from_json(json), Err(PlanError::DuplicateTask(1))));
    }

    #[test]
    fn test_duplicate_goal_rejected() {
        let goal = r#"{"person": "sena", "role": "", "period": "", "revenueTarget": 0,
                       "grossTarget": 0, "salary": 0}"#;
        let json = format!(r#"{{"tasks": [], "goals": [{goal}, {goal}]}}"#);
        assert!(matches!(
            Plan::from_json(&json),
            Err(PlanError::DuplicateGoal(name)) if name == "sena"
        ));
    }

    #[test]
    fn test_warnings_for_tolerated_problems() {
        let json = r##"{
            "phases": [{"name": "P", "color": "#112233"}],
            "tasks": [
                {"id": 1, "phase": "P", "name": "a", "owner": "LS", "ownerDisplay": "LS",
                 "start": "2025-01-05", "end": "2025-01-02", "deliverable": "", "deps": [9]},
                {"id": 2, "phase": "Q", "name": "b", "owner": "Joint", "ownerDisplay": "LS×sena",
                 "start": "2025-01-01", "end": "2025-01-02", "deliverable": "", "deps": [1]}
            ]
        }"##;
        let plan = Plan::from_json(json).unwrap();
        assert_eq!(
            plan.warnings(),
            vec![
                PlanWarning::DanglingDependency { task: 1, dep: 9 },
                PlanWarning::EndBeforeStart { task: 1 },
                PlanWarning::UnknownPhase { task: 2, phase: "Q".to_string() },
            ]
        );
    }

    #[test]
    fn test_bad_color_is_a_json_error() {
        let json = r#"{"phases": [{"name": "P", "color": "blue"}], "tasks": []}"#;
        assert!(matches!(Plan::from_json(json), Err(PlanError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tasks": [{{"id": 3, "phase": "P", "name": "x", "owner": "sena",
                "ownerDisplay": "sena", "start": "2025-02-01", "end": "2025-02-03",
                "deliverable": "d"}}]}}"#
        )
        .unwrap();

        let plan = Plan::load(file.path()).unwrap();
        assert_eq!(plan.tasks[0].id, 3);
        assert!(plan.tasks[0].deps.is_empty());
        assert!(plan.goals.is_empty());

        let missing = Plan::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(PlanError::Io { .. })));
    }
}
