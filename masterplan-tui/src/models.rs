//! Domain models for the master plan.
//!
//! These structs match the plan file schema and use serde for JSON deserialization.
//! Dates are plain calendar dates (`NaiveDate`); no timezone is involved.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable task identifier, assigned when the plan is authored
pub type TaskId = u32;

/// Responsible party for a task (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "sena")]
    Sena,
    #[serde(rename = "LS")]
    Ls,
    Joint,
}

impl Owner {
    /// Get all owners in filter order
    pub fn all() -> &'static [Owner] {
        &[Owner::Sena, Owner::Ls, Owner::Joint]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Owner::Sena => "sena",
            Owner::Ls => "LS",
            Owner::Joint => "Joint",
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================
// Tasks
// ============================================

/// A single plan task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub phase: String,
    pub name: String,
    pub owner: Owner,
    pub owner_display: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub deliverable: String,
    #[serde(default)]
    pub deps: Vec<TaskId>,
}

impl Task {
    /// Row label shown in the chart's name column
    pub fn label(&self) -> String {
        format!("{} {}（{}）", self.id, self.name, self.owner_display)
    }

    /// Inclusive length in days as authored (may be <= 0 for malformed data)
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Dated reference marker, independent of the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub date: NaiveDate,
}

// ============================================
// Phases
// ============================================

/// Invalid `#rrggbb` colour literal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid colour {0:?}, expected #rrggbb")]
pub struct InvalidColor(pub String);

/// RGB colour parsed from a `#rrggbb` literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhaseColor(pub u8, pub u8, pub u8);

impl PhaseColor {
    /// Neutral colour used for phases missing from the palette (#94a3b8)
    pub const DEFAULT: PhaseColor = PhaseColor(0x94, 0xA3, 0xB8);
}

impl FromStr for PhaseColor {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(PhaseColor(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for PhaseColor {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhaseColor> for String {
    fn from(color: PhaseColor) -> Self {
        color.to_string()
    }
}

impl std::fmt::Display for PhaseColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Phase entry of the palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDef {
    pub name: String,
    pub color: PhaseColor,
}

/// Ordered phase palette; the order is the phase filter's display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhasePalette {
    phases: Vec<PhaseDef>,
}

impl PhasePalette {
    pub fn new(phases: Vec<PhaseDef>) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> &[PhaseDef] {
        &self.phases
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(|p| p.name.as_str())
    }

    /// Colour of a phase, falling back to [`PhaseColor::DEFAULT`]
    pub fn color_of(&self, phase: &str) -> PhaseColor {
        self.phases
            .iter()
            .find(|p| p.name == phase)
            .map(|p| p.color)
            .unwrap_or(PhaseColor::DEFAULT)
    }
}

// ============================================
// Zoom
// ============================================

/// Timeline zoom level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Zoom {
    Day,
    #[default]
    Week,
    Month,
}

impl Zoom {
    /// Tick interval in days
    pub fn tick_step(&self) -> i64 {
        match self {
            Zoom::Day => 1,
            Zoom::Week => 7,
            Zoom::Month => 30,
        }
    }

    /// Terminal columns drawn per day
    pub fn columns_per_day(&self) -> f64 {
        match self {
            Zoom::Day => 2.0,
            Zoom::Week => 1.0,
            Zoom::Month => 0.5,
        }
    }

    /// Cycle day -> week -> month -> day
    pub fn next(&self) -> Self {
        match self {
            Zoom::Day => Zoom::Week,
            Zoom::Week => Zoom::Month,
            Zoom::Month => Zoom::Day,
        }
    }

    /// One level more detailed (saturating)
    pub fn finer(&self) -> Self {
        match self {
            Zoom::Month => Zoom::Week,
            _ => Zoom::Day,
        }
    }

    /// One level less detailed (saturating)
    pub fn coarser(&self) -> Self {
        match self {
            Zoom::Day => Zoom::Week,
            _ => Zoom::Month,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Zoom::Day => "day",
            Zoom::Week => "week",
            Zoom::Month => "month",
        }
    }
}

// ============================================
// Goals
// ============================================

/// Recurring action on a goal sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub what: String,
    pub cadence: String,
    pub kpi: String,
}

/// Quarterly KPI sheet of one person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub person: String,
    pub role: String,
    pub period: String,
    pub revenue_target: u64,
    pub gross_target: u64,
    pub salary: u64,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub principles: Vec<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Goal {
    /// Salary divided by gross profit target; `None` when the target is zero
    pub fn salary_ratio(&self) -> Option<f64> {
        if self.gross_target == 0 {
            return None;
        }
        Some(self.salary as f64 / self.gross_target as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_task_deserialization() {
        let json = r##"{
            "id": 5, "phase": "P1", "name": "PoC", "owner": "LS", "ownerDisplay": "LS（新井）",
            "start": "2025-08-21", "end": "2025-08-27", "deliverable": "demo", "deps": [3, 4]
        }"##;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.owner, Owner::Ls);
        assert_eq!(task.start, date(2025, 8, 21));
        assert_eq!(task.deps, vec![3, 4]);
        assert_eq!(task.span_days(), 7);
        assert_eq!(task.label(), "5 PoC（LS（新井））");
    }

    #[test]
    fn test_phase_color_parsing() {
        assert_eq!("#0ea5e9".parse::<PhaseColor>(), Ok(PhaseColor(0x0E, 0xA5, 0xE9)));
        assert_eq!(PhaseColor(0x33, 0x41, 0x55).to_string(), "#334155");
        assert!("0ea5e9".parse::<PhaseColor>().is_err());
        assert!("#0ea5e".parse::<PhaseColor>().is_err());
        assert!("#zzzzzz".parse::<PhaseColor>().is_err());
        assert!("#ééé".parse::<PhaseColor>().is_err());
    }

    #[test]
    fn test_palette_fallback() {
        let palette = PhasePalette::new(vec![PhaseDef {
            name: "P0".to_string(),
            color: PhaseColor(1, 2, 3),
        }]);
        assert_eq!(palette.color_of("P0"), PhaseColor(1, 2, 3));
        assert_eq!(palette.color_of("nope"), PhaseColor::DEFAULT);
    }

    #[test]
    fn test_zoom_steps() {
        assert_eq!(Zoom::Day.tick_step(), 1);
        assert_eq!(Zoom::Week.tick_step(), 7);
        assert_eq!(Zoom::Month.tick_step(), 30);
        assert_eq!(Zoom::Day.finer(), Zoom::Day);
        assert_eq!(Zoom::Month.coarser(), Zoom::Month);
        assert_eq!(Zoom::Week.next().next().next(), Zoom::Week);
    }

    #[test]
    fn test_salary_ratio() {
        let mut goal = Goal {
            person: "sena".to_string(),
            role: String::new(),
            period: "2025-Q3".to_string(),
            revenue_target: 12_000_000,
            gross_target: 4_800_000,
            salary: 1_500_000,
            skills: vec![],
            principles: vec![],
            actions: vec![],
        };
        assert_eq!(goal.salary_ratio(), Some(0.3125));
        goal.gross_target = 0;
        assert_eq!(goal.salary_ratio(), None);
    }
}
