//! Goal sheet (personal KPIs and actions).
//!
//! Goals are keyed by person name and edited one field at a time. Edits are
//! held in memory only.

use crate::models::Goal;

/// Healthy salary balance: salary / gross profit <= 35 %
pub const HEALTHY_RATIO: f64 = 0.35;
/// Above 50 % the balance is an alert
pub const CAUTION_RATIO: f64 = 0.5;

/// Classification of the salary / gross profit ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioBand {
    Healthy,
    Caution,
    Alert,
    Unknown,
}

impl RatioBand {
    pub fn of(ratio: Option<f64>) -> Self {
        match ratio {
            Some(r) if r.is_nan() => RatioBand::Unknown,
            Some(r) if r <= HEALTHY_RATIO => RatioBand::Healthy,
            Some(r) if r <= CAUTION_RATIO => RatioBand::Caution,
            Some(_) => RatioBand::Alert,
            None => RatioBand::Unknown,
        }
    }
}

/// Editable goal fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Role,
    Period,
    RevenueTarget,
    GrossTarget,
    Salary,
    Skills,
    Principles,
}

impl GoalField {
    pub fn all() -> &'static [GoalField] {
        &[
            GoalField::Role,
            GoalField::Period,
            GoalField::RevenueTarget,
            GoalField::GrossTarget,
            GoalField::Salary,
            GoalField::Skills,
            GoalField::Principles,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalField::Role => "Role",
            GoalField::Period => "Period",
            GoalField::RevenueTarget => "Revenue target",
            GoalField::GrossTarget => "Gross target",
            GoalField::Salary => "Salary",
            GoalField::Skills => "Skills",
            GoalField::Principles => "Principles",
        }
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|f| f == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }

    pub fn previous(&self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|f| f == self).unwrap_or(0);
        all[(i + all.len() - 1) % all.len()]
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            GoalField::RevenueTarget | GoalField::GrossTarget | GoalField::Salary
        )
    }

    /// Current value rendered as editable text
    pub fn current_text(&self, goal: &Goal) -> String {
        match self {
            GoalField::Role => goal.role.clone(),
            GoalField::Period => goal.period.clone(),
            GoalField::RevenueTarget => goal.revenue_target.to_string(),
            GoalField::GrossTarget => goal.gross_target.to_string(),
            GoalField::Salary => goal.salary.to_string(),
            GoalField::Skills => goal.skills.join(" / "),
            GoalField::Principles => goal.principles.join(" / "),
        }
    }
}

/// Rejected goal edit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GoalEditError {
    #[error("{field} must be a whole number of yen, got {input:?}")]
    InvalidNumber { field: &'static str, input: String },
    #[error("no goal sheet at position {0}")]
    UnknownGoal(usize),
}

/// In-memory goal sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalSheet {
    goals: Vec<Goal>,
}

impl GoalSheet {
    /// Seed from plan defaults (person names are unique, checked at plan load)
    pub fn new(goals: Vec<Goal>) -> Self {
        Self { goals }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn get(&self, index: usize) -> Option<&Goal> {
        self.goals.get(index)
    }

    /// Parse `input` for `field` and apply it to the goal at `index`.
    /// On error the goal is left untouched.
    pub fn edit(&mut self, index: usize, field: GoalField, input: &str) -> Result<(), GoalEditError> {
        let goal = self
            .goals
            .get_mut(index)
            .ok_or(GoalEditError::UnknownGoal(index))?;

        match field {
            GoalField::Role => goal.role = input.trim().to_string(),
            GoalField::Period => goal.period = input.trim().to_string(),
            GoalField::RevenueTarget => goal.revenue_target = parse_yen(field, input)?,
            GoalField::GrossTarget => goal.gross_target = parse_yen(field, input)?,
            GoalField::Salary => goal.salary = parse_yen(field, input)?,
            GoalField::Skills => goal.skills = parse_tags(input),
            GoalField::Principles => goal.principles = parse_tags(input),
        }
        Ok(())
    }
}

fn parse_yen(field: GoalField, input: &str) -> Result<u64, GoalEditError> {
    let digits: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | '¥'))
        .collect();
    digits.parse().map_err(|_| GoalEditError::InvalidNumber {
        field: field.label(),
        input: input.to_string(),
    })
}

fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(['/', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Format yen with thousands separators, e.g. `¥12,000,000`
pub fn format_jpy(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('¥');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Ratio as a whole percentage, `-` when unknown
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) if r.is_finite() => format!("{}%", (r * 100.0).round()),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::Plan;

    fn sheet() -> GoalSheet {
        GoalSheet::new(Plan::builtin().unwrap().goals)
    }

    #[test]
    fn test_ratio_bands() {
        assert_eq!(RatioBand::of(Some(0.3125)), RatioBand::Healthy);
        assert_eq!(RatioBand::of(Some(0.35)), RatioBand::Healthy);
        assert_eq!(RatioBand::of(Some(0.4)), RatioBand::Caution);
        assert_eq!(RatioBand::of(Some(0.5)), RatioBand::Caution);
        assert_eq!(RatioBand::of(Some(0.51)), RatioBand::Alert);
        assert_eq!(RatioBand::of(None), RatioBand::Unknown);
        assert_eq!(RatioBand::of(Some(f64::NAN)), RatioBand::Unknown);
    }

    #[test]
    fn test_builtin_ratios() {
        let sheet = sheet();
        let ratios: Vec<String> = sheet
            .goals()
            .iter()
            .map(|g| format_ratio(g.salary_ratio()))
            .collect();
        assert_eq!(ratios, vec!["31%", "33%", "33%"]);
        assert_eq!(sheet.get(2).map(|g| g.person.as_str()), Some("たくみ"));
        assert!(sheet.get(3).is_none());
    }

    #[test]
    fn test_numeric_edit() {
        let mut sheet = sheet();
        sheet.edit(0, GoalField::Salary, "¥2,400,000").unwrap();
        let goal = sheet.get(0).unwrap();
        assert_eq!(goal.salary, 2_400_000);
        assert_eq!(RatioBand::of(goal.salary_ratio()), RatioBand::Caution);
    }

    #[test]
    fn test_invalid_number_leaves_goal_untouched() {
        let mut sheet = sheet();
        let before = sheet.get(1).cloned();
        let err = sheet.edit(1, GoalField::GrossTarget, "lots").unwrap_err();
        assert_eq!(
            err,
            GoalEditError::InvalidNumber {
                field: "Gross target",
                input: "lots".to_string()
            }
        );
        assert_eq!(sheet.get(1).cloned(), before);
        assert!(sheet.edit(1, GoalField::Salary, "-5").is_err());
    }

    #[test]
    fn test_tag_and_text_edits() {
        let mut sheet = sheet();
        sheet.edit(2, GoalField::Skills, " 営業 / 提案,, BIM ").unwrap();
        sheet.edit(2, GoalField::Period, " 2025-Q4 ").unwrap();
        let goal = sheet.get(2).unwrap();
        assert_eq!(goal.skills, vec!["営業", "提案", "BIM"]);
        assert_eq!(goal.period, "2025-Q4");
        assert_eq!(GoalField::Skills.current_text(goal), "営業 / 提案 / BIM");
    }

    #[test]
    fn test_unknown_goal_index() {
        let mut sheet = sheet();
        assert_eq!(
            sheet.edit(9, GoalField::Role, "x"),
            Err(GoalEditError::UnknownGoal(9))
        );
    }

    #[test]
    fn test_field_cycle() {
        assert_eq!(GoalField::Principles.next(), GoalField::Role);
        assert_eq!(GoalField::Role.previous(), GoalField::Principles);
        assert!(GoalField::Salary.is_numeric());
        assert!(!GoalField::Skills.is_numeric());
    }

    #[test]
    fn test_format_jpy() {
        assert_eq!(format_jpy(0), "¥0");
        assert_eq!(format_jpy(999), "¥999");
        assert_eq!(format_jpy(1_000), "¥1,000");
        assert_eq!(format_jpy(12_000_000), "¥12,000,000");
        assert_eq!(format_jpy(123_456_789), "¥123,456,789");
    }
}
