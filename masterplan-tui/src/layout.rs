//! Timeline layout engine.
//!
//! Turns an (already filtered) task list into rows positioned on a shared,
//! day-indexed horizontal axis. Pure: the same input always yields the same
//! layout, so it is recomputed whenever filters or zoom change.

use chrono::{Days, NaiveDate};

use crate::catalog::Plan;
use crate::models::{Milestone, PhaseColor, PhasePalette, Task, TaskId, Zoom};

/// Default days of padding before the earliest start and after the latest end
pub const DEFAULT_PAD_DAYS: u32 = 2;

/// Layout parameters that do not change with filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub pad_days: u32,
    /// Domain used when the filtered list is empty (overall project start/end)
    pub fallback: (NaiveDate, NaiveDate),
}

impl LayoutConfig {
    pub fn new(pad_days: u32, fallback: (NaiveDate, NaiveDate)) -> Self {
        Self { pad_days, fallback }
    }

    /// Fallback to the plan's overall bounds, or `today` for an empty plan
    pub fn for_plan(plan: &Plan, pad_days: u32, today: NaiveDate) -> Self {
        Self::new(pad_days, plan.bounds().unwrap_or((today, today)))
    }
}

/// Geometry of one chart row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineRow<'a> {
    pub task: &'a Task,
    /// Days from the domain start to the bar start (>= 0)
    pub offset_days: i64,
    /// Bar length in days (>= 1)
    pub duration_days: i64,
    pub color: PhaseColor,
}

impl TimelineRow<'_> {
    pub fn task_id(&self) -> TaskId {
        self.task.id
    }

    /// Day index just past the bar
    pub fn end_day(&self) -> i64 {
        self.offset_days + self.duration_days
    }
}

/// Milestone placed on the day axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'m> {
    pub milestone: &'m Milestone,
    pub day: i64,
}

/// Computed timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Layout<'a> {
    pub domain_start: NaiveDate,
    pub domain_end: NaiveDate,
    pub total_days: i64,
    /// Rows in display order (start ascending, then id ascending)
    pub rows: Vec<TimelineRow<'a>>,
    /// Tick positions in days; first is 0, last is `total_days`
    pub ticks: Vec<i64>,
}

impl<'a> Layout<'a> {
    /// Day index of a date, if it falls inside the domain
    pub fn day_of(&self, date: NaiveDate) -> Option<i64> {
        let day = (date - self.domain_start).num_days();
        (0..=self.total_days).contains(&day).then_some(day)
    }

    /// Date at a day index (saturating at the domain start)
    pub fn date_at(&self, day: i64) -> NaiveDate {
        let days = Days::new(day.max(0) as u64);
        self.domain_start.checked_add_days(days).unwrap_or(self.domain_end)
    }

    /// Milestones that fall inside the domain
    pub fn milestone_markers<'m>(&self, milestones: &'m [Milestone]) -> Vec<Marker<'m>> {
        milestones
            .iter()
            .filter_map(|m| self.day_of(m.date).map(|day| Marker { milestone: m, day }))
            .collect()
    }
}

/// Lay out `tasks` on a shared day axis.
///
/// An empty list falls back to `config.fallback` so the axis stays drawable
/// when filters eliminate every task. Degenerate source dates (end before
/// start) are clamped to a one-day bar at a non-negative offset.
pub fn compute_layout<'a>(
    tasks: &[&'a Task],
    zoom: Zoom,
    config: &LayoutConfig,
    palette: &PhasePalette,
) -> Layout<'a> {
    let (min_start, max_end) = match (
        tasks.iter().map(|t| t.start).min(),
        tasks.iter().map(|t| t.end).max(),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => config.fallback,
    };

    let pad = Days::new(u64::from(config.pad_days));
    let domain_start = min_start.checked_sub_days(pad).unwrap_or(min_start);
    let domain_end = max_end
        .checked_add_days(pad)
        .unwrap_or(max_end)
        .max(domain_start);
    let total_days = (domain_end - domain_start).num_days();

    let mut ordered: Vec<&'a Task> = tasks.to_vec();
    ordered.sort_by_key(|t| (t.start, t.id));

    let rows = ordered
        .into_iter()
        .map(|task| TimelineRow {
            task,
            offset_days: (task.start - domain_start).num_days().max(0),
            duration_days: ((task.end - task.start).num_days() + 1).max(1),
            color: palette.color_of(&task.phase),
        })
        .collect();

    Layout {
        domain_start,
        domain_end,
        total_days,
        rows,
        ticks: ticks(total_days, zoom.tick_step()),
    }
}

/// `0, step, 2*step, ...` up to `total_days`, always ending at `total_days`
fn ticks(total_days: i64, step: i64) -> Vec<i64> {
    let step = step.max(1) as usize;
    let mut ticks: Vec<i64> = (0..=total_days.max(0)).step_by(step).collect();
    if ticks.last() != Some(&total_days) {
        ticks.push(total_days);
    }
    ticks
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Owner, PhaseDef};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: TaskId, phase: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task {
            id,
            phase: phase.to_string(),
            name: format!("task {}", id),
            owner: Owner::Sena,
            owner_display: "sena".to_string(),
            start,
            end,
            deliverable: String::new(),
            deps: vec![],
        }
    }

    fn palette() -> PhasePalette {
        PhasePalette::new(vec![PhaseDef {
            name: "P0".to_string(),
            color: PhaseColor(0x33, 0x41, 0x55),
        }])
    }

    fn config() -> LayoutConfig {
        LayoutConfig::new(2, (date(2025, 8, 18), date(2025, 11, 14)))
    }

    fn geometry(layout: &Layout<'_>) -> Vec<(TaskId, i64, i64)> {
        layout
            .rows
            .iter()
            .map(|r| (r.task_id(), r.offset_days, r.duration_days))
            .collect()
    }

    #[test]
    fn test_two_task_week_layout() {
        let first = task(1, "P0", date(2025, 8, 18), date(2025, 8, 19));
        let mut second = task(2, "P0", date(2025, 8, 18), date(2025, 8, 20));
        second.deps = vec![1];

        let layout = compute_layout(&[&second, &first], Zoom::Week, &config(), &palette());

        assert_eq!(layout.domain_start, date(2025, 8, 16));
        assert_eq!(layout.domain_end, date(2025, 8, 22));
        assert_eq!(layout.total_days, 6);
        assert_eq!(geometry(&layout), vec![(1, 2, 2), (2, 2, 3)]);
        assert_eq!(layout.ticks, vec![0, 6]);
    }

    #[test]
    fn test_empty_list_uses_fallback_domain() {
        let layout = compute_layout(&[], Zoom::Month, &config(), &palette());
        assert_eq!(layout.domain_start, date(2025, 8, 16));
        assert_eq!(layout.domain_end, date(2025, 11, 16));
        assert_eq!(layout.total_days, 92);
        assert!(layout.rows.is_empty());
        assert_eq!(layout.ticks, vec![0, 30, 60, 90, 92]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let a = task(9, "P0", date(2025, 9, 1), date(2025, 9, 3));
        let b = task(3, "P0", date(2025, 9, 1), date(2025, 9, 1));
        let c = task(5, "P0", date(2025, 8, 30), date(2025, 9, 10));

        let layout = compute_layout(&[&a, &b, &c], Zoom::Day, &config(), &palette());
        let order: Vec<TaskId> = layout.rows.iter().map(|r| r.task_id()).collect();
        assert_eq!(order, vec![5, 3, 9]);

        let again = compute_layout(&[&c, &a, &b], Zoom::Day, &config(), &palette());
        assert_eq!(geometry(&again), geometry(&layout));
    }

    #[test]
    fn test_single_day_task_spans_one_unit() {
        let gate = task(7, "P0", date(2025, 8, 29), date(2025, 8, 29));
        let layout = compute_layout(&[&gate], Zoom::Week, &config(), &palette());
        assert_eq!(geometry(&layout), vec![(7, 2, 1)]);
        assert_eq!(layout.total_days, 4);
        assert_eq!(layout.ticks, vec![0, 4]);
    }

    #[test]
    fn test_malformed_dates_are_clamped() {
        let backwards = task(1, "P0", date(2025, 8, 20), date(2025, 8, 10));
        let layout = compute_layout(&[&backwards], Zoom::Day, &config(), &palette());
        let row = layout.rows[0];
        assert!(row.offset_days >= 0);
        assert_eq!(row.duration_days, 1);
        assert!(layout.total_days >= 0);
        assert_eq!(layout.ticks.first(), Some(&0));
        assert_eq!(layout.ticks.last(), Some(&layout.total_days));
    }

    #[test]
    fn test_domain_cannot_invert() {
        let backwards = task(1, "P0", date(2025, 8, 20), date(2025, 8, 10));
        let tight = LayoutConfig::new(0, config().fallback);
        let layout = compute_layout(&[&backwards], Zoom::Week, &tight, &palette());
        assert_eq!(layout.domain_end, layout.domain_start);
        assert_eq!(layout.total_days, 0);
        assert_eq!(layout.ticks, vec![0]);
    }

    #[test]
    fn test_identical_tasks_overlap() {
        let tasks: Vec<Task> = (1..=4)
            .map(|id| task(id, "P0", date(2025, 9, 1), date(2025, 9, 5)))
            .collect();
        let refs: Vec<&Task> = tasks.iter().collect();
        let layout = compute_layout(&refs, Zoom::Week, &config(), &palette());
        assert_eq!(
            geometry(&layout),
            vec![(1, 2, 5), (2, 2, 5), (3, 2, 5), (4, 2, 5)]
        );
    }

    #[test]
    fn test_unknown_phase_gets_default_color() {
        let known = task(1, "P0", date(2025, 9, 1), date(2025, 9, 2));
        let unknown = task(2, "Zzz", date(2025, 9, 1), date(2025, 9, 2));
        let layout = compute_layout(&[&known, &unknown], Zoom::Week, &config(), &palette());
        assert_eq!(layout.rows[0].color, PhaseColor(0x33, 0x41, 0x55));
        assert_eq!(layout.rows[1].color, PhaseColor::DEFAULT);
    }

    #[test]
    fn test_ticks_terminate_at_domain_edge_for_every_zoom() {
        let plan = Plan::builtin().unwrap();
        let refs: Vec<&Task> = plan.tasks.iter().collect();
        let config = LayoutConfig::for_plan(&plan, DEFAULT_PAD_DAYS, date(2025, 8, 14));

        for zoom in [Zoom::Day, Zoom::Week, Zoom::Month] {
            let layout = compute_layout(&refs, zoom, &config, &plan.palette);
            assert_eq!(layout.total_days, 92);
            assert_eq!(layout.ticks.first(), Some(&0));
            assert_eq!(layout.ticks.last(), Some(&92));
            assert!(layout.ticks.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_builtin_rows_stay_inside_domain() {
        let plan = Plan::builtin().unwrap();
        let refs: Vec<&Task> = plan.tasks.iter().collect();
        let config = LayoutConfig::for_plan(&plan, DEFAULT_PAD_DAYS, date(2025, 8, 14));
        let layout = compute_layout(&refs, Zoom::Week, &config, &plan.palette);

        assert!(plan.tasks.iter().all(|t| layout.domain_start <= t.start));
        assert!(plan.tasks.iter().all(|t| layout.domain_end >= t.end));
        for row in &layout.rows {
            assert!(row.offset_days >= 0);
            assert!(row.duration_days >= 1);
            assert!(row.end_day() <= layout.total_days);
        }
        assert_eq!(layout.rows.len(), 38);
    }

    #[test]
    fn test_marker_placement() {
        let first = task(1, "P0", date(2025, 8, 18), date(2025, 8, 29));
        let layout = compute_layout(&[&first], Zoom::Week, &config(), &palette());
        let milestones = vec![
            Milestone { name: "M1".to_string(), date: date(2025, 8, 29) },
            Milestone { name: "M3".to_string(), date: date(2025, 9, 29) },
        ];

        let markers = layout.milestone_markers(&milestones);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].milestone.name, "M1");
        assert_eq!(markers[0].day, 13);
        assert_eq!(layout.day_of(date(2025, 8, 14)), None);
        assert_eq!(layout.date_at(13), date(2025, 8, 29));
    }
}
