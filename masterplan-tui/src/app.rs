//! Application state and event handling.
//!
//! Elm-style: a single [`App`] owns the plan and every piece of UI state,
//! keys are folded into it by [`App::handle_key`], and the chart is derived
//! from it on demand by the layout and highlight engines.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::catalog::Plan;
use crate::config::Settings;
use crate::export::{
    encode_png, goals_csv, render_chart_png, tasks_csv, ExportCommand, ExportKind, ExportMessage,
};
use crate::filter::FilterState;
use crate::goals::{GoalField, GoalSheet};
use crate::highlight::{compute_highlight, Highlight};
use crate::layout::{compute_layout, Layout, LayoutConfig};
use crate::models::{Task, TaskId, Zoom};
use crate::timeline::{visible_days, TimelineState, NAME_COLUMN_WIDTH};

/// Active tab in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    /// Gantt chart (default)
    #[default]
    Gantt,
    /// Personal goal sheets
    Goals,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Gantt, Tab::Goals]
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Gantt => Tab::Goals,
            Tab::Goals => Tab::Gantt,
        }
    }

    pub fn previous(&self) -> Self {
        self.next()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tab::Gantt => "Gantt",
            Tab::Goals => "Goals",
        }
    }
}

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Typing the search query
    Search,
    /// Editing a goal field
    EditGoal,
}

/// Error popup state
#[derive(Debug, Clone)]
pub struct ErrorPopup {
    pub title: String,
    pub message: String,
    pub shown_at: Instant,
    /// Auto-dismiss duration (None for manual dismiss)
    pub auto_dismiss: Option<Duration>,
}

impl ErrorPopup {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            shown_at: Instant::now(),
            auto_dismiss: Some(Duration::from_secs(5)),
        }
    }

    pub fn should_dismiss(&self) -> bool {
        self.auto_dismiss
            .is_some_and(|duration| self.shown_at.elapsed() > duration)
    }
}

/// Log entry for the message area
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub message: String,
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}

/// Main application state
#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub active_tab: Tab,
    pub input_mode: InputMode,

    /// Loaded plan; tasks never change after start-up
    pub plan: Plan,
    /// Editable copy of the plan's goals
    pub goals: GoalSheet,

    pub filter: FilterState,
    pub zoom: Zoom,
    /// Task feeding the highlight engine
    pub selected: Option<TaskId>,
    pub timeline_state: TimelineState,
    layout_config: LayoutConfig,
    pub today: NaiveDate,

    /// Goal under the cursor on the Goals tab
    pub goal_cursor: usize,
    pub goal_field: GoalField,
    /// Text being typed while editing a goal field
    pub edit_buffer: String,

    pub out_dir: PathBuf,
    pub export_prefix: String,

    pub error_popup: Option<ErrorPopup>,
    pub logs: Vec<LogEntry>,
    max_logs: usize,
    pub show_help: bool,

    /// Last known terminal width, used to keep the cursor's bar in view
    pub viewport_width: u16,
}

impl App {
    pub fn new(plan: Plan, settings: &Settings, today: NaiveDate) -> Self {
        let layout_config = LayoutConfig::for_plan(&plan, settings.pad_days, today);
        let warnings = plan.warnings();
        let mut app = Self {
            should_quit: false,
            active_tab: Tab::Gantt,
            input_mode: InputMode::Normal,
            goals: GoalSheet::new(plan.goals.clone()),
            filter: FilterState::all(&plan.palette),
            zoom: settings.zoom,
            selected: None,
            timeline_state: TimelineState::default(),
            layout_config,
            today,
            goal_cursor: 0,
            goal_field: GoalField::Role,
            edit_buffer: String::new(),
            out_dir: settings.out_dir.clone(),
            export_prefix: settings.export_prefix.clone(),
            error_popup: None,
            logs: Vec::new(),
            max_logs: 100,
            show_help: false,
            viewport_width: 120,
            plan,
        };

        app.log(LogEntry::info(format!(
            "Loaded {} tasks, {} milestones, {} goal sheets",
            app.plan.tasks.len(),
            app.plan.milestones.len(),
            app.goals.len()
        )));
        for warning in warnings {
            app.log(LogEntry::warning(warning.to_string()));
        }
        app.sync_timeline();
        app.timeline_state.select_next(app.plan.tasks.len());
        app
    }

    /// Add a log entry
    pub fn log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
        if self.logs.len() > self.max_logs {
            self.logs.remove(0);
        }
    }

    /// Show an error popup
    pub fn show_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        let title = title.into();
        let message = message.into();
        self.log(LogEntry::error(format!("{}: {}", title, message)));
        self.error_popup = Some(ErrorPopup::new(title, message));
    }

    pub fn dismiss_error(&mut self) {
        self.error_popup = None;
    }

    // ============================================
    // Derived chart state
    // ============================================

    /// Layout of the filtered tasks at the current zoom
    pub fn layout(&self) -> Layout<'_> {
        let visible = self.filter.apply(&self.plan.tasks);
        compute_layout(&visible, self.zoom, &self.layout_config, &self.plan.palette)
    }

    /// Highlight chain of the selection, over the whole catalog
    pub fn highlight(&self) -> Highlight {
        compute_highlight(&self.plan.tasks, self.selected)
    }

    /// Task on the cursor row
    pub fn cursor_task(&self) -> Option<&Task> {
        let cursor = self.timeline_state.cursor?;
        self.layout().rows.get(cursor).map(|row| row.task)
    }

    /// Select a task as the root of the highlight chain
    pub fn on_task_selected(&mut self, id: TaskId) {
        self.selected = Some(id);
        let chain = self.highlight().len().unwrap_or(0);
        debug!(task = id, chain, "task selected");
        let name = self
            .plan
            .task(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "unknown task".to_string());
        self.log(LogEntry::info(format!("Selected #{} {} ({} linked)", id, name, chain)));
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            debug!("selection cleared");
            self.log(LogEntry::info("Selection cleared"));
        }
    }

    /// Columns available to bars at the current terminal width
    fn chart_columns(&self) -> u16 {
        self.viewport_width.saturating_sub(2 + NAME_COLUMN_WIDTH)
    }

    /// Re-validate cursor and scroll after filters or zoom changed
    fn sync_timeline(&mut self) {
        let (rows, total_days) = {
            let layout = self.layout();
            (layout.rows.len(), layout.total_days)
        };
        self.timeline_state.clamp(rows, total_days);
    }

    /// Scroll the cursor's bar into view
    fn reveal_cursor(&mut self) {
        let start = {
            let layout = self.layout();
            self.timeline_state
                .cursor
                .and_then(|i| layout.rows.get(i))
                .map(|row| row.offset_days)
        };
        if let Some(day) = start {
            let days = visible_days(self.chart_columns(), self.zoom);
            self.timeline_state.reveal_day(day, days);
        }
    }

    fn set_zoom(&mut self, zoom: Zoom) {
        if zoom != self.zoom {
            self.zoom = zoom;
            debug!(zoom = zoom.name(), "zoom changed");
            self.sync_timeline();
            self.reveal_cursor();
        }
    }

    fn toggle_phase(&mut self, index: usize) {
        let Some(phase) = self.plan.palette.phases().get(index).map(|p| p.name.clone()) else {
            return;
        };
        let enabled = self.filter.toggle_phase(&phase);
        debug!(phase = %phase, enabled, "phase filter toggled");
        self.log(LogEntry::info(format!(
            "{} {}",
            phase,
            if enabled { "shown" } else { "hidden" }
        )));
        self.sync_timeline();
    }

    // ============================================
    // Exports
    // ============================================

    fn write_command(&mut self, kind: ExportKind, bytes: Vec<u8>) -> ExportCommand {
        let path = kind.path_in(&self.out_dir, &self.export_prefix);
        info!(%kind, path = %path.display(), "export requested");
        self.log(LogEntry::info(format!("Exporting {}...", kind)));
        ExportCommand::Write { kind, path, bytes }
    }

    fn export_tasks(&mut self) -> ExportCommand {
        let csv = tasks_csv(&self.plan.tasks);
        self.write_command(ExportKind::TasksCsv, csv.into_bytes())
    }

    fn export_goals(&mut self) -> ExportCommand {
        let csv = goals_csv(self.goals.goals());
        self.write_command(ExportKind::GoalsCsv, csv.into_bytes())
    }

    fn export_chart(&mut self) -> Option<ExportCommand> {
        let encoded = {
            let layout = self.layout();
            let highlight = self.highlight();
            let markers = layout.milestone_markers(&self.plan.milestones);
            encode_png(&render_chart_png(&layout, &highlight, &markers, self.today))
        };
        match encoded {
            Ok(bytes) => Some(self.write_command(ExportKind::ChartPng, bytes)),
            Err(e) => {
                self.show_error("Export failed", format!("PNG encoding: {}", e));
                None
            }
        }
    }

    /// Handle a reply from the export worker
    pub fn handle_export_message(&mut self, message: ExportMessage) {
        match message {
            ExportMessage::Written(kind, path) => {
                self.log(LogEntry::success(format!("{} saved to {}", kind, path.display())));
            }
            ExportMessage::Failed(kind, reason) => {
                self.show_error(format!("{} export failed", kind), reason);
            }
        }
    }

    // ============================================
    // Keys
    // ============================================

    /// Handle key events and return an optional export command
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ExportCommand> {
        if self.error_popup.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                self.dismiss_error();
            }
            return None;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter) {
                self.show_help = false;
            }
            return None;
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Search => {
                self.handle_search_key(key);
                None
            }
            InputMode::EditGoal => {
                self.handle_edit_goal_key(key);
                None
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<ExportCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return Some(ExportCommand::Shutdown);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Some(ExportCommand::Shutdown);
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                return None;
            }
            KeyCode::Tab => {
                self.active_tab = self.active_tab.next();
                return None;
            }
            KeyCode::BackTab => {
                self.active_tab = self.active_tab.previous();
                return None;
            }
            _ => {}
        }

        match self.active_tab {
            Tab::Gantt => self.handle_gantt_key(key),
            Tab::Goals => self.handle_goals_key(key),
        }
    }

    fn handle_gantt_key(&mut self, key: KeyEvent) -> Option<ExportCommand> {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let rows = self.layout().rows.len();
                self.timeline_state.select_next(rows);
                self.reveal_cursor();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let rows = self.layout().rows.len();
                self.timeline_state.select_previous(rows);
                self.reveal_cursor();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.cursor_task().map(|t| t.id) {
                    self.on_task_selected(id);
                }
            }
            KeyCode::Esc => self.clear_selection(),
            KeyCode::Char('h') | KeyCode::Left => {
                self.timeline_state.scroll_left(if shift { 7 } else { 1 });
            }
            KeyCode::Char('H') => self.timeline_state.scroll_left(7),
            KeyCode::Char('l') | KeyCode::Right => {
                let total = self.layout().total_days;
                self.timeline_state.scroll_right(if shift { 7 } else { 1 }, total);
            }
            KeyCode::Char('L') => {
                let total = self.layout().total_days;
                self.timeline_state.scroll_right(7, total);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.set_zoom(self.zoom.finer()),
            KeyCode::Char('-') => self.set_zoom(self.zoom.coarser()),
            KeyCode::Char('z') => self.set_zoom(self.zoom.next()),
            KeyCode::Char(c @ '1'..='9') => self.toggle_phase(c as usize - '1' as usize),
            KeyCode::Char('0') => self.toggle_phase(9),
            KeyCode::Char('a') => {
                self.filter.phases = FilterState::all(&self.plan.palette).phases;
                debug!("all phases enabled");
                self.log(LogEntry::info("All phases shown"));
                self.sync_timeline();
            }
            KeyCode::Char('o') => {
                self.filter.owner = self.filter.owner.next();
                debug!(owner = self.filter.owner.label(), "owner filter changed");
                self.log(LogEntry::info(format!("Owner: {}", self.filter.owner.label())));
                self.sync_timeline();
            }
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Char('x') => return Some(self.export_tasks()),
            KeyCode::Char('P') => return self.export_chart(),
            _ => {}
        }
        None
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                debug!(query = %self.filter.query, "search applied");
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                self.filter.query.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.filter.query.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter.query.push(c);
            }
            _ => return,
        }
        self.sync_timeline();
    }

    fn handle_goals_key(&mut self, key: KeyEvent) -> Option<ExportCommand> {
        let total = self.goals.len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down if total > 0 => {
                self.goal_cursor = (self.goal_cursor + 1) % total;
            }
            KeyCode::Char('k') | KeyCode::Up if total > 0 => {
                self.goal_cursor = self.goal_cursor.checked_sub(1).unwrap_or(total - 1);
            }
            KeyCode::Char('l') | KeyCode::Right => self.goal_field = self.goal_field.next(),
            KeyCode::Char('h') | KeyCode::Left => self.goal_field = self.goal_field.previous(),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(goal) = self.goals.get(self.goal_cursor) {
                    self.edit_buffer = self.goal_field.current_text(goal);
                    self.input_mode = InputMode::EditGoal;
                }
            }
            KeyCode::Char('x') => return Some(self.export_goals()),
            _ => {}
        }
        None
    }

    fn handle_edit_goal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let field = self.goal_field;
                match self.goals.edit(self.goal_cursor, field, &self.edit_buffer) {
                    Ok(()) => {
                        let person = self
                            .goals
                            .get(self.goal_cursor)
                            .map(|g| g.person.clone())
                            .unwrap_or_default();
                        debug!(person = %person, field = field.label(), "goal edited");
                        self.log(LogEntry::success(format!("{}: {} updated", person, field.label())));
                        self.edit_buffer.clear();
                        self.input_mode = InputMode::Normal;
                    }
                    Err(e) => self.show_error("Invalid value", e.to_string()),
                }
            }
            KeyCode::Esc => {
                self.edit_buffer.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.edit_buffer.push(c);
            }
            _ => {}
        }
    }

    /// Per-frame housekeeping
    pub fn tick(&mut self, width: u16) {
        self.viewport_width = width;
        if self.error_popup.as_ref().is_some_and(ErrorPopup::should_dismiss) {
            self.error_popup = None;
        }
    }

    /// Get the status bar text
    pub fn status_text(&self) -> String {
        let selection = self
            .selected
            .map(|id| format!("#{}", id))
            .unwrap_or_else(|| "none".to_string());
        format!(
            "{} | zoom: {} | owner: {} | selected: {} | ?: Help | q: Quit",
            self.active_tab.name(),
            self.zoom.name(),
            self.filter.owner.label(),
            selection
        )
    }
}
