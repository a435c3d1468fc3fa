//! Gantt chart widget.
//!
//! Draws a computed [`Layout`]: a name column, a date axis with the layout's
//! ticks, one bar per row in its phase colour (rows outside the highlight
//! chain faded), milestone columns and the today column.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::highlight::Highlight;
use crate::layout::{Layout, Marker, TimelineRow};
use crate::models::{TaskId, Zoom};
use crate::theme::{colors, fade, phase_color, styles, DIMMED_OPACITY};

const BLOCK_FULL: char = '█';
const AXIS_LINE: char = '─';
const AXIS_TICK: char = '┬';
const MILESTONE_LINE: char = '┊';
const MILESTONE_MARK: char = '◆';
const TODAY_LINE: char = '│';
const TODAY_MARK: char = '▼';
const CURSOR: &str = "▸ ";

/// Width of the task name column, including the cursor prefix
pub const NAME_COLUMN_WIDTH: u16 = 30;

/// Rows taken by the date axis
const AXIS_HEIGHT: u16 = 2;

/// Scroll and cursor state of the chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineState {
    /// Days hidden to the left of the viewport
    pub scroll_offset: i64,
    /// Display row under the cursor
    pub cursor: Option<usize>,
}

impl TimelineState {
    /// Scroll left (earlier in time)
    pub fn scroll_left(&mut self, amount: i64) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount).max(0);
    }

    /// Scroll right (later in time), never past the domain end
    pub fn scroll_right(&mut self, amount: i64, total_days: i64) {
        self.scroll_offset = self
            .scroll_offset
            .saturating_add(amount)
            .min(total_days.max(0));
    }

    /// Move cursor up, wrapping
    pub fn select_previous(&mut self, total: usize) {
        if total == 0 {
            self.cursor = None;
            return;
        }
        self.cursor = Some(match self.cursor {
            Some(i) if i > 0 && i < total => i - 1,
            Some(_) => total - 1,
            None => 0,
        });
    }

    /// Move cursor down, wrapping
    pub fn select_next(&mut self, total: usize) {
        if total == 0 {
            self.cursor = None;
            return;
        }
        self.cursor = Some(match self.cursor {
            Some(i) if i + 1 < total => i + 1,
            Some(_) => 0,
            None => 0,
        });
    }

    /// Keep the cursor and scroll valid after the row set or domain changed
    pub fn clamp(&mut self, total_rows: usize, total_days: i64) {
        self.cursor = match self.cursor {
            _ if total_rows == 0 => None,
            Some(i) => Some(i.min(total_rows - 1)),
            None => None,
        };
        self.scroll_offset = self.scroll_offset.clamp(0, total_days.max(0));
    }

    /// Scroll so that `day` is inside a viewport of `visible_days`
    pub fn reveal_day(&mut self, day: i64, visible_days: i64) {
        let visible_days = visible_days.max(1);
        if day < self.scroll_offset || day >= self.scroll_offset + visible_days {
            self.scroll_offset = (day - visible_days / 4).max(0);
        }
    }
}

/// Days that fit into `chart_columns` at `zoom`
pub fn visible_days(chart_columns: u16, zoom: Zoom) -> i64 {
    (f64::from(chart_columns) / zoom.columns_per_day()).floor() as i64
}

/// Truncate to `width` terminal cells, with an ellipsis when cut, padded to width
pub fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        let pad = width - text.width();
        return format!("{}{}", text, " ".repeat(pad));
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    if width > 0 {
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Gantt chart widget
pub struct TimelineWidget<'a> {
    layout: &'a Layout<'a>,
    highlight: &'a Highlight,
    markers: &'a [Marker<'a>],
    state: &'a TimelineState,
    zoom: Zoom,
    today: Option<i64>,
    selected: Option<TaskId>,
    title: &'a str,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(
        layout: &'a Layout<'a>,
        highlight: &'a Highlight,
        state: &'a TimelineState,
        zoom: Zoom,
    ) -> Self {
        Self {
            layout,
            highlight,
            markers: &[],
            state,
            zoom,
            today: None,
            selected: None,
            title: " Master plan ",
        }
    }

    pub fn markers(mut self, markers: &'a [Marker<'a>]) -> Self {
        self.markers = markers;
        self
    }

    /// Day index of today, if inside the domain
    pub fn today(mut self, day: Option<i64>) -> Self {
        self.today = day;
        self
    }

    pub fn selected(mut self, id: Option<TaskId>) -> Self {
        self.selected = id;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    /// Viewport column of a day index (may be negative or past the width)
    fn column_of(&self, day: i64) -> i64 {
        ((day - self.state.scroll_offset) as f64 * self.zoom.columns_per_day()).floor() as i64
    }

    fn visible_column(&self, day: i64, width: u16) -> Option<u16> {
        let col = self.column_of(day);
        (0..i64::from(width)).contains(&col).then_some(col as u16)
    }

    /// First display row drawn, keeping the cursor on screen
    fn first_row(&self, height: usize) -> usize {
        match self.state.cursor {
            Some(cursor) if height > 0 && cursor >= height => cursor + 1 - height,
            _ => 0,
        }
    }

    fn render_axis(&self, area: Rect, buf: &mut Buffer) {
        let mut label_end: u16 = 0;
        for &tick in &self.layout.ticks {
            let Some(col) = self.visible_column(tick, area.width) else {
                continue;
            };
            let label = self.layout.date_at(tick).format("%m/%d").to_string();
            let label_width = label.width() as u16;
            if col >= label_end && col + label_width <= area.width {
                buf.set_string(area.x + col, area.y, &label, styles::text_dim());
                label_end = col + label_width + 1;
            }
        }

        let axis_end = self.column_of(self.layout.total_days).clamp(0, i64::from(area.width)) as u16;
        for col in 0..axis_end.max(1).min(area.width) {
            buf[(area.x + col, area.y + 1)]
                .set_char(AXIS_LINE)
                .set_style(Style::default().fg(colors::BORDER));
        }
        for &tick in &self.layout.ticks {
            if let Some(col) = self.visible_column(tick, area.width) {
                buf[(area.x + col, area.y + 1)].set_char(AXIS_TICK);
            }
        }
        for marker in self.markers {
            if let Some(col) = self.visible_column(marker.day, area.width) {
                buf[(area.x + col, area.y + 1)]
                    .set_char(MILESTONE_MARK)
                    .set_style(Style::default().fg(colors::MILESTONE));
            }
        }
        if let Some(col) = self.today.and_then(|d| self.visible_column(d, area.width)) {
            buf[(area.x + col, area.y + 1)]
                .set_char(TODAY_MARK)
                .set_style(Style::default().fg(colors::TODAY_MARKER).add_modifier(Modifier::BOLD));
        }
    }

    fn render_row(&self, name_area: Rect, chart_area: Rect, buf: &mut Buffer, row: &TimelineRow<'_>, index: usize) {
        let lit = self.highlight.is_lit(row.task_id());
        let on_cursor = self.state.cursor == Some(index);
        let is_selected = self.selected == Some(row.task_id());

        let prefix = if on_cursor { CURSOR } else { "  " };
        buf.set_string(name_area.x, name_area.y, prefix, styles::title_accent());

        let name_width = name_area.width.saturating_sub(2) as usize;
        let label = fit_width(&row.task.label(), name_width);
        let name_style = if on_cursor {
            styles::selected()
        } else if is_selected {
            styles::title_accent()
        } else if lit {
            styles::text()
        } else {
            styles::text_hint()
        };
        buf.set_stringn(name_area.x + 2, name_area.y, &label, name_width, name_style);

        let start = self.column_of(row.offset_days);
        let end = self.column_of(row.end_day()).max(start + 1);
        let visible_start = start.max(0);
        let visible_end = end.min(i64::from(chart_area.width));
        if visible_start >= visible_end {
            return;
        }

        let base = phase_color(row.color);
        let color = if lit { base } else { fade(base, DIMMED_OPACITY) };
        let mut style = Style::default().fg(color);
        if is_selected {
            style = style.add_modifier(Modifier::BOLD);
        }
        for col in visible_start..visible_end {
            buf[(chart_area.x + col as u16, chart_area.y)]
                .set_char(BLOCK_FULL)
                .set_style(style);
        }
    }

    /// Vertical reference line through empty cells of the rows area
    fn render_vline(&self, area: Rect, buf: &mut Buffer, day: i64, symbol: char, style: Style) {
        let Some(col) = self.visible_column(day, area.width) else {
            return;
        };
        for y in area.y..area.y + area.height {
            let cell = &mut buf[(area.x + col, y)];
            if cell.symbol() == " " {
                cell.set_char(symbol).set_style(style);
            }
        }
    }

    fn render_legend(&self, area: Rect, buf: &mut Buffer) {
        let legend_y = area.y + area.height - 1;
        let mut x = area.x + 6;
        let items = [
            (BLOCK_FULL, "chain", colors::FG_PRIMARY),
            (BLOCK_FULL, "other", fade(colors::FG_PRIMARY, DIMMED_OPACITY)),
            (MILESTONE_LINE, "milestone", colors::MILESTONE),
            (TODAY_LINE, "today", colors::TODAY_MARKER),
        ];
        for (icon, label, color) in items {
            let width = label.len() as u16 + 3;
            if x + width > area.x + area.width.saturating_sub(16) {
                break;
            }
            buf.set_string(x, legend_y, icon.to_string(), Style::default().fg(color));
            buf.set_string(x + 1, legend_y, label, styles::text_hint());
            x += width;
        }

        let zoom = format!(" {} ", self.zoom.name());
        let zoom_x = area.x + area.width.saturating_sub(zoom.len() as u16 + 5);
        if zoom_x > x {
            buf.set_string(zoom_x, legend_y, &zoom, styles::info());
        }
    }
}

impl Widget for TimelineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title)
            .title_style(styles::title_accent())
            .borders(Borders::ALL)
            .border_style(styles::border())
            .style(Style::default().bg(colors::BG_DARK));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < NAME_COLUMN_WIDTH + 10 || inner.height <= AXIS_HEIGHT {
            return;
        }

        let chart_x = inner.x + NAME_COLUMN_WIDTH;
        let chart_width = inner.width - NAME_COLUMN_WIDTH;
        self.render_axis(Rect::new(chart_x, inner.y, chart_width, AXIS_HEIGHT), buf);

        let rows_height = inner.height - AXIS_HEIGHT;
        let rows_area = Rect::new(chart_x, inner.y + AXIS_HEIGHT, chart_width, rows_height);

        if self.layout.rows.is_empty() {
            buf.set_string(inner.x + 2, rows_area.y, "No tasks match the filter", styles::text_hint());
        }

        let first = self.first_row(rows_height as usize);
        for (offset, row) in self
            .layout
            .rows
            .iter()
            .enumerate()
            .skip(first)
            .take(rows_height as usize)
        {
            let y = rows_area.y + (offset - first) as u16;
            self.render_row(
                Rect::new(inner.x, y, NAME_COLUMN_WIDTH, 1),
                Rect::new(chart_x, y, chart_width, 1),
                buf,
                row,
                offset,
            );
        }

        let milestone_style = Style::default().fg(colors::MILESTONE).add_modifier(Modifier::DIM);
        for marker in self.markers {
            self.render_vline(rows_area, buf, marker.day, MILESTONE_LINE, milestone_style);
        }
        if let Some(today) = self.today {
            let style = Style::default().fg(colors::TODAY_MARKER);
            self.render_vline(rows_area, buf, today, TODAY_LINE, style);
        }

        self.render_legend(area, buf);

        if self.state.scroll_offset > 0 {
            buf.set_string(area.x + 1, area.y + area.height - 1, "◀ h", styles::text_hint());
        }
        if self.column_of(self.layout.total_days) >= i64::from(chart_width) {
            buf.set_string(area.x + area.width - 4, area.y + area.height - 1, "l ▶", styles::text_hint());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout::{compute_layout, LayoutConfig};
    use crate::models::{Milestone, Owner, PhaseColor, PhaseDef, PhasePalette, Task};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: u32, start: NaiveDate, end: NaiveDate) -> Task {
        Task {
            id,
            phase: "P0".to_string(),
            name: format!("task {}", id),
            owner: Owner::Sena,
            owner_display: "sena".to_string(),
            start,
            end,
            deliverable: String::new(),
            deps: vec![],
        }
    }

    const P0: PhaseColor = PhaseColor(0x33, 0x41, 0x55);

    fn palette() -> PhasePalette {
        PhasePalette::new(vec![PhaseDef { name: "P0".to_string(), color: P0 }])
    }

    #[test]
    fn test_cursor_wraps() {
        let mut state = TimelineState::default();
        state.select_next(3);
        assert_eq!(state.cursor, Some(0));
        state.select_previous(3);
        assert_eq!(state.cursor, Some(2));
        state.select_next(3);
        assert_eq!(state.cursor, Some(0));
        state.select_next(0);
        assert_eq!(state.cursor, None);
    }

    #[test]
    fn test_scroll_is_bounded() {
        let mut state = TimelineState::default();
        state.scroll_left(7);
        assert_eq!(state.scroll_offset, 0);
        state.scroll_right(100, 92);
        assert_eq!(state.scroll_offset, 92);

        state.cursor = Some(10);
        state.clamp(4, 30);
        assert_eq!(state, TimelineState { scroll_offset: 30, cursor: Some(3) });
        state.clamp(0, 30);
        assert_eq!(state.cursor, None);
    }

    #[test]
    fn test_reveal_day() {
        let mut state = TimelineState::default();
        state.reveal_day(10, 40);
        assert_eq!(state.scroll_offset, 0);
        state.reveal_day(60, 40);
        assert_eq!(state.scroll_offset, 50);
        state.reveal_day(55, 40);
        assert_eq!(state.scroll_offset, 50);
    }

    #[test]
    fn test_visible_days_follow_zoom() {
        assert_eq!(visible_days(60, Zoom::Day), 30);
        assert_eq!(visible_days(60, Zoom::Week), 60);
        assert_eq!(visible_days(60, Zoom::Month), 120);
    }

    #[test]
    fn test_fit_width_handles_wide_characters() {
        assert_eq!(fit_width("abc", 5), "abc  ");
        assert_eq!(fit_width("abcdef", 4), "abc…");
        // Each kana is two cells wide.
        assert_eq!(fit_width("ローンチ準備", 7), "ローン…");
        assert_eq!(fit_width("ローンチ準備", 6), "ロー… ");
        assert_eq!(fit_width("ローンチ準備", 6).width(), 6);
    }

    #[test]
    fn test_render_bars_and_dimming() {
        let first = task(1, date(2025, 8, 18), date(2025, 8, 19));
        let second = task(2, date(2025, 8, 18), date(2025, 8, 20));
        let config = LayoutConfig::new(2, (first.start, second.end));
        let layout = compute_layout(&[&first, &second], Zoom::Week, &config, &palette());
        let highlight = Highlight::Chain(BTreeSet::from([1]));
        let state = TimelineState { scroll_offset: 0, cursor: Some(0) };

        let area = Rect::new(0, 0, 80, 10);
        let mut buf = Buffer::empty(area);
        TimelineWidget::new(&layout, &highlight, &state, Zoom::Week)
            .selected(Some(1))
            .render(area, &mut buf);

        // Inner area starts at (1, 1); rows start below the two axis lines.
        let chart_x = 1 + NAME_COLUMN_WIDTH;
        let lit = &buf[(chart_x + 2, 3)];
        assert_eq!(lit.symbol(), "█");
        assert_eq!(lit.fg, phase_color(P0));
        assert_eq!(buf[(chart_x + 4, 3)].symbol(), " ");

        let dimmed = &buf[(chart_x + 4, 4)];
        assert_eq!(dimmed.symbol(), "█");
        assert_eq!(dimmed.fg, fade(phase_color(P0), DIMMED_OPACITY));

        assert_eq!(buf[(1, 3)].symbol(), "▸");
        assert_eq!(buf[(3, 3)].symbol(), "1");
        assert_eq!(buf[(chart_x, 2)].symbol(), "┬");
        assert_eq!(buf[(chart_x + 6, 2)].symbol(), "┬");
    }

    #[test]
    fn test_render_markers_and_today() {
        let first = task(1, date(2025, 8, 18), date(2025, 8, 29));
        let config = LayoutConfig::new(2, (first.start, first.end));
        let layout = compute_layout(&[&first], Zoom::Day, &config, &palette());
        let milestones = vec![Milestone { name: "M1".to_string(), date: date(2025, 8, 20) }];
        let markers = layout.milestone_markers(&milestones);
        let state = TimelineState::default();

        let area = Rect::new(0, 0, 80, 6);
        let mut buf = Buffer::empty(area);
        TimelineWidget::new(&layout, &Highlight::All, &state, Zoom::Day)
            .markers(&markers)
            .today(layout.day_of(date(2025, 8, 17)))
            .render(area, &mut buf);

        let chart_x = 1 + NAME_COLUMN_WIDTH;
        // Day zoom draws two columns per day: M1 on day 4, today on day 1.
        assert_eq!(buf[(chart_x + 8, 2)].symbol(), "◆");
        assert_eq!(buf[(chart_x + 2, 2)].symbol(), "▼");
        assert_eq!(buf[(chart_x + 2, 3)].symbol(), "│");
        // The bar hides the milestone line on its own row.
        assert_eq!(buf[(chart_x + 8, 3)].symbol(), "█");
        assert_eq!(buf[(chart_x + 8, 4)].symbol(), "┊");
    }
}
