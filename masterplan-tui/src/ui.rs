//! UI rendering module.
//!
//! Draws the whole screen from an immutable [`App`]: tab bar, the Gantt or
//! Goals view, the log area and the modal overlays.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, InputMode, LogLevel, Tab};
use crate::goals::{format_jpy, format_ratio, GoalField, RatioBand, HEALTHY_RATIO};
use crate::theme::{colors, phase_color, ratio_color, styles};
use crate::timeline::TimelineWidget;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let bg_block = Block::default().style(Style::default().bg(colors::BG_DARK));
    frame.render_widget(bg_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(5), // Log area
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);
    match app.active_tab {
        Tab::Gantt => render_gantt_view(frame, app, chunks[1]),
        Tab::Goals => render_goals_view(frame, app, chunks[1]),
    }
    render_logs(frame, app, chunks[2]);

    if app.error_popup.is_some() {
        render_error_popup(frame, app, area);
    }

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|tab| {
            let style = if *tab == app.active_tab {
                styles::tab_active()
            } else {
                styles::tab_inactive()
            };
            Line::from(Span::styled(format!(" {} ", tab.name()), style))
        })
        .collect();

    let selected = Tab::all()
        .iter()
        .position(|t| *t == app.active_tab)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" LS×sena Master Plan ")
                .title_style(styles::title())
                .title_bottom(Line::from(Span::styled(
                    format!(" {} ", app.status_text()),
                    styles::text_hint(),
                )))
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .select(selected)
        .style(styles::text())
        .highlight_style(styles::tab_active())
        .divider(Span::styled(" | ", styles::border_dim()));

    frame.render_widget(tabs, area);
}

// ============================================
// Gantt
// ============================================

fn render_gantt_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Filters
            Constraint::Min(6),    // Chart
            Constraint::Length(8), // Details
        ])
        .split(area);

    render_filter_bar(frame, app, chunks[0]);

    let layout = app.layout();
    let highlight = app.highlight();
    let markers = layout.milestone_markers(&app.plan.milestones);
    let title = match highlight.len() {
        Some(n) => format!(" Master plan · {} tasks · {} linked ", layout.rows.len(), n),
        None => format!(" Master plan · {} tasks ", layout.rows.len()),
    };
    let chart = TimelineWidget::new(&layout, &highlight, &app.timeline_state, app.zoom)
        .markers(&markers)
        .today(layout.day_of(app.today))
        .selected(app.selected)
        .title(&title);
    frame.render_widget(chart, chunks[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[2]);
    render_task_details(frame, app, bottom[0]);
    render_milestones(frame, app, bottom[1]);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    for (i, phase) in app.plan.palette.phases().iter().enumerate() {
        let key = if i < 9 { char::from(b'1' + i as u8) } else { '0' };
        let style = if app.filter.phases.contains(&phase.name) {
            Style::default().fg(phase_color(phase.color))
        } else {
            styles::chip_off()
        };
        spans.push(Span::styled(format!("{} ", key), styles::text_hint()));
        spans.push(Span::styled(phase.name.clone(), style));
        spans.push(Span::raw("  "));
    }

    spans.push(Span::styled("o ", styles::text_hint()));
    spans.push(Span::styled(format!("owner: {}", app.filter.owner.label()), styles::info()));
    spans.push(Span::raw("  "));

    let searching = app.input_mode == InputMode::Search;
    spans.push(Span::styled("/ ", styles::text_hint()));
    let query_style = if searching {
        styles::form_input_focused()
    } else {
        styles::text()
    };
    let query = if searching {
        format!("{}_", app.filter.query)
    } else if app.filter.query.is_empty() {
        "search".to_string()
    } else {
        app.filter.query.clone()
    };
    spans.push(Span::styled(query, query_style));

    let border = if searching {
        styles::border_focused()
    } else {
        styles::border_dim()
    };
    let paragraph = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Filters ")
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(border)
                .style(Style::default().bg(colors::BG_DARK)),
        );
    frame.render_widget(paragraph, area);
}

fn render_task_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Task ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_MEDIUM));

    let Some(task) = app.cursor_task() else {
        let empty = Paragraph::new("No task under the cursor")
            .style(styles::text_dim())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let deps = if task.deps.is_empty() {
        "-".to_string()
    } else {
        task.deps
            .iter()
            .map(|d| format!("#{}", d))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let color = phase_color(app.plan.palette.color_of(&task.phase));
    let is_selected = app.selected == Some(task.id);

    let mut header = vec![Span::styled(
        format!("#{} {}", task.id, task.name),
        Style::default()
            .fg(colors::FG_PRIMARY)
            .add_modifier(Modifier::BOLD),
    )];
    if is_selected {
        header.push(Span::styled("  [selected]", styles::info()));
    }

    let lines = vec![
        Line::from(header),
        Line::from(vec![
            Span::styled("Phase:       ", styles::form_label()),
            Span::styled(task.phase.as_str(), Style::default().fg(color)),
        ]),
        Line::from(vec![
            Span::styled("Owner:       ", styles::form_label()),
            Span::styled(task.owner_display.as_str(), styles::text()),
        ]),
        Line::from(vec![
            Span::styled("Dates:       ", styles::form_label()),
            Span::styled(
                format!(
                    "{} → {}  ({} days)",
                    task.start.format("%Y-%m-%d"),
                    task.end.format("%Y-%m-%d"),
                    task.span_days().max(1)
                ),
                styles::text(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Deliverable: ", styles::form_label()),
            Span::styled(task.deliverable.as_str(), styles::text()),
        ]),
        Line::from(vec![
            Span::styled("Depends on:  ", styles::form_label()),
            Span::styled(deps, styles::text_dim()),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_milestones(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .plan
        .milestones
        .iter()
        .map(|m| {
            let style = if m.date < app.today {
                styles::text_hint()
            } else {
                styles::text()
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", m.date.format("%m/%d")),
                    Style::default().fg(colors::MILESTONE),
                ),
                Span::styled(m.name.as_str(), style),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Milestones ")
            .title_style(styles::title())
            .borders(Borders::ALL)
            .border_style(styles::border_dim())
            .style(Style::default().bg(colors::BG_MEDIUM)),
    );
    frame.render_widget(list, area);
}

// ============================================
// Goals
// ============================================

fn render_goals_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(30)])
        .split(area);

    let items: Vec<ListItem> = app
        .goals
        .goals()
        .iter()
        .enumerate()
        .map(|(i, goal)| {
            let band = RatioBand::of(goal.salary_ratio());
            let style = if i == app.goal_cursor {
                styles::selected()
            } else {
                styles::text()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", goal.person), style),
                Span::styled(
                    format!(" {}", format_ratio(goal.salary_ratio())),
                    Style::default().fg(ratio_color(band)),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" People ")
            .title_style(styles::title_accent())
            .borders(Borders::ALL)
            .border_style(styles::border())
            .style(Style::default().bg(colors::BG_MEDIUM)),
    );
    frame.render_widget(list, chunks[0]);

    render_goal_sheet(frame, app, chunks[1]);
}

fn render_goal_sheet(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::EditGoal;
    let block = Block::default()
        .title(" Goal sheet ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(if editing {
            styles::border_focused()
        } else {
            styles::border()
        })
        .style(Style::default().bg(colors::BG_DARK));

    let Some(goal) = app.goals.get(app.goal_cursor) else {
        let empty = Paragraph::new("This plan has no goal sheets")
            .style(styles::text_dim())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            goal.person.as_str(),
            Style::default()
                .fg(colors::FG_PRIMARY)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::from(""),
    ];

    for field in GoalField::all() {
        let focused = *field == app.goal_field;
        let value = if focused && editing {
            format!("{}_", app.edit_buffer)
        } else {
            match field {
                GoalField::RevenueTarget => format_jpy(goal.revenue_target),
                GoalField::GrossTarget => format_jpy(goal.gross_target),
                GoalField::Salary => format_jpy(goal.salary),
                _ => field.current_text(goal),
            }
        };
        let value_style = match (focused, editing) {
            (true, true) => styles::form_input_focused(),
            (true, false) => styles::form_input(),
            _ => styles::text(),
        };
        lines.push(Line::from(vec![
            Span::styled(if focused { "▸ " } else { "  " }, styles::title_accent()),
            Span::styled(format!("{:<16}", field.label()), styles::form_label()),
            Span::styled(value, value_style),
        ]));
    }

    let ratio = goal.salary_ratio();
    let band = RatioBand::of(ratio);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Salary / Gross  ", styles::form_label()),
        Span::styled(
            format_ratio(ratio),
            Style::default()
                .fg(ratio_color(band))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  (healthy ≤ {:.0}%)", HEALTHY_RATIO * 100.0),
            styles::text_hint(),
        ),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Actions", styles::title())));
    if goal.actions.is_empty() {
        lines.push(Line::from(Span::styled("    -", styles::text_hint())));
    }
    for action in &goal.actions {
        lines.push(Line::from(vec![
            Span::styled("    • ", styles::text_dim()),
            Span::styled(action.what.as_str(), styles::text()),
            Span::styled(format!("  [{}]", action.cadence), styles::info()),
            Span::styled(format!("  KPI: {}", action.kpi), styles::text_dim()),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

// ============================================
// Shared
// ============================================

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let (prefix, color) = match entry.level {
                LogLevel::Info => ("i", colors::BLUE),
                LogLevel::Success => ("+", colors::GREEN),
                LogLevel::Warning => ("!", colors::YELLOW),
                LogLevel::Error => ("x", colors::RED),
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", prefix), Style::default().fg(color)),
                Span::styled(entry.message.as_str(), styles::text_dim()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Log ")
            .title_style(Style::default().fg(colors::FG_DIM))
            .borders(Borders::ALL)
            .border_style(styles::border_dim())
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(list, area);
}

fn render_error_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(popup) = app.error_popup.as_ref() else {
        return;
    };

    let popup_width = (area.width * 60 / 100).clamp(30, 60);
    let popup_area = centered_rect(popup_width, 7, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ", popup.title))
        .title_style(
            Style::default()
                .fg(Color::White)
                .bg(colors::RED)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::RED))
        .style(Style::default().bg(Color::Rgb(0x2A, 0x18, 0x18)));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = Paragraph::new(popup.message.as_str())
        .style(styles::text())
        .wrap(Wrap { trim: true });
    frame.render_widget(text, inner);

    let hint = Paragraph::new("Press ESC or ENTER to dismiss")
        .style(styles::text_hint())
        .alignment(Alignment::Center);
    let hint_area = Rect::new(
        popup_area.x,
        popup_area.y + popup_area.height.saturating_sub(1),
        popup_area.width,
        1,
    );
    frame.render_widget(hint, hint_area);
}

fn help_section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(colors::PURPLE)
            .add_modifier(Modifier::BOLD),
    ))
}

fn help_key<'a>(keys: &'a str, action: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<14}", keys), Style::default().fg(colors::BLUE)),
        Span::raw(action),
    ])
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        help_section("Gantt"),
        help_key("j/k", "Move cursor"),
        help_key("Enter/Space", "Select task, light its chain"),
        help_key("Esc", "Clear selection"),
        help_key("h/l  H/L", "Scroll 1 / 7 days"),
        help_key("+/-  z", "Zoom finer/coarser, cycle"),
        help_key("1-9, 0", "Toggle phase"),
        help_key("a", "Show all phases"),
        help_key("o", "Cycle owner filter"),
        help_key("/", "Search (Enter keeps, Esc clears)"),
        help_key("x", "Export task CSV"),
        help_key("P", "Export chart PNG"),
        Line::from(""),
        help_section("Goals"),
        help_key("j/k", "Select person"),
        help_key("h/l", "Select field"),
        help_key("e/Enter", "Edit field"),
        help_key("Enter/Esc", "Commit / cancel edit"),
        help_key("x", "Export goal CSV"),
        Line::from(""),
        help_section("General"),
        help_key("Tab/Shift+Tab", "Switch tab"),
        help_key("?", "Toggle help"),
        help_key("q/Ctrl+C", "Quit"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .style(styles::text());

    frame.render_widget(paragraph, popup_area);
}

/// Helper to create a centered rectangle
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
