//! CSV and PNG export.
//!
//! Payloads are built synchronously from the catalog and the current layout;
//! the export worker only performs the file I/O, on its own Tokio task.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::highlight::Highlight;
use crate::layout::{Layout, Marker};
use crate::models::{Goal, PhaseColor, Task};
use crate::theme::DIMMED_OPACITY;

/// Byte-order mark so spreadsheet tools pick UTF-8
const BOM: &str = "\u{feff}";

/// Kind of exported file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    TasksCsv,
    GoalsCsv,
    ChartPng,
}

impl ExportKind {
    pub fn file_name(&self, prefix: &str) -> String {
        match self {
            ExportKind::TasksCsv => format!("{}_Gantt.csv", prefix),
            ExportKind::GoalsCsv => format!("{}_GoalSheet.csv", prefix),
            ExportKind::ChartPng => format!("{}_Gantt.png", prefix),
        }
    }

    pub fn path_in(&self, dir: &Path, prefix: &str) -> PathBuf {
        dir.join(self.file_name(prefix))
    }
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportKind::TasksCsv => write!(f, "Task CSV"),
            ExportKind::GoalsCsv => write!(f, "Goal CSV"),
            ExportKind::ChartPng => write!(f, "Chart PNG"),
        }
    }
}

/// Commands sent to the export worker
#[derive(Debug, Clone)]
pub enum ExportCommand {
    /// Write `bytes` to `path`, creating parent directories
    Write {
        kind: ExportKind,
        path: PathBuf,
        bytes: Vec<u8>,
    },
    Shutdown,
}

/// Replies from the export worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportMessage {
    Written(ExportKind, PathBuf),
    Failed(ExportKind, String),
}

/// Run the export worker until `Shutdown` or until the sender is dropped
pub async fn run_export_worker(
    mut rx: mpsc::Receiver<ExportCommand>,
    tx: mpsc::Sender<ExportMessage>,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            ExportCommand::Write { kind, path, bytes } => {
                let reply = match write_file(&path, &bytes).await {
                    Ok(()) => {
                        info!(%kind, path = %path.display(), bytes = bytes.len(), "export written");
                        ExportMessage::Written(kind, path)
                    }
                    Err(e) => {
                        error!(%kind, path = %path.display(), error = %e, "export failed");
                        ExportMessage::Failed(kind, format!("{}: {}", path.display(), e))
                    }
                };
                tx.send(reply).await.ok();
            }
            ExportCommand::Shutdown => break,
        }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

// ============================================
// CSV
// ============================================

/// Quote a CSV field, doubling embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Whole-catalog task sheet
pub fn tasks_csv(tasks: &[Task]) -> String {
    let mut lines = vec!["ID,Phase,Task,Owner,Start,End,Deliverable,Depends".to_string()];
    for t in tasks {
        let deps: Vec<String> = t.deps.iter().map(|d| d.to_string()).collect();
        lines.push(
            [
                t.id.to_string(),
                t.phase.clone(),
                quote(&t.name),
                t.owner_display.clone(),
                t.start.format("%Y-%m-%d").to_string(),
                t.end.format("%Y-%m-%d").to_string(),
                quote(&t.deliverable),
                quote(&deps.join(" ")),
            ]
            .join(","),
        );
    }
    format!("{}{}", BOM, lines.join("\n"))
}

/// Goal sheet with the derived salary ratio
pub fn goals_csv(goals: &[Goal]) -> String {
    let mut lines = vec![
        "Person,Role,Period,Revenue target,Gross target,Salary,Salary/Gross,Skills,Principles,Actions(what|cadence|kpi)"
            .to_string(),
    ];
    for g in goals {
        let ratio = g.salary_ratio().map(|r| r.to_string()).unwrap_or_default();
        let actions: Vec<String> = g
            .actions
            .iter()
            .map(|a| format!("{}|{}|{}", a.what, a.cadence, a.kpi))
            .collect();
        lines.push(
            [
                g.person.clone(),
                g.role.clone(),
                g.period.clone(),
                g.revenue_target.to_string(),
                g.gross_target.to_string(),
                g.salary.to_string(),
                ratio,
                quote(&g.skills.join(" / ")),
                quote(&g.principles.join(" / ")),
                quote(&actions.join(" || ")),
            ]
            .join(","),
        );
    }
    format!("{}{}", BOM, lines.join("\n"))
}

// ============================================
// PNG
// ============================================

/// Output pixel ratio
const SCALE: u32 = 2;
const MARGIN: u32 = 16;
const AXIS_HEIGHT: u32 = 16;
const DAY_WIDTH: u32 = 8;
const ROW_HEIGHT: u32 = 18;
const BAR_HEIGHT: u32 = 12;
const TICK_LENGTH: u32 = 6;

const BACKGROUND: PhaseColor = PhaseColor(0x0B, 0x10, 0x20);
const AXIS: PhaseColor = PhaseColor(0xCB, 0xD5, 0xE1);
const MILESTONE_LINE: PhaseColor = PhaseColor(0x94, 0xA3, 0xB8);
const TODAY_LINE: PhaseColor = PhaseColor(0xE1, 0x1D, 0x48);

/// Pixel rectangle `(x, y, width, height)` of a bar, before scaling
fn bar_rect(index: usize, offset_days: i64, duration_days: i64) -> (u32, u32, u32, u32) {
    let x = MARGIN + offset_days.max(0) as u32 * DAY_WIDTH;
    let y = MARGIN + AXIS_HEIGHT + index as u32 * ROW_HEIGHT + (ROW_HEIGHT - BAR_HEIGHT) / 2;
    (x, y, duration_days.max(1) as u32 * DAY_WIDTH, BAR_HEIGHT)
}

fn day_x(day: i64) -> u32 {
    MARGIN + day.max(0) as u32 * DAY_WIDTH
}

fn rgba(color: PhaseColor) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, 0xFF])
}

fn blend(color: PhaseColor, opacity: f32) -> Rgba<u8> {
    let mix = |fg: u8, bg: u8| (fg as f32 * opacity + bg as f32 * (1.0 - opacity)).round() as u8;
    Rgba([
        mix(color.0, BACKGROUND.0),
        mix(color.1, BACKGROUND.1),
        mix(color.2, BACKGROUND.2),
        0xFF,
    ])
}

/// Canvas that paints in unscaled chart units
struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    fn fill(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
        let (width, height) = self.image.dimensions();
        for py in (y * SCALE)..((y + h) * SCALE).min(height) {
            for px in (x * SCALE)..((x + w) * SCALE).min(width) {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    /// Vertical dashed line: `on` units drawn, `off` skipped
    fn dashed_vline(&mut self, x: u32, y0: u32, y1: u32, on: u32, off: u32, color: Rgba<u8>) {
        let mut y = y0;
        while y < y1 {
            self.fill(x, y, 1, on.min(y1 - y), color);
            y += on + off;
        }
    }
}

/// Rasterise the chart: bars, axis ticks, milestone and today lines
pub fn render_chart_png(
    layout: &Layout<'_>,
    highlight: &Highlight,
    markers: &[Marker<'_>],
    today: NaiveDate,
) -> RgbaImage {
    let width = 2 * MARGIN + layout.total_days.max(1) as u32 * DAY_WIDTH;
    let rows_height = layout.rows.len() as u32 * ROW_HEIGHT;
    let height = 2 * MARGIN + AXIS_HEIGHT + rows_height;
    let mut canvas = Canvas {
        image: RgbaImage::from_pixel(width * SCALE, height * SCALE, rgba(BACKGROUND)),
    };

    let axis_y = MARGIN + AXIS_HEIGHT - 1;
    canvas.fill(MARGIN, axis_y, width - 2 * MARGIN, 1, rgba(AXIS));
    for &tick in &layout.ticks {
        canvas.fill(day_x(tick), axis_y - TICK_LENGTH, 1, TICK_LENGTH, rgba(AXIS));
    }

    let chart_top = MARGIN + AXIS_HEIGHT;
    let chart_bottom = chart_top + rows_height;

    for marker in markers {
        canvas.dashed_vline(day_x(marker.day), chart_top, chart_bottom, 4, 2, rgba(MILESTONE_LINE));
    }

    for (index, row) in layout.rows.iter().enumerate() {
        let (x, y, w, h) = bar_rect(index, row.offset_days, row.duration_days);
        let color = if highlight.is_lit(row.task_id()) {
            rgba(row.color)
        } else {
            blend(row.color, DIMMED_OPACITY)
        };
        canvas.fill(x, y, w, h, color);
    }

    if let Some(day) = layout.day_of(today) {
        canvas.dashed_vline(day_x(day), chart_top, chart_bottom, 3, 3, rgba(TODAY_LINE));
    }

    canvas.image
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
