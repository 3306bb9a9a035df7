//! Section image export.
//!
//! Each selected dashboard section is captured to a PNG and written to the
//! output directory in selection order, one at a time, with a settling delay
//! between items. A section that cannot be captured or written is skipped and
//! the loop moves on.

use crate::metrics;
use crate::model::{StudentRecord, PROFILE_COLORS};
use crate::store::Theme;
use image::{ImageBuffer, Rgba};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSection {
    pub id: &'static str,
    pub title: &'static str,
    pub region: &'static str,
}

pub static EXPORT_SECTIONS: [ExportSection; 9] = [
    ExportSection { id: "profile", title: "پروفایل و وضعیت کلی", region: "profile-section" },
    ExportSection { id: "progress", title: "میانگین پیشرفت تراز", region: "progress-section" },
    ExportSection { id: "roadmap", title: "مسیر آزمون‌ها", region: "roadmap-section" },
    ExportSection { id: "summary", title: "خلاصه عملکرد", region: "analytics-section" },
    ExportSection { id: "subjects", title: "عملکرد دروس", region: "subjects-section" },
    ExportSection { id: "comparison", title: "مقایسه روند دروس", region: "comparison-chart-section" },
    ExportSection { id: "league", title: "لیگ و رتبه‌بندی", region: "league-section" },
    ExportSection { id: "achievements", title: "دستاوردها", region: "achievements-section" },
    ExportSection { id: "skillTree", title: "درخت مهارت", region: "skill-tree-section" },
];

pub fn section(id: &str) -> Option<&'static ExportSection> {
    EXPORT_SECTIONS.iter().find(|s| s.id == id)
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown section: {0}")]
    UnknownSection(String),
    #[error("section {0} has nothing to capture")]
    RegionUnavailable(String),
    #[error("section {0} was selected more than once")]
    Duplicate(String),
    #[error("png encoding failed: {0}")]
    Encode(String),
    #[error("failed to write {}: {}", .path.display(), .message)]
    Write { path: PathBuf, message: String },
}

pub trait SectionCapture {
    fn capture(&self, section: &ExportSection) -> Result<Vec<u8>, ExportError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub section: String,
    pub path: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSection {
    pub section: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub files: Vec<ExportedFile>,
    pub skipped: Vec<SkippedSection>,
}

/// `<title>-<unix millis>.png`, with path separators replaced.
pub fn file_name(title: &str, millis: i64) -> String {
    let safe: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    format!("{}-{}.png", safe, millis)
}

fn export_one(
    capture: &dyn SectionCapture,
    id: &str,
    out_dir: &Path,
) -> Result<ExportedFile, ExportError> {
    let section = section(id).ok_or_else(|| ExportError::UnknownSection(id.to_string()))?;
    let bytes = capture.capture(section)?;
    let path = out_dir.join(file_name(section.title, chrono::Utc::now().timestamp_millis()));
    std::fs::write(&path, &bytes).map_err(|e| ExportError::Write {
        path: path.clone(),
        message: e.to_string(),
    })?;
    Ok(ExportedFile {
        section: section.id.to_string(),
        path: path.to_string_lossy().to_string(),
        bytes: bytes.len(),
    })
}

/// Best-effort export of `selected` in order. Only a missing output directory
/// that cannot be created fails the whole run.
pub fn export_sections(
    capture: &dyn SectionCapture,
    selected: &[String],
    out_dir: &Path,
    settle: Duration,
) -> Result<ExportReport, ExportError> {
    std::fs::create_dir_all(out_dir).map_err(|e| ExportError::Write {
        path: out_dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut report = ExportReport::default();
    let mut seen = HashSet::new();
    for (idx, id) in selected.iter().enumerate() {
        let outcome = if seen.insert(id.as_str()) {
            export_one(capture, id, out_dir)
        } else {
            Err(ExportError::Duplicate(id.clone()))
        };
        match outcome {
            Ok(file) => {
                debug!(section = %file.section, path = %file.path, bytes = file.bytes, "section exported");
                report.files.push(file);
                if idx + 1 < selected.len() && !settle.is_zero() {
                    std::thread::sleep(settle);
                }
            }
            Err(e) => {
                warn!(section = %id, error = %e, "skipping section");
                report.skipped.push(SkippedSection {
                    section: id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        exported = report.files.len(),
        skipped = report.skipped.len(),
        "export finished"
    );
    Ok(report)
}

const BASE_WIDTH: u32 = 400;
const BASE_HEIGHT: u32 = 240;
const BASE_MARGIN: u32 = 16;

/// Renders a section's figures as a bar chart on the theme background.
pub struct ChartCapture<'a> {
    record: &'a StudentRecord,
    background: [u8; 3],
    pixel_ratio: u32,
}

impl<'a> ChartCapture<'a> {
    pub fn new(record: &'a StudentRecord, theme: Theme, pixel_ratio: u32) -> Self {
        Self {
            record,
            background: theme.export_background(),
            pixel_ratio: pixel_ratio.max(1),
        }
    }
}

impl SectionCapture for ChartCapture<'_> {
    fn capture(&self, section: &ExportSection) -> Result<Vec<u8>, ExportError> {
        let bars = section_figures(self.record, section.id);
        if bars.is_empty() {
            return Err(ExportError::RegionUnavailable(section.id.to_string()));
        }
        render_bars(&bars, self.background, self.pixel_ratio)
    }
}

/// The figures a section displays, in display order.
fn section_figures(record: &StudentRecord, id: &str) -> Vec<f64> {
    match id {
        "profile" => vec![record.total_taz as f64, record.average_taz as f64],
        "progress" => metrics::exam_trend(&record.exams, record.average_taz)
            .iter()
            .map(|p| p.taz as f64)
            .collect(),
        "roadmap" => record.exams.iter().map(|e| e.taz as f64).collect(),
        "summary" => {
            let t = metrics::answer_totals(&record.subjects);
            vec![t.correct as f64, t.wrong as f64, t.blank as f64]
        }
        "subjects" => record.subjects.iter().map(|s| s.taz as f64).collect(),
        "comparison" => record
            .subjects
            .iter()
            .map(|s| metrics::accuracy_percentage(s) as f64)
            .collect(),
        "league" => {
            let p = metrics::league_progress(record.league, record.total_taz);
            vec![p.progress, 1.0]
        }
        "achievements" => record.badges_unlocked.iter().map(|_| 1.0).collect(),
        "skillTree" => record
            .subjects
            .iter()
            .filter_map(|s| s.skill_tree.as_deref())
            .map(metrics::average_mastery)
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_hex(color: &str) -> [u8; 3] {
    let hex = color.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    [channel(0), channel(2), channel(4)]
}

type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

fn opaque(rgb: [u8; 3]) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

/// Paints the part of the rectangle that falls inside the image.
fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for row in y..y.saturating_add(h).min(image.height()) {
        for col in x..x.saturating_add(w).min(image.width()) {
            image.put_pixel(col, row, color);
        }
    }
}

fn draw_bars(values: &[f64], background: [u8; 3], ratio: u32) -> RgbaImage {
    let width = BASE_WIDTH * ratio;
    let height = BASE_HEIGHT * ratio;
    let margin = BASE_MARGIN * ratio;
    let mut image = ImageBuffer::from_pixel(width, height, opaque(background));

    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    let plot_w = width - 2 * margin;
    let plot_h = height - 2 * margin;
    let slot = (plot_w / values.len().max(1) as u32).max(1);
    let gap = (slot / 5).min(4 * ratio);

    for (i, value) in values.iter().enumerate() {
        let frac = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
        let bar_h = (frac * plot_h as f64).round() as u32;
        let x = margin + i as u32 * slot;
        let color = opaque(parse_hex(PROFILE_COLORS[i % PROFILE_COLORS.len()]));
        fill_rect(&mut image, x + gap / 2, margin + plot_h - bar_h, slot - gap, bar_h, color);
    }
    // baseline
    fill_rect(&mut image, margin, margin + plot_h, plot_w, ratio, opaque([0x9c, 0xa3, 0xaf]));
    image
}

fn render_bars(values: &[f64], background: [u8; 3], ratio: u32) -> Result<Vec<u8>, ExportError> {
    let image = draw_bars(values, background, ratio);
    let (width, height) = image.dimensions();

    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .write_header()
            .map_err(|e| ExportError::Encode(e.to_string()))?
            .write_image_data(&image.into_raw())
            .map_err(|e| ExportError::Encode(e.to_string()))?;
    }
    Ok(buffer)
}
