//! Day-cell grid detection on a month page.
//!
//! Pipeline: adaptive mean threshold → erosion with long horizontal /
//! vertical line kernels → projection profiles → peak positions → grid lines → cells.
//! Cells get a day number from the weekday of the 1st; OCR text blocks are
//! dropped into the cell under their centre and every non-empty cell
//! becomes one synthesized line, `"<Month> <day> <text>"`.

use chrono::{Datelike, Month, NaiveDate};
use image::{GrayImage, Luma};
use imageproc::filter::box_filter;
use log::debug;

use crate::config::{GridConfig, WeekStart};
use crate::error::GridDecline;
use crate::months::month_name;
use crate::types::{BoundingBox, RawLine};
use crate::year::AcademicYear;

const DAYS_PER_WEEK: usize = 7;
const MAX_WEEKS: usize = 6;
const INK: u8 = 255;

// ── Cell geometry ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CellBounds {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 as f32 && x < self.x1 as f32 && y >= self.y0 as f32 && y < self.y1 as f32
    }
}

/// One day cell. `row` counts week rows below any header rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGridCell {
    pub row: usize,
    pub column: usize,
    /// `None` for the padding cells before the 1st and after the last day.
    pub inferred_day: Option<u32>,
    pub bounds: CellBounds,
    /// Text blocks inside the cell, top to bottom.
    pub lines: Vec<String>,
}

/// Detected rule positions in pixels, page edges included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLines {
    pub rows: Vec<u32>,
    pub columns: Vec<u32>,
}

// ── Binarization ─────────────────────────────────────────────────────

/// Ink mask, 255 where a pixel is at least `c` darker than the mean of the
/// `block × block` window around it.
pub fn adaptive_threshold(img: &GrayImage, block: u32, c: f32) -> GrayImage {
    let radius = (block / 2).max(1);
    let mean = box_filter(img, radius, radius);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let value = f32::from(img.get_pixel(x, y)[0]);
        let local = f32::from(mean.get_pixel(x, y)[0]);
        Luma([if value <= local - c { INK } else { 0 }])
    })
}

// ── Line masks ───────────────────────────────────────────────────────

/// Mean over a full-ink window, with a little slack for scan gaps.
const RULE_FILL: u8 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Erode `ink` with a one-pixel-thick line of `min_run` pixels along `axis`.
/// Only pixels inside long ink runs survive.
fn line_mask(ink: &GrayImage, min_run: u32, axis: Axis) -> GrayImage {
    let radius = min_run / 2;
    let along = match axis {
        Axis::Horizontal => box_filter(ink, radius, 0),
        Axis::Vertical => box_filter(ink, 0, radius),
    };
    GrayImage::from_fn(ink.width(), ink.height(), |x, y| {
        Luma([if along.get_pixel(x, y)[0] >= RULE_FILL { INK } else { 0 }])
    })
}

/// Count of mask pixels per row (`Horizontal`) or per column (`Vertical`).
fn profile(mask: &GrayImage, axis: Axis) -> Vec<u32> {
    let len = match axis {
        Axis::Horizontal => mask.height(),
        Axis::Vertical => mask.width(),
    };
    let mut counts = vec![0u32; len as usize];
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] == INK {
            let i = match axis {
                Axis::Horizontal => y,
                Axis::Vertical => x,
            };
            counts[i as usize] += 1;
        }
    }
    counts
}

// ── Projection ───────────────────────────────────────────────────────

/// Midpoints of the stretches where `profile` exceeds `fraction` of its
/// maximum.
pub fn peak_positions(profile: &[u32], fraction: f32) -> Vec<u32> {
    let Some(&max) = profile.iter().max() else {
        return Vec::new();
    };
    if max == 0 {
        return Vec::new();
    }
    let threshold = max as f32 * fraction;
    let mut positions = Vec::new();
    let mut peak_start = None;
    for (i, &v) in profile.iter().enumerate() {
        match (v as f32 > threshold, peak_start) {
            (true, None) => peak_start = Some(i),
            (false, Some(start)) => {
                positions.push(((start + i) / 2) as u32);
                peak_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = peak_start {
        positions.push(((start + profile.len()) / 2) as u32);
    }
    positions
}

/// Add the page edges when the outermost rules sit well inside the page.
fn with_edges(mut positions: Vec<u32>, extent: u32) -> Vec<u32> {
    let extent_f = extent as f32;
    if positions.first().is_none_or(|&p| p as f32 > extent_f * 0.1) {
        positions.insert(0, 0);
    }
    if positions.last().is_none_or(|&p| (p as f32) < extent_f * 0.9) {
        positions.push(extent);
    }
    positions
}

fn median(values: &[u32]) -> u32 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.get(sorted.len() / 2).copied().unwrap_or(0)
}

fn spans(positions: &[u32]) -> Vec<u32> {
    positions.windows(2).map(|p| p[1] - p[0]).collect()
}

fn days_in_month(year: i32, month: Month) -> u32 {
    (28..=31)
        .rev()
        .find(|&d| NaiveDate::from_ymd_opt(year, month.number_from_month(), d).is_some())
        .unwrap_or(28)
}

/// Column of the 1st, counted from the first printed weekday.
fn first_weekday_offset(year: i32, month: Month, week_start: WeekStart) -> usize {
    let Some(first) = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1) else {
        return 0;
    };
    let wd = first.weekday();
    let offset = match week_start {
        WeekStart::Sunday => wd.num_days_from_sunday(),
        WeekStart::Monday => wd.num_days_from_monday(),
    };
    offset as usize
}

// ── Detector ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GridDetector {
    config: GridConfig,
}

impl GridDetector {
    pub fn new(config: GridConfig) -> Self {
        GridDetector { config }
    }

    /// Row and column rule positions, page edges added where missing.
    pub fn detect_lines(&self, img: &GrayImage) -> GridLines {
        let ink = adaptive_threshold(img, self.config.threshold_block, self.config.threshold_c);

        let fraction = self.config.min_line_fraction;
        let min_h = ((img.width() as f32 * fraction) as u32).max(1);
        let min_v = ((img.height() as f32 * fraction) as u32).max(1);
        let row_profile = profile(&line_mask(&ink, min_h, Axis::Horizontal), Axis::Horizontal);
        let column_profile = profile(&line_mask(&ink, min_v, Axis::Vertical), Axis::Vertical);

        GridLines {
            rows: with_edges(
                peak_positions(&row_profile, self.config.peak_fraction),
                img.height(),
            ),
            columns: with_edges(
                peak_positions(&column_profile, self.config.peak_fraction),
                img.width(),
            ),
        }
    }

    /// Detect the week grid of `month` in `year` and number its cells.
    /// Declines instead of guessing when the grid does not look like a
    /// month.
    pub fn detect(
        &self,
        img: &GrayImage,
        year: i32,
        month: Month,
    ) -> Result<Vec<CalendarGridCell>, GridDecline> {
        if img.width() == 0 || img.height() == 0 {
            return Err(GridDecline::EmptyImage);
        }
        let lines = self.detect_lines(img);

        let widths = spans(&lines.columns);
        if widths.len() != DAYS_PER_WEEK {
            return Err(GridDecline::ColumnCount(widths.len()));
        }

        let heights = spans(&lines.rows);
        let body_heights = heights.get(self.config.header_rows..).unwrap_or(&[]);
        let days = days_in_month(year, month);
        let offset = first_weekday_offset(year, month, self.config.week_start);
        let needed = (offset + days as usize).div_ceil(DAYS_PER_WEEK);
        if body_heights.len() < needed || body_heights.len() > MAX_WEEKS {
            return Err(GridDecline::RowCount {
                found: body_heights.len(),
                needed,
            });
        }

        for (axis, sizes) in [("width", &widths[..]), ("height", body_heights)] {
            let med = median(sizes);
            let tolerance = med as f32 * self.config.cell_tolerance;
            if let Some(&size) = sizes.iter().find(|&&s| (s as f32 - med as f32).abs() > tolerance) {
                return Err(GridDecline::IrregularCells {
                    axis,
                    size,
                    median: med,
                });
            }
        }

        let row_edges = &lines.rows[self.config.header_rows..];
        let mut cells = Vec::with_capacity(body_heights.len() * DAYS_PER_WEEK);
        for (row, ys) in row_edges.windows(2).enumerate() {
            for (column, xs) in lines.columns.windows(2).enumerate() {
                let n = (row * DAYS_PER_WEEK + column + 1) as i64 - offset as i64;
                let inferred_day = (1..=i64::from(days)).contains(&n).then_some(n as u32);
                cells.push(CalendarGridCell {
                    row,
                    column,
                    inferred_day,
                    bounds: CellBounds {
                        x0: xs[0],
                        y0: ys[0],
                        x1: xs[1],
                        y1: ys[1],
                    },
                    lines: Vec::new(),
                });
            }
        }
        Ok(cells)
    }

    /// Detect the grid and emit one line per day cell that holds text.
    /// Blocks without a bounding box, or outside every numbered cell, are
    /// dropped.
    pub fn synthesize(
        &self,
        img: &GrayImage,
        month: Month,
        year: &AcademicYear,
        blocks: &[RawLine],
        page: u32,
    ) -> Result<Vec<RawLine>, GridDecline> {
        let mut cells = self.detect(img, year.resolve_year(month), month)?;
        let dropped = assign_text(&mut cells, blocks);
        if dropped > 0 {
            debug!("page {page}: {dropped} text blocks fell outside the day cells");
        }

        let name = month_name(month);
        let lines = cells
            .iter()
            .filter_map(|cell| {
                let day = cell.inferred_day?;
                let text = cell_text(cell, day)?;
                let b = cell.bounds;
                Some(
                    RawLine::new(format!("{name} {day} {text}"), page).with_bbox(BoundingBox {
                        x: b.x0 as f32,
                        y: b.y0 as f32,
                        width: b.width() as f32,
                        height: b.height() as f32,
                    }),
                )
            })
            .collect();
        Ok(lines)
    }
}

/// Put each block into the numbered cell under its centre. Returns how many
/// blocks found no cell.
fn assign_text(cells: &mut [CalendarGridCell], blocks: &[RawLine]) -> usize {
    let mut placed: Vec<Vec<(f32, &str)>> = vec![Vec::new(); cells.len()];
    let mut dropped = 0;
    for block in blocks {
        let Some(bbox) = block.bbox else {
            dropped += 1;
            continue;
        };
        let (cx, cy) = bbox.center();
        match cells
            .iter()
            .position(|c| c.inferred_day.is_some() && c.bounds.contains(cx, cy))
        {
            Some(i) => placed[i].push((bbox.y, block.text.as_str())),
            None => dropped += 1,
        }
    }
    for (cell, mut texts) in cells.iter_mut().zip(placed) {
        texts.sort_by(|a, b| a.0.total_cmp(&b.0));
        cell.lines = texts.into_iter().map(|(_, t)| t.trim().to_string()).collect();
    }
    dropped
}

/// Joined cell text without the printed day numeral. `None` if empty.
fn cell_text(cell: &CalendarGridCell, day: u32) -> Option<String> {
    let joined = cell.lines.join(" ");
    let mut words: Vec<&str> = joined.split_whitespace().collect();
    if words.first().is_some_and(|w| w.parse::<u32>() == Ok(day)) {
        words.remove(0);
    }
    (!words.is_empty()).then(|| words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with 2px black rules at the given positions.
    fn ruled_page(w: u32, h: u32, columns: &[u32], rows: &[u32]) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([255]));
        let (top, bottom) = (rows[0], rows[rows.len() - 1] + 2);
        let (left, right) = (columns[0], columns[columns.len() - 1] + 2);
        for &x in columns {
            for y in top..bottom {
                img.put_pixel(x, y, Luma([0]));
                img.put_pixel(x + 1, y, Luma([0]));
            }
        }
        for &y in rows {
            for x in left..right {
                img.put_pixel(x, y, Luma([0]));
                img.put_pixel(x, y + 1, Luma([0]));
            }
        }
        img
    }

    fn every_100(n: u32) -> Vec<u32> {
        (0..n).map(|i| 5 + 100 * i).collect()
    }

    /// Seven 100px columns, five week rows: fits October 2025.
    fn october_page() -> GrayImage {
        ruled_page(720, 520, &every_100(8), &every_100(6))
    }

    fn block(text: &str, x: f32, y: f32) -> RawLine {
        RawLine::new(text, 0).with_bbox(BoundingBox {
            x,
            y,
            width: 60.0,
            height: 20.0,
        })
    }

    // ── primitives ──

    #[test]
    fn test_adaptive_threshold_marks_dark_pixels() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([255]));
        img.put_pixel(10, 12, Luma([0]));
        let ink = adaptive_threshold(&img, 15, 2.0);
        assert_eq!(ink.get_pixel(10, 12)[0], INK);
        assert_eq!(ink.pixels().filter(|p| p[0] == INK).count(), 1);
    }

    #[test]
    fn test_line_mask_keeps_only_long_runs() {
        let mut ink = GrayImage::new(100, 20);
        for x in 10..90 {
            ink.put_pixel(x, 5, Luma([INK]));
        }
        for x in 40..50 {
            ink.put_pixel(x, 15, Luma([INK]));
        }
        let rows = profile(&line_mask(&ink, 40, Axis::Horizontal), Axis::Horizontal);
        assert!(rows[5] > 0);
        assert_eq!(rows[15], 0);
        let columns = profile(&line_mask(&ink, 10, Axis::Vertical), Axis::Vertical);
        assert!(columns.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_peak_positions() {
        assert_eq!(peak_positions(&[0, 5, 5, 0, 0, 9, 9, 9], 0.3), vec![2, 6]);
        assert!(peak_positions(&[0, 0, 0], 0.3).is_empty());
        assert!(peak_positions(&[], 0.3).is_empty());
    }

    #[test]
    fn test_with_edges() {
        assert_eq!(with_edges(vec![50, 500], 1000), vec![0, 50, 500, 1000]);
        assert_eq!(with_edges(vec![2, 995], 1000), vec![2, 995]);
        assert_eq!(with_edges(Vec::new(), 100), vec![0, 100]);
    }

    #[test]
    fn test_first_weekday_offset() {
        // October 1st 2025 is a Wednesday
        assert_eq!(first_weekday_offset(2025, Month::October, WeekStart::Sunday), 3);
        assert_eq!(first_weekday_offset(2025, Month::October, WeekStart::Monday), 2);
        assert_eq!(days_in_month(2026, Month::February), 28);
    }

    // ── detect ──

    #[test]
    fn test_detect_lines_on_ruled_page() {
        let lines = GridDetector::default().detect_lines(&october_page());
        assert_eq!(lines.columns, vec![6, 106, 206, 306, 406, 506, 606, 706]);
        assert_eq!(lines.rows, vec![6, 106, 206, 306, 406, 506]);
    }

    #[test]
    fn test_detect_numbers_cells() {
        let cells = GridDetector::default()
            .detect(&october_page(), 2025, Month::October)
            .unwrap();
        assert_eq!(cells.len(), 35);
        let day = |row: usize, column: usize| {
            cells
                .iter()
                .find(|c| c.row == row && c.column == column)
                .and_then(|c| c.inferred_day)
        };
        assert_eq!(day(0, 2), None);
        assert_eq!(day(0, 3), Some(1));
        assert_eq!(day(2, 1), Some(13));
        assert_eq!(day(4, 5), Some(31));
        assert_eq!(day(4, 6), None);
    }

    #[test]
    fn test_detect_declines_wrong_column_count() {
        let page = ruled_page(620, 520, &every_100(7), &every_100(6));
        assert_eq!(
            GridDetector::default().detect(&page, 2025, Month::October),
            Err(GridDecline::ColumnCount(6))
        );
    }

    #[test]
    fn test_detect_declines_too_few_rows() {
        let page = ruled_page(720, 420, &every_100(8), &every_100(5));
        assert_eq!(
            GridDetector::default().detect(&page, 2025, Month::October),
            Err(GridDecline::RowCount {
                found: 4,
                needed: 5
            })
        );
    }

    #[test]
    fn test_detect_declines_too_many_rows() {
        // seven week rows cannot be one month
        let page = ruled_page(720, 720, &every_100(8), &every_100(8));
        assert_eq!(
            GridDetector::default().detect(&page, 2025, Month::October),
            Err(GridDecline::RowCount {
                found: 7,
                needed: 5
            })
        );
    }

    #[test]
    fn test_detect_declines_irregular_cells() {
        let columns = [5, 105, 205, 305, 405, 505, 605, 805];
        let page = ruled_page(820, 520, &columns, &every_100(6));
        assert_eq!(
            GridDetector::default().detect(&page, 2025, Month::October),
            Err(GridDecline::IrregularCells {
                axis: "width",
                size: 200,
                median: 100
            })
        );
    }

    #[test]
    fn test_detect_declines_blank_page() {
        let page = GrayImage::from_pixel(300, 300, Luma([255]));
        assert_eq!(
            GridDetector::default().detect(&page, 2025, Month::October),
            Err(GridDecline::ColumnCount(1))
        );
    }

    #[test]
    fn test_header_rows_are_skipped() {
        let page = ruled_page(720, 620, &every_100(8), &every_100(7));
        let detector = GridDetector::new(GridConfig {
            header_rows: 1,
            ..GridConfig::default()
        });
        let cells = detector.detect(&page, 2025, Month::October).unwrap();
        let first = cells.iter().find(|c| c.inferred_day == Some(1)).unwrap();
        assert_eq!((first.row, first.column), (0, 3));
        assert_eq!(first.bounds.y0, 106);
    }

    // ── synthesize ──

    #[test]
    fn test_synthesize_lines_from_cells() {
        let ay = AcademicYear::new(2025).unwrap();
        let blocks = vec![
            // day 13 cell spans x 106..206, y 206..306
            block("Indigenous Peoples Day", 120.0, 240.0),
            block("13", 120.0, 210.0),
            // day 31 cell spans x 506..606, y 406..506
            block("Parade", 520.0, 445.0),
            block("Costume", 520.0, 420.0),
            // padding cell before the 1st
            block("stray", 20.0, 20.0),
            RawLine::new("no box", 0),
        ];
        let lines = GridDetector::default()
            .synthesize(&october_page(), Month::October, &ay, &blocks, 2)
            .unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            ["October 13 Indigenous Peoples Day", "October 31 Costume Parade"]
        );
        assert_eq!(lines[0].page, 2);
        assert_eq!(lines[0].y, Some(206.0));
    }
}
