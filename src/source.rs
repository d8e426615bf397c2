//! Producers of raw OCR lines for the pipeline.

use chrono::Month;
use image::GrayImage;
use log::{info, warn};

use crate::error::GridDecline;
use crate::grid::GridDetector;
use crate::types::RawLine;
use crate::year::AcademicYear;

/// Anything that yields raw lines in document order.
pub trait LineSource {
    fn lines(&self) -> Vec<RawLine>;
}

// ── Reading order ────────────────────────────────────────────────────

/// Lines exactly as the OCR engine emitted them.
#[derive(Debug, Clone, Default)]
pub struct ReadingOrder {
    lines: Vec<RawLine>,
}

impl ReadingOrder {
    pub fn new(lines: Vec<RawLine>) -> Self {
        ReadingOrder { lines }
    }
}

impl From<Vec<RawLine>> for ReadingOrder {
    fn from(lines: Vec<RawLine>) -> Self {
        ReadingOrder::new(lines)
    }
}

impl LineSource for ReadingOrder {
    fn lines(&self) -> Vec<RawLine> {
        self.lines.clone()
    }
}

// ── Grid layout ──────────────────────────────────────────────────────

/// One line per day cell of a month page. Falls back to the blocks in
/// reading order when the detector declines the page.
pub struct GridLayout<'a> {
    detector: &'a GridDetector,
    image: &'a GrayImage,
    month: Month,
    year: AcademicYear,
    blocks: &'a [RawLine],
    page: u32,
}

impl<'a> GridLayout<'a> {
    pub fn new(
        detector: &'a GridDetector,
        image: &'a GrayImage,
        month: Month,
        year: AcademicYear,
        blocks: &'a [RawLine],
        page: u32,
    ) -> Self {
        GridLayout {
            detector,
            image,
            month,
            year,
            blocks,
            page,
        }
    }

    /// Grid lines only, with the decline reason on failure.
    pub fn grid_lines(&self) -> Result<Vec<RawLine>, GridDecline> {
        self.detector
            .synthesize(self.image, self.month, &self.year, self.blocks, self.page)
    }
}

impl LineSource for GridLayout<'_> {
    fn lines(&self) -> Vec<RawLine> {
        match self.grid_lines() {
            Ok(lines) => {
                info!("page {}: grid produced {} lines", self.page, lines.len());
                lines
            }
            Err(reason) => {
                warn!("page {}: grid declined ({reason}), using reading order", self.page);
                self.blocks.to_vec()
            }
        }
    }
}
