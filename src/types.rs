use serde::{Deserialize, Serialize};

// ── Bounding box in page pixel coordinates ─────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

// ── OCR output line ────────────────────────────────────────────────

/// A line of text as produced by the OCR engine, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    pub text: String,
    #[serde(default)]
    pub page: u32,
    /// Approximate vertical position of the line on its page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl RawLine {
    pub fn new(text: impl Into<String>, page: u32) -> Self {
        RawLine {
            text: text.into(),
            page,
            y: None,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.y = Some(bbox.y);
        self.bbox = Some(bbox);
        self
    }
}

// ── Reference back to the source line ─────────────────────────────

/// Where a normalized line, match or event came from.
///
/// `ordinal` is the position of the line in the document's input stream
/// and is the tie-breaker for events sharing a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineRef {
    pub ordinal: usize,
    pub page: u32,
}

// ── Normalized line ────────────────────────────────────────────────

/// A month token the normalizer could not repair unambiguously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMonth {
    pub token: String,
    pub candidates: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    pub text: String,
    pub source: LineRef,
    pub ambiguous_month: Option<AmbiguousMonth>,
}

// ── Date match ─────────────────────────────────────────────────────

/// Which of the supported textual shapes produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateShape {
    /// "August 20"
    Single,
    /// "August 11-12"
    SameMonthRange,
    /// "December 22-January 2"
    CrossMonthRange,
    /// "May Memorial Day": day derived from a fixed holiday rule
    InferredHoliday,
}

/// Month/day values pulled out of one line, before year resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub shape: DateShape,
    pub start_month: chrono::Month,
    pub start_day: u32,
    pub end_month: Option<chrono::Month>,
    pub end_day: Option<u32>,
    pub description: String,
    pub source: LineRef,
}

impl DateMatch {
    pub fn is_range(&self) -> bool {
        self.end_day.is_some()
    }

    /// Month/day the event is dated on: the range end for ranges.
    pub fn end(&self) -> (chrono::Month, u32) {
        match self.end_day {
            Some(d) => (self.end_month.unwrap_or(self.start_month), d),
            None => (self.start_month, self.start_day),
        }
    }
}
