//! Academic calendar extraction from OCR text.
//!
//! Raw OCR lines go through the normalizer, the date matcher, the year
//! resolver and the event builder, then get deduplicated and sorted. An
//! optional grid detector turns a month page into one line per day cell
//! upstream of all that.

pub mod config;
pub mod dedup;
pub mod error;
pub mod event;
pub mod export;
pub mod grid;
pub mod holidays;
pub mod input;
pub mod matcher;
pub mod months;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod types;
pub mod year;

pub use config::Config;
pub use error::{ExtractError, ExtractResult, GridDecline, LineIssue};
pub use event::{Event, EventBuilder, TimeSpan};
pub use grid::{CalendarGridCell, GridDetector};
pub use pipeline::{Extraction, Pipeline, PipelineBuilder};
pub use source::{GridLayout, LineSource, ReadingOrder};
pub use types::{BoundingBox, DateMatch, DateShape, LineRef, NormalizedLine, RawLine};
pub use year::AcademicYear;
