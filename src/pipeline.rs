//! End-to-end extraction: raw lines → normalized → matched → built →
//! deduplicated and sorted.

use log::{debug, info};

use crate::config::Config;
use crate::dedup::{MonthGroup, dedup_and_sort, group_by_month};
use crate::error::{ExtractError, ExtractResult, LineIssue};
use crate::event::{Event, EventBuilder};
use crate::matcher::{Matcher, clean_description};
use crate::normalize::Normalizer;
use crate::source::LineSource;
use crate::types::{LineRef, NormalizedLine, RawLine};
use crate::year::AcademicYear;

// ── Extraction result ────────────────────────────────────────────────

/// Events plus everything that went wrong along the way. Never fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Deduplicated, ordered by (date, appearance).
    pub events: Vec<Event>,
    pub issues: Vec<LineIssue>,
    /// Lines with text that gave no event: no date pattern, an ambiguous
    /// month, an impossible date or no description.
    pub skipped_lines: usize,
}

impl Extraction {
    pub fn months(&self) -> Vec<MonthGroup<'_>> {
        group_by_month(&self.events)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} events extracted, {} lines skipped",
            self.events.len(),
            self.skipped_lines
        )
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────

/// Holds only immutable configuration and compiled tables, so one pipeline
/// can serve many documents, also from several threads.
#[derive(Clone)]
pub struct Pipeline {
    year: AcademicYear,
    normalizer: Normalizer,
    matcher: Matcher,
    builder: EventBuilder,
    lookahead: usize,
}

impl Pipeline {
    pub fn new(year: AcademicYear, config: &Config) -> Self {
        let mut matcher = Matcher::new();
        if config.parser.infer_holidays {
            matcher = matcher.with_holiday_inference(year);
        }
        Pipeline {
            year,
            normalizer: Normalizer::new(&config.normalizer),
            matcher,
            builder: EventBuilder::new(year)
                .detect_times(config.parser.detect_times)
                .min_description_len(config.parser.min_description_len),
            lookahead: config.parser.continuation_lookahead,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn academic_year(&self) -> AcademicYear {
        self.year
    }

    pub fn extract_from(&self, source: &dyn LineSource) -> Extraction {
        self.extract(&source.lines())
    }

    /// Run every stage over one document's lines, in order.
    pub fn extract(&self, raw: &[RawLine]) -> Extraction {
        let lines: Vec<Option<NormalizedLine>> = raw
            .iter()
            .enumerate()
            .map(|(ordinal, r)| {
                self.normalizer.normalize(
                    &r.text,
                    LineRef {
                        ordinal,
                        page: r.page,
                    },
                )
            })
            .collect();

        let mut events = Vec::new();
        let mut issues = Vec::new();
        let mut skipped = 0;

        let mut i = 0;
        while i < lines.len() {
            let Some(line) = &lines[i] else {
                i += 1;
                continue;
            };

            if let Some(a) = &line.ambiguous_month {
                issues.push(LineIssue::AmbiguousMonth {
                    line: line.source,
                    token: a.token.clone(),
                    candidates: a.candidates.clone(),
                });
                skipped += 1;
                i += 1;
                continue;
            }

            let Some(mut m) = self.matcher.match_line(line) else {
                debug!("line {}: no date in '{}'", i, line.text);
                skipped += 1;
                i += 1;
                continue;
            };

            if m.description.is_empty()
                && let Some((j, text)) = self.continuation(&lines, i)
            {
                debug!("line {i}: description taken from line {j}");
                m.description = text;
                i = j;
            }

            match self.builder.build(&m, &mut issues) {
                Some(event) => events.push(event),
                None => skipped += 1,
            }
            i += 1;
        }

        let found = events.len();
        let events = dedup_and_sort(events);
        info!(
            "{}: {} events ({} duplicates dropped), {} lines skipped, {} issues",
            self.year,
            events.len(),
            found - events.len(),
            skipped,
            issues.len()
        );
        Extraction {
            events,
            issues,
            skipped_lines: skipped,
        }
    }

    /// First of the next `lookahead` lines with text and no date of its own.
    /// A dated line ends the search.
    fn continuation(&self, lines: &[Option<NormalizedLine>], i: usize) -> Option<(usize, String)> {
        let end = (i + 1 + self.lookahead).min(lines.len());
        for (j, next) in lines.iter().enumerate().take(end).skip(i + 1) {
            let Some(next) = next else { continue };
            if Matcher::has_date(&next.text) {
                return None;
            }
            let text = clean_description(&next.text);
            if !text.is_empty() {
                return Some((j, text));
            }
        }
        None
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Checked construction for callers whose academic year is optional
/// input (CLI flags, request parameters).
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    year: Option<AcademicYear>,
    config: Config,
}

impl PipelineBuilder {
    pub fn academic_year(mut self, year: AcademicYear) -> Self {
        self.year = Some(year);
        self
    }

    /// Parse the academic year from text such as "2025-2026".
    pub fn academic_year_str(mut self, raw: Option<&str>) -> ExtractResult<Self> {
        self.year = match raw {
            Some(s) => Some(s.parse()?),
            None => None,
        };
        Ok(self)
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ExtractResult<Pipeline> {
        let year = self.year.ok_or(ExtractError::MissingAcademicYear)?;
        Ok(Pipeline::new(year, &self.config))
    }
}
