//! Token normalizer: one raw OCR line in, zero or one cleaned line out.
//!
//! Steps, in order: glyph repairs, whitespace collapse, grid-noise trim,
//! phrase corrections, month corrections (table then fuzzy), day-glyph
//! repairs after month names. Never fails; text it does not recognize
//! passes through.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::{Captures, Regex};

use crate::config::NormalizerConfig;
use crate::months::{self, MONTH_NAMES, build_month_regex};
use crate::types::{AmbiguousMonth, LineRef, NormalizedLine};

// ── Static correction tables ─────────────────────────────────────────

/// Month-name corruptions seen in scanned calendars. Every target is a
/// month and every source is one edit away from it.
pub static MONTH_CORRECTIONS: &[(&str, &str)] = &[
    ("Augst", "August"),
    ("Agust", "August"),
    ("Septmber", "September"),
    ("Septernber", "September"),
    ("Octber", "October"),
    ("Novmber", "November"),
    ("Novemher", "November"),
    ("Decmber", "December"),
    ("Janury", "January"),
    ("Februry", "February"),
];

/// Whole-word fixes for non-month text.
pub static PHRASE_CORRECTIONS: &[(&str, &str)] = &[
    ("Retum", "Return"),
    ("Retums", "Returns"),
    ("Extenced", "Extended"),
    ("Last Day c of", "Last Day of"),
];

/// Characters OCR produces from table rules and cell borders.
pub const GRID_NOISE: &[char] = &[
    '|', '_', '-', '=', '~', '+', '*', '•', '·', '¦', '│', '─', '┃', '━', '┆', '║', '═', '#',
    '—', '–', '¯', '‖',
];

// ── Regexes ──────────────────────────────────────────────────────────

/// `June Z-9` → `June 7-9`
static RE_Z_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\s+z(\s*[-–—]\s*\d)", build_month_regex())).unwrap()
});

/// `April z Conferences` → `April 2 Conferences`
static RE_Z_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\s+z(\s|$)", build_month_regex())).unwrap()
});

/// A line-opening word of 4+ letters directly followed by a day number.
static RE_LEADING_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{4,})\s*\d").unwrap());

/// The word closing a range that opens with `<Month> <Day>`, as in
/// `December 22-Januay 2`.
static RE_RANGE_END_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:{})\s*\d{{1,2}}(?:st|nd|rd|th)?(?:\s*[-–—]\s*|\s+to\s+)([A-Za-z]{{4,}})\s*\d",
        build_month_regex()
    ))
    .unwrap()
});

// ── Edit distance ────────────────────────────────────────────────────

/// Case-insensitive Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Month names exactly one edit away from `token` that also share its first
/// two letters. `May` is only ever reached through the correction table.
pub fn month_candidates(token: &str) -> Vec<&'static str> {
    let prefix = token.chars().take(2).collect::<String>().to_lowercase();
    MONTH_NAMES
        .iter()
        .filter(|e| e.name.len() > 3 && e.name.to_lowercase().starts_with(&prefix))
        .filter(|e| levenshtein(token, e.name) == 1)
        .map(|e| e.name)
        .collect()
}

// ── Normalizer ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Lowercased source token → canonical month name.
    month_table: HashMap<String, &'static str>,
    month_table_re: Option<Regex>,
    phrases: Vec<(Regex, String)>,
    fuzzy_months: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(&NormalizerConfig::default())
    }
}

impl Normalizer {
    /// Merge the configured tables over the built-in ones. Month entries
    /// whose target is not a month, or whose source is more than one edit
    /// away, are dropped with a warning.
    pub fn new(config: &NormalizerConfig) -> Self {
        let mut months_merged: BTreeMap<String, String> = MONTH_CORRECTIONS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        months_merged.extend(config.month_corrections.clone());

        let mut month_table = HashMap::new();
        for (from, to) in &months_merged {
            let Some(month) = months::parse_month(to) else {
                warn!("ignoring month correction '{from}' → '{to}': target is not a month");
                continue;
            };
            if levenshtein(from, to) > 1 {
                warn!("ignoring month correction '{from}' → '{to}': more than one edit apart");
                continue;
            }
            month_table.insert(from.to_lowercase(), months::month_name(month));
        }
        let month_table_re = if month_table.is_empty() {
            None
        } else {
            let mut keys: Vec<String> = month_table.keys().map(|k| regex::escape(k)).collect();
            keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
            Regex::new(&format!(r"(?i)\b(?:{})\b", keys.join("|"))).ok()
        };

        let mut phrases_merged: BTreeMap<String, String> = PHRASE_CORRECTIONS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        phrases_merged.extend(config.phrase_corrections.clone());
        // Longest phrase first
        let mut phrase_list: Vec<(String, String)> = phrases_merged.into_iter().collect();
        phrase_list.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));
        let phrases = phrase_list
            .into_iter()
            .filter_map(|(from, to)| {
                let re = Regex::new(&format!(r"\b{}\b", regex::escape(&from))).ok()?;
                Some((re, to))
            })
            .collect();

        Normalizer {
            month_table,
            month_table_re,
            phrases,
            fuzzy_months: config.fuzzy_months,
        }
    }

    /// Clean one line. `None` when nothing but noise remains.
    pub fn normalize(&self, raw: &str, source: LineRef) -> Option<NormalizedLine> {
        let text = raw.replace('§', "5");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let text = text.trim_matches(|c: char| GRID_NOISE.contains(&c) || c.is_whitespace());
        if !text.chars().any(char::is_alphanumeric) {
            return None;
        }

        let mut text = text.to_string();
        for (re, to) in &self.phrases {
            if re.is_match(&text) {
                text = re.replace_all(&text, to.as_str()).into_owned();
            }
        }

        if let Some(re) = &self.month_table_re {
            text = re
                .replace_all(&text, |caps: &Captures| {
                    let key = caps[0].to_lowercase();
                    self.month_table
                        .get(&key)
                        .map_or_else(|| caps[0].to_string(), |m| m.to_string())
                })
                .into_owned();
        }

        let mut ambiguous_month = None;
        if self.fuzzy_months {
            text = repair_months(&text, &mut ambiguous_month);
        }

        let text = RE_Z_RANGE.replace_all(&text, "${1} 7${2}");
        let text = RE_Z_SINGLE.replace_all(&text, "${1} 2${2}").into_owned();

        if let Some(a) = &ambiguous_month {
            debug!(
                "line {}: month token '{}' is ambiguous ({})",
                source.ordinal,
                a.token,
                a.candidates.join(", ")
            );
        }

        Some(NormalizedLine {
            text,
            source,
            ambiguous_month,
        })
    }
}

/// Repair near-miss month tokens at the two places a month can stand: the
/// start of the line, and the far end of a range opening there. Text after
/// the first date is never touched. The first token with several candidates
/// is reported through `ambiguous`.
fn repair_months(text: &str, ambiguous: &mut Option<AmbiguousMonth>) -> String {
    let mut text = text.to_string();
    let leading = RE_LEADING_CANDIDATE
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.range());
    if let Some(span) = leading {
        repair_span(&mut text, span, ambiguous);
    }
    let range_end = RE_RANGE_END_CANDIDATE
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.range());
    if let Some(span) = range_end {
        repair_span(&mut text, span, ambiguous);
    }
    text
}

fn repair_span(text: &mut String, span: Range<usize>, ambiguous: &mut Option<AmbiguousMonth>) {
    let token = &text[span.clone()];
    if months::parse_month(token).is_some() || months::is_abbreviation(token) {
        return;
    }
    let candidates = month_candidates(token);
    if let [only] = candidates[..] {
        text.replace_range(span, only);
    } else if candidates.len() > 1 && ambiguous.is_none() {
        *ambiguous = Some(AmbiguousMonth {
            token: token.to_string(),
            candidates,
        });
    }
}
