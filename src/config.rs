//! Tunables loaded from a TOML file. Every section and field has a default,
//! so an empty file (or no file) gives the stock behaviour.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};
use crate::months;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub normalizer: NormalizerConfig,
    pub parser: ParserConfig,
    pub grid: GridConfig,
    pub output: OutputConfig,
}

// ── [normalizer] ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Known OCR corruptions of month names, e.g. `Augst = "August"`.
    /// Merged over the built-in table.
    pub month_corrections: BTreeMap<String, String>,
    /// Whole-word phrase fixes for non-month text, e.g. `Retum = "Return"`.
    /// Merged over the built-in table.
    pub phrase_corrections: BTreeMap<String, String>,
    /// Repair month tokens within edit distance 1 that are not in the table.
    pub fuzzy_months: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            month_corrections: BTreeMap::new(),
            phrase_corrections: BTreeMap::new(),
            fuzzy_months: true,
        }
    }
}

// ── [parser] ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Descriptions shorter than this (in characters) are rejected.
    pub min_description_len: usize,
    /// How many following lines may supply a missing description.
    pub continuation_lookahead: usize,
    /// Attach explicit "9:00 AM"-style times to events.
    pub detect_times: bool,
    /// Date month-only lines naming a fixed-rule holiday ("May Memorial Day").
    pub infer_holidays: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            min_description_len: 3,
            continuation_lookahead: 2,
            detect_times: true,
            infer_holidays: false,
        }
    }
}

// ── [grid] ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// First column of the printed week.
    pub week_start: WeekStart,
    /// Rows above the day cells (weekday names, month banner).
    pub header_rows: usize,
    /// Minimum run length of a grid line, as a fraction of the page side.
    pub min_line_fraction: f32,
    /// A projection peak must reach this fraction of the strongest one.
    pub peak_fraction: f32,
    /// Allowed deviation of a cell side from the median, as a fraction.
    pub cell_tolerance: f32,
    /// Adaptive threshold window (odd, in pixels).
    pub threshold_block: u32,
    /// Subtracted from the local mean before thresholding.
    pub threshold_c: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            week_start: WeekStart::Sunday,
            header_rows: 0,
            min_line_fraction: 0.1,
            peak_fraction: 0.3,
            cell_tolerance: 0.25,
            threshold_block: 15,
            threshold_c: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    Monday,
}

// ── [output] ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// IANA zone name written on timed Google events.
    pub timezone: String,
    /// Event body text for exported Google events.
    pub google_description: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            timezone: "America/Los_Angeles".to_string(),
            google_description: "From academic calendar".to_string(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────────

impl Config {
    pub fn load(path: &Path) -> ExtractResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ExtractError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ExtractError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> ExtractResult<Self> {
        match path {
            Some(p) => Config::load(p),
            None => Ok(Config::default()),
        }
    }

    pub fn validate(&self) -> ExtractResult<()> {
        for (from, to) in &self.normalizer.month_corrections {
            if months::parse_month(to).is_none() {
                return Err(ExtractError::Config(format!(
                    "month_corrections: '{from}' maps to '{to}', which is not a month name"
                )));
            }
        }
        let g = &self.grid;
        if g.threshold_block % 2 == 0 {
            return Err(ExtractError::Config(
                "grid.threshold_block must be odd".to_string(),
            ));
        }
        for (name, v) in [
            ("min_line_fraction", g.min_line_fraction),
            ("peak_fraction", g.peak_fraction),
            ("cell_tolerance", g.cell_tolerance),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ExtractError::Config(format!(
                    "grid.{name} must be between 0 and 1, got {v}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let f = write_config("");
        assert_eq!(Config::load(f.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let f = write_config(
            r#"
[normalizer.month_corrections]
Septmber = "September"

[parser]
infer_holidays = true

[grid]
week_start = "monday"
"#,
        );
        let c = Config::load(f.path()).unwrap();
        assert_eq!(
            c.normalizer.month_corrections.get("Septmber").map(String::as_str),
            Some("September")
        );
        assert!(c.normalizer.fuzzy_months);
        assert!(c.parser.infer_holidays);
        assert_eq!(c.parser.min_description_len, 3);
        assert_eq!(c.grid.week_start, WeekStart::Monday);
        assert_eq!(c.output.timezone, "America/Los_Angeles");
    }

    #[test]
    fn test_correction_to_non_month_rejected() {
        let f = write_config(
            r#"
[normalizer.month_corrections]
Augst = "Agust"
"#,
        );
        assert!(matches!(
            Config::load(f.path()),
            Err(ExtractError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let f = write_config("[parser\n");
        match Config::load(f.path()) {
            Err(ExtractError::ConfigParse { path, .. }) => assert_eq!(path, f.path()),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let r = Config::load(Path::new("/nonexistent/calendar.toml"));
        assert!(matches!(r, Err(ExtractError::ConfigRead { .. })));
    }

    #[test]
    fn test_even_threshold_block_rejected() {
        let mut c = Config::default();
        c.grid.threshold_block = 14;
        assert!(c.validate().is_err());
    }
}
