//! Reading OCR output from disk.
//!
//! `.json` files hold an array of `RawLine` records. Anything else is plain
//! text with one line per OCR line, and the page set to the file's position in
//! the input list. Directories are walked recursively, in file-name order,
//! picking up `.txt` and `.json` only.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::{ExtractError, ExtractResult};
use crate::types::RawLine;

/// Expand directories into the files they contain.
pub fn discover(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let p = entry.path();
            match p.extension().and_then(|e| e.to_str()) {
                Some("txt" | "json") => files.push(p.to_path_buf()),
                _ => debug!("skipping {}", p.display()),
            }
        }
    }
    files
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Read one file's lines. `page` applies to plain-text files.
pub fn read_lines(path: &Path, page: u32) -> ExtractResult<Vec<RawLine>> {
    let text = fs::read_to_string(path)?;
    if is_json(path) {
        return serde_json::from_str(&text).map_err(|source| ExtractError::InputParse {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(text.lines().map(|l| RawLine::new(l, page)).collect())
}

/// Every line of every input, in order.
pub fn load_lines(paths: &[PathBuf]) -> ExtractResult<Vec<RawLine>> {
    let mut lines = Vec::new();
    for (page, path) in discover(paths).iter().enumerate() {
        let mut file_lines = read_lines(path, page as u32)?;
        debug!("{}: {} lines", path.display(), file_lines.len());
        lines.append(&mut file_lines);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_json_inputs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "August 20 First Day\n\nSeptember 1 Labor Day\n").unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"[{"text": "October 13 No School", "page": 4, "y": 120.5}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let lines = load_lines(&[dir.path().to_path_buf()]).unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            ["August 20 First Day", "", "September 1 Labor Day", "October 13 No School"]
        );
        assert_eq!(lines[0].page, 0);
        assert_eq!(lines[3].page, 4);
        assert_eq!(lines[3].y, Some(120.5));
    }

    #[test]
    fn test_malformed_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        match read_lines(&path, 0) {
            Err(ExtractError::InputParse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected InputParse, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let r = load_lines(&[PathBuf::from("/nonexistent/ocr.txt")]);
        assert!(matches!(r, Err(ExtractError::Io(_))));
    }
}
