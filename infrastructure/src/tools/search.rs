//! Memory search over a directory of notes.
//!
//! Every query term must appear on a line (case-insensitive) for the line
//! to match. Only text-like files are scanned.

use conclave_domain::Observation;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of matching lines returned
const MAX_RESULTS: usize = 50;

/// Maximum file size scanned (5 MB)
const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

const NOTE_EXTENSIONS: [&str; 5] = ["md", "txt", "org", "rst", "log"];

fn term_patterns(query: &str) -> Result<Vec<Regex>, regex::Error> {
    query
        .split_whitespace()
        .map(|term| {
            RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
        })
        .collect()
}

fn collect_notes(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if !entry.file_name().to_string_lossy().starts_with('.') {
                collect_notes(&path, out);
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| NOTE_EXTENSIONS.contains(&e))
        {
            out.push(path);
        }
    }
}

/// Blocking scan; call through `spawn_blocking`.
pub fn search_notes(notes_dir: &Path, query: &str) -> Observation {
    if query.trim().is_empty() {
        return Observation::error("search query is empty");
    }
    let patterns = match term_patterns(query) {
        Ok(p) => p,
        Err(e) => return Observation::error(format!("invalid query: {}", e)),
    };
    if !notes_dir.is_dir() {
        return Observation::error(format!("notes directory {} not found", notes_dir.display()));
    }

    let mut files = Vec::new();
    collect_notes(notes_dir, &mut files);
    files.sort();

    let mut results = Vec::new();
    'files: for file in files {
        if fs::metadata(&file).is_ok_and(|m| m.len() > MAX_FILE_SIZE) {
            continue;
        }
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        let display = file.strip_prefix(notes_dir).unwrap_or(&file).display().to_string();
        for (n, line) in content.lines().enumerate() {
            if patterns.iter().all(|p| p.is_match(line)) {
                results.push(format!("{}:{}: {}", display, n + 1, line.trim()));
                if results.len() >= MAX_RESULTS {
                    results.push(format!("... (limited to {} results)", MAX_RESULTS));
                    break 'files;
                }
            }
        }
    }

    if results.is_empty() {
        Observation::ok(format!("no notes match '{}'", query))
    } else {
        Observation::ok(results.join("\n"))
    }
}
