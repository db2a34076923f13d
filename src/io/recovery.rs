//! Atomic file writes and the recovery log.
//!
//! `.recovery.log` is an append-only markdown file holding writes the
//! workspace could not apply, with the request body, so they can be
//! replayed or inspected by hand. View it with `cb recovery`.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

pub const RECOVERY_FILE: &str = ".recovery.log";

const FILE_HEADER: &str = "\
<!-- chanbar recovery log: writes that could not be applied.
     View with: cb recovery
     Clear with: cb recovery --clear -->

---
";

/// A single entry in the recovery log.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

pub fn recovery_log_path(dir: &Path) -> PathBuf {
    dir.join(RECOVERY_FILE)
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecoveryEntry {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}\n\n",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```json\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }

    /// Serialize to JSON for `cb recovery --json`.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }

    pub fn to_display(&self) -> String {
        self.to_markdown()
    }
}

/// Append an entry to the log. Failures are logged and otherwise ignored.
pub fn log_recovery(dir: &Path, entry: RecoveryEntry) {
    if let Err(error) = append_entry(dir, &entry) {
        tracing::warn!(%error, "could not write to recovery log");
    }
}

fn append_entry(dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(dir);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Record a write that failed, with the request that was lost.
pub fn log_persist_failure(dir: &Path, seq: u64, request: &impl serde::Serialize, error: &str) {
    let body = serde_json::to_string_pretty(request).unwrap_or_default();
    log_recovery(
        dir,
        RecoveryEntry {
            timestamp: Utc::now(),
            description: format!("write #{} failed", seq),
            fields: vec![("Error".to_string(), error.to_string())],
            body,
        },
    );
}

/// Read all entries, most recent first.
pub fn read_recovery_entries(dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Remove every entry. Returns how many were removed.
pub fn clear_recovery(dir: &Path) -> io::Result<usize> {
    let path = recovery_log_path(dir);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Ok(0);
    };
    let count = parse_entries(&content).len();
    atomic_write(&path, FILE_HEADER.as_bytes())?;
    Ok(count)
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some((timestamp, description)) =
            line.strip_prefix("## ").and_then(parse_entry_header)
        else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body = String::new();
        let mut in_code_block = false;
        for line in lines.by_ref() {
            if in_code_block {
                if line == "```" {
                    in_code_block = false;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                in_code_block = true;
                continue;
            }
            if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            description,
            fields,
            body,
        });
    }
    entries
}

/// `<timestamp> <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, String)> {
    let (timestamp, description) = header.split_once(' ')?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    Some((timestamp, description.to_string()))
}
