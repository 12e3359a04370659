//! Archive log differencer
//!
//! Fetches a run's compressed log bundle, normalizes the text and computes
//! the delta since the previous fetch. Fetch and decode failures are never
//! fatal: logs are optional output, so a bad cycle yields no delta and
//! leaves the accumulated state untouched.

use std::io::{Cursor, Read};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;
use zip::ZipArchive;

use crate::errors::RelayError;
use crate::forge::api::ForgeApi;

/// Per-session log accumulation state
#[derive(Debug, Clone, Default)]
pub struct LogState {
    previous: String,
}

impl LogState {
    /// Full cleaned text seen on the most recent successful fetch
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

/// New log output produced by one fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDelta {
    /// The new text
    pub text: String,

    /// When set, the archive was rewritten non-monotonically and `text` is
    /// the full replacement rather than an appendable suffix.
    pub replacement: bool,
}

/// Computes incremental log deltas from a run's archive
pub struct ArchiveDiffer {
    forge: Arc<dyn ForgeApi>,
}

impl ArchiveDiffer {
    /// Create a new differencer
    pub fn new(forge: Arc<dyn ForgeApi>) -> Self {
        Self { forge }
    }

    /// Fetch the archive and compute the delta since the previous fetch.
    ///
    /// Returns `None` when the archive could not be fetched or decoded, or
    /// when nothing new was produced. `state` is updated on every successful
    /// decode, on both the append and the replacement branch.
    pub async fn fetch_delta(&self, state: &mut LogState, archive_url: &str) -> Option<LogDelta> {
        let bytes = match self.forge.fetch_log_archive(archive_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // Archive not yet finalized or transiently unavailable
                debug!("Skipping log cycle, archive fetch failed: {}", e);
                return None;
            }
        };

        let all_text = match extract_log_text(&bytes) {
            Ok(text) => text,
            Err(e) => {
                debug!("Skipping log cycle, archive decode failed: {}", e);
                return None;
            }
        };

        let delta = match all_text.strip_prefix(state.previous.as_str()) {
            Some("") => None,
            Some(rest) => Some(LogDelta {
                text: rest.to_string(),
                replacement: false,
            }),
            None => Some(LogDelta {
                text: all_text.clone(),
                replacement: true,
            }),
        };

        state.previous = all_text;
        delta
    }
}

/// Extract and normalize the text of every plain-text log entry.
///
/// Entries are concatenated in lexicographic name order so successive
/// fetches of a growing archive produce the same prefix.
pub fn extract_log_text(bytes: &[u8]) -> Result<String, RelayError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();

    let mut all_text = String::new();
    for name in names {
        if !name.ends_with(".txt") {
            continue;
        }

        let mut entry = archive.by_name(&name)?;
        if entry.is_dir() {
            continue;
        }

        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        all_text.push_str(&clean_log_text(&text));
    }

    Ok(all_text)
}

fn timestamp_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z\s").expect("valid regex")
    })
}

fn ansi_escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*[A-Za-z]").expect("valid regex"))
}

/// Strip per-line ISO-8601 timestamp prefixes and ANSI escape sequences
pub fn clean_log_text(text: &str) -> String {
    let without_timestamps = timestamp_prefix_re().replace_all(text, "");
    ansi_escape_re().replace_all(&without_timestamps, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_timestamp_prefix() {
        let text = "2024-01-01T00:00:00.000Z hello\n";
        assert_eq!(clean_log_text(text), "hello\n");
    }

    #[test]
    fn test_clean_strips_every_line() {
        let text = "2024-01-01T00:00:00.0000000Z step one\n2024-01-01T00:00:01.0000000Z step two\n";
        assert_eq!(clean_log_text(text), "step one\nstep two\n");
    }

    #[test]
    fn test_clean_strips_ansi_sequences() {
        let text = "\x1b[32mok\x1b[0m done\n";
        assert_eq!(clean_log_text(text), "ok done\n");
    }

    #[test]
    fn test_clean_leaves_plain_text_alone() {
        let text = "plain output\nwith 2024-01-01T00:00:00.000Z mid-line timestamp\n";
        assert_eq!(clean_log_text(text), text);
    }
}
