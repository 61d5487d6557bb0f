// crates/core/src/extract.rs
//! Content-derived session metadata.
//!
//! Reads the `message/<sessionId>/` and `part/<messageId>/` subtrees to
//! derive an agent tag, a short semantic title, a longer description, and
//! the task the assistant is currently working on. The tree is written by
//! a concurrently running agent process, so every read here tolerates
//! missing directories, missing files, and malformed JSON: each failure
//! degrades to the operation's fallback instead of propagating.

use crate::types::{RawMessageFile, RawPartFile, GENERAL_AGENT};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Maximum length of a derived session title.
pub const TITLE_MAX_LEN: usize = 60;

/// Maximum length of a derived current-task line.
pub const TASK_MAX_LEN: usize = 80;

/// Sentence count kept for session descriptions.
const DESCRIPTION_SENTENCES: usize = 3;

const ELLIPSIS: &str = "...";

fn message_dir(storage_root: &Path, session_id: &str) -> PathBuf {
    storage_root.join("message").join(session_id)
}

fn part_dir(storage_root: &Path, message_id: &str) -> PathBuf {
    storage_root.join("part").join(message_id)
}

/// List files in `dir` matching `<prefix>*.json`, sorted by file name.
///
/// File names embed monotonically increasing identifiers, so the
/// lexicographic order doubles as a creation-order proxy. Anything not
/// matching the prefix/suffix is ignored even if it parses as JSON.
async fn list_prefixed_files(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with(prefix) && name.ends_with(".json") {
                    files.push(entry.path());
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "directory listing aborted");
                break;
            }
        }
    }

    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    files
}

/// Read and parse one JSON file; `None` on any failure.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable file");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping malformed JSON");
            None
        }
    }
}

/// Load a session's messages, oldest first.
///
/// Sorted by `time.created` (missing treated as 0); the stable sort keeps
/// file-name order for equal timestamps. Returns `(message_id, message)`
/// pairs; the id falls back to the file stem, which is the message id by
/// the storage's naming convention.
async fn load_messages(storage_root: &Path, session_id: &str) -> Vec<(String, RawMessageFile)> {
    let files = list_prefixed_files(&message_dir(storage_root, session_id), "msg_").await;

    let mut messages = Vec::with_capacity(files.len());
    for path in files {
        let Some(message) = read_json::<RawMessageFile>(&path).await else {
            continue;
        };
        let id = message
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_string()));
        if let Some(id) = id {
            messages.push((id, message));
        }
    }

    messages.sort_by_key(|(_, m)| m.time.created_ms());
    messages
}

/// Collect text and tool-description units from a message's parts, in
/// file-listing order.
async fn collect_part_units(storage_root: &Path, message_id: &str) -> Vec<String> {
    let files = list_prefixed_files(&part_dir(storage_root, message_id), "prt_").await;

    let mut units = Vec::new();
    for path in files {
        let Some(part) = read_json::<RawPartFile>(&path).await else {
            continue;
        };
        if let Some(text) = part.text_content() {
            units.push(text.to_string());
        } else if let Some(desc) = part.tool_description() {
            units.push(desc.to_string());
        }
    }
    units
}

/// The text of the first user message's first non-empty text part.
async fn first_user_text(storage_root: &Path, session_id: &str) -> Option<String> {
    let messages = load_messages(storage_root, session_id).await;
    let (message_id, _) = messages.iter().find(|(_, m)| m.is_user())?;

    let files = list_prefixed_files(&part_dir(storage_root, message_id), "prt_").await;
    for path in files {
        let Some(part) = read_json::<RawPartFile>(&path).await else {
            continue;
        };
        if let Some(text) = part.text_content() {
            return Some(text.to_string());
        }
    }
    None
}

/// Determine which agent owns a session from its first message.
///
/// Falls back to `"general"` on any failure: missing directory, no
/// matching files, unreadable or invalid JSON, missing field.
pub async fn detect_agent(storage_root: &Path, session_id: &str) -> String {
    let files = list_prefixed_files(&message_dir(storage_root, session_id), "msg_").await;
    let Some(first) = files.first() else {
        return GENERAL_AGENT.to_string();
    };
    let Some(message) = read_json::<RawMessageFile>(first).await else {
        return GENERAL_AGENT.to_string();
    };
    message
        .agent_tag()
        .unwrap_or_else(|| GENERAL_AGENT.to_string())
}

/// Derive a short title from the first user message.
pub async fn extract_semantic_title(storage_root: &Path, session_id: &str) -> Option<String> {
    let text = first_user_text(storage_root, session_id).await?;
    let title = first_sentence_or_truncate(&text, TITLE_MAX_LEN);
    (!title.is_empty()).then_some(title)
}

/// Derive a longer description: up to the first three sentences of the
/// first paragraph of the first user message.
pub async fn extract_session_description(
    storage_root: &Path,
    session_id: &str,
) -> Option<String> {
    let text = first_user_text(storage_root, session_id).await?;
    let cleaned = collapse_whitespace(first_paragraph(&text));
    let description = leading_sentences(&cleaned, DESCRIPTION_SENTENCES);
    (!description.is_empty()).then(|| description.to_string())
}

/// Derive what the assistant is currently doing from its most recent
/// message: the first sentence of the first text or tool-description
/// unit, truncated to 80 characters when no sentence terminator exists.
pub async fn extract_current_task(storage_root: &Path, session_id: &str) -> Option<String> {
    let messages = load_messages(storage_root, session_id).await;
    let (message_id, _) = messages.iter().rev().find(|(_, m)| m.is_assistant())?;

    let units = collect_part_units(storage_root, message_id).await;
    let first = units.into_iter().next()?;
    let task = first_sentence_or_truncate(&first, TASK_MAX_LEN);
    (!task.is_empty()).then_some(task)
}

// ============================================================================
// Text helpers
// ============================================================================

/// Collapse whitespace runs to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text up to the first blank-line break.
fn first_paragraph(text: &str) -> &str {
    let mut end = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() && end > 0 {
            break;
        }
        end += line.len();
    }
    &text[..end]
}

/// The leading `n` sentences of already-cleaned text, or all of it when
/// fewer terminators exist.
fn leading_sentences(cleaned: &str, n: usize) -> &str {
    let mut seen = 0;
    for (idx, ch) in cleaned.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            seen += 1;
            if seen == n {
                return cleaned[..idx + 1].trim();
            }
        }
    }
    cleaned.trim()
}

/// First sentence of `text`, or a truncation of it.
///
/// Whitespace is collapsed first. A leading sentence (ending `.`, `!`, or
/// `?`) wins when it fits in `max_len`; otherwise text short enough is
/// returned whole, and anything longer is cut to `max_len` characters
/// with a `...` marker, backing up to a word boundary when one falls in
/// the last 30% of the window. Character-based, so multi-byte input is
/// never split mid-codepoint.
pub fn first_sentence_or_truncate(text: &str, max_len: usize) -> String {
    let cleaned = collapse_whitespace(text);
    if cleaned.is_empty() {
        return cleaned;
    }

    if let Some(idx) = cleaned.find(['.', '!', '?']) {
        let sentence = cleaned[..idx + 1].trim();
        if sentence.chars().count() <= max_len {
            return sentence.to_string();
        }
    }

    if cleaned.chars().count() <= max_len {
        return cleaned;
    }

    let truncated: String = cleaned.chars().take(max_len).collect();
    let boundary_cutoff = max_len.saturating_mul(7) / 10;
    if let Some(space_idx) = truncated.rfind(' ') {
        let chars_before_space = truncated[..space_idx].chars().count();
        if chars_before_space >= boundary_cutoff {
            return format!("{}{}", truncated[..space_idx].trim_end(), ELLIPSIS);
        }
    }
    format!("{truncated}{ELLIPSIS}")
}
