// crates/core/src/discovery.rs
//! Session discovery for the agentdeck dashboard.
//!
//! Walks `<storageRoot>/session/<projectDir>/ses_*.json`, normalizes each
//! record, classifies it, enriches it from message content, and returns
//! the lot sorted most-recently-updated first. The storage tree is
//! written concurrently by the agent process, so every failure here is
//! absorbed at the smallest scope: a bad file, project, or even a missing
//! root contributes nothing rather than failing the scan.

use crate::cache::EnrichmentCache;
use crate::enrich;
use crate::types::{RawSessionFile, Session, SessionPhase, SessionStatus, Thresholds, GENERAL_AGENT};
use regex_lite::Regex;
use std::path::Path;
use tokio::fs;
use tracing::debug;

const RESEARCH_KEYWORDS: &[&str] = &["research", "explore", "investigate"];
const PLANNING_KEYWORDS: &[&str] = &["plan", "design", "phase"];
const IMPLEMENTING_KEYWORDS: &[&str] = &["implement", "fix", "add"];
const DONE_KEYWORDS: &[&str] = &["complete", "done", "verify"];

/// Discover all sessions under `storage_root`, enriched and sorted
/// descending by last update. Never fails: a missing or unreadable root
/// yields an empty list.
pub async fn discover_sessions(
    storage_root: &Path,
    thresholds: Thresholds,
    cache: &mut EnrichmentCache,
) -> Vec<Session> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    discover_sessions_at(storage_root, thresholds, cache, now_ms).await
}

/// Discovery against an explicit clock, for deterministic tests.
pub async fn discover_sessions_at(
    storage_root: &Path,
    thresholds: Thresholds,
    cache: &mut EnrichmentCache,
    now_ms: i64,
) -> Vec<Session> {
    let session_root = storage_root.join("session");
    let mut sessions = Vec::new();

    let mut project_dirs = match fs::read_dir(&session_root).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %session_root.display(), error = %e, "no session root to scan");
            return sessions;
        }
    };

    // The "global" directory is scanned like any other project.
    while let Ok(Some(entry)) = project_dirs.next_entry().await {
        let project_path = entry.path();
        if !project_path.is_dir() {
            continue;
        }

        for file in list_session_files(&project_path).await {
            let bytes = match fs::read(&file).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(path = %file.display(), error = %e, "skipping unreadable session file");
                    continue;
                }
            };
            let raw: RawSessionFile = match serde_json::from_slice(&bytes) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(path = %file.display(), error = %e, "skipping malformed session file");
                    continue;
                }
            };

            let fallback_id = file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();

            let mut session = build_session(raw, &fallback_id, now_ms, thresholds);

            // A subagent's identity comes from its title marker; message
            // detection must not overwrite it.
            if !session.is_subagent {
                session = enrich::enrich_session_agent(&session, storage_root, cache).await;
            }
            session = enrich::enrich_session_title(&session, storage_root, cache).await;
            if !session.is_subagent {
                session.description = session.title.clone();
            }

            sessions.push(session);
        }
    }

    sessions.sort_by_key(|s| std::cmp::Reverse(s.updated));
    sessions
}

/// List `ses_*.json` files in one project directory.
async fn list_session_files(project_path: &Path) -> Vec<std::path::PathBuf> {
    let mut entries = match fs::read_dir(project_path).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %project_path.display(), error = %e, "skipping unreadable project");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("ses_") && name.ends_with(".json") {
            files.push(entry.path());
        }
    }
    files.sort();
    files
}

/// Normalize a raw session file into a base `Session` record.
fn build_session(
    raw: RawSessionFile,
    fallback_id: &str,
    now_ms: i64,
    thresholds: Thresholds,
) -> Session {
    let id = raw
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| fallback_id.to_string());
    let title = raw.title.unwrap_or_default();
    let updated = raw.time.updated_ms();
    // Floor division: an absent `updated` (epoch 0) yields an enormous
    // age, which classifies as stale below.
    let age_minutes = (now_ms - updated).div_euclid(60_000);
    let status = classify_status(age_minutes, thresholds);
    let phase = classify_phase(&title, status);

    let (agent, is_subagent, description) = match parse_subagent_title(&title) {
        Some(marker) => (marker.agent, true, marker.description),
        None => (GENERAL_AGENT.to_string(), false, title.clone()),
    };

    let directory = raw.directory.unwrap_or_default();
    let project_name = project_name_of(&directory);

    Session {
        id,
        slug: raw.slug.unwrap_or_else(|| "unknown".to_string()),
        title,
        description,
        detailed_description: None,
        current_task: None,
        status,
        phase,
        agent,
        is_subagent,
        parent_id: raw.parent_id,
        directory,
        project_name,
        updated,
        age_minutes,
        summary: raw.summary.unwrap_or_default(),
        version: raw.version,
    }
}

/// Busy under the busy cutoff, idle under the stale cutoff, stale beyond.
pub fn classify_status(age_minutes: i64, thresholds: Thresholds) -> SessionStatus {
    if age_minutes < thresholds.busy_minutes {
        SessionStatus::Busy
    } else if age_minutes < thresholds.stale_minutes {
        SessionStatus::Idle
    } else {
        SessionStatus::Stale
    }
}

/// Keyword scan of the title, first matching rule wins.
pub fn classify_phase(title: &str, status: SessionStatus) -> SessionPhase {
    let lower = title.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|kw| lower.contains(kw));
    let busy = status == SessionStatus::Busy;

    if contains_any(RESEARCH_KEYWORDS) {
        SessionPhase::Research
    } else if contains_any(PLANNING_KEYWORDS) {
        SessionPhase::Planning
    } else if busy && contains_any(IMPLEMENTING_KEYWORDS) {
        SessionPhase::Implementing
    } else if contains_any(DONE_KEYWORDS) {
        SessionPhase::Done
    } else if busy {
        SessionPhase::Implementing
    } else {
        SessionPhase::Done
    }
}

/// Parsed `(@name subagent)` title marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubagentMarker {
    pub agent: String,
    /// The title with the parenthetical removed and trimmed.
    pub description: String,
}

/// Detect the subagent marker a parent session stamps into child titles.
pub fn parse_subagent_title(title: &str) -> Option<SubagentMarker> {
    let re = Regex::new(r"(?i)\(@(\w+) subagent\)").ok()?;
    let caps = re.captures(title)?;
    let m = caps.get(0)?;
    let agent = caps.get(1)?.as_str().to_lowercase();

    let mut description = String::with_capacity(title.len());
    description.push_str(&title[..m.start()]);
    description.push_str(&title[m.end()..]);

    Some(SubagentMarker {
        agent,
        description: description.trim().to_string(),
    })
}

/// Last path segment of the session's working directory.
fn project_name_of(directory: &str) -> String {
    Path::new(directory)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
