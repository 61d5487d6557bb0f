// crates/core/src/enrich.rs
//! Cache-aware enrichment of session records.
//!
//! Each operation wraps one extractor behind the shared cache, keyed by
//! `<dimension>_<sessionId>_<updated>`. Embedding the mutation timestamp
//! in the key makes invalidation automatic: once a session is updated its
//! old key is simply never asked for again, and ages out of the cache on
//! its own. All operations return a new record; the input is never
//! mutated.

use crate::cache::EnrichmentCache;
use crate::extract;
use crate::types::Session;
use regex_lite::Regex;
use std::path::Path;

fn cache_key(dimension: &str, session: &Session) -> String {
    format!("{dimension}_{}_{}", session.id, session.updated)
}

/// Whether a title is a placeholder worth replacing with message-derived
/// content: the agent's `"New session - "` stamp, a leading ISO date, or
/// nothing at all.
pub fn is_generic_title(title: &str) -> bool {
    if title.trim().is_empty() || title.starts_with("New session - ") {
        return true;
    }
    Regex::new(r"^\d{4}-\d{2}-\d{2}")
        .map(|re| re.is_match(title))
        .unwrap_or(false)
}

/// Set `agent` from the session's message history.
pub async fn enrich_session_agent(
    session: &Session,
    storage_root: &Path,
    cache: &mut EnrichmentCache,
) -> Session {
    let key = cache_key("agent", session);
    let agent = match cache.get(&key) {
        Some(cached) => cached.unwrap_or_else(|| session.agent.clone()),
        None => {
            let detected = extract::detect_agent(storage_root, &session.id).await;
            cache.insert(key, Some(detected.clone()));
            detected
        }
    };
    Session {
        agent,
        ..session.clone()
    }
}

/// Replace a generic title with a semantic one derived from the first
/// user message. Non-generic titles pass through untouched, without any
/// cache interaction.
pub async fn enrich_session_title(
    session: &Session,
    storage_root: &Path,
    cache: &mut EnrichmentCache,
) -> Session {
    if !is_generic_title(&session.title) {
        return session.clone();
    }

    let key = cache_key("title", session);
    let extracted = match cache.get(&key) {
        Some(cached) => cached,
        None => {
            let value = extract::extract_semantic_title(storage_root, &session.id).await;
            cache.insert(key, value.clone());
            value
        }
    };

    match extracted {
        Some(title) => Session {
            title,
            ..session.clone()
        },
        None => session.clone(),
    }
}

/// Set `detailedDescription` from message content, falling back to the
/// session's existing description.
pub async fn enrich_session_description(
    session: &Session,
    storage_root: &Path,
    cache: &mut EnrichmentCache,
) -> Session {
    let key = cache_key("desc", session);
    let extracted = match cache.get(&key) {
        Some(cached) => cached,
        None => {
            let value = extract::extract_session_description(storage_root, &session.id).await;
            cache.insert(key, value.clone());
            value
        }
    };

    Session {
        detailed_description: Some(extracted.unwrap_or_else(|| session.description.clone())),
        ..session.clone()
    }
}

/// Set `currentTask` from the most recent assistant message. A derived
/// `None` ("assistant has said nothing actionable") is itself cached.
pub async fn enrich_session_current_task(
    session: &Session,
    storage_root: &Path,
    cache: &mut EnrichmentCache,
) -> Session {
    let key = cache_key("task", session);
    let current_task = match cache.get(&key) {
        Some(cached) => cached,
        None => {
            let value = extract::extract_current_task(storage_root, &session.id).await;
            cache.insert(key, value.clone());
            value
        }
    };

    Session {
        current_task,
        ..session.clone()
    }
}
