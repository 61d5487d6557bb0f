// crates/core/src/types.rs
use serde::{Deserialize, Serialize};

/// Default agent tag when nothing better can be derived.
pub const GENERAL_AGENT: &str = "general";

/// Activity classification by elapsed time since the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Busy,
    Idle,
    Stale,
}

/// Coarse lifecycle classification derived from the session title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Research,
    Planning,
    Implementing,
    Done,
}

/// Age cutoffs (in minutes) separating busy, idle, and stale sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub busy_minutes: i64,
    pub stale_minutes: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            busy_minutes: 5,
            stale_minutes: 60,
        }
    }
}

/// Line-change statistics carried through from the session file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    #[serde(default)]
    pub additions: i64,
    #[serde(default)]
    pub deletions: i64,
    #[serde(default)]
    pub files: i64,
}

/// A normalized, enriched session as served to the dashboard.
///
/// Rebuilt from disk on every discovery call; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    pub status: SessionStatus,
    pub phase: SessionPhase,
    pub agent: String,
    pub is_subagent: bool,
    /// Lookup key into the same session list, never an owning reference.
    #[serde(rename = "parentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub directory: String,
    pub project_name: String,
    /// Epoch milliseconds of the last mutation.
    pub updated: i64,
    pub age_minutes: i64,
    pub summary: ChangeSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// ============================================================================
// Raw on-disk records (untrusted input)
// ============================================================================

/// `time` object shared by session and message files. Timestamps are
/// epoch milliseconds; accepting floats tolerates whatever the writer
/// serialized.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawTime {
    #[serde(default)]
    pub created: Option<f64>,
    #[serde(default)]
    pub updated: Option<f64>,
}

impl RawTime {
    pub fn created_ms(&self) -> i64 {
        self.created.map(|v| v as i64).unwrap_or(0)
    }

    pub fn updated_ms(&self) -> i64 {
        self.updated.map(|v| v as i64).unwrap_or(0)
    }
}

/// A `ses_*.json` record. Every field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSessionFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub time: RawTime,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub summary: Option<ChangeSummary>,
    #[serde(rename = "parentID", default)]
    pub parent_id: Option<String>,
}

/// A `msg_*.json` record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessageFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub time: RawTime,
    /// Free-form in the wild: strings and numbers have both been observed.
    #[serde(default)]
    pub agent: Option<serde_json::Value>,
}

impl RawMessageFile {
    /// Coerce the loose `agent` field to a normalized tag.
    pub fn agent_tag(&self) -> Option<String> {
        match self.agent.as_ref()? {
            serde_json::Value::String(s) => {
                let tag = s.trim().to_lowercase();
                (!tag.is_empty()).then_some(tag)
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role.as_deref() == Some("user")
    }

    pub fn is_assistant(&self) -> bool {
        self.role.as_deref() == Some("assistant")
    }
}

/// A `prt_*.json` record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPartFile {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub state: Option<RawPartState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPartState {
    #[serde(default)]
    pub input: Option<RawToolInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawToolInput {
    #[serde(default)]
    pub description: Option<String>,
}

impl RawPartFile {
    /// Text payload for `text` parts, if non-empty.
    pub fn text_content(&self) -> Option<&str> {
        if self.kind.as_deref() != Some("text") {
            return None;
        }
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Tool description for `tool` parts, if non-empty.
    pub fn tool_description(&self) -> Option<&str> {
        if self.kind.as_deref() != Some("tool") {
            return None;
        }
        self.state
            .as_ref()?
            .input
            .as_ref()?
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
    }
}
