//! Domain types for the namesync rule store and engine.
//!
//! All types are serializable/deserializable via serde; identifiers are
//! newtypes, never bare `String`s.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identifier for a user owning a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed identifier for a task list at the task provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskListId(pub String);

impl fmt::Display for TaskListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TaskListId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskListId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which external provider a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// The task-list provider (read-only task scope).
    Tasks,
    /// The profile provider (profile-write scope).
    Profile,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Tasks => write!(f, "tasks"),
            Provider::Profile => write!(f, "profile"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A user's persisted name-generation configuration plus automation state.
///
/// `enabled` and `last_generated_name` are deliberately separate fields:
/// disabling after drift clears only `enabled`, so the last name the engine
/// wrote stays available for diagnostics. The engine maintains the invariant
/// that an enabled rule has a recorded `last_generated_name`; an enabled rule
/// without one is a configuration gap and is skipped, never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub user_id: UserId,
    pub task_list_id: TaskListId,
    /// Prefix used when the task list is non-empty.
    pub beginning_text: String,
    /// Joined between task titles.
    pub separator: String,
    /// Suffix used when the task list is non-empty.
    pub end_text: String,
    /// Display name used when no outstanding tasks exist.
    pub normal_name: String,
    /// Whether automated updates are active for this rule.
    pub enabled: bool,
    /// The name the engine most recently wrote to the profile provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_generated_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An outstanding task fetched from the task provider. Transient — fetched
/// per run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    /// Opaque lexicographically-ordered sort key assigned by the provider.
    pub position: String,
}

/// An opaque bearer token for one provider. The engine never persists or
/// mutates credentials beyond reading them from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

// Tokens must not leak through Display paths.
impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(UserId::from("u-1").to_string(), "u-1");
        assert_eq!(TaskListId::from("inbox").to_string(), "inbox");
    }

    #[test]
    fn newtype_equality() {
        let a = UserId::from("x");
        let b = UserId::from(String::from("x"));
        assert_eq!(a, b);
    }

    #[test]
    fn provider_display() {
        assert_eq!(Provider::Tasks.to_string(), "tasks");
        assert_eq!(Provider::Profile.to_string(), "profile");
    }

    #[test]
    fn credentials_display_is_redacted() {
        let creds = Credentials::new("super-secret");
        assert_eq!(creds.to_string(), "<redacted>");
    }

    #[test]
    fn rule_serde_roundtrip() {
        let now = Utc::now();
        let rule = Rule {
            user_id: UserId::from("u-1"),
            task_list_id: TaskListId::from("inbox"),
            beginning_text: "Alex@".to_string(),
            separator: "、".to_string(),
            end_text: String::new(),
            normal_name: "Alex".to_string(),
            enabled: true,
            last_generated_name: Some("Alex@Buy milk".to_string()),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&rule).expect("serialize");
        let back: Rule = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(rule, back);
    }

    #[test]
    fn rule_omits_absent_last_generated_name() {
        let now = Utc::now();
        let rule = Rule {
            user_id: UserId::from("u-1"),
            task_list_id: TaskListId::from("inbox"),
            beginning_text: String::new(),
            separator: ", ".to_string(),
            end_text: String::new(),
            normal_name: "Alex".to_string(),
            enabled: false,
            last_generated_name: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&rule).expect("serialize");
        assert!(!json.contains("last_generated_name"));
    }
}
