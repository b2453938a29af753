//! Keyed JSON rule/credential store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.namesync/
//!   rules.json        (user id → rule — mode 0600)
//!   credentials.json  (user id → per-provider bearer tokens — mode 0600)
//! ```
//!
//! # API pattern
//!
//! [`JsonRuleStore::at`] takes an explicit home path and is what tests use
//! with `TempDir`; [`JsonRuleStore::open`] derives home from
//! `dirs::home_dir()` and delegates. Writes are atomic: serialize →
//! `.json.tmp` sibling → `chmod 0600` → `rename`. The `.tmp` lives in the
//! same directory as the target (same filesystem — no EXDEV on macOS).
//!
//! Mutations go through a load-modify-save cycle guarded by an internal
//! mutex, so concurrent per-rule futures in one run cannot interleave
//! writes to the same file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::types::{Credentials, Provider, Rule, UserId};

// ---------------------------------------------------------------------------
// RuleStore trait — the engine's collaborator contract
// ---------------------------------------------------------------------------

/// Persistence operations the sync engine needs from the rule store.
///
/// The engine only ever reads rules and credentials, advances a rule's
/// last generated name after a successful profile write, or disables a
/// rule. It never creates or deletes rules.
pub trait RuleStore: Send + Sync {
    /// All rules with automation currently enabled.
    fn list_eligible_rules(&self) -> Result<Vec<Rule>, StoreError>;

    /// Record the name the engine just wrote for `user_id`.
    fn set_last_generated_name(&self, user_id: &UserId, name: &str) -> Result<(), StoreError>;

    /// Halt automation for `user_id`. The last generated name is kept for
    /// diagnostics; only the enabled flag is cleared.
    fn disable(&self, user_id: &UserId) -> Result<(), StoreError>;

    /// Bearer credentials for one provider, if provisioned.
    fn credentials(
        &self,
        user_id: &UserId,
        provider: Provider,
    ) -> Result<Option<Credentials>, StoreError>;
}

// ---------------------------------------------------------------------------
// On-disk payloads
// ---------------------------------------------------------------------------

type RulesFile = BTreeMap<String, Rule>;

/// Per-user credential record. Either slot may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Credentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Credentials>,
}

type CredentialsFile = BTreeMap<String, UserCredentials>;

// ---------------------------------------------------------------------------
// JsonRuleStore
// ---------------------------------------------------------------------------

/// File-backed [`RuleStore`] rooted at `<home>/.namesync/`.
#[derive(Debug)]
pub struct JsonRuleStore {
    home: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRuleStore {
    /// Store rooted at an explicit home directory. Tests use this with
    /// `TempDir`; nothing is created until the first write.
    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store rooted at `dirs::home_dir()`.
    pub fn open() -> Result<Self, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::HomeNotFound)?;
        Ok(Self::at(home))
    }

    /// `<home>/.namesync/rules.json` — pure, no I/O.
    pub fn rules_path(&self) -> PathBuf {
        self.home.join(".namesync").join("rules.json")
    }

    /// `<home>/.namesync/credentials.json` — pure, no I/O.
    pub fn credentials_path(&self) -> PathBuf {
        self.home.join(".namesync").join("credentials.json")
    }

    /// All rules, enabled or not, sorted by user id.
    pub fn list_rules(&self) -> Result<Vec<Rule>, StoreError> {
        let rules = load_json::<RulesFile>(&self.rules_path())?.unwrap_or_default();
        Ok(rules.into_values().collect())
    }

    /// Load one rule by user id.
    pub fn get_rule(&self, user_id: &UserId) -> Result<Rule, StoreError> {
        let rules = load_json::<RulesFile>(&self.rules_path())?.unwrap_or_default();
        rules
            .get(&user_id.0)
            .cloned()
            .ok_or_else(|| StoreError::RuleNotFound {
                user_id: user_id.0.clone(),
            })
    }

    /// Insert or replace a rule record. This is the submission path the
    /// UI/CLI layer uses; the engine itself never calls it.
    pub fn save_rule(&self, rule: &Rule) -> Result<(), StoreError> {
        let _guard = lock(&self.write_lock);
        let path = self.rules_path();
        let mut rules = load_json::<RulesFile>(&path)?.unwrap_or_default();
        rules.insert(rule.user_id.0.clone(), rule.clone());
        save_json(&path, &rules)
    }

    /// Store a bearer token for one of a user's providers.
    pub fn set_credentials(
        &self,
        user_id: &UserId,
        provider: Provider,
        credentials: Credentials,
    ) -> Result<(), StoreError> {
        let _guard = lock(&self.write_lock);
        let path = self.credentials_path();
        let mut all = load_json::<CredentialsFile>(&path)?.unwrap_or_default();
        let entry = all.entry(user_id.0.clone()).or_default();
        match provider {
            Provider::Tasks => entry.tasks = Some(credentials),
            Provider::Profile => entry.profile = Some(credentials),
        }
        save_json(&path, &all)
    }

    /// Remove a stored token. No-op if none was stored.
    pub fn remove_credentials(&self, user_id: &UserId, provider: Provider) -> Result<(), StoreError> {
        let _guard = lock(&self.write_lock);
        let path = self.credentials_path();
        let mut all = load_json::<CredentialsFile>(&path)?.unwrap_or_default();
        if let Some(entry) = all.get_mut(&user_id.0) {
            match provider {
                Provider::Tasks => entry.tasks = None,
                Provider::Profile => entry.profile = None,
            }
        }
        save_json(&path, &all)
    }

    fn update_rule<F>(&self, user_id: &UserId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Rule),
    {
        let _guard = lock(&self.write_lock);
        let path = self.rules_path();
        let mut rules = load_json::<RulesFile>(&path)?.unwrap_or_default();
        let rule = rules
            .get_mut(&user_id.0)
            .ok_or_else(|| StoreError::RuleNotFound {
                user_id: user_id.0.clone(),
            })?;
        apply(rule);
        rule.updated_at = Utc::now();
        save_json(&path, &rules)
    }
}

impl RuleStore for JsonRuleStore {
    fn list_eligible_rules(&self) -> Result<Vec<Rule>, StoreError> {
        Ok(self
            .list_rules()?
            .into_iter()
            .filter(|r| r.enabled)
            .collect())
    }

    fn set_last_generated_name(&self, user_id: &UserId, name: &str) -> Result<(), StoreError> {
        self.update_rule(user_id, |rule| {
            rule.last_generated_name = Some(name.to_owned());
        })
    }

    fn disable(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.update_rule(user_id, |rule| {
            rule.enabled = false;
        })
    }

    fn credentials(
        &self,
        user_id: &UserId,
        provider: Provider,
    ) -> Result<Option<Credentials>, StoreError> {
        let all = load_json::<CredentialsFile>(&self.credentials_path())?.unwrap_or_default();
        Ok(all.get(&user_id.0).and_then(|entry| match provider {
            Provider::Tasks => entry.tasks.clone(),
            Provider::Profile => entry.profile.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn lock(mutex: &Mutex<()>) -> std::sync::MutexGuard<'_, ()> {
    // A poisoned lock only means another thread panicked mid-write; the
    // on-disk file is still whole thanks to the atomic rename.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid store path")));
    };
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        set_dir_permissions(dir)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskListId;
    use tempfile::TempDir;

    fn sample_rule(user: &str, enabled: bool) -> Rule {
        let now = Utc::now();
        Rule {
            user_id: UserId::from(user),
            task_list_id: TaskListId::from("inbox"),
            beginning_text: "@".to_string(),
            separator: " | ".to_string(),
            end_text: String::new(),
            normal_name: "Quiet".to_string(),
            enabled,
            last_generated_name: enabled.then(|| "@Buy milk".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_store_lists_no_rules() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        assert!(store.list_rules().unwrap().is_empty());
        assert!(store.list_eligible_rules().unwrap().is_empty());
    }

    #[test]
    fn save_and_reload_rule() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        let rule = sample_rule("u-1", true);
        store.save_rule(&rule).unwrap();

        let loaded = store.get_rule(&UserId::from("u-1")).unwrap();
        assert_eq!(loaded, rule);
    }

    #[test]
    fn eligible_excludes_disabled_rules() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        store.save_rule(&sample_rule("on", true)).unwrap();
        store.save_rule(&sample_rule("off", false)).unwrap();

        let eligible = store.list_eligible_rules().unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].user_id, UserId::from("on"));
    }

    #[test]
    fn disable_clears_enabled_but_keeps_last_name() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        store.save_rule(&sample_rule("u-1", true)).unwrap();

        store.disable(&UserId::from("u-1")).unwrap();

        let rule = store.get_rule(&UserId::from("u-1")).unwrap();
        assert!(!rule.enabled);
        assert_eq!(rule.last_generated_name.as_deref(), Some("@Buy milk"));
        assert!(store.list_eligible_rules().unwrap().is_empty());
    }

    #[test]
    fn set_last_generated_name_advances_and_bumps_updated_at() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        let rule = sample_rule("u-1", true);
        store.save_rule(&rule).unwrap();

        store
            .set_last_generated_name(&UserId::from("u-1"), "@Call Bob")
            .unwrap();

        let loaded = store.get_rule(&UserId::from("u-1")).unwrap();
        assert_eq!(loaded.last_generated_name.as_deref(), Some("@Call Bob"));
        assert!(loaded.updated_at >= rule.updated_at);
    }

    #[test]
    fn mutating_missing_rule_is_rule_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        let err = store.disable(&UserId::from("ghost")).unwrap_err();
        assert!(matches!(err, StoreError::RuleNotFound { .. }));
    }

    #[test]
    fn credentials_roundtrip_per_provider() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        let user = UserId::from("u-1");

        assert!(store.credentials(&user, Provider::Tasks).unwrap().is_none());

        store
            .set_credentials(&user, Provider::Tasks, Credentials::new("tok-tasks"))
            .unwrap();
        store
            .set_credentials(&user, Provider::Profile, Credentials::new("tok-profile"))
            .unwrap();

        assert_eq!(
            store.credentials(&user, Provider::Tasks).unwrap(),
            Some(Credentials::new("tok-tasks"))
        );
        assert_eq!(
            store.credentials(&user, Provider::Profile).unwrap(),
            Some(Credentials::new("tok-profile"))
        );

        store.remove_credentials(&user, Provider::Tasks).unwrap();
        assert!(store.credentials(&user, Provider::Tasks).unwrap().is_none());
        assert!(store
            .credentials(&user, Provider::Profile)
            .unwrap()
            .is_some());
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let store = JsonRuleStore::at(tmp.path());
        store.save_rule(&sample_rule("u-1", true)).unwrap();
        let tmp_path = store.rules_path().with_extension("json.tmp");
        assert!(
            !tmp_path.exists(),
            "tmp file should be removed after atomic rename"
        );
    }
}
