//! JSON seed file — initial rules, mods and settings.
//!
//! ```json
//! {
//!   "mods": [{ "name": "Gaming Mod", "description": "Max performance" }],
//!   "rules": [{ "name": "Gaming", "priority": 10, "conditions": [...], "actions": [...] }],
//!   "settings": { "fanSpeed": 40 }
//! }
//! ```
//!
//! Rules are ingested one by one: a malformed or invalid rule is logged and
//! skipped, the rest of the file still loads.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use modhub_app::ports::{ModRepository, RuleRepository, SettingsRepository};
use modhub_domain::error::ModHubError;
use modhub_domain::mods::Mod;
use modhub_domain::rule::{
    RuleIngestError, SkippedRule, ValidationPolicy, has_errors, normalize, parse_rules,
};
use modhub_domain::setting::Setting;

use crate::error::StorageError;

#[derive(Debug, Clone, Deserialize)]
struct ModSeed {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    active: bool,
}

/// Parsed content of a seed file, not yet stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    mods: Vec<ModSeed>,
    rules: Vec<serde_json::Value>,
    settings: BTreeMap<String, serde_json::Value>,
}

/// What [`Seed::apply`] stored and what it left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedReport {
    pub mods: usize,
    pub rules: usize,
    pub settings: usize,
    pub skipped_rules: Vec<SkippedRule>,
}

impl Seed {
    /// Read and parse a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be read, or
    /// [`StorageError::Json`] if its top-level shape is wrong.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse seed content.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Json`] if the content is not a seed object.
    pub fn parse(content: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Store the seed's content through the given repositories.
    ///
    /// Rules are normalized and validated with `policy`; rules that fail
    /// to parse or carry error-level issues are skipped and reported.
    ///
    /// # Errors
    ///
    /// Returns the first storage error raised by a repository.
    pub async fn apply<RR, MR, SR>(
        self,
        rules: &RR,
        mods: &MR,
        settings: &SR,
        policy: &ValidationPolicy,
    ) -> Result<SeedReport, ModHubError>
    where
        RR: RuleRepository,
        MR: ModRepository,
        SR: SettingsRepository,
    {
        let mut report = SeedReport::default();

        for seed in self.mods {
            let mut builder = Mod::builder().name(seed.name).active(seed.active);
            if let Some(description) = seed.description {
                builder = builder.description(description);
            }
            match builder.build() {
                Ok(m) => {
                    mods.create(m).await?;
                    report.mods += 1;
                }
                Err(err) => tracing::warn!(error = %err, "skipping invalid seed mod"),
            }
        }

        let total = self.rules.len();
        let parsed = parse_rules(self.rules);
        for skipped in &parsed.skipped {
            tracing::warn!(
                index = skipped.index,
                rule_id = ?skipped.id,
                error = %skipped.error,
                "skipping malformed seed rule"
            );
        }
        let parsed_indices: Vec<usize> = (0..total)
            .filter(|i| !parsed.skipped.iter().any(|s| s.index == *i))
            .collect();
        report.skipped_rules = parsed.skipped;

        for (index, rule) in parsed_indices.into_iter().zip(parsed.rules) {
            let (rule, mut issues) = normalize(rule, policy);
            issues.extend(rule.validate(policy));
            if has_errors(&issues) {
                let reasons: Vec<String> = issues
                    .iter()
                    .filter(|i| i.is_error())
                    .map(|i| i.message.clone())
                    .collect();
                tracing::warn!(rule_id = %rule.id, rule_name = %rule.name, ?reasons, "skipping invalid seed rule");
                report.skipped_rules.push(SkippedRule {
                    index,
                    id: Some(rule.id.to_string()),
                    error: RuleIngestError::Malformed(reasons.join("; ")),
                });
                continue;
            }
            for warning in &issues {
                tracing::warn!(rule_id = %rule.id, field = %warning.field, "{}", warning.message);
            }
            rules.create(rule).await?;
            report.rules += 1;
        }

        for (key, value) in self.settings {
            settings.put(Setting::new(key, value)).await?;
            report.settings += 1;
        }

        tracing::info!(
            mods = report.mods,
            rules = report.rules,
            settings = report.settings,
            skipped = report.skipped_rules.len(),
            "seed loaded"
        );
        Ok(report)
    }

    /// Like [`Seed::apply`], but only when the store holds no rules and no
    /// mods yet. Returns `None` when the store was left untouched.
    ///
    /// # Errors
    ///
    /// Returns the first storage error raised by a repository.
    pub async fn apply_if_empty<RR, MR, SR>(
        self,
        rules: &RR,
        mods: &MR,
        settings: &SR,
        policy: &ValidationPolicy,
    ) -> Result<Option<SeedReport>, ModHubError>
    where
        RR: RuleRepository,
        MR: ModRepository,
        SR: SettingsRepository,
    {
        if !rules.get_all().await?.is_empty() || !mods.get_all().await?.is_empty() {
            tracing::info!("store already populated, seed ignored");
            return Ok(None);
        }
        self.apply(rules, mods, settings, policy).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryModRepository, MemoryRuleRepository, MemorySettingsRepository};

    const SEED: &str = r#"{
        "mods": [
            { "name": "Gaming Mod", "description": "Max performance" },
            { "name": "Night Mod", "active": true }
        ],
        "rules": [
            {
                "name": "Gaming",
                "priority": 10,
                "conditions": [{ "type": "process", "operation": "running", "value": "game.exe" }],
                "actions": [{ "type": "activate_mod", "target": "Gaming Mod" }]
            },
            {
                "name": "Broken",
                "conditions": [{ "type": "time", "operation": "sometime", "value": "22:00" }]
            },
            {
                "name": "",
                "conditions": []
            }
        ],
        "settings": { "fanSpeed": 40 }
    }"#;

    #[tokio::test]
    async fn should_load_valid_content_and_skip_bad_rules() {
        let rules = MemoryRuleRepository::new();
        let mods = MemoryModRepository::new();
        let settings = MemorySettingsRepository::new();

        let report = Seed::parse(SEED)
            .unwrap()
            .apply(&rules, &mods, &settings, &ValidationPolicy::default())
            .await
            .unwrap();

        assert_eq!(report.mods, 2);
        assert_eq!(report.rules, 1);
        assert_eq!(report.settings, 1);
        let skipped: Vec<usize> = report.skipped_rules.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 2]);
        assert_eq!(rules.get_all().await.unwrap()[0].name, "Gaming");
        assert!(mods.find_by_target("night mod").await.unwrap().unwrap().active);
        assert_eq!(settings.get("fanSpeed").await.unwrap().unwrap().value, 40);
    }

    #[tokio::test]
    async fn should_seed_only_an_empty_store() {
        let rules = MemoryRuleRepository::new();
        let mods = MemoryModRepository::new();
        let settings = MemorySettingsRepository::new();
        let policy = ValidationPolicy::default();

        let first = Seed::parse(SEED)
            .unwrap()
            .apply_if_empty(&rules, &mods, &settings, &policy)
            .await
            .unwrap();
        let second = Seed::parse(SEED)
            .unwrap()
            .apply_if_empty(&rules, &mods, &settings, &policy)
            .await
            .unwrap();

        assert_eq!(first.map(|r| r.rules), Some(1));
        assert!(second.is_none());
        assert_eq!(rules.get_all().await.unwrap().len(), 1);
        assert_eq!(mods.get_all().await.unwrap().len(), 2);
    }

    #[test]
    fn should_accept_empty_object() {
        let seed = Seed::parse("{}").unwrap();
        assert!(seed.rules.is_empty());
        assert!(seed.mods.is_empty());
    }

    #[test]
    fn should_reject_non_object_seed() {
        assert!(matches!(
            Seed::parse("[1, 2]"),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn should_load_seed_from_file() {
        let path = std::env::temp_dir().join(format!("modhub-seed-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, SEED).unwrap();

        let seed = Seed::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(seed.mods.len(), 2);
        assert_eq!(seed.rules.len(), 3);
    }

    #[test]
    fn should_report_missing_file() {
        let result = Seed::load("/nonexistent/modhub-seed.json");
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
