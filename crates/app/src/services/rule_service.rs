//! Rule service — use-cases for managing rules.
//!
//! Every save goes through the same path: normalize, validate, reject on
//! error-level issues, persist, and hand the warnings back to the caller.

use serde::Serialize;

use modhub_domain::error::{ModHubError, NotFoundError, ValidationError};
use modhub_domain::id::RuleId;
use modhub_domain::rule::{
    Rule, RulePatch, ValidationIssue, ValidationPolicy, has_errors, normalize,
};

use crate::ports::RuleRepository;

/// A persisted rule together with the non-blocking issues found on save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSaved {
    pub rule: Rule,
    pub warnings: Vec<ValidationIssue>,
}

/// Application service for rule CRUD operations.
pub struct RuleService<R> {
    repo: R,
    policy: ValidationPolicy,
}

impl<R: RuleRepository> RuleService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R, policy: ValidationPolicy) -> Self {
        Self { repo, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Normalize and validate a rule without saving it.
    ///
    /// Returns the normalized rule and every issue, errors included.
    #[must_use]
    pub fn validate(&self, rule: Rule) -> (Rule, Vec<ValidationIssue>) {
        let (rule, mut issues) = normalize(rule, &self.policy);
        issues.extend(rule.validate(&self.policy));
        issues.sort_by_key(|issue| !issue.is_error());
        (rule, issues)
    }

    fn checked(&self, rule: Rule) -> Result<(Rule, Vec<ValidationIssue>), ModHubError> {
        let (rule, issues) = self.validate(rule);
        if has_errors(&issues) {
            return Err(ValidationError::Rejected { issues }.into());
        }
        Ok((rule, issues))
    }

    /// Create a new rule after validating it.
    ///
    /// Runtime state is reset: a new rule is never running.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] with every issue if any is an
    /// error, or a storage error propagated from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name))]
    pub async fn create_rule(&self, mut rule: Rule) -> Result<RuleSaved, ModHubError> {
        rule.is_running = false;
        let (rule, warnings) = self.checked(rule)?;
        let rule = self.repo.create(rule).await?;
        tracing::info!(rule_id = %rule.id, warnings = warnings.len(), "rule created");
        Ok(RuleSaved { rule, warnings })
    }

    /// Look up a rule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] when no rule with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: RuleId) -> Result<Rule, ModHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(&self) -> Result<Vec<Rule>, ModHubError> {
        self.repo.get_all().await
    }

    /// Replace a rule's definition.
    ///
    /// `lastTriggered` and `isRunning` belong to the engine; the repository
    /// keeps their stored values.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] if the rule does not exist,
    /// [`ModHubError::Validation`] if it is rejected, or a storage error.
    #[tracing::instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub async fn update_rule(&self, rule: Rule) -> Result<RuleSaved, ModHubError> {
        self.get_rule(rule.id).await?;
        self.save(rule).await
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Same as [`RuleService::update_rule`].
    #[tracing::instrument(skip(self, patch))]
    pub async fn patch_rule(&self, id: RuleId, patch: RulePatch) -> Result<RuleSaved, ModHubError> {
        let mut rule = self.get_rule(id).await?;
        patch.apply_to(&mut rule);
        self.save(rule).await
    }

    async fn save(&self, rule: Rule) -> Result<RuleSaved, ModHubError> {
        let (rule, warnings) = self.checked(rule)?;
        let rule = self.repo.update(rule).await?;
        Ok(RuleSaved { rule, warnings })
    }

    /// Delete a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] if the rule does not exist, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), ModHubError> {
        self.get_rule(id).await?;
        self.repo.delete(id).await
    }
}
