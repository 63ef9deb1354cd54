use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Policy tables for one entity domain.
///
/// Fields without an entry in `fields` fall back to
/// [`MergePolicy::FirstNonNull`] with no provider priority.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MergeConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Key holding the entity identifier in input and output records.
    #[serde(default = "default_entity_key")]
    pub entity_key: String,
    /// Key holding the provider tag in input records.
    #[serde(default = "default_provider_key")]
    pub provider_key: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRule>,
}

fn default_name() -> String {
    "default".into()
}

fn default_entity_key() -> String {
    "entity_id".into()
}

fn default_provider_key() -> String {
    "provider".into()
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            entity_key: default_entity_key(),
            provider_key: default_provider_key(),
            fields: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// First non-null value in input order wins.
    #[default]
    FirstNonNull,
    /// Largest numeric value wins; first-non-null when nothing is numeric.
    MaxNumeric,
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstNonNull => write!(f, "first-non-null"),
            Self::MaxNumeric => write!(f, "max-numeric"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    #[serde(default)]
    pub policy: MergePolicy,
    /// Preferred providers, most preferred first. Bypasses `policy` when
    /// any of them supplied a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
}

impl FieldRule {
    pub fn policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            priority: None,
        }
    }

    pub fn with_priority<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority = Some(providers.into_iter().map(Into::into).collect());
        self
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn with_rule(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.insert(field.into(), rule);
        self
    }

    pub fn policy_for(&self, field: &str) -> MergePolicy {
        self.fields.get(field).map(|r| r.policy).unwrap_or_default()
    }

    pub fn priority_for(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).and_then(|r| r.priority.as_deref())
    }

    /// Observed field names that have no declared rule, sorted.
    ///
    /// Such fields still merge under first-non-null; this only lets callers
    /// surface them.
    pub fn undeclared_fields<'a, I>(&self, observed: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        observed
            .into_iter()
            .filter(|f| !self.fields.contains_key(*f))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Built-in tables for the movie domain: identity fields take the first
    /// value seen, scores and money take the maximum unless the provider that
    /// owns the figure supplied one.
    pub fn movies() -> Self {
        use MergePolicy::{FirstNonNull, MaxNumeric};

        Self {
            name: "movies".into(),
            entity_key: "movie_id".into(),
            provider_key: "provider".into(),
            fields: BTreeMap::new(),
        }
        .with_rule("movie_title", FieldRule::policy(FirstNonNull))
        // Years identify the release, so the first reported year stands.
        .with_rule("release_year", FieldRule::policy(FirstNonNull))
        .with_rule("critic_score", FieldRule::policy(MaxNumeric).with_priority(["provider1"]))
        .with_rule("top_critic_score", FieldRule::policy(MaxNumeric).with_priority(["provider1"]))
        .with_rule("total_critic_ratings", FieldRule::policy(MaxNumeric))
        .with_rule("audience_avg_score", FieldRule::policy(MaxNumeric).with_priority(["provider2"]))
        .with_rule("total_audience_ratings", FieldRule::policy(MaxNumeric))
        .with_rule(
            "domestic_box_office_gross",
            FieldRule::policy(MaxNumeric).with_priority(["provider2", "provider3_domestic"]),
        )
        .with_rule(
            "box_office_gross_usd",
            FieldRule::policy(MaxNumeric).with_priority(["provider3_international"]),
        )
        .with_rule(
            "production_budget_usd",
            FieldRule::policy(MaxNumeric).with_priority(["provider3_financials"]),
        )
        .with_rule(
            "marketing_spend_usd",
            FieldRule::policy(MaxNumeric).with_priority(["provider3_financials"]),
        )
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if self.entity_key.is_empty() {
            return Err(MergeError::ConfigValidation("entity_key must not be empty".into()));
        }
        if self.provider_key.is_empty() {
            return Err(MergeError::ConfigValidation("provider_key must not be empty".into()));
        }
        if self.entity_key == self.provider_key {
            return Err(MergeError::ConfigValidation(format!(
                "entity_key and provider_key are both '{}'",
                self.entity_key
            )));
        }

        for (field, rule) in &self.fields {
            if field == &self.entity_key || field == &self.provider_key {
                return Err(MergeError::ConfigValidation(format!(
                    "field '{field}' is reserved and cannot carry a rule"
                )));
            }
            if field == "providers" {
                return Err(MergeError::ConfigValidation(
                    "field 'providers' is reserved for provenance".into(),
                ));
            }

            let Some(priority) = &rule.priority else {
                continue;
            };
            if priority.is_empty() {
                return Err(MergeError::ConfigValidation(format!(
                    "field '{field}': priority list is empty"
                )));
            }
            let mut seen = BTreeSet::new();
            for provider in priority {
                if provider.is_empty() {
                    return Err(MergeError::ConfigValidation(format!(
                        "field '{field}': priority list contains an empty provider name"
                    )));
                }
                if !seen.insert(provider.as_str()) {
                    return Err(MergeError::ConfigValidation(format!(
                        "field '{field}': provider '{provider}' listed twice"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
