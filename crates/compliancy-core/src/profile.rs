//! Rule profiles and their selection from pipeline registrations.
//!
//! A profile picks one variant per rule family. Without an explicit choice a
//! family is represented by its baseline variant, the rule whose name equals
//! the family name. Profiles may also drop families altogether.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use compliancy_state::PipelineRegistration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::BASELINE_PROFILE;

/// A named, immutable bundle of rule-variant choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleProfile {
    pub name: String,
    /// family → selected variant name
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
    /// Families not evaluated under this profile.
    #[serde(default)]
    pub excluded_families: BTreeSet<String>,
}

impl RuleProfile {
    /// Profile that evaluates every family's baseline variant.
    pub fn baseline(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variants: BTreeMap::new(),
            excluded_families: BTreeSet::new(),
        }
    }

    pub fn with_variant(mut self, family: &str, variant: &str) -> Self {
        self.variants.insert(family.to_string(), variant.to_string());
        self
    }

    pub fn without_family(mut self, family: &str) -> Self {
        self.excluded_families.insert(family.to_string());
        self
    }

    /// Whether the rule `rule_name` of `family` is evaluated under this profile.
    pub fn selects(&self, family: &str, rule_name: &str) -> bool {
        if self.excluded_families.contains(family) {
            return false;
        }
        match self.variants.get(family) {
            Some(variant) => variant == rule_name,
            None => family == rule_name,
        }
    }
}

/// Known profiles, looked up case-insensitively by name.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    baseline: RuleProfile,
    profiles: HashMap<String, RuleProfile>,
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::new(BASELINE_PROFILE)
    }
}

impl ProfileCatalog {
    pub fn new(baseline_name: &str) -> Self {
        Self {
            baseline: RuleProfile::baseline(baseline_name),
            profiles: HashMap::new(),
        }
    }

    pub fn with_profile(mut self, profile: RuleProfile) -> Self {
        self.profiles.insert(profile.name.to_lowercase(), profile);
        self
    }

    pub fn baseline(&self) -> &RuleProfile {
        &self.baseline
    }

    /// Resolve a profile name; unknown names fall back to the baseline.
    pub fn get(&self, name: &str) -> &RuleProfile {
        if name.eq_ignore_ascii_case(&self.baseline.name) {
            return &self.baseline;
        }
        match self.profiles.get(&name.to_lowercase()) {
            Some(profile) => profile,
            None => {
                warn!(profile = %name, "unknown rule profile, using baseline");
                &self.baseline
            }
        }
    }

    /// Profile named by the first registration, or the baseline when there is
    /// none or it carries no profile name.
    pub fn select(&self, registrations: &[PipelineRegistration]) -> &RuleProfile {
        match registrations
            .first()
            .and_then(|r| r.rule_profile_name.as_deref())
            .filter(|name| !name.trim().is_empty())
        {
            Some(name) => self.get(name),
            None => &self.baseline,
        }
    }
}
