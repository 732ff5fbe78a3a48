use serde::{Deserialize, Serialize};

/// Outcome of one rule evaluated against one item.
///
/// `(rule_description, item_name)` is the only identity a finding has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceFinding {
    pub rule_description: String,
    pub item_name: String,
    pub is_compliant: bool,
    pub has_deviation: bool,
}

impl ComplianceFinding {
    /// A non-compliant finding without a deviation blocks the release.
    pub fn is_blocking(&self) -> bool {
        !self.is_compliant && !self.has_deviation
    }
}
