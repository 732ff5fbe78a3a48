//! Deviation matching.
//!
//! A finding counts as deviated only when every registration of the pipeline
//! has a matching deviation, so each registered CI identifier must sign off
//! on the exception.

use std::sync::Arc;

use compliancy_state::{Deviation, PipelineRegistration};

/// Matches findings against a deviation list fetched once per evaluation.
///
/// Cheap to clone; the list is shared read-only across concurrent matchers.
#[derive(Debug, Clone)]
pub struct DeviationMatcher {
    deviations: Arc<Vec<Deviation>>,
    ci_identifiers: Arc<Vec<String>>,
}

impl DeviationMatcher {
    /// `registrations` must already be restricted to the evaluated pipeline.
    pub fn new(deviations: Vec<Deviation>, registrations: &[PipelineRegistration]) -> Self {
        Self {
            deviations: Arc::new(deviations),
            ci_identifiers: Arc::new(
                registrations
                    .iter()
                    .map(|r| r.ci_identifier.clone())
                    .collect(),
            ),
        }
    }

    /// Whether the item (owned by `item_project_id`) is deviated for `rule_name`.
    pub fn has_deviation(&self, item_id: &str, rule_name: &str, item_project_id: &str) -> bool {
        !self.ci_identifiers.is_empty()
            && self.ci_identifiers.iter().all(|ci| {
                self.deviations
                    .iter()
                    .any(|d| matches(d, item_id, rule_name, ci, item_project_id))
            })
    }
}

fn matches(
    deviation: &Deviation,
    item_id: &str,
    rule_name: &str,
    ci_identifier: &str,
    item_project_id: &str,
) -> bool {
    let owner = deviation
        .foreign_project_id
        .as_deref()
        .unwrap_or(&deviation.project_id);

    deviation.item_id == item_id
        && deviation.rule_name == rule_name
        && deviation.ci_identifier == ci_identifier
        && owner == item_project_id
}
