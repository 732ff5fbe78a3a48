//! Report aggregation.
//!
//! A YAML pipeline is scanned both as a build pipeline and as a YAML release
//! pipeline, which can yield two findings for the same rule and item. The
//! aggregated report keeps one finding per `(rule description, item name)`:
//! groups stay in order of first appearance and carry the value of the last
//! finding seen for the key.

use std::collections::HashMap;

use crate::domain::ComplianceFinding;

/// Concatenate family results in order and collapse duplicate keys.
pub fn aggregate<I>(families: I) -> Vec<ComplianceFinding>
where
    I: IntoIterator<Item = Vec<ComplianceFinding>>,
{
    let mut report: Vec<ComplianceFinding> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for finding in families.into_iter().flatten() {
        let key = (finding.rule_description.clone(), finding.item_name.clone());
        match index.get(&key) {
            Some(&slot) => report[slot] = finding,
            None => {
                index.insert(key, report.len());
                report.push(finding);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(rule: &str, item: &str, compliant: bool) -> ComplianceFinding {
        ComplianceFinding {
            rule_description: rule.to_string(),
            item_name: item.to_string(),
            is_compliant: compliant,
            has_deviation: false,
        }
    }

    #[test]
    fn test_last_duplicate_wins() {
        let report = aggregate(vec![
            vec![finding("Nobody can delete builds", "payments-ci", true)],
            vec![finding("Nobody can delete builds", "payments-ci", false)],
        ]);
        assert_eq!(
            report,
            vec![finding("Nobody can delete builds", "payments-ci", false)]
        );
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let report = aggregate(vec![
            vec![finding("A", "x", true), finding("B", "x", true)],
            vec![finding("C", "y", true), finding("A", "x", false)],
        ]);
        let keys: Vec<_> = report.iter().map(|f| f.rule_description.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert!(!report[0].is_compliant);
    }

    #[test]
    fn test_same_rule_different_items_are_distinct() {
        let report = aggregate(vec![vec![finding("A", "x", true), finding("A", "y", false)]]);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_empty_families() {
        assert!(aggregate(Vec::<Vec<ComplianceFinding>>::new()).is_empty());
    }
}
