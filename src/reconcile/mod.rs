//! Reconciliation of freshly extracted forms against the catalog.
//!
//! Pure functions only: no I/O, no clock. The sync orchestrator decides
//! what to do with the outcome (archive, persist, report).

use crate::catalog::{FormEntry, FormMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What happens to user-added forms that a sync does not rediscover
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Extracted candidates fully replace the known-forms set
    #[default]
    Replace,
    /// Custom forms missing from the candidates are carried over
    KeepCustom,
}

impl RetentionPolicy {
    pub fn from_preserve_flag(preserve_custom_forms: bool) -> Self {
        if preserve_custom_forms {
            RetentionPolicy::KeepCustom
        } else {
            RetentionPolicy::Replace
        }
    }
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The mapping the catalog should hold next
    pub forms: FormMap,
    /// The candidates alone, as a mapping (what gets archived)
    pub extracted: FormMap,
    /// True iff `forms` differs from the current mapping
    pub changed: bool,
    /// Custom identifiers kept by `KeepCustom`
    pub retained: Vec<String>,
}

/// Reconcile with the default full-replace policy
pub fn reconcile<I>(current: &FormMap, candidates: I) -> Reconciliation
where
    I: IntoIterator<Item = FormEntry>,
{
    reconcile_with_policy(current, &BTreeSet::new(), candidates, RetentionPolicy::Replace)
}

/// Build the next form mapping from `candidates`.
///
/// Duplicate identifiers resolve to the last candidate seen. An empty
/// candidate set is a valid result and clears the mapping under
/// `Replace`.
pub fn reconcile_with_policy<I>(
    current: &FormMap,
    custom: &BTreeSet<String>,
    candidates: I,
    policy: RetentionPolicy,
) -> Reconciliation
where
    I: IntoIterator<Item = FormEntry>,
{
    let extracted: FormMap = candidates
        .into_iter()
        .map(|entry| (entry.identifier, entry.url))
        .collect();

    let mut forms = extracted.clone();
    let mut retained = Vec::new();

    if policy == RetentionPolicy::KeepCustom {
        for identifier in custom {
            if forms.contains_key(identifier) {
                continue;
            }
            if let Some(url) = current.get(identifier) {
                forms.insert(identifier.clone(), url.clone());
                retained.push(identifier.clone());
            }
        }
    }

    let changed = &forms != current;

    Reconciliation {
        forms,
        extracted,
        changed,
        retained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> FormMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn entries(pairs: &[(&str, &str)]) -> Vec<FormEntry> {
        pairs.iter().map(|(k, v)| FormEntry::new(*k, *v)).collect()
    }

    #[test]
    fn test_identical_candidates_are_unchanged() {
        let current = map(&[("I-130", "a"), ("I-765", "b")]);
        // Order of candidates does not matter
        let result = reconcile(&current, entries(&[("I-765", "b"), ("I-130", "a")]));
        assert!(!result.changed);
        assert_eq!(result.forms, current);
    }

    #[test]
    fn test_url_change_is_detected() {
        let current = map(&[("I-765", "urlA")]);
        let result = reconcile(&current, entries(&[("I-765", "urlB")]));
        assert!(result.changed);
        assert_eq!(result.forms, map(&[("I-765", "urlB")]));
        assert_eq!(result.extracted, map(&[("I-765", "urlB")]));
    }

    #[test]
    fn test_new_identifier_is_detected() {
        let current = map(&[("I-765", "a")]);
        let result = reconcile(&current, entries(&[("I-765", "a"), ("I-90", "b")]));
        assert!(result.changed);
        assert_eq!(result.forms.len(), 2);
    }

    #[test]
    fn test_removal_is_a_change_and_replace_drops_it() {
        let current = map(&[("I-765", "a"), ("N-400", "n")]);
        let result = reconcile(&current, entries(&[("I-765", "a")]));
        assert!(result.changed);
        assert_eq!(result.forms, map(&[("I-765", "a")]));
    }

    #[test]
    fn test_empty_candidates_clear_the_catalog() {
        let current = map(&[("I-765", "a")]);
        let result = reconcile(&current, Vec::new());
        assert!(result.changed);
        assert!(result.forms.is_empty());

        let result = reconcile(&FormMap::new(), Vec::new());
        assert!(!result.changed);
    }

    #[test]
    fn test_duplicate_candidates_last_wins() {
        let result = reconcile(
            &FormMap::new(),
            entries(&[("I-765", "first"), ("I-765", "second")]),
        );
        assert_eq!(result.forms, map(&[("I-765", "second")]));
    }

    #[test]
    fn test_reconcile_is_pure() {
        let current = map(&[("I-765", "a"), ("I-130", "b")]);
        let candidates = entries(&[("I-765", "a2"), ("I-485", "c")]);

        let first = reconcile(&current, candidates.clone());
        let second = reconcile(&current, candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn test_keep_custom_retains_user_forms() {
        let current = map(&[("I-765", "a"), ("MY-1", "mine"), ("I-90", "gone")]);
        let custom: BTreeSet<String> = ["MY-1".to_string()].into();

        let result = reconcile_with_policy(
            &current,
            &custom,
            entries(&[("I-765", "a")]),
            RetentionPolicy::KeepCustom,
        );
        assert!(result.changed);
        assert_eq!(result.forms, map(&[("I-765", "a"), ("MY-1", "mine")]));
        assert_eq!(result.retained, vec!["MY-1".to_string()]);
        // Archived set holds only what was extracted
        assert_eq!(result.extracted, map(&[("I-765", "a")]));

        let result = reconcile_with_policy(
            &current,
            &custom,
            entries(&[("I-765", "a")]),
            RetentionPolicy::Replace,
        );
        assert_eq!(result.forms, map(&[("I-765", "a")]));
        assert!(result.retained.is_empty());
    }

    #[test]
    fn test_keep_custom_prefers_rediscovered_url() {
        let current = map(&[("I-765", "custom-url")]);
        let custom: BTreeSet<String> = ["I-765".to_string()].into();

        let result = reconcile_with_policy(
            &current,
            &custom,
            entries(&[("I-765", "live-url")]),
            RetentionPolicy::KeepCustom,
        );
        assert!(result.changed);
        assert_eq!(result.forms, map(&[("I-765", "live-url")]));
    }
}
