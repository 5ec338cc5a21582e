//! Group-label matching for workflow definitions

/// True when a definition with `labels` is visible to a caller in `groups`
///
/// An unlabeled definition is public within its tenant. List endpoints use
/// this to remove entries wholesale (existence is never leaked through a
/// 403 on an item the caller could not list); single-record endpoints turn
/// a false result into an explicit authorization error instead.
pub fn is_authorized_by_group(labels: &[String], groups: &[String]) -> bool {
    labels.is_empty() || labels.iter().any(|label| groups.contains(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unlabeled_definition_is_public() {
        assert!(is_authorized_by_group(&[], &strings(&["g2"])));
        assert!(is_authorized_by_group(&[], &[]));
    }

    #[test]
    fn test_intersecting_groups_authorize() {
        assert!(is_authorized_by_group(
            &strings(&["g1", "g3"]),
            &strings(&["g2", "g3"])
        ));
    }

    #[test]
    fn test_disjoint_groups_deny() {
        assert!(!is_authorized_by_group(&strings(&["g1"]), &strings(&["g2"])));
        assert!(!is_authorized_by_group(&strings(&["g1"]), &[]));
    }
}
