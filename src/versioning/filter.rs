//! Route filtering: keep only the changes that declare the current endpoint.

use std::sync::Arc;

use crate::versioning::change::{Change, Endpoint};

/// Subsequence of `chain` whose routes contain `endpoint`, order preserved.
///
/// An unidentified endpoint (`None`) matches nothing.
pub fn filter_for_endpoint(
    chain: Vec<Arc<dyn Change>>,
    endpoint: Option<&Endpoint>,
) -> Vec<Arc<dyn Change>> {
    let Some(endpoint) = endpoint else {
        return Vec::new();
    };

    chain
        .into_iter()
        .filter(|change| change.applies_to(endpoint))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::testing::{call_log, calls, ids, Recorder};

    #[test]
    fn test_keeps_matching_changes_in_order() {
        let log = call_log();
        let x = Endpoint::new("X", "act");
        let y = Endpoint::new("Y", "act");
        let chain = vec![
            Recorder::new("A", vec![x.clone()], &log),
            Recorder::new("B", vec![y.clone()], &log),
            Recorder::new("C", vec![y.clone(), x.clone()], &log),
            Recorder::new("D", vec![], &log),
        ];

        let filtered = filter_for_endpoint(chain, Some(&x));
        assert_eq!(ids(&filtered), vec!["A", "C"]);
        assert!(calls(&log).is_empty(), "filtering must not invoke any transform");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let log = call_log();
        let x = Endpoint::new("X", "act");
        let chain = vec![
            Recorder::new("A", vec![x.clone()], &log),
            Recorder::new("B", vec![Endpoint::new("X", "other")], &log),
        ];

        let once = filter_for_endpoint(chain, Some(&x));
        let twice = filter_for_endpoint(once.clone(), Some(&x));
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_unknown_endpoint_filters_everything() {
        let log = call_log();
        let chain = vec![Recorder::new("A", vec![Endpoint::new("X", "act")], &log)];
        assert!(filter_for_endpoint(chain, None).is_empty());
    }
}
