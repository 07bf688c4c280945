//! Version resolution.
//!
//! # Responsibilities
//! - Map a requested version name to the chain of changes that lift it to current
//!
//! # Design Decisions
//! - Versions are ordered oldest → current, so the chain is the matched version
//!   and everything after it, in registry order
//! - Earlier versions contribute nothing
//! - A shared change appears once per version that lists it (positional, no dedup)

use std::sync::Arc;
use thiserror::Error;

use crate::versioning::change::Change;
use crate::versioning::registry::{RegistryError, VersionRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The requested version is absent or unknown to the registry.
    #[error("no matching API version for {}", display_requested(.requested))]
    NoMatchingVersion { requested: Option<String> },

    /// The registry could not be obtained or is malformed. Always fatal.
    #[error("invalid version registry: {0}")]
    InvalidRegistryEntry(#[from] RegistryError),
}

fn display_requested(requested: &Option<String>) -> String {
    match requested {
        Some(name) => format!("'{}'", name),
        None => "an unversioned request".to_string(),
    }
}

/// Resolve the unfiltered chain for `requested`.
pub fn resolve(
    registry: &VersionRegistry,
    requested: Option<&str>,
) -> Result<Vec<Arc<dyn Change>>, ResolveError> {
    let no_match = || ResolveError::NoMatchingVersion {
        requested: requested.map(str::to_string),
    };

    let name = requested.ok_or_else(no_match)?;
    let start = registry.position(name).ok_or_else(no_match)?;

    Ok(registry.versions()[start..]
        .iter()
        .flat_map(|version| version.changes().iter().cloned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::change::Endpoint;
    use crate::versioning::registry::Version;
    use crate::versioning::testing::{call_log, ids, Recorder};

    fn registry() -> VersionRegistry {
        let log = call_log();
        let x = vec![Endpoint::new("X", "act")];
        VersionRegistry::new(vec![
            Version::new("V1", vec![Recorder::new("A", x.clone(), &log)]),
            Version::new(
                "V2",
                vec![
                    Recorder::new("B", x.clone(), &log),
                    Recorder::new("C", x.clone(), &log),
                ],
            ),
            Version::new("V3", vec![]),
        ])
        .unwrap()
    }

    #[test]
    fn test_oldest_version_gets_every_change() {
        let chain = resolve(&registry(), Some("V1")).unwrap();
        assert_eq!(ids(&chain), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_earlier_versions_are_excluded() {
        let chain = resolve(&registry(), Some("V2")).unwrap();
        assert_eq!(ids(&chain), vec!["B", "C"]);
    }

    #[test]
    fn test_current_version_gets_only_its_own_changes() {
        let chain = resolve(&registry(), Some("V3")).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_unknown_version() {
        let err = resolve(&registry(), Some("V9")).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NoMatchingVersion {
                requested: Some("V9".into())
            }
        );
    }

    #[test]
    fn test_missing_version() {
        let err = resolve(&registry(), None).unwrap_err();
        assert_eq!(err, ResolveError::NoMatchingVersion { requested: None });
        assert_eq!(err.to_string(), "no matching API version for an unversioned request");
    }

    #[test]
    fn test_empty_registry_never_matches() {
        let err = resolve(&VersionRegistry::empty(), Some("V1")).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatchingVersion { .. }));
    }

    #[test]
    fn test_shared_change_appears_per_version() {
        let log = call_log();
        let shared = Recorder::new("S", vec![Endpoint::new("X", "act")], &log);
        let registry = VersionRegistry::new(vec![
            Version::new("V1", vec![shared.clone()]),
            Version::new("V2", vec![shared]),
        ])
        .unwrap();

        let chain = resolve(&registry, Some("V1")).unwrap();
        assert_eq!(ids(&chain), vec!["S", "S"]);
    }
}
