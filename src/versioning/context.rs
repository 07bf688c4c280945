//! Per-request versioning context.
//!
//! # States
//! ```text
//! Unevaluated → Bypassed                                   (terminal)
//! Unevaluated → Failed(NoMatchingVersion)                  (terminal)
//! Unevaluated → Failed(InvalidRegistryEntry)               (terminal)
//! Unevaluated → Resolved → RequestTransformed → ResponseTransformed
//! ```
//!
//! # Design Decisions
//! - The resolved chain is computed once and cached here for both pipelines
//! - Response interception is a one-shot flag, checked and cleared in one step
//! - Illegal transitions are errors, not silent no-ops

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::versioning::change::{Change, Endpoint, TransformError};
use crate::versioning::pipeline::{apply_request, apply_response, RequestParams};
use crate::versioning::resolver::ResolveError;

/// Where a request is in the versioning lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Unevaluated,
    Bypassed,
    Resolved,
    RequestTransformed,
    ResponseTransformed,
    Failed(ResolveError),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Unevaluated => "unevaluated",
            Stage::Bypassed => "bypassed",
            Stage::Resolved => "resolved",
            Stage::RequestTransformed => "request_transformed",
            Stage::ResponseTransformed => "response_transformed",
            Stage::Failed(ResolveError::NoMatchingVersion { .. }) => "failed_no_matching_version",
            Stage::Failed(ResolveError::InvalidRegistryEntry(_)) => "failed_invalid_registry",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Stage::Bypassed | Stage::Failed(_) | Stage::ResponseTransformed
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("illegal versioning transition from {from} to {to}")]
    Stage { from: &'static str, to: &'static str },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Request-scoped versioning state. Never shared between requests.
#[derive(Debug)]
pub struct VersionContext {
    stage: Stage,
    version: Option<String>,
    endpoint: Option<Endpoint>,
    chain: Vec<Arc<dyn Change>>,
    intercept: bool,
}

impl Default for VersionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionContext {
    pub fn new() -> Self {
        Self {
            stage: Stage::Unevaluated,
            version: None,
            endpoint: None,
            chain: Vec::new(),
            intercept: false,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The version the client asked for, once resolved.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// The resolved and filtered chain, oldest change first.
    pub fn chain(&self) -> &[Arc<dyn Change>] {
        &self.chain
    }

    /// Whether the response hook is still armed.
    pub fn is_intercepting(&self) -> bool {
        self.intercept
    }

    fn advance(&mut self, expected: &Stage, next: Stage) -> Result<(), ContextError> {
        if &self.stage != expected {
            return Err(ContextError::Stage {
                from: self.stage.name(),
                to: next.name(),
            });
        }
        self.stage = next;
        Ok(())
    }

    /// A context the bypass predicate turned away.
    pub fn bypassed() -> Self {
        Self {
            stage: Stage::Bypassed,
            ..Self::new()
        }
    }

    /// A context whose resolution failed.
    pub fn failed(error: ResolveError) -> Self {
        Self {
            stage: Stage::Failed(error),
            ..Self::new()
        }
    }

    /// A context with its chain resolved and filtered, ready for the request pipeline.
    pub fn resolved(version: String, endpoint: Option<Endpoint>, chain: Vec<Arc<dyn Change>>) -> Self {
        Self {
            stage: Stage::Resolved,
            version: Some(version),
            endpoint,
            chain,
            intercept: false,
        }
    }

    /// Run the request pipeline and arm the response hook.
    pub fn transform_request(&mut self, params: RequestParams) -> Result<RequestParams, ContextError> {
        self.advance(&Stage::Resolved, Stage::RequestTransformed)?;
        let params = match &self.endpoint {
            Some(endpoint) if !self.chain.is_empty() => apply_request(&self.chain, endpoint, params)?,
            _ => params,
        };
        self.intercept = true;
        Ok(params)
    }

    /// Disarm the response hook for a response that will not be transformed
    /// (not JSON, empty or unparseable). No change runs.
    pub fn release_response(&mut self) -> Result<(), ContextError> {
        if !std::mem::replace(&mut self.intercept, false) {
            return Ok(());
        }
        self.advance(&Stage::RequestTransformed, Stage::ResponseTransformed)
    }

    /// Run the response pipeline if the hook is armed.
    ///
    /// The flag is cleared before any change runs, so a nested or repeated call
    /// returns the payload untouched.
    pub fn transform_response(&mut self, payload: Value) -> Result<Value, ContextError> {
        if !std::mem::replace(&mut self.intercept, false) {
            return Ok(payload);
        }
        self.advance(&Stage::RequestTransformed, Stage::ResponseTransformed)?;
        match &self.endpoint {
            Some(endpoint) if !self.chain.is_empty() => {
                Ok(apply_response(&self.chain, endpoint, payload)?)
            }
            _ => Ok(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::testing::{call_log, calls, Recorder};
    use serde_json::json;

    fn resolved(log: &crate::versioning::testing::CallLog) -> VersionContext {
        let endpoint = Endpoint::new("X", "act");
        VersionContext::resolved(
            "V1".into(),
            Some(endpoint.clone()),
            vec![
                Recorder::new("A", vec![endpoint.clone()], log),
                Recorder::new("B", vec![endpoint], log),
            ],
        )
    }

    #[test]
    fn test_full_lifecycle() {
        let log = call_log();
        let mut ctx = resolved(&log);
        assert_eq!(ctx.stage(), &Stage::Resolved);
        assert_eq!(ctx.version(), Some("V1"));

        let params = ctx.transform_request(RequestParams::default()).unwrap();
        assert_eq!(params.body["trail"], json!(["A", "B"]));
        assert_eq!(ctx.stage(), &Stage::RequestTransformed);
        assert!(ctx.is_intercepting());

        let payload = ctx.transform_response(json!({})).unwrap();
        assert_eq!(payload["trail"], json!(["B", "A"]));
        assert_eq!(ctx.stage(), &Stage::ResponseTransformed);
        assert!(ctx.stage().is_terminal());
    }

    #[test]
    fn test_response_hook_fires_once() {
        let log = call_log();
        let mut ctx = resolved(&log);
        ctx.transform_request(RequestParams::default()).unwrap();

        ctx.transform_response(json!({})).unwrap();
        let second = ctx.transform_response(json!({"untouched": true})).unwrap();
        assert_eq!(second, json!({"untouched": true}));

        let responses = calls(&log).into_iter().filter(|c| c.ends_with(":response")).count();
        assert_eq!(responses, 2);
    }

    #[test]
    fn test_bypassed_context_never_intercepts() {
        let mut ctx = VersionContext::bypassed();

        assert_eq!(ctx.stage(), &Stage::Bypassed);
        assert_eq!(ctx.transform_response(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(ctx.stage(), &Stage::Bypassed);
    }

    #[test]
    fn test_illegal_transitions() {
        let mut ctx = VersionContext::new();
        let err = ctx.transform_request(RequestParams::default()).unwrap_err();
        assert_eq!(
            err,
            ContextError::Stage {
                from: "unevaluated",
                to: "request_transformed"
            }
        );

        let mut failed = VersionContext::failed(ResolveError::NoMatchingVersion { requested: None });
        assert!(failed.stage().is_terminal());
        assert!(failed.transform_request(RequestParams::default()).is_err());
    }

    #[test]
    fn test_empty_chain_arms_hook_without_changes() {
        let mut ctx = VersionContext::resolved("V3".into(), Some(Endpoint::new("X", "act")), vec![]);

        let params = ctx.transform_request(RequestParams::default()).unwrap();
        assert_eq!(params, RequestParams::default());
        assert_eq!(ctx.transform_response(json!([1, 2])).unwrap(), json!([1, 2]));
        assert_eq!(ctx.stage(), &Stage::ResponseTransformed);
    }

    #[test]
    fn test_release_response_reaches_terminal_stage() {
        let log = call_log();
        let mut ctx = resolved(&log);
        ctx.transform_request(RequestParams::default()).unwrap();

        ctx.release_response().unwrap();
        assert!(!ctx.is_intercepting());
        assert_eq!(ctx.stage(), &Stage::ResponseTransformed);

        // Already released: later calls are no-ops and run nothing.
        ctx.release_response().unwrap();
        assert_eq!(ctx.transform_response(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert!(calls(&log).iter().all(|c| !c.ends_with(":response")));
    }
}
