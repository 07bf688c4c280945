use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::versioning::VersionRegistry;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub versioning_enabled: bool,
    pub version_count: usize,
    pub current_version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangeSummary {
    pub id: String,
    pub description: String,
    pub routes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VersionSummary {
    pub name: String,
    pub current: bool,
    pub changes: Vec<ChangeSummary>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let registry = state.registry.current();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        versioning_enabled: state.versioning_enabled,
        version_count: registry.len(),
        current_version: registry.current().map(|v| v.name().to_string()),
    })
}

pub async fn get_versions(State(state): State<AdminState>) -> Json<Vec<VersionSummary>> {
    Json(summarize(&state.registry.current()))
}

/// Oldest first, the way the registry orders them.
pub fn summarize(registry: &VersionRegistry) -> Vec<VersionSummary> {
    let current = registry.current().map(|v| v.name().to_string());

    registry
        .versions()
        .iter()
        .map(|version| VersionSummary {
            name: version.name().to_string(),
            current: current.as_deref() == Some(version.name()),
            changes: version
                .changes()
                .iter()
                .map(|change| ChangeSummary {
                    id: change.id().to_string(),
                    description: change.description().to_string(),
                    routes: change.routes().iter().map(ToString::to_string).collect(),
                })
                .collect(),
        })
        .collect()
}
