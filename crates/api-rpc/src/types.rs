//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};

/// sync.trigger.v1 - Run the sync fan-out now
#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerResponse {
    pub jobs_enqueued: usize,
}

/// sync.status.v1 - Per-phase result inspection for one source
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub source_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseStatus {
    pub phase: String,
    pub uid: String,
    /// UNKNOWN when no unexpired result exists for the uid
    pub status: String,
    pub messages: Vec<String>,
    pub error: Option<String>,
    pub finalized_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub source_id: String,
    pub source_name: String,
    pub phases: Vec<PhaseStatus>,
}

/// source.list.v1 - List configured sources
#[derive(Debug, Deserialize)]
pub struct ListSourcesRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSourcesResponse {
    pub sources: Vec<SourceInfo>,
}

/// source.add.v1 - Register a source
#[derive(Debug, Deserialize)]
pub struct AddSourceRequest {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub settings: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct AddSourceResponse {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

/// source.set-enabled.v1 - Enable or disable a source
#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub source_id: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetEnabledResponse {
    pub source_id: String,
    pub enabled: bool,
}

/// source.delete.v1 - Remove a source
#[derive(Debug, Deserialize)]
pub struct DeleteSourceRequest {
    pub source_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSourceResponse {
    pub source_id: String,
    pub deleted: bool,
}

/// admin.stats.v1 - Get system statistics
#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_jobs: i64,
    pub queued_jobs: i64,
    pub running_jobs: i64,
    pub done_jobs: i64,
    pub failed_jobs: i64,
    pub stored_results: i64,
    pub db_size_bytes: i64,
    pub uptime_seconds: i64,
}

/// admin.maintenance.v1 - Run manual maintenance
#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub jobs_deleted: i64,
    pub results_purged: u64,
    pub db_size_before: i64,
    pub db_size_after: i64,
}
