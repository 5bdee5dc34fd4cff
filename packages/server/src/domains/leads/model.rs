//! Lead job model - one durable row per discovery run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use typed_builder::TypedBuilder;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "lead_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadJobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

// ============================================================================
// Lead
// ============================================================================

/// One discovered (business, email) pairing. An empty email means the crawl
/// reached the site but found no business inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub city: String,
    pub business_name: String,
    /// Absolute URL, or empty when the business listed none
    pub website: String,
    pub email: String,
    pub category: String,
}

// ============================================================================
// LeadJob
// ============================================================================

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct LeadJob {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    // Core identity
    pub user_id: String,

    // Request parameters (order drives the deterministic progress steps)
    pub cities: Json<Vec<String>>,
    pub business_types: Json<Vec<String>>,
    pub max_results_per_city: i32,

    // State. Creation and start are atomic: rows are born running.
    #[builder(default = LeadJobStatus::Running)]
    pub status: LeadJobStatus,
    #[builder(default = 0)]
    pub progress: i32,
    /// |cities| x |business_types|, immutable after creation
    pub total_steps: i32,

    // Results stay empty until the job completes
    #[builder(default = Json(Vec::new()))]
    pub results: Json<Vec<Lead>>,

    // Error tracking
    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,

    // Timestamps
    #[builder(default = Utc::now())]
    pub started_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub completed_at: Option<DateTime<Utc>>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl LeadJob {
    /// Build a new running job from a validated start request.
    pub fn new(
        user_id: impl Into<String>,
        cities: Vec<String>,
        business_types: Vec<String>,
        max_results_per_city: i32,
    ) -> Self {
        let total_steps = (cities.len() * business_types.len()) as i32;
        LeadJob::builder()
            .user_id(user_id.into())
            .cities(Json(cities))
            .business_types(Json(business_types))
            .max_results_per_city(max_results_per_city)
            .total_steps(total_steps)
            .build()
    }
}
