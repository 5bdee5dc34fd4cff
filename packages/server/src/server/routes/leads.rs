//! Lead discovery endpoints: start a job, export a completed job as CSV.

use axum::extract::{Extension, Query};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::common::auth::{Actor, AdminCapability, AuthError};
use crate::domains::leads::{export_job, LeadError, LeadJob, LeadPipeline, RateLimiter};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

// =============================================================================
// Start job
// =============================================================================

/// Upper bound on the cities and businessTypes lists. Keeps one job's
/// city x category step count (and the i32 arithmetic on it) small.
const MAX_TERMS: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub business_types: Vec<String>,
    #[serde(default)]
    pub max_results_per_city: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub total_leads: usize,
}

/// Start a lead discovery job and wait for it to finish.
///
/// The pipeline itself is a detached task function; awaiting it here is the
/// thin synchronous wrapper that preserves the caller-waits contract.
pub async fn start_job_handler(
    Extension(state): Extension<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Json(request): Json<StartJobRequest>,
) -> Result<Json<StartJobResponse>, LeadError> {
    let deps = &state.deps;

    let Some(Extension(user)) = auth_user else {
        return Err(AuthError::AuthenticationRequired.into());
    };
    Actor::new(&user.user_id, user.is_admin)
        .can(AdminCapability::RunLeadJobs)
        .check(deps.as_ref())?;

    let cities = normalize_terms(request.cities);
    let business_types = normalize_terms(request.business_types);
    if cities.is_empty() {
        return Err(LeadError::Validation("cities is required".to_string()));
    }
    if business_types.is_empty() {
        return Err(LeadError::Validation("businessTypes is required".to_string()));
    }
    if cities.len() > MAX_TERMS {
        return Err(LeadError::Validation(format!(
            "cities may list at most {MAX_TERMS} entries"
        )));
    }
    if business_types.len() > MAX_TERMS {
        return Err(LeadError::Validation(format!(
            "businessTypes may list at most {MAX_TERMS} entries"
        )));
    }
    let max_results_per_city = match request.max_results_per_city {
        Some(cap) if cap > 0 => cap,
        _ => {
            return Err(LeadError::Validation(
                "maxResultsPerCity must be a positive number".to_string(),
            ))
        }
    };

    if !deps.place_search_configured {
        return Err(LeadError::SearchNotConfigured);
    }

    // Fast-path cooldown check; the create below re-checks atomically.
    let limiter = RateLimiter::new(deps.job_store.clone());
    if !limiter.allow(&user.user_id).await? {
        return Err(LeadError::RateLimited);
    }

    let job = LeadJob::new(&user.user_id, cities, business_types, max_results_per_city);
    let Some(job) = deps
        .job_store
        .create_if_not_rate_limited(job, limiter.window())
        .await?
    else {
        return Err(LeadError::RateLimited);
    };

    info!(
        job_id = %job.id,
        user_id = %job.user_id,
        total_steps = job.total_steps,
        "Starting lead discovery job"
    );

    let pipeline = LeadPipeline::new(
        deps.job_store.clone(),
        deps.place_search.clone(),
        deps.site_crawler.clone(),
        state.pipeline_options.clone(),
    );
    let leads = pipeline.run(&job).await?;

    Ok(Json(StartJobResponse {
        success: true,
        job_id: job.id,
        total_leads: leads.len(),
    }))
}

fn normalize_terms(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// =============================================================================
// Export
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
    pub city: Option<String>,
}

/// Export a completed job's leads as a CSV attachment.
pub async fn export_job_handler(
    Extension(state): Extension<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Query(params): Query<ExportParams>,
) -> Result<Response, LeadError> {
    let deps = &state.deps;

    let Some(Extension(user)) = auth_user else {
        return Err(AuthError::AuthenticationRequired.into());
    };
    Actor::new(&user.user_id, user.is_admin)
        .can(AdminCapability::ExportLeads)
        .check(deps.as_ref())?;

    let Some(job_id) = params.job_id.as_deref().filter(|id| !id.is_empty()) else {
        return Err(LeadError::Validation("jobId is required".to_string()));
    };
    // Charset gate before any lookup.
    if !job_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(LeadError::Validation("jobId is malformed".to_string()));
    }
    let job_id = Uuid::parse_str(job_id)
        .map_err(|_| LeadError::Validation("jobId is malformed".to_string()))?;

    let job = deps
        .job_store
        .find_by_id(job_id)
        .await?
        .ok_or(LeadError::NotFound)?;

    let today = chrono::Utc::now().date_naive();
    let export = export_job(&job, &user.user_id, params.city.as_deref(), today)?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename),
        ),
    ];
    Ok((headers, export.body).into_response())
}
