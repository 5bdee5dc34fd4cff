//! Durable job store for lead discovery runs.
//!
//! `PgLeadJobStore` is the production implementation; `InMemoryLeadJobStore`
//! backs tests and mirrors the same semantics, including the atomic
//! rate-limited create and the monotone progress guard.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use super::model::{Lead, LeadJob, LeadJobStatus};

#[async_trait]
pub trait LeadJobStore: Send + Sync {
    /// Insert the job unless the owner already created one inside `window`.
    ///
    /// Check and insert happen atomically, so two near-simultaneous starts
    /// from the same user yield exactly one row. Returns the stored job, or
    /// None when rate limited.
    async fn create_if_not_rate_limited(
        &self,
        job: LeadJob,
        window: Duration,
    ) -> Result<Option<LeadJob>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LeadJob>>;

    /// Idempotent overwrite; the stored value never decreases.
    async fn update_progress(&self, id: Uuid, progress: i32) -> Result<()>;

    /// running -> completed: writes the full results payload, progress 100,
    /// and the completion timestamp.
    async fn finalize(&self, id: Uuid, results: Vec<Lead>) -> Result<()>;

    /// running -> failed, recording the error.
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()>;

    /// Number of jobs this user created inside the trailing window.
    async fn created_within(&self, user_id: &str, window: Duration) -> Result<i64>;
}

// =============================================================================
// Postgres implementation
// =============================================================================

pub struct PgLeadJobStore {
    pool: PgPool,
}

impl PgLeadJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadJobStore for PgLeadJobStore {
    async fn create_if_not_rate_limited(
        &self,
        job: LeadJob,
        window: Duration,
    ) -> Result<Option<LeadJob>> {
        // Single-statement insert: the cooldown check and the insert cannot
        // interleave with another create for the same user.
        let inserted = sqlx::query_as::<_, LeadJob>(
            r#"
            INSERT INTO lead_jobs (
                id, user_id, cities, business_types, max_results_per_city,
                status, progress, total_steps, results, error_message,
                started_at, completed_at, created_at
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
            WHERE NOT EXISTS (
                SELECT 1 FROM lead_jobs
                WHERE user_id = $2
                  AND created_at > NOW() - ($14 || ' seconds')::INTERVAL
            )
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(&job.user_id)
        .bind(&job.cities)
        .bind(&job.business_types)
        .bind(job.max_results_per_city)
        .bind(job.status)
        .bind(job.progress)
        .bind(job.total_steps)
        .bind(&job.results)
        .bind(&job.error_message)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.created_at)
        .bind(window.as_secs().to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to insert lead job")?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LeadJob>> {
        sqlx::query_as::<_, LeadJob>("SELECT * FROM lead_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read lead job")
    }

    async fn update_progress(&self, id: Uuid, progress: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE lead_jobs
            SET progress = GREATEST(progress, $2)
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(progress)
        .execute(&self.pool)
        .await
        .context("Failed to update job progress")?;

        Ok(())
    }

    async fn finalize(&self, id: Uuid, results: Vec<Lead>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE lead_jobs
            SET status = 'completed',
                progress = 100,
                results = $2,
                completed_at = NOW()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(Json(results))
        .execute(&self.pool)
        .await
        .context("Failed to finalize job")?;

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE lead_jobs
            SET status = 'failed',
                error_message = $2,
                completed_at = NOW()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .context("Failed to mark job failed")?;

        Ok(())
    }

    async fn created_within(&self, user_id: &str, window: Duration) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM lead_jobs
            WHERE user_id = $1
              AND created_at > NOW() - ($2 || ' seconds')::INTERVAL
            "#,
        )
        .bind(user_id)
        .bind(window.as_secs().to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to count recent jobs")
    }
}

// =============================================================================
// In-memory implementation (tests)
// =============================================================================

/// In-memory twin of the Postgres store. The single mutex makes the
/// rate-limited create as atomic as the SQL version.
#[derive(Default)]
pub struct InMemoryLeadJobStore {
    jobs: Mutex<HashMap<Uuid, LeadJob>>,
    progress_log: Mutex<Vec<(Uuid, i32)>>,
}

impl InMemoryLeadJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every progress value written, in write order (for monotonicity checks)
    pub fn progress_log(&self, id: Uuid) -> Vec<i32> {
        self.progress_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(job_id, _)| *job_id == id)
            .map(|(_, p)| *p)
            .collect()
    }

    /// Number of stored jobs
    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LeadJobStore for InMemoryLeadJobStore {
    async fn create_if_not_rate_limited(
        &self,
        job: LeadJob,
        window: Duration,
    ) -> Result<Option<LeadJob>> {
        let mut jobs = self.jobs.lock().unwrap();

        let cutoff = chrono::Utc::now() - chrono::Duration::from_std(window)?;
        let recent = jobs
            .values()
            .any(|j| j.user_id == job.user_id && j.created_at > cutoff);
        if recent {
            return Ok(None);
        }

        jobs.insert(job.id, job.clone());
        Ok(Some(job))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LeadJob>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn update_progress(&self, id: Uuid, progress: i32) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == LeadJobStatus::Running {
                job.progress = job.progress.max(progress);
                self.progress_log.lock().unwrap().push((id, job.progress));
            }
        }
        Ok(())
    }

    async fn finalize(&self, id: Uuid, results: Vec<Lead>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == LeadJobStatus::Running {
                job.status = LeadJobStatus::Completed;
                job.progress = 100;
                job.results = Json(results);
                job.completed_at = Some(chrono::Utc::now());
            }
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == LeadJobStatus::Running {
                job.status = LeadJobStatus::Failed;
                job.error_message = Some(error.to_string());
                job.completed_at = Some(chrono::Utc::now());
            }
        }
        Ok(())
    }

    async fn created_within(&self, user_id: &str, window: Duration) -> Result<i64> {
        let cutoff = chrono::Utc::now() - chrono::Duration::from_std(window)?;
        let count = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.user_id == user_id && j.created_at > cutoff)
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_for(user: &str) -> LeadJob {
        LeadJob::new(
            user,
            vec!["Stockholm".to_string()],
            vec!["cafe".to_string()],
            5,
        )
    }

    #[tokio::test]
    async fn test_second_create_within_window_is_rejected() {
        let store = InMemoryLeadJobStore::new();
        let window = Duration::from_secs(60);

        let first = store
            .create_if_not_rate_limited(job_for("user-1"), window)
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .create_if_not_rate_limited(job_for("user-1"), window)
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_other_users_are_not_rate_limited() {
        let store = InMemoryLeadJobStore::new();
        let window = Duration::from_secs(60);

        store
            .create_if_not_rate_limited(job_for("user-1"), window)
            .await
            .unwrap();
        let other = store
            .create_if_not_rate_limited(job_for("user-2"), window)
            .await
            .unwrap();
        assert!(other.is_some());
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let store = InMemoryLeadJobStore::new();
        let job = store
            .create_if_not_rate_limited(job_for("user-1"), Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();

        store.update_progress(job.id, 50).await.unwrap();
        store.update_progress(job.id, 25).await.unwrap();

        let stored = store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 50);
    }

    #[tokio::test]
    async fn test_finalize_sets_terminal_state() {
        let store = InMemoryLeadJobStore::new();
        let job = store
            .create_if_not_rate_limited(job_for("user-1"), Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();

        let lead = Lead {
            city: "Stockholm".to_string(),
            business_name: "Kafe Ett".to_string(),
            website: "https://kafe-ett.se".to_string(),
            email: "info@kafe-ett.se".to_string(),
            category: "cafe".to_string(),
        };
        store.finalize(job.id, vec![lead]).await.unwrap();

        let stored = store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeadJobStatus::Completed);
        assert_eq!(stored.progress, 100);
        assert_eq!(stored.results.0.len(), 1);
        assert!(stored.completed_at.is_some());

        // Completed jobs are read-only: a late progress write is ignored.
        store.update_progress(job.id, 10).await.unwrap();
        let stored = store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 100);
    }

    #[tokio::test]
    async fn test_mark_failed() {
        let store = InMemoryLeadJobStore::new();
        let job = store
            .create_if_not_rate_limited(job_for("user-1"), Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();

        store.mark_failed(job.id, "places API misconfigured").await.unwrap();

        let stored = store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeadJobStatus::Failed);
        assert_eq!(
            stored.error_message.as_deref(),
            Some("places API misconfigured")
        );
        assert!(stored.results.0.is_empty());
    }
}
