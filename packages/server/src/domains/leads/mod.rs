// Lead discovery domain: job model + store, rate limiting, the sequential
// discovery pipeline, and CSV export of completed jobs.

pub mod aggregator;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod rate_limit;
pub mod store;

pub use aggregator::ResultAggregator;
pub use error::LeadError;
pub use export::{export_job, CsvExport};
pub use model::{Lead, LeadJob, LeadJobStatus};
pub use pipeline::{LeadPipeline, PipelineOptions};
pub use rate_limit::{RateLimiter, RATE_LIMIT_WINDOW};
pub use store::{InMemoryLeadJobStore, LeadJobStore, PgLeadJobStore};
