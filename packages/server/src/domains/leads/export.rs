//! CSV export of completed lead jobs.

use chrono::NaiveDate;

use super::error::LeadError;
use super::model::{Lead, LeadJob, LeadJobStatus};

/// A rendered export: CSV bytes plus the attachment filename.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

const HEADER: &[&str] = &["City", "Business Name", "Website", "Email", "Category"];

/// Render a job's results as CSV, optionally filtered to one city.
///
/// Ownership and existence failures collapse into `NotFound` so callers
/// cannot probe which job ids exist. `today` is injected so tests control
/// the filename date.
pub fn export_job(
    job: &LeadJob,
    caller_user_id: &str,
    city_filter: Option<&str>,
    today: NaiveDate,
) -> Result<CsvExport, LeadError> {
    if job.user_id != caller_user_id {
        return Err(LeadError::NotFound);
    }
    if job.status != LeadJobStatus::Completed {
        return Err(LeadError::NotReady);
    }

    let filter = city_filter.map(sanitize_city_filter).filter(|f| !f.is_empty());

    let rows: Vec<&Lead> = match &filter {
        Some(city) => {
            let needle = city.to_lowercase();
            job.results
                .0
                .iter()
                .filter(|lead| lead.city.to_lowercase().contains(&needle))
                .collect()
        }
        None => job.results.0.iter().collect(),
    };

    let mut body = String::new();
    body.push_str(&csv_row(HEADER.iter().copied()));
    for lead in rows {
        body.push_str(&csv_row(
            [
                lead.city.as_str(),
                lead.business_name.as_str(),
                lead.website.as_str(),
                lead.email.as_str(),
                lead.category.as_str(),
            ]
            .into_iter(),
        ));
    }

    let date = today.format("%Y-%m-%d");
    let filename = match &filter {
        Some(city) => format!("{}_leads_{}.csv", slug(city), date),
        None => format!("all_cities_leads_{}.csv", date),
    };

    Ok(CsvExport { filename, body })
}

/// Strip the filter down to letters, spaces, and hyphens.
fn sanitize_city_filter(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphabetic() || *c == ' ' || *c == '-')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Lowercase, whitespace collapsed to single hyphens.
fn slug(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// One CSV record: every field double-quoted, embedded quotes doubled.
fn csv_row<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut row = fields
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}
