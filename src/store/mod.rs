//! Report store.
//!
//! Finished reports are handed to a [`ReportStore`]. Production uses the
//! reports service over HTTP ([`HttpReportStore`]); without a configured URL
//! the bot keeps reports in memory ([`MemoryReportStore`]).

mod http;
mod memory;

pub use http::HttpReportStore;
pub use memory::MemoryReportStore;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::dialogue::finalizer::{Report, ReportValue};
use crate::error::Result;

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist one report.
    async fn submit(&self, report: &Report) -> Result<()>;

    /// Every report stored so far.
    async fn list(&self) -> Result<Vec<StoredReport>>;
}

/// Report as the reports service returns it.
///
/// Older records were written with empty strings for missing values, so
/// every field is optional on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredReport {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reporter_name: String,
    pub location: StoredLocation,
    pub bird_type: String,
    pub amount: ReportValue,
    pub height: ReportValue,
    pub flock_id: String,
    pub area_name: String,
    pub credibility: String,
    pub image: String,
    pub time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredLocation {
    #[serde(deserialize_with = "lenient_coordinate")]
    pub lan: Option<f64>,
    #[serde(deserialize_with = "lenient_coordinate")]
    pub long: Option<f64>,
}

impl StoredReport {
    pub fn from_report(report: &Report, id: Option<String>) -> Self {
        Self {
            id,
            reporter_name: report.reporter_name.clone(),
            location: StoredLocation {
                lan: Some(report.latitude),
                long: Some(report.longitude),
            },
            bird_type: report.bird_type.clone(),
            amount: report.amount.clone(),
            height: report.height.clone(),
            flock_id: report.flock_id.clone(),
            area_name: report.area_name.clone(),
            credibility: report.credibility.clone(),
            image: report.image_ref.clone(),
            time: report.submitted_at,
        }
    }
}

/// Accepts a number, a numeric string, an empty string or null.
fn lenient_coordinate<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Number of reports per flock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlockCount {
    pub flock_id: String,
    pub count: usize,
}

/// Reports grouped by flock id, ordered by id.
pub fn flock_counts(reports: &[StoredReport]) -> Vec<FlockCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for report in reports {
        *counts.entry(report.flock_id.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(flock_id, count)| FlockCount {
            flock_id: flock_id.to_string(),
            count,
        })
        .collect()
}
