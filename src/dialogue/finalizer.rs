//! Report finalizer.
//!
//! Turns a completed draft into the immutable record handed to the report
//! store. Field names of [`Report`] are the store's wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::{Amount, BirdType, CompletedDraft, Height};

/// Picture used when the species is unknown.
pub const DEFAULT_IMAGE_URL: &str =
    "http://www.agamon-hula.co.il/files/images/gallery2/gallery_015.gallery.jpg";

/// Amount or height as stored: a bucket label or an exact number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Count(u32),
    Label(String),
}

impl Default for ReportValue {
    fn default() -> Self {
        ReportValue::Label(String::new())
    }
}

impl From<Amount> for ReportValue {
    fn from(amount: Amount) -> Self {
        match amount {
            Amount::Bucket(bucket) => ReportValue::Label(bucket.label().to_string()),
            Amount::Exact(count) => ReportValue::Count(count),
        }
    }
}

impl From<Height> for ReportValue {
    fn from(height: Height) -> Self {
        match height {
            Height::Bucket(bucket) => ReportValue::Label(bucket.label().to_string()),
            Height::Exact(meters) => ReportValue::Count(meters),
        }
    }
}

impl std::fmt::Display for ReportValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportValue::Count(n) => write!(f, "{}", n),
            ReportValue::Label(label) => f.write_str(label),
        }
    }
}

/// A finished sighting report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub reporter_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bird_type: String,
    pub amount: ReportValue,
    pub height: ReportValue,
    pub flock_id: String,
    pub area_name: String,
    pub credibility: String,
    /// Unix milliseconds.
    #[serde(rename = "time")]
    pub submitted_at: i64,
    pub description: String,
    #[serde(rename = "image")]
    pub image_ref: String,
}

#[derive(Debug, Clone)]
pub struct ReportFinalizer {
    reporter_name: String,
    flock_id: String,
    assets_url: String,
}

impl ReportFinalizer {
    pub fn new(
        reporter_name: impl Into<String>,
        flock_id: impl Into<String>,
        server_url: &str,
    ) -> Self {
        Self {
            reporter_name: reporter_name.into(),
            flock_id: flock_id.into(),
            assets_url: format!("{}/assets", server_url.trim_end_matches('/')),
        }
    }

    pub fn finalize(&self, draft: CompletedDraft, submitted_at: DateTime<Utc>) -> Report {
        let description = describe(&draft);
        let image_ref = match draft.bird_type {
            BirdType::Known(species) => format!("{}/{}", self.assets_url, species.info().asset),
            BirdType::Unknown => DEFAULT_IMAGE_URL.to_string(),
        };

        Report {
            reporter_name: self.reporter_name.clone(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            bird_type: draft.bird_type.name().to_string(),
            amount: draft.amount.into(),
            height: draft.height.into(),
            flock_id: self.flock_id.clone(),
            area_name: String::new(),
            credibility: String::new(),
            submitted_at: submitted_at.timestamp_millis(),
            description,
            image_ref,
        }
    }
}

/// Human readable summary shown on the share card.
pub fn describe(draft: &CompletedDraft) -> String {
    let noun = match draft.bird_type {
        BirdType::Known(species) => species.info().plural,
        BirdType::Unknown => "מסוג לא ידוע",
    };
    format!(
        "נצפתה להקה עם {} {} בגובה {} במיקום {},{} (lat,lon)",
        draft.amount, noun, draft.height, draft.latitude, draft.longitude
    )
}
