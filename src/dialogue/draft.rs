//! Report draft and the values a user can give for each field.
//!
//! A [`Draft`] is filled in step by step while the conversation runs. Once the
//! controller reaches the terminal state it is converted into a
//! [`CompletedDraft`], whose fields are no longer optional, so the finalizer
//! never sees a report with missing coordinates, amount or height.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::species::Species;

/// Label used for unknown species and unknown height.
pub const UNKNOWN_LABEL: &str = "לא ידוע";

/// Coarse flock size ranges offered in the amount menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountBucket {
    Low,
    Middle,
    High,
}

impl AmountBucket {
    pub const ALL: [AmountBucket; 3] = [AmountBucket::Low, AmountBucket::Middle, AmountBucket::High];

    pub fn label(self) -> &'static str {
        match self {
            AmountBucket::Low => "0-500",
            AmountBucket::Middle => "500-4000",
            AmountBucket::High => "4000+",
        }
    }

    /// Bucket an exact count falls into.
    pub fn for_count(count: u32) -> Self {
        match count {
            0..=499 => AmountBucket::Low,
            500..=3999 => AmountBucket::Middle,
            _ => AmountBucket::High,
        }
    }
}

/// Coarse flight height ranges offered in the height menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightBucket {
    Low,
    Middle,
    High,
    Unknown,
}

impl HeightBucket {
    pub const ALL: [HeightBucket; 4] = [
        HeightBucket::Low,
        HeightBucket::Middle,
        HeightBucket::High,
        HeightBucket::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HeightBucket::Low => "0-450",
            HeightBucket::Middle => "450-1000",
            HeightBucket::High => "1000+",
            HeightBucket::Unknown => UNKNOWN_LABEL,
        }
    }
}

/// Flock size: either a menu bucket or an exact number typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    Bucket(AmountBucket),
    Exact(u32),
}

impl Amount {
    /// The bucket whose species menu applies to this amount.
    pub fn bucket(self) -> AmountBucket {
        match self {
            Amount::Bucket(bucket) => bucket,
            Amount::Exact(count) => AmountBucket::for_count(count),
        }
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Amount::Bucket(bucket) => f.write_str(bucket.label()),
            Amount::Exact(count) => write!(f, "{}", count),
        }
    }
}

/// Flight height in meters: a menu bucket or an exact number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Height {
    Bucket(HeightBucket),
    Exact(u32),
}

impl std::fmt::Display for Height {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Height::Bucket(bucket) => f.write_str(bucket.label()),
            Height::Exact(meters) => write!(f, "{}", meters),
        }
    }
}

/// Species answer. `Unknown` is a valid, deliberate choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirdType {
    Known(Species),
    Unknown,
}

impl BirdType {
    /// Name stored in the report record.
    pub fn name(self) -> &'static str {
        match self {
            BirdType::Known(species) => species.info().name,
            BirdType::Unknown => UNKNOWN_LABEL,
        }
    }
}

/// In-progress report for one user's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub reporter_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bird_type: Option<BirdType>,
    pub amount: Option<Amount>,
    pub height: Option<Height>,
}

/// Required field still missing when the draft was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("draft is missing required field `{0}`")]
pub struct IncompleteDraft(pub &'static str);

impl Draft {
    pub fn new(reporter_id: impl Into<String>) -> Self {
        Self {
            reporter_id: reporter_id.into(),
            latitude: None,
            longitude: None,
            bird_type: None,
            amount: None,
            height: None,
        }
    }

    /// Fresh draft that starts from a shared location.
    pub fn at_location(reporter_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::new(reporter_id)
        }
    }

    /// Convert into a [`CompletedDraft`], failing on the first missing field.
    pub fn complete(self) -> Result<CompletedDraft, IncompleteDraft> {
        Ok(CompletedDraft {
            latitude: self.latitude.ok_or(IncompleteDraft("latitude"))?,
            longitude: self.longitude.ok_or(IncompleteDraft("longitude"))?,
            amount: self.amount.ok_or(IncompleteDraft("amount"))?,
            height: self.height.ok_or(IncompleteDraft("height"))?,
            bird_type: self.bird_type.unwrap_or(BirdType::Unknown),
            reporter_id: self.reporter_id,
        })
    }
}

/// A draft with every required field present.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDraft {
    pub reporter_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bird_type: BirdType,
    pub amount: Amount,
    pub height: Height,
}
