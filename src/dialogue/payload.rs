//! Button payloads.
//!
//! Quick replies and postback buttons carry an opaque string back to the
//! webhook. Every payload the bot's menus and cards offer parses to one of the
//! known variants; anything else is kept verbatim in [`Payload::Unknown`] so
//! the controller can report it.

use super::draft::{AmountBucket, HeightBucket};
use super::species::Species;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Amount(AmountBucket),
    AmountExact,
    Species(Species),
    SpeciesUnknown,
    Height(HeightBucket),
    HeightExact,
    /// Abandon the report in progress.
    CancelReport,
    Unknown(String),
}

impl Payload {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Amount_Of_Birds_Low" => Payload::Amount(AmountBucket::Low),
            "Amount_Of_Birds_Middle" => Payload::Amount(AmountBucket::Middle),
            "Amount_Of_Birds_High" => Payload::Amount(AmountBucket::High),
            "Amount_Of_Birds_Exact" => Payload::AmountExact,
            "Bird_Picture_Unknown" => Payload::SpeciesUnknown,
            "HEIGHT_LOW" => Payload::Height(HeightBucket::Low),
            "HEIGHT_MIDDLE" => Payload::Height(HeightBucket::Middle),
            "HEIGHT_HIGH" => Payload::Height(HeightBucket::High),
            "HEIGHT_UNKNOWN" => Payload::Height(HeightBucket::Unknown),
            "HEIGHT_EXACT" => Payload::HeightExact,
            "CANCEL_REPORT" => Payload::CancelReport,
            other => match Species::from_payload(other) {
                Some(species) => Payload::Species(species),
                None => Payload::Unknown(other.to_string()),
            },
        }
    }

    /// Wire form of the payload, the inverse of [`Payload::parse`].
    pub fn as_str(&self) -> &str {
        match self {
            Payload::Amount(AmountBucket::Low) => "Amount_Of_Birds_Low",
            Payload::Amount(AmountBucket::Middle) => "Amount_Of_Birds_Middle",
            Payload::Amount(AmountBucket::High) => "Amount_Of_Birds_High",
            Payload::AmountExact => "Amount_Of_Birds_Exact",
            Payload::Species(species) => species.info().payload,
            Payload::SpeciesUnknown => "Bird_Picture_Unknown",
            Payload::Height(HeightBucket::Low) => "HEIGHT_LOW",
            Payload::Height(HeightBucket::Middle) => "HEIGHT_MIDDLE",
            Payload::Height(HeightBucket::High) => "HEIGHT_HIGH",
            Payload::Height(HeightBucket::Unknown) => "HEIGHT_UNKNOWN",
            Payload::HeightExact => "HEIGHT_EXACT",
            Payload::CancelReport => "CANCEL_REPORT",
            Payload::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
