//! Species catalog.
//!
//! Every species the bot can offer, with the name stored in reports, the
//! plural noun used in descriptions, the button payload, the card image and
//! the Israeli birding site page linked from the card. Most species belong to
//! exactly one amount bucket's menu. The rest have no menu but are still
//! accepted from their own card buttons.

use serde::{Deserialize, Serialize};

use super::draft::AmountBucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Zarzir,
    Hogla,
    Kata,
    Dia,
    Akev,
    Shahaf,
    Saknai,
    Hasida,
    Agur,
    Orev,
    Ieat,
    Kormoran,
}

/// Static description of one species.
#[derive(Debug)]
pub struct SpeciesInfo {
    pub species: Species,
    /// Name stored in the report's `birdType`.
    pub name: &'static str,
    /// Card title.
    pub title: &'static str,
    /// Plural noun used in the report description.
    pub plural: &'static str,
    pub payload: &'static str,
    /// File name under `/assets/`.
    pub asset: &'static str,
    pub info_url: &'static str,
    /// Menu the species is offered in, if any.
    pub bucket: Option<AmountBucket>,
}

/// Indexed by `Species` discriminant.
static CATALOG: [SpeciesInfo; 12] = [
    SpeciesInfo {
        species: Species::Zarzir,
        name: "זרזיר",
        title: "זרזיר",
        plural: "זרזירים",
        payload: "Bird_Picture_Zarzir",
        asset: "zarzir.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=431",
        bucket: Some(AmountBucket::Low),
    },
    SpeciesInfo {
        species: Species::Hogla,
        name: "חוגלה",
        title: "חוגלה",
        plural: "חוגלות",
        payload: "Bird_Picture_Hogla",
        asset: "hogla.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=2",
        bucket: Some(AmountBucket::Low),
    },
    SpeciesInfo {
        species: Species::Kata,
        name: "קטה",
        title: "קטה",
        plural: "קטות",
        payload: "Bird_Picture_Kata",
        asset: "kata.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=273",
        bucket: Some(AmountBucket::Low),
    },
    SpeciesInfo {
        species: Species::Dia,
        name: "דיה",
        title: "דיה",
        plural: "דיות",
        payload: "Bird_Picture_Dia",
        asset: "dia.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=120",
        bucket: Some(AmountBucket::Middle),
    },
    SpeciesInfo {
        species: Species::Akev,
        name: "עקב",
        title: "עקב חורף",
        plural: "עקבים",
        payload: "Bird_Picture_Akev",
        asset: "akev.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=138",
        bucket: Some(AmountBucket::Middle),
    },
    SpeciesInfo {
        species: Species::Shahaf,
        name: "שחף",
        title: "שחף",
        plural: "שחפים",
        payload: "Bird_Picture_Shahaf",
        asset: "shahaf.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=244",
        bucket: Some(AmountBucket::Middle),
    },
    SpeciesInfo {
        species: Species::Saknai,
        name: "שקנאי",
        title: "שקנאי",
        plural: "שקנאים",
        payload: "Bird_Picture_Saknai",
        asset: "saknai.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=95",
        bucket: Some(AmountBucket::High),
    },
    SpeciesInfo {
        species: Species::Hasida,
        name: "חסידה",
        title: "חסידה",
        plural: "חסידות",
        payload: "Bird_Picture_Hasida",
        asset: "hasida.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=72",
        bucket: Some(AmountBucket::High),
    },
    SpeciesInfo {
        species: Species::Agur,
        name: "עגור",
        title: "עגור",
        plural: "עגורים",
        payload: "Bird_Picture_Agur",
        asset: "agur.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=162",
        bucket: Some(AmountBucket::High),
    },
    SpeciesInfo {
        species: Species::Orev,
        name: "עורב",
        title: "עורב",
        plural: "עורבים",
        payload: "Bird_Picture_Orev",
        asset: "orev.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=339",
        bucket: None,
    },
    SpeciesInfo {
        species: Species::Ieat,
        name: "עיט",
        title: "עיט",
        plural: "עיטים",
        payload: "Bird_Picture_Ieat",
        asset: "Ieat.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=146",
        bucket: None,
    },
    SpeciesInfo {
        species: Species::Kormoran,
        name: "קורמורן",
        title: "קורמורן",
        plural: "קורמורנים",
        payload: "Bird_Picture_Kormoran",
        asset: "kormoran.jpg",
        info_url: "http://www.birds.org.il/he/species-page.aspx?speciesId=102",
        bucket: None,
    },
];

impl Species {
    pub fn info(self) -> &'static SpeciesInfo {
        &CATALOG[self as usize]
    }

    pub fn from_payload(payload: &str) -> Option<Species> {
        CATALOG
            .iter()
            .find(|info| info.payload == payload)
            .map(|info| info.species)
    }

    pub fn all() -> impl Iterator<Item = &'static SpeciesInfo> {
        CATALOG.iter()
    }

    /// Whether a pick of this species is valid while `bucket`'s menu is open.
    pub fn accepted_in(self, bucket: AmountBucket) -> bool {
        self.info().bucket.map_or(true, |own| own == bucket)
    }
}

/// Species offered for the given amount bucket, in menu order.
pub fn menu(bucket: AmountBucket) -> Vec<Species> {
    CATALOG
        .iter()
        .filter(|info| info.bucket == Some(bucket))
        .map(|info| info.species)
        .collect()
}
