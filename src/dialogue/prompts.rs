//! Prompt renderer.
//!
//! Pure functions from dialogue state to the messages the bot sends. The
//! output is transport neutral; `messenger::send` turns it into Send API
//! requests.

use super::draft::{AmountBucket, HeightBucket};
use super::finalizer::Report;
use super::payload::Payload;
use super::species::{self, Species};
use super::state::{DialogueState, Session};

/// Messenger shows at most this many quick replies on one message.
pub const MAX_QUICK_REPLIES: usize = 13;

const ASK_LOCATION: &str = "קודם כל, בחר את מיקומך";
const LOCATION_BUTTON: &str = "מיקום";
const ASK_AMOUNT: &str = "קיבלתי את מיקומך, בוא נדבר קצת על הציפורים שראית, אתה יכול להגיד לי כמה ציפורים ראית? תרגיש חופשי לבחור אחת מהאופציות או לבחור מספר מדויק";
const ASK_EXACT_AMOUNT: &str = "כמה ציפורים בדיוק? כתוב מספר";
const ASK_SPECIES: &str = "אחלה, יש סיכוי ששמת לב לסוג הציפור?";
const ASK_HEIGHT: &str = "שאלה אחרונה, אני מבטיח. מה היה הגובה בו הציפורים עפו?";
const ASK_EXACT_HEIGHT: &str = "מה היה הגובה במטרים? כתוב מספר";
const READ_MORE: &str = "קרא עוד";
const CANCEL_REPORT: &str = "בטל דיווח";
const THANKS: &str = "הדיווח שלך עזר לחיל האוויר לשמור על שמיים בטוחים. בא לך לספר לחבריך על הציפורים שראית?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub payload: Payload,
}

impl Choice {
    fn new(label: impl Into<String>, payload: Payload) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }
}

/// One card of a carousel: picture, "read more" link and a pick button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub link_url: String,
    pub link_title: String,
    pub button_title: String,
    pub payload: Payload,
}

/// Card with a share button, sent when a report is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareCard {
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    TypingOn,
    Text(String),
    Menu { text: String, choices: Vec<Choice> },
    /// Location picker, followed by any extra quick replies.
    LocationRequest {
        text: String,
        button: String,
        choices: Vec<Choice>,
    },
    Carousel(Vec<Card>),
    Share(ShareCard),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    /// Choices offered by a menu reply.
    pub fn choices(&self) -> &[Choice] {
        match self {
            Reply::Menu { choices, .. } | Reply::LocationRequest { choices, .. } => choices,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptRenderer {
    assets_url: String,
    trigger_word: String,
    cancel_word: String,
}

impl PromptRenderer {
    /// `server_url` is the public base URL that serves `/assets/*`.
    pub fn new(
        server_url: &str,
        trigger_word: impl Into<String>,
        cancel_word: impl Into<String>,
    ) -> Self {
        Self {
            assets_url: format!("{}/assets", server_url.trim_end_matches('/')),
            trigger_word: trigger_word.into(),
            cancel_word: cancel_word.into(),
        }
    }

    pub fn asset_url(&self, file: &str) -> String {
        format!("{}/{}", self.assets_url, file)
    }

    /// The question for the given state.
    pub fn question(&self, session: &Session) -> Vec<Reply> {
        match session.state {
            DialogueState::AwaitingLocation => vec![
                Reply::TypingOn,
                Reply::LocationRequest {
                    text: ASK_LOCATION.to_string(),
                    button: LOCATION_BUTTON.to_string(),
                    choices: vec![cancel_report()],
                },
            ],
            DialogueState::AwaitingAmount => vec![Reply::TypingOn, amount_menu()],
            DialogueState::AwaitingAmountExact => vec![Reply::text(ASK_EXACT_AMOUNT)],
            DialogueState::AwaitingSpecies { menu } => self.species_prompt(menu),
            DialogueState::AwaitingHeight => vec![Reply::TypingOn, height_menu()],
            DialogueState::AwaitingHeightExact => vec![Reply::text(ASK_EXACT_HEIGHT)],
        }
    }

    fn species_prompt(&self, bucket: AmountBucket) -> Vec<Reply> {
        let species = species::menu(bucket);

        let cards = species
            .iter()
            .map(|s| {
                let info = s.info();
                Card {
                    title: info.title.to_string(),
                    subtitle: String::new(),
                    image_url: self.asset_url(info.asset),
                    link_url: info.info_url.to_string(),
                    link_title: READ_MORE.to_string(),
                    button_title: info.title.to_string(),
                    payload: Payload::Species(*s),
                }
            })
            .collect();

        // Quick replies vanish once another message follows, so the menu goes last.
        let mut choices: Vec<Choice> = species
            .iter()
            .map(|s| Choice::new(s.info().title, Payload::Species(*s)))
            .collect();
        choices.push(Choice::new("לא יודע", Payload::SpeciesUnknown));
        choices.push(cancel_report());

        vec![
            Reply::TypingOn,
            Reply::Carousel(cards),
            Reply::Menu {
                text: ASK_SPECIES.to_string(),
                choices,
            },
        ]
    }

    pub fn help(&self) -> Vec<Reply> {
        vec![Reply::Text(format!(
            "אני משער שראית כמה ציפורים ולא פנית אליי סתם, אם כן כתוב: {}",
            self.trigger_word
        ))]
    }

    pub fn not_a_number(&self) -> Vec<Reply> {
        vec![Reply::Text(format!(
            "הכנס מספר או הקלד '{}'",
            self.cancel_word
        ))]
    }

    pub fn unknown_payload(&self, raw: &str) -> Vec<Reply> {
        vec![Reply::Text(format!("error text:{}", raw))]
    }

    pub fn cancelled(&self) -> Vec<Reply> {
        vec![Reply::Text(format!(
            "הדיווח בוטל. כדי להתחיל מחדש כתוב: {}",
            self.trigger_word
        ))]
    }

    pub fn completion(&self, report: &Report) -> Vec<Reply> {
        vec![Reply::Share(ShareCard {
            title: THANKS.to_string(),
            subtitle: report.description.clone(),
            image_url: self.asset_url("Logo.png"),
        })]
    }

    pub fn something_went_wrong(&self) -> Vec<Reply> {
        vec![Reply::Text(format!(
            "משהו השתבש בדיווח. נסה שוב: {}",
            self.trigger_word
        ))]
    }
}

fn amount_menu() -> Reply {
    Reply::Menu {
        text: ASK_AMOUNT.to_string(),
        choices: vec![
            Choice::new("0-500", Payload::Amount(AmountBucket::Low)),
            Choice::new("500-4000", Payload::Amount(AmountBucket::Middle)),
            Choice::new("4000 ומעלה", Payload::Amount(AmountBucket::High)),
            Choice::new("מספר מדויק", Payload::AmountExact),
            cancel_report(),
        ],
    }
}

fn height_menu() -> Reply {
    Reply::Menu {
        text: ASK_HEIGHT.to_string(),
        choices: vec![
            Choice::new("0-450 מטרים", Payload::Height(HeightBucket::Low)),
            Choice::new("450-1000 מטרים", Payload::Height(HeightBucket::Middle)),
            Choice::new("1000 ומעלה", Payload::Height(HeightBucket::High)),
            Choice::new("לא ידוע", Payload::Height(HeightBucket::Unknown)),
            Choice::new("גובה מדויק", Payload::HeightExact),
            cancel_report(),
        ],
    }
}

fn cancel_report() -> Choice {
    Choice::new(CANCEL_REPORT, Payload::CancelReport)
}

/// Species offered by a rendered species prompt, in order.
pub fn offered_species(replies: &[Reply]) -> Vec<Species> {
    replies
        .iter()
        .flat_map(|reply| reply.choices())
        .filter_map(|choice| match choice.payload {
            Payload::Species(species) => Some(species),
            _ => None,
        })
        .collect()
}
