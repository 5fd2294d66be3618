// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, Utc};

/// Two items presented side by side. `first` always precedes `second` in the
/// entered item list.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Pair {
    pub first: String,
    pub second: String,
}

impl Pair {
    pub fn new(first: &str, second: &str) -> Pair {
        Pair {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.first == item || self.second == item
    }
}

/// The screen a session is currently on.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Page {
    /// Collecting the items (and the email, if requested).
    Entry,
    /// Going through the pairs one at a time.
    Survey,
    /// The final tally is available.
    Results,
}

impl Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Page::Entry => "entry",
            Page::Survey => "survey",
            Page::Results => "results",
        };
        write!(f, "{}", s)
    }
}

// ******** Output data structures *********

/// What happened after an answer was accepted.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnswerOutcome {
    /// More pairs remain.
    Next,
    /// That was the last pair. The row was handed to the sink with the given outcome.
    Completed(PersistOutcome),
}

/// The result of writing the completed survey to the sink.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PersistOutcome {
    Saved,
    Failed { reason: String },
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistOutcome::Saved)
    }
}

/// Recoverable problems with the user input.
///
/// None of them changes the session: the same screen is shown again with
/// the warning.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyWarning {
    /// The rules ask for fewer items than a single pair needs.
    TooFewItems { item_count: usize },
    /// Fewer (or more) non-empty items than required.
    NotEnoughItems { expected: usize, found: usize },
    /// An email is required and the given one does not look like an address.
    InvalidEmail(String),
    /// The entry form has fewer slots than this.
    SlotOutOfRange { slot: usize, item_count: usize },
    /// An answer was submitted without selecting an item.
    NoSelection,
    /// The selected item is not part of the current pair.
    NotInPair(String),
    /// The operation is not available on the current page.
    WrongPage { expected: Page, actual: Page },
}

impl Error for SurveyWarning {}

impl Display for SurveyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyWarning::TooFewItems { item_count } => write!(
                f,
                "A pairwise survey needs at least {} items, the rules ask for {}",
                SurveyRules::MIN_ITEM_COUNT,
                item_count
            ),
            SurveyWarning::NotEnoughItems { expected, found } => write!(
                f,
                "Fill in all {} items ({} non-empty item(s) found)",
                expected, found
            ),
            SurveyWarning::InvalidEmail(email) => {
                write!(f, "Enter a valid email address (got {:?})", email)
            }
            SurveyWarning::SlotOutOfRange { slot, item_count } => write!(
                f,
                "Item slot {} does not exist, the form has {} slots",
                slot, item_count
            ),
            SurveyWarning::NoSelection => write!(f, "Pick one of the two options, then continue"),
            SurveyWarning::NotInPair(choice) => {
                write!(f, "{:?} is not one of the two options", choice)
            }
            SurveyWarning::WrongPage { expected, actual } => write!(
                f,
                "This action needs the {} page, the survey is on the {} page",
                expected, actual
            ),
        }
    }
}

/// A failure reported by a response sink.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SinkError {
    pub reason: String,
}

impl SinkError {
    pub fn new(reason: impl Into<String>) -> SinkError {
        SinkError {
            reason: reason.into(),
        }
    }
}

impl Error for SinkError {}

impl Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not save the response: {}", self.reason)
    }
}

// ********* Configuration **********

/// How the tally is written in the item columns of a response row.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TallyEncoding {
    /// `"<item>, <count>"` in each item column.
    Labelled,
    /// The bare count in each item column, in item order. The row does not
    /// say which item a count belongs to.
    RawCounts,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyRules {
    /// Number of items to enter. The survey asks `n * (n - 1) / 2` questions.
    pub item_count: usize,
    /// When set, an email address is required on the entry page and stored
    /// with the response.
    pub collect_email: bool,
    pub tally_encoding: TallyEncoding,
}

impl SurveyRules {
    pub const DEFAULT_RULES: SurveyRules = SurveyRules {
        item_count: 5,
        collect_email: false,
        tally_encoding: TallyEncoding::Labelled,
    };

    /// One pair at least.
    pub const MIN_ITEM_COUNT: usize = 2;

    pub fn pair_count(&self) -> usize {
        self.item_count * self.item_count.saturating_sub(1) / 2
    }
}

impl Default for SurveyRules {
    fn default() -> Self {
        SurveyRules::DEFAULT_RULES
    }
}

/// One completed survey, as written to the store.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponseRow {
    pub timestamp: DateTime<Utc>,
    pub email: Option<String>,
    /// In item order.
    pub tally: Vec<(String, u64)>,
}

// Second precision, no offset suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl ResponseRow {
    /// The header row of the store for these rules.
    pub fn header(rules: &SurveyRules) -> Vec<String> {
        let mut res = vec!["timestamp".to_string()];
        if rules.collect_email {
            res.push("email".to_string());
        }
        for idx in 0..rules.item_count {
            res.push(format!("item_{}", idx + 1));
        }
        res
    }

    pub fn timestamp_str(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// The cells of this row, aligned with `ResponseRow::header`.
    ///
    /// When duplicated items collapsed into a single tally entry, the
    /// remaining item columns are left empty.
    pub fn cells(&self, rules: &SurveyRules) -> Vec<String> {
        let mut res = vec![self.timestamp_str()];
        if rules.collect_email {
            res.push(self.email.clone().unwrap_or_default());
        }
        for idx in 0..rules.item_count {
            let cell = match (self.tally.get(idx), rules.tally_encoding) {
                (Some((item, count)), TallyEncoding::Labelled) => format!("{}, {}", item, count),
                (Some((_, count)), TallyEncoding::RawCounts) => count.to_string(),
                (None, _) => "".to_string(),
            };
            res.push(cell);
        }
        res
    }
}

/// An append-only destination for completed surveys.
///
/// Implementations are expected to create their storage (and header row)
/// on first use.
pub trait ResponseSink {
    fn append_row(&mut self, row: &ResponseRow) -> Result<(), SinkError>;
}
