mod config;
pub mod builder;
pub mod manual;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use std::collections::HashSet;

use crate::builder::EntryForm;
pub use crate::config::*;

/// All the unordered pairs of items.
///
/// The order is combinatorial: the first item is paired with every item after
/// it, then the second item with every item after it, and so on. Five items
/// give ten pairs.
pub fn generate_pairs(items: &[String]) -> Vec<Pair> {
    let mut res: Vec<Pair> = Vec::new();
    for (idx, first) in items.iter().enumerate() {
        for second in items[idx + 1..].iter() {
            res.push(Pair::new(first, second));
        }
    }
    res
}

/// Number of wins per item, in item order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Tally {
    counts: Vec<(String, u64)>,
}

impl Tally {
    /// A zero count for every item. Duplicated items share one entry.
    pub fn zeroed(items: &[String]) -> Tally {
        let mut counts: Vec<(String, u64)> = Vec::new();
        for item in items {
            if !counts.iter().any(|(name, _)| name == item) {
                counts.push((item.clone(), 0));
            }
        }
        Tally { counts }
    }

    /// Adds one win. Returns false if the item is unknown.
    pub fn increment(&mut self, item: &str) -> bool {
        match self.counts.iter_mut().find(|(name, _)| name == item) {
            Some((_, count)) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, item: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, u64)] {
        &self.counts
    }

    /// Highest count first. Ties keep the item order.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut res = self.counts.clone();
        res.sort_by(|a, b| b.1.cmp(&a.1));
        res
    }
}

/// The state of one survey, from the entry page to the results.
///
/// ```
/// use pairwise_survey::*;
/// use pairwise_survey::builder::EntryForm;
///
/// let items: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
/// let form = EntryForm::new(&SurveyRules::DEFAULT_RULES).items(&items)?;
/// let mut sink = MemorySink::default();
/// let mut survey = Survey::new(&SurveyRules::DEFAULT_RULES);
/// survey.start(&form)?;
/// while let Some(pair) = survey.current_pair().cloned() {
///     survey.record_answer(Some(&pair.first), &mut sink)?;
/// }
/// assert_eq!(survey.page(), Page::Results);
/// assert_eq!(survey.tally().get("A"), Some(4));
/// # Ok::<(), SurveyWarning>(())
/// ```
#[derive(Debug, Clone)]
pub struct Survey {
    rules: SurveyRules,
    page: Page,
    items: Vec<String>,
    pairs: Vec<Pair>,
    idx: usize,
    tally: Tally,
    email: Option<String>,
    persist_outcome: Option<PersistOutcome>,
}

impl Survey {
    pub fn new(rules: &SurveyRules) -> Survey {
        Survey {
            rules: rules.clone(),
            page: Page::Entry,
            items: Vec::new(),
            pairs: Vec::new(),
            idx: 0,
            tally: Tally::default(),
            email: None,
            persist_outcome: None,
        }
    }

    pub fn rules(&self) -> &SurveyRules {
        &self.rules
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Set once the last answer has been recorded.
    pub fn persist_outcome(&self) -> Option<&PersistOutcome> {
        self.persist_outcome.as_ref()
    }

    /// (answered, total) pairs.
    pub fn progress(&self) -> (usize, usize) {
        (self.idx, self.pairs.len())
    }

    pub fn current_pair(&self) -> Option<&Pair> {
        if self.page != Page::Survey {
            return None;
        }
        self.pairs.get(self.idx)
    }

    fn check_page(&self, expected: Page) -> Result<(), SurveyWarning> {
        if self.page != expected {
            return Err(SurveyWarning::WrongPage {
                expected,
                actual: self.page,
            });
        }
        Ok(())
    }

    /// Moves from the entry page to the first question.
    ///
    /// All the validation happens before the session is touched: on a warning
    /// the session is unchanged.
    pub fn start(&mut self, form: &EntryForm) -> Result<(), SurveyWarning> {
        self.check_page(Page::Entry)?;
        let items = form.validated_items()?;
        let email = form.validated_email()?;

        let distinct: HashSet<&String> = items.iter().collect();
        if distinct.len() != items.len() {
            warn!(
                "start: duplicated items {:?}, their wins are counted together",
                items
            );
        }

        self.pairs = generate_pairs(&items);
        self.tally = Tally::zeroed(&items);
        self.items = items;
        self.email = email;
        self.idx = 0;
        self.persist_outcome = None;
        self.page = Page::Survey;
        info!(
            "start: {} items, {} pairs: {:?}",
            self.items.len(),
            self.pairs.len(),
            self.items
        );
        Ok(())
    }

    /// Records the preferred item of the current pair.
    ///
    /// After the last pair, the row is written to the sink exactly once and the
    /// session moves to the results page, whatever the sink returns.
    pub fn record_answer(
        &mut self,
        choice: Option<&str>,
        sink: &mut dyn ResponseSink,
    ) -> Result<AnswerOutcome, SurveyWarning> {
        self.record_answer_at(choice, sink, Utc::now())
    }

    pub fn record_answer_at(
        &mut self,
        choice: Option<&str>,
        sink: &mut dyn ResponseSink,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SurveyWarning> {
        self.check_page(Page::Survey)?;
        let choice = choice.ok_or(SurveyWarning::NoSelection)?;
        let pair = match self.pairs.get(self.idx) {
            Some(p) if p.contains(choice) => p,
            _ => return Err(SurveyWarning::NotInPair(choice.to_string())),
        };
        debug!(
            "record_answer: idx: {} pair: {:?} choice: {:?}",
            self.idx, pair, choice
        );

        self.tally.increment(choice);
        self.idx += 1;

        if self.idx >= self.pairs.len() {
            Ok(self.complete(sink, now))
        } else {
            Ok(AnswerOutcome::Next)
        }
    }

    fn complete(&mut self, sink: &mut dyn ResponseSink, now: DateTime<Utc>) -> AnswerOutcome {
        let row = ResponseRow {
            timestamp: now,
            email: self.email.clone(),
            tally: self.tally.as_slice().to_vec(),
        };
        let outcome = match sink.append_row(&row) {
            Ok(()) => {
                info!("complete: response saved: {:?}", row);
                PersistOutcome::Saved
            }
            Err(e) => {
                warn!("complete: response not saved: {}", e);
                PersistOutcome::Failed { reason: e.reason }
            }
        };
        self.persist_outcome = Some(outcome.clone());
        self.page = Page::Results;
        AnswerOutcome::Completed(outcome)
    }

    /// Discards everything and goes back to an empty entry page.
    pub fn reset(&mut self) {
        debug!("reset: leaving page {}", self.page);
        *self = Survey::new(&self.rules);
    }
}

/// Keeps the rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub rows: Vec<ResponseRow>,
    /// When set, every write fails with this reason.
    pub failure: Option<String>,
}

impl MemorySink {
    pub fn failing(reason: &str) -> MemorySink {
        MemorySink {
            rows: Vec::new(),
            failure: Some(reason.to_string()),
        }
    }
}

impl ResponseSink for MemorySink {
    fn append_row(&mut self, row: &ResponseRow) -> Result<(), SinkError> {
        if let Some(reason) = &self.failure {
            return Err(SinkError::new(reason.clone()));
        }
        self.rows.push(row.clone());
        Ok(())
    }
}
