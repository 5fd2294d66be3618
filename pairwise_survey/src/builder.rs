pub use crate::config::*;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

/// The content of the entry page.
///
/// Every slot holds the raw text typed by the user. Nothing is validated
/// until the survey is started.
///
/// ```
/// pub use pairwise_survey::builder::EntryForm;
/// pub use pairwise_survey::SurveyRules;
/// # use pairwise_survey::SurveyWarning;
///
/// let mut form = EntryForm::new(&SurveyRules::DEFAULT_RULES)
///     .items(&["Health".to_string(), " Family ".to_string()])?;
///
/// form.set_item(2, "Work")?;
///
/// assert_eq!(form.slots()[1], " Family ");
/// # Ok::<(), SurveyWarning>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EntryForm {
    pub(crate) _rules: SurveyRules,
    pub(crate) _slots: Vec<String>,
    pub(crate) _email: Option<String>,
}

impl EntryForm {
    pub fn new(rules: &SurveyRules) -> EntryForm {
        EntryForm {
            _rules: rules.clone(),
            _slots: vec!["".to_string(); rules.item_count],
            _email: None,
        }
    }

    /// Fills the slots in order, starting with the first one.
    pub fn items(mut self, items: &[String]) -> Result<EntryForm, SurveyWarning> {
        for (slot, text) in items.iter().enumerate() {
            self.set_item(slot, text)?;
        }
        Ok(self)
    }

    pub fn email(mut self, email: &str) -> EntryForm {
        self._email = Some(email.to_string());
        self
    }

    pub fn set_item(&mut self, slot: usize, text: &str) -> Result<(), SurveyWarning> {
        let item_count = self._rules.item_count;
        let elt = self
            ._slots
            .get_mut(slot)
            .ok_or(SurveyWarning::SlotOutOfRange { slot, item_count })?;
        *elt = text.to_string();
        Ok(())
    }

    pub fn slots(&self) -> &[String] {
        &self._slots
    }

    /// The trimmed, non-empty items, in slot order.
    ///
    /// Duplicated items are accepted.
    pub fn validated_items(&self) -> Result<Vec<String>, SurveyWarning> {
        if self._rules.item_count < SurveyRules::MIN_ITEM_COUNT {
            return Err(SurveyWarning::TooFewItems {
                item_count: self._rules.item_count,
            });
        }
        let items: Vec<String> = self
            ._slots
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        debug!("validated_items: {:?}", items);
        if items.len() != self._rules.item_count {
            return Err(SurveyWarning::NotEnoughItems {
                expected: self._rules.item_count,
                found: items.len(),
            });
        }
        Ok(items)
    }

    /// The trimmed email, if the rules ask for one.
    pub fn validated_email(&self) -> Result<Option<String>, SurveyWarning> {
        if !self._rules.collect_email {
            return Ok(None);
        }
        let email = self._email.as_deref().unwrap_or("").trim();
        if is_valid_email(email) {
            Ok(Some(email.to_string()))
        } else {
            Err(SurveyWarning::InvalidEmail(email.to_string()))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
