// Plain text front end: one prompt per line of input.

use std::io::{BufRead, Write};

use crate::survey::*;

pub struct Terminal<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Terminal<R, W> {
        Terminal { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, msg: &str) -> BSurveyResult<()> {
        writeln!(self.output, "{}", msg).context(TerminalSnafu {})?;
        Ok(())
    }

    /// Prints the prompt and reads one line, without the line ending.
    /// Returns None once the input is closed.
    pub fn ask(&mut self, prompt: &str) -> BSurveyResult<Option<String>> {
        write!(self.output, "{}", prompt).context(TerminalSnafu {})?;
        self.output.flush().context(TerminalSnafu {})?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line).context(TerminalSnafu {})?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    fn ask_open(&mut self, prompt: &str) -> BSurveyResult<String> {
        match self.ask(prompt)? {
            Some(s) => Ok(s),
            None => Err(Box::new(SurveyError::InputClosed {})),
        }
    }

    /// Prompts for the blank slots of the form, and for the email when one
    /// is needed.
    pub fn fill_entry(
        &mut self,
        form: &mut EntryForm,
        rules: &SurveyRules,
        ask_email: bool,
    ) -> BSurveyResult<()> {
        let blank: Vec<usize> = form
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.trim().is_empty())
            .map(|(idx, _)| idx)
            .collect();
        if !blank.is_empty() {
            self.say(&format!("Enter {} items", rules.item_count))?;
        }
        for slot in blank {
            let text = self.ask_open(&format!("Item {}: ", slot + 1))?;
            form.set_item(slot, &text).context(ValidationSnafu {})?;
        }
        if rules.collect_email && ask_email {
            let email = self.ask_open("Email: ")?;
            *form = form.clone().email(&email);
        }
        Ok(())
    }

    /// Asks for the preferred item of the pair.
    ///
    /// `1` and `2` pick the first and second item, any other text is taken as
    /// the name of the item and an empty line is no selection.
    pub fn ask_pair(
        &mut self,
        pair: &Pair,
        progress: (usize, usize),
    ) -> BSurveyResult<Option<String>> {
        self.say(&format!("Question {} / {}", progress.0 + 1, progress.1))?;
        self.say("Which one matters more to you?")?;
        self.say(&format!("  1) {}", pair.first))?;
        self.say(&format!("  2) {}", pair.second))?;
        let line = self.ask_open("> ")?;
        let choice = match line.trim() {
            "" => None,
            "1" => Some(pair.first.clone()),
            "2" => Some(pair.second.clone()),
            s => Some(s.to_string()),
        };
        Ok(choice)
    }

    pub fn show_results(&mut self, survey: &Survey) -> BSurveyResult<()> {
        self.say("Thank you for taking the survey! Here are your results:")?;
        self.say(&format_results(survey.tally()))?;
        match survey.persist_outcome() {
            Some(PersistOutcome::Failed { reason }) => {
                self.say(&format!(
                    "Note: your answers could not be saved ({}). The results above are still valid.",
                    reason
                ))?;
            }
            Some(PersistOutcome::Saved) => {
                self.say("Your answers have been saved.")?;
            }
            None => {}
        }
        Ok(())
    }

    pub fn ask_restart(&mut self) -> BSurveyResult<bool> {
        let res = self.ask("Start a new survey? [y/N] ")?;
        Ok(matches!(
            res.as_deref().map(|s| s.trim().to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        ))
    }
}

/// The ranked tally, one line per item with a bar of `#`.
pub fn format_results(tally: &Tally) -> String {
    let ranked = tally.ranked();
    let width = ranked
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    let lines: Vec<String> = ranked
        .iter()
        .map(|(name, count)| {
            let bar = "#".repeat(*count as usize);
            format!("{:<width$}  {:>2}  {}", name, count, bar, width = width)
                .trim_end()
                .to_string()
        })
        .collect();
    lines.join("\n")
}
