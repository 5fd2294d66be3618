use log::{debug, info, warn};

use pairwise_survey::builder::EntryForm;
use pairwise_survey::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;
use crate::survey::terminal::Terminal;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
pub mod store;
pub mod terminal;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file contains no worksheet"))]
    EmptyExcel {},
    #[snafu(display("Cannot find the worksheet {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display(
        "The Excel file {path} has several worksheets, use --excel-worksheet-name to pick one"
    ))]
    AmbiguousWorksheet { path: String },
    #[snafu(display("Unexpected cell type on line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing to {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening the store {path}"))]
    OpeningStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown store provider {provider:?} (expected csv or memory)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown tally encoding {encoding:?} (expected labelled or raw)"))]
    UnknownEncoding { encoding: String },
    #[snafu(display("Cannot read items from {path}: only .csv and .xlsx files are supported"))]
    UnknownFileType { path: String },
    #[snafu(display("Invalid answer {content:?} at position {position}: expected 1 or 2"))]
    InvalidAnswer { position: usize, content: String },
    #[snafu(display("Expected {expected} answers (one per pair), got {found}"))]
    WrongAnswerCount { expected: usize, found: usize },
    #[snafu(display("{source}"))]
    Validation { source: SurveyWarning },
    #[snafu(display("Error reading or writing the terminal"))]
    Terminal { source: std::io::Error },
    #[snafu(display("The input was closed before the survey was complete"))]
    InputClosed {},
    #[snafu(display("No pair to ask at position {idx}"))]
    NoCurrentPair { idx: usize },
    #[snafu(display("Difference detected between the results and the reference summary"))]
    SummaryMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;
pub type BSurveyResult<T> = Result<T, Box<SurveyError>>;

/// Reads `1`/`2` answers separated by commas or whitespace.
/// Returns for each answer the position in the pair (0 or 1).
pub fn parse_answers(s: &str) -> SurveyResult<Vec<usize>> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|x| !x.is_empty())
        .enumerate()
        .map(|(idx, x)| match x {
            "1" => Ok(0),
            "2" => Ok(1),
            _ => InvalidAnswerSnafu {
                position: idx + 1,
                content: x,
            }
            .fail(),
        })
        .collect()
}

/// Runs one survey without prompting.
pub fn run_scripted(
    rules: &SurveyRules,
    form: &EntryForm,
    answers: &[usize],
    sink: &mut dyn ResponseSink,
) -> BSurveyResult<Survey> {
    let mut survey = Survey::new(rules);
    survey.start(form).context(ValidationSnafu {})?;
    let expected = rules.pair_count();
    if answers.len() != expected {
        return Err(Box::new(SurveyError::WrongAnswerCount {
            expected,
            found: answers.len(),
        }));
    }
    for pos in answers {
        let choice = match survey.current_pair() {
            Some(pair) if *pos == 0 => pair.first.clone(),
            Some(pair) => pair.second.clone(),
            None => break,
        };
        survey
            .record_answer(Some(&choice), sink)
            .context(ValidationSnafu {})?;
    }
    Ok(survey)
}

/// Runs surveys at the terminal until the user stops.
///
/// Returns the last completed survey. Closing the input on the entry page of
/// a new survey stops like declining the restart does.
pub fn run_interactive<R: BufRead, W: Write>(
    rules: &SurveyRules,
    title: &str,
    preset: EntryForm,
    term: &mut Terminal<R, W>,
    sink: &mut dyn ResponseSink,
) -> BSurveyResult<Survey> {
    let mut survey = Survey::new(rules);
    let mut form = preset;
    let mut ask_email = form.validated_email().is_err();
    let mut last_completed: Option<Survey> = None;
    term.say(title)?;
    loop {
        match survey.page() {
            Page::Entry => {
                match (term.fill_entry(&mut form, rules, ask_email), last_completed.take()) {
                    (Ok(()), previous) => last_completed = previous,
                    (Err(e), Some(previous)) if matches!(*e, SurveyError::InputClosed {}) => {
                        info!("run_interactive: input closed after a completed survey");
                        return Ok(previous);
                    }
                    (Err(e), _) => return Err(e),
                }
                match survey.start(&form) {
                    Ok(()) => {}
                    Err(w) => {
                        term.say(&format!("Warning: {}", w))?;
                        ask_email = matches!(w, SurveyWarning::InvalidEmail(_));
                    }
                }
            }
            Page::Survey => {
                let pair = survey
                    .current_pair()
                    .cloned()
                    .context(NoCurrentPairSnafu { idx: survey.idx() })?;
                let choice = term.ask_pair(&pair, survey.progress())?;
                if let Err(w) = survey.record_answer(choice.as_deref(), sink) {
                    term.say(&format!("Warning: {}", w))?;
                }
            }
            Page::Results => {
                term.show_results(&survey)?;
                if !term.ask_restart()? {
                    return Ok(survey);
                }
                last_completed = Some(survey.clone());
                survey.reset();
                form = EntryForm::new(rules);
                ask_email = true;
            }
        }
    }
}

/// The results of the survey. A dry run never reports the response as saved.
fn build_summary_js(config: &SurveyConfig, survey: &Survey, dry_run: bool) -> JSValue {
    let rules = survey.rules();
    let c = OutputConfig {
        title: config.title(),
        item_count: rules.item_count,
        collect_email: rules.collect_email,
    };
    let results: Vec<JSValue> = survey
        .tally()
        .ranked()
        .iter()
        .map(|(item, count)| json!({"item": item, "count": count}))
        .collect();
    let persisted = match survey.persist_outcome() {
        Some(PersistOutcome::Failed { reason }) => json!({ "error": reason }),
        Some(outcome) => json!(outcome.is_saved() && !dry_run),
        None => json!(false),
    };
    json!({
        "config": c,
        "results": results,
        "total": survey.tally().total(),
        "persisted": persisted,
    })
}

fn write_summary(summary_js: &JSValue, out: &str) -> BSurveyResult<()> {
    let pretty = serde_json::to_string_pretty(summary_js).context(ParsingJsonSnafu {})?;
    if out == "stdout" {
        println!("{}", pretty);
    } else {
        fs::write(out, pretty).context(OpeningJsonSnafu { path: out })?;
        info!("write_summary: results written to {:?}", out);
    }
    Ok(())
}

/// Compares the results with a reference summary, ignoring whether the
/// response was saved.
fn check_summary(summary_js: &JSValue, reference_path: String) -> BSurveyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let mut summary = summary_js.clone();
    if let Some(obj) = summary.as_object_mut() {
        obj.remove("persisted");
    }
    let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    let pretty_stats = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty_stats.as_str(), "\n");
        return Err(Box::new(SurveyError::SummaryMismatch {}));
    }
    Ok(())
}

fn read_items_file(
    path: &str,
    worksheet_name: Option<String>,
    item_count: usize,
) -> BSurveyResult<Vec<String>> {
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    info!(
        "Attempting to read items from {:?}",
        io_common::simplify_file_name(path)
    );
    match ext.as_deref() {
        Some("csv") => io_csv::read_items_csv(path, item_count),
        Some("xlsx") => io_excel::read_items_excel(path, worksheet_name, item_count),
        _ => Err(Box::new(SurveyError::UnknownFileType {
            path: path.to_string(),
        })),
    }
}

/// The store location: command line first, then the configuration file
/// (relative to its directory), then the default.
fn store_path(args: &Args, config: &SurveyConfig, config_dir: Option<&Path>) -> PathBuf {
    if let Some(p) = &args.store {
        return PathBuf::from(p);
    }
    let lpath = config
        .store
        .as_ref()
        .and_then(|s| s.file_path.clone())
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());
    match config_dir {
        Some(root) => root.join(lpath),
        None => PathBuf::from(lpath),
    }
}

pub fn run_survey(args: &Args) -> BSurveyResult<()> {
    let (config, config_dir) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, Some(root))
        }
        None => (SurveyConfig::default(), None),
    };
    info!("config: {:?}", config);

    // Validate the rules:
    let rules = validate_rules(&config)?;

    let items: Vec<String> = if let Some(items) = &args.items {
        items.clone()
    } else if let Some(items_path) = &args.items_file {
        read_items_file(
            items_path,
            args.excel_worksheet_name.clone(),
            rules.item_count,
        )?
    } else {
        config.items.clone().unwrap_or_default()
    };
    debug!("run_survey: preset items: {:?}", items);

    let mut form = EntryForm::new(&rules)
        .items(&items)
        .context(ValidationSnafu {})?;
    if let Some(email) = &args.email {
        form = form.email(email);
    }

    let provider = if args.dry_run {
        "memory".to_string()
    } else {
        config.provider()
    };
    let path = store_path(args, &config, config_dir.as_deref());
    info!("run_survey: store: {} {:?}", provider, path);
    let mut sink = store::make_sink(&provider, path, &rules)?;

    let survey = match &args.answers {
        Some(answers_s) => {
            let answers = parse_answers(answers_s)?;
            let survey = run_scripted(&rules, &form, &answers, sink.as_mut())?;
            println!("{}", terminal::format_results(survey.tally()));
            if let Some(PersistOutcome::Failed { reason }) = survey.persist_outcome() {
                println!("Note: the response could not be saved ({})", reason);
            }
            survey
        }
        None => {
            let stdin = std::io::stdin();
            let mut term = Terminal::new(stdin.lock(), std::io::stdout());
            run_interactive(&rules, &config.title(), form, &mut term, sink.as_mut())?
        }
    };

    let summary_js = build_summary_js(&config, &survey, args.dry_run);

    if let Some(out) = &args.out {
        write_summary(&summary_js, out)?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        check_summary(&summary_js, reference_p.clone())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn strings(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    fn five() -> Vec<String> {
        strings(&["A", "B", "C", "D", "E"])
    }

    fn args() -> Args {
        Args {
            config: None,
            items: None,
            items_file: None,
            excel_worksheet_name: None,
            email: None,
            answers: None,
            store: None,
            out: None,
            reference: None,
            dry_run: false,
            verbose: false,
        }
    }

    #[test]
    fn answers_parsing() {
        assert_eq!(parse_answers("1,2, 1 2").unwrap(), vec![0, 1, 0, 1]);
        assert!(parse_answers("").unwrap().is_empty());
        assert!(matches!(
            parse_answers("1,3"),
            Err(SurveyError::InvalidAnswer { position: 2, .. })
        ));
    }

    #[test]
    fn scripted_first_choice() {
        let rules = SurveyRules::DEFAULT_RULES;
        let form = EntryForm::new(&rules).items(&five()).unwrap();
        let mut sink = MemorySink::default();
        let survey = run_scripted(&rules, &form, &[0; 10], &mut sink).unwrap();
        assert_eq!(survey.page(), Page::Results);
        assert_eq!(
            survey.tally().as_slice().iter().map(|p| p.1).collect::<Vec<u64>>(),
            vec![4, 3, 2, 1, 0]
        );
        assert_eq!(sink.rows.len(), 1);
    }

    #[test]
    fn scripted_needs_one_answer_per_pair() {
        let rules = SurveyRules::DEFAULT_RULES;
        let form = EntryForm::new(&rules).items(&five()).unwrap();
        let mut sink = MemorySink::default();
        let res = run_scripted(&rules, &form, &[0; 9], &mut sink);
        assert!(matches!(res, Err(e) if matches!(*e, SurveyError::WrongAnswerCount { expected: 10, found: 9 })));
        assert!(sink.rows.is_empty());
    }

    #[test]
    fn scripted_missing_items() {
        let rules = SurveyRules::DEFAULT_RULES;
        let form = EntryForm::new(&rules)
            .items(&strings(&["A", "B"]))
            .unwrap();
        let mut sink = MemorySink::default();
        let res = run_scripted(&rules, &form, &[0; 10], &mut sink);
        assert!(matches!(res, Err(e) if matches!(*e, SurveyError::Validation { .. })));
    }

    #[test]
    fn interactive_session() {
        let rules = SurveyRules::DEFAULT_RULES;
        // Two items are missing at first, then one blank answer and one
        // answer outside of the pair, then a full run.
        let input = "A\nB\n\nC\nD\nE\n\nZ\n1\n1\n1\n1\n1\n1\n1\n1\n1\n1\nn\n";
        let mut term = Terminal::new(Cursor::new(input), Vec::new());
        let mut sink = MemorySink::default();
        let form = EntryForm::new(&rules);
        let completed = run_interactive(&rules, "Test", form, &mut term, &mut sink).unwrap();
        assert_eq!(completed.tally().get("A"), Some(4));
        assert_eq!(completed.tally().total(), 10);
        assert_eq!(sink.rows.len(), 1);
        let out = String::from_utf8(term.into_output()).unwrap();
        assert!(out.contains("Warning: Fill in all 5 items"));
        assert!(out.contains("Warning: Pick one of the two options"));
        assert!(out.contains("Warning: \"Z\" is not one of the two options"));
        assert!(out.contains("Your answers have been saved."));
    }

    #[test]
    fn interactive_restart_and_failed_store() {
        let rules = SurveyRules::DEFAULT_RULES;
        let mut input = String::new();
        input.push_str(&"2\n".repeat(10));
        input.push_str("y\nV\nW\nX\nY\nZ\n");
        input.push_str(&"1\n".repeat(10));
        let mut term = Terminal::new(Cursor::new(input), Vec::new());
        let mut sink = MemorySink::failing("network down");
        let form = EntryForm::new(&rules).items(&five()).unwrap();
        let completed = run_interactive(&rules, "Test", form, &mut term, &mut sink).unwrap();
        // Input closed at the second restart question.
        assert_eq!(completed.items()[0], "V");
        assert_eq!(completed.tally().get("V"), Some(4));
        let out = String::from_utf8(term.into_output()).unwrap();
        assert_eq!(
            out.matches("could not be saved (network down)").count(),
            2
        );
    }

    #[test]
    fn interactive_invalid_email() {
        let rules = SurveyRules {
            collect_email: true,
            ..SurveyRules::DEFAULT_RULES
        };
        let mut input = String::from("bad\nana@example.com\n");
        input.push_str(&"1\n".repeat(10));
        let mut term = Terminal::new(Cursor::new(input), Vec::new());
        let mut sink = MemorySink::default();
        let form = EntryForm::new(&rules).items(&five()).unwrap();
        let completed = run_interactive(&rules, "Test", form, &mut term, &mut sink).unwrap();
        assert_eq!(completed.email(), Some("ana@example.com"));
        assert_eq!(sink.rows[0].email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn interactive_input_closed() {
        let rules = SurveyRules::DEFAULT_RULES;
        let mut term = Terminal::new(Cursor::new("A\nB\n"), Vec::new());
        let mut sink = MemorySink::default();
        let res = run_interactive(&rules, "Test", EntryForm::new(&rules), &mut term, &mut sink);
        assert!(matches!(res, Err(e) if matches!(*e, SurveyError::InputClosed {})));
    }

    #[test]
    fn input_closed_on_second_entry_keeps_first_survey() {
        let rules = SurveyRules::DEFAULT_RULES;
        let mut input = String::new();
        input.push_str(&"2\n".repeat(10));
        input.push_str("y\nV\nW\n");
        let mut term = Terminal::new(Cursor::new(input), Vec::new());
        let mut sink = MemorySink::default();
        let form = EntryForm::new(&rules).items(&five()).unwrap();
        let completed = run_interactive(&rules, "Test", form, &mut term, &mut sink).unwrap();
        assert_eq!(completed.items(), five().as_slice());
        assert_eq!(completed.tally().get("E"), Some(4));
        assert_eq!(completed.page(), Page::Results);
        assert_eq!(sink.rows.len(), 1);
    }

    #[test]
    fn dry_run_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("results.json");
        let store_path = dir.path().join("store.csv");
        let mut a = args();
        a.items = Some(five());
        a.answers = Some("1,1,1,1,1,1,1,1,1,1".to_string());
        a.dry_run = true;
        a.store = Some(store_path.display().to_string());
        a.out = Some(out_path.display().to_string());
        run_survey(&a).unwrap();
        let summary: JSValue =
            serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(summary["persisted"], json!(false));
        assert_eq!(summary["total"], json!(10));
        assert!(!store_path.exists());
    }

    #[test]
    fn end_to_end_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("survey.json");
        fs::write(
            &config_path,
            r#"{
                "surveySettings": { "title": "Values", "collectEmail": true },
                "store": { "provider": "csv", "filePath": "responses.csv" },
                "items": ["Health", "Family", "Work", "Sport", "Travel"]
            }"#,
        )
        .unwrap();
        let out_path = dir.path().join("results.json");
        let reference_path = dir.path().join("reference.json");
        fs::write(
            &reference_path,
            r#"{
                "config": { "title": "Values", "itemCount": 5, "collectEmail": true },
                "results": [
                    { "item": "Travel", "count": 4 },
                    { "item": "Sport", "count": 3 },
                    { "item": "Work", "count": 2 },
                    { "item": "Family", "count": 1 },
                    { "item": "Health", "count": 0 }
                ],
                "total": 10,
                "persisted": false
            }"#,
        )
        .unwrap();

        let mut a = args();
        a.config = Some(config_path.display().to_string());
        a.email = Some("ana@example.com".to_string());
        a.answers = Some("2,2,2,2,2,2,2,2,2,2".to_string());
        a.out = Some(out_path.display().to_string());
        a.reference = Some(reference_path.display().to_string());
        run_survey(&a).unwrap();
        // A second run appends to the same store.
        run_survey(&a).unwrap();

        let store = fs::read_to_string(dir.path().join("responses.csv")).unwrap();
        let lines: Vec<&str> = store.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,email,item_1,item_2,item_3,item_4,item_5");
        assert!(lines[1].ends_with(
            ",ana@example.com,\"Health, 0\",\"Family, 1\",\"Work, 2\",\"Sport, 3\",\"Travel, 4\""
        ));

        let summary: JSValue =
            serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(summary["persisted"], json!(true));
        assert_eq!(summary["results"][0]["item"], json!("Travel"));
    }

    #[test]
    fn reference_mismatch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let reference_path = dir.path().join("reference.json");
        fs::write(&reference_path, r#"{ "total": 3 }"#).unwrap();
        let mut a = args();
        a.items = Some(five());
        a.answers = Some("1,1,1,1,1,1,1,1,1,1".to_string());
        a.dry_run = true;
        a.reference = Some(reference_path.display().to_string());
        let res = run_survey(&a);
        assert!(matches!(res, Err(e) if matches!(*e, SurveyError::SummaryMismatch {})));
    }

    #[test]
    fn items_from_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let items_path = dir.path().join("items.csv");
        fs::write(&items_path, "item\nA\nB\nC\nD\nE\nF\n").unwrap();
        let mut a = args();
        a.items_file = Some(items_path.display().to_string());
        a.answers = Some("1 1 1 1 1 1 1 1 1 1".to_string());
        a.store = Some(dir.path().join("store.csv").display().to_string());
        run_survey(&a).unwrap();
        let store = fs::read_to_string(dir.path().join("store.csv")).unwrap();
        assert!(store.lines().nth(1).unwrap().ends_with(",\"A, 4\",\"B, 3\",\"C, 2\",\"D, 1\",\"E, 0\""));
    }

    #[test]
    fn unknown_items_file_type() {
        let res = read_items_file("items.txt", None, 5);
        assert!(matches!(res, Err(e) if matches!(*e, SurveyError::UnknownFileType { .. })));
    }
}
