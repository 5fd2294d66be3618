use crate::survey::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveySettings {
    pub title: Option<String>,
    #[serde(rename = "itemCount")]
    pub item_count: Option<JSValue>,
    #[serde(rename = "collectEmail")]
    pub collect_email: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "tallyEncoding")]
    pub tally_encoding: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveyConfig {
    #[serde(rename = "surveySettings")]
    pub survey_settings: Option<SurveySettings>,
    pub store: Option<StoreSettings>,
    pub items: Option<Vec<String>>,
}

impl SurveyConfig {
    pub fn title(&self) -> String {
        self.survey_settings
            .as_ref()
            .and_then(|s| s.title.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    pub fn item_count(&self) -> SurveyResult<usize> {
        match self.survey_settings.as_ref().map(|s| &s.item_count) {
            Some(Some(x)) => read_js_int(x),
            _ => Ok(SurveyRules::DEFAULT_RULES.item_count),
        }
    }

    pub fn provider(&self) -> String {
        self.store
            .as_ref()
            .map(|s| s.provider.clone())
            .unwrap_or_else(|| "csv".to_string())
    }
}

/// The summary of the configuration, as written in the results.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub title: String,
    #[serde(rename = "itemCount")]
    pub item_count: usize,
    #[serde(rename = "collectEmail")]
    pub collect_email: bool,
}

pub const DEFAULT_TITLE: &str = "Pairwise survey";
pub const DEFAULT_STORE_PATH: &str = "responses.csv";

pub fn read_config(path: &str) -> BSurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn validate_rules(config: &SurveyConfig) -> SurveyResult<SurveyRules> {
    let item_count = config.item_count()?;
    if item_count < SurveyRules::MIN_ITEM_COUNT {
        whatever!(
            "itemCount must be at least {} for a pairwise survey, got {}",
            SurveyRules::MIN_ITEM_COUNT,
            item_count
        )
    }
    let tally_encoding = match config.store.as_ref().and_then(|s| s.tally_encoding.clone()) {
        None => TallyEncoding::Labelled,
        Some(x) => match x.as_str() {
            "labelled" => TallyEncoding::Labelled,
            "raw" => TallyEncoding::RawCounts,
            _ => return UnknownEncodingSnafu { encoding: x }.fail(),
        },
    };
    let res = SurveyRules {
        item_count,
        collect_email: config
            .survey_settings
            .as_ref()
            .and_then(|s| s.collect_email)
            .unwrap_or(false),
        tally_encoding,
    };
    Ok(res)
}

pub fn read_summary(path: String) -> BSurveyResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let mut js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    // Whether the response could be saved depends on the machine, not on the answers.
    if let Some(obj) = js.as_object_mut() {
        obj.remove("persisted");
    }
    Ok(js)
}

fn read_js_int(x: &JSValue) -> SurveyResult<usize> {
    match x {
        JSValue::Number(n) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        JSValue::String(s) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: SurveyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(validate_rules(&config).unwrap(), SurveyRules::DEFAULT_RULES);
        assert_eq!(config.title(), DEFAULT_TITLE);
        assert_eq!(config.provider(), "csv");
    }

    #[test]
    fn full_config() {
        let config: SurveyConfig = serde_json::from_str(
            r#"{
                "surveySettings": { "title": "Values", "itemCount": "4", "collectEmail": true },
                "store": { "provider": "csv", "filePath": "out/responses.csv", "tallyEncoding": "raw" },
                "items": ["a", "b", "c", "d"]
            }"#,
        )
        .unwrap();
        let rules = validate_rules(&config).unwrap();
        assert_eq!(rules.item_count, 4);
        assert!(rules.collect_email);
        assert_eq!(rules.tally_encoding, TallyEncoding::RawCounts);
        assert_eq!(config.title(), "Values");
        assert_eq!(config.items.unwrap().len(), 4);
    }

    #[test]
    fn bad_values() {
        let config: SurveyConfig =
            serde_json::from_str(r#"{ "surveySettings": { "itemCount": 1 } }"#).unwrap();
        assert!(validate_rules(&config).is_err());

        let config: SurveyConfig =
            serde_json::from_str(r#"{ "surveySettings": { "itemCount": "five" } }"#).unwrap();
        assert!(matches!(
            validate_rules(&config),
            Err(SurveyError::ParsingJsonNumber {})
        ));

        let config: SurveyConfig = serde_json::from_str(
            r#"{ "store": { "provider": "csv", "tallyEncoding": "pairs" } }"#,
        )
        .unwrap();
        assert!(matches!(
            validate_rules(&config),
            Err(SurveyError::UnknownEncoding { .. })
        ));
    }
}
