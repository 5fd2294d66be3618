use clap::Parser;

/// This is a pairwise comparison survey. Every pair of items is presented once and the
/// preferred item of each pair gets one point.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the survey and the store.
    /// For more information about the file format, read the manual of the pairwise_survey crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (text, repeated or not specified) The items of the survey, in order. Missing items are
    /// asked at the terminal. This option overrides the items of the --config file.
    #[clap(short, long, value_parser)]
    pub items: Option<Vec<String>>,

    /// (file path or empty) A CSV or Excel (.xlsx) file whose first column contains the items.
    #[clap(long, value_parser)]
    pub items_file: Option<String>,

    /// (default: the only worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (text or empty) The email stored with the response, when the survey collects emails.
    #[clap(short, long, value_parser)]
    pub email: Option<String>,

    /// (list of 1 and 2, comma-separated, or empty) If specified, the questions are answered
    /// without prompting: 1 picks the first item of the pair, 2 the second one.
    #[clap(short, long, value_parser)]
    pub answers: Option<String>,

    /// (file path or empty) The CSV file the responses are appended to. Setting this option
    /// overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the results of the survey will be written
    /// in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the results of a survey in JSON format. If provided,
    /// pairwise will check that the results match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the responses are not written anywhere.
    #[clap(long, takes_value = false)]
    pub dry_run: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
