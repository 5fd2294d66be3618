// The CSV file holding one row per completed survey.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::survey::*;

/// Appends the responses to a CSV file.
///
/// The file and its header row are created on the first write. The file is
/// never read back, except for checking that the header matches.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    rules: SurveyRules,
}

impl CsvSink {
    pub fn new(path: PathBuf, rules: &SurveyRules) -> CsvSink {
        CsvSink {
            path,
            rules: rules.clone(),
        }
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    fn needs_header(&self) -> bool {
        match fs::metadata(&self.path) {
            Ok(m) => m.len() == 0,
            Err(_) => true,
        }
    }

    fn check_header(&self) -> BSurveyResult<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .context(CsvOpenSnafu {
                path: self.path_str(),
            })?;
        let expected = ResponseRow::header(&self.rules);
        if let Some(first) = rdr.records().next() {
            let first = first.context(CsvLineParseSnafu { lineno: 1usize })?;
            let found: Vec<&str> = first.iter().collect();
            if found != expected {
                warn!(
                    "check_header: {:?} starts with {:?}, expected {:?}; appending anyway",
                    self.path, found, expected
                );
            }
        }
        Ok(())
    }

    /// Whether the last byte of a non-empty store is a line feed.
    fn ends_with_newline(&self) -> BSurveyResult<bool> {
        let mut file = File::open(&self.path).context(OpeningStoreSnafu {
            path: self.path_str(),
        })?;
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .and_then(|_| file.read_exact(&mut last))
            .context(OpeningStoreSnafu {
                path: self.path_str(),
            })?;
        Ok(last[0] == b'\n')
    }

    pub fn write_row(&self, row: &ResponseRow) -> BSurveyResult<()> {
        let needs_header = self.needs_header();
        let mut missing_newline = false;
        if !needs_header {
            self.check_header()?;
            missing_newline = !self.ends_with_newline()?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context(OpeningStoreSnafu {
                path: self.path_str(),
            })?;
        if missing_newline {
            warn!("write_row: {:?} does not end with a line feed, adding one", self.path);
            file.write_all(b"\n").context(OpeningStoreSnafu {
                path: self.path_str(),
            })?;
        }
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        if needs_header {
            info!("write_row: creating {:?}", self.path);
            wtr.write_record(ResponseRow::header(&self.rules))
                .context(CsvWriteSnafu {
                    path: self.path_str(),
                })?;
        }
        let cells = row.cells(&self.rules);
        debug!("write_row: {:?}", cells);
        wtr.write_record(&cells).context(CsvWriteSnafu {
            path: self.path_str(),
        })?;
        wtr.flush().context(OpeningStoreSnafu {
            path: self.path_str(),
        })?;
        Ok(())
    }
}

impl ResponseSink for CsvSink {
    fn append_row(&mut self, row: &ResponseRow) -> Result<(), SinkError> {
        self.write_row(row).map_err(|e| SinkError::new(e.to_string()))
    }
}

/// The sink for the configured provider.
pub fn make_sink(provider: &str, path: PathBuf, rules: &SurveyRules) -> SurveyResult<Box<dyn ResponseSink>> {
    match provider {
        "csv" => Ok(Box::new(CsvSink::new(path, rules))),
        "memory" => Ok(Box::new(MemorySink::default())),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}
