// Reading the items from a CSV file.

use crate::survey::{io_common::collect_items, *};

pub fn read_items_csv(path: &str, item_count: usize) -> BSurveyResult<Vec<String>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut cells: Vec<String> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_items_csv: lineno: {:?} row: {:?}", lineno, line);
        cells.push(line.get(0).unwrap_or("").to_string());
    }
    let items = collect_items(&cells, item_count);
    info!("read_items_csv: {} item(s) read from {:?}", items.len(), path);
    Ok(items)
}
