// Reading the items from an Excel workbook.

use calamine::DataType;

use crate::survey::{io_common::collect_items, *};

pub fn read_items_excel(
    path: &str,
    worksheet_name: Option<String>,
    item_count: usize,
) -> BSurveyResult<Vec<String>> {
    let wrange = get_range(path, worksheet_name)?;

    let mut cells: Vec<String> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        debug!("read_items_excel: idx: {:?} row: {:?}", idx, &row);
        let cell = match row.first() {
            Some(DataType::String(s)) => s.clone(),
            Some(DataType::Int(i)) => i.to_string(),
            Some(DataType::Float(f)) => f.to_string(),
            Some(DataType::Empty) | None => "".to_string(),
            Some(v) => {
                return Err(Box::new(SurveyError::ExcelWrongCellType {
                    lineno: (idx + 1) as u64,
                    content: format!("{:?}", v),
                }));
            }
        };
        cells.push(cell);
    }
    let items = collect_items(&cells, item_count);
    info!(
        "read_items_excel: {} item(s) read from {:?}",
        items.len(),
        path
    );
    Ok(items)
}

fn get_range(path: &str, worksheet_name_o: Option<String>) -> BSurveyResult<calamine::Range<DataType>> {
    debug!(
        "read_items_excel: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(SurveyError::EmptyExcel {})),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_items_excel: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => Err(Box::new(SurveyError::AmbiguousWorksheet {
                path: path.to_string(),
            })),
        }
    }
}
