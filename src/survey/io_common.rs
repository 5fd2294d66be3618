use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Turns the raw cells of the first column into a list of items.
///
/// An optional header cell named `item` is dropped, blank cells are
/// skipped and at most `item_count` items are kept.
pub fn collect_items(cells: &[String], item_count: usize) -> Vec<String> {
    let mut iter = cells.iter().map(|s| s.trim()).peekable();
    if let Some(first) = iter.peek() {
        if first.eq_ignore_ascii_case("item") || first.eq_ignore_ascii_case("items") {
            iter.next();
        }
    }
    iter.filter(|s| !s.is_empty())
        .take(item_count)
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_and_blanks() {
        let cells = strings(&["Item", " Health", "", "Family ", "Work"]);
        assert_eq!(
            collect_items(&cells, 5),
            strings(&["Health", "Family", "Work"])
        );
    }

    #[test]
    fn truncates() {
        let cells = strings(&["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(collect_items(&cells, 5).len(), 5);
    }

    #[test]
    fn file_name() {
        assert_eq!(simplify_file_name("/tmp/data/items.csv"), "items.csv");
    }
}
