//! Content pagination.

use crate::error::{AppError, Result};

/// Split raw text into pages of `lines_per_page` source lines each.
///
/// Page `i` holds lines `[i * lines_per_page, (i + 1) * lines_per_page)`
/// joined by `\n`; the trailing partial page is kept. Empty input yields
/// exactly one empty page, so there is always at least one page. A zero
/// `lines_per_page` is rejected here; callers that take user input fall
/// back to the configured default instead of propagating the error.
pub fn paginate(text: &str, lines_per_page: usize) -> Result<Vec<String>> {
    if lines_per_page == 0 {
        return Err(AppError::Validation(
            "lines_per_page must be positive".to_string(),
        ));
    }

    let lines: Vec<&str> = text.split('\n').collect();

    let pages = lines
        .chunks(lines_per_page)
        .map(|chunk| chunk.join("\n"))
        .collect();

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_single_empty_page() {
        let pages = paginate("", 80).unwrap();
        assert_eq!(pages, vec![String::new()]);
    }

    #[test]
    fn one_line_per_page() {
        let pages = paginate("a\nb\nc\nd\ne", 1).unwrap();
        assert_eq!(pages.len(), 5);
        assert_eq!(pages[0], "a");
        assert_eq!(pages[4], "e");
    }

    #[test]
    fn trailing_partial_page_is_kept() {
        let pages = paginate("a\nb\nc\nd\nE", 2).unwrap();
        assert_eq!(pages, vec!["a\nb", "c\nd", "E"]);
    }

    #[test]
    fn pages_round_trip_line_content() {
        let text = "alpha\nbeta\ngamma\ndelta\nepsilon\nzeta\neta";
        for lines_per_page in [1, 2, 3, 7, 50] {
            let pages = paginate(text, lines_per_page).unwrap();
            assert_eq!(pages.join("\n"), text);
        }
    }

    #[test]
    fn zero_lines_per_page_rejected() {
        assert!(paginate("a\nb", 0).is_err());
    }
}
