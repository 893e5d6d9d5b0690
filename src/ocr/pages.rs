//! Page selection and admission limits for multi-page jobs.

use crate::error::{CaptionqError, Result};

/// Maximum number of page images accepted per job.
pub const MAX_PAGES: usize = 20;

/// Reject jobs that exceed the per-job page limit.
pub fn check_page_count(count: usize) -> Result<()> {
    if count > MAX_PAGES {
        return Err(CaptionqError::TooManyPages {
            count,
            limit: MAX_PAGES,
        });
    }
    Ok(())
}

/// Parse a 1-based page range string such as `"1-3,5"` into 0-based page
/// indices, in the order given, duplicates removed.
///
/// Malformed input (empty parts, non-numeric pages, reversed ranges,
/// references past `page_count`) is an `InvalidPageRange` error reported
/// before the job ever reaches the queue.
pub fn parse_page_range(input: &str, page_count: usize) -> Result<Vec<usize>> {
    let invalid = |message: &str| CaptionqError::InvalidPageRange {
        input: input.to_string(),
        message: message.to_string(),
    };

    if input.trim().is_empty() {
        return Err(invalid("range is empty"));
    }

    let mut indices = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(invalid("empty segment between commas"));
        }

        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_page(a, input)?, parse_page(b, input)?),
            None => {
                let page = parse_page(part, input)?;
                (page, page)
            }
        };

        if start > end {
            return Err(invalid("range start exceeds range end"));
        }
        if end > page_count {
            return Err(invalid("page number exceeds page count"));
        }

        for page in start..=end {
            let index = page - 1;
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
    }

    Ok(indices)
}

fn parse_page(s: &str, input: &str) -> Result<usize> {
    let page: usize = s
        .trim()
        .parse()
        .map_err(|_| CaptionqError::InvalidPageRange {
            input: input.to_string(),
            message: format!("'{}' is not a page number", s.trim()),
        })?;
    if page == 0 {
        return Err(CaptionqError::InvalidPageRange {
            input: input.to_string(),
            message: "page numbers start at 1".to_string(),
        });
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_pages_and_ranges() {
        assert_eq!(parse_page_range("1-3,5", 6).unwrap(), vec![0, 1, 2, 4]);
        assert_eq!(parse_page_range("2", 3).unwrap(), vec![1]);
        assert_eq!(parse_page_range("1,3", 3).unwrap(), vec![0, 2]);
    }

    #[test]
    fn tolerates_spaces() {
        assert_eq!(parse_page_range(" 1 - 2 , 4 ", 4).unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn removes_duplicates_preserving_order() {
        assert_eq!(parse_page_range("3,1-3", 3).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            parse_page_range("", 5),
            Err(CaptionqError::InvalidPageRange { .. })
        ));
        assert!(parse_page_range("  ", 5).is_err());
    }

    #[test]
    fn rejects_non_numeric_pages() {
        assert!(parse_page_range("1,two", 5).is_err());
        assert!(parse_page_range("a-b", 5).is_err());
    }

    #[test]
    fn rejects_reversed_range() {
        let err = parse_page_range("3-1", 5).unwrap_err();
        assert!(err.to_string().contains("range start exceeds range end"));
    }

    #[test]
    fn rejects_zero_page() {
        assert!(parse_page_range("0-2", 5).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_page() {
        assert!(parse_page_range("1-9", 5).is_err());
        assert!(parse_page_range("6", 5).is_err());
    }

    #[test]
    fn rejects_trailing_comma() {
        assert!(parse_page_range("1,", 5).is_err());
    }

    #[test]
    fn page_count_limit() {
        assert!(check_page_count(MAX_PAGES).is_ok());
        let err = check_page_count(MAX_PAGES + 1).unwrap_err();
        assert!(matches!(
            err,
            CaptionqError::TooManyPages {
                count: 21,
                limit: 20
            }
        ));
    }
}
