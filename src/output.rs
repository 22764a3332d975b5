//! Download filenames for rendered documents.

use crate::model::Record;

/// Make a title safe for a filename: trim, turn whitespace runs into `-`,
/// and drop everything outside `[A-Za-z0-9_-]`.
pub fn sanitize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// `mpop-{id}.pdf` for the grid sheet and the Braille transcript.
pub fn sheet_filename(record: &Record) -> String {
    let id = record.id().map(|id| sanitize_title(&id)).unwrap_or_default();
    if id.is_empty() {
        "mpop.pdf".to_string()
    } else {
        format!("mpop-{}.pdf", id)
    }
}

/// Heading of the manual when the record has no title.
pub const DEFAULT_MANUAL_TITLE: &str = "MPOP item";

/// The title the manual is printed and named under.
pub fn manual_title(record: &Record) -> String {
    record
        .text("title")
        .unwrap_or_else(|| DEFAULT_MANUAL_TITLE.to_string())
}

/// `mpop-manual-{title}.pdf`. A title with nothing usable left after
/// sanitizing is named like a missing one.
pub fn manual_filename(record: &Record) -> String {
    let title = sanitize_title(&manual_title(record));
    let title = if title.is_empty() {
        sanitize_title(DEFAULT_MANUAL_TITLE)
    } else {
        title
    };
    format!("mpop-manual-{}.pdf", title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("  De kleine   kat "), "De-kleine-kat");
        assert_eq!(sanitize_title("Ça va? (deel 2)"), "a-va-deel-2");
        assert_eq!(sanitize_title("snake_case-name"), "snake_case-name");
        assert_eq!(sanitize_title("   "), "");
    }

    #[test]
    fn test_sheet_filename() {
        assert_eq!(sheet_filename(&Record::new().with("id", 42)), "mpop-42.pdf");
        assert_eq!(
            sheet_filename(&Record::new().with("id", "0b6f-11aa")),
            "mpop-0b6f-11aa.pdf"
        );
        assert_eq!(sheet_filename(&Record::new()), "mpop.pdf");
    }

    #[test]
    fn test_manual_filename() {
        let record = Record::new().with("title", "De kleine kat");
        assert_eq!(manual_filename(&record), "mpop-manual-De-kleine-kat.pdf");
        assert_eq!(
            manual_filename(&Record::new().with("title", "???")),
            "mpop-manual-MPOP-item.pdf"
        );
        assert_eq!(manual_filename(&Record::new()), "mpop-manual-MPOP-item.pdf");
    }

    #[test]
    fn test_manual_heading_and_filename_agree() {
        let record = Record::new();
        assert_eq!(manual_title(&record), DEFAULT_MANUAL_TITLE);
        assert_eq!(
            manual_filename(&record),
            format!("mpop-manual-{}.pdf", sanitize_title(&manual_title(&record)))
        );
    }
}
