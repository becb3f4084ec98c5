//! Markdown assembly and deterministic cleanup.
//!
//! ## Why a cleanup pass?
//!
//! Extraction output is *semantically correct* but *structurally messy*:
//! Windows line endings from DOCX runs, trailing spaces on every PDF
//! line, dozens of consecutive blank lines where a page break used to
//! be. This module applies cheap, deterministic string rules that fix
//! those artefacts without touching content. Each rule is a pure
//! function (`&str → String`) with no shared state, independently
//! testable.
//!
//! ## Rule Order
//!
//! Rules must run in this specific order: normalise line endings before
//! trimming so `\r` does not mask trailing whitespace, collapse blank
//! lines after trimming so whitespace-only lines count as blank, and
//! apply the final-newline pass last.

use crate::pipeline::extract::Extracted;
use once_cell::sync::Lazy;
use regex::Regex;

/// Marker emitted in place of a page with no extractable text.
///
/// Downstream the upload handler treats its presence as a hint that OCR
/// may have failed for that page.
pub const IMAGE_PLACEHOLDER: &str = "<!-- image -->";

/// Assemble extracted content into a Markdown document.
pub fn to_markdown(extracted: &Extracted) -> String {
    match extracted {
        Extracted::Markdown(md) => md.clone(),
        Extracted::Prose { text, page_count } => {
            if text.trim().is_empty() {
                placeholder_pages(page_count.unwrap_or(1))
            } else {
                text.clone()
            }
        }
        Extracted::Table { headers, rows } => pipe_table(headers, rows),
    }
}

/// One placeholder marker per page, so callers can tell a scanned
/// 40-page document from a scanned 1-page one.
fn placeholder_pages(pages: usize) -> String {
    vec![IMAGE_PLACEHOLDER; pages.max(1)].join("\n\n")
}

/// Render a GFM pipe table.
fn pipe_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let escape = |cell: &str| cell.replace('|', "\\|");

    let mut out = String::new();
    out.push_str(&format!(
        "| {} |\n",
        headers.iter().map(|h| escape(h)).collect::<Vec<_>>().join(" | ")
    ));
    out.push_str(&format!(
        "|{}\n",
        " --- |".repeat(headers.len().max(1))
    ));
    for row in rows {
        out.push_str(&format!(
            "| {} |\n",
            row.iter().map(|c| escape(c)).collect::<Vec<_>>().join(" | ")
        ));
    }
    out
}

/// Apply all cleanup rules to assembled Markdown.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Trim trailing whitespace per line
/// 3. Collapse 3+ consecutive blank lines down to 2
/// 4. Ensure the document ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Trim trailing whitespace per line ────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 3: Collapse excessive blank lines ───────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 4: Ensure file ends with single newline ─────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_passes_through() {
        let extracted = Extracted::Prose {
            text: "Some body text.".to_string(),
            page_count: Some(3),
        };
        assert_eq!(to_markdown(&extracted), "Some body text.");
    }

    #[test]
    fn empty_prose_yields_one_placeholder_per_page() {
        let extracted = Extracted::Prose {
            text: "   \n ".to_string(),
            page_count: Some(3),
        };
        let md = to_markdown(&extracted);
        assert_eq!(md.matches(IMAGE_PLACEHOLDER).count(), 3);
    }

    #[test]
    fn empty_prose_without_page_count_yields_single_placeholder() {
        let extracted = Extracted::Prose {
            text: String::new(),
            page_count: None,
        };
        assert_eq!(to_markdown(&extracted), IMAGE_PLACEHOLDER);
    }

    #[test]
    fn table_renders_gfm_pipes() {
        let extracted = Extracted::Table {
            headers: vec!["name".into(), "age".into()],
            rows: vec![vec!["alice".into(), "30".into()]],
        };
        let md = to_markdown(&extracted);
        assert_eq!(md, "| name | age |\n| --- | --- |\n| alice | 30 |\n");
    }

    #[test]
    fn table_escapes_pipes_in_cells() {
        let extracted = Extracted::Table {
            headers: vec!["expr".into()],
            rows: vec![vec!["a|b".into()]],
        };
        assert!(to_markdown(&extracted).contains("a\\|b"));
    }

    #[test]
    fn clean_normalises_crlf() {
        assert_eq!(clean_markdown("a\r\nb\r"), "a\nb\n");
    }

    #[test]
    fn clean_trims_trailing_whitespace() {
        assert_eq!(clean_markdown("a   \nb\t"), "a\nb\n");
    }

    #[test]
    fn clean_collapses_blank_lines() {
        assert_eq!(clean_markdown("a\n\n\n\n\n\nb"), "a\n\n\nb\n");
    }

    #[test]
    fn clean_adds_exactly_one_final_newline() {
        assert_eq!(clean_markdown("a"), "a\n");
        assert_eq!(clean_markdown("a\n\n\n"), "a\n");
        assert_eq!(clean_markdown(""), "\n");
    }
}
