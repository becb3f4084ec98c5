//! Per-format text extraction from scratch artifacts.
//!
//! Dispatches on the filename extension and hands each format to the
//! library that understands it: `pdf-extract` (+ `lopdf` for the page
//! count), `docx-rs`, the `csv` reader, or plain UTF-8 decoding. Image
//! uploads go through the system `tesseract` binary when OCR is enabled.
//!
//! Everything here is synchronous and potentially slow; callers run it
//! inside `spawn_blocking`. PDF extraction additionally runs on its own
//! thread with a timeout because documents with pathological font tables
//! can make `pdf-extract` hang indefinitely.

use crate::config::OcrOptions;
use crate::error::ConvertError;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Content pulled out of one uploaded file, before Markdown assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Flowing text. `page_count` is known only for paginated formats;
    /// text may be empty for image-only documents (the Markdown stage
    /// emits one placeholder per page in that case).
    Prose {
        text: String,
        page_count: Option<usize>,
    },
    /// Tabular data destined for a GFM pipe table.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Content that already is Markdown; passed through untouched.
    Markdown(String),
}

/// Extract the content of the artifact at `path`.
///
/// `filename` carries the original upload name whose extension selects
/// the extractor. `timeout_secs` bounds PDF extraction only.
pub fn extract(
    path: &Path,
    filename: &str,
    ocr: &OcrOptions,
    timeout_secs: u64,
) -> Result<Extracted, ConvertError> {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match extension.as_str() {
        "pdf" => extract_pdf(path, timeout_secs),
        "docx" => extract_docx(path),
        "txt" | "text" => Ok(Extracted::Prose {
            text: read_lossy(path)?,
            page_count: None,
        }),
        "md" | "markdown" => Ok(Extracted::Markdown(read_lossy(path)?)),
        "csv" => extract_csv(path),
        "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" => {
            if !ocr.enabled {
                return Err(ConvertError::OcrDisabled);
            }
            extract_image_ocr(path, ocr)
        }
        _ => Err(ConvertError::UnsupportedFormat { extension }),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ConvertError> {
    std::fs::read(path).map_err(|e| ConvertError::ScratchIo {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_lossy(path: &Path) -> Result<String, ConvertError> {
    Ok(String::from_utf8_lossy(&read_bytes(path)?).into_owned())
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Extract PDF text on a dedicated thread with a timeout.
///
/// `pdf-extract` occasionally hangs on documents with broken embedded
/// fonts. The extraction thread cannot be killed, but abandoning it and
/// reporting a timeout keeps the batch moving.
fn extract_pdf(path: &Path, timeout_secs: u64) -> Result<Extracted, ConvertError> {
    use std::sync::mpsc;
    use std::time::Duration;

    let data = read_bytes(path)?;

    // Page count first; load failures fall back to 1 page so an
    // image-only document still yields a placeholder.
    let page_count = match lopdf::Document::load_mem(&data) {
        Ok(doc) => doc.get_pages().len().max(1),
        Err(e) => {
            debug!("lopdf could not read page tree: {}", e);
            1
        }
    };

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = pdf_extract::extract_text_from_mem(&data);
        let _ = tx.send(result);
    });

    let text = match rx.recv_timeout(Duration::from_secs(timeout_secs)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return Err(ConvertError::Extraction {
                detail: format!("pdf-extract: {}", e),
            })
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("PDF extraction timed out after {}s", timeout_secs);
            return Err(ConvertError::Timeout { secs: timeout_secs });
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            return Err(ConvertError::Extraction {
                detail: "pdf-extract worker crashed".to_string(),
            })
        }
    };

    // Strip null bytes and collapse the ragged line structure extraction
    // leaves behind.
    let text = text
        .replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Extracted::Prose {
        text,
        page_count: Some(page_count),
    })
}

// ── DOCX ─────────────────────────────────────────────────────────────────

fn extract_docx(path: &Path) -> Result<Extracted, ConvertError> {
    let data = read_bytes(path)?;
    let doc = docx_rs::read_docx(&data).map_err(|e| ConvertError::Extraction {
        detail: format!("docx: {}", e),
    })?;

    let mut text = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }

    Ok(Extracted::Prose {
        text,
        page_count: None,
    })
}

// ── CSV ──────────────────────────────────────────────────────────────────

fn extract_csv(path: &Path) -> Result<Extracted, ConvertError> {
    let data = read_bytes(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| ConvertError::Extraction {
            detail: format!("csv: {}", e),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ConvertError::Extraction {
            detail: format!("csv: {}", e),
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Extracted::Table { headers, rows })
}

// ── Image OCR ────────────────────────────────────────────────────────────

/// Run the system `tesseract` binary over an image upload.
fn extract_image_ocr(path: &Path, ocr: &OcrOptions) -> Result<Extracted, ConvertError> {
    let output = Command::new("tesseract")
        .arg(path)
        .arg("stdout")
        .args(["-l", &ocr.language])
        .output();

    match output {
        Ok(output) if output.status.success() => Ok(Extracted::Prose {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            page_count: None,
        }),
        Ok(output) => Err(ConvertError::Extraction {
            detail: format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConvertError::OcrUnavailable {
            hint: "tesseract not found (install tesseract-ocr)".to_string(),
        }),
        Err(e) => Err(ConvertError::Extraction {
            detail: format!("tesseract: {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let (_dir, path) = write_temp("blob.xyz", b"data");
        let err = extract(&path, "blob.xyz", &OcrOptions::default(), 5).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnsupportedFormat { ref extension } if extension == "xyz"
        ));
    }

    #[test]
    fn txt_is_prose_without_page_count() {
        let (_dir, path) = write_temp("notes.txt", b"hello world");
        let extracted = extract(&path, "notes.txt", &OcrOptions::default(), 5).unwrap();
        assert_eq!(
            extracted,
            Extracted::Prose {
                text: "hello world".to_string(),
                page_count: None,
            }
        );
    }

    #[test]
    fn markdown_passes_through() {
        let (_dir, path) = write_temp("doc.md", b"# Title\n\nBody.\n");
        let extracted = extract(&path, "doc.md", &OcrOptions::default(), 5).unwrap();
        assert_eq!(
            extracted,
            Extracted::Markdown("# Title\n\nBody.\n".to_string())
        );
    }

    #[test]
    fn csv_becomes_table() {
        let (_dir, path) = write_temp("data.csv", b"name,age\nalice,30\nbob,41\n");
        let extracted = extract(&path, "data.csv", &OcrOptions::default(), 5).unwrap();
        match extracted {
            Extracted::Table { headers, rows } => {
                assert_eq!(headers, vec!["name", "age"]);
                assert_eq!(rows, vec![vec!["alice", "30"], vec!["bob", "41"]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn garbage_pdf_reports_extraction_failure() {
        let (_dir, path) = write_temp("broken.pdf", b"definitely not a pdf");
        let err = extract(&path, "broken.pdf", &OcrOptions::default(), 5).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Extraction { .. } | ConvertError::Timeout { .. }
        ));
    }

    #[test]
    fn image_with_ocr_disabled_is_rejected() {
        let (_dir, path) = write_temp("scan.png", b"\x89PNG");
        let ocr = OcrOptions {
            enabled: false,
            ..OcrOptions::default()
        };
        let err = extract(&path, "scan.png", &ocr, 5).unwrap_err();
        assert!(matches!(err, ConvertError::OcrDisabled));
    }

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        let (_dir, path) = write_temp("NOTES.TXT", b"upper");
        let extracted = extract(&path, "NOTES.TXT", &OcrOptions::default(), 5).unwrap();
        assert!(matches!(extracted, Extracted::Prose { ref text, .. } if text == "upper"));
    }
}
