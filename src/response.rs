//! Per-file result records and response envelopes.
//!
//! Every upload endpoint answers `{"results": [...]}` with one record
//! per file, in input order. Records are untagged unions: a file either
//! produced content or an error string, never both. Serialisation shapes
//! here are the wire contract, pinned by the integration tests.

use serde::{Deserialize, Serialize};

/// Envelope for every batch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsEnvelope<T> {
    pub results: Vec<T>,
}

impl<T> ResultsEnvelope<T> {
    pub fn new(results: Vec<T>) -> Self {
        Self { results }
    }
}

/// OCR status reported for a locally converted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcrStatus {
    #[serde(rename = "OCR completed")]
    Completed,
    #[serde(rename = "OCR failed")]
    Failed,
}

/// Result record for the local conversion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConvertOutcome {
    /// Conversion produced Markdown.
    Converted {
        filename: String,
        content: String,
        ocr_status: OcrStatus,
    },
    /// Conversion failed; the batch continued without this file.
    Failed { filename: String, error: String },
}

impl ConvertOutcome {
    /// Build the success record; empty content reports `OCR failed`,
    /// matching the upstream contract.
    pub fn converted(filename: impl Into<String>, content: String) -> Self {
        let ocr_status = if content.trim().is_empty() {
            OcrStatus::Failed
        } else {
            OcrStatus::Completed
        };
        Self::Converted {
            filename: filename.into(),
            content,
            ocr_status,
        }
    }

    pub fn failed(filename: impl Into<String>, error: impl ToString) -> Self {
        Self::Failed {
            filename: filename.into(),
            error: error.to_string(),
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Converted { filename, .. } | Self::Failed { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// Result record for the cloud parsing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub filename: String,
    pub parsed_content: String,
}

/// Result record for the analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyzeOutcome {
    /// The model produced an analysis of the converted document.
    Analyzed { filename: String, analysis: String },
    /// Conversion or analysis failed for this file.
    Failed { filename: String, error: String },
}

impl AnalyzeOutcome {
    pub fn failed(filename: impl Into<String>, error: impl ToString) -> Self {
        Self::Failed {
            filename: filename.into(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converted_record_wire_shape() {
        let record = ConvertOutcome::converted("report.pdf", "# Report\n".to_string());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "filename": "report.pdf",
                "content": "# Report\n",
                "ocr_status": "OCR completed",
            })
        );
    }

    #[test]
    fn empty_content_reports_ocr_failed() {
        let record = ConvertOutcome::converted("blank.pdf", "  \n".to_string());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["ocr_status"], "OCR failed");
    }

    #[test]
    fn failed_record_wire_shape() {
        let record = ConvertOutcome::failed("bad.xyz", "Unsupported file type: 'xyz'");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "filename": "bad.xyz",
                "error": "Unsupported file type: 'xyz'",
            })
        );
    }

    #[test]
    fn outcome_accessors_cover_both_variants() {
        let ok = ConvertOutcome::converted("a.txt", "text".to_string());
        let bad = ConvertOutcome::failed("b.txt", "boom");
        assert_eq!(ok.filename(), "a.txt");
        assert_eq!(bad.filename(), "b.txt");
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }

    #[test]
    fn envelope_wraps_results_array() {
        let envelope = ResultsEnvelope::new(vec![ParsedRecord {
            filename: "a.pdf".into(),
            parsed_content: "text".into(),
        }]);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["results"][0]["parsed_content"], "text");
    }

    #[test]
    fn empty_envelope_serialises_to_empty_array() {
        let envelope: ResultsEnvelope<ConvertOutcome> = ResultsEnvelope::new(vec![]);
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"results":[]}"#
        );
    }
}
