//! Wire types for the paper service.
//!
//! Field names match the service exactly; the structs here are the whole
//! contract the client relies on. Analysis payloads are otherwise opaque and
//! are passed back to `/generate` as received.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

pub const DOWNLOAD_FILE_NAME: &str = "Question_Paper.pdf";

pub const FIELD_API_KEY: &str = "api_key";
pub const FIELD_SYLLABUS_TEXT: &str = "syllabus_text";
pub const FIELD_PYQ_FILES: &str = "pyq_files";
pub const FIELD_REFERENCE_FILE: &str = "reference_file";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Analyze,
    Generate,
    DownloadPdf,
    Chat,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Analyze => "/analyze",
            Endpoint::Generate => "/generate",
            Endpoint::DownloadPdf => "/download-pdf",
            Endpoint::Chat => "/chat",
        }
    }

    pub fn url(self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path())
    }
}

/// Inputs of the analyze form, generic over the browser's file handle so the
/// checks run without a DOM.
#[derive(Clone, Debug)]
pub struct AnalyzeForm<F> {
    pub api_key: String,
    pub syllabus_text: String,
    pub pyq_files: Vec<F>,
    pub reference_file: Option<F>,
}

impl<F> AnalyzeForm<F> {
    /// Reject the form before any request is made.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_key.is_empty() || self.syllabus_text.is_empty() || self.pyq_files.is_empty() {
            return Err(ClientError::MissingInput("API Key, Syllabus, PYQs"));
        }
        Ok(())
    }

    pub fn loading_text(&self) -> &'static str {
        if self.reference_file.is_some() {
            "Parsing Pattern & Analyzing..."
        } else {
            "Analyzing Syllabus & PYQs..."
        }
    }
}

/// Responses that may carry an `error` field instead of a result.
pub trait ServiceReply {
    fn error(&self) -> Option<&str>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub syllabus_topics: Map<String, Value>,
    #[serde(default)]
    pub priority_scores: Map<String, Value>,
    #[serde(default)]
    pub paper_pattern: Option<Value>,
    #[serde(default)]
    pub default_allocation: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceReply for AnalysisResult {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// What the results panel shows after a successful analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub topic_count: usize,
    pub pattern_detected: bool,
    pub priority_label: String,
}

impl AnalysisResult {
    pub fn summary(&self) -> AnalysisSummary {
        let pattern_detected = self.paper_pattern.as_ref().is_some_and(|p| !p.is_null());
        let priority_label = if pattern_detected {
            "Pattern Detected".to_owned()
        } else {
            format!("{} Priorities", self.priority_scores.len())
        };
        AnalysisSummary {
            topic_count: self.syllabus_topics.len(),
            pattern_detected,
            priority_label,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub api_key: String,
    pub allocation: Value,
    pub paper_pattern: Option<Value>,
    pub priority_scores: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub paper_text: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceReply for GenerateResponse {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub text_content: String,
    pub college_name: String,
    /// College logo as a `data:image/...;base64,` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    /// Free-form header lines; the service polishes them before printing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text_raw: Option<String>,
}

impl DownloadRequest {
    pub fn new(text_content: impl Into<String>, college_name: &str) -> Self {
        Self {
            text_content: text_content.into(),
            college_name: college_name.trim().to_owned(),
            header_image: None,
            header_text_raw: None,
        }
    }

    pub fn with_header_image(mut self, data_url: Option<String>) -> Self {
        self.header_image = data_url.filter(|url| !url.is_empty());
        self
    }

    /// Blank header text is treated as absent.
    pub fn with_header_text(mut self, text: &str) -> Self {
        let text = text.trim();
        self.header_text_raw = (!text.is_empty()).then(|| text.to_owned());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    pub api_key: String,
    pub message: String,
    pub context: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceReply for ChatResponse {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChatAction {
    /// Merge `data` into the working pattern.
    UpdatePattern(Value),
    RegenerateSuggestion,
    Unknown(String),
}

impl ChatResponse {
    pub fn action(&self) -> Option<ChatAction> {
        let action = self.action.as_deref()?;
        Some(match (action, &self.data) {
            ("update_pattern", Some(data)) => ChatAction::UpdatePattern(data.clone()),
            ("regenerate_suggestion", _) => ChatAction::RegenerateSuggestion,
            (other, _) => ChatAction::Unknown(other.to_owned()),
        })
    }
}

/// Turn a JSON reply into a typed result.
///
/// The body is parsed whatever the status, because the service reports
/// failures as `{"error": ...}` with a 4xx/5xx code. A body that does not
/// parse falls back to the status code.
pub fn decode_reply<T>(status: u16, body: &str) -> ClientResult<T>
where
    T: DeserializeOwned + ServiceReply,
{
    let ok = (200..300).contains(&status);
    let reply: T = match serde_json::from_str(body) {
        Ok(reply) => reply,
        Err(_) if !ok => return Err(ClientError::Status(status)),
        Err(err) => return Err(err.into()),
    };
    if let Some(message) = reply.error().filter(|m| !m.is_empty()) {
        return Err(ClientError::Remote(message.to_owned()));
    }
    if !ok {
        return Err(ClientError::Status(status));
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(api_key: &str, syllabus: &str, pyqs: usize, reference: bool) -> AnalyzeForm<u8> {
        AnalyzeForm {
            api_key: api_key.into(),
            syllabus_text: syllabus.into(),
            pyq_files: vec![0; pyqs],
            reference_file: reference.then_some(1),
        }
    }

    #[test]
    fn endpoint_urls() {
        let base = "https://host/api/";
        assert_eq!(Endpoint::Analyze.url(base), "https://host/api/analyze");
        assert_eq!(Endpoint::DownloadPdf.url("https://host/api"), "https://host/api/download-pdf");
    }

    #[test]
    fn form_requires_key_syllabus_and_pyqs() {
        assert!(form("k", "s", 1, false).validate().is_ok());
        for bad in [form("", "s", 1, false), form("k", "", 1, false), form("k", "s", 0, true)] {
            assert_eq!(
                bad.validate(),
                Err(ClientError::MissingInput("API Key, Syllabus, PYQs"))
            );
        }
    }

    #[test]
    fn loading_text_depends_on_reference() {
        assert_eq!(form("k", "s", 1, true).loading_text(), "Parsing Pattern & Analyzing...");
        assert_eq!(form("k", "s", 1, false).loading_text(), "Analyzing Syllabus & PYQs...");
    }

    #[test]
    fn summary_prefers_detected_pattern() {
        let mut result: AnalysisResult = serde_json::from_value(json!({
            "syllabus_topics": {"Unit 1": ["a"], "Unit 2": ["b"]},
            "priority_scores": {"a": 3, "b": 1, "c": 2},
            "default_allocation": {"Unit 1": 5}
        }))
        .unwrap();
        assert_eq!(
            result.summary(),
            AnalysisSummary {
                topic_count: 2,
                pattern_detected: false,
                priority_label: "3 Priorities".into(),
            }
        );
        result.paper_pattern = Some(json!({"sections": []}));
        assert_eq!(result.summary().priority_label, "Pattern Detected");
    }

    #[test]
    fn generate_request_wire_shape() {
        let req = GenerateRequest {
            api_key: "k".into(),
            allocation: json!({"Unit 1": 5}),
            paper_pattern: None,
            priority_scores: Map::new(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"api_key": "k", "allocation": {"Unit 1": 5}, "paper_pattern": null, "priority_scores": {}})
        );
    }

    #[test]
    fn download_request_trims_college() {
        let req = DownloadRequest::new("Q1", "  Govt College  ");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"text_content": "Q1", "college_name": "Govt College"})
        );
    }

    #[test]
    fn download_request_header_fields_only_when_set() {
        let blank = DownloadRequest::new("Q1", "Govt College")
            .with_header_image(Some(String::new()))
            .with_header_text("   ");
        let wire = serde_json::to_value(&blank).unwrap();
        assert!(wire.get("header_image").is_none());
        assert!(wire.get("header_text_raw").is_none());

        let logo = "data:image/png;base64,iVBORw0KGgo=";
        let req = DownloadRequest::new("Q1", "Govt College")
            .with_header_image(Some(logo.into()))
            .with_header_text(" Dept. of CSE\nMid-term ");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "text_content": "Q1",
                "college_name": "Govt College",
                "header_image": logo,
                "header_text_raw": "Dept. of CSE\nMid-term"
            })
        );
    }

    #[test]
    fn decode_surfaces_error_field() {
        let err = decode_reply::<GenerateResponse>(500, r#"{"error":"quota"}"#).unwrap_err();
        assert_eq!(err, ClientError::Remote("quota".into()));
        let err = decode_reply::<GenerateResponse>(200, r#"{"error":"bad key"}"#).unwrap_err();
        assert_eq!(err, ClientError::Remote("bad key".into()));
    }

    #[test]
    fn empty_error_field_is_not_a_failure() {
        let reply =
            decode_reply::<GenerateResponse>(200, r#"{"error":"","paper_text":"Q1"}"#).unwrap();
        assert_eq!(reply.paper_text, "Q1");
        let err = decode_reply::<GenerateResponse>(500, r#"{"error":""}"#).unwrap_err();
        assert_eq!(err, ClientError::Status(500));
    }

    #[test]
    fn decode_falls_back_to_status() {
        let err = decode_reply::<AnalysisResult>(502, "<html>gateway</html>").unwrap_err();
        assert_eq!(err, ClientError::Status(502));
        let err = decode_reply::<AnalysisResult>(404, "{}").unwrap_err();
        assert_eq!(err, ClientError::Status(404));
        assert!(matches!(
            decode_reply::<AnalysisResult>(200, "not json"),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn decode_ok() {
        let reply = decode_reply::<GenerateResponse>(200, r#"{"paper_text":"Q1. ..."}"#).unwrap();
        assert_eq!(reply.paper_text, "Q1. ...");
    }

    #[test]
    fn chat_actions() {
        let reply: ChatResponse = serde_json::from_value(json!({
            "reply": "done",
            "action": "update_pattern",
            "data": {"sections": []}
        }))
        .unwrap();
        assert_eq!(reply.action(), Some(ChatAction::UpdatePattern(json!({"sections": []}))));

        let reply: ChatResponse =
            serde_json::from_value(json!({"reply": "hi", "action": null})).unwrap();
        assert_eq!(reply.action(), None);

        let reply: ChatResponse =
            serde_json::from_value(json!({"reply": "hi", "action": "update_pattern"})).unwrap();
        assert_eq!(reply.action(), Some(ChatAction::Unknown("update_pattern".into())));
    }
}
