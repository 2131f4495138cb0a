//! Client-side state of one page visit: the last analysis, the pattern being
//! edited, the generated paper text, and which requests are in flight.
//!
//! The pattern is sent back exactly as the service produced it until the user
//! edits a row; only then is the editable view serialized in its place.

use std::collections::HashSet;
use std::fmt;

use serde_json::{json, Value};

use crate::api::{AnalysisResult, ChatAction, ChatResponse, Endpoint, GenerateRequest};
use crate::error::{ClientError, ClientResult};
use crate::pattern::{merge_patch, PaperPattern};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Analyze,
    Generate,
    Download,
    Chat,
}

impl RequestKind {
    pub fn endpoint(self) -> Endpoint {
        match self {
            RequestKind::Analyze => Endpoint::Analyze,
            RequestKind::Generate => Endpoint::Generate,
            RequestKind::Download => Endpoint::DownloadPdf,
            RequestKind::Chat => Endpoint::Chat,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Analyze => "analyze",
            RequestKind::Generate => "generate",
            RequestKind::Download => "download",
            RequestKind::Chat => "chat",
        })
    }
}

/// What a chat reply did to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatOutcome {
    Reply,
    PatternUpdated,
    SuggestRegenerate,
}

#[derive(Debug, Default)]
pub struct Session {
    analysis: Option<AnalysisResult>,
    /// Last pattern received from `/analyze` or a chat patch.
    pattern_raw: Option<Value>,
    pattern: Option<PaperPattern>,
    pattern_edited: bool,
    paper_text: Option<String>,
    in_flight: HashSet<RequestKind>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `kind` as running. At most one request of each kind may be in
    /// flight; a second one is refused until [`Session::finish`].
    pub fn try_begin(&mut self, kind: RequestKind) -> ClientResult<()> {
        if !self.in_flight.insert(kind) {
            return Err(ClientError::Busy(kind));
        }
        Ok(())
    }

    pub fn finish(&mut self, kind: RequestKind) {
        self.in_flight.remove(&kind);
    }

    pub fn is_busy(&self, kind: RequestKind) -> bool {
        self.in_flight.contains(&kind)
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    /// Store a fresh analysis. Earlier pattern edits and paper text belong to
    /// the old analysis and are dropped.
    pub fn set_analysis(&mut self, result: AnalysisResult) {
        self.adopt_pattern(result.paper_pattern.clone());
        self.paper_text = None;
        self.analysis = Some(result);
    }

    fn adopt_pattern(&mut self, raw: Option<Value>) {
        self.pattern = match raw.as_ref().filter(|p| !p.is_null()) {
            Some(raw) => match PaperPattern::from_value(raw) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    log::warn!("pattern is not editable, sending it as received: {err}");
                    None
                }
            },
            None => None,
        };
        self.pattern_raw = raw;
        self.pattern_edited = false;
    }

    pub fn pattern(&self) -> Option<&PaperPattern> {
        self.pattern.as_ref()
    }

    /// Run a row edit against the pattern. Only an edit that succeeds marks
    /// the pattern as changed.
    pub fn edit_pattern<R>(
        &mut self,
        edit: impl FnOnce(&mut PaperPattern) -> ClientResult<R>,
    ) -> ClientResult<R> {
        let pattern = self
            .pattern
            .as_mut()
            .ok_or(ClientError::MissingInput("paper pattern"))?;
        let out = edit(pattern)?;
        self.pattern_edited = true;
        Ok(out)
    }

    /// The pattern to send: the edited view once the user changed a row,
    /// otherwise the last one received.
    pub fn pattern_value(&self) -> Option<Value> {
        match &self.pattern {
            Some(pattern) if self.pattern_edited => Some(pattern.to_value()),
            _ => self.pattern_raw.clone(),
        }
    }

    pub fn generate_request(&self, api_key: &str) -> Option<GenerateRequest> {
        let analysis = self.analysis.as_ref()?;
        Some(GenerateRequest {
            api_key: api_key.to_owned(),
            allocation: analysis.default_allocation.clone(),
            paper_pattern: self.pattern_value(),
            priority_scores: analysis.priority_scores.clone(),
        })
    }

    pub fn paper_text(&self) -> Option<&str> {
        self.paper_text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn set_paper_text(&mut self, text: String) {
        self.paper_text = Some(text);
    }

    /// Context object the chat assistant sees.
    pub fn chat_context(&self) -> Value {
        let Some(analysis) = &self.analysis else {
            return json!({});
        };
        json!({
            "syllabus_topics": analysis.syllabus_topics,
            "priority_scores": analysis.priority_scores,
            "paper_pattern": self.pattern_value(),
        })
    }

    /// Fold a chat reply into the session. A pattern update is applied as a
    /// merge patch onto the pattern currently being sent.
    pub fn apply_chat(&mut self, reply: &ChatResponse) -> ChatOutcome {
        match reply.action() {
            Some(ChatAction::UpdatePattern(patch)) => {
                let mut value = self.pattern_value().unwrap_or(Value::Null);
                merge_patch(&mut value, &patch);
                self.adopt_pattern(Some(value));
                ChatOutcome::PatternUpdated
            }
            Some(ChatAction::RegenerateSuggestion) => ChatOutcome::SuggestRegenerate,
            Some(ChatAction::Unknown(action)) => {
                log::debug!("ignoring chat action `{action}`");
                ChatOutcome::Reply
            }
            None => ChatOutcome::Reply,
        }
    }
}
