//! Free-text answers: checking them and shipping them to the answer log
//!
//! The answer log lives outside this crate (a small web endpoint). It is
//! strictly best-effort: nothing in the quest waits on it or changes behaviour
//! when it fails.

use serde::{Deserialize, Serialize};

/// One logged answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: u32,
    pub question: String,
    pub answer: String,
}

/// What the log endpoint said
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SinkResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SinkResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Append-only answer log
pub trait AnswerSink {
    fn submit(&mut self, record: AnswerRecord) -> SinkResponse;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AnswerSink for NullSink {
    fn submit(&mut self, _record: AnswerRecord) -> SinkResponse {
        SinkResponse::ok()
    }
}

/// Keeps submitted answers in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub records: Vec<AnswerRecord>,
    /// Answer every submission with this error instead of storing it
    pub fail_with: Option<String>,
}

impl AnswerSink for RecordingSink {
    fn submit(&mut self, record: AnswerRecord) -> SinkResponse {
        match &self.fail_with {
            Some(error) => SinkResponse::failed(error.clone()),
            None => {
                self.records.push(record);
                SinkResponse::ok()
            }
        }
    }
}

/// Fire-and-forget submission; failures are only logged
pub fn log_answer(sink: &mut dyn AnswerSink, question_id: u32, question: &str, answer: &str) {
    let response = sink.submit(AnswerRecord {
        question_id,
        question: question.to_string(),
        answer: answer.to_string(),
    });
    if !response.success {
        log::warn!(
            "Answer {} not logged: {}",
            question_id,
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
}

/// Trim, lowercase and collapse inner whitespace
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Does `answer` match any accepted form (case and spacing insensitive)?
pub fn matches_any(answer: &str, accepted: &[String]) -> bool {
    let answer = normalize(answer);
    !answer.is_empty() && accepted.iter().any(|a| normalize(a) == answer)
}

/// Login gate: any non-empty nickname plus an accepted secret answer
pub fn login_accepted(nickname: &str, secret: &str, accepted: &[String]) -> bool {
    !nickname.trim().is_empty() && matches_any(secret, accepted)
}
