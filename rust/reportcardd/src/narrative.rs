//! AI narrative report.
//!
//! Composes the counsellor prompt from the record, sends it to a text
//! generation service and tracks the outcome as a small session state
//! machine. Any failure is reported the same way and may be retried by the
//! caller; nothing here retries on its own.

use crate::config::Args;
use crate::metrics::{self, TrendDirection};
use crate::model::{StudentRecord, Subject};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shown to the user for every failure kind.
pub const FAILURE_MESSAGE: &str =
    "متاسفانه در دریافت تحلیل هوشمند خطایی رخ داد. لطفاً دوباره تلاش کنید.";

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("no API key configured for the text generation service")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service responded with status {0}")]
    Status(u16),
    #[error("response did not contain generated text")]
    MissingText,
}

pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, NarrativeError>;
}

/// Client for a `generateContent` style endpoint.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    temperature: f64,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn from_args(args: &Args) -> Result<Self, NarrativeError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: args.ai_endpoint.clone(),
            api_key: args.ai_api_key.clone().filter(|k| !k.trim().is_empty()),
            temperature: args.ai_temperature,
            max_output_tokens: args.ai_max_output_tokens,
        })
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(NarrativeError::MissingApiKey);
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&request_body(prompt, self.temperature, self.max_output_tokens))
            .send()
            .map_err(|e| NarrativeError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NarrativeError::Status(status.as_u16()));
        }

        let body: Value = resp
            .json()
            .map_err(|e| NarrativeError::Transport(e.without_url().to_string()))?;
        extract_text(&body)
    }
}

pub fn request_body(prompt: &str, temperature: f64, max_output_tokens: u32) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": temperature,
            "maxOutputTokens": max_output_tokens,
        }
    })
}

pub fn extract_text(body: &Value) -> Result<String, NarrativeError> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .ok_or(NarrativeError::MissingText)
}

fn subject_list(subjects: &[&Subject]) -> String {
    subjects
        .iter()
        .map(|s| format!("{} (تراز: {})", s.name, s.taz))
        .collect::<Vec<_>>()
        .join("، ")
}

fn trend_label(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Rising => "صعودی",
        TrendDirection::Falling => "نزولی",
        TrendDirection::Unknown => "نامشخص",
    }
}

pub fn build_prompt(record: &StudentRecord) -> String {
    let top = subject_list(&metrics::top_subjects(&record.subjects, 3));
    let weak = subject_list(&metrics::weakest_subjects(&record.subjects, 3));
    let trend = trend_label(metrics::trend_direction(&record.exams));
    let completed = record.completed_exams().len();
    let totals = metrics::answer_totals(&record.subjects);

    format!(
        "تو یک مشاور تحصیلی حرفه‌ای هستی. یک دانش‌آموز کنکور با مشخصات زیر را تحلیل کن و گزارش جامعی ارائه بده:

نام دانش‌آموز: {name}
تراز کل فعلی: {total}
میانگین تراز: {average}
رتبه کشوری: {rank}
لیگ فعلی: {league}
روند کلی: {trend}

بهترین دروس: {top}
ضعیف‌ترین دروس: {weak}

تعداد آزمون‌های شرکت کرده: {completed}
تعداد غیبت: {absences}

کل پاسخ‌های صحیح: {correct}
کل پاسخ‌های غلط: {wrong}
کل پاسخ‌های خالی: {blank}

لطفاً گزارش تحلیلی کامل و جامع به فارسی ارائه بده که شامل:
1. تحلیل وضعیت کلی
2. نقاط قوت (با ذکر دقیق دروس و آمار)
3. نقاط ضعف و چالش‌ها
4. پیشنهادات عملی برای بهبود
5. استراتژی‌های خاص برای هر درس ضعیف
6. برنامه عملیاتی کوتاه‌مدت و بلندمدت

گزارش باید جامع، دقیق، حرفه‌ای و انگیزه‌بخش باشد.
",
        name = record.name,
        total = record.total_taz,
        average = record.average_taz,
        rank = record.rank.country,
        league = record.league.as_str(),
        trend = trend,
        top = top,
        weak = weak,
        completed = completed,
        absences = record.absence_count,
        correct = totals.correct,
        wrong = totals.wrong,
        blank = totals.blank,
    )
}

#[derive(Debug, Clone, PartialEq)]
enum NarrativeState {
    Idle,
    Loading { id: Uuid },
    Ready { id: Uuid, text: String },
    Failed { id: Uuid, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeSnapshot {
    pub state: &'static str,
    pub generation_id: Option<String>,
    pub loading: bool,
    pub text: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct NarrativeSession {
    state: NarrativeState,
}

impl Default for NarrativeSession {
    fn default() -> Self {
        Self {
            state: NarrativeState::Idle,
        }
    }
}

impl NarrativeSession {
    /// Clears any previous text or error and returns the id of the new generation.
    pub fn begin(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        self.state = NarrativeState::Loading { id };
        id
    }

    fn current_id(&self) -> Option<Uuid> {
        match &self.state {
            NarrativeState::Idle => None,
            NarrativeState::Loading { id }
            | NarrativeState::Ready { id, .. }
            | NarrativeState::Failed { id, .. } => Some(*id),
        }
    }

    /// Lands a result. Returns false when `id` is no longer the current generation.
    pub fn complete(&mut self, id: Uuid, outcome: &Result<String, NarrativeError>) -> bool {
        if self.current_id() != Some(id) {
            debug!(generation = %id, "dropping stale narrative result");
            return false;
        }
        self.state = match outcome {
            Ok(text) => NarrativeState::Ready {
                id,
                text: text.clone(),
            },
            Err(_) => NarrativeState::Failed {
                id,
                message: FAILURE_MESSAGE.to_string(),
            },
        };
        true
    }

    pub fn snapshot(&self) -> NarrativeSnapshot {
        let (state, text, error) = match &self.state {
            NarrativeState::Idle => ("idle", None, None),
            NarrativeState::Loading { .. } => ("loading", None, None),
            NarrativeState::Ready { text, .. } => ("ready", Some(text.clone()), None),
            NarrativeState::Failed { message, .. } => ("failed", None, Some(message.clone())),
        };
        NarrativeSnapshot {
            state,
            generation_id: self.current_id().map(|id| id.to_string()),
            loading: matches!(self.state, NarrativeState::Loading { .. }),
            text,
            error,
        }
    }
}

/// Runs one generation to completion against `generator`.
pub fn generate(
    session: &mut NarrativeSession,
    generator: &dyn TextGenerator,
    record: &StudentRecord,
) -> Result<String, NarrativeError> {
    let id = session.begin();
    let prompt = build_prompt(record);
    info!(generation = %id, prompt_chars = prompt.chars().count(), "requesting narrative");

    let outcome = generator.generate(&prompt);
    if let Err(e) = &outcome {
        warn!(generation = %id, error = %e, "narrative generation failed");
    }
    session.complete(id, &outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::seed_record;
    use std::cell::RefCell;

    struct Canned(Result<&'static str, ()>);

    impl TextGenerator for Canned {
        fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
            self.0
                .map(|s| s.to_string())
                .map_err(|_| NarrativeError::Transport("connection refused".to_string()))
        }
    }

    struct Recording(RefCell<Vec<String>>);

    impl TextGenerator for Recording {
        fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
            self.0.borrow_mut().push(prompt.to_string());
            Ok("ok".to_string())
        }
    }

    #[test]
    fn prompt_carries_ranked_subjects_and_totals() {
        let record = seed_record();
        let prompt = build_prompt(&record);
        let top = subject_list(&metrics::top_subjects(&record.subjects, 3));
        assert!(prompt.contains(&format!("بهترین دروس: {}", top)));
        assert!(prompt.contains("(تراز: 12654)"));
        assert!(prompt.contains("روند کلی: صعودی"));
        assert!(prompt.contains("تعداد آزمون‌های شرکت کرده: 3"));
        assert!(prompt.contains("لیگ فعلی: Silver"));
    }

    #[test]
    fn generator_receives_composed_prompt() {
        let record = seed_record();
        let gen = Recording(RefCell::new(Vec::new()));
        let mut session = NarrativeSession::default();
        generate(&mut session, &gen, &record).expect("generate");
        assert_eq!(gen.0.borrow().as_slice(), &[build_prompt(&record)]);
    }

    #[test]
    fn failure_clears_loading_and_shows_no_text() {
        let record = seed_record();
        let mut session = NarrativeSession::default();
        generate(&mut session, &Canned(Ok("گزارش")), &record).expect("first run");
        assert_eq!(session.snapshot().text.as_deref(), Some("گزارش"));

        assert!(generate(&mut session, &Canned(Err(())), &record).is_err());
        let snap = session.snapshot();
        assert_eq!(snap.state, "failed");
        assert!(!snap.loading);
        assert_eq!(snap.text, None);
        assert_eq!(snap.error.as_deref(), Some(FAILURE_MESSAGE));
    }

    #[test]
    fn stale_result_does_not_land() {
        let mut session = NarrativeSession::default();
        let old = session.begin();
        let current = session.begin();
        assert!(!session.complete(old, &Ok("old".to_string())));
        assert!(session.snapshot().loading);
        assert!(session.complete(current, &Ok("new".to_string())));
        assert_eq!(session.snapshot().text.as_deref(), Some("new"));
    }

    #[test]
    fn response_without_text_is_an_error() {
        let good = json!({ "candidates": [{ "content": { "parts": [{ "text": "سلام" }] } }] });
        assert_eq!(extract_text(&good).expect("text"), "سلام");
        assert!(matches!(
            extract_text(&json!({ "candidates": [] })),
            Err(NarrativeError::MissingText)
        ));
    }

    #[test]
    fn request_body_has_generation_config() {
        let body = request_body("p", 0.7, 2048);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "p");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }
}
