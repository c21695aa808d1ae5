use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use exam_core::model::{
    AnswerValue, Answers, AttemptId, ExamPaper, ExamResult, Level, ModuleKind, Question,
    QuestionDraft, QuestionId, SeriesId,
};

use crate::error::ApiError;

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// Answers of a free-response attempt sent to the external grading service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingRequest {
    pub series_id: SeriesId,
    pub module_kind: ModuleKind,
    pub items: Vec<GradingItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingItem {
    pub question_id: QuestionId,
    pub prompt: String,
    pub answer: Option<AnswerValue>,
}

impl GradingRequest {
    #[must_use]
    pub fn new(
        series_id: SeriesId,
        module_kind: ModuleKind,
        questions: &[Question],
        answers: &Answers,
    ) -> Self {
        let items = questions
            .iter()
            .map(|q| GradingItem {
                question_id: q.id(),
                prompt: q.prompt().to_owned(),
                answer: answers.get(q.id()).cloned(),
            })
            .collect();
        Self {
            series_id,
            module_kind,
            items,
        }
    }
}

/// Body of the one-shot attempt submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptSubmission {
    pub series_id: SeriesId,
    pub score: u32,
    pub level: Level,
    pub elapsed_seconds: u32,
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

impl AttemptSubmission {
    #[must_use]
    pub fn from_result(result: &ExamResult) -> Self {
        let answers = result
            .answers()
            .iter()
            .map(|(question_id, value)| SubmittedAnswer {
                question_id,
                value: value.clone(),
            })
            .collect();
        Self {
            series_id: result.series_id(),
            score: result.score(),
            level: result.level(),
            elapsed_seconds: result.elapsed_seconds(),
            answers,
        }
    }
}

/// Remote collaborator providing exam content, free-response grading and attempt storage.
#[async_trait]
pub trait ExamApi: Send + Sync {
    /// Load the questions and timing for a series.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or invalid content.
    async fn fetch_exam(&self, series_id: SeriesId) -> Result<ExamPaper, ApiError>;

    /// Grade free-response answers; returns a score on the 0–699 scale.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when grading is unavailable or fails.
    async fn grade(&self, request: &GradingRequest) -> Result<u32, ApiError>;

    /// Persist a finalized attempt remotely.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or rejected submissions.
    async fn submit_attempt(&self, submission: &AttemptSubmission)
    -> Result<AttemptId, ApiError>;
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct ExamApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ExamApiConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_API_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let token = env::var("EXAM_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Some(Self { base_url, token })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Clone)]
pub struct HttpExamApi {
    client: Client,
    config: Option<ExamApiConfig>,
}

impl HttpExamApi {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ExamApiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ExamApiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&ExamApiConfig, ApiError> {
        self.config.as_ref().ok_or(ApiError::Disabled)
    }

    fn authorized(
        &self,
        config: &ExamApiConfig,
        request: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        match &config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ExamApi for HttpExamApi {
    async fn fetch_exam(&self, series_id: SeriesId) -> Result<ExamPaper, ApiError> {
        let config = self.config()?;
        let url = config.endpoint(&format!("series/{series_id}/exam"));

        let response = self
            .authorized(config, self.client.get(url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let body: ExamPayload = response.json().await?;
        body.into_paper(series_id)
    }

    async fn grade(&self, request: &GradingRequest) -> Result<u32, ApiError> {
        let config = self.config()?;
        let url = config.endpoint("grading");

        let response = self
            .authorized(config, self.client.post(url))
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let body: GradeResponse = response.json().await?;
        Ok(body.score)
    }

    async fn submit_attempt(
        &self,
        submission: &AttemptSubmission,
    ) -> Result<AttemptId, ApiError> {
        let config = self.config()?;
        let url = config.endpoint("attempts");

        let response = self
            .authorized(config, self.client.post(url))
            .json(submission)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let body: SubmitResponse = response.json().await?;
        let attempt_id = body.attempt_id.trim();
        if attempt_id.is_empty() {
            return Err(ApiError::InvalidPayload("empty attempt_id".into()));
        }
        Ok(AttemptId::new(attempt_id))
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct ExamPayload {
    questions: Vec<QuestionDraft>,
    allotted_seconds: u32,
    module_kind: ModuleKind,
}

impl ExamPayload {
    fn into_paper(self, series_id: SeriesId) -> Result<ExamPaper, ApiError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExamPaper {
            series_id,
            module_kind: self.module_kind,
            questions,
            allotted_seconds: self.allotted_seconds,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GradeResponse {
    score: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    attempt_id: String,
}
