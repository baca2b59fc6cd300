use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Config;
use crate::question::{Category, CategoryId, Difficulty, QuestionRecord, UserProgress};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Which question set to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionQuery {
    pub category: CategoryId,
    pub difficulty: Option<Difficulty>,
}

impl QuestionQuery {
    pub fn new(category: CategoryId) -> Self {
        Self {
            category,
            difficulty: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn path(&self) -> String {
        match self.difficulty {
            Some(d) => format!("quiz/questions/{}/{}", self.category, d),
            None => format!("quiz/questions/{}", self.category),
        }
    }
}

/// Remote operations the quiz client depends on
pub trait QuizApi: Send + Sync {
    fn categories(&self) -> Result<Vec<Category>, ApiError>;
    fn questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionRecord>, ApiError>;
    /// Add a finished session to the user's progress. The response body is ignored.
    fn submit_progress(&self, score: u32, problem_solved: bool) -> Result<(), ApiError>;
    fn dashboard(&self) -> Result<UserProgress, ApiError>;
}

impl<T: QuizApi + ?Sized> QuizApi for Arc<T> {
    fn categories(&self) -> Result<Vec<Category>, ApiError> {
        (**self).categories()
    }

    fn questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionRecord>, ApiError> {
        (**self).questions(query)
    }

    fn submit_progress(&self, score: u32, problem_solved: bool) -> Result<(), ApiError> {
        (**self).submit_progress(score, problem_solved)
    }

    fn dashboard(&self) -> Result<UserProgress, ApiError> {
        (**self).dashboard()
    }
}

/// Blocking HTTP client for the learning platform's REST API
#[derive(Debug, Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpQuizApi {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.api_base_url.clone(),
            config.token.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.authorize(self.client.get(&url)).send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json()?)
    }
}

impl QuizApi for HttpQuizApi {
    fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("quiz/categories")
    }

    fn questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionRecord>, ApiError> {
        self.get_json(&query.path())
    }

    fn submit_progress(&self, score: u32, problem_solved: bool) -> Result<(), ApiError> {
        let url = self.url("user/progress");
        tracing::debug!(%url, score, problem_solved, "POST");
        let response = self
            .authorize(self.client.post(&url))
            .query(&[
                ("score", score.to_string()),
                ("problemSolved", problem_solved.to_string()),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(())
    }

    fn dashboard(&self) -> Result<UserProgress, ApiError> {
        self.get_json("user/dashboard")
    }
}
