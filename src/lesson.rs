//! Lesson generation client.
//!
//! Thin HTTP client for the backend's lesson endpoint; the transcription
//! session carries the speech, this fetches the study material around it.

use crate::config::LessonConfig;
use crate::error::{LinguaError, Result};
use serde::{Deserialize, Serialize};

/// Request body for lesson generation.
#[derive(Debug, Clone, Serialize)]
pub struct LessonRequest {
    pub language: String,
    pub difficulty: String,
}

/// One vocabulary item within a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub word: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub translation: String,
}

/// A generated lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub cultural_note: String,
    #[serde(default)]
    pub vocabulary: Vec<VocabEntry>,
}

/// Client for the lesson endpoint.
pub struct LessonClient {
    base_url: String,
    client: reqwest::Client,
}

impl LessonClient {
    pub fn new(config: &LessonConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| LinguaError::Lesson {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Generate a lesson for the given language and difficulty.
    pub async fn generate(&self, language: &str, difficulty: &str) -> Result<Lesson> {
        let url = format!("{}/api/lesson/generate", self.base_url);
        let request = LessonRequest {
            language: language.to_string(),
            difficulty: difficulty.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LinguaError::Lesson {
                message: format!("Request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LinguaError::Lesson {
                message: format!("Server returned {}: {}", status, body),
            });
        }

        response.json::<Lesson>().await.map_err(|e| LinguaError::Lesson {
            message: format!("Invalid lesson response: {}", e),
        })
    }
}
