// src/article/models.rs
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// How the article content reached us, which decides the prompt variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Text,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Html => write!(f, "html"),
            ContentKind::Text => write!(f, "text"),
        }
    }
}

/// Validated user input: an article URL to fetch, or pasted article text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleInput {
    Url(String),
    Text(String),
}

impl ArticleInput {
    pub fn from_url(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InputValidation(
                "Please enter an article URL before submitting.".to_string(),
            ));
        }
        Url::parse(trimmed).map_err(|_| {
            AppError::InputValidation(
                "The entered text is not a valid URL. Please check and try again.".to_string(),
            )
        })?;
        Ok(ArticleInput::Url(trimmed.to_string()))
    }

    pub fn from_text(raw: &str) -> Result<Self, AppError> {
        if raw.trim().is_empty() {
            return Err(AppError::InputValidation(
                "Please paste some article content before submitting.".to_string(),
            ));
        }
        Ok(ArticleInput::Text(raw.to_string()))
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ArticleInput::Url(_) => ContentKind::Html,
            ArticleInput::Text(_) => ContentKind::Text,
        }
    }
}
