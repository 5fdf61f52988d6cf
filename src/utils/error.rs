// src/utils/error.rs
use thiserror::Error;

/// Message shown for every extraction failure, whatever the underlying cause.
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to fetch or parse data from AI. The model may have returned an invalid format.";

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // DNS, refused connection, proxy down

    #[error("Failed to fetch article via proxy. Status: {}", format_status(.0))]
    Http(reqwest::StatusCode), // e.g., 403 from the target site, 500 from the proxy
}

fn format_status(status: &reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

impl FetchError {
    /// Message for the user. Connectivity failures point at text mode instead.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Network(_) => "Could not fetch the article. The public proxy service may be unavailable or blocked. \
                 You can try switching to text mode (--text / --text-file) and pasting the content directly."
                .to_string(),
            FetchError::Http(_) => self.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Model request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Model response is not valid JSON: {0}")]
    Malformed(String),

    #[error("Model response rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Google Sheets is not configured. Save a Google Client ID first.")]
    NotConfigured,

    #[error("Not signed in to Google")]
    AuthRequired,

    #[error("Google sign-in failed: {0}")]
    SignInFailed(String),

    #[error("Google integration unavailable: {0}")]
    IntegrationUnavailable(String),

    #[error("{0}")]
    SaveFailed(String),

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InputValidation(String),

    #[error("{0}")]
    FetchFailed(String),

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("The AI could not extract structured data. The article might not contain the expected price information.")]
    NoDataExtracted,

    #[error("Google Sheets is not configured. Run with --client-id <ID> (or `configure <ID>`) to save your Google Client ID.")]
    SheetsAuthRequired,

    #[error("{0}")]
    SheetsSaveFailed(String),

    #[error("Google integration unavailable: {0}")]
    IntegrationUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::FetchFailed(err.user_message())
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        tracing::error!("Extraction failed: {}", err);
        AppError::ExtractionFailed(EXTRACTION_FAILED_MESSAGE.to_string())
    }
}

impl From<SheetsError> for AppError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::NotConfigured => AppError::SheetsAuthRequired,
            SheetsError::IntegrationUnavailable(msg) => AppError::IntegrationUnavailable(msg),
            SheetsError::SaveFailed(msg) => AppError::SheetsSaveFailed(msg),
            other => AppError::SheetsSaveFailed(other.to_string()),
        }
    }
}

impl AppError {
    /// Soft errors leave partial results worth showing (e.g. a summary without records).
    pub fn is_soft(&self) -> bool {
        matches!(self, AppError::NoDataExtracted)
    }
}
