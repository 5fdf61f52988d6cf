// src/app.rs
use std::path::PathBuf;

use crate::article::html::inspect_html;
use crate::article::{ArticleFetcher, ArticleInput, ContentKind};
use crate::extraction::{self, GeminiClient, GenerativeModel};
use crate::records::{filter_records, PriceRecord, RecordField, RecordStore};
use crate::sheets::{default_title, BrowserTokenProvider, SheetsSession, StaticTokenProvider, TokenProvider};
use crate::storage::{today_iso, CredentialStore, GoogleCreds, StorageManager};
use crate::utils::config::Settings;
use crate::utils::error::AppError;
use crate::utils::html_debug;

/// Session state: the working record set plus the collaborators that fill and export it.
///
/// Every operation takes `&mut self`, so one extraction finishes before the next starts.
pub struct App {
    settings: Settings,
    fetcher: ArticleFetcher,
    model: Option<Box<dyn GenerativeModel>>,
    storage: StorageManager,
    credentials: CredentialStore,
    creds: Option<GoogleCreds>,
    sheets: Option<SheetsSession>,
    store: RecordStore,
    summary: Option<String>,
    source: Option<ContentKind>,
    filter: String,
    debug: bool,
}

impl App {
    pub fn new(
        settings: Settings,
        storage: StorageManager,
        credentials: CredentialStore,
    ) -> Result<Self, AppError> {
        let fetcher = ArticleFetcher::new(settings.proxy_url.clone())
            .map_err(|e| AppError::Config(format!("Could not build HTTP client: {}", e)))?;

        // A missing key only matters once an extraction is requested.
        let model = match GeminiClient::from_settings(&settings) {
            Ok(client) => {
                tracing::info!("Using model {}", client.model());
                Some(Box::new(client) as Box<dyn GenerativeModel>)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };

        let creds = credentials.load();
        if creds.as_ref().map_or(true, |c| !c.is_configured()) {
            tracing::warn!("Google Sheets integration is disabled until credentials are provided.");
        }

        Ok(Self {
            settings,
            fetcher,
            model,
            storage,
            credentials,
            creds,
            sheets: None,
            store: RecordStore::new(),
            summary: None,
            source: None,
            filter: String::new(),
            debug: false,
        })
    }

    #[cfg(test)]
    pub fn with_model(mut self, model: Box<dyn GenerativeModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn records(&self) -> &[PriceRecord] {
        self.store.records()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_string();
    }

    /// Records matching the current filter, in store order.
    pub fn filtered(&self) -> Vec<&PriceRecord> {
        filter_records(self.store.records(), &self.filter)
    }

    /// Fetches (for URLs), extracts and replaces the working set.
    ///
    /// An accepted response without records yields `NoDataExtracted`; its summary is kept.
    pub async fn submit(&mut self, input: ArticleInput) -> Result<(), AppError> {
        self.store.clear();
        self.summary = None;
        self.source = None;

        let kind = input.kind();
        let model = match self.model.as_deref() {
            Some(model) => model,
            None => {
                self.settings.require_api_key()?;
                return Err(AppError::Config("No model client configured".to_string()));
            }
        };

        let content = match input {
            ArticleInput::Url(url) => {
                let html = self.fetcher.fetch_article_html(&url).await?;
                let preview = inspect_html(&html);
                tracing::info!(
                    "Fetched article: {} (published: {}, {} chars of text)",
                    preview.title.as_deref().unwrap_or("untitled"),
                    preview.published_at.as_deref().unwrap_or("unknown"),
                    preview.body_text.chars().count()
                );
                if self.debug {
                    let debug_dir = self.storage.base_dir().join("debug");
                    if let Err(e) = html_debug::save_article_debug(&debug_dir, &html, &preview) {
                        tracing::warn!("Failed to save debug article: {}", e);
                    }
                }
                html
            }
            ArticleInput::Text(text) => text,
        };

        let result =
            extraction::extract_prices(model, &content, kind, self.settings.temperature).await?;

        self.summary = result.summary.clone();
        self.source = Some(kind);

        if !result.has_records() {
            tracing::warn!("Extraction returned no records");
            return Err(AppError::NoDataExtracted);
        }
        self.store.replace_all(result.records);
        tracing::info!("Extracted {} records", self.store.len());
        Ok(())
    }

    /// Applies one cell edit; invalid input is ignored.
    pub fn edit(&mut self, id: u64, field: RecordField, raw_value: &str) -> bool {
        let changed = self.store.edit_field(id, field, raw_value);
        if changed {
            tracing::debug!("Edited record: {:?}", self.store.get(id));
        }
        changed
    }

    /// Exports the filtered view. `None` when the view is empty.
    pub fn export_csv(&self) -> Result<Option<PathBuf>, AppError> {
        Ok(self.storage.save_csv(&self.filtered())?)
    }

    /// Saves summary and records of the last extraction, if it produced anything.
    pub fn save_snapshot(&self) -> Result<Option<PathBuf>, AppError> {
        let Some(source) = self.source else {
            return Ok(None);
        };
        let path = self
            .storage
            .save_extraction_snapshot(self.summary.as_deref(), self.store.records(), source)?;
        Ok(Some(path))
    }

    pub fn is_sheets_configured(&self) -> bool {
        self.creds.as_ref().is_some_and(GoogleCreds::is_configured)
    }

    /// Persists a new client id; the next Sheets save signs in again.
    pub fn save_credentials(&mut self, client_id: &str) -> Result<(), AppError> {
        let creds = self.credentials.save(client_id)?;
        self.creds = Some(creds);
        self.sheets = None;
        Ok(())
    }

    /// Writes every record (not just the filtered view) to a new spreadsheet.
    pub async fn save_to_sheets(&mut self, title: Option<&str>) -> Result<String, AppError> {
        let creds = match &self.creds {
            Some(creds) if creds.is_configured() => creds.clone(),
            _ => return Err(AppError::SheetsAuthRequired),
        };
        if self.store.is_empty() {
            return Err(AppError::InputValidation(
                "There is no data to save to Google Sheets.".to_string(),
            ));
        }
        let title = title.map(str::to_string).unwrap_or_else(|| default_title(&today_iso()));

        if self.sheets.is_none() {
            let session = SheetsSession::initialize(creds, self.token_provider())?
                .with_base_url(self.settings.sheets_base_url.clone());
            self.sheets = Some(session);
        }
        let Some(session) = self.sheets.as_mut() else {
            return Err(AppError::SheetsAuthRequired);
        };

        if !session.is_signed_in() {
            session.request_access_token().await?;
        }
        Ok(session.create_spreadsheet(&title, self.store.records()).await?)
    }

    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        if let Some(session) = self.sheets.as_mut() {
            session.sign_out().await?;
        }
        Ok(())
    }

    fn token_provider(&self) -> Box<dyn TokenProvider> {
        match &self.settings.access_token {
            Some(token) => Box::new(StaticTokenProvider::new(token.clone())),
            None => Box::new(BrowserTokenProvider::new(self.settings.sign_in_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::testing::ScriptedModel;
    use tempfile::TempDir;

    const FULL_ANSWER: &str = r#"{
        "priceMovementSummary": "Giá heo hơi tăng nhẹ ở miền Bắc.",
        "extractedData": [
            {"date": "2024-01-01", "province": "Hà Nội", "price": 68500},
            {"date": "2024-01-01", "province": "Đồng Nai", "price": 67000}
        ]
    }"#;

    fn app_in(dir: &TempDir, settings: Settings, answer: &str) -> App {
        let storage = StorageManager::new(dir.path().join("out")).unwrap();
        let credentials = CredentialStore::at(dir.path().join("googleCreds.json"));
        App::new(settings, storage, credentials)
            .unwrap()
            .with_model(Box::new(ScriptedModel::answering(answer)))
    }

    #[tokio::test]
    async fn text_submission_fills_store_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, Settings::default(), FULL_ANSWER);

        app.submit(ArticleInput::from_text("Hà Nội 68.000 - 69.000").unwrap())
            .await
            .unwrap();

        assert_eq!(app.summary(), Some("Giá heo hơi tăng nhẹ ở miền Bắc."));
        assert_eq!(app.records().len(), 2);
        assert_eq!(app.records()[0].price, 68500);
    }

    #[tokio::test]
    async fn empty_records_is_soft_error_with_summary_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(
            &dir,
            Settings::default(),
            r#"{"extractedData": [], "priceMovementSummary": "Prices stable."}"#,
        );

        let err = app
            .submit(ArticleInput::from_text("x").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoDataExtracted));
        assert_eq!(app.summary(), Some("Prices stable."));
        assert!(app.records().is_empty());
    }

    #[tokio::test]
    async fn rejected_response_is_extraction_failure_and_clears_previous_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, Settings::default(), FULL_ANSWER);
        app.submit(ArticleInput::from_text("x").unwrap()).await.unwrap();

        app = app.with_model(Box::new(ScriptedModel::answering(r#"{"foo": 1}"#)));
        let err = app
            .submit(ArticleInput::from_text("y").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ExtractionFailed(_)));
        assert!(app.records().is_empty());
        assert!(app.summary().is_none());
    }

    #[tokio::test]
    async fn url_submission_fetches_through_proxy_and_uses_html_prompt() {
        let mut server = mockito::Server::new_async().await;
        let fetch = server
            .mock("GET", "/fetch/https://example.vn/gia-heo")
            .with_status(200)
            .with_body("<html><head><title>Giá heo</title></head><body>Hà Nội 68.000</body></html>")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            proxy_url: format!("{}/fetch/", server.url()),
            ..Settings::default()
        };
        let mut app = app_in(&dir, settings, FULL_ANSWER).with_debug(true);

        app.submit(ArticleInput::from_url("https://example.vn/gia-heo").unwrap())
            .await
            .unwrap();

        fetch.assert_async().await;
        assert_eq!(app.records().len(), 2);
        assert!(dir.path().join("out").join("debug").join("article.txt").exists());
    }

    #[tokio::test]
    async fn fetch_failure_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fetch/https://example.vn/x")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            proxy_url: format!("{}/fetch/", server.url()),
            ..Settings::default()
        };
        let mut app = app_in(&dir, settings, FULL_ANSWER);

        let err = app
            .submit(ArticleInput::from_url("https://example.vn/x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FetchFailed(msg) if msg.contains("Status: 500")));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let credentials = CredentialStore::at(dir.path().join("googleCreds.json"));
        let mut app = App::new(Settings::default(), storage, credentials).unwrap();

        let err = app
            .submit(ArticleInput::from_text("x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn filter_edit_and_export_work_on_the_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, Settings::default(), FULL_ANSWER);
        app.submit(ArticleInput::from_text("x").unwrap()).await.unwrap();

        let id = app.records()[1].id;
        assert!(app.edit(id, RecordField::Price, "72"));
        assert!(!app.edit(id, RecordField::Price, "abc"));
        assert_eq!(app.records()[1].price, 72000);

        app.set_filter("72");
        assert_eq!(app.filtered().len(), 1);

        let path = app.export_csv().unwrap().unwrap();
        let csv = std::fs::read_to_string(path).unwrap();
        assert!(csv.ends_with("2024-01-01,Đồng Nai,72"));
        assert!(!csv.contains("Hà Nội"));

        app.set_filter("no such province");
        assert!(app.export_csv().unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_is_written_after_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, Settings::default(), FULL_ANSWER);
        assert!(app.save_snapshot().unwrap().is_none());

        app.submit(ArticleInput::from_text("x").unwrap()).await.unwrap();
        let path = app.save_snapshot().unwrap().unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("Đồng Nai"));
    }

    #[tokio::test]
    async fn sheets_save_requires_configuration_then_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, Settings::default(), FULL_ANSWER);

        assert!(!app.is_sheets_configured());
        assert!(matches!(
            app.save_to_sheets(None).await,
            Err(AppError::SheetsAuthRequired)
        ));

        app.save_credentials("123.apps.googleusercontent.com").unwrap();
        assert!(app.is_sheets_configured());
        assert!(matches!(
            app.save_to_sheets(None).await,
            Err(AppError::InputValidation(msg)) if msg.contains("no data")
        ));
    }

    #[tokio::test]
    async fn sheets_save_signs_in_then_writes_all_records() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/spreadsheets")
            .match_header("authorization", "Bearer env-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"spreadsheetId": "s1", "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/s1/edit"}"#)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/spreadsheets/s1/values/A1")
            .match_query(mockito::Matcher::Any)
            .match_body(mockito::Matcher::Regex("Đồng Nai".to_string()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            sheets_base_url: server.url(),
            access_token: Some("env-token".to_string()),
            ..Settings::default()
        };
        let mut app = app_in(&dir, settings, FULL_ANSWER);
        app.save_credentials("123.apps.googleusercontent.com").unwrap();
        app.submit(ArticleInput::from_text("x").unwrap()).await.unwrap();
        // Filter does not limit what goes to Sheets.
        app.set_filter("Hà");

        let url = app.save_to_sheets(Some("Giá heo tuần 1")).await.unwrap();
        assert_eq!(url, "https://docs.google.com/spreadsheets/d/s1/edit");
        update.assert_async().await;
    }

    #[tokio::test]
    async fn saved_credentials_are_loaded_by_the_next_session() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut app = app_in(&dir, Settings::default(), FULL_ANSWER);
            app.save_credentials("abc.apps.googleusercontent.com").unwrap();
        }
        let app = app_in(&dir, Settings::default(), FULL_ANSWER);
        assert!(app.is_sheets_configured());
    }
}
