// src/sheets/client.rs
use serde::Deserialize;
use serde_json::json;

use crate::records::{display_price, PriceRecord};
use crate::sheets::auth::{AccessToken, ConsentPrompt, TokenProvider};
use crate::storage::GoogleCreds;
use crate::utils::config::DEFAULT_SHEETS_BASE_URL;
use crate::utils::error::SheetsError;

const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const UNKNOWN_SAVE_ERROR: &str = "An unknown error occurred while saving to Google Sheets.";
const SHEET_HEADER: [&str; 3] = ["Date", "Province", "Price (K VND/kg)"];

/// Title suggested for a new spreadsheet.
pub fn default_title(date: &str) -> String {
    format!("Hog Price Data - {}", date)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: Option<String>,
    spreadsheet_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Signed-in (or not yet signed-in) connection to Google Sheets for one set of credentials.
pub struct SheetsSession {
    creds: GoogleCreds,
    http_client: reqwest::Client,
    base_url: String,
    revoke_url: String,
    token_provider: Box<dyn TokenProvider>,
    token: Option<AccessToken>,
    // Survives sign-out, so a later sign-in skips the consent screen.
    granted_before: bool,
}

impl SheetsSession {
    pub fn initialize(
        creds: GoogleCreds,
        token_provider: Box<dyn TokenProvider>,
    ) -> Result<Self, SheetsError> {
        if !creds.is_configured() {
            return Err(SheetsError::NotConfigured);
        }
        Ok(Self {
            creds,
            http_client: reqwest::Client::new(),
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            revoke_url: REVOKE_URL.to_string(),
            token_provider,
            token: None,
            granted_before: false,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[cfg(test)]
    pub fn with_revoke_url(mut self, url: impl Into<String>) -> Self {
        self.revoke_url = url.into();
        self
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// Runs the sign-in once. Consent is only forced the first time in this session.
    pub async fn request_access_token(&mut self) -> Result<(), SheetsError> {
        let prompt = if self.granted_before {
            ConsentPrompt::None
        } else {
            ConsentPrompt::Consent
        };
        let token = self
            .token_provider
            .request_access_token(&self.creds.client_id, prompt)
            .await?;
        tracing::info!("Signed in to Google (expires in {:?}s)", token.expires_in);
        self.token = Some(token);
        self.granted_before = true;
        Ok(())
    }

    /// Revokes the current token, if any, and forgets it.
    pub async fn sign_out(&mut self) -> Result<(), SheetsError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        let response = self
            .http_client
            .post(&self.revoke_url)
            .query(&[("token", token.token.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::warn!("Token revocation returned {}", response.status());
        }
        tracing::info!("Signed out of Google");
        Ok(())
    }

    /// Creates a spreadsheet, writes the header plus one row per record, returns its URL.
    pub async fn create_spreadsheet(
        &self,
        title: &str,
        records: &[PriceRecord],
    ) -> Result<String, SheetsError> {
        let token = self.token.as_ref().ok_or(SheetsError::AuthRequired)?;
        if title.trim().is_empty() {
            return Err(SheetsError::SaveFailed("Spreadsheet title cannot be empty.".to_string()));
        }

        tracing::info!("Creating spreadsheet '{}' with {} rows", title, records.len());
        let response = self
            .http_client
            .post(format!("{}/spreadsheets", self.base_url))
            .bearer_auth(&token.token)
            .json(&json!({ "properties": { "title": title } }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let created: CreatedSpreadsheet = response.json().await?;
        let spreadsheet_id = created
            .spreadsheet_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SheetsError::SaveFailed("Failed to get spreadsheet ID after creation.".to_string()))?;

        let response = self
            .http_client
            .put(format!("{}/spreadsheets/{}/values/A1", self.base_url, spreadsheet_id))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(&token.token)
            .json(&json!({ "values": sheet_values(records) }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let url = created.spreadsheet_url.unwrap_or_else(|| {
            format!("https://docs.google.com/spreadsheets/d/{}/edit", spreadsheet_id)
        });
        tracing::info!("Spreadsheet saved: {}", url);
        Ok(url)
    }
}

fn sheet_values(records: &[PriceRecord]) -> Vec<Vec<String>> {
    let mut values = Vec::with_capacity(records.len() + 1);
    values.push(SHEET_HEADER.iter().map(|h| h.to_string()).collect());
    for record in records {
        values.push(vec![
            record.date.clone(),
            record.province.clone(),
            display_price(record.price).to_string(),
        ]);
    }
    values
}

// The API's own message, verbatim, when it sends one.
async fn api_error(response: reqwest::Response) -> SheetsError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!("Sheets API error {}: {}", status, body);

    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_SAVE_ERROR.to_string());
    SheetsError::SaveFailed(message)
}
