// src/sheets/auth.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::utils::error::SheetsError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
// Time left for the browser to receive the final page once the token is in.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// Served at the redirect URI: the token arrives in the URL fragment, which only the
// browser can see, so hand it back to us as a query string.
const FORWARD_FRAGMENT_PAGE: &str = "<!DOCTYPE html><html><body><p>Completing sign-in…</p><script>\
var q = window.location.hash.substring(1);\
window.location.replace('/callback?' + (q || 'error=missing_token'));\
</script></body></html>";

const DONE_PAGE: &str = "<!DOCTYPE html><html><body><p>Signed in to Google. You can close this window.</p></body></html>";
const FAILED_PAGE: &str = "<!DOCTYPE html><html><body><p>Google sign-in failed. You can close this window.</p></body></html>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Option<u64>,
}

/// Whether Google should show the consent screen again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentPrompt {
    Consent,
    None,
}

impl ConsentPrompt {
    fn as_param(self) -> &'static str {
        match self {
            ConsentPrompt::Consent => "consent",
            ConsentPrompt::None => "",
        }
    }
}

/// One-shot sign-in yielding an access token for the Sheets scope.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn request_access_token(
        &self,
        client_id: &str,
        prompt: ConsentPrompt,
    ) -> Result<AccessToken, SheetsError>;
}

/// Hands out a token obtained elsewhere (e.g. `GOOGLE_ACCESS_TOKEN`).
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn request_access_token(
        &self,
        _client_id: &str,
        _prompt: ConsentPrompt,
    ) -> Result<AccessToken, SheetsError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_in: None,
        })
    }
}

type Launcher = Box<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// OAuth2 token (implicit) flow through the system browser and a loopback redirect.
pub struct BrowserTokenProvider {
    auth_url: String,
    timeout: Duration,
    launcher: Launcher,
}

impl BrowserTokenProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            timeout,
            launcher: Box::new(|url: &str| open::that(url)),
        }
    }

    /// Replace how the consent URL is opened.
    #[cfg(test)]
    pub fn with_launcher<F>(mut self, launcher: F) -> Self
    where
        F: Fn(&str) -> std::io::Result<()> + Send + Sync + 'static,
    {
        self.launcher = Box::new(launcher);
        self
    }
}

type SignInOutcome = Result<AccessToken, SheetsError>;

// The first callback takes the sender; later ones find it gone.
#[derive(Clone)]
struct CallbackState {
    outcome_tx: Arc<Mutex<Option<oneshot::Sender<SignInOutcome>>>>,
}

fn redirect_router(outcome_tx: oneshot::Sender<SignInOutcome>) -> Router {
    Router::new()
        .route("/", get(forward_fragment))
        .route("/callback", get(receive_callback))
        .with_state(CallbackState {
            outcome_tx: Arc::new(Mutex::new(Some(outcome_tx))),
        })
}

async fn forward_fragment() -> Html<&'static str> {
    Html(FORWARD_FRAGMENT_PAGE)
}

async fn receive_callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let outcome = callback_outcome(&params);
    let page = if outcome.is_ok() { DONE_PAGE } else { FAILED_PAGE };

    let sender = state.outcome_tx.lock().ok().and_then(|mut slot| slot.take());
    match sender {
        Some(tx) => {
            if tx.send(outcome).is_err() {
                tracing::debug!("Sign-in callback arrived after the flow ended");
            }
        }
        None => tracing::debug!("Ignoring repeated sign-in callback"),
    }
    Html(page)
}

#[async_trait]
impl TokenProvider for BrowserTokenProvider {
    async fn request_access_token(
        &self,
        client_id: &str,
        prompt: ConsentPrompt,
    ) -> Result<AccessToken, SheetsError> {
        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|e| {
            SheetsError::IntegrationUnavailable(format!("cannot open loopback listener: {}", e))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| SheetsError::IntegrationUnavailable(e.to_string()))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);
        let consent_url = build_consent_url(&self.auth_url, client_id, &redirect_uri, prompt)?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            let result = axum::serve(listener, redirect_router(outcome_tx))
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = result {
                tracing::warn!("Sign-in redirect server failed: {}", e);
            }
        });

        tracing::info!("Opening browser for Google sign-in");
        if let Err(e) = (self.launcher)(consent_url.as_str()) {
            tracing::warn!("Could not open a browser ({}). Open this URL to sign in:", e);
            eprintln!("{}", consent_url);
        }

        let outcome = tokio::time::timeout(self.timeout, outcome_rx).await;

        shutdown_tx.send(()).ok();
        // Connections the browser keeps open would hold graceful shutdown forever.
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
            server.abort();
        }

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SheetsError::IntegrationUnavailable(
                "sign-in redirect server stopped unexpectedly".to_string(),
            )),
            Err(_) => Err(SheetsError::IntegrationUnavailable(format!(
                "sign-in did not complete within {} seconds",
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Builds the consent screen URL for the token flow.
pub fn build_consent_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    prompt: ConsentPrompt,
) -> Result<Url, SheetsError> {
    Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "token"),
            ("scope", SHEETS_SCOPE),
            ("include_granted_scopes", "true"),
            ("prompt", prompt.as_param()),
        ],
    )
    .map_err(|e| SheetsError::IntegrationUnavailable(format!("bad auth URL: {}", e)))
}

/// Reads the token (or error) out of the `/callback` query parameters.
fn callback_outcome(params: &HashMap<String, String>) -> SignInOutcome {
    if let Some(error) = params.get("error") {
        return Err(SheetsError::SignInFailed(error.clone()));
    }
    match params.get("access_token").filter(|t| !t.is_empty()) {
        Some(token) => Ok(AccessToken {
            token: token.clone(),
            expires_in: params.get("expires_in").and_then(|v| v.parse().ok()),
        }),
        None => Err(SheetsError::SignInFailed("no access token in redirect".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn redirect_uri_of(consent: &str) -> String {
        let consent = Url::parse(consent).expect("consent url");
        consent
            .query_pairs()
            .find(|(k, _)| k == "redirect_uri")
            .map(|(_, v)| v.into_owned())
            .expect("redirect_uri")
    }

    #[test]
    fn consent_url_requests_token_for_sheets_scope() {
        let url = build_consent_url(
            GOOGLE_AUTH_URL,
            "123.apps.googleusercontent.com",
            "http://127.0.0.1:5555/",
            ConsentPrompt::Consent,
        )
        .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("response_type".into(), "token".into())));
        assert!(pairs.contains(&("scope".into(), SHEETS_SCOPE.into())));
        assert!(pairs.contains(&("prompt".into(), "consent".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://127.0.0.1:5555/".into())));
    }

    #[test]
    fn callback_with_token_succeeds() {
        let outcome = callback_outcome(&params(&[
            ("access_token", "ya29.abc"),
            ("token_type", "Bearer"),
            ("expires_in", "3599"),
        ]))
        .unwrap();
        assert_eq!(outcome.token, "ya29.abc");
        assert_eq!(outcome.expires_in, Some(3599));
    }

    #[test]
    fn callback_with_error_fails() {
        let outcome = callback_outcome(&params(&[("error", "access_denied")]));
        assert!(matches!(outcome, Err(SheetsError::SignInFailed(e)) if e == "access_denied"));

        let outcome = callback_outcome(&params(&[("access_token", "")]));
        assert!(matches!(outcome, Err(SheetsError::SignInFailed(_))));
    }

    #[tokio::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider::new("tok");
        let token = provider
            .request_access_token("id", ConsentPrompt::Consent)
            .await
            .unwrap();
        assert_eq!(token.token, "tok");
    }

    #[tokio::test]
    async fn browser_flow_reads_token_from_loopback_redirect() {
        let provider = BrowserTokenProvider::new(Duration::from_secs(10)).with_launcher(|consent| {
            let redirect = redirect_uri_of(consent);
            tokio::spawn(async move {
                let client = reqwest::Client::new();
                // The forwarding page first, then the callback it would navigate to.
                let page = client.get(&redirect).send().await.unwrap().text().await.unwrap();
                assert!(page.contains("/callback?"));
                client
                    .get(format!("{}callback?access_token=ya29.loopback&expires_in=3600", redirect))
                    .send()
                    .await
                    .unwrap();
            });
            Ok(())
        });

        let token = provider
            .request_access_token("client", ConsentPrompt::Consent)
            .await
            .unwrap();
        assert_eq!(token.token, "ya29.loopback");
        assert_eq!(token.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn idle_preconnect_does_not_block_the_callback() {
        let provider = BrowserTokenProvider::new(Duration::from_secs(5)).with_launcher(|consent| {
            let redirect = redirect_uri_of(consent);
            tokio::spawn(async move {
                let port = Url::parse(&redirect).unwrap().port().unwrap();
                // Open a connection and never send anything on it.
                let idle = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
                reqwest::Client::new()
                    .get(format!("{}callback?access_token=ya29.x", redirect))
                    .send()
                    .await
                    .unwrap();
                drop(idle);
            });
            Ok(())
        });

        let token = provider
            .request_access_token("client", ConsentPrompt::Consent)
            .await
            .unwrap();
        assert_eq!(token.token, "ya29.x");
    }

    #[tokio::test]
    async fn launch_failure_still_waits_for_the_callback() {
        let provider = BrowserTokenProvider::new(Duration::from_secs(5)).with_launcher(|consent| {
            let redirect = redirect_uri_of(consent);
            tokio::spawn(async move {
                reqwest::Client::new()
                    .get(format!("{}callback?access_token=ya29.manual", redirect))
                    .send()
                    .await
                    .unwrap();
            });
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
        });

        let token = provider
            .request_access_token("client", ConsentPrompt::None)
            .await
            .unwrap();
        assert_eq!(token.token, "ya29.manual");
    }

    #[tokio::test]
    async fn denied_consent_is_sign_in_failure() {
        let provider = BrowserTokenProvider::new(Duration::from_secs(5)).with_launcher(|consent| {
            let redirect = redirect_uri_of(consent);
            tokio::spawn(async move {
                let page = reqwest::Client::new()
                    .get(format!("{}callback?error=access_denied", redirect))
                    .send()
                    .await
                    .unwrap()
                    .text()
                    .await
                    .unwrap();
                assert!(page.contains("sign-in failed"));
            });
            Ok(())
        });

        let err = provider
            .request_access_token("client", ConsentPrompt::Consent)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsError::SignInFailed(e) if e == "access_denied"));
    }

    #[tokio::test]
    async fn browser_flow_times_out_as_unavailable() {
        let provider = BrowserTokenProvider::new(Duration::from_millis(50)).with_launcher(|_| Ok(()));
        let err = provider
            .request_access_token("client", ConsentPrompt::None)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsError::IntegrationUnavailable(_)));
    }
}
