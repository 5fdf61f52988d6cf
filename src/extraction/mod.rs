pub mod gemini;
pub mod price;
pub mod prompt;
pub mod response;
pub mod schema;

pub use gemini::{ExtractionRequest, GeminiClient, GenerativeModel};
pub use response::{parse_extraction_response, ExtractedRecord, ExtractionResult};

use chrono::NaiveDate;

use crate::article::ContentKind;
use crate::utils::error::ExtractError;

impl ExtractionRequest {
    pub fn new(content: &str, kind: ContentKind, temperature: f32, today: NaiveDate) -> Self {
        Self {
            prompt: prompt::build_prompt(content, kind, today),
            schema: schema::response_schema(),
            temperature,
        }
    }
}

/// Runs one extraction: build the request, call the model once, validate the answer.
pub async fn extract_prices(
    model: &dyn GenerativeModel,
    content: &str,
    kind: ContentKind,
    temperature: f32,
) -> Result<ExtractionResult, ExtractError> {
    let today = chrono::Utc::now().date_naive();
    let request = ExtractionRequest::new(content, kind, temperature, today);
    tracing::info!(
        "Requesting extraction ({} content, {} chars)",
        kind,
        content.chars().count()
    );

    let raw = model.generate_json(&request).await?;
    tracing::debug!("Model returned {} bytes", raw.len());

    parse_extraction_response(&raw)
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;

    #[test]
    fn request_carries_prompt_schema_and_temperature() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let request = ExtractionRequest::new("Hà Nội 68.000", ContentKind::Text, 0.1, today);
        assert!(request.prompt.contains("Hà Nội 68.000"));
        assert_eq!(request.schema, schema::response_schema());
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn extraction_parses_model_answer() {
        let model = ScriptedModel::answering(
            r#"{"priceMovementSummary": "Tăng nhẹ.", "extractedData": [
                {"date": "2024-03-12", "province": "Hà Nội", "price": 68500}
            ]}"#,
        );
        let result = extract_prices(&model, "<html></html>", ContentKind::Html, 0.1)
            .await
            .unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(model.calls(), 1);
        assert!(model.prompts.lock().unwrap()[0].contains("main news article body"));
    }

    #[tokio::test]
    async fn model_failure_is_not_retried() {
        let model = ScriptedModel::failing("boom");
        assert!(extract_prices(&model, "x", ContentKind::Text, 0.1).await.is_err());
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn rejected_answer_fails_extraction() {
        let model = ScriptedModel::answering(r#"{"unrelated": true}"#);
        let result = tokio_test::block_on(extract_prices(&model, "x", ContentKind::Text, 0.1));
        assert!(matches!(result, Err(ExtractError::Rejected(_))));
    }
}
