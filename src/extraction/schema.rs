// src/extraction/schema.rs
use serde_json::{json, Value};

pub const SUMMARY_FIELD: &str = "priceMovementSummary";
pub const RECORDS_FIELD: &str = "extractedData";

/// Output schema sent with every extraction request (Gemini `responseSchema` dialect).
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            SUMMARY_FIELD: {
                "type": "STRING",
                "description": "A concise, 2-3 sentence summary analyzing the hog price movements based on the article's content. It should describe the overall trend (e.g., stable, increasing, decreasing) and mention any specific reasons cited in the text."
            },
            RECORDS_FIELD: {
                "type": "ARRAY",
                "description": "An array of hog price records extracted from the text, with one entry for each province mentioned.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": {
                            "type": "STRING",
                            "description": "The publication date of the price data, in YYYY-MM-DD format."
                        },
                        "province": {
                            "type": "STRING",
                            "description": "The province or region name in Vietnamese."
                        },
                        "price": {
                            "type": "NUMBER",
                            "description": "The average price in VND/kg, as a single number. This is calculated from the price range in the text. IMPORTANT: Vietnamese numbers use '.' as a thousands separator (e.g., '68.000' is 68000)."
                        }
                    },
                    "required": ["date", "province", "price"]
                }
            }
        },
        "required": [RECORDS_FIELD, SUMMARY_FIELD]
    })
}
