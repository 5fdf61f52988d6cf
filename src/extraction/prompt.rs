// src/extraction/prompt.rs
use chrono::{Datelike, NaiveDate};

use crate::article::ContentKind;

const ROLE: &str = "You are an expert data analyst specializing in agricultural markets in Vietnam.";

/// Builds the extraction instruction for one article.
///
/// `today` fixes what "the current year" means when the article omits the year.
pub fn build_prompt(content: &str, kind: ContentKind, today: NaiveDate) -> String {
    let procedure = extraction_procedure(today.year());

    match kind {
        ContentKind::Html => format!(
            "{ROLE}\n\
             Your task is to analyze the provided HTML content, find the main article, and then extract hog price information and a market summary into a clean JSON format.\n\n\
             From the HTML content below, please perform the following actions:\n\
             First, parse the provided HTML to find the main news article body. Ignore all non-essential elements like headers, footers, navigation bars, advertisements, and sidebars. Focus only on the text that constitutes the article itself.\n\
             Then, perform these two tasks:\n\
             {procedure}\n\
             Here is the full HTML content of the webpage:\n\
             ---\n\
             {content}\n\
             ---\n"
        ),
        ContentKind::Text => format!(
            "{ROLE}\n\
             Your task is to analyze the provided article text and extract hog price information and a market summary into a clean JSON format.\n\n\
             From the text below, please perform the following actions:\n\
             {procedure}\n\
             Here is the article text:\n\
             ---\n\
             {content}\n\
             ---\n"
        ),
    }
}

fn extraction_procedure(current_year: i32) -> String {
    format!(
        "Your first task is to provide a concise, 2-3 sentence summary of the hog price movements described in the article. \
This summary should capture the overall market trend (e.g., prices are generally stable, increasing, or decreasing) and mention any key reasons for the changes if the text provides them. This will be the 'priceMovementSummary'.

Your second task is to extract the detailed data:
1. Identify Date: From the article content, find the publication date. Format it as YYYY-MM-DD. If the year is missing, assume the current year ({current_year}). This date should be the same for all records from this article.
2. Identify Provinces and Prices: Scan the article text and identify every Vietnamese province or region mentioned alongside its hog price.
3. Handle Vietnamese Currency: Prices are in Vietnamese Dong (VND) and use a period (.) as a thousands separator. For example, '68.000' MUST be interpreted as the number 68000, never as a decimal.
4. Calculate Average Price: Most prices are given as a range (e.g., \"68.000 - 69.000 đồng/kg\"). You must calculate the average of this range, rounded to the nearest whole VND. For example, the average of 68.000 and 69.000 is (68000 + 69000) / 2 = 68500. The final price must be a single number.
5. Structure Data: Create an array of JSON objects for the 'extractedData' field. Each object represents a province and must contain \"date\", \"province\", and the calculated average \"price\". Ensure every province found in the text is included, one record per province.
6. Final Output: Return a single JSON object that strictly follows the provided response schema, containing both the 'priceMovementSummary' and the 'extractedData' array.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }

    #[test]
    fn html_prompt_isolates_article_body_first() {
        let prompt = build_prompt("<html>…</html>", ContentKind::Html, day());
        assert!(prompt.contains("find the main news article body"));
        assert!(prompt.contains("Ignore all non-essential elements"));
        assert!(prompt.contains("Here is the full HTML content of the webpage:\n---\n<html>…</html>\n---"));
    }

    #[test]
    fn text_prompt_skips_html_isolation() {
        let prompt = build_prompt("Hà Nội 68.000 - 69.000 đồng/kg", ContentKind::Text, day());
        assert!(!prompt.contains("main news article body"));
        assert!(prompt.contains("Here is the article text:\n---\nHà Nội 68.000 - 69.000 đồng/kg\n---"));
    }

    #[test]
    fn shared_procedure_is_in_both_variants() {
        for kind in [ContentKind::Html, ContentKind::Text] {
            let prompt = build_prompt("x", kind, day());
            assert!(prompt.starts_with(ROLE));
            assert!(prompt.contains("assume the current year (2024)"));
            assert!(prompt.contains("'68.000' MUST be interpreted as the number 68000"));
            assert!(prompt.contains("(68000 + 69000) / 2 = 68500"));
            assert!(prompt.contains("one record per province"));
        }
    }
}
