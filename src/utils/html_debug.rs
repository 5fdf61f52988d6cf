// src/utils/html_debug.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::article::html::ArticlePreview;
use crate::utils::error::AppError;

/// Saves the fetched page and the text we could see in it, for checking what the model got.
pub fn save_article_debug(
    debug_dir: &Path,
    html: &str,
    preview: &ArticlePreview,
) -> Result<PathBuf, AppError> {
    fs::create_dir_all(debug_dir)?;

    let raw_path = debug_dir.join("raw_article.html");
    fs::write(&raw_path, html)?;
    tracing::info!("Saved raw article to: {}", raw_path.display());

    let mut text = String::new();
    text.push_str(&format!(
        "Title: {}\n",
        preview.title.as_deref().unwrap_or("(none)")
    ));
    text.push_str(&format!(
        "Published: {}\n",
        preview.published_at.as_deref().unwrap_or("(unknown)")
    ));
    text.push_str(&format!("Raw HTML bytes: {}\n\n", html.len()));
    text.push_str(&preview.body_text);
    text.push('\n');

    let text_path = debug_dir.join("article.txt");
    fs::write(&text_path, text)?;
    tracing::info!("Saved article text to: {}", text_path.display());

    Ok(text_path)
}
