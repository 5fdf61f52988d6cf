// src/article/html.rs

// --- Imports ---
use once_cell::sync::Lazy;
use scraper::{node::Node, ElementRef, Html, Selector};

// --- CSS Selectors (Lazy Static) ---
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to compile TITLE_SELECTOR"));

// Publication time as exposed by most Vietnamese news CMSes (OpenGraph article meta)
static PUBLISHED_META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "meta[property='article:published_time'], meta[name='pubdate'], meta[itemprop='datePublished']",
    )
    .expect("Failed to compile PUBLISHED_META_SELECTOR")
});

// Preferred container for the readable text
static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("Failed to compile ARTICLE_SELECTOR"));

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to compile BODY_SELECTOR"));

const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "svg", "template"];

/// What we can learn about a fetched page without the model: used for logs and debug dumps.
#[derive(Debug, Clone, Default)]
pub struct ArticlePreview {
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub body_text: String,
}

/// Pulls the title, publish meta and visible text out of an article page.
pub fn inspect_html(html: &str) -> ArticlePreview {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let published_at = document
        .select(&PUBLISHED_META_SELECTOR)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string);

    let body_text = document
        .select(&ARTICLE_SELECTOR)
        .next()
        .or_else(|| document.select(&BODY_SELECTOR).next())
        .map(visible_text)
        .unwrap_or_default();

    ArticlePreview {
        title,
        published_at,
        body_text,
    }
}

fn visible_text(root: ElementRef) -> String {
    let mut parts = Vec::new();
    for node in root.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| NON_CONTENT_TAGS.contains(&el.value().name()));
            if hidden {
                continue;
            }
            let cleaned = collapse_whitespace(text);
            if !cleaned.is_empty() {
                parts.push(cleaned);
            }
        }
    }
    parts.join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html><head>
          <title>
            Giá heo hơi hôm nay 12/3
          </title>
          <meta property="article:published_time" content="2024-03-12T06:00:00+07:00">
          <script>var ads = "68.000";</script>
        </head><body>
          <nav>Trang chủ</nav>
          <article>
            <h1>Giá heo hơi</h1>
            <p>Tại Hà Nội, giá heo hơi dao động 68.000 - 69.000 đồng/kg.</p>
            <style>.x { color: red }</style>
          </article>
        </body></html>
    "#;

    #[test]
    fn extracts_title_and_publish_time() {
        let preview = inspect_html(PAGE);
        assert_eq!(preview.title.as_deref(), Some("Giá heo hơi hôm nay 12/3"));
        assert_eq!(preview.published_at.as_deref(), Some("2024-03-12T06:00:00+07:00"));
    }

    #[test]
    fn body_text_prefers_article_and_skips_scripts() {
        let preview = inspect_html(PAGE);
        assert!(preview.body_text.contains("Tại Hà Nội"));
        assert!(!preview.body_text.contains("Trang chủ"));
        assert!(!preview.body_text.contains("color: red"));
        assert!(!preview.body_text.contains("var ads"));
    }

    #[test]
    fn plain_fragment_has_no_metadata() {
        let preview = inspect_html("<p>Đồng Nai 67.000</p>");
        assert!(preview.title.is_none());
        assert!(preview.published_at.is_none());
        assert_eq!(preview.body_text, "Đồng Nai 67.000");
    }
}
