pub mod client;
pub mod html;
pub mod models;

pub use client::ArticleFetcher;
pub use models::{ArticleInput, ContentKind};
