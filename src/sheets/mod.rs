pub mod auth;
pub mod client;

pub use auth::{BrowserTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::{default_title, SheetsSession};
