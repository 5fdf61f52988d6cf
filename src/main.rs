// src/main.rs
mod app;
mod article;
mod extraction;
mod records;
mod repl;
mod sheets;
mod storage;
mod utils;

use std::path::PathBuf;

use clap::Parser;
use app::App;
use article::ArticleInput;
use storage::{CredentialStore, StorageManager};
use utils::config::Settings;
use utils::AppError;

/// Extract live hog prices by province from Vietnamese news articles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Article URL, fetched through the CORS proxy
    #[arg(short, long, conflicts_with_all = ["text", "text_file"])]
    url: Option<String>,

    /// Article text pasted directly
    #[arg(short, long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read article text from a file
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Filter the table by province, date or displayed price
    #[arg(short, long)]
    filter: Option<String>,

    /// Export the filtered table to CSV
    #[arg(long)]
    csv: bool,

    /// Save all records to a new Google Sheet, optionally with a title
    #[arg(long, num_args = 0..=1, value_name = "TITLE")]
    sheet: Option<Option<String>>,

    /// Save the summary and records as JSON
    #[arg(long)]
    save_json: bool,

    /// Output directory for exports
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Start an interactive session (after processing any input given)
    #[arg(short, long)]
    interactive: bool,

    /// Save a Google OAuth Client ID for Sheets export
    #[arg(long)]
    client_id: Option<String>,

    /// Print the response schema sent to the model
    #[arg(long)]
    show_schema: bool,

    /// Model name (overrides HOG_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Proxy prefix for article fetches (overrides HOG_PROXY_URL)
    #[arg(long)]
    proxy_url: Option<String>,

    /// Debug mode - verbose logs and saved article dumps
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn article_input(&self) -> Result<Option<ArticleInput>, AppError> {
        if let Some(url) = &self.url {
            return ArticleInput::from_url(url).map(Some);
        }
        if let Some(text) = &self.text {
            return ArticleInput::from_text(text).map(Some);
        }
        if let Some(path) = &self.text_file {
            let text = std::fs::read_to_string(path)?;
            return ArticleInput::from_text(&text).map(Some);
        }
        Ok(None)
    }
}

#[tokio::main]
async fn main() {
    // A missing .env is the normal case.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    utils::logging::setup_logging(args.debug);
    tracing::debug!("Starting with args: {:?}", args);

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let mut settings = Settings::from_env()?;
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(proxy) = &args.proxy_url {
        settings.proxy_url = proxy.clone();
    }

    if args.show_schema {
        let schema = serde_json::to_string_pretty(&extraction::schema::response_schema())
            .map_err(|e| AppError::Config(e.to_string()))?;
        println!("{}", schema);
    }

    let input = args.article_input()?;
    let storage = StorageManager::new(&args.output_dir)?;
    let credentials = CredentialStore::default_location()?;
    tracing::debug!("Google credentials file: {}", credentials.path().display());
    let mut app = App::new(settings, storage, credentials)?.with_debug(args.debug);

    if let Some(client_id) = &args.client_id {
        app.save_credentials(client_id)?;
        println!("Google Client ID saved.");
    }
    if let Some(filter) = &args.filter {
        app.set_filter(filter);
    }

    let nothing_requested = input.is_none() && args.client_id.is_none() && !args.show_schema;

    if let Some(input) = input {
        match repl::submit_and_show(&mut app, input).await {
            Ok(()) => export(&mut app, &args).await?,
            // A summary without records is still a result.
            Err(e) if e.is_soft() && app.summary().is_some() => println!("{}", e),
            Err(e) => return Err(e),
        }
    }

    if args.interactive || nothing_requested {
        repl::run(&mut app).await?;
    }
    Ok(())
}

async fn export(app: &mut App, args: &Args) -> Result<(), AppError> {
    if args.save_json {
        if let Some(path) = app.save_snapshot()? {
            println!("Saved summary and records to {}", path.display());
        }
    }
    if args.csv {
        match app.export_csv()? {
            Some(path) => println!("Exported to {}", path.display()),
            None => println!("No data to export."),
        }
    }
    if let Some(title) = &args.sheet {
        let url = app.save_to_sheets(title.as_deref()).await?;
        println!("Saved to Google Sheets: {}", url);
    }
    Ok(())
}
