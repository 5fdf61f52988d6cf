// src/repl.rs
//! Line-oriented interactive session over one `App`.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::App;
use crate::article::ArticleInput;
use crate::extraction::schema::response_schema;
use crate::records::{render_table, RecordField};
use crate::utils::error::AppError;

const HELP: &str = "\
Commands:
  url <URL>                      fetch an article and extract prices
  file <PATH>                    extract prices from a text file
  show                           print the (filtered) table
  summary                        print the market summary
  filter [QUERY]                 filter by province, date or price; no query clears it
  edit <ID> <FIELD> <VALUE...>   edit date, province or price (price in K VND/kg)
  csv                            export the filtered table to CSV
  sheets [TITLE...]              save all records to a new Google Sheet
  configure <CLIENT_ID>          save the Google OAuth client id
  signout                        revoke the Google token
  schema                         print the extraction response schema
  help                           show this help
  quit                           leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Url(String),
    File(PathBuf),
    Show,
    Summary,
    Filter(String),
    Edit { id: u64, field: RecordField, value: String },
    Csv,
    Sheets(Option<String>),
    Configure(String),
    SignOut,
    Schema,
    Help,
    Quit,
}

/// Parses one input line. Empty lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_start();
    if line.trim_end().is_empty() {
        return Ok(None);
    }
    // `raw_rest` starts right after the one separator following the command name.
    let (name, raw_rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = raw_rest.trim();

    let command = match name.to_lowercase().as_str() {
        "url" => Command::Url(required(rest, "url <URL>")?.to_string()),
        "file" => Command::File(PathBuf::from(required(rest, "file <PATH>")?)),
        "show" | "table" => Command::Show,
        "summary" => Command::Summary,
        "filter" => Command::Filter(rest.to_string()),
        "edit" => parse_edit(raw_rest)?,
        "csv" | "export" => Command::Csv,
        "sheets" => Command::Sheets(Some(rest.to_string()).filter(|t| !t.is_empty())),
        "configure" => Command::Configure(required(rest, "configure <CLIENT_ID>")?.to_string()),
        "signout" => Command::SignOut,
        "schema" => Command::Schema,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help' for a list.", other)),
    };
    Ok(Some(command))
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(rest)
    }
}

fn parse_edit(rest: &str) -> Result<Command, String> {
    const USAGE: &str = "Usage: edit <ID> <date|province|price> <VALUE...>";
    let (id, after_id) = rest.trim_start().split_once(char::is_whitespace).ok_or(USAGE)?;
    let id = id.parse::<u64>().map_err(|_| USAGE.to_string())?;

    let after_id = after_id.trim_start();
    let (field, value) = after_id.split_once(char::is_whitespace).unwrap_or((after_id, ""));
    let field = field.parse::<RecordField>()?;
    // Everything after the field's separator is the value, spaces included; empty is legal.
    Ok(Command::Edit {
        id,
        field,
        value: value.to_string(),
    })
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(app: &mut App) -> Result<(), AppError> {
    println!("Hog price extractor. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = execute(app, command).await {
                    println!("Error: {}", e);
                }
            }
            Err(msg) => println!("{}", msg),
        }
    }
    Ok(())
}

async fn execute(app: &mut App, command: Command) -> Result<(), AppError> {
    match command {
        Command::Url(url) => {
            let input = ArticleInput::from_url(&url)?;
            submit_and_show(app, input).await
        }
        Command::File(path) => {
            let text = tokio::fs::read_to_string(&path).await?;
            let input = ArticleInput::from_text(&text)?;
            submit_and_show(app, input).await
        }
        Command::Show => {
            let view = app.filtered();
            println!("{}", render_table(&view));
            println!("{} of {} records shown", view.len(), app.records().len());
            Ok(())
        }
        Command::Summary => {
            println!("{}", app.summary().unwrap_or("No summary yet."));
            Ok(())
        }
        Command::Filter(query) => {
            app.set_filter(&query);
            if !app.filter().is_empty() {
                println!("Filter: {}", app.filter());
            }
            println!("{}", render_table(&app.filtered()));
            Ok(())
        }
        Command::Edit { id, field, value } => {
            if app.edit(id, field, &value) {
                println!("{}", render_table(&app.filtered()));
            } else {
                println!("No change.");
            }
            Ok(())
        }
        Command::Csv => {
            match app.export_csv()? {
                Some(path) => println!("Exported to {}", path.display()),
                None => println!("No data to export."),
            }
            Ok(())
        }
        Command::Sheets(title) => {
            let url = app.save_to_sheets(title.as_deref()).await?;
            println!("Saved to Google Sheets: {}", url);
            Ok(())
        }
        Command::Configure(client_id) => {
            app.save_credentials(&client_id)?;
            println!("Google Client ID saved.");
            Ok(())
        }
        Command::SignOut => {
            app.sign_out().await?;
            println!("Signed out.");
            Ok(())
        }
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&response_schema())
                .map_err(|e| AppError::Config(e.to_string()))?;
            println!("{}", schema);
            Ok(())
        }
        Command::Help => {
            println!("{}", HELP);
            Ok(())
        }
        Command::Quit => Ok(()),
    }
}

/// Runs an extraction and prints what came back. A summary without records is still shown.
pub async fn submit_and_show(app: &mut App, input: ArticleInput) -> Result<(), AppError> {
    let outcome = app.submit(input).await;
    if let Some(summary) = app.summary() {
        println!("Price movement summary:\n{}\n", summary);
    }
    outcome?;
    println!("{}", render_table(&app.filtered()));
    Ok(())
}
