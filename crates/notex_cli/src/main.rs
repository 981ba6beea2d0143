//! `notex` command-line entry point.
//!
//! # Usage
//!
//! ```bash
//! notex encode "a **b** ==c=="
//! echo "<strong>b</strong>" | notex decode
//! notex render "<strong>b</mark>"
//! notex apply --kind bold --start 6 --end 11 "hello world"
//! notex request POST /api/auth/login --body '{"email":"a@b.c","password":"pw"}'
//! notex request GET "/api/notes?q=milk" --token <token>
//! notex ping
//! ```
//!
//! Text arguments default to stdin when omitted. Database and logging are
//! configured through `NOTEX_*` environment variables (see
//! `notex_api::config`).

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notex_api::{ApiConfig, ApiRequest, Method, NotexApi};
use notex_core::{apply_marker, decode_to_plain_text, encode_to_markup, render_html, MarkerKind};
use serde_json::Value;

/// NoteX formatting tools and API client
#[derive(Parser, Debug)]
#[command(name = "notex", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert edit-form markers to storage markup
    Encode { text: Option<String> },
    /// Convert storage markup back to edit-form markers
    Decode { text: Option<String> },
    /// Render storage markup as sanitized HTML
    Render { text: Option<String> },
    /// Wrap a character range of edit-form text with a marker
    Apply {
        /// bold (`**`) or highlight (`==`)
        #[arg(long, value_parser = parse_kind)]
        kind: MarkerKind,
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        text: Option<String>,
    },
    /// Send one request to the API over the configured database
    Request {
        /// GET, POST, PUT or DELETE
        #[arg(value_parser = parse_method)]
        method: Method,
        /// Route path, optionally with a query string
        path: String,
        /// Bearer token returned by login
        #[arg(long)]
        token: Option<String>,
        /// JSON request body
        #[arg(long, value_parser = parse_json)]
        body: Option<Value>,
    },
    /// Print core health and version
    Ping,
}

fn parse_kind(value: &str) -> Result<MarkerKind, String> {
    MarkerKind::parse(value).ok_or_else(|| format!("unknown marker kind `{value}`"))
}

fn parse_method(value: &str) -> Result<Method, String> {
    Method::parse(value).ok_or_else(|| format!("unsupported method `{value}`"))
}

fn parse_json(value: &str) -> Result<Value, String> {
    serde_json::from_str(value).map_err(|err| format!("invalid JSON body: {err}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ApiConfig::from_env().context("invalid NOTEX_* environment")?;
    config
        .init_logging()
        .context("failed to initialize logging")?;

    match cli.command {
        Command::Encode { text } => println!("{}", encode_to_markup(&input(text)?)),
        Command::Decode { text } => println!("{}", decode_to_plain_text(&input(text)?)),
        Command::Render { text } => println!("{}", render_html(&input(text)?)),
        Command::Apply {
            kind,
            start,
            end,
            text,
        } => {
            let edit = apply_marker(&input(text)?, start, end, kind);
            println!("{}", edit.text);
            eprintln!("selection={}..{}", edit.start, edit.end);
        }
        Command::Request {
            method,
            path,
            token,
            body,
        } => {
            let mut api = NotexApi::open(&config).with_context(|| {
                format!("failed to open database `{}`", config.db_path.display())
            })?;
            let mut request = ApiRequest::new(method, path).with_body(body.unwrap_or(Value::Null));
            if let Some(token) = token {
                request = request.with_authorization(format!("Bearer {token}"));
            }

            let response = api.handle(&request);
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            if !response.is_success() {
                bail!("request failed with status {}", response.status);
            }
        }
        Command::Ping => {
            println!("notex_core ping={}", notex_core::ping());
            println!("notex_core version={}", notex_core::core_version());
        }
    }
    Ok(())
}

fn input(text: Option<String>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read text from stdin")?;
    Ok(buffer.strip_suffix('\n').unwrap_or(&buffer).to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_json, parse_kind, parse_method, Cli, Command};
    use clap::Parser;
    use notex_api::Method;
    use notex_core::MarkerKind;

    #[test]
    fn kind_accepts_names_and_markers() {
        assert_eq!(parse_kind("bold"), Ok(MarkerKind::Bold));
        assert_eq!(parse_kind("=="), Ok(MarkerKind::Highlight));
        assert!(parse_kind("italic").is_err());
    }

    #[test]
    fn method_and_body_are_validated() {
        assert_eq!(parse_method("put"), Ok(Method::Put));
        assert!(parse_method("PATCH").is_err());
        assert!(parse_json("{\"title\":1}").is_ok());
        assert!(parse_json("{").is_err());
    }

    #[test]
    fn request_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "notex",
            "request",
            "delete",
            "/api/notes/abc",
            "--token",
            "t0k",
        ])
        .unwrap();
        match cli.command {
            Command::Request {
                method, path, token, body,
            } => {
                assert_eq!(method, Method::Delete);
                assert_eq!(path, "/api/notes/abc");
                assert_eq!(token.as_deref(), Some("t0k"));
                assert!(body.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn apply_subcommand_uses_marker_parser() {
        let cli = Cli::try_parse_from([
            "notex", "apply", "--kind", "hl", "--start", "0", "--end", "2", "ab",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Apply {
                kind: MarkerKind::Highlight,
                ..
            }
        ));
    }
}
