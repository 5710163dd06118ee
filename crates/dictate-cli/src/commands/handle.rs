use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use clap::Args;
use dictate_core::{authorize, handle_request, NormalizeRequest, NormalizeResponse};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct HandleArgs {
    /// Read the request from a file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,
    /// Treat input as newline-delimited requests, one compact response per line
    #[arg(long)]
    pub lines: bool,
    /// Authorization value presented with the request, e.g. `Bearer <token>`
    #[arg(long, value_name = "VALUE")]
    pub authorization: Option<String>,
}

pub fn handle(ctx: &Context<'_>, args: HandleArgs) -> Result<()> {
    authorize(
        ctx.config.auth.token.as_deref(),
        args.authorization.as_deref(),
    )?;

    let input = read_input(args.input.as_ref())?;
    if args.lines {
        return handle_lines(ctx, &input);
    }

    let response = respond(ctx, &input).with_context(|| "parse request")?;
    print_json(&response)
}

fn handle_lines(ctx: &Context<'_>, input: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let mut handled = 0usize;
    for (idx, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let response =
            respond(ctx, line).with_context(|| format!("parse request line {}", idx + 1))?;
        serde_json::to_writer(&mut stdout, &response)?;
        writeln!(stdout)?;
        handled += 1;
    }
    debug!(handled, "request lines handled");
    Ok(())
}

fn respond(ctx: &Context<'_>, raw: &str) -> Result<NormalizeResponse> {
    if raw.trim().is_empty() {
        return Err(invalid_input("request body is empty"));
    }
    let request: NormalizeRequest = serde_json::from_str(raw)?;
    Ok(handle_request(&request, &ctx.config.fallback_tz))
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read request file {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .with_context(|| "read request from stdin")?;
            Ok(buf)
        }
    }
}
