use crate::commands::{join_words, print_json, Context};
use crate::error::invalid_input;
use anyhow::Result;
use clap::Args;
use dictate_core::normalize_spoken_email;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct EmailArgs {
    /// Dictated words, e.g. `j o h n dot doe at g mail dot com`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EmailReport {
    normalized_email: String,
}

pub fn normalize_email(ctx: &Context<'_>, args: EmailArgs) -> Result<()> {
    let raw = join_words(&args.words);
    let normalized = normalize_spoken_email(&raw)
        .ok_or_else(|| invalid_input("could not normalize spoken email"))?;

    if ctx.json {
        return print_json(&EmailReport {
            normalized_email: normalized,
        });
    }

    println!("{}", normalized);
    Ok(())
}
