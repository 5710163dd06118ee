use crate::commands::{join_words, print_json, Context};
use crate::error::invalid_input;
use anyhow::Result;
use clap::Args;
use dictate_core::{parse_time_phrase, parse_time_zone};

#[derive(Debug, Args)]
pub struct TimeArgs {
    /// Date/time phrase, e.g. `Aug 19th 3 PM`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub phrase: Vec<String>,
    /// IANA zone to interpret the phrase in (defaults to `fallback_tz`)
    #[arg(long, value_name = "ZONE")]
    pub tz: Option<String>,
}

pub fn resolve_time(ctx: &Context<'_>, args: TimeArgs) -> Result<()> {
    let zone = args.tz.as_deref().unwrap_or(&ctx.config.fallback_tz);
    parse_time_zone(zone)?;

    let phrase = join_words(&args.phrase);
    let resolved = parse_time_phrase(&phrase, zone)
        .ok_or_else(|| invalid_input(format!("could not parse time phrase: {}", phrase)))?;

    if ctx.json {
        return print_json(&resolved);
    }

    println!("{}", resolved.iso);
    Ok(())
}
