use anyhow::Result;
use dictate_config::AppConfig;
use serde::Serialize;
use std::io::{self, Write};

pub mod completions;
pub mod email;
pub mod handle;
pub mod time;

pub struct Context<'a> {
    pub json: bool,
    pub config: &'a AppConfig,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Joins positional words the way they were dictated.
pub fn join_words(words: &[String]) -> String {
    words.join(" ")
}
