use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

/// Shape every normalized email must match, case-insensitive.
pub const EMAIL_PATTERN: &str = r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$";

// Alternatives are listed longest-first so "at sign" is consumed whole.
const SYMBOL_RULES: [(&str, &str); 5] = [
    (r"\b(?:at sign|symbol at|at)\b", " @ "),
    (r"\b(?:dot|period)\b", " . "),
    (r"\b(?:underscore|under score)\b", " _ "),
    (r"\b(?:dash|hyphen)\b", " - "),
    (r"\b(?:plus sign|plus)\b", " + "),
];

const DIGIT_WORDS: &str =
    r"\b(?:zero|oh|one|two|to|too|three|four|for|five|six|seven|eight|ate|nine)\b";

const PROVIDER_RULES: [(&str, &str); 5] = [
    (r"\bg\s*mail\b", "gmail"),
    (r"\bhot\s*mail\b", "hotmail"),
    (r"\bout\s*look\b", "outlook"),
    (r"\byah+(?:\s*h+)*\s*oo\b", "yahoo"),
    (r"\bproton\s*mail\b", "protonmail"),
];

/// One step of the rewrite chain: every match of `matcher` becomes `replacement`.
struct RewriteRule {
    matcher: Regex,
    replacement: &'static str,
}

impl RewriteRule {
    fn compile(pattern: &str, replacement: &'static str) -> Self {
        Self {
            matcher: Regex::new(pattern).expect("rewrite rule pattern is valid"),
            replacement,
        }
    }

    fn apply(&self, input: &str) -> String {
        self.matcher
            .replace_all(input, self.replacement)
            .into_owned()
    }
}

fn symbol_rules() -> &'static [RewriteRule] {
    static RULES: OnceLock<Vec<RewriteRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        SYMBOL_RULES
            .iter()
            .map(|(pattern, replacement)| RewriteRule::compile(pattern, replacement))
            .collect()
    })
}

fn provider_rules() -> &'static [RewriteRule] {
    static RULES: OnceLock<Vec<RewriteRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        PROVIDER_RULES
            .iter()
            .map(|(pattern, replacement)| RewriteRule::compile(pattern, replacement))
            .collect()
    })
}

fn digit_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DIGIT_WORDS).expect("digit word pattern is valid"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

fn dot_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.+").expect("dot run pattern is valid"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Turns dictated text such as `"j o h n dot doe at g mail dot com"` into
/// `"john.doe@gmail.com"`.
///
/// Returns `None` unless the rewritten text is a complete email address; a
/// partially normalized string is never returned.
pub fn normalize_spoken_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let padded = format!(" {} ", trimmed.to_lowercase());
    let mut text = whitespace_re().replace_all(&padded, " ").into_owned();

    for rule in symbol_rules() {
        text = rule.apply(&text);
    }

    text = digit_words_re()
        .replace_all(&text, |caps: &Captures| digit_for_word(&caps[0]))
        .into_owned();
    text = resolve_spoken_zero(&text);

    for rule in provider_rules() {
        text = rule.apply(&text);
    }

    let tightened = whitespace_re().replace_all(&text, "");
    let candidate = dot_run_re().replace_all(&tightened, ".").into_owned();

    if is_valid_email(&candidate) {
        Some(candidate)
    } else {
        debug!(len = candidate.len(), "spoken email rejected by shape check");
        None
    }
}

pub fn is_valid_email(candidate: &str) -> bool {
    email_re().is_match(candidate)
}

fn digit_for_word(word: &str) -> &'static str {
    match word {
        "zero" | "oh" => "0",
        "one" => "1",
        "two" | "to" | "too" => "2",
        "three" => "3",
        "four" | "for" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" | "ate" => "8",
        "nine" => "9",
        _ => "",
    }
}

// A lone "o" reads as zero only inside a run of tokens that touches a digit,
// so "five o five" is 505 while "j o h n" keeps its letters.
fn resolve_spoken_zero(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split(' ').collect();
    let words: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| !token.is_empty())
        .map(|(idx, _)| idx)
        .collect();

    let mut pos = 0;
    while pos < words.len() {
        if tokens[words[pos]] != "o" {
            pos += 1;
            continue;
        }

        let start = pos;
        while pos < words.len() && tokens[words[pos]] == "o" {
            pos += 1;
        }

        let before = start
            .checked_sub(1)
            .map(|idx| tokens[words[idx]])
            .is_some_and(|token| token.ends_with(|ch: char| ch.is_ascii_digit()));
        let after = words
            .get(pos)
            .map(|idx| tokens[*idx])
            .is_some_and(|token| token.starts_with(|ch: char| ch.is_ascii_digit()));

        if before || after {
            for idx in &words[start..pos] {
                tokens[*idx] = "0";
            }
        }
    }

    tokens.join(" ")
}
