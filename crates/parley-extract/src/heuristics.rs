//! Best-effort text mining over transcript content.
//!
//! Everything here is a pure function over text. A miss is an expected
//! outcome and is reported as `None`, never as an error.

use chrono::Utc;
use parley_core::{ProfileRecord, Speaker, TranscriptTurn, SENTINEL, SUMMARY_END, SUMMARY_START};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "(?s){}(.*?){}",
        regex::escape(SUMMARY_START),
        regex::escape(SUMMARY_END)
    ))
});
static LOOSE_JSON_RE: LazyLock<Regex> = LazyLock::new(|| compile(r#"(?s)\{.*"name".*\}"#));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(?:name is|I'm|call me)\s+([A-Za-z\s]+)"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(\+?[\d\s\-\(\)]{10,})"));

/// Phrase the agent uses when it believes it has everything.
const COMPLETION_PHRASE: &str = "captured";
const MIN_PHONE_DIGITS: usize = 7;

/// Contact details mined from free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinedDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl MinedDetails {
    /// Only a name or an e-mail makes the mined details usable.
    pub fn is_usable(&self) -> bool {
        self.name.is_some() || self.email.is_some()
    }

    /// Expand into a full record with a fresh `extracted-<millis>` id.
    pub fn into_record(self) -> ProfileRecord {
        let or_sentinel = |v: Option<String>| v.unwrap_or_else(|| SENTINEL.to_string());
        ProfileRecord {
            id: format!("extracted-{}", Utc::now().timestamp_millis()),
            name: or_sentinel(self.name),
            email: or_sentinel(self.email),
            phone: or_sentinel(self.phone),
            ..ProfileRecord::default()
        }
    }
}

/// Run the name, e-mail and phone extractors independently over `text`.
pub fn mine_contact_details(text: &str) -> MinedDetails {
    let name = NAME_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|n| !n.is_empty());
    let email = EMAIL_RE.captures(text).map(|c| c[1].to_string());
    let phone = PHONE_RE
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .find(|p| p.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS);
    MinedDetails { name, email, phone }
}

/// The trimmed contents of the first structured summary block in `text`.
pub fn find_summary_block(text: &str) -> Option<&str> {
    SUMMARY_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// The first brace-balanced `{...}` span that starts after `marker`.
///
/// Braces inside JSON strings are ignored. Returns `None` when the marker is
/// absent or the span never closes.
pub fn first_json_object_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let after = text.find(marker)? + marker.len();
    let start = after + text[after..].find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// `true` when the object exposes a non-empty `name` or `email`.
pub fn exposes_contact(value: &serde_json::Value) -> bool {
    ["name", "email"].iter().any(|key| {
        value
            .get(key)
            .and_then(serde_json::Value::as_str)
            .is_some_and(|s| !s.trim().is_empty())
    })
}

/// Recover a profile from the tail of the transcript.
///
/// Looks at the last `window` agent turns, newest first: a delimited
/// structured summary wins, then a free-floating JSON object with a
/// `"name"` key. Failing both, if the agent announced completion, the whole
/// conversation is mined for contact details.
pub fn extract_from_transcript(turns: &[TranscriptTurn], window: usize) -> Option<ProfileRecord> {
    let agent_turns: Vec<&TranscriptTurn> = turns
        .iter()
        .filter(|t| t.speaker == Speaker::Agent)
        .collect();
    let recent = &agent_turns[agent_turns.len().saturating_sub(window)..];
    debug!(agent_turns = recent.len(), "Scanning transcript for a profile");

    if let Some(record) = recent.iter().rev().find_map(|t| summary_record(&t.text)) {
        return Some(record);
    }
    if let Some(record) = recent.iter().rev().find_map(|t| loose_json_record(&t.text)) {
        return Some(record);
    }

    let announced = recent.iter().any(|t| {
        let lower = t.text.to_lowercase();
        lower.contains(COMPLETION_PHRASE) && lower.contains("information")
    });
    if !announced {
        return None;
    }

    let all_text = turns
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let mined = mine_contact_details(&all_text);
    debug!(?mined, "Mined contact details from conversation");
    mined.is_usable().then(|| mined.into_record())
}

fn summary_record(text: &str) -> Option<ProfileRecord> {
    let block = find_summary_block(text)?;
    let parsed: serde_json::Value = match serde_json::from_str(block) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Structured summary is not valid JSON");
            return None;
        }
    };
    let candidate = match parsed.get("user_profile") {
        Some(profile) if profile.is_object() => profile,
        _ if exposes_contact(&parsed) => &parsed,
        _ => return None,
    };
    ProfileRecord::from_json(candidate).filter(ProfileRecord::is_found)
}

fn loose_json_record(text: &str) -> Option<ProfileRecord> {
    let span = LOOSE_JSON_RE.find(text)?.as_str();
    let parsed: serde_json::Value = match serde_json::from_str(span) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Inline JSON in agent turn did not parse");
            return None;
        }
    };
    if !exposes_contact(&parsed) {
        return None;
    }
    ProfileRecord::from_json(&parsed).filter(ProfileRecord::is_found)
}
