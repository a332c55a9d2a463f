use serde::{Deserialize, Serialize};

/// Placeholder for any scalar field whose value could not be determined.
pub const SENTINEL: &str = "Not provided";

/// The structured profile the dialogue agent collects during a session.
///
/// Scalars never hold `null`: anything unknown is [`SENTINEL`]. List fields
/// are plain string sequences whose order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Record identifier as assigned by whoever produced it.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Goals for the next year or two.
    pub short_term_goals: String,
    /// Longer horizon goals.
    pub long_term_goals: String,
    /// Professional background.
    pub background: String,
    /// Self-reported strengths.
    pub strengths: Vec<String>,
    /// What drives the person.
    pub motivations: String,
    /// Personal values.
    pub values: Vec<String>,
    /// Areas of career focus.
    pub career_focus: Vec<String>,
    /// Diversity, equity and inclusion interests.
    pub dei_interests: String,
    /// What the person looks for in a mentor.
    pub mentor_preferences: String,
    /// Short narrative summary written by the agent.
    pub professional_summary: String,
    /// Creation timestamp, when the storing backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp, when the storing backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Backend-side status tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Backend-side provenance tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Default for ProfileRecord {
    fn default() -> Self {
        Self {
            id: SENTINEL.to_string(),
            name: SENTINEL.to_string(),
            email: SENTINEL.to_string(),
            phone: SENTINEL.to_string(),
            short_term_goals: SENTINEL.to_string(),
            long_term_goals: SENTINEL.to_string(),
            background: SENTINEL.to_string(),
            strengths: Vec::new(),
            motivations: SENTINEL.to_string(),
            values: Vec::new(),
            career_focus: Vec::new(),
            dei_interests: SENTINEL.to_string(),
            mentor_preferences: SENTINEL.to_string(),
            professional_summary: SENTINEL.to_string(),
            created_at: None,
            updated_at: None,
            status: None,
            source: None,
        }
    }
}

impl ProfileRecord {
    /// Decode a record from loosely shaped JSON.
    ///
    /// Returns `None` only when `value` is not an object. Missing, null or
    /// blank scalars become [`SENTINEL`]; numbers and booleans are rendered as
    /// text; a bare string in a list field becomes a one-element list.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let scalar = |key: &str| scalar_field(obj.get(key));
        let list = |key: &str| list_field(obj.get(key));
        let meta = |key: &str| optional_field(obj.get(key));

        Some(Self {
            id: scalar("id"),
            name: scalar("name"),
            email: scalar("email"),
            phone: scalar("phone"),
            short_term_goals: scalar("short_term_goals"),
            long_term_goals: scalar("long_term_goals"),
            background: scalar("background"),
            strengths: list("strengths"),
            motivations: scalar("motivations"),
            values: list("values"),
            career_focus: list("career_focus"),
            dei_interests: scalar("dei_interests"),
            mentor_preferences: scalar("mentor_preferences"),
            professional_summary: scalar("professional_summary"),
            created_at: meta("created_at"),
            updated_at: meta("updated_at"),
            status: meta("status"),
            source: meta("source"),
        })
    }

    /// A record counts as found once it has a real name or e-mail.
    pub fn is_found(&self) -> bool {
        is_known(&self.name) || is_known(&self.email)
    }
}

/// `true` when `value` is neither blank nor the sentinel.
pub fn is_known(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != SENTINEL
}

fn optional_field(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_field(value: Option<&serde_json::Value>) -> String {
    optional_field(value).unwrap_or_else(|| SENTINEL.to_string())
}

fn list_field(value: Option<&serde_json::Value>) -> Vec<String> {
    match value {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| optional_field(Some(item)))
            .collect(),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
