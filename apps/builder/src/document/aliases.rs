//! Field alias table and value coercion for upstream analysis payloads.
//!
//! Every logical field lists the upstream names it may arrive under, in
//! priority order. The first alias holding a present value wins. Supporting a
//! new upstream shape means adding a name to the relevant entry here.

use serde_json::Value;

pub type Aliases = &'static [&'static str];

/// Strings the analysis service emits in place of a missing link.
const LINK_SENTINELS: &[&str] = &["not found", "not specified", "not provided", "n/a"];

// ────────────────────────────────────────────────────────────────────────────
// Alias table
// ────────────────────────────────────────────────────────────────────────────

/// Objects that may nest the personal fields. Searched before the root.
pub const PERSONAL_CONTAINERS: Aliases = &["personal", "personalDetails", "personal_details"];

pub const FULL_NAME: Aliases = &["fullName", "full_name", "name"];
pub const EMAIL: Aliases = &["email", "email_address"];
pub const PHONE: Aliases = &["phone", "phone_number", "mobile"];
pub const LOCATION: Aliases = &["location", "address"];
pub const LINKED_IN: Aliases = &["linkedIn", "linkedin", "linkedin_url"];
pub const GITHUB: Aliases = &["github", "github_url"];
pub const PORTFOLIO: Aliases = &["portfolio", "portfolio_url", "website"];

pub const SUMMARY: Aliases = &["summary", "objective", "professional_summary"];
pub const PROFILE_PICTURE: Aliases = &["profilePicture", "profile_pic", "photo"];

pub const SKILLS: Aliases = &["skills", "technical_skills"];
pub const SKILL_NAME: Aliases = &["name", "skill"];
pub const SKILL_LEVEL: Aliases = &["level", "proficiency"];

pub const EXPERIENCE: Aliases = &["experience", "experiences", "work_experience"];
pub const JOB_TITLE: Aliases = &["title", "jobTitle", "job_title", "role"];
pub const COMPANY: Aliases = &["company", "employer", "organization"];
pub const EXPERIENCE_LOCATION: Aliases = &["location"];
pub const DURATION: Aliases = &["duration", "years", "dates"];
pub const RESPONSIBILITIES: Aliases = &["description", "responsibilities", "highlights"];

pub const EDUCATION: Aliases = &["education", "educations"];
pub const INSTITUTION: Aliases = &["college", "institution", "university", "school"];
pub const DEGREE: Aliases = &["degree", "qualification"];
pub const YEAR: Aliases = &["years", "year", "graduation_year"];
pub const GRADE: Aliases = &["score", "grade", "gpa_score", "gpa"];

pub const PROJECTS: Aliases = &["projects"];
pub const PROJECT_TITLE: Aliases = &["title", "name", "project_name"];
pub const PROJECT_DESCRIPTION: Aliases = &["description", "summary"];
pub const TECH_STACK: Aliases = &["tech_stack", "techStack", "technologies"];
pub const PROJECT_LINK: Aliases = &["link", "githubLink", "project_link", "url"];

pub const LANGUAGES: Aliases = &["languages"];
pub const INTERESTS: Aliases = &["interests", "hobbies"];

/// Keys read from an object standing in for a plain string list item,
/// e.g. `{"name": "English"}` or `{"description": "Led the team"}`.
pub const LIST_ITEM_TEXT: Aliases = &["name", "language", "description", "value", "text"];

// ────────────────────────────────────────────────────────────────────────────
// Coercion
// ────────────────────────────────────────────────────────────────────────────

/// Whether a value counts as missing: null or the empty string.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Link fields also treat blank text and the service's sentinels as missing.
pub fn is_absent_link(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || LINK_SENTINELS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
        }
        other => is_absent(other),
    }
}

fn find<'a>(obj: &'a Value, aliases: Aliases, absent: fn(&Value) -> bool) -> Option<&'a Value> {
    let map = obj.as_object()?;
    aliases
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|v| !absent(v))
}

/// Returns the value of the first alias present on `obj`.
pub fn lookup<'a>(obj: &'a Value, aliases: Aliases) -> Option<&'a Value> {
    find(obj, aliases, is_absent)
}

/// Like [`lookup`], searching each scope in order.
pub fn lookup_in<'a>(scopes: &[&'a Value], aliases: Aliases) -> Option<&'a Value> {
    scopes.iter().find_map(|scope| lookup(scope, aliases))
}

/// Like [`lookup_in`] for link fields.
pub fn lookup_link_in<'a>(scopes: &[&'a Value], aliases: Aliases) -> Option<&'a Value> {
    scopes
        .iter()
        .find_map(|scope| find(scope, aliases, is_absent_link))
}

/// Coerces a value into text. Lists are joined with `", "`.
pub fn to_text(value: &Value) -> String {
    if is_absent(value) {
        return String::new();
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => lookup(value, LIST_ITEM_TEXT).map(to_text).unwrap_or_default(),
        Value::Null => String::new(),
    }
}

/// Text of the first present alias, or empty.
pub fn text(obj: &Value, aliases: Aliases) -> String {
    lookup(obj, aliases).map(to_text).unwrap_or_default()
}

/// Text of the first present link alias, or empty.
pub fn link_text(obj: &Value, aliases: Aliases) -> String {
    lookup_link_in(&[obj], aliases).map(to_text).unwrap_or_default()
}

/// Coerces a value into a list: arrays pass through (minus null items), a
/// bare scalar or object becomes a single-element list, absence is empty.
pub fn to_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None => Vec::new(),
        Some(v) if is_absent(v) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(v) => vec![v],
    }
}

/// A list of plain strings. Blank items are kept so edited rows survive.
pub fn to_text_list(value: Option<&Value>) -> Vec<String> {
    to_list(value).into_iter().map(to_text).collect()
}
