use serde::Serialize;
use thiserror::Error;

use crate::models::resume::CanonicalResumeDocument;

/// Personal fields that must be filled before anything is sent for generation.
const REQUIRED_PERSONAL_FIELDS: &[&str] = &["fullName", "email", "phone"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Checks the document is complete enough to submit. Runs before any network call.
pub fn validate_for_submission(doc: &CanonicalResumeDocument) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = REQUIRED_PERSONAL_FIELDS
        .iter()
        .copied()
        .filter(|field| personal_value(doc, field).trim().is_empty())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { missing })
    }
}

fn personal_value<'a>(doc: &'a CanonicalResumeDocument, field: &str) -> &'a str {
    match field {
        "fullName" => &doc.personal.full_name,
        "email" => &doc.personal.email,
        "phone" => &doc.personal.phone,
        _ => "",
    }
}
