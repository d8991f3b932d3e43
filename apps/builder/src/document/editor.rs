//! Edit operations over the canonical document.
//!
//! Every operation is copy-on-write: it reads the given document and returns
//! the next value, leaving the input untouched. Removing rows may empty a
//! section; nothing re-inserts a placeholder except an explicit add.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::resume::{
    CanonicalResumeDocument, EducationEntry, ExperienceEntry, ProjectEntry, Skill,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    #[serde(alias = "personalDetails")]
    Personal,
    Summary,
    #[serde(alias = "profile_pic")]
    ProfilePicture,
    Skills,
    Experience,
    Education,
    Projects,
    Languages,
    Interests,
}

impl Section {
    pub const REPEATED: [Section; 6] = [
        Section::Skills,
        Section::Experience,
        Section::Education,
        Section::Projects,
        Section::Languages,
        Section::Interests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Personal => "personal",
            Section::Summary => "summary",
            Section::ProfilePicture => "profilePicture",
            Section::Skills => "skills",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Projects => "projects",
            Section::Languages => "languages",
            Section::Interests => "interests",
        }
    }

    pub fn is_repeated(&self) -> bool {
        Self::REPEATED.contains(self)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("'{0}' is not a repeated section")]
    NotRepeated(Section),

    #[error("'{0}' is a repeated section; an entry index is required")]
    IndexRequired(Section),

    #[error("'{0}' is not a repeated section; no entry index is allowed")]
    IndexNotAllowed(Section),

    #[error("'{section}' has no entry at index {index} (length {len})")]
    IndexOutOfRange {
        section: Section,
        index: usize,
        len: usize,
    },

    #[error("experience entry {exp_index} has no responsibility at index {index} (length {len})")]
    ResponsibilityOutOfRange {
        exp_index: usize,
        index: usize,
        len: usize,
    },

    #[error("unknown field '{field}' for section '{section}'")]
    UnknownField { section: Section, field: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Row plumbing shared by the repeated sections
// ────────────────────────────────────────────────────────────────────────────

/// One row of a repeated section. `Default` is the section's blank template.
trait Row: Default {
    /// Returns `false` if the row has no such field.
    fn set_field(&mut self, field: &str, value: String) -> bool;
}

impl Row for Skill {
    fn set_field(&mut self, field: &str, value: String) -> bool {
        match field {
            "name" => self.name = value,
            "level" => self.level = value,
            _ => return false,
        }
        true
    }
}

impl Row for ExperienceEntry {
    fn set_field(&mut self, field: &str, value: String) -> bool {
        match field {
            "jobTitle" => self.job_title = value,
            "company" => self.company = value,
            "location" => self.location = value,
            "duration" => self.duration = value,
            _ => return false,
        }
        true
    }
}

impl Row for EducationEntry {
    fn set_field(&mut self, field: &str, value: String) -> bool {
        match field {
            "institution" => self.institution = value,
            "degree" => self.degree = value,
            "year" => self.year = value,
            "grade" => self.grade = value,
            _ => return false,
        }
        true
    }
}

impl Row for ProjectEntry {
    fn set_field(&mut self, field: &str, value: String) -> bool {
        match field {
            "title" => self.title = value,
            "description" => self.description = value,
            "techStack" => self.tech_stack = value,
            "link" => self.link = value,
            _ => return false,
        }
        true
    }
}

/// Plain string rows (languages, interests) take the field name `value`.
impl Row for String {
    fn set_field(&mut self, field: &str, value: String) -> bool {
        if field == "value" || field.is_empty() {
            *self = value;
            true
        } else {
            false
        }
    }
}

trait RowList {
    fn len(&self) -> usize;
    fn push_blank(&mut self);
    fn remove_at(&mut self, index: usize);
    fn set_at(&mut self, index: usize, field: &str, value: String) -> bool;
}

impl<R: Row> RowList for Vec<R> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn push_blank(&mut self) {
        self.push(R::default());
    }

    fn remove_at(&mut self, index: usize) {
        self.remove(index);
    }

    fn set_at(&mut self, index: usize, field: &str, value: String) -> bool {
        self[index].set_field(field, value)
    }
}

fn rows_mut(doc: &mut CanonicalResumeDocument, section: Section) -> Option<&mut dyn RowList> {
    match section {
        Section::Skills => Some(&mut doc.skills),
        Section::Experience => Some(&mut doc.experience),
        Section::Education => Some(&mut doc.education),
        Section::Projects => Some(&mut doc.projects),
        Section::Languages => Some(&mut doc.languages),
        Section::Interests => Some(&mut doc.interests),
        Section::Personal | Section::Summary | Section::ProfilePicture => None,
    }
}

fn set_singleton(
    doc: &mut CanonicalResumeDocument,
    section: Section,
    field: &str,
    value: String,
) -> bool {
    let p = &mut doc.personal;
    match (section, field) {
        (Section::Personal, "fullName") => p.full_name = value,
        (Section::Personal, "email") => p.email = value,
        (Section::Personal, "phone") => p.phone = value,
        (Section::Personal, "location") => p.location = value,
        (Section::Personal, "linkedIn") => p.linked_in = value,
        (Section::Personal, "github") => p.github = value,
        (Section::Personal, "portfolio") => p.portfolio = value,
        (Section::Summary, "value" | "summary" | "") => doc.summary = value,
        (Section::ProfilePicture, "value" | "profilePicture" | "") => doc.profile_picture = value,
        _ => return false,
    }
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Updates one scalar field. `index` is `None` for the singleton sections.
pub fn set_field(
    doc: &CanonicalResumeDocument,
    section: Section,
    index: Option<usize>,
    field: &str,
    value: impl Into<String>,
) -> Result<CanonicalResumeDocument, EditError> {
    let mut next = doc.clone();
    let value = value.into();
    let unknown = || EditError::UnknownField {
        section,
        field: field.to_string(),
    };

    match index {
        Some(index) => {
            let rows = rows_mut(&mut next, section).ok_or(EditError::IndexNotAllowed(section))?;
            let len = rows.len();
            if index >= len {
                return Err(EditError::IndexOutOfRange {
                    section,
                    index,
                    len,
                });
            }
            if !rows.set_at(index, field, value) {
                return Err(unknown());
            }
        }
        None if section.is_repeated() => return Err(EditError::IndexRequired(section)),
        None => {
            if !set_singleton(&mut next, section, field, value) {
                return Err(unknown());
            }
        }
    }
    Ok(next)
}

/// Appends the section's blank template. Legal on an empty section.
pub fn add_entry(
    doc: &CanonicalResumeDocument,
    section: Section,
) -> Result<CanonicalResumeDocument, EditError> {
    let mut next = doc.clone();
    rows_mut(&mut next, section)
        .ok_or(EditError::NotRepeated(section))?
        .push_blank();
    Ok(next)
}

/// Removes the row at `index`. Removing past the end changes nothing.
pub fn remove_entry(
    doc: &CanonicalResumeDocument,
    section: Section,
    index: usize,
) -> Result<CanonicalResumeDocument, EditError> {
    let mut next = doc.clone();
    let rows = rows_mut(&mut next, section).ok_or(EditError::NotRepeated(section))?;
    if index < rows.len() {
        rows.remove_at(index);
    }
    Ok(next)
}

fn experience_mut(
    doc: &mut CanonicalResumeDocument,
    exp_index: usize,
) -> Result<&mut ExperienceEntry, EditError> {
    let len = doc.experience.len();
    doc.experience
        .get_mut(exp_index)
        .ok_or(EditError::IndexOutOfRange {
            section: Section::Experience,
            index: exp_index,
            len,
        })
}

pub fn set_responsibility(
    doc: &CanonicalResumeDocument,
    exp_index: usize,
    resp_index: usize,
    value: impl Into<String>,
) -> Result<CanonicalResumeDocument, EditError> {
    let mut next = doc.clone();
    let entry = experience_mut(&mut next, exp_index)?;
    let len = entry.responsibilities.len();
    let slot = entry
        .responsibilities
        .get_mut(resp_index)
        .ok_or(EditError::ResponsibilityOutOfRange {
            exp_index,
            index: resp_index,
            len,
        })?;
    *slot = value.into();
    Ok(next)
}

pub fn add_responsibility(
    doc: &CanonicalResumeDocument,
    exp_index: usize,
) -> Result<CanonicalResumeDocument, EditError> {
    let mut next = doc.clone();
    experience_mut(&mut next, exp_index)?
        .responsibilities
        .push(String::new());
    Ok(next)
}

/// Removes one responsibility line. Removing past the end changes nothing.
pub fn remove_responsibility(
    doc: &CanonicalResumeDocument,
    exp_index: usize,
    resp_index: usize,
) -> Result<CanonicalResumeDocument, EditError> {
    let mut next = doc.clone();
    let entry = experience_mut(&mut next, exp_index)?;
    if resp_index < entry.responsibilities.len() {
        entry.responsibilities.remove(resp_index);
    }
    Ok(next)
}

/// A single edit as sent by the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FormEdit {
    SetField {
        section: Section,
        #[serde(default)]
        index: Option<usize>,
        field: String,
        value: String,
    },
    AddEntry {
        section: Section,
    },
    RemoveEntry {
        section: Section,
        index: usize,
    },
    SetResponsibility {
        exp_index: usize,
        resp_index: usize,
        value: String,
    },
    AddResponsibility {
        exp_index: usize,
    },
    RemoveResponsibility {
        exp_index: usize,
        resp_index: usize,
    },
}

impl FormEdit {
    pub fn apply(
        &self,
        doc: &CanonicalResumeDocument,
    ) -> Result<CanonicalResumeDocument, EditError> {
        match self {
            FormEdit::SetField {
                section,
                index,
                field,
                value,
            } => set_field(doc, *section, *index, field, value.as_str()),
            FormEdit::AddEntry { section } => add_entry(doc, *section),
            FormEdit::RemoveEntry { section, index } => remove_entry(doc, *section, *index),
            FormEdit::SetResponsibility {
                exp_index,
                resp_index,
                value,
            } => set_responsibility(doc, *exp_index, *resp_index, value.as_str()),
            FormEdit::AddResponsibility { exp_index } => add_responsibility(doc, *exp_index),
            FormEdit::RemoveResponsibility {
                exp_index,
                resp_index,
            } => remove_responsibility(doc, *exp_index, *resp_index),
        }
    }
}

/// Applies edits strictly in order, each against the previous result.
/// Stops at the first failing edit and leaves the input untouched.
pub fn apply_all(
    doc: &CanonicalResumeDocument,
    edits: &[FormEdit],
) -> Result<CanonicalResumeDocument, EditError> {
    edits
        .iter()
        .try_fold(doc.clone(), |current, edit| edit.apply(&current))
}
