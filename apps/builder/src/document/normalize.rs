//! Normalization of analysis payloads into the canonical resume document.
//!
//! Pure and infallible: missing or malformed fields silently default, bare
//! scalars become one-element lists, and every repeated section comes out with
//! at least one row so the edit form always has something to show.

use serde_json::Value;

use crate::document::aliases::{
    self, link_text, lookup, lookup_in, lookup_link_in, text, to_list, to_text, to_text_list,
};
use crate::models::analysis::AnalysisPayload;
use crate::models::resume::{
    CanonicalResumeDocument, EducationEntry, ExperienceEntry, PersonalDetails, ProjectEntry, Skill,
};

pub fn normalize(payload: &AnalysisPayload) -> CanonicalResumeDocument {
    let fields = payload.fields();

    let mut doc = CanonicalResumeDocument {
        personal: personal_details(fields),
        summary: text(fields, aliases::SUMMARY),
        skills: to_list(lookup(fields, aliases::SKILLS))
            .into_iter()
            .map(skill)
            .collect(),
        experience: to_list(lookup(fields, aliases::EXPERIENCE))
            .into_iter()
            .map(experience)
            .collect(),
        education: to_list(lookup(fields, aliases::EDUCATION))
            .into_iter()
            .map(education)
            .collect(),
        projects: to_list(lookup(fields, aliases::PROJECTS))
            .into_iter()
            .map(project)
            .collect(),
        languages: to_text_list(lookup(fields, aliases::LANGUAGES)),
        interests: to_text_list(lookup(fields, aliases::INTERESTS)),
        profile_picture: text(fields, aliases::PROFILE_PICTURE),
    };

    insert_placeholders(&mut doc);
    doc
}

/// Gives every empty repeated section a single blank row.
fn insert_placeholders(doc: &mut CanonicalResumeDocument) {
    if doc.skills.is_empty() {
        doc.skills.push(Skill::default());
    }
    if doc.experience.is_empty() {
        doc.experience.push(ExperienceEntry::default());
    }
    if doc.education.is_empty() {
        doc.education.push(EducationEntry::default());
    }
    if doc.projects.is_empty() {
        doc.projects.push(ProjectEntry::default());
    }
    if doc.languages.is_empty() {
        doc.languages.push(String::new());
    }
    if doc.interests.is_empty() {
        doc.interests.push(String::new());
    }
}

fn personal_details(fields: &Value) -> PersonalDetails {
    let mut scopes: Vec<&Value> = aliases::PERSONAL_CONTAINERS
        .iter()
        .filter_map(|key| fields.get(*key))
        .filter(|v| v.is_object())
        .collect();
    scopes.push(fields);

    let field = |names: aliases::Aliases| lookup_in(&scopes, names).map(to_text).unwrap_or_default();
    let link = |names: aliases::Aliases| {
        lookup_link_in(&scopes, names)
            .map(to_text)
            .unwrap_or_default()
    };

    PersonalDetails {
        full_name: field(aliases::FULL_NAME),
        email: field(aliases::EMAIL),
        phone: field(aliases::PHONE),
        location: field(aliases::LOCATION),
        linked_in: link(aliases::LINKED_IN),
        github: link(aliases::GITHUB),
        portfolio: link(aliases::PORTFOLIO),
    }
}

fn skill(value: &Value) -> Skill {
    if value.is_object() {
        Skill {
            name: text(value, aliases::SKILL_NAME),
            level: text(value, aliases::SKILL_LEVEL),
        }
    } else {
        Skill {
            name: to_text(value),
            level: String::new(),
        }
    }
}

fn experience(value: &Value) -> ExperienceEntry {
    if !value.is_object() {
        return ExperienceEntry {
            job_title: to_text(value),
            ..ExperienceEntry::default()
        };
    }

    let mut responsibilities = to_text_list(lookup(value, aliases::RESPONSIBILITIES));
    if responsibilities.is_empty() {
        responsibilities.push(String::new());
    }

    ExperienceEntry {
        job_title: text(value, aliases::JOB_TITLE),
        company: text(value, aliases::COMPANY),
        location: text(value, aliases::EXPERIENCE_LOCATION),
        duration: text(value, aliases::DURATION),
        responsibilities,
    }
}

fn education(value: &Value) -> EducationEntry {
    if !value.is_object() {
        return EducationEntry {
            institution: to_text(value),
            ..EducationEntry::default()
        };
    }
    EducationEntry {
        institution: text(value, aliases::INSTITUTION),
        degree: text(value, aliases::DEGREE),
        year: text(value, aliases::YEAR),
        grade: text(value, aliases::GRADE),
    }
}

fn project(value: &Value) -> ProjectEntry {
    if !value.is_object() {
        return ProjectEntry {
            title: to_text(value),
            ..ProjectEntry::default()
        };
    }
    ProjectEntry {
        title: text(value, aliases::PROJECT_TITLE),
        description: text(value, aliases::PROJECT_DESCRIPTION),
        tech_stack: text(value, aliases::TECH_STACK),
        link: link_text(value, aliases::PROJECT_LINK),
    }
}
