//! The record shape the remote store endpoint persists a resume under.

use serde::Serialize;

use crate::models::resume::{CanonicalResumeDocument, EducationEntry, ProjectEntry, Skill};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsibilityRecord {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceRecord {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub duration: String,
    pub responsibilities: Vec<ResponsibilityRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedRecord {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeRecord {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin_url: String,
    pub github_url: String,
    pub portfolio_url: String,
    pub summary: String,
    pub profile_pic: String,
    pub skills: Vec<Skill>,
    pub experiences: Vec<ExperienceRecord>,
    pub educations: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub languages: Vec<NamedRecord>,
    pub interests: Vec<NamedRecord>,
}

impl From<&CanonicalResumeDocument> for ResumeRecord {
    fn from(doc: &CanonicalResumeDocument) -> Self {
        let named = |items: &[String]| -> Vec<NamedRecord> {
            items
                .iter()
                .map(|name| NamedRecord { name: name.clone() })
                .collect()
        };

        Self {
            full_name: doc.personal.full_name.clone(),
            email: doc.personal.email.clone(),
            phone: doc.personal.phone.clone(),
            location: doc.personal.location.clone(),
            linkedin_url: doc.personal.linked_in.clone(),
            github_url: doc.personal.github.clone(),
            portfolio_url: doc.personal.portfolio.clone(),
            summary: doc.summary.clone(),
            profile_pic: doc.profile_picture.clone(),
            skills: doc.skills.clone(),
            experiences: doc
                .experience
                .iter()
                .map(|exp| ExperienceRecord {
                    job_title: exp.job_title.clone(),
                    company: exp.company.clone(),
                    location: exp.location.clone(),
                    duration: exp.duration.clone(),
                    responsibilities: exp
                        .responsibilities
                        .iter()
                        .map(|r| ResponsibilityRecord {
                            description: r.clone(),
                        })
                        .collect(),
                })
                .collect(),
            educations: doc.education.clone(),
            projects: doc.projects.clone(),
            languages: named(&doc.languages),
            interests: named(&doc.interests),
        }
    }
}
