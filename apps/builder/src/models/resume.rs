use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linked_in: String,
    pub github: String,
    pub portfolio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub duration: String,
    pub responsibilities: Vec<String>,
}

impl Default for ExperienceEntry {
    /// A blank experience row still carries one blank responsibility line.
    fn default() -> Self {
        Self {
            job_title: String::new(),
            company: String::new(),
            location: String::new(),
            duration: String::new(),
            responsibilities: vec![String::new()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub year: String,
    pub grade: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub title: String,
    pub description: String,
    pub tech_stack: String,
    pub link: String,
}

/// The single editable representation of a resume.
///
/// Built once per analysis result by `document::normalize` and afterwards
/// changed only through `document::editor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResumeDocument {
    pub personal: PersonalDetails,
    pub summary: String,
    pub skills: Vec<Skill>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub languages: Vec<String>,
    pub interests: Vec<String>,
    /// Data URL (`data:<mime>;base64,...`) or empty.
    pub profile_picture: String,
}

impl Default for CanonicalResumeDocument {
    /// The blank form: every repeated section holds one placeholder row.
    fn default() -> Self {
        Self {
            personal: PersonalDetails::default(),
            summary: String::new(),
            skills: vec![Skill::default()],
            experience: vec![ExperienceEntry::default()],
            education: vec![EducationEntry::default()],
            projects: vec![ProjectEntry::default()],
            languages: vec![String::new()],
            interests: vec![String::new()],
            profile_picture: String::new(),
        }
    }
}

impl CanonicalResumeDocument {
    /// Display name used when the legacy contract needs a `full_name`.
    pub fn display_name(&self) -> &str {
        let name = self.personal.full_name.trim();
        if name.is_empty() {
            "Resume"
        } else {
            name
        }
    }
}
