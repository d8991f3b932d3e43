use crate::models::artifact::TemplateInfo;

/// Display info for the templates the renderer ships with.
const KNOWN_TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "modern",
        "Modern Professional",
        "Contemporary design with clean layout and modern typography",
    ),
    (
        "classic",
        "Classic Traditional",
        "Timeless format that works well across all industries",
    ),
    (
        "minimalist",
        "Clean Minimalist",
        "Simple and elegant design that highlights your content",
    ),
];

const FALLBACK_DESCRIPTION: &str = "Professional resume template designed to impress";

pub fn template_info(template_name: &str) -> TemplateInfo {
    KNOWN_TEMPLATES
        .iter()
        .find(|(name, _, _)| *name == template_name)
        .map(|(_, title, description)| TemplateInfo {
            title: title.to_string(),
            description: description.to_string(),
        })
        .unwrap_or_else(|| TemplateInfo {
            title: capitalize(template_name),
            description: FALLBACK_DESCRIPTION.to_string(),
        })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().to_string() + chars.as_str(),
    }
}
