//! Renders structured resume data to HTML, PDF, and DOCX.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::resume::ResumeRow;

pub mod docx;
pub mod html;
pub mod pdf;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("DOCX generation failed: {0}")]
    Docx(String),
}

/// A resume as typed sections rather than free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDocument {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub year: String,
}

/// Builds a `ResumeDocument` from a stored resume. Prefers the structured
/// JSON column, then the content column parsed as JSON; plain-text content
/// falls back to a synthesized document with the raw text as the summary.
pub fn document_from_resume(resume: &ResumeRow) -> ResumeDocument {
    if let Some(structured) = &resume.structured {
        if let Ok(doc) = serde_json::from_value::<ResumeDocument>(structured.clone()) {
            return doc;
        }
    }
    if let Ok(doc) = serde_json::from_str::<ResumeDocument>(&resume.content) {
        return doc;
    }
    ResumeDocument {
        personal_info: PersonalInfo {
            name: resume.title.clone(),
            ..Default::default()
        },
        summary: resume.content.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn resume(content: &str, structured: Option<serde_json::Value>) -> ResumeRow {
        ResumeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "My Resume".to_string(),
            content: content.to_string(),
            structured,
            file_name: None,
            file_size: None,
            file_mime: None,
            template_id: None,
            status: "draft".to_string(),
            version: 1,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_structured_column_wins() {
        let structured = serde_json::json!({
            "personalInfo": {"name": "Jane Doe"},
            "skills": ["Rust"]
        });
        let doc = document_from_resume(&resume("ignored", Some(structured)));
        assert_eq!(doc.personal_info.name, "Jane Doe");
        assert_eq!(doc.skills, vec!["Rust"]);
    }

    #[test]
    fn test_json_content_parses_when_structured_missing() {
        let content = r#"{"summary": "Seasoned engineer", "skills": ["Go"]}"#;
        let doc = document_from_resume(&resume(content, None));
        assert_eq!(doc.summary, "Seasoned engineer");
    }

    #[test]
    fn test_plain_text_content_falls_back_to_summary() {
        let doc = document_from_resume(&resume("just extracted resume text", None));
        assert_eq!(doc.summary, "just extracted resume text");
        assert_eq!(doc.personal_info.name, "My Resume");
        assert!(doc.experience.is_empty());
    }
}
