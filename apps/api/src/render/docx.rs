//! DOCX export. Builds the WordprocessingML body paragraph-by-paragraph with
//! explicit run properties, then packages the minimal OPC parts into a zip.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ResumeDocument, RenderError};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#;

const ACCENT_COLOR: &str = "555566";

/// Assembles WordprocessingML paragraphs. Sizes are half-points, matching the
/// `w:sz` unit.
struct DocxBuilder {
    body: String,
}

impl DocxBuilder {
    fn new() -> Self {
        Self {
            body: String::new(),
        }
    }

    fn paragraph(&mut self, text: &str, half_points: u32, bold: bool, color: Option<&str>) {
        if text.is_empty() {
            return;
        }
        let mut props = format!("<w:sz w:val=\"{half_points}\"/>");
        if bold {
            props.push_str("<w:b/>");
        }
        if let Some(color) = color {
            props.push_str(&format!("<w:color w:val=\"{color}\"/>"));
        }
        self.body.push_str(&format!(
            "<w:p><w:r><w:rPr>{props}</w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape_xml(text)
        ));
    }

    fn heading(&mut self, text: &str) {
        self.paragraph(text, 26, true, None);
    }

    fn body_text(&mut self, text: &str) {
        self.paragraph(text, 20, false, None);
    }

    fn sub_text(&mut self, text: &str) {
        self.paragraph(text, 20, false, Some(ACCENT_COLOR));
    }

    fn bullet(&mut self, text: &str) {
        self.body_text(&format!("• {text}"));
    }

    fn into_document_xml(self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            self.body
        )
    }
}

/// Builds a DOCX buffer mirroring the HTML layout section-by-section.
pub fn render_docx(doc: &ResumeDocument) -> Result<Vec<u8>, RenderError> {
    let mut builder = DocxBuilder::new();

    builder.paragraph(&doc.personal_info.name, 40, true, None);
    let contact: Vec<&str> = [
        doc.personal_info.email.as_str(),
        doc.personal_info.phone.as_str(),
        doc.personal_info.location.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();
    builder.sub_text(&contact.join("  |  "));

    if !doc.summary.is_empty() {
        builder.heading("Summary");
        builder.body_text(&doc.summary);
    }

    if !doc.experience.is_empty() {
        builder.heading("Experience");
        for exp in &doc.experience {
            builder.paragraph(&format!("{} — {}", exp.title, exp.company), 22, true, None);
            let sub = format!("{} – {}  {}", exp.start_date, exp.end_date, exp.location);
            if !sub.trim_matches(['–', ' ']).is_empty() {
                builder.sub_text(sub.trim());
            }
            for h in &exp.highlights {
                builder.bullet(h);
            }
        }
    }

    if !doc.education.is_empty() {
        builder.heading("Education");
        for edu in &doc.education {
            builder.paragraph(&edu.degree, 22, true, None);
            builder.sub_text(&format!("{}  {}", edu.institution, edu.year));
        }
    }

    if !doc.skills.is_empty() {
        builder.heading("Skills");
        builder.body_text(&doc.skills.join(", "));
    }

    package(builder.into_document_xml())
}

fn package(document_xml: String) -> Result<Vec<u8>, RenderError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &str); 4] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
        ("word/document.xml", &document_xml),
    ];
    for (name, content) in parts {
        writer
            .start_file(name, options)
            .and_then(|_| writer.write_all(content.as_bytes()).map_err(Into::into))
            .map_err(|e| RenderError::Docx(format!("could not write {name}: {e}")))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| RenderError::Docx(format!("could not finalize archive: {e}")))?;
    let buffer = cursor.into_inner();
    if buffer.is_empty() {
        return Err(RenderError::Docx("generated buffer is empty".to_string()));
    }
    Ok(buffer)
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_docx_text;
    use crate::render::PersonalInfo;

    fn sample_doc() -> ResumeDocument {
        ResumeDocument {
            personal_info: PersonalInfo {
                name: "Jane & Co <Doe>".to_string(),
                email: "jane@example.com".to_string(),
                ..Default::default()
            },
            summary: "Engineer".to_string(),
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_output_is_a_valid_archive_with_document_part() {
        let buffer = render_docx(&sample_doc()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(&buffer[..])).unwrap();
        assert!(archive.by_name("word/document.xml").is_ok());
        assert!(archive.by_name("[Content_Types].xml").is_ok());
    }

    #[test]
    fn test_roundtrips_through_the_extractor() {
        let buffer = render_docx(&sample_doc()).unwrap();
        let text = extract_docx_text(&buffer).unwrap();
        assert!(text.contains("Jane & Co <Doe>"));
        assert!(text.contains("Rust, SQL"));
    }

    #[test]
    fn test_user_data_is_xml_escaped() {
        let mut builder = DocxBuilder::new();
        builder.body_text("a < b & c");
        let xml = builder.into_document_xml();
        assert!(xml.contains("a &lt; b &amp; c"));
    }
}
