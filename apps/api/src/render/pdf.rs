//! PDF export built directly with `lopdf` at A4 dimensions with fixed
//! margins. The original product drove a headless browser for this; building
//! the page objects ourselves removes that external process entirely.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::{ResumeDocument, RenderError};

const PAGE_WIDTH: f32 = 595.0; // A4 in points
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 13.0;
const NAME_SIZE: f32 = 20.0;
const LINE_GAP: f32 = 4.0;
/// Rough per-character width for wrapping Helvetica at a given size.
const CHAR_WIDTH_FACTOR: f32 = 0.5;

struct Line {
    text: String,
    size: f32,
    bold: bool,
    space_before: f32,
}

/// Renders the resume as a multi-page PDF and validates the output carries
/// the `%PDF` signature.
pub fn render_pdf(doc: &ResumeDocument) -> Result<Vec<u8>, RenderError> {
    let lines = layout_lines(doc);
    let buffer = build_document(&lines).map_err(|e| RenderError::Pdf(e.to_string()))?;

    if buffer.len() < 4 || &buffer[..4] != b"%PDF" {
        return Err(RenderError::Pdf(
            "generated buffer is missing the PDF signature".to_string(),
        ));
    }
    Ok(buffer)
}

fn layout_lines(doc: &ResumeDocument) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut push = |text: &str, size: f32, bold: bool, space_before: f32| {
        for wrapped in wrap(text, size) {
            lines.push(Line {
                text: wrapped,
                size,
                bold,
                space_before,
            });
        }
    };

    push(&doc.personal_info.name, NAME_SIZE, true, 0.0);
    let contact: Vec<&str> = [
        doc.personal_info.email.as_str(),
        doc.personal_info.phone.as_str(),
        doc.personal_info.location.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();
    if !contact.is_empty() {
        push(&contact.join("  |  "), BODY_SIZE, false, 2.0);
    }

    if !doc.summary.is_empty() {
        push("Summary", HEADING_SIZE, true, 14.0);
        push(&doc.summary, BODY_SIZE, false, 2.0);
    }

    if !doc.experience.is_empty() {
        push("Experience", HEADING_SIZE, true, 14.0);
        for exp in &doc.experience {
            push(
                &format!("{} — {}", exp.title, exp.company),
                BODY_SIZE + 1.0,
                true,
                8.0,
            );
            let sub = format!("{} – {}  {}", exp.start_date, exp.end_date, exp.location);
            if !sub.trim_matches(['–', ' ']).is_empty() {
                push(sub.trim(), BODY_SIZE, false, 1.0);
            }
            for h in &exp.highlights {
                push(&format!("- {h}"), BODY_SIZE, false, 1.0);
            }
        }
    }

    if !doc.education.is_empty() {
        push("Education", HEADING_SIZE, true, 14.0);
        for edu in &doc.education {
            push(&edu.degree, BODY_SIZE + 1.0, true, 6.0);
            push(
                &format!("{}  {}", edu.institution, edu.year),
                BODY_SIZE,
                false,
                1.0,
            );
        }
    }

    if !doc.skills.is_empty() {
        push("Skills", HEADING_SIZE, true, 14.0);
        push(&doc.skills.join(", "), BODY_SIZE, false, 2.0);
    }

    lines
}

/// Greedy word wrap against the printable width.
fn wrap(text: &str, size: f32) -> Vec<String> {
    let max_chars =
        ((PAGE_WIDTH - 2.0 * MARGIN) / (size * CHAR_WIDTH_FACTOR)).max(8.0) as usize;
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn build_document(lines: &[Line]) -> lopdf::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut operations: Vec<Operation> = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    let mut flush_page =
        |doc: &mut Document, ops: &mut Vec<Operation>, kids: &mut Vec<Object>| -> lopdf::Result<()> {
            let content = Content {
                operations: std::mem::take(ops),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
            Ok(())
        };

    for line in lines {
        let advance = line.space_before + line.size + LINE_GAP;
        if y - advance < MARGIN {
            flush_page(&mut doc, &mut operations, &mut kids)?;
            y = PAGE_HEIGHT - MARGIN;
        }
        y -= advance;

        let font = if line.bold { "F2" } else { "F1" };
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
        operations.push(Operation::new("Td", vec![MARGIN.into(), y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_pdf_text(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    flush_page(&mut doc, &mut operations, &mut kids)?;

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// The base fonts only cover Latin-1; anything outside it is substituted.
fn to_pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ExperienceEntry, PersonalInfo};

    fn sample_doc() -> ResumeDocument {
        ResumeDocument {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                ..Default::default()
            },
            summary: "Backend engineer with a decade of distributed-systems work.".to_string(),
            experience: vec![ExperienceEntry {
                title: "Staff Engineer".to_string(),
                company: "Initech".to_string(),
                start_date: "2019".to_string(),
                end_date: "present".to_string(),
                highlights: vec!["Cut p99 latency by 40%".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_output_carries_pdf_signature() {
        let buffer = render_pdf(&sample_doc()).unwrap();
        assert!(buffer.len() > 4);
        assert_eq!(&buffer[..4], b"%PDF");
    }

    #[test]
    fn test_long_content_spills_to_multiple_pages() {
        let mut doc = sample_doc();
        doc.experience = (0..60)
            .map(|i| ExperienceEntry {
                title: format!("Role {i}"),
                company: "Acme".to_string(),
                highlights: vec!["Did the thing".to_string(); 3],
                ..Default::default()
            })
            .collect();
        let buffer = render_pdf(&doc).unwrap();
        let parsed = lopdf::Document::load_mem(&buffer).unwrap();
        assert!(parsed.get_pages().len() > 1);
    }

    #[test]
    fn test_wrap_respects_width() {
        let long = "word ".repeat(100);
        for line in wrap(&long, BODY_SIZE) {
            assert!(line.chars().count() <= 100);
        }
    }

    #[test]
    fn test_non_latin1_substituted() {
        assert_eq!(to_pdf_text("héllo — 日本"), "héllo ? ??");
    }
}
