//! Self-contained HTML rendering with inlined styling. All user data is
//! escaped; template CSS is appended after the base stylesheet.

use super::ResumeDocument;

const BASE_CSS: &str = "\
body { font-family: Helvetica, Arial, sans-serif; color: #1a1a2e; margin: 40px; }
h1 { font-size: 24px; margin-bottom: 2px; }
h2 { font-size: 15px; border-bottom: 1px solid #d0d0d8; padding-bottom: 3px; margin-top: 22px; }
.contact { color: #555566; font-size: 12px; }
.entry-head { font-weight: bold; margin-top: 10px; }
.entry-sub { color: #555566; font-size: 12px; font-style: italic; }
ul { margin: 4px 0 0 18px; }
li { font-size: 13px; margin-bottom: 2px; }
p { font-size: 13px; }";

pub fn render_html(doc: &ResumeDocument, template_css: Option<&str>) -> String {
    let mut body = String::new();

    body.push_str(&format!("<h1>{}</h1>\n", escape_html(&doc.personal_info.name)));
    let contact: Vec<&str> = [
        doc.personal_info.email.as_str(),
        doc.personal_info.phone.as_str(),
        doc.personal_info.location.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();
    if !contact.is_empty() {
        body.push_str(&format!(
            "<div class=\"contact\">{}</div>\n",
            escape_html(&contact.join(" · "))
        ));
    }

    if !doc.summary.is_empty() {
        body.push_str("<h2>Summary</h2>\n");
        body.push_str(&format!("<p>{}</p>\n", escape_html(&doc.summary)));
    }

    if !doc.experience.is_empty() {
        body.push_str("<h2>Experience</h2>\n");
        for exp in &doc.experience {
            body.push_str(&format!(
                "<div class=\"entry-head\">{} — {}</div>\n",
                escape_html(&exp.title),
                escape_html(&exp.company)
            ));
            let dates = format!("{} – {}", exp.start_date, exp.end_date);
            body.push_str(&format!(
                "<div class=\"entry-sub\">{} {}</div>\n",
                escape_html(dates.trim_matches(['–', ' '])),
                escape_html(&exp.location)
            ));
            if !exp.highlights.is_empty() {
                body.push_str("<ul>\n");
                for h in &exp.highlights {
                    body.push_str(&format!("<li>{}</li>\n", escape_html(h)));
                }
                body.push_str("</ul>\n");
            }
        }
    }

    if !doc.education.is_empty() {
        body.push_str("<h2>Education</h2>\n");
        for edu in &doc.education {
            body.push_str(&format!(
                "<div class=\"entry-head\">{}</div>\n<div class=\"entry-sub\">{} {}</div>\n",
                escape_html(&edu.degree),
                escape_html(&edu.institution),
                escape_html(&edu.year)
            ));
        }
    }

    if !doc.skills.is_empty() {
        body.push_str("<h2>Skills</h2>\n");
        body.push_str(&format!("<p>{}</p>\n", escape_html(&doc.skills.join(", "))));
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><style>{}{}</style></head>\n<body>\n{}</body></html>\n",
        BASE_CSS,
        template_css.unwrap_or(""),
        body
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
