// src/render.rs

use std::fmt::Write;

use crate::extract::Table;

/// Minimal HTML escaper for user-controlled text (file names, cell values,
/// error detail).
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2rem auto; max-width: 60rem; }}\n\
         table {{ border-collapse: collapse; margin-bottom: 1.5rem; }}\n\
         th, td {{ border: 1px solid #999; padding: 0.3rem 0.6rem; }}\n\
         .error {{ color: #b00; }}\n\
         </style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// The upload form, with an optional error banner above it.
pub fn upload_page(error: Option<&str>) -> String {
    let mut body = String::from("<h1>Markdown table extractor</h1>\n");
    if let Some(msg) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(msg));
    }
    body.push_str(
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"markdown\" accept=\".md\">\n\
         <button type=\"submit\">Upload</button>\n\
         </form>\n\
         <p><a href=\"/download\">Download extracted tables as JSON</a></p>\n",
    );
    page("Upload Markdown", &body)
}

/// Results page: every extracted table rendered back out as HTML, in
/// document order, with the header row taken from the first record's keys.
pub fn result_page(source_file: &str, tables: &[Table]) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<h1>Extracted {} table{} from {}</h1>",
        tables.len(),
        if tables.len() == 1 { "" } else { "s" },
        escape_html(source_file)
    );

    for (i, table) in tables.iter().enumerate() {
        let _ = writeln!(body, "<h2>Table {}</h2>", i + 1);
        body.push_str("<table>\n<tr>");
        if let Some(first) = table.first() {
            for header in first.keys() {
                let _ = write!(body, "<th>{}</th>", escape_html(header));
            }
        }
        body.push_str("</tr>\n");
        for record in table {
            body.push_str("<tr>");
            for cell in record.values() {
                let _ = write!(body, "<td>{}</td>", escape_html(cell));
            }
            body.push_str("</tr>\n");
        }
        body.push_str("</table>\n");
    }
    body.push_str("<p><a href=\"/\">Upload another file</a> · <a href=\"/download\">Download JSON</a></p>\n");
    page("Extracted tables", &body)
}
