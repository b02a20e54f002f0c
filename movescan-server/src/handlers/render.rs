//! Minimal server-side HTML for the browser flow.

use movescan_core::ResultId;

use crate::routes::paths;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// Pretty-print the artifact when it parses as JSON, otherwise show it as
/// lossy text. The stored bytes themselves are never altered.
pub fn artifact_text(bytes: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

pub fn result_page(id: &ResultId, bytes: &[u8]) -> String {
    let download = paths::result_download(id);
    let body = format!(
        "<h1>Scan result {id}</h1>\n\
         <p><a href=\"{download}\">Download JSON</a> | \
         <a href=\"{index}\">Scan another archive</a></p>\n\
         <pre>{json}</pre>",
        id = escape(id.as_str()),
        download = escape(&download),
        index = paths::INDEX,
        json = escape(&artifact_text(bytes)),
    );
    page(&format!("Scan result {id}"), &body)
}

pub fn index_page(templates: &[String]) -> String {
    let items = if templates.is_empty() {
        "<p>No templates available.</p>".to_string()
    } else {
        let entries: String = templates
            .iter()
            .map(|name| {
                format!(
                    "<li><a href=\"{href}\">{label}</a></li>\n",
                    href = escape(&paths::template_download(name)),
                    label = escape(name),
                )
            })
            .collect();
        format!("<ul>\n{entries}</ul>")
    };

    let body = format!(
        "<h1>Move bytecode scanner</h1>\n\
         <form action=\"{upload}\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".zip\" required>\n\
         <button type=\"submit\">Scan</button>\n\
         </form>\n\
         <h2>Templates</h2>\n{items}",
        upload = paths::UPLOAD,
    );
    page("Move bytecode scanner", &body)
}
