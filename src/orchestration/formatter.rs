//! Response formatting
//!
//! Models often wrap HTML answers in markdown code fences or surround the
//! document with chatter. The formatter keeps just the document and can
//! splice a diagnostic annotation (response time) into it.

const FENCE: &str = "```";

/// Clean `raw` model output and append `annotation` if given
///
/// Clean input (no fences, no `<html>` document) is returned unchanged apart
/// from the appended annotation.
pub fn format(raw: &str, annotation: Option<&str>) -> String {
    let text = strip_code_fences(raw);
    let candidate = extract_html_document(text).unwrap_or(text);

    match annotation {
        Some(label) => insert_annotation(candidate, label),
        None => candidate.to_string(),
    }
}

/// Remove a leading fence (bare or language-tagged) and a trailing fence
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with(FENCE) && !trimmed.ends_with(FENCE) {
        return raw;
    }

    let mut text = trimmed;
    if let Some(rest) = text.strip_prefix(FENCE) {
        // Drop a language tag such as `html` when it sits alone on the fence line
        text = match rest.split_once('\n') {
            Some((tag, body)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
            _ => rest,
        };
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

/// Substring from the opening `<html` (or a preceding doctype) through the
/// last `</html>`, if both are present
pub fn extract_html_document(text: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    let open = lower.find("<html")?;
    let start = match lower[..open].rfind("<!doctype") {
        Some(doctype) => doctype,
        None => open,
    };
    let close = lower.rfind("</html>")?;
    if close < open {
        return None;
    }
    Some(&text[start..close + "</html>".len()])
}

/// Insert `label` before the closing body tag, or append it
fn insert_annotation(text: &str, label: &str) -> String {
    match text.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(text.len() + label.len());
            out.push_str(&text[..pos]);
            out.push_str(label);
            out.push_str(&text[pos..]);
            out
        }
        None => format!("{}{}", text, label),
    }
}
