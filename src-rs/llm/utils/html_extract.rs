use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCED_HTML: Regex =
        Regex::new(r"(?is)```html\s*(.*?)```").expect("fenced html pattern is valid");
}

/// Pulls the HTML document out of free-form model output.
///
/// Order: a non-empty fenced ```html block, the first `<!doctype html` (any
/// case), the first `<html`, and finally the whole text trimmed.
pub fn extract_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    if let Some(inner) = FENCED_HTML.captures(text).and_then(|c| c.get(1)) {
        if !inner.as_str().is_empty() {
            return inner.as_str().trim().to_string();
        }
    }

    // ASCII lowering keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();
    if let Some(start) = lowered.find("<!doctype html") {
        return text[start..].trim().to_string();
    }

    if let Some(start) = text.find("<html") {
        return text[start..].trim().to_string();
    }

    text.trim().to_string()
}

/// Truncation heuristic: a finished document closes both body and html.
pub fn is_complete_html(html: &str) -> bool {
    let h = html.to_lowercase();
    h.contains("</body>") && h.contains("</html>")
}
