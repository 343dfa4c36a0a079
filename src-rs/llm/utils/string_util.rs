/// First `max_chars` characters of `s` with every whitespace run collapsed to
/// one space, for single-line log previews.
pub fn collapsed_preview(s: &str, max_chars: usize) -> String {
    let head: String = s.chars().take(max_chars).collect();
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}
