// Instruction block shared verbatim by every provider.

const RULES: [&str; 6] = [
    "You are a senior UI engineer.",
    "Task: Apply the requested change to the given UI and return the updated full HTML only.",
    "Rules:",
    "- Return only HTML starting with <!DOCTYPE html>. No Markdown, no explanations.",
    "- Preserve ALL existing content and structure; do not remove sections. Only modify what the change requires.",
    "- Keep the layout mobile-first and consistent with the original.",
];

pub fn compose_prompt(change_prompt: Option<&str>, before_code: Option<&str>) -> String {
    let prompt = change_prompt
        .filter(|p| !p.is_empty())
        .unwrap_or("(no prompt provided)");
    let before = match before_code.filter(|c| !c.is_empty()) {
        Some(code) => format!("\nBefore HTML:\n{}", code),
        None => "\nBefore HTML: (not provided)".to_string(),
    };

    format!(
        "{}\n\nUser change request:\n{}\n{}",
        RULES.join("\n"),
        prompt,
        before
    )
}
