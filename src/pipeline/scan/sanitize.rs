// Isolate the structured payload from free-form model output.
// Never fails: anything that cannot be narrowed down is passed through
// for the parser to reject.

/// Code-fence marker models wrap structured blocks in.
const FENCE: &str = "```";

/// Strip fence lines and surrounding prose, returning the best candidate
/// for a single JSON object.
pub fn isolate_payload(raw: &str) -> String {
    let unfenced = strip_fences(raw.trim());
    slice_outer_object(&unfenced).to_string()
}

/// When the text opens with a fence, drop every line that starts with one.
fn strip_fences(text: &str) -> String {
    if !text.starts_with(FENCE) {
        return text.to_string();
    }

    text.lines()
        .filter(|line| !line.trim().starts_with(FENCE))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Narrow to the first `{` .. last `}` span unless the text already is one.
fn slice_outer_object(text: &str) -> &str {
    if text.starts_with('{') && text.ends_with('}') {
        return text;
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
