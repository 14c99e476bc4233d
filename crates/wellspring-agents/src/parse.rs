//! Text postprocessing shared by the domain agents and the intent
//! classifier: code-fence handling and JSON extraction from model replies.

/// If the whole reply is wrapped in a fenced code block, return the inner
/// text (any language tag on the opening fence is dropped). Otherwise the
/// trimmed input is returned as-is.
pub fn strip_wrapped_fence(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```")
        && let Some(inner) = rest.strip_suffix("```")
    {
        // Drop the first line only when it is empty or a bare language tag
        // like "json"; anything else on that line is real content.
        let inner = match inner.split_once('\n') {
            Some((first, body))
                if first.trim().chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                body
            }
            _ => inner,
        };
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

/// Keep only the text before the first code fence, discarding the fenced
/// part. Used by the vision agent, which keeps the opposite side of the
/// fence from [`strip_wrapped_fence`].
pub fn text_before_first_fence(text: &str) -> String {
    match text.split_once("```") {
        Some((before, _)) => before.trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Greedy brace match: the substring from the first `{` to the last `}`,
/// so a JSON object survives being embedded amid prose.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// A reply that is a bare JSON object, which the UI should not render as
/// the primary message.
pub fn looks_like_json(text: &str) -> bool {
    text.starts_with('{') && text.ends_with('}')
}
