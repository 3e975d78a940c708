/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip an enclosing markdown code fence from a response.
///
/// Handles a bare fence, a fence with a language tag (```` ```json ````) on
/// its own line or glued to the payload, and unterminated fences. Text
/// without a leading fence is only trimmed.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find('\n') {
        Some(idx) if is_language_tag(rest[..idx].trim()) => &rest[idx + 1..],
        _ => strip_inline_tag(rest),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn is_language_tag(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Drop a tag directly followed by a JSON payload: ```` ```json{"a":1} ````.
fn strip_inline_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let after = &rest[tag_len..];
    if tag_len > 0 && after.trim_start().starts_with(['{', '[']) {
        after
    } else {
        rest
    }
}
