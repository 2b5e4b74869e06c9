//! Reply sanitizer.
//!
//! Models often emit hidden reasoning wrapped in `<think>` tags and wrap
//! their whole answer in quotes. `sanitize` strips both so only the spoken
//! line is stored and shown.

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Normalize a raw backend reply into a clean utterance.
///
/// 1. Removes every `<think>...</think>` span, markers included, matching
///    each open marker with the nearest close marker. An open marker with no
///    close marker after it is left untouched.
/// 2. Trims surrounding whitespace.
/// 3. Strips one layer of enclosing double quotes and trims again.
///
/// The pass repeats until the text stops changing, so
/// `sanitize(&sanitize(x)) == sanitize(x)` for every input.
pub fn sanitize(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_once(raw: &str) -> String {
    let stripped = strip_think_blocks(raw);
    let trimmed = stripped.trim();
    strip_enclosing_quotes(trimmed).trim().to_string()
}

fn strip_think_blocks(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find(THINK_OPEN) {
        let after_open = &rest[open + THINK_OPEN.len()..];
        match after_open.find(THINK_CLOSE) {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &after_open[close + THINK_CLOSE.len()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

fn strip_enclosing_quotes(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
