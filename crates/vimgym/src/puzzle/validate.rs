//! Completion check: has the buffer reached the goal text?

/// Compares buffer text with goal text, ignoring one trailing line terminator
/// on each side. Leading and internal line breaks must match exactly.
pub fn is_complete(current: &str, goal: &str) -> bool {
    strip_one_newline(current) == strip_one_newline(goal)
}

fn strip_one_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_complete() {
        let cases = [
            ("exact match", "hello world", "hello world", true),
            ("trailing newline current", "hello world\n", "hello world", true),
            ("trailing newline target", "hello world", "hello world\n", true),
            ("both trailing", "a\nb\n", "a\nb\n", true),
            ("crlf terminator", "hello\r\n", "hello", true),
            ("no match", "hello", "world", false),
            ("empty strings", "", "", true),
            ("leading newline differs", "\nhello", "hello", false),
            ("internal newline differs", "a\n\nb", "a\nb", false),
            ("two trailing newlines", "hello\n\n", "hello", false),
            ("trailing space differs", "hello ", "hello", false),
        ];

        for (name, current, goal, expected) in cases {
            assert_eq!(is_complete(current, goal), expected, "{name}");
        }
    }

    #[test]
    fn test_reflexive() {
        for text in ["", "x", "multi\nline", "tail\n", "\n"] {
            assert!(is_complete(text, text));
        }
    }
}
