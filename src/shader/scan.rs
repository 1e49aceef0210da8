//! Structural Scanning Primitives
//!
//! Low-level text scanning shared by the cross-compiler's rewrites. The
//! compiler deliberately avoids a full parser: every transformation is an
//! explicit tokenizing scan over known anchors (`layout(`, `uniform`,
//! balanced braces), which keeps nested-brace and multi-block matching
//! correct and testable in isolation.

/// Returns the index of the `}` matching the `{` at `open`, honoring nesting.
///
/// `None` when `src[open]` is not `{` or the block never closes.
pub fn matching_brace(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Returns the index of the `)` matching the `(` at `open`, honoring nesting.
pub fn matching_paren(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds the next occurrence of `word` at or after `from` that stands alone
/// as an identifier (not embedded in a longer identifier).
pub fn find_word(src: &str, word: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(rel) = src.get(search..)?.find(word) {
        let at = search + rel;
        let before_ok = at == 0 || !is_ident_byte(src.as_bytes()[at - 1]);
        let after = at + word.len();
        let after_ok = after >= src.len() || !is_ident_byte(src.as_bytes()[after]);
        if before_ok && after_ok {
            return Some(at);
        }
        search = at + word.len();
    }
    None
}

/// Reads one identifier starting at `from` (skipping leading whitespace).
///
/// Returns `(identifier, index_past_identifier)`, or `None` when the next
/// non-whitespace character cannot start an identifier.
pub fn read_ident(src: &str, from: usize) -> Option<(&str, usize)> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let start = i;
    if i >= bytes.len() || !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        return None;
    }
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    Some((&src[start..i], i))
}

/// Skips whitespace starting at `from`, returning the first non-space index.
pub fn skip_whitespace(src: &str, from: usize) -> usize {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// `true` for preprocessor lines (`#define`, `#ifdef`, `#endif`, …).
pub fn is_preprocessor_line(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Splits a source into its leading directive lines (`#version`,
/// `#extension`) and the remainder. Directives buried later in the source are
/// left where they are.
pub fn split_leading_directives(src: &str) -> (Vec<&str>, &str) {
    let mut head = Vec::new();
    let mut rest_start = 0;
    for line in src.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("#extension") {
            head.push(line);
            // Advance past this line and its newline, if any.
            rest_start += line.len();
            if src[rest_start..].starts_with('\n') {
                rest_start += 1;
            }
        } else {
            break;
        }
    }
    (head, &src[rest_start..])
}

/// Strips a trailing `//` comment from a line.
pub fn strip_line_comment(line: &str) -> &str {
    match line.find("//") {
        Some(at) => &line[..at],
        None => line,
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_brace_nested() {
        let src = "a { b { c } d } e";
        let open = src.find('{').unwrap();
        assert_eq!(matching_brace(src, open), Some(src.rfind('}').unwrap()));
    }

    #[test]
    fn test_matching_brace_unclosed() {
        let src = "a { b { c }";
        assert_eq!(matching_brace(src, 2), None);
    }

    #[test]
    fn test_find_word_skips_substrings() {
        let src = "sampler2DShadow uniform sampler2D u_Tex;";
        let at = find_word(src, "sampler2D", 0).unwrap();
        assert_eq!(&src[at..at + 9], "sampler2D");
        assert!(at > src.find("uniform").unwrap());
    }

    #[test]
    fn test_read_ident() {
        let (ident, next) = read_ident("  FooBar {", 0).unwrap();
        assert_eq!(ident, "FooBar");
        assert_eq!(&"  FooBar {"[next..], " {");
    }

    #[test]
    fn test_split_leading_directives() {
        let src = "#version 300 es\n#extension GL_EXT_x : enable\nvoid main() {}\n";
        let (head, rest) = split_leading_directives(src);
        assert_eq!(head.len(), 2);
        assert!(rest.starts_with("void main"));
    }
}
