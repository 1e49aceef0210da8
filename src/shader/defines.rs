//! Preprocessor Define Handling
//!
//! Extraction of `#define NAME VALUE` lines into a typed map, and emission
//! of caller-supplied define maps into cross-compiled source.

use std::collections::BTreeMap;
use std::fmt;

/// A parsed `#define` value.
///
/// Values that parse as numbers become [`DefineValue::Number`]; `true`,
/// `false` and any other identifier stay as the literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum DefineValue {
    Number(f64),
    Literal(String),
}

impl fmt::Display for DefineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Literal(s) => f.write_str(s),
        }
    }
}

/// Parses every object-like `#define NAME VALUE` line in `source`.
///
/// Function-like macros (`#define F(x) …`) and valueless defines are
/// skipped. Later definitions of the same name win.
#[must_use]
pub fn extract_defines(source: &str) -> BTreeMap<String, DefineValue> {
    let mut out = BTreeMap::new();
    for line in source.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("#define") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let rest = rest.trim_start();
        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if name_end == 0 {
            continue;
        }
        let name = &rest[..name_end];
        // A parenthesis straight after the name makes it function-like.
        if rest[name_end..].starts_with('(') {
            continue;
        }
        let value = rest[name_end..].trim();
        if value.is_empty() {
            continue;
        }
        let parsed = value
            .parse::<f64>()
            .map_or_else(|_| DefineValue::Literal(value.to_string()), DefineValue::Number);
        out.insert(name.to_string(), parsed);
    }
    out
}

/// Emits a caller-supplied define map as `#define` lines, one per entry, in
/// map (name) order.
pub fn emit_defines(defines: &BTreeMap<String, String>, out: &mut String) {
    for (name, value) in defines {
        out.push_str("#define ");
        out.push_str(name);
        if !value.is_empty() {
            out.push(' ');
            out.push_str(value);
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_typed_values() {
        let src = "#define COUNT 4\n#define ENABLED true\n#define NAME phong\n";
        let map = extract_defines(src);
        assert_eq!(map.len(), 3);
        assert_eq!(map["COUNT"], DefineValue::Number(4.0));
        assert_eq!(map["ENABLED"], DefineValue::Literal("true".to_string()));
        assert_eq!(map["NAME"], DefineValue::Literal("phong".to_string()));
    }

    #[test]
    fn test_function_like_macros_skipped() {
        let src = "#define CLAMP01(x) clamp(x, 0.0, 1.0)\n#define K 2\n";
        let map = extract_defines(src);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("K"));
    }

    #[test]
    fn test_float_values_stay_numeric() {
        let map = extract_defines("#define SCALE 0.5\n");
        assert_eq!(map["SCALE"], DefineValue::Number(0.5));
        assert_eq!(map["SCALE"].to_string(), "0.5");
    }

    #[test]
    fn test_integer_display_has_no_fraction() {
        assert_eq!(DefineValue::Number(3.0).to_string(), "3");
    }
}
