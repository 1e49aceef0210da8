//! Uniform Block Rewriting & Reflection
//!
//! Matches `layout(std140) uniform <Name> { … };` blocks with a tokenizing
//! scan (block names are recognized with or without a newline before the
//! opening brace), then either flattens each block to loose uniforms for
//! dialects without uniform-buffer support or normalizes its textual layout
//! for dialects that keep blocks buffer-backed.
//!
//! Reflection lives here too: [`extract_uniform_leaf_names`] resolves every
//! addressable uniform value to a flattened leaf name, expanding nested
//! structs with dot-notation and arrays with zero-based bracket indexing.
//!
//! Malformed or unmatched block syntax yields zero matches, never an error:
//! the compiler is tolerant of partial or non-uniform-block shaders.

use rustc_hash::FxHashMap;

use super::scan;

/// Maximum element count used when unrolling an array whose length is
/// symbolic or undeclared.
pub const MAX_ARRAY_UNROLL: usize = 5;

/// One matched uniform block.
struct UniformBlock {
    /// Byte offset of the match start (the `layout` anchor when present,
    /// otherwise the `uniform` keyword).
    start: usize,
    /// Byte offset just past the trailing `;`.
    end: usize,
    name: String,
    body: String,
}

/// Finds the next uniform block at or after `from`.
///
/// A block is `uniform <Name>` followed (possibly after a newline) by a
/// balanced `{ … }` and a `;`. Plain uniform declarations
/// (`uniform mat4 u_M;`) do not match because their second token is not
/// followed by `{`.
fn next_block(src: &str, from: usize) -> Option<UniformBlock> {
    let mut search = from;
    while let Some(at) = scan::find_word(src, "uniform", search) {
        search = at + "uniform".len();

        let Some((name, past_name)) = scan::read_ident(src, search) else {
            continue;
        };
        let brace = scan::skip_whitespace(src, past_name);
        if src.as_bytes().get(brace) != Some(&b'{') {
            continue;
        }
        let Some(close) = scan::matching_brace(src, brace) else {
            // Unclosed block: skip it silently.
            continue;
        };
        let semi = scan::skip_whitespace(src, close + 1);
        if src.as_bytes().get(semi) != Some(&b';') {
            continue;
        }

        // Fold a preceding `layout(std140)` qualifier into the match.
        let head = src[..at].trim_end();
        let start = if head.ends_with(')') {
            match head.rfind("layout") {
                Some(l) if scan::matching_paren(head, scan::skip_whitespace(head, l + "layout".len())) == Some(head.len() - 1) => l,
                _ => at,
            }
        } else {
            at
        };

        return Some(UniformBlock {
            start,
            end: semi + 1,
            name: name.to_string(),
            body: src[brace + 1..close].to_string(),
        });
    }
    None
}

/// Rewrites every uniform block in `src` through `rewrite`, leaving the
/// surrounding text verbatim.
fn rewrite_blocks(src: &str, mut rewrite: impl FnMut(&UniformBlock) -> String) -> String {
    let mut out = String::with_capacity(src.len());
    let mut cursor = 0;
    while let Some(block) = next_block(src, cursor) {
        out.push_str(&src[cursor..block.start]);
        out.push_str(&rewrite(&block));
        cursor = block.end;
    }
    out.push_str(&src[cursor..]);
    out
}

/// Replaces each uniform block with one `uniform <field>;` declaration per
/// top-level field, preserving declaration order. Preprocessor-conditional
/// lines inside the block body are kept verbatim between the emitted
/// declarations.
pub fn flatten_blocks(src: &str) -> String {
    rewrite_blocks(src, |block| {
        let mut out = String::new();
        for line in block.body.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if scan::is_preprocessor_line(trimmed) {
                out.push_str(trimmed);
                out.push('\n');
                continue;
            }
            for field in scan::strip_line_comment(trimmed).split(';') {
                let field = field.trim();
                if field.is_empty() {
                    continue;
                }
                out.push_str("uniform ");
                out.push_str(field);
                out.push_str(";\n");
            }
        }
        // Drop the final newline so the block's own line structure is kept.
        out.pop();
        out
    })
}

/// Keeps uniform blocks structurally intact but normalizes their textual
/// layout to `layout(std140) uniform <Name> { … };` with the brace on the
/// header line.
pub fn normalize_blocks(src: &str) -> String {
    rewrite_blocks(src, |block| {
        let mut out = String::new();
        out.push_str("layout(std140) uniform ");
        out.push_str(&block.name);
        out.push_str(" {\n");
        for line in block.body.lines() {
            let trimmed = line.trim_end();
            if trimmed.trim().is_empty() {
                continue;
            }
            out.push_str(trimmed);
            out.push('\n');
        }
        out.push_str("};");
        out
    })
}

/// One parsed top-level field of a block or struct body.
struct FieldDecl {
    type_name: String,
    name: String,
    /// `Some(len)` for arrays; `None` when the length is symbolic.
    array: Option<Option<usize>>,
}

/// Parses the declarations in a block/struct body, skipping
/// preprocessor-conditional lines and comments. Multiple declarations on one
/// line are handled.
fn parse_fields(body: &str) -> Vec<FieldDecl> {
    let mut fields = Vec::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || scan::is_preprocessor_line(trimmed) {
            continue;
        }
        for piece in scan::strip_line_comment(trimmed).split(';') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            if let Some(field) = parse_field(piece) {
                fields.push(field);
            }
        }
    }
    fields
}

fn parse_field(piece: &str) -> Option<FieldDecl> {
    let mut tokens = piece
        .split_whitespace()
        .filter(|t| !matches!(*t, "highp" | "mediump" | "lowp"));
    let type_name = tokens.next()?.to_string();
    let declarator: String = tokens.collect::<Vec<_>>().join("");
    if declarator.is_empty() {
        return None;
    }
    let (name, array) = match declarator.find('[') {
        Some(open) => {
            let close = declarator.find(']')?;
            let len_text = &declarator[open + 1..close];
            let len = len_text.trim().parse::<usize>().ok();
            (declarator[..open].to_string(), Some(len))
        }
        None => (declarator, None),
    };
    Some(FieldDecl {
        type_name,
        name,
        array,
    })
}

/// Builds a table of `struct <Name> { members }` definitions found anywhere
/// in the source. Member order is preserved.
fn parse_structs(src: &str) -> FxHashMap<String, Vec<String>> {
    let mut table = FxHashMap::default();
    let mut search = 0;
    while let Some(at) = scan::find_word(src, "struct", search) {
        search = at + "struct".len();
        let Some((name, past_name)) = scan::read_ident(src, search) else {
            continue;
        };
        let brace = scan::skip_whitespace(src, past_name);
        if src.as_bytes().get(brace) != Some(&b'{') {
            continue;
        }
        let Some(close) = scan::matching_brace(src, brace) else {
            continue;
        };
        let members = parse_fields(&src[brace + 1..close])
            .into_iter()
            .map(|f| f.name)
            .collect();
        table.insert(name.to_string(), members);
        search = close + 1;
    }
    table
}

/// Uniform block names in declaration order. Block names are unique within
/// one source unit.
#[must_use]
pub fn uniform_block_names(src: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = 0;
    while let Some(block) = next_block(src, cursor) {
        cursor = block.end;
        names.push(block.name);
    }
    names
}

/// Produces the ordered flattened leaf names of every uniform-buffer block in
/// `src`.
///
/// Per block, in source order, for each top-level field:
/// - scalar / vector / matrix: the field's own name;
/// - struct-typed: each nested leaf (`field.member`) followed by the struct
///   field's aggregate name;
/// - array of struct (including ones behind a preprocessor conditional): the
///   struct expansion repeated per index (`field[i].member`), capped at
///   [`MAX_ARRAY_UNROLL`] when the length is symbolic, followed by the
///   array's aggregate name.
#[must_use]
pub fn extract_uniform_leaf_names(src: &str) -> Vec<String> {
    let structs = parse_structs(src);
    let mut leaves = Vec::new();
    let mut cursor = 0;
    while let Some(block) = next_block(src, cursor) {
        cursor = block.end;
        for field in parse_fields(&block.body) {
            match structs.get(&field.type_name) {
                Some(members) => match field.array {
                    Some(len) => {
                        let count = len.unwrap_or(MAX_ARRAY_UNROLL).min(MAX_ARRAY_UNROLL);
                        for i in 0..count {
                            for member in members {
                                leaves.push(format!("{}[{i}].{member}", field.name));
                            }
                        }
                        leaves.push(field.name);
                    }
                    None => {
                        for member in members {
                            leaves.push(format!("{}.{member}", field.name));
                        }
                        leaves.push(field.name);
                    }
                },
                None => leaves.push(field.name),
            }
        }
    }
    leaves
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "layout(std140) uniform Params {\n    mat4 u_Projection;\n    vec4 u_Misc[2];\n};\nvoid main() {}\n";

    #[test]
    fn test_flatten_emits_one_uniform_per_field() {
        let out = flatten_blocks(BLOCK);
        assert!(out.contains("uniform mat4 u_Projection;"));
        assert!(out.contains("uniform vec4 u_Misc[2];"));
        assert!(!out.contains("layout(std140)"));
        assert!(out.contains("void main()"));
    }

    #[test]
    fn test_block_name_with_newline_before_brace() {
        let src = "layout(std140) uniform Params\n{\n    vec4 u_Color;\n};\n";
        let out = flatten_blocks(src);
        assert!(out.contains("uniform vec4 u_Color;"));
    }

    #[test]
    fn test_normalize_keeps_block_intact() {
        let src = "layout(std140) uniform Params\n{\n    vec4 u_Color;\n    vec2 u_Scale;\n};\n";
        let out = normalize_blocks(src);
        assert!(out.contains("layout(std140) uniform Params {"));
        assert!(out.contains("vec4 u_Color;"));
        assert!(out.contains("vec2 u_Scale;"));
    }

    #[test]
    fn test_plain_uniform_is_not_a_block() {
        let src = "uniform mat4 u_Model;\n";
        assert_eq!(flatten_blocks(src), src);
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let src = "layout(std140) uniform Broken {\n    vec4 u_Color;\n";
        assert_eq!(flatten_blocks(src), src);
    }

    #[test]
    fn test_multiple_blocks_flatten_independently() {
        let src = "layout(std140) uniform A { vec4 a; };\nlayout(std140) uniform B { vec4 b; };\n";
        let out = flatten_blocks(src);
        assert!(out.contains("uniform vec4 a;"));
        assert!(out.contains("uniform vec4 b;"));
    }

    #[test]
    fn test_leaf_names_plain_fields() {
        let leaves = extract_uniform_leaf_names(BLOCK);
        assert_eq!(leaves, vec!["u_Projection", "u_Misc"]);
    }

    #[test]
    fn test_leaf_names_struct_and_guarded_array() {
        let src = "\
struct DirectionalLight {
    vec3 direction;
    float intensity;
    vec3 color;
};
layout(std140) uniform Lighting {
    DirectionalLight directionalLight;
#ifdef USE_LIGHT_ARRAY
    DirectionalLight directionalLights[5];
#endif
};
";
        let leaves = extract_uniform_leaf_names(src);
        let mut expected = vec![
            "directionalLight.direction".to_string(),
            "directionalLight.intensity".to_string(),
            "directionalLight.color".to_string(),
            "directionalLight".to_string(),
        ];
        for i in 0..5 {
            expected.push(format!("directionalLights[{i}].direction"));
            expected.push(format!("directionalLights[{i}].intensity"));
            expected.push(format!("directionalLights[{i}].color"));
        }
        expected.push("directionalLights".to_string());
        assert_eq!(leaves, expected);
    }

    #[test]
    fn test_symbolic_array_length_unrolls_to_cap() {
        let src = "\
struct Light { vec3 dir; };
layout(std140) uniform L {
    Light lights[NUM_LIGHTS];
};
";
        let leaves = extract_uniform_leaf_names(src);
        // 5 unrolled leaves plus the aggregate.
        assert_eq!(leaves.len(), MAX_ARRAY_UNROLL + 1);
        assert_eq!(leaves[0], "lights[0].dir");
        assert_eq!(leaves[MAX_ARRAY_UNROLL], "lights");
    }
}
