//! Shader Cross-Compiler
//!
//! Pure text-to-text translation of a single authoring dialect into the
//! dialect and binding convention each backend requires. The transformation
//! is a pure function of (vendor profile, source unit); no backend handles
//! are involved.
//!
//! The rewrite pipeline, applied in order:
//!
//! 1. version directive / compatibility defines for the target dialect
//! 2. legacy-extension shims (derivatives on the oldest fragment dialect)
//! 3. precision preamble (unless present or suppressed)
//! 4. caller-supplied `#define` injection
//! 5. stage input/output qualifier rewriting
//! 6. combined-sampler declaration/call resolution with slot assignment
//! 7. uniform-block flattening or normalization
//!
//! Matching is tolerant throughout: a construct that does not appear in the
//! source simply produces no rewrite.

mod defines;
mod samplers;
mod scan;
mod uniforms;

use std::collections::BTreeMap;

pub use defines::{DefineValue, extract_defines};
pub use samplers::{SamplerBinding, SamplerKind};
pub use uniforms::{MAX_ARRAY_UNROLL, extract_uniform_leaf_names, uniform_block_names};

use crate::vendor::{ClipDepth, VendorProfile, ViewportOrigin};

/// The pipeline stage a source unit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// One shading-language source string for one pipeline stage, plus its
/// translation options.
#[derive(Debug, Clone)]
pub struct SourceUnit<'a> {
    pub stage: ShaderStage,
    pub source: &'a str,
    /// Preprocessor defines to inject, name → literal replacement.
    pub defines: Option<&'a BTreeMap<String, String>>,
    /// Inject the default float-precision preamble when the source has none.
    pub inject_precision: bool,
}

impl<'a> SourceUnit<'a> {
    /// A unit with no extra defines and precision injection enabled.
    #[must_use]
    pub fn new(stage: ShaderStage, source: &'a str) -> Self {
        Self {
            stage,
            source,
            defines: None,
            inject_precision: true,
        }
    }
}

/// The result of cross-compiling one source unit.
#[derive(Debug, Clone)]
pub struct PreprocessedShader {
    /// Backend-ready source text.
    pub source: String,
    /// Sampler uniforms and their assigned binding slots, in slot order.
    pub samplers: Vec<SamplerBinding>,
}

/// Cross-compiles `unit` for the backend described by `vendor`.
#[must_use]
pub fn preprocess(vendor: &VendorProfile, unit: &SourceUnit<'_>) -> PreprocessedShader {
    let (head, body) = scan::split_leading_directives(unit.source);

    // Body rewrites first: blocks, samplers, qualifiers.
    let body = if vendor.supports_uniform_buffers {
        uniforms::normalize_blocks(body)
    } else {
        uniforms::flatten_blocks(body)
    };
    let (body, sampler_bindings) = samplers::rewrite_samplers(vendor, &body);
    let body = rewrite_qualifiers(vendor, unit.stage, &body);

    let mut out = String::with_capacity(unit.source.len() + 256);

    // Version directive: the vendor's own wins; otherwise any authored one
    // is kept.
    let mut head_lines = head.iter().peekable();
    if let Some(directive) = vendor.version_directive {
        out.push_str(directive);
        out.push('\n');
        if head_lines
            .peek()
            .is_some_and(|l| l.trim_start().starts_with("#version"))
        {
            head_lines.next();
        }
    }
    for line in head_lines {
        out.push_str(line);
        out.push('\n');
    }

    if vendor.is_legacy() && unit.stage == ShaderStage::Fragment {
        out.push_str("#extension GL_OES_standard_derivatives : enable\n");
    }

    // Compatibility defines consumed by downstream code (index-name aliases)
    // and matrix utilities (origin / depth-convention markers).
    if vendor.swapped_index_names {
        out.push_str("#define gl_VertexID gl_VertexIndex\n");
        out.push_str("#define gl_InstanceID gl_InstanceIndex\n");
    }
    if vendor.viewport_origin == ViewportOrigin::TopLeft {
        out.push_str("#define VIEWPORT_ORIGIN_TL 1\n");
    }
    if vendor.clip_depth == ClipDepth::ZeroToOne {
        out.push_str("#define CLIPSPACE_NEAR_ZERO 1\n");
    }

    if unit.inject_precision && !unit.source.contains("precision ") {
        out.push_str("precision mediump float;\n");
    }

    if let Some(user_defines) = unit.defines {
        defines::emit_defines(user_defines, &mut out);
    }

    out.push_str(&body);

    PreprocessedShader {
        source: out,
        samplers: sampler_bindings,
    }
}

/// Rewrites stage input/output qualifiers to the target dialect's
/// vocabulary, in either direction.
fn rewrite_qualifiers(vendor: &VendorProfile, stage: ShaderStage, src: &str) -> String {
    if stage == ShaderStage::Compute {
        return src.to_string();
    }
    if vendor.is_legacy() {
        rewrite_to_legacy(stage, src)
    } else {
        rewrite_to_modern(stage, src)
    }
}

/// attribute/varying → in/out for the newer dialects. Explicit-output
/// declarations are preserved as-is.
fn rewrite_to_modern(stage: ShaderStage, src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for line in src.lines() {
        let (indent, decl) = split_indent(line);
        out.push_str(indent);
        if let Some(rest) = decl.strip_prefix("attribute ") {
            out.push_str("in ");
            out.push_str(rest);
        } else if let Some(rest) = decl.strip_prefix("varying ") {
            out.push_str(if stage == ShaderStage::Vertex { "out " } else { "in " });
            out.push_str(rest);
        } else {
            out.push_str(decl);
        }
        out.push('\n');
    }
    if !src.ends_with('\n') {
        out.pop();
    }
    out
}

/// in/out → attribute/varying for the oldest dialect. Vertex-stage explicit
/// location qualifiers are stripped (locations are resolved later by name
/// lookup), and a fragment-stage user-declared output variable becomes a
/// plain variable with a `gl_FragColor` assignment appended at the end of
/// the entry point.
fn rewrite_to_legacy(stage: ShaderStage, src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut frag_output: Option<String> = None;

    for line in src.lines() {
        let (indent, mut decl) = split_indent(line);
        out.push_str(indent);

        // `layout(location = N)` prefixes have no meaning here. Other
        // layout qualifiers are left for the block rewrites.
        if decl.starts_with("layout(")
            && let Some(close) = decl.find(')')
            && decl[..close].contains("location")
        {
            decl = decl[close + 1..].trim_start();
        }

        if let Some(rest) = decl.strip_prefix("in ") {
            out.push_str(if stage == ShaderStage::Vertex { "attribute " } else { "varying " });
            out.push_str(rest);
        } else if let Some(rest) = decl.strip_prefix("out ") {
            if stage == ShaderStage::Vertex {
                out.push_str("varying ");
                out.push_str(rest);
            } else {
                // `out vec4 o_Color;` → `vec4 o_Color;`, remembered for the
                // trailing gl_FragColor assignment.
                if frag_output.is_none() {
                    frag_output = parse_decl_name(rest);
                }
                out.push_str(rest);
            }
        } else {
            out.push_str(decl);
        }
        out.push('\n');
    }
    if !src.ends_with('\n') {
        out.pop();
    }

    if stage == ShaderStage::Fragment
        && let Some(name) = frag_output
        && let Some(brace) = out.rfind('}')
    {
        out.insert_str(brace, &format!("    gl_FragColor = vec4({name});\n"));
    }
    out
}

/// Extracts the variable name from `vec4 o_Color;`-shaped text.
fn parse_decl_name(decl: &str) -> Option<String> {
    let mut tokens = decl.split_whitespace();
    let _ty = tokens.next()?;
    let name = tokens.next()?.trim_end_matches(';').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn split_indent(line: &str) -> (&str, &str) {
    let trimmed = line.trim_start();
    (&line[..line.len() - trimmed.len()], trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_qualifiers_to_legacy() {
        let src = "layout(location = 0) in vec3 a_Position;\nout vec2 v_Uv;\nvoid main() {\n}\n";
        let unit = SourceUnit::new(ShaderStage::Vertex, src);
        let result = preprocess(&VendorProfile::GLES2, &unit);
        assert!(result.source.contains("attribute vec3 a_Position;"));
        assert!(result.source.contains("varying vec2 v_Uv;"));
        assert!(!result.source.contains("layout(location"));
    }

    #[test]
    fn test_legacy_vocabulary_to_modern() {
        let src = "attribute vec3 a_Position;\nvarying vec2 v_Uv;\nvoid main() {\n}\n";
        let unit = SourceUnit::new(ShaderStage::Vertex, src);
        let result = preprocess(&VendorProfile::GLES3, &unit);
        assert!(result.source.contains("in vec3 a_Position;"));
        assert!(result.source.contains("out vec2 v_Uv;"));
    }

    #[test]
    fn test_fragment_output_rewrite_is_legacy_only() {
        let src = "out vec4 o_Color;\nvoid main() {\n    o_Color = vec4(1.0);\n}\n";
        let unit = SourceUnit::new(ShaderStage::Fragment, src);

        let legacy = preprocess(&VendorProfile::GLES2, &unit);
        assert!(legacy.source.contains("vec4 o_Color;"));
        assert!(!legacy.source.contains("out vec4 o_Color;"));
        assert!(legacy.source.contains("gl_FragColor = vec4(o_Color);"));

        let modern = preprocess(&VendorProfile::VULKAN, &unit);
        assert!(modern.source.contains("out vec4 o_Color;"));
        assert!(!modern.source.contains("gl_FragColor"));
    }

    #[test]
    fn test_precision_injected_once() {
        let src = "void main() {\n}\n";
        let unit = SourceUnit::new(ShaderStage::Vertex, src);
        for vendor in [VendorProfile::GLES2, VendorProfile::GLES3, VendorProfile::VULKAN] {
            let result = preprocess(&vendor, &unit);
            assert_eq!(result.source.matches("precision mediump float;").count(), 1);
        }
    }

    #[test]
    fn test_precision_suppressed() {
        let unit = SourceUnit {
            stage: ShaderStage::Vertex,
            source: "void main() {\n}\n",
            defines: None,
            inject_precision: false,
        };
        let result = preprocess(&VendorProfile::GLES3, &unit);
        assert!(!result.source.contains("precision"));
    }

    #[test]
    fn test_existing_precision_not_duplicated() {
        let src = "precision highp float;\nvoid main() {\n}\n";
        let unit = SourceUnit::new(ShaderStage::Fragment, src);
        let result = preprocess(&VendorProfile::GLES3, &unit);
        assert_eq!(result.source.matches("precision ").count(), 1);
    }

    #[test]
    fn test_version_directive_per_dialect() {
        let unit = SourceUnit::new(ShaderStage::Vertex, "void main() {\n}\n");
        assert!(!preprocess(&VendorProfile::GLES2, &unit).source.contains("#version"));
        assert!(preprocess(&VendorProfile::GLES3, &unit).source.starts_with("#version 300 es\n"));
        assert!(preprocess(&VendorProfile::VULKAN, &unit).source.starts_with("#version 450\n"));
    }

    #[test]
    fn test_derivative_shim_on_legacy_fragment() {
        let unit = SourceUnit::new(ShaderStage::Fragment, "void main() {\n}\n");
        let frag = preprocess(&VendorProfile::GLES2, &unit);
        assert!(frag.source.contains("#extension GL_OES_standard_derivatives : enable"));

        let vert = preprocess(&VendorProfile::GLES2, &SourceUnit::new(ShaderStage::Vertex, "void main() {\n}\n"));
        assert!(!vert.source.contains("GL_OES_standard_derivatives"));
    }

    #[test]
    fn test_define_injection_after_precision() {
        let mut defines = BTreeMap::new();
        defines.insert("MAX_LIGHTS".to_string(), "4".to_string());
        let unit = SourceUnit {
            stage: ShaderStage::Vertex,
            source: "void main() {\n}\n",
            defines: Some(&defines),
            inject_precision: true,
        };
        let result = preprocess(&VendorProfile::GLES3, &unit);
        let precision_at = result.source.find("precision mediump").unwrap();
        let define_at = result.source.find("#define MAX_LIGHTS 4").unwrap();
        assert!(define_at > precision_at);
        assert!(define_at < result.source.find("void main").unwrap());
    }

    #[test]
    fn test_index_aliases_on_modern_only() {
        let unit = SourceUnit::new(ShaderStage::Vertex, "void main() {\n}\n");
        let modern = preprocess(&VendorProfile::VULKAN, &unit);
        assert!(modern.source.contains("#define gl_VertexID gl_VertexIndex"));
        assert!(modern.source.contains("#define VIEWPORT_ORIGIN_TL 1"));
        assert!(modern.source.contains("#define CLIPSPACE_NEAR_ZERO 1"));

        let gl = preprocess(&VendorProfile::GLES3, &unit);
        assert!(!gl.source.contains("gl_VertexIndex"));
        assert!(!gl.source.contains("VIEWPORT_ORIGIN_TL"));
    }
}
