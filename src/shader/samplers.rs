//! Combined-Sampler Rewriting & Binding Assignment
//!
//! Sources reference samplers through the `SAMPLER_2D(name)` /
//! `SAMPLER_CUBE(name)` call macros so one authoring syntax can serve every
//! dialect. This module assigns each sampler uniform a logical binding slot
//! (source order of first appearance, starting at 0, shared across all
//! sampler uniforms in the unit) and resolves both the declarations and the
//! call macros to the target dialect's form:
//!
//! - combined dialects: the declaration keeps its `sampler2D`/`samplerCube`
//!   type and gains a `// BINDING=n` annotation; the macro collapses to the
//!   classic typed call (`texture2D`/`textureCube` on the oldest dialect,
//!   `texture` otherwise);
//! - split dialects: the declaration becomes a texture-only and a
//!   sampler-only binding at raw slots `2n` / `2n + 1`, and the macro
//!   collapses to the dialect's combined-construction call form.

use crate::vendor::VendorProfile;

/// Sampler dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    Tex2d,
    Cube,
}

impl SamplerKind {
    /// The combined GLSL type name (`sampler2D` / `samplerCube`).
    #[must_use]
    pub fn combined_type(self) -> &'static str {
        match self {
            Self::Tex2d => "sampler2D",
            Self::Cube => "samplerCube",
        }
    }

    /// The split texture type name (`texture2D` / `textureCube`).
    #[must_use]
    pub fn texture_type(self) -> &'static str {
        match self {
            Self::Tex2d => "texture2D",
            Self::Cube => "textureCube",
        }
    }

    /// The legacy typed sample call (`texture2D` / `textureCube`).
    #[must_use]
    pub fn legacy_call(self) -> &'static str {
        match self {
            Self::Tex2d => "texture2D",
            Self::Cube => "textureCube",
        }
    }

    fn macro_name(self) -> &'static str {
        match self {
            Self::Tex2d => "SAMPLER_2D",
            Self::Cube => "SAMPLER_CUBE",
        }
    }
}

/// One sampler uniform and its assigned logical binding slot.
///
/// On split dialects the logical slot `n` occupies raw bindings `2n`
/// (texture) and `2n + 1` (sampler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerBinding {
    pub name: String,
    pub kind: SamplerKind,
    pub slot: u32,
}

impl SamplerBinding {
    /// Raw binding number of the texture half on split dialects.
    #[must_use]
    pub fn texture_binding(&self) -> u32 {
        self.slot * 2
    }

    /// Raw binding number of the sampler half on split dialects.
    #[must_use]
    pub fn sampler_binding(&self) -> u32 {
        self.slot * 2 + 1
    }
}

/// Rewrites sampler declarations and call macros for the target dialect.
///
/// Returns the rewritten source and the binding assignments in slot order.
pub fn rewrite_samplers(vendor: &VendorProfile, src: &str) -> (String, Vec<SamplerBinding>) {
    let bindings = collect_bindings(src);
    let rewritten = rewrite_declarations(vendor, src, &bindings);
    let rewritten = rewrite_calls(vendor, &rewritten);
    (rewritten, bindings)
}

/// Assigns logical slots to sampler uniforms by source order of first
/// appearance.
fn collect_bindings(src: &str) -> Vec<SamplerBinding> {
    let mut bindings: Vec<SamplerBinding> = Vec::new();
    for line in src.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("uniform ") else {
            continue;
        };
        let rest = rest.trim_start();
        let kind = if rest.starts_with("sampler2D ") {
            SamplerKind::Tex2d
        } else if rest.starts_with("samplerCube ") {
            SamplerKind::Cube
        } else {
            continue;
        };
        let name = rest[kind.combined_type().len()..]
            .trim()
            .trim_end_matches(';')
            .trim();
        if name.is_empty() || bindings.iter().any(|b| b.name == name) {
            continue;
        }
        let slot = bindings.len() as u32;
        bindings.push(SamplerBinding {
            name: name.to_string(),
            kind,
            slot,
        });
    }
    bindings
}

fn rewrite_declarations(
    vendor: &VendorProfile,
    src: &str,
    bindings: &[SamplerBinding],
) -> String {
    let mut out = String::with_capacity(src.len());
    for line in src.lines() {
        let trimmed = line.trim_start();
        let matched = bindings.iter().find(|b| {
            trimmed
                .strip_prefix("uniform ")
                .map(str::trim_start)
                .and_then(|rest| rest.strip_prefix(b.kind.combined_type()))
                .is_some_and(|rest| {
                    rest.trim().trim_end_matches(';').trim() == b.name
                })
        });
        match matched {
            Some(binding) if vendor.separate_sampler_textures => {
                out.push_str(&format!(
                    "layout(binding = {}) uniform {} T_{};\n",
                    binding.texture_binding(),
                    binding.kind.texture_type(),
                    binding.name
                ));
                out.push_str(&format!(
                    "layout(binding = {}) uniform sampler S_{};",
                    binding.sampler_binding(),
                    binding.name
                ));
            }
            Some(binding) => {
                out.push_str(line);
                out.push_str(&format!(" // BINDING={}", binding.slot));
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }
    // Keep the original's missing-final-newline shape.
    if !src.ends_with('\n') {
        out.pop();
    }
    out
}

fn rewrite_calls(vendor: &VendorProfile, src: &str) -> String {
    let mut out = src.to_string();
    for kind in [SamplerKind::Tex2d, SamplerKind::Cube] {
        out = rewrite_calls_of_kind(vendor, &out, kind);
    }
    out
}

fn rewrite_calls_of_kind(vendor: &VendorProfile, src: &str, kind: SamplerKind) -> String {
    const WRAPPER: &str = "texture(";
    let macro_open = format!("{}(", kind.macro_name());

    let mut out = String::with_capacity(src.len());
    let mut cursor = 0;
    while let Some(rel) = src[cursor..].find(&macro_open) {
        let at = cursor + rel;
        let Some(close) = src[at + macro_open.len()..].find(')') else {
            // Unterminated macro: leave the rest untouched.
            break;
        };
        let close = at + macro_open.len() + close;
        let arg = src[at + macro_open.len()..close].trim();

        if vendor.separate_sampler_textures {
            out.push_str(&src[cursor..at]);
            out.push_str(&format!("{}(T_{arg}, S_{arg})", kind.combined_type()));
        } else if src[..at].ends_with(WRAPPER) {
            // Collapse `texture(SAMPLER_2D(x)` into the typed (or plain)
            // combined call, swallowing the macro's closing paren.
            let wrapper_start = at - WRAPPER.len();
            out.push_str(&src[cursor..wrapper_start]);
            if vendor.is_legacy() {
                out.push_str(kind.legacy_call());
            } else {
                out.push_str("texture");
            }
            out.push('(');
            out.push_str(arg);
            // The macro's closing paren is swallowed; the wrapper's own
            // closing paren later in the source now closes the rewritten
            // call.
        } else {
            // Bare macro use (e.g. passed to a helper): collapse to the name.
            out.push_str(&src[cursor..at]);
            out.push_str(arg);
        }
        cursor = close + 1;
    }
    out.push_str(&src[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "uniform sampler2D u_Texture;\nvoid main() {\n    vec4 c = texture(SAMPLER_2D(u_Texture), v_Uv);\n}\n";

    #[test]
    fn test_legacy_combined_rewrite() {
        let (out, bindings) = rewrite_samplers(&VendorProfile::GLES2, SRC);
        assert!(out.contains("uniform sampler2D u_Texture; // BINDING=0"));
        assert!(out.contains("texture2D(u_Texture, v_Uv)"));
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].slot, 0);
    }

    #[test]
    fn test_gles3_keeps_plain_texture_call() {
        let (out, _) = rewrite_samplers(&VendorProfile::GLES3, SRC);
        assert!(out.contains("uniform sampler2D u_Texture; // BINDING=0"));
        assert!(out.contains("texture(u_Texture, v_Uv)"));
        assert!(!out.contains("texture2D(u_Texture"));
    }

    #[test]
    fn test_split_dialect_emits_texture_and_sampler() {
        let (out, bindings) = rewrite_samplers(&VendorProfile::VULKAN, SRC);
        assert!(out.contains("layout(binding = 0) uniform texture2D T_u_Texture;"));
        assert!(out.contains("layout(binding = 1) uniform sampler S_u_Texture;"));
        assert!(out.contains("texture(sampler2D(T_u_Texture, S_u_Texture), v_Uv)"));
        assert_eq!(bindings[0].texture_binding(), 0);
        assert_eq!(bindings[0].sampler_binding(), 1);
    }

    #[test]
    fn test_two_samplers_get_sequential_slots() {
        let src = "uniform sampler2D u_Albedo;\nuniform samplerCube u_Env;\n";
        let (_, bindings) = collect_bindings_pair(src);
        assert_eq!(bindings[0].slot, 0);
        assert_eq!(bindings[1].slot, 1);
        assert_eq!(bindings[1].kind, SamplerKind::Cube);
    }

    fn collect_bindings_pair(src: &str) -> (String, Vec<SamplerBinding>) {
        rewrite_samplers(&VendorProfile::GLES2, src)
    }

    #[test]
    fn test_cube_macro_legacy_call() {
        let src = "uniform samplerCube u_Env;\nvec4 c = texture(SAMPLER_CUBE(u_Env), dir);\n";
        let (out, _) = rewrite_samplers(&VendorProfile::GLES2, src);
        assert!(out.contains("textureCube(u_Env, dir)"));
    }
}
