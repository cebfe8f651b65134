//! GLSL wrapping and uniform reflection for scene shaders.
//!
//! Scene shaders are authored as plain desktop GLSL with free-standing
//! `uniform` declarations and inconsistent names. Vulkan-flavoured GLSL (the
//! only thing `wgpu` accepts) requires explicit bindings, so each shader is
//! rewritten at load time:
//!
//! 1. Scan the source and collect every `uniform` declaration into a
//!    [`UniformTable`]: data uniforms get std140 offsets inside one generated
//!    parameter block, samplers get sequential texture/sampler binding pairs.
//! 2. Strip the original declarations (plus `#version`, `precision`, and
//!    top-level `out` declarations) and prepend a generated header that
//!    declares the block and bindings, with `#define` aliases mapping every
//!    original name onto its replacement.
//!
//! The table is the program's declared uniform surface; all later name
//! resolution is a plain lookup against it.

use std::collections::HashMap;

/// Data types accepted in scene-shader uniform declarations.
///
/// `bool` is deliberately absent: it is not host-shareable once the block
/// reaches naga, so boolean uniforms are skipped like any other unsupported
/// type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UniformKind {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            "vec2" => Some(Self::Vec2),
            "vec3" => Some(Self::Vec3),
            "vec4" => Some(Self::Vec4),
            "mat4" => Some(Self::Mat4),
            _ => None,
        }
    }

    fn glsl(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat4 => "mat4",
        }
    }

    /// std140 alignment in bytes.
    fn align(self) -> u32 {
        match self {
            Self::Float | Self::Int => 4,
            Self::Vec2 => 8,
            Self::Vec3 | Self::Vec4 | Self::Mat4 => 16,
        }
    }

    /// std140 size in bytes.
    fn size(self) -> u32 {
        match self {
            Self::Float | Self::Int => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// Dimensionality of a declared sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TextureKind {
    D2,
    D3,
}

impl TextureKind {
    fn texture_glsl(self) -> &'static str {
        match self {
            Self::D2 => "texture2D",
            Self::D3 => "texture3D",
        }
    }

    fn combined_glsl(self) -> &'static str {
        match self {
            Self::D2 => "sampler2D",
            Self::D3 => "sampler3D",
        }
    }
}

/// One data member of the generated parameter block.
#[derive(Clone, Debug)]
pub(crate) struct UniformEntry {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u32,
}

/// One declared sampler; slot `i` occupies bindings `2i` (texture) and
/// `2i + 1` (sampler) in bind group 1.
#[derive(Clone, Debug)]
pub(crate) struct TextureSlotDecl {
    pub name: String,
    pub kind: TextureKind,
}

/// Declared uniform surface of one shading program.
#[derive(Debug, Default)]
pub(crate) struct UniformTable {
    members: Vec<UniformEntry>,
    member_lookup: HashMap<String, usize>,
    textures: Vec<TextureSlotDecl>,
    cursor: u32,
}

impl UniformTable {
    fn push_member(&mut self, name: &str, kind: UniformKind) {
        if self.member_lookup.contains_key(name) {
            tracing::debug!(name, "duplicate uniform declaration ignored");
            return;
        }
        let offset = align_up(self.cursor, kind.align());
        self.cursor = offset + kind.size();
        self.member_lookup
            .insert(name.to_string(), self.members.len());
        self.members.push(UniformEntry {
            name: name.to_string(),
            kind,
            offset,
        });
    }

    fn push_texture(&mut self, name: &str, kind: TextureKind) {
        if self.textures.iter().any(|slot| slot.name == name) {
            tracing::debug!(name, "duplicate sampler declaration ignored");
            return;
        }
        self.textures.push(TextureSlotDecl {
            name: name.to_string(),
            kind,
        });
    }

    pub fn member(&self, name: &str) -> Option<&UniformEntry> {
        self.member_lookup.get(name).map(|&idx| &self.members[idx])
    }

    pub fn members(&self) -> &[UniformEntry] {
        &self.members
    }

    pub fn textures(&self) -> &[TextureSlotDecl] {
        &self.textures
    }

    /// Size of the parameter block rounded up to 16 bytes.
    pub fn block_size(&self) -> u32 {
        align_up(self.cursor, 16)
    }
}

fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) / align * align
}

/// Value written through the resolver into a program's parameter block.
#[derive(Clone, Copy, Debug)]
pub(crate) enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Mat4([f32; 16]),
}

/// CPU mirror of one program's std140 parameter block.
///
/// Writes land at the reflected member offsets; the whole block is uploaded
/// with a single `write_buffer` before the pass that uses it.
#[derive(Debug)]
pub(crate) struct ParamBlock {
    table: UniformTable,
    data: Vec<u8>,
}

impl ParamBlock {
    pub fn new(table: UniformTable) -> Self {
        // wgpu rejects zero-sized uniform bindings, so keep one slot even for
        // programs that declare no data uniforms.
        let len = table.block_size().max(16) as usize;
        Self {
            table,
            data: vec![0; len],
        }
    }

    pub fn table(&self) -> &UniformTable {
        &self.table
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Writes `value` at the member named `name`. Returns `false` when the
    /// program does not declare that name or declares it with a different
    /// type, so the caller can try the next candidate name.
    pub fn write(&mut self, name: &str, value: UniformValue) -> bool {
        let Some((kind, offset)) = self
            .table
            .member(name)
            .map(|entry| (entry.kind, entry.offset as usize))
        else {
            return false;
        };
        let bytes: &[u8] = match (kind, &value) {
            (UniformKind::Float, UniformValue::Float(v)) => bytemuck::bytes_of(v),
            (UniformKind::Vec2, UniformValue::Vec2(v)) => bytemuck::cast_slice(v),
            (UniformKind::Vec3, UniformValue::Vec3(v)) => bytemuck::cast_slice(v),
            (UniformKind::Mat4, UniformValue::Mat4(v)) => bytemuck::cast_slice(v),
            _ => return false,
        };
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        true
    }
}

/// Result of rewriting one scene shader.
pub(crate) struct WrappedShader {
    pub source: String,
    pub table: UniformTable,
}

/// Rewrites a plain-GLSL fragment shader into Vulkan GLSL with a generated
/// parameter block, returning the wrapped source and its uniform table.
pub(crate) fn wrap_scene_fragment(source: &str) -> WrappedShader {
    let mut table = UniformTable::default();
    let mut out_names: Vec<String> = Vec::new();
    let mut body = String::new();

    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            continue;
        }
        if trimmed.starts_with("uniform ") && trimmed.contains(';') {
            scan_uniform_line(trimmed, &mut table);
            continue;
        }
        if trimmed.starts_with("out ") && trimmed.ends_with(';') {
            if let Some(name) = parse_out_declaration(trimmed) {
                out_names.push(name);
            }
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    let header = build_header(&table, &out_names);
    let source = format!("{header}#line 1\n{body}");
    WrappedShader { source, table }
}

fn scan_uniform_line(line: &str, table: &mut UniformTable) {
    let decl = match line.split(';').next() {
        Some(decl) => decl,
        None => return,
    };
    let mut tokens = decl
        .split_whitespace()
        .skip(1) // "uniform"
        .filter(|token| !matches!(*token, "highp" | "mediump" | "lowp"));
    let Some(type_token) = tokens.next() else {
        return;
    };

    let texture_kind = match type_token {
        "sampler2D" => Some(TextureKind::D2),
        "sampler3D" => Some(TextureKind::D3),
        _ => None,
    };
    let data_kind = UniformKind::parse(type_token);
    if texture_kind.is_none() && data_kind.is_none() {
        tracing::debug!(line, "skipping uniform with unsupported type");
        return;
    }

    let names = tokens.collect::<Vec<_>>().join(" ");
    for raw in names.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        if name.contains('[') || name.contains('=') {
            tracing::debug!(name, "skipping array or initialised uniform");
            continue;
        }
        if !is_identifier(name) {
            tracing::debug!(name, "skipping malformed uniform declarator");
            continue;
        }
        match (texture_kind, data_kind) {
            (Some(kind), _) => table.push_texture(name, kind),
            (None, Some(kind)) => table.push_member(name, kind),
            (None, None) => unreachable!(),
        }
    }
}

fn parse_out_declaration(line: &str) -> Option<String> {
    // "out vec4 FragColor;"
    let decl = line.strip_suffix(';')?;
    let mut tokens = decl.split_whitespace();
    if tokens.next() != Some("out") {
        return None;
    }
    tokens.next()?; // type
    let name = tokens.next()?;
    if tokens.next().is_some() || !is_identifier(name) {
        return None;
    }
    Some(name.to_string())
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn build_header(table: &UniformTable, out_names: &[String]) -> String {
    let mut header = String::from("#version 450\n");
    header.push_str("layout(location = 0) out vec4 ovc_frag_color;\n");

    let mut aliased_outputs = vec!["FragColor", "fragColor"];
    for name in out_names {
        if !aliased_outputs.contains(&name.as_str()) {
            aliased_outputs.push(name);
        }
    }
    for name in aliased_outputs {
        header.push_str(&format!("#define {name} ovc_frag_color\n"));
    }

    if !table.members().is_empty() {
        header.push_str("layout(std140, set = 0, binding = 0) uniform SceneParams {\n");
        for entry in table.members() {
            header.push_str(&format!("    {} m_{};\n", entry.kind.glsl(), entry.name));
        }
        header.push_str("} ovc_params;\n");
        for entry in table.members() {
            header.push_str(&format!("#define {0} ovc_params.m_{0}\n", entry.name));
        }
    }

    for (slot, decl) in table.textures().iter().enumerate() {
        let texture_binding = slot * 2;
        let sampler_binding = slot * 2 + 1;
        header.push_str(&format!(
            "layout(set = 1, binding = {texture_binding}) uniform {} ovc_tex{slot};\n",
            decl.kind.texture_glsl()
        ));
        header.push_str(&format!(
            "layout(set = 1, binding = {sampler_binding}) uniform sampler ovc_smp{slot};\n"
        ));
        header.push_str(&format!(
            "#define {} {}(ovc_tex{slot}, ovc_smp{slot})\n",
            decl.name,
            decl.kind.combined_glsl()
        ));
    }

    header
}

/// Minimal full-screen triangle vertex shader shared by every pass.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// History composite shader, written in the same plain-uniform dialect as the
/// scene shaders and routed through [`wrap_scene_fragment`] so the resolver
/// drives it like any other program.
pub(crate) const COMPOSITE_FRAGMENT_GLSL: &str = r"uniform float uAlpha;
uniform vec2 uResolution;
uniform sampler2D uCurrent;
uniform sampler2D uHistory;

void main() {
    vec2 uv = gl_FragCoord.xy / uResolution;
    vec3 fresh = texture(uCurrent, uv).rgb;
    vec3 history = texture(uHistory, uv).rgb;
    FragColor = vec4(mix(fresh, history, uAlpha), 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
#version 330 core
precision highp float;
out vec4 FragColor;

uniform float Time;
uniform vec3 cameraPosition;
uniform float cloudBase; // meters
uniform vec2 resolution;
uniform mat4 projection;
uniform sampler3D lowFrequencyTexture;
uniform sampler2D WeatherTexture;
uniform vec4 tint[4];

void main() {
    FragColor = vec4(cameraPosition, Time);
}
"#;

    #[test]
    fn std140_offsets_follow_layout_rules() {
        let wrapped = wrap_scene_fragment(SOURCE);
        let table = &wrapped.table;
        let offset = |name: &str| table.member(name).unwrap().offset;
        assert_eq!(offset("Time"), 0);
        assert_eq!(offset("cameraPosition"), 16);
        assert_eq!(offset("cloudBase"), 28);
        assert_eq!(offset("resolution"), 32);
        assert_eq!(offset("projection"), 48);
        assert_eq!(table.block_size(), 112);
    }

    #[test]
    fn samplers_get_sequential_slots() {
        let wrapped = wrap_scene_fragment(SOURCE);
        let textures = wrapped.table.textures();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].name, "lowFrequencyTexture");
        assert_eq!(textures[0].kind, TextureKind::D3);
        assert_eq!(textures[1].name, "WeatherTexture");
        assert_eq!(textures[1].kind, TextureKind::D2);
    }

    #[test]
    fn arrays_and_unknown_types_are_skipped() {
        let wrapped = wrap_scene_fragment(SOURCE);
        assert!(wrapped.table.member("tint").is_none());
    }

    #[test]
    fn wrapping_strips_and_aliases_declarations() {
        let wrapped = wrap_scene_fragment(SOURCE);
        assert!(!wrapped.source.contains("uniform float Time"));
        assert!(!wrapped.source.contains("out vec4 FragColor;"));
        assert!(!wrapped.source.contains("#version 330"));
        assert!(wrapped.source.starts_with("#version 450\n"));
        assert!(wrapped.source.contains("uniform SceneParams"));
        assert!(wrapped.source.contains("#define Time ovc_params.m_Time"));
        assert!(wrapped
            .source
            .contains("#define lowFrequencyTexture sampler3D(ovc_tex0, ovc_smp0)"));
        assert!(wrapped.source.contains("#define FragColor ovc_frag_color"));
    }

    #[test]
    fn shader_without_data_uniforms_gets_no_block() {
        let wrapped = wrap_scene_fragment("void main() { FragColor = vec4(1.0); }\n");
        assert!(!wrapped.source.contains("SceneParams"));
        assert_eq!(wrapped.table.block_size(), 0);
        // The param block still reserves a binding-sized buffer.
        assert_eq!(ParamBlock::new(wrapped.table).bytes().len(), 16);
    }

    #[test]
    fn param_block_writes_land_at_member_offsets() {
        let wrapped = wrap_scene_fragment(SOURCE);
        let mut block = ParamBlock::new(wrapped.table);
        assert!(block.write("cloudBase", UniformValue::Float(1500.0)));
        let bytes = &block.bytes()[28..32];
        assert_eq!(bytes, 1500.0f32.to_le_bytes().as_slice());
    }

    #[test]
    fn param_block_rejects_unknown_and_mismatched_writes() {
        let wrapped = wrap_scene_fragment(SOURCE);
        let mut block = ParamBlock::new(wrapped.table);
        assert!(!block.write("nope", UniformValue::Float(1.0)));
        assert!(!block.write("Time", UniformValue::Vec3([0.0; 3])));
        assert!(!block.write("WeatherTexture", UniformValue::Float(0.0)));
    }

    #[test]
    fn composite_shader_wraps_cleanly() {
        let wrapped = wrap_scene_fragment(COMPOSITE_FRAGMENT_GLSL);
        assert!(wrapped.table.member("uAlpha").is_some());
        assert!(wrapped.table.member("uResolution").is_some());
        assert_eq!(wrapped.table.textures().len(), 2);
    }
}
