//! Compiled shading programs and their GPU plumbing.
//!
//! A [`ShaderProgram`] owns the wrapped fragment module, the reflected
//! parameter block with its uniform buffer, the texture bind group wired
//! against the scene texture set, and one render pipeline per color target
//! family. Pipelines are target-format specific in `wgpu`, so every program
//! carries both a presentation-format and a history-format pipeline and the
//! pass executor picks at draw time.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use wgpu::naga::ShaderStage;

use super::compile::{self, ParamBlock, TextureKind, UniformValue};
use super::semantics;
use super::textures::SceneTextures;

/// Output blending fixed at program creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlendMode {
    /// Overwrite the destination (base passes, composite).
    Replace,
    /// Premultiplied-alpha blend over the existing contents (cloud overlay).
    PremultipliedOver,
}

impl BlendMode {
    fn state(self) -> wgpu::BlendState {
        match self {
            Self::Replace => wgpu::BlendState::REPLACE,
            Self::PremultipliedOver => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// Which color target a pass renders into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TargetFamily {
    Presentation,
    History,
}

/// Resources shared by every program: the uniform bind group layout, the
/// fullscreen-triangle vertex module, and the two target formats.
pub(crate) struct PipelineShared {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub vertex_module: wgpu::ShaderModule,
    pub presentation_format: wgpu::TextureFormat,
    pub history_format: wgpu::TextureFormat,
}

impl PipelineShared {
    pub fn new(
        device: &wgpu::Device,
        presentation_format: wgpu::TextureFormat,
        history_format: wgpu::TextureFormat,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene params layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fullscreen triangle vertex"),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Borrowed(compile::VERTEX_SHADER_GLSL),
                stage: ShaderStage::Vertex,
                defines: &[],
            },
        });

        Self {
            uniform_layout,
            vertex_module,
            presentation_format,
            history_format,
        }
    }
}

pub(crate) struct ShaderProgram {
    label: String,
    params: ParamBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    presentation_pipeline: wgpu::RenderPipeline,
    history_pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    /// Loads and compiles a scene shader from disk.
    pub fn from_path(
        device: &wgpu::Device,
        shared: &PipelineShared,
        textures: &SceneTextures,
        path: &Path,
        blend: BlendMode,
    ) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader at {}", path.display()))?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_source(device, shared, textures, &label, &source, blend)
    }

    /// Wraps, compiles, and wires a program from raw GLSL.
    ///
    /// Compilation and pipeline construction run inside a validation error
    /// scope so a broken shader surfaces as a recoverable `Err` instead of a
    /// device panic; the caller drops the program and skips its passes.
    pub fn from_source(
        device: &wgpu::Device,
        shared: &PipelineShared,
        textures: &SceneTextures,
        label: &str,
        source: &str,
        blend: BlendMode,
    ) -> Result<Self> {
        let wrapped = compile::wrap_scene_fragment(source);

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Owned(wrapped.source),
                stage: ShaderStage::Fragment,
                defines: &[],
            },
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} texture layout")),
            entries: &texture_layout_entries(&wrapped.table),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} pipeline layout")),
            bind_group_layouts: &[&shared.uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let presentation_pipeline = build_pipeline(
            device,
            label,
            shared,
            &pipeline_layout,
            &fragment_module,
            shared.presentation_format,
            blend,
        );
        let history_pipeline = build_pipeline(
            device,
            label,
            shared,
            &pipeline_layout,
            &fragment_module,
            shared.history_format,
            blend,
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            anyhow::bail!("shader '{label}' failed validation: {error}");
        }

        let params = ParamBlock::new(wrapped.table);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} params")),
            size: params.bytes().len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} params bind group")),
            layout: &shared.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group =
            build_texture_bind_group(device, label, &texture_layout, &params, |name, kind| {
                textures.resolve(name, kind)
            });

        tracing::debug!(
            shader = label,
            members = params.table().members().len(),
            textures = params.table().textures().len(),
            "compiled shading program"
        );

        Ok(Self {
            label: label.to_string(),
            params,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            texture_bind_group,
            presentation_pipeline,
            history_pipeline,
        })
    }

    /// Resolves a semantic parameter against this program and records the
    /// value for the next flush. Unconsumed parameters are silently skipped.
    pub fn bind(&mut self, candidates: &[&str], value: UniformValue) {
        semantics::bind(&mut self.params, candidates, value);
    }

    /// Uploads the staged parameter block.
    pub fn flush(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, self.params.bytes());
    }

    /// Builds a replacement texture bind group, resolving each declared
    /// sampler name through `resolve`. Used by the composite pass, whose
    /// input textures change every frame.
    pub fn build_bind_group_with<'a>(
        &self,
        device: &wgpu::Device,
        resolve: impl Fn(&str, TextureKind) -> (&'a wgpu::TextureView, &'a wgpu::Sampler),
    ) -> wgpu::BindGroup {
        build_texture_bind_group(device, &self.label, &self.texture_layout, &self.params, resolve)
    }

    /// Records the fullscreen draw with this program's pipeline for the
    /// given target family and an optional replacement texture bind group
    /// (used by the composite pass, whose inputs change every frame).
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        family: TargetFamily,
        texture_bind_group: Option<&wgpu::BindGroup>,
    ) {
        let pipeline = match family {
            TargetFamily::Presentation => &self.presentation_pipeline,
            TargetFamily::History => &self.history_pipeline,
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, texture_bind_group.unwrap_or(&self.texture_bind_group), &[]);
        pass.draw(0..3, 0..1);
    }
}

fn texture_layout_entries(table: &compile::UniformTable) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(table.textures().len() * 2);
    for (slot, decl) in table.textures().iter().enumerate() {
        let view_dimension = match decl.kind {
            TextureKind::D2 => wgpu::TextureViewDimension::D2,
            TextureKind::D3 => wgpu::TextureViewDimension::D3,
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (slot as u32) * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (slot as u32) * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

fn build_texture_bind_group<'a>(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    params: &ParamBlock,
    resolve: impl Fn(&str, TextureKind) -> (&'a wgpu::TextureView, &'a wgpu::Sampler),
) -> wgpu::BindGroup {
    let resolved: Vec<(&wgpu::TextureView, &wgpu::Sampler)> = params
        .table()
        .textures()
        .iter()
        .map(|decl| resolve(&decl.name, decl.kind))
        .collect();

    let mut entries = Vec::with_capacity(resolved.len() * 2);
    for (slot, (view, sampler)) in resolved.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (slot as u32) * 2,
            resource: wgpu::BindingResource::TextureView(view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (slot as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label} textures")),
        layout,
        entries: &entries,
    })
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    shared: &PipelineShared,
    layout: &wgpu::PipelineLayout,
    fragment_module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shared.vertex_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend.state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
