//! Scene texture set shared by every shading program.
//!
//! Loading is failure tolerant: a missing or undecodable file leaves the
//! slot empty with a warning, and programs that sample it receive a 1x1
//! placeholder instead. Noise volumes arrive as vertically stacked slice
//! atlases (a WxH image holding H/W square slices).

use std::path::Path;

use anyhow::{Context, Result};
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::types::TextureSources;

use super::compile::TextureKind;
use super::semantics::{TextureSemantic, TEXTURE_SEMANTICS};

pub(crate) struct SceneTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

pub(crate) struct SceneTextures {
    /// Parallel to [`TEXTURE_SEMANTICS`].
    entries: Vec<Option<SceneTexture>>,
    placeholder_2d: SceneTexture,
    placeholder_3d: SceneTexture,
}

impl SceneTextures {
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, sources: &TextureSources) -> Self {
        let paths = [
            sources.low_frequency_noise.as_deref(),
            sources.high_frequency_noise.as_deref(),
            sources.weather_map.as_deref(),
            sources.curl_noise.as_deref(),
            sources.gradient_stratus.as_deref(),
            sources.gradient_cumulus.as_deref(),
            sources.gradient_cumulonimbus.as_deref(),
        ];
        debug_assert_eq!(paths.len(), TEXTURE_SEMANTICS.len());

        let entries = TEXTURE_SEMANTICS
            .iter()
            .zip(paths)
            .map(|(semantic, path)| {
                let path = match path {
                    Some(path) => path,
                    None => {
                        tracing::debug!(texture = semantic.label, "texture not configured");
                        return None;
                    }
                };
                match load_texture(device, queue, semantic, path) {
                    Ok(texture) => Some(texture),
                    Err(err) => {
                        tracing::warn!(
                            texture = semantic.label,
                            path = %path.display(),
                            error = %err,
                            "failed to load texture; using placeholder"
                        );
                        None
                    }
                }
            })
            .collect();

        Self {
            entries,
            placeholder_2d: placeholder(device, queue, TextureKind::D2),
            placeholder_3d: placeholder(device, queue, TextureKind::D3),
        }
    }

    /// View and sampler for the scene texture a sampler name refers to,
    /// falling back to the placeholder of matching dimensionality.
    pub fn resolve(&self, name: &str, kind: TextureKind) -> (&wgpu::TextureView, &wgpu::Sampler) {
        let resolved = super::semantics::texture_semantic_index(name, kind)
            .and_then(|index| self.entries[index].as_ref());
        match resolved {
            Some(texture) => (&texture.view, &texture.sampler),
            None => {
                tracing::debug!(name, ?kind, "sampler resolves to placeholder");
                self.placeholder(kind)
            }
        }
    }

    pub fn placeholder(&self, kind: TextureKind) -> (&wgpu::TextureView, &wgpu::Sampler) {
        let texture = match kind {
            TextureKind::D2 => &self.placeholder_2d,
            TextureKind::D3 => &self.placeholder_3d,
        };
        (&texture.view, &texture.sampler)
    }
}

fn load_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    semantic: &TextureSemantic,
    path: &Path,
) -> Result<SceneTexture> {
    let image = image::open(path)
        .with_context(|| format!("failed to open texture at {}", path.display()))?;
    let rgba = image.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    if width == 0 || height == 0 {
        anyhow::bail!("texture has zero extent ({width}x{height})");
    }

    let (size, dimension) = match semantic.kind {
        TextureKind::D2 => (
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            wgpu::TextureDimension::D2,
        ),
        TextureKind::D3 => {
            let depth = volume_depth(width, height).with_context(|| {
                format!("{width}x{height} is not a vertical atlas of square slices")
            })?;
            (
                wgpu::Extent3d {
                    width,
                    height: width,
                    depth_or_array_layers: depth,
                },
                wgpu::TextureDimension::D3,
            )
        }
    };

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(semantic.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        rgba.as_raw(),
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&sampler_descriptor(semantic.repeats));

    tracing::info!(
        texture = semantic.label,
        path = %path.display(),
        width,
        height,
        "loaded scene texture"
    );

    Ok(SceneTexture {
        _texture: texture,
        view,
        sampler,
    })
}

/// Number of square slices in a vertically stacked volume atlas, or `None`
/// when the image cannot be sliced evenly.
fn volume_depth(width: u32, height: u32) -> Option<u32> {
    if width == 0 || height == 0 || height % width != 0 {
        return None;
    }
    Some(height / width)
}

fn sampler_descriptor(repeats: bool) -> wgpu::SamplerDescriptor<'static> {
    let address_mode = if repeats {
        wgpu::AddressMode::Repeat
    } else {
        wgpu::AddressMode::ClampToEdge
    };
    wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    }
}

fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, kind: TextureKind) -> SceneTexture {
    let (dimension, label) = match kind {
        TextureKind::D2 => (wgpu::TextureDimension::D2, "placeholder 2d"),
        TextureKind::D3 => (wgpu::TextureDimension::D3, "placeholder 3d"),
    };
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &[255, 255, 255, 255],
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&sampler_descriptor(false));
    SceneTexture {
        _texture: texture,
        view,
        sampler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_depth_requires_square_slices() {
        assert_eq!(volume_depth(128, 128 * 32), Some(32));
        assert_eq!(volume_depth(64, 64), Some(1));
        assert_eq!(volume_depth(128, 100), None);
        assert_eq!(volume_depth(0, 128), None);
    }
}
