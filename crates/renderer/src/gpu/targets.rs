//! Double-buffered off-screen targets for temporal accumulation.
//!
//! Two equally sized color textures ping-pong between "freshly rendered" and
//! "history" roles; `current_index` marks the fresh slot. Targets are never
//! resized in place: any extent change tears both slots down and rebuilds
//! them, bumping `generation` so callers can detect the discontinuity and
//! drop their history.

use thiserror::Error;

/// Storage format of the accumulation targets. Half-float keeps the blend
/// from banding across many accumulated frames.
pub(crate) const HISTORY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// History target construction failure. Recoverable: the caller disables
/// temporal accumulation and keeps rendering directly.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("history target extent {width}x{height} has a zero dimension")]
    ZeroExtent { width: u32, height: u32 },
    #[error("history target extent {width}x{height} exceeds the device limit of {limit}")]
    ExtentTooLarge { width: u32, height: u32, limit: u32 },
    #[error("history target allocation failed: {0}")]
    Allocation(String),
}

/// Rebuild is needed unless both slots are allocated at exactly the
/// requested extent; `ensure` at an unchanged size must never reallocate.
fn needs_rebuild(allocated: Option<(u32, u32)>, width: u32, height: u32) -> bool {
    allocated != Some((width, height))
}

fn validate_extent(width: u32, height: u32, limit: u32) -> Result<(), TargetError> {
    if width == 0 || height == 0 {
        return Err(TargetError::ZeroExtent { width, height });
    }
    if width > limit || height > limit {
        return Err(TargetError::ExtentTooLarge {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

struct HistorySlot {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl HistorySlot {
    fn new(device: &wgpu::Device, width: u32, height: u32, index: usize) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("history color #{index}")),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HISTORY_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

pub(crate) struct HistoryTargets {
    slots: Option<[HistorySlot; 2]>,
    sampler: wgpu::Sampler,
    width: u32,
    height: u32,
    current_index: usize,
    generation: u64,
}

impl HistoryTargets {
    pub fn new(device: &wgpu::Device) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("history sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            slots: None,
            sampler,
            width: 0,
            height: 0,
            current_index: 0,
            generation: 0,
        }
    }

    /// Extent of the allocated slots, when both exist.
    fn allocated_extent(&self) -> Option<(u32, u32)> {
        self.slots.as_ref().map(|_| (self.width, self.height))
    }

    /// Makes both slots available at the requested extent. A no-op when the
    /// extent already matches; otherwise tears down and rebuilds both slots
    /// atomically. On failure nothing is left allocated.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
        limit: u32,
    ) -> Result<(), TargetError> {
        if !needs_rebuild(self.allocated_extent(), width, height) {
            return Ok(());
        }
        self.destroy();
        validate_extent(width, height, limit)?;

        // Half-float targets at full resolution are a sizeable allocation;
        // trap out-of-memory here instead of letting it surface as a device
        // loss mid-frame.
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let slots = [
            HistorySlot::new(device, width, height, 0),
            HistorySlot::new(device, width, height, 1),
        ];
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(TargetError::Allocation(error.to_string()));
        }

        self.slots = Some(slots);
        self.width = width;
        self.height = height;
        self.current_index = 0;
        self.generation += 1;
        tracing::debug!(width, height, generation = self.generation, "rebuilt history targets");
        Ok(())
    }

    /// Releases both slots and zeroes the recorded extent. Any destroyed
    /// target is a full discontinuity: the caller must invalidate history.
    pub fn destroy(&mut self) {
        self.slots = None;
        self.width = 0;
        self.height = 0;
        self.current_index = 0;
    }

    /// Index of the slot receiving this frame's render.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn set_current_index(&mut self, index: usize) {
        debug_assert!(index < 2);
        self.current_index = index;
    }

    /// Bumped on every rebuild; lets callers detect discontinuities.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self, index: usize) -> Option<&wgpu::TextureView> {
        self.slots.as_ref().map(|slots| &slots[index].view)
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_extent_never_rebuilds() {
        assert!(!needs_rebuild(Some((800, 600)), 800, 600));
        assert!(needs_rebuild(Some((800, 600)), 800, 601));
        assert!(needs_rebuild(Some((800, 600)), 1024, 600));
        assert!(needs_rebuild(None, 800, 600));
    }

    #[test]
    fn extent_validation_rejects_zero_and_oversize() {
        assert!(matches!(
            validate_extent(0, 600, 8192),
            Err(TargetError::ZeroExtent { .. })
        ));
        assert!(matches!(
            validate_extent(800, 0, 8192),
            Err(TargetError::ZeroExtent { .. })
        ));
        assert!(matches!(
            validate_extent(16384, 600, 8192),
            Err(TargetError::ExtentTooLarge { limit: 8192, .. })
        ));
        assert!(validate_extent(800, 600, 8192).is_ok());
    }

    #[test]
    fn errors_render_with_context() {
        let err = validate_extent(0, 600, 8192).unwrap_err();
        assert_eq!(
            err.to_string(),
            "history target extent 0x600 has a zero dimension"
        );
    }
}
