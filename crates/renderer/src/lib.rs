//! Renderer crate for Overcast.
//!
//! Composites procedural sky, ocean, and volumetric cloud shading with an
//! optional temporal anti-aliasing stage. The overall flow is:
//!
//! ```text
//!   CLI / overcast
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ window loop ──▶ frame plan ──▶ scene pass(es)
//!                          │                             │ (temporal on)
//!                          └─▶ camera rig                ▼
//!                                               history composite ─▶ present
//! ```
//!
//! Scene shaders are independently authored GLSL with no shared naming
//! convention; the `gpu` module reflects each one's uniform declarations
//! into a table and binds semantic parameters (time, camera basis, cloud
//! layer, sub-pixel jitter) through ordered name aliases. Temporal
//! accumulation renders into one of two ping-ponged history targets and
//! blends against the previous frame with a validity-gated weight.

mod camera;
mod frame;
mod gpu;
mod window;

pub mod jitter;
mod types;

use anyhow::Result;

pub use camera::{CameraRig, CameraSnapshot, Movement};
pub use frame::{FrameState, MAX_HISTORY_WEIGHT};
pub use gpu::TargetError;
pub use types::{
    RendererConfig, SceneMode, SceneSources, SceneTuning, TextureSources, SLOT_COUNT,
};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and runs the render loop until the user exits.
    pub fn run(&mut self) -> Result<()> {
        window::run(&self.config)
    }
}
