//! Frame orchestration: owns every GPU-side piece and executes frame plans.
//!
//! Pass order within a frame is load-bearing: the base pass fills the
//! destination before the overlay blends over it, and the composite pass
//! reads the fresh slot only after the scene pass has written it. All frame
//! state mutation happens here; the stages read it through the plan.

use anyhow::Result;
use winit::dpi::PhysicalSize;

use crate::camera::CameraSnapshot;
use crate::frame::{self, FramePlan, FrameState, PlanInputs};
use crate::types::{RendererConfig, SceneMode, SceneSources, SceneTuning, SLOT_COUNT};

use super::compile::{self, TextureKind, UniformValue};
use super::context::GpuContext;
use super::program::{BlendMode, PipelineShared, ShaderProgram, TargetFamily};
use super::semantics;
use super::targets::{HistoryTargets, HISTORY_FORMAT};
use super::textures::SceneTextures;

/// Earth radius in meters; the planet center sits this far below the camera.
const EARTH_RADIUS: f32 = 6_378_000.0;

#[rustfmt::skip]
const MAT4_IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// Loaded shading programs; any entry may be absent when its source failed
/// to load, in which case the frames that need it are skipped.
struct ProgramLibrary {
    slots: Vec<Option<ShaderProgram>>,
    base: Option<ShaderProgram>,
    overlay: Option<ShaderProgram>,
    composite: Option<ShaderProgram>,
}

impl ProgramLibrary {
    fn load(
        device: &wgpu::Device,
        shared: &PipelineShared,
        textures: &SceneTextures,
        scene: &SceneSources,
    ) -> Self {
        let try_load = |path: &std::path::Path, blend: BlendMode| -> Option<ShaderProgram> {
            match ShaderProgram::from_path(device, shared, textures, path, blend) {
                Ok(program) => Some(program),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "shader load failed");
                    None
                }
            }
        };

        let mut slots: Vec<Option<ShaderProgram>> = scene
            .slots
            .iter()
            .take(SLOT_COUNT)
            .map(|path| {
                path.as_deref()
                    .and_then(|path| try_load(path, BlendMode::Replace))
            })
            .collect();
        slots.resize_with(SLOT_COUNT, || None);

        let base = scene
            .base
            .as_deref()
            .and_then(|path| try_load(path, BlendMode::Replace));
        let overlay = scene
            .overlay
            .as_deref()
            .and_then(|path| try_load(path, BlendMode::PremultipliedOver));

        let composite = match ShaderProgram::from_source(
            device,
            shared,
            textures,
            "history composite",
            compile::COMPOSITE_FRAGMENT_GLSL,
            BlendMode::Replace,
        ) {
            Ok(program) => Some(program),
            Err(err) => {
                tracing::warn!(error = %err, "composite shader unavailable; temporal accumulation degrades to direct rendering");
                None
            }
        };

        Self {
            slots,
            base,
            overlay,
            composite,
        }
    }

    fn slot(&self, index: usize) -> Option<&ShaderProgram> {
        self.slots.get(index).and_then(Option::as_ref)
    }
}

pub(crate) struct SceneRenderer {
    context: GpuContext,
    library: ProgramLibrary,
    targets: HistoryTargets,
    frame: FrameState,
    mode: SceneMode,
    tuning: SceneTuning,
    // Kept alive for program texture bind groups and composite fallbacks.
    textures: SceneTextures,
}

impl SceneRenderer {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: raw_window_handle::HasDisplayHandle + raw_window_handle::HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size)?;
        let shared = PipelineShared::new(&context.device, context.surface_format, HISTORY_FORMAT);
        let textures = SceneTextures::load(&context.device, &context.queue, &config.textures);
        let library = ProgramLibrary::load(&context.device, &shared, &textures, &config.scene);
        let targets = HistoryTargets::new(&context.device);
        let frame = FrameState::new(config.temporal_enabled, config.tuning.history_weight);

        Ok(Self {
            context,
            library,
            targets,
            frame,
            mode: config.initial_mode,
            tuning: config.tuning,
            textures,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
        // The history targets re-ensure lazily on the next temporal frame; a
        // changed extent restarts the accumulation session either way.
        self.frame.reset();
    }

    pub(crate) fn set_mode(&mut self, mode: SceneMode) {
        if let SceneMode::Direct(slot) = mode {
            if slot >= SLOT_COUNT {
                return;
            }
        }
        if self.mode != mode {
            tracing::info!(?mode, "scene mode changed");
            self.mode = mode;
        }
    }

    pub(crate) fn toggle_temporal(&mut self) {
        self.frame.toggle_temporal();
        tracing::info!(
            enabled = self.frame.temporal_enabled(),
            "temporal accumulation toggled"
        );
    }

    pub(crate) fn nudge_history_weight(&mut self, delta: f32) {
        self.frame.nudge_history_weight(delta);
        tracing::info!(weight = self.frame.history_weight(), "history weight adjusted");
    }

    /// Shifts the cloud layer up or down. The bottom never goes below the
    /// ground and the top keeps at least 500 m of layer thickness. Scene
    /// appearance changes, so history is dropped.
    pub(crate) fn shift_cloud_layer(&mut self, delta: f32) {
        if delta >= 0.0 {
            self.tuning.cloud_bottom += delta;
            self.tuning.cloud_top += delta;
        } else {
            self.tuning.cloud_bottom = (self.tuning.cloud_bottom + delta).max(0.0);
            self.tuning.cloud_top =
                (self.tuning.cloud_top + delta).max(self.tuning.cloud_bottom + 500.0);
        }
        self.frame.invalidate_history();
        tracing::info!(
            bottom = self.tuning.cloud_bottom,
            top = self.tuning.cloud_top,
            "cloud layer shifted"
        );
    }

    pub(crate) fn move_speed(&self) -> f32 {
        self.tuning.move_speed
    }

    /// Produces one frame. `drawable_extent` is the window's current inner
    /// size; a zero extent (minimize) skips the frame entirely.
    pub(crate) fn render(
        &mut self,
        camera: &CameraSnapshot,
        time: f32,
        drawable_extent: PhysicalSize<u32>,
    ) -> Result<(), wgpu::SurfaceError> {
        let mut targets_ready = false;
        let drawable = drawable_extent.width > 0 && drawable_extent.height > 0;
        if drawable && self.frame.temporal_enabled() {
            let (width, height) = (self.context.config.width, self.context.config.height);
            let before = self.targets.generation();
            match self.targets.ensure(
                &self.context.device,
                width,
                height,
                self.context.max_texture_dimension(),
            ) {
                Ok(()) => {
                    if self.targets.generation() != before {
                        self.frame.reset();
                    }
                    targets_ready = true;
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "history targets unavailable; disabling temporal accumulation"
                    );
                    self.frame.set_temporal(false);
                }
            }
        }

        let inputs = PlanInputs {
            surface_extent: (drawable_extent.width, drawable_extent.height),
            programs_ready: self.programs_ready(),
            composite_ready: self.library.composite.is_some(),
            targets_ready,
        };

        match frame::plan_frame(&mut self.frame, &inputs) {
            FramePlan::Skip => Ok(()),
            FramePlan::Direct { jitter } => self.render_direct(camera, time, jitter),
            FramePlan::Temporal { jitter, alpha } => {
                self.render_temporal(camera, time, jitter, alpha)
            }
        }
    }

    fn programs_ready(&self) -> bool {
        match self.mode {
            SceneMode::Direct(slot) => self.library.slot(slot).is_some(),
            SceneMode::Combined => self.library.base.is_some() && self.library.overlay.is_some(),
        }
    }

    fn render_direct(
        &mut self,
        camera: &CameraSnapshot,
        time: f32,
        jitter: [f32; 2],
    ) -> Result<(), wgpu::SurfaceError> {
        self.stage_scene_uniforms(camera, time, jitter);

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("direct frame"),
                });
        self.record_scene_pass(&mut encoder, &view, TargetFamily::Presentation);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn render_temporal(
        &mut self,
        camera: &CameraSnapshot,
        time: f32,
        jitter: [f32; 2],
        alpha: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        self.stage_scene_uniforms(camera, time, jitter);

        let extent = [
            self.context.config.width as f32,
            self.context.config.height as f32,
        ];
        if let Some(composite) = self.library.composite.as_mut() {
            composite.bind(semantics::COMPOSITE_ALPHA, UniformValue::Float(alpha));
            composite.bind(semantics::RESOLUTION, UniformValue::Vec2(extent));
            composite.flush(&self.context.queue);
        }

        let fresh_index = self.targets.current_index();
        let fresh_view = self
            .targets
            .view(fresh_index)
            .expect("history targets exist when a temporal plan is chosen");
        let history_view = self
            .targets
            .view(1 - fresh_index)
            .expect("history targets exist when a temporal plan is chosen");

        let frame = self.context.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("temporal frame"),
                });

        self.record_scene_pass(&mut encoder, fresh_view, TargetFamily::History);

        if let Some(composite) = &self.library.composite {
            let inputs = composite.build_bind_group_with(&self.context.device, |name, kind| {
                if kind == TextureKind::D2 && semantics::is_composite_current(name) {
                    (fresh_view, self.targets.sampler())
                } else if kind == TextureKind::D2 && semantics::is_composite_history(name) {
                    (history_view, self.targets.sampler())
                } else {
                    self.textures.resolve(name, kind)
                }
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            composite.draw(&mut pass, TargetFamily::Presentation, Some(&inputs));
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        let next = frame::complete_composite(&mut self.frame, fresh_index);
        self.targets.set_current_index(next);
        Ok(())
    }

    /// Resolves the per-frame semantic parameters into every program the
    /// current mode draws with and uploads their parameter blocks.
    fn stage_scene_uniforms(&mut self, camera: &CameraSnapshot, time: f32, jitter: [f32; 2]) {
        let extent = [
            self.context.config.width as f32,
            self.context.config.height as f32,
        ];
        let tuning = self.tuning;
        let queue = &self.context.queue;
        match self.mode {
            SceneMode::Direct(slot) => {
                if let Some(program) = self.library.slots.get_mut(slot).and_then(Option::as_mut) {
                    bind_scene_uniforms(program, camera, time, jitter, extent, &tuning);
                    program.flush(queue);
                }
            }
            SceneMode::Combined => {
                for program in [self.library.base.as_mut(), self.library.overlay.as_mut()]
                    .into_iter()
                    .flatten()
                {
                    bind_scene_uniforms(program, camera, time, jitter, extent, &tuning);
                    program.flush(queue);
                }
            }
        }
    }

    /// Records the scene pass for the current mode: base pass clears and
    /// fills the target, the overlay (combined mode) blends over it within
    /// the same pass.
    fn record_scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        family: TargetFamily,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        match self.mode {
            SceneMode::Direct(slot) => {
                if let Some(program) = self.library.slot(slot) {
                    program.draw(&mut pass, family, None);
                }
            }
            SceneMode::Combined => {
                if let Some(base) = &self.library.base {
                    base.draw(&mut pass, family, None);
                }
                if let Some(overlay) = &self.library.overlay {
                    overlay.draw(&mut pass, family, None);
                }
            }
        }
    }
}

fn bind_scene_uniforms(
    program: &mut ShaderProgram,
    camera: &CameraSnapshot,
    time: f32,
    jitter: [f32; 2],
    extent: [f32; 2],
    tuning: &SceneTuning,
) {
    use super::semantics::{
        CAMERA_FRONT, CAMERA_POSITION, CAMERA_RIGHT, CAMERA_UP, CLOUD_BOTTOM, CLOUD_TOP,
        EARTH_CENTER, JITTER, MODEL, PROJECTION, RESOLUTION, SCREEN_HEIGHT, SCREEN_WIDTH, TIME,
        VIEW,
    };

    program.bind(TIME, UniformValue::Float(time));
    program.bind(SCREEN_WIDTH, UniformValue::Float(extent[0]));
    program.bind(SCREEN_HEIGHT, UniformValue::Float(extent[1]));
    program.bind(RESOLUTION, UniformValue::Vec2(extent));

    program.bind(CAMERA_POSITION, UniformValue::Vec3(camera.position.to_array()));
    program.bind(CAMERA_FRONT, UniformValue::Vec3(camera.front.to_array()));
    program.bind(CAMERA_UP, UniformValue::Vec3(camera.up.to_array()));
    program.bind(CAMERA_RIGHT, UniformValue::Vec3(camera.right.to_array()));

    // The planet is modelled as a sphere directly beneath the camera.
    let earth_center = [camera.position.x, -EARTH_RADIUS, camera.position.z];
    program.bind(EARTH_CENTER, UniformValue::Vec3(earth_center));

    program.bind(CLOUD_BOTTOM, UniformValue::Float(tuning.cloud_bottom));
    program.bind(CLOUD_TOP, UniformValue::Float(tuning.cloud_top));

    program.bind(JITTER, UniformValue::Vec2(jitter));

    program.bind(MODEL, UniformValue::Mat4(MAT4_IDENTITY));
    program.bind(VIEW, UniformValue::Mat4(MAT4_IDENTITY));
    program.bind(PROJECTION, UniformValue::Mat4(MAT4_IDENTITY));
}
