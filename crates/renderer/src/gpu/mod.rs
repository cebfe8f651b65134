//! GPU orchestration for the scene renderer.
//!
//! - `context` owns wgpu instance/device/surface wiring and swapchain
//!   reconfiguration on resize.
//! - `compile` rewrites plain-GLSL scene shaders into Vulkan GLSL and
//!   reflects their uniform declarations into data-driven tables.
//! - `semantics` maps semantic parameters onto each program's accepted
//!   uniform names and writes values through those tables.
//! - `program` builds render pipelines, parameter buffers, and texture bind
//!   groups per shading program.
//! - `textures` materialises the scene texture set with placeholder
//!   fallbacks.
//! - `targets` owns the double-buffered history color targets.
//! - `state` glues everything together and executes the per-frame plan from
//!   `crate::frame`.

mod compile;
mod context;
mod program;
mod semantics;
mod state;
mod targets;
mod textures;

pub use targets::TargetError;

pub(crate) use state::SceneRenderer;
