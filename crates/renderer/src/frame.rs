//! Per-session frame state and the per-frame plan.
//!
//! Everything that decides *what* a frame does lives here as plain data and
//! pure functions; the GPU-facing code in `gpu::state` only executes the
//! resulting [`FramePlan`]. That split keeps the history/validity state
//! machine testable without a device.

use crate::jitter;

/// Upper bound for the history blend weight; 1.0 would freeze the image.
pub const MAX_HISTORY_WEIGHT: f32 = 0.99;

/// Mutable state for one logical rendering session.
///
/// Owned by the frame orchestrator and passed explicitly to the stages that
/// need it; nothing else mutates it within a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameState {
    frame_counter: u64,
    temporal_enabled: bool,
    history_valid: bool,
    history_weight: f32,
}

impl FrameState {
    pub fn new(temporal_enabled: bool, history_weight: f32) -> Self {
        Self {
            frame_counter: 0,
            temporal_enabled,
            history_valid: false,
            history_weight: history_weight.clamp(0.0, MAX_HISTORY_WEIGHT),
        }
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn temporal_enabled(&self) -> bool {
        self.temporal_enabled
    }

    pub fn history_valid(&self) -> bool {
        self.history_valid
    }

    pub fn history_weight(&self) -> f32 {
        self.history_weight
    }

    /// Effective blend factor for the composite pass: the configured weight
    /// while history is valid, zero right after any invalidation.
    pub fn blend_factor(&self) -> f32 {
        if self.history_valid {
            self.history_weight
        } else {
            0.0
        }
    }

    /// Flips temporal accumulation on or off. Either direction is a full
    /// discontinuity: history is dropped and the counter restarts.
    pub fn toggle_temporal(&mut self) {
        self.set_temporal(!self.temporal_enabled);
    }

    pub fn set_temporal(&mut self, enabled: bool) {
        self.temporal_enabled = enabled;
        self.reset();
    }

    /// Adjusts the history weight by `delta`, clamped to `[0, 0.99]`.
    /// Changing the weight invalidates history so the new blend takes effect
    /// from a clean accumulation.
    pub fn nudge_history_weight(&mut self, delta: f32) {
        self.history_weight = (self.history_weight + delta).clamp(0.0, MAX_HISTORY_WEIGHT);
        self.history_valid = false;
    }

    pub fn invalidate_history(&mut self) {
        self.history_valid = false;
    }

    /// Full session reset: history is dropped and the counter restarts.
    /// Used for the discontinuities that restart the jitter sequence
    /// (temporal toggle, resolution change).
    pub fn reset(&mut self) {
        self.history_valid = false;
        self.frame_counter = 0;
    }

    fn advance(&mut self) -> u64 {
        self.frame_counter = self.frame_counter.saturating_add(1);
        self.frame_counter
    }
}

/// What the renderer should do for one frame, decided before any GPU work.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum FramePlan {
    /// Nothing can be drawn this frame.
    Skip,
    /// Draw the scene pass(es) straight to the presentation surface.
    Direct { jitter: [f32; 2] },
    /// Draw into the fresh history slot, then composite against history.
    Temporal { jitter: [f32; 2], alpha: f32 },
}

/// Availability snapshot gathered by the orchestrator before planning.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlanInputs {
    pub surface_extent: (u32, u32),
    /// Every program the current mode draws with is loaded.
    pub programs_ready: bool,
    pub composite_ready: bool,
    /// `ensure` on the history targets succeeded this frame.
    pub targets_ready: bool,
}

/// Decides the frame plan and performs the frame-advance bookkeeping.
///
/// A zero-extent surface (minimized window) skips before any bookkeeping.
/// A missing program skips the draw but still advances the counter so
/// skipped frames do not desynchronize external timing. Jitter is sampled
/// from the post-increment counter and only for temporal frames.
pub(crate) fn plan_frame(state: &mut FrameState, inputs: &PlanInputs) -> FramePlan {
    let (width, height) = inputs.surface_extent;
    if width == 0 || height == 0 {
        return FramePlan::Skip;
    }
    if !inputs.programs_ready {
        state.advance();
        return FramePlan::Skip;
    }
    let frame = state.advance();
    if !state.temporal_enabled || !inputs.composite_ready || !inputs.targets_ready {
        return FramePlan::Direct { jitter: [0.0, 0.0] };
    }
    FramePlan::Temporal {
        jitter: jitter::sample(frame),
        alpha: state.blend_factor(),
    }
}

/// Bookkeeping after a composite pass has been recorded: history becomes
/// valid and the slot roles swap, returning the index the next frame
/// renders into.
pub(crate) fn complete_composite(state: &mut FrameState, fresh_index: usize) -> usize {
    debug_assert!(fresh_index < 2);
    state.history_valid = true;
    1 - fresh_index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_inputs() -> PlanInputs {
        PlanInputs {
            surface_extent: (800, 600),
            programs_ready: true,
            composite_ready: true,
            targets_ready: true,
        }
    }

    #[test]
    fn zero_extent_skips_without_bookkeeping() {
        let mut state = FrameState::new(true, 0.9);
        let plan = plan_frame(
            &mut state,
            &PlanInputs {
                surface_extent: (0, 600),
                ..ready_inputs()
            },
        );
        assert_eq!(plan, FramePlan::Skip);
        assert_eq!(state.frame_counter(), 0);
    }

    #[test]
    fn missing_program_skips_but_advances_counter() {
        let mut state = FrameState::new(false, 0.9);
        let plan = plan_frame(
            &mut state,
            &PlanInputs {
                programs_ready: false,
                ..ready_inputs()
            },
        );
        assert_eq!(plan, FramePlan::Skip);
        assert_eq!(state.frame_counter(), 1);
    }

    #[test]
    fn temporal_off_renders_direct_without_jitter() {
        let mut state = FrameState::new(false, 0.9);
        let plan = plan_frame(&mut state, &ready_inputs());
        assert_eq!(plan, FramePlan::Direct { jitter: [0.0, 0.0] });
    }

    #[test]
    fn temporal_frames_use_post_increment_jitter() {
        let mut state = FrameState::new(true, 0.9);
        match plan_frame(&mut state, &ready_inputs()) {
            FramePlan::Temporal { jitter: offset, alpha } => {
                assert_eq!(offset, jitter::sample(1));
                assert_eq!(alpha, 0.0, "first frame after reset must not blend");
            }
            other => panic!("expected temporal plan, got {other:?}"),
        }
    }

    #[test]
    fn missing_composite_degrades_to_direct() {
        let mut state = FrameState::new(true, 0.9);
        let plan = plan_frame(
            &mut state,
            &PlanInputs {
                composite_ready: false,
                ..ready_inputs()
            },
        );
        assert!(matches!(plan, FramePlan::Direct { .. }));
    }

    #[test]
    fn failed_targets_degrade_to_direct() {
        let mut state = FrameState::new(true, 0.9);
        let plan = plan_frame(
            &mut state,
            &PlanInputs {
                targets_ready: false,
                ..ready_inputs()
            },
        );
        assert!(matches!(plan, FramePlan::Direct { .. }));
    }

    #[test]
    fn blend_factor_is_gated_by_validity() {
        let mut state = FrameState::new(true, 0.9);
        assert_eq!(state.blend_factor(), 0.0);
        complete_composite(&mut state, 0);
        assert_eq!(state.blend_factor(), 0.9);
        state.invalidate_history();
        assert_eq!(state.blend_factor(), 0.0);
    }

    #[test]
    fn toggling_temporal_resets_history_and_counter() {
        let mut state = FrameState::new(true, 0.9);
        plan_frame(&mut state, &ready_inputs());
        complete_composite(&mut state, 0);
        assert!(state.history_valid());
        state.toggle_temporal();
        state.toggle_temporal();
        assert!(state.temporal_enabled());
        assert!(!state.history_valid());
        assert_eq!(state.frame_counter(), 0);
        match plan_frame(&mut state, &ready_inputs()) {
            FramePlan::Temporal { alpha, .. } => assert_eq!(alpha, 0.0),
            other => panic!("expected temporal plan, got {other:?}"),
        }
    }

    #[test]
    fn weight_nudges_clamp_and_invalidate() {
        let mut state = FrameState::new(true, 0.9);
        complete_composite(&mut state, 0);
        state.nudge_history_weight(0.5);
        assert_eq!(state.history_weight(), MAX_HISTORY_WEIGHT);
        assert!(!state.history_valid());
        state.nudge_history_weight(-2.0);
        assert_eq!(state.history_weight(), 0.0);
    }

    #[test]
    fn composite_ping_pongs_the_slot_index() {
        let mut state = FrameState::new(true, 0.9);
        let next = complete_composite(&mut state, 0);
        assert_eq!(next, 1);
        assert_eq!(complete_composite(&mut state, next), 0);
    }
}
