use std::path::PathBuf;

/// Number of selectable direct shader slots (keyboard keys 1 through 7).
pub const SLOT_COUNT: usize = 7;

/// Which scene the frame orchestrator draws each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneMode {
    /// One shading program drawn straight to the presentation target.
    Direct(usize),
    /// Ocean+sky base pass with an alpha-blended cloud overlay on top.
    Combined,
}

impl SceneMode {
    /// Maps a keyboard digit to a mode: 1-7 select direct slots, 8 selects
    /// the combined scene. Returns `None` for anything else.
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1..=7 => Some(Self::Direct(usize::from(digit) - 1)),
            8 => Some(Self::Combined),
            _ => None,
        }
    }
}

/// Fragment shader files backing the selectable scenes.
///
/// Every entry is optional: a missing or unloadable file leaves the slot
/// empty and frames that need it are skipped instead of aborting.
#[derive(Clone, Debug, Default)]
pub struct SceneSources {
    /// Direct slots, at most [`SLOT_COUNT`] entries.
    pub slots: Vec<Option<PathBuf>>,
    /// Base pass of the combined mode.
    pub base: Option<PathBuf>,
    /// Alpha-blended cloud overlay of the combined mode.
    pub overlay: Option<PathBuf>,
}

/// Texture files consumed by the cloud and ocean shaders. All optional;
/// unbound textures fall back to 1x1 placeholders.
#[derive(Clone, Debug, Default)]
pub struct TextureSources {
    /// Base cloud shape noise, a vertically stacked 3D slice atlas.
    pub low_frequency_noise: Option<PathBuf>,
    /// Detail erosion noise, same atlas layout.
    pub high_frequency_noise: Option<PathBuf>,
    pub weather_map: Option<PathBuf>,
    pub curl_noise: Option<PathBuf>,
    pub gradient_stratus: Option<PathBuf>,
    pub gradient_cumulus: Option<PathBuf>,
    pub gradient_cumulonimbus: Option<PathBuf>,
}

/// Scene tuning knobs, adjustable at runtime from the keyboard.
#[derive(Clone, Copy, Debug)]
pub struct SceneTuning {
    /// Bottom of the cloud layer in meters.
    pub cloud_bottom: f32,
    /// Top of the cloud layer in meters.
    pub cloud_top: f32,
    /// History blend weight for temporal accumulation, `[0, 0.99]`.
    pub history_weight: f32,
    /// Camera speed in meters per second.
    pub move_speed: f32,
}

impl Default for SceneTuning {
    fn default() -> Self {
        Self {
            cloud_bottom: 1500.0,
            cloud_top: 9000.0,
            history_weight: 0.90,
            move_speed: 1200.0,
        }
    }
}

/// Immutable configuration handed to the renderer at start-up.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub scene: SceneSources,
    pub textures: TextureSources,
    pub tuning: SceneTuning,
    pub initial_mode: SceneMode,
    /// Start with temporal accumulation enabled.
    pub temporal_enabled: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1920, 1080),
            scene: SceneSources::default(),
            textures: TextureSources::default(),
            tuning: SceneTuning::default(),
            initial_mode: SceneMode::Combined,
            temporal_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_to_modes() {
        assert_eq!(SceneMode::from_digit(1), Some(SceneMode::Direct(0)));
        assert_eq!(SceneMode::from_digit(7), Some(SceneMode::Direct(6)));
        assert_eq!(SceneMode::from_digit(8), Some(SceneMode::Combined));
        assert_eq!(SceneMode::from_digit(0), None);
        assert_eq!(SceneMode::from_digit(9), None);
    }
}
