//! Semantic parameters and their accepted uniform names.
//!
//! The scene shaders were written independently and do not agree on uniform
//! naming, so the driver never addresses a uniform by one literal name.
//! Instead every semantic parameter carries an ordered candidate list; the
//! first name a program actually declares receives the value and the rest
//! are ignored. A program that declares none of the candidates simply does
//! not consume that parameter — that is the common case, not an error.

use super::compile::{ParamBlock, TextureKind, UniformValue};

pub(crate) const TIME: &[&str] = &["Time", "time", "uTime", "iTime"];
pub(crate) const SCREEN_WIDTH: &[&str] = &["screenWidth", "ScreenWidth"];
pub(crate) const SCREEN_HEIGHT: &[&str] = &["screenHeight", "ScreenHeight"];
pub(crate) const RESOLUTION: &[&str] = &["resolution", "uResolution", "iResolution", "Resolution"];
pub(crate) const CAMERA_POSITION: &[&str] = &["cameraPosition", "camPos", "uCamPos"];
pub(crate) const CAMERA_FRONT: &[&str] = &["cameraFront", "camFront", "uCamFront"];
pub(crate) const CAMERA_UP: &[&str] = &["cameraUp", "camUp", "uCamUp"];
pub(crate) const CAMERA_RIGHT: &[&str] = &["cameraRight", "camRight", "uCamRight"];
pub(crate) const EARTH_CENTER: &[&str] = &["EarthCenter", "earthCenter", "uEarthCenter"];
pub(crate) const CLOUD_BOTTOM: &[&str] = &["CloudBottom", "uCloudBottom"];
pub(crate) const CLOUD_TOP: &[&str] = &["CloudTop", "uCloudTop"];
pub(crate) const JITTER: &[&str] = &["HaltonSequence", "uJitter", "uHalton", "halton"];
pub(crate) const MODEL: &[&str] = &["model", "Model"];
pub(crate) const VIEW: &[&str] = &["view", "View"];
pub(crate) const PROJECTION: &[&str] = &["projection", "Projection"];
pub(crate) const COMPOSITE_ALPHA: &[&str] = &["uAlpha", "alpha", "historyAlpha"];
pub(crate) const COMPOSITE_CURRENT: &[&str] = &["uCurrent", "currentFrame"];
pub(crate) const COMPOSITE_HISTORY: &[&str] = &["uHistory", "historyFrame"];

/// Writes `value` at the first candidate name the program declares.
///
/// Returns whether any candidate resolved; callers normally ignore the
/// result since unconsumed parameters are expected.
pub(crate) fn bind(block: &mut ParamBlock, candidates: &[&str], value: UniformValue) -> bool {
    candidates.iter().any(|name| block.write(name, value))
}

/// One texture the scene provides, with the sampler names shaders use for it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TextureSemantic {
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: TextureKind,
    /// Noise volumes tile; gradients and maps clamp.
    pub repeats: bool,
}

/// Scene texture roster in binding-preference order.
pub(crate) const TEXTURE_SEMANTICS: &[TextureSemantic] = &[
    TextureSemantic {
        label: "low-frequency noise",
        aliases: &[
            "lowFrequencyTexture",
            "cloudBaseShapeSampler",
            "cloudBaseShapeTexture",
            "LowFrequencyTexture",
        ],
        kind: TextureKind::D3,
        repeats: true,
    },
    TextureSemantic {
        label: "high-frequency noise",
        aliases: &[
            "highFrequencyTexture",
            "cloudHighFreqSampler",
            "cloudHighFreqTexture",
            "HighFrequencyTexture",
        ],
        kind: TextureKind::D3,
        repeats: true,
    },
    TextureSemantic {
        label: "weather map",
        aliases: &[
            "WeatherTexture",
            "weatherMapSampler",
            "weatherTexture",
            "WeatherMap",
        ],
        kind: TextureKind::D2,
        repeats: true,
    },
    TextureSemantic {
        label: "curl noise",
        aliases: &[
            "CurlNoiseTexture",
            "curlNoiseSampler",
            "curlNoiseTexture",
            "CurlNoise",
        ],
        kind: TextureKind::D2,
        repeats: true,
    },
    TextureSemantic {
        label: "stratus gradient",
        aliases: &[
            "GradientStratusTexture",
            "gradientStratusSampler",
            "gradientStratusTexture",
        ],
        kind: TextureKind::D2,
        repeats: false,
    },
    TextureSemantic {
        label: "cumulus gradient",
        aliases: &[
            "GradientCumulusTexture",
            "gradientCumulusSampler",
            "gradientCumulusTexture",
        ],
        kind: TextureKind::D2,
        repeats: false,
    },
    TextureSemantic {
        label: "cumulonimbus gradient",
        aliases: &[
            "GradientCumulonimbusTexture",
            "gradientCumulonimbusSampler",
            "gradientCumulonimbusTexture",
        ],
        kind: TextureKind::D2,
        repeats: false,
    },
];

/// Index into [`TEXTURE_SEMANTICS`] for the scene texture a declared sampler
/// name refers to, if any.
pub(crate) fn texture_semantic_index(name: &str, kind: TextureKind) -> Option<usize> {
    TEXTURE_SEMANTICS
        .iter()
        .position(|semantic| semantic.kind == kind && semantic.aliases.contains(&name))
}

/// True when the name is one of the composite stage's input samplers.
pub(crate) fn is_composite_current(name: &str) -> bool {
    COMPOSITE_CURRENT.contains(&name)
}

pub(crate) fn is_composite_history(name: &str) -> bool {
    COMPOSITE_HISTORY.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::compile::wrap_scene_fragment;

    fn block_for(source: &str) -> ParamBlock {
        ParamBlock::new(wrap_scene_fragment(source).table)
    }

    #[test]
    fn first_declared_candidate_wins() {
        // Declares both "uTime" and "iTime"; "uTime" appears earlier in the
        // candidate list and must receive the write.
        let mut block = block_for(
            "uniform float uTime;\nuniform float iTime;\nvoid main() { FragColor = vec4(uTime + iTime); }\n",
        );
        assert!(bind(&mut block, TIME, UniformValue::Float(2.5)));
        let table = block.table();
        let u_time = table.member("uTime").unwrap().offset as usize;
        let i_time = table.member("iTime").unwrap().offset as usize;
        assert_eq!(block.bytes()[u_time..u_time + 4], 2.5f32.to_le_bytes());
        assert_eq!(block.bytes()[i_time..i_time + 4], [0; 4]);
    }

    #[test]
    fn unconsumed_parameters_resolve_to_nothing() {
        let mut block = block_for("uniform float Time;\nvoid main() { FragColor = vec4(Time); }\n");
        assert!(!bind(&mut block, CLOUD_TOP, UniformValue::Float(9000.0)));
        assert!(bind(&mut block, TIME, UniformValue::Float(1.0)));
    }

    #[test]
    fn texture_aliases_respect_dimensionality() {
        let index = texture_semantic_index("weatherMapSampler", TextureKind::D2).unwrap();
        assert_eq!(TEXTURE_SEMANTICS[index].label, "weather map");
        // Same name with the wrong dimensionality does not match.
        assert!(texture_semantic_index("weatherMapSampler", TextureKind::D3).is_none());
        assert!(texture_semantic_index("unknownSampler", TextureKind::D2).is_none());
    }

    #[test]
    fn composite_inputs_are_recognised() {
        assert!(is_composite_current("uCurrent"));
        assert!(is_composite_history("uHistory"));
        assert!(!is_composite_current("uHistory"));
    }
}
