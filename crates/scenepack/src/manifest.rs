//! Scene manifest schema.
//!
//! `scene.toml` names the shader files behind each selectable slot, the
//! combined-mode base and overlay passes, the scene texture files, and the
//! runtime tuning defaults. Every section is optional; the built-in defaults
//! describe the bundled demo scene.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read scene manifest at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene manifest at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SceneManifest {
    pub shaders: ShaderSet,
    pub textures: TextureSet,
    pub tuning: Tuning,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ShaderSet {
    /// Fragment shaders for the direct slots, in key order (1, 2, ...).
    pub slots: Vec<String>,
    /// Base pass of the combined ocean+cloud scene.
    pub base: Option<String>,
    /// Alpha-blended cloud overlay drawn over the base pass.
    pub overlay: Option<String>,
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self {
            slots: vec![
                "sky.glsl".to_string(),
                "ocean.glsl".to_string(),
                "clouds_march.glsl".to_string(),
                "cloud_single.glsl".to_string(),
                "water_sky.glsl".to_string(),
            ],
            base: Some("water_sky.glsl".to_string()),
            overlay: Some("clouds_over.glsl".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TextureSet {
    /// Base cloud shape noise, a vertically stacked 3D slice atlas.
    pub low_frequency_noise: Option<String>,
    /// Detail erosion noise, same atlas layout.
    pub high_frequency_noise: Option<String>,
    pub weather_map: Option<String>,
    pub curl_noise: Option<String>,
    pub gradient_stratus: Option<String>,
    pub gradient_cumulus: Option<String>,
    pub gradient_cumulonimbus: Option<String>,
}

impl Default for TextureSet {
    fn default() -> Self {
        Self {
            low_frequency_noise: Some("noise_base.tga".to_string()),
            high_frequency_noise: Some("noise_detail.tga".to_string()),
            weather_map: Some("weather.png".to_string()),
            curl_noise: Some("curl.png".to_string()),
            gradient_stratus: Some("gradient_stratus.png".to_string()),
            gradient_cumulus: Some("gradient_cumulus.png".to_string()),
            gradient_cumulonimbus: Some("gradient_cumulonimbus.png".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Tuning {
    /// Bottom of the cloud layer in meters.
    pub cloud_bottom: f32,
    /// Top of the cloud layer in meters.
    pub cloud_top: f32,
    /// History blend weight for temporal accumulation.
    pub history_weight: f32,
    /// Camera speed in meters per second.
    pub move_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            cloud_bottom: 1500.0,
            cloud_top: 9000.0,
            history_weight: 0.90,
            move_speed: 1200.0,
        }
    }
}

impl SceneManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Returns human-readable issues instead of panicking on odd values.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.tuning.cloud_top <= self.tuning.cloud_bottom {
            issues.push(format!(
                "cloud_top ({}) must be above cloud_bottom ({})",
                self.tuning.cloud_top, self.tuning.cloud_bottom
            ));
        }
        if !(0.0..=0.99).contains(&self.tuning.history_weight) {
            issues.push(format!(
                "history_weight ({}) must be within [0, 0.99]",
                self.tuning.history_weight
            ));
        }
        if self.tuning.move_speed <= 0.0 {
            issues.push(format!(
                "move_speed ({}) must be positive",
                self.tuning.move_speed
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_bundled_scene() {
        let manifest = SceneManifest::default();
        assert_eq!(manifest.shaders.slots.len(), 5);
        assert_eq!(manifest.shaders.base.as_deref(), Some("water_sky.glsl"));
        assert_eq!(manifest.tuning.cloud_bottom, 1500.0);
        assert!(manifest.validate().is_empty());
    }

    #[test]
    fn partial_manifests_fill_in_defaults() {
        let manifest = SceneManifest::from_toml_str(
            r#"
[tuning]
history_weight = 0.8

[shaders]
base = "custom_base.glsl"
"#,
        )
        .unwrap();
        assert_eq!(manifest.tuning.history_weight, 0.8);
        assert_eq!(manifest.tuning.cloud_bottom, 1500.0);
        assert_eq!(manifest.shaders.base.as_deref(), Some("custom_base.glsl"));
        assert!(!manifest.shaders.slots.is_empty());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(SceneManifest::from_toml_str("shaders = 12").is_err());
    }

    #[test]
    fn validation_flags_bad_tuning() {
        let manifest = SceneManifest::from_toml_str(
            r#"
[tuning]
cloud_bottom = 5000.0
cloud_top = 1000.0
history_weight = 1.5
"#,
        )
        .unwrap();
        let issues = manifest.validate();
        assert_eq!(issues.len(), 2);
    }
}
