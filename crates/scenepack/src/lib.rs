//! Locates scene assets on disk and resolves the scene manifest.
//!
//! The binary asks this crate two questions: where the `shaders/` and
//! `textures/` directories are ([`AssetRoots`]), and which files make up the
//! scene ([`SceneManifest`], resolved into absolute paths by [`resolve`]).
//! Missing files are tolerated here and downstream: the renderer skips or
//! substitutes whatever cannot be found.

mod manifest;
mod roots;

use std::path::PathBuf;

pub use manifest::{ManifestError, SceneManifest, ShaderSet, TextureSet, Tuning};
pub use roots::AssetRoots;

/// Manifest entries resolved to on-disk paths; `None` where the named file
/// was not found under any root.
#[derive(Debug, Default)]
pub struct ResolvedScene {
    pub slots: Vec<Option<PathBuf>>,
    pub base: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
    pub textures: ResolvedTextures,
    pub tuning: Tuning,
}

#[derive(Debug, Default)]
pub struct ResolvedTextures {
    pub low_frequency_noise: Option<PathBuf>,
    pub high_frequency_noise: Option<PathBuf>,
    pub weather_map: Option<PathBuf>,
    pub curl_noise: Option<PathBuf>,
    pub gradient_stratus: Option<PathBuf>,
    pub gradient_cumulus: Option<PathBuf>,
    pub gradient_cumulonimbus: Option<PathBuf>,
}

/// Resolves every manifest entry against the asset roots, logging what
/// could not be found.
pub fn resolve(manifest: &SceneManifest, roots: &AssetRoots) -> ResolvedScene {
    let shader = |name: &Option<String>, role: &str| -> Option<PathBuf> {
        let name = name.as_deref()?;
        let found = roots.find_shader(name);
        if found.is_none() {
            tracing::warn!(role, name, "shader file not found under any asset root");
        }
        found
    };
    let texture = |name: &Option<String>, role: &str| -> Option<PathBuf> {
        let name = name.as_deref()?;
        let found = roots.find_texture(name);
        if found.is_none() {
            tracing::warn!(role, name, "texture file not found under any asset root");
        }
        found
    };

    let slots = manifest
        .shaders
        .slots
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let found = roots.find_shader(name);
            if found.is_none() {
                tracing::warn!(slot = index + 1, name, "slot shader not found");
            }
            found
        })
        .collect();

    ResolvedScene {
        slots,
        base: shader(&manifest.shaders.base, "base"),
        overlay: shader(&manifest.shaders.overlay, "overlay"),
        textures: ResolvedTextures {
            low_frequency_noise: texture(&manifest.textures.low_frequency_noise, "low-frequency noise"),
            high_frequency_noise: texture(&manifest.textures.high_frequency_noise, "high-frequency noise"),
            weather_map: texture(&manifest.textures.weather_map, "weather map"),
            curl_noise: texture(&manifest.textures.curl_noise, "curl noise"),
            gradient_stratus: texture(&manifest.textures.gradient_stratus, "stratus gradient"),
            gradient_cumulus: texture(&manifest.textures.gradient_cumulus, "cumulus gradient"),
            gradient_cumulonimbus: texture(
                &manifest.textures.gradient_cumulonimbus,
                "cumulonimbus gradient",
            ),
        },
        tuning: manifest.tuning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_present_files_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = dir.path().join("shaders");
        fs::create_dir_all(&shaders).unwrap();
        fs::write(shaders.join("sky.glsl"), "void main() {}").unwrap();
        fs::write(shaders.join("water_sky.glsl"), "void main() {}").unwrap();

        let roots = AssetRoots::from_roots(vec![dir.path().to_path_buf()]);
        let manifest = SceneManifest::default();
        let resolved = resolve(&manifest, &roots);

        assert!(resolved.slots[0].is_some(), "sky.glsl should resolve");
        assert!(resolved.slots[1].is_none(), "ocean.glsl is absent");
        assert!(resolved.base.is_some());
        assert!(resolved.overlay.is_none());
        assert!(resolved.textures.weather_map.is_none());
        assert_eq!(resolved.tuning.cloud_top, 9000.0);
    }
}
