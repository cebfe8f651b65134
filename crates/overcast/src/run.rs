use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig, SceneSources, SceneTuning, TextureSources};
use scenepack::{AssetRoots, ResolvedScene, SceneManifest};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let roots = AssetRoots::discover(cli.assets.as_deref());

    let manifest = match cli.scene.clone().or_else(|| roots.find_manifest()) {
        Some(path) => {
            tracing::info!(manifest = %path.display(), "loading scene manifest");
            SceneManifest::load(&path)
                .with_context(|| format!("failed to load scene manifest at {}", path.display()))?
        }
        None => {
            tracing::info!("no scene.toml found; using the built-in scene");
            SceneManifest::default()
        }
    };
    for issue in manifest.validate() {
        tracing::warn!(%issue, "scene manifest issue");
    }

    let resolved = scenepack::resolve(&manifest, &roots);
    let config = build_config(&cli, resolved);

    tracing::info!(
        mode = ?config.initial_mode,
        temporal = config.temporal_enabled,
        "starting renderer"
    );
    let mut renderer = Renderer::new(config);
    renderer.run()
}

fn build_config(cli: &Cli, resolved: ResolvedScene) -> RendererConfig {
    let mut tuning = SceneTuning {
        cloud_bottom: resolved.tuning.cloud_bottom,
        cloud_top: resolved.tuning.cloud_top,
        history_weight: resolved.tuning.history_weight,
        move_speed: resolved.tuning.move_speed,
    };
    if let Some(weight) = cli.history_weight {
        tuning.history_weight = weight;
    }
    if let Some(speed) = cli.move_speed {
        tuning.move_speed = speed;
    }

    RendererConfig {
        surface_size: cli.size.unwrap_or((1920, 1080)),
        scene: SceneSources {
            slots: resolved.slots,
            base: resolved.base,
            overlay: resolved.overlay,
        },
        textures: TextureSources {
            low_frequency_noise: resolved.textures.low_frequency_noise,
            high_frequency_noise: resolved.textures.high_frequency_noise,
            weather_map: resolved.textures.weather_map,
            curl_noise: resolved.textures.curl_noise,
            gradient_stratus: resolved.textures.gradient_stratus,
            gradient_cumulus: resolved.textures.gradient_cumulus,
            gradient_cumulonimbus: resolved.textures.gradient_cumulonimbus,
        },
        tuning,
        initial_mode: cli.slot,
        temporal_enabled: cli.taa,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_overrides_replace_manifest_tuning() {
        let cli = Cli::parse_from([
            "overcast",
            "--taa",
            "--history-weight",
            "0.85",
            "--slot",
            "2",
        ]);
        let config = build_config(&cli, ResolvedScene::default());
        assert!(config.temporal_enabled);
        assert_eq!(config.tuning.history_weight, 0.85);
        assert_eq!(config.initial_mode, renderer::SceneMode::Direct(1));
        // Manifest defaults survive where no override was given.
        assert_eq!(config.tuning.move_speed, 1200.0);
    }
}
