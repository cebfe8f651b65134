use std::path::PathBuf;

use clap::Parser;
use renderer::SceneMode;

#[derive(Parser, Debug)]
#[command(
    name = "overcast",
    author,
    version,
    about = "Procedural sky, ocean, and volumetric cloud renderer with temporal anti-aliasing"
)]
pub struct Cli {
    /// Window size (e.g. `1920x1080`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Explicit asset root containing `shaders/` and `textures/`.
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Scene manifest file; defaults to the first `scene.toml` found under
    /// the asset roots, falling back to the built-in scene.
    #[arg(long, value_name = "FILE")]
    pub scene: Option<PathBuf>,

    /// Initial scene: 1-7 select a single shader, 8 the combined
    /// ocean+cloud scene.
    #[arg(long, value_name = "SLOT", default_value = "8", value_parser = parse_scene_mode)]
    pub slot: SceneMode,

    /// Start with temporal anti-aliasing enabled.
    #[arg(long)]
    pub taa: bool,

    /// History blend weight in [0, 0.99]; overrides the manifest.
    #[arg(long, value_name = "WEIGHT")]
    pub history_weight: Option<f32>,

    /// Camera speed in meters per second; overrides the manifest.
    #[arg(long, value_name = "SPEED")]
    pub move_speed: Option<f32>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 1920x1080".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }
    Ok((width, height))
}

pub fn parse_scene_mode(value: &str) -> Result<SceneMode, String> {
    let digit: u8 = value
        .trim()
        .parse()
        .map_err(|_| "scene slot must be a digit between 1 and 8".to_string())?;
    SceneMode::from_digit(digit)
        .ok_or_else(|| format!("scene slot {digit} is out of range; use 1-7 or 8 for combined"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size(" 800X600 ").unwrap(), (800, 600));
        assert!(parse_surface_size("1920").is_err());
        assert!(parse_surface_size("0x600").is_err());
    }

    #[test]
    fn parses_scene_modes() {
        assert_eq!(parse_scene_mode("3").unwrap(), SceneMode::Direct(2));
        assert_eq!(parse_scene_mode("8").unwrap(), SceneMode::Combined);
        assert!(parse_scene_mode("0").is_err());
        assert!(parse_scene_mode("combined").is_err());
    }
}
