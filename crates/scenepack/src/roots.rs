//! Asset root discovery.
//!
//! Assets live in `shaders/` and `textures/` directories next to the
//! executable, the working directory, or any of their ancestors, so the
//! binary keeps working from `target/debug`, an installed prefix, or the
//! repository checkout. An explicit root short-circuits the walk.

use std::path::{Path, PathBuf};

/// How many ancestor directories of the executable and working directory
/// are searched.
const ANCESTOR_DEPTH: usize = 10;

pub struct AssetRoots {
    roots: Vec<PathBuf>,
}

impl AssetRoots {
    /// Collects search roots: the explicit root first (when given), then the
    /// executable's directory and its ancestors, then the working directory
    /// and its ancestors.
    pub fn discover(explicit: Option<&Path>) -> Self {
        let mut roots = Vec::new();
        if let Some(root) = explicit {
            roots.push(root.to_path_buf());
        }
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                for ancestor in dir.ancestors().take(ANCESTOR_DEPTH) {
                    roots.push(ancestor.to_path_buf());
                }
            }
        }
        if let Ok(cwd) = std::env::current_dir() {
            for ancestor in cwd.ancestors().take(ANCESTOR_DEPTH) {
                roots.push(ancestor.to_path_buf());
            }
        }
        Self::from_roots(roots)
    }

    /// Builds a root list directly; deduplicates while preserving order.
    pub fn from_roots(roots: Vec<PathBuf>) -> Self {
        let mut unique = Vec::with_capacity(roots.len());
        for root in roots {
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        Self { roots: unique }
    }

    pub fn find_shader(&self, name: &str) -> Option<PathBuf> {
        self.find("shaders", name)
    }

    pub fn find_texture(&self, name: &str) -> Option<PathBuf> {
        self.find("textures", name)
    }

    /// First `scene.toml` found in any root.
    pub fn find_manifest(&self) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join("scene.toml"))
            .find(|candidate| candidate.is_file())
    }

    fn find(&self, folder: &str, name: &str) -> Option<PathBuf> {
        for root in &self.roots {
            let candidate = root.join(folder).join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        // Relative fallbacks for odd working directories.
        let direct = Path::new(folder).join(name);
        if direct.is_file() {
            return Some(direct);
        }
        let bare = PathBuf::from(name);
        if bare.is_file() {
            return Some(bare);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_assets_in_listed_roots() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = dir.path().join("shaders");
        fs::create_dir_all(&shaders).unwrap();
        fs::write(shaders.join("sky.glsl"), "void main() {}").unwrap();

        let roots = AssetRoots::from_roots(vec![dir.path().to_path_buf()]);
        let found = roots.find_shader("sky.glsl").unwrap();
        assert_eq!(found, shaders.join("sky.glsl"));
        assert!(roots.find_shader("missing.glsl").is_none());
        assert!(roots.find_texture("sky.glsl").is_none());
    }

    #[test]
    fn earlier_roots_take_precedence() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for dir in [&first, &second] {
            let shaders = dir.path().join("shaders");
            fs::create_dir_all(&shaders).unwrap();
            fs::write(shaders.join("sky.glsl"), "void main() {}").unwrap();
        }

        let roots = AssetRoots::from_roots(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let found = roots.find_shader("sky.glsl").unwrap();
        assert!(found.starts_with(first.path()));
    }

    #[test]
    fn manifest_is_located_per_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scene.toml"), "[tuning]\n").unwrap();
        let roots = AssetRoots::from_roots(vec![dir.path().to_path_buf()]);
        assert_eq!(roots.find_manifest().unwrap(), dir.path().join("scene.toml"));
    }
}
