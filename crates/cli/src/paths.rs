use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// Settings directory: the explicit override, or `<config dir>/solman`.
pub fn settings_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => dirs::config_dir()
            .ok_or_else(|| anyhow!("failed to resolve a config directory; pass --settings-dir"))?
            .join("solman"),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        assert_eq!(settings_dir(Some(&dir)).unwrap(), dir);
        assert!(dir.is_dir());
    }
}
