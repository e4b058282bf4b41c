use std::{env, path::PathBuf};

use dirs_next::{config_dir, home_dir};

/// Directory name used under the platform configuration directory.
pub const APP_CONFIG_DIR: &str = "renderflow";

pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// Resolves a renderflow configuration file.
///
/// A non-blank `env_override` variable wins (tilde expanded); otherwise the
/// file lives at `<config_dir>/renderflow/<file_name>`.
pub fn config_file_path(env_override: &str, file_name: &str) -> PathBuf {
    if let Ok(path) = env::var(env_override)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_CONFIG_DIR)
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins_over_config_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("custom.json");
        let resolved = temp_env::with_var("RENDERFLOW_TEST_CONFIG", Some(target.to_str().unwrap()), || {
            config_file_path("RENDERFLOW_TEST_CONFIG", "config.json")
        });
        assert_eq!(resolved, target);
    }

    #[test]
    fn blank_override_falls_back_to_default_location() {
        let resolved = temp_env::with_var("RENDERFLOW_TEST_CONFIG", Some("   "), || {
            config_file_path("RENDERFLOW_TEST_CONFIG", "config.json")
        });
        assert!(resolved.ends_with("renderflow/config.json"));
    }

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_tilde(" out/figures "), PathBuf::from("out/figures"));
    }
}
