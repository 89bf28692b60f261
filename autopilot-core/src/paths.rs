use std::path::PathBuf;

pub const APP_NAME: &str = "autopilot";

/// `$<xdg_var>/autopilot`, falling back to `~/<fallback>/autopilot`.
/// Uses the XDG layout on macOS too (not ~/Library).
fn xdg_app_dir(xdg_var: &str, fallback: &str) -> PathBuf {
    if let Ok(xdg_home) = std::env::var(xdg_var)
        && !xdg_home.is_empty()
    {
        return PathBuf::from(xdg_home).join(APP_NAME);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(fallback)
        .join(APP_NAME)
}

pub fn config_dir() -> PathBuf {
    xdg_app_dir("XDG_CONFIG_HOME", ".config")
}

pub fn cache_dir() -> PathBuf {
    xdg_app_dir("XDG_CACHE_HOME", ".cache")
}

/// Expand a leading `~` to the user's home directory.
///
/// Returns `None` when the path starts with `~` but the home directory
/// cannot be determined. Non-tilde paths are returned as-is.
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if path == "~" {
        dirs::home_dir()
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_override_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom");

        unsafe { std::env::set_var("AUTOPILOT_TEST_XDG_A", &custom) };
        let result = xdg_app_dir("AUTOPILOT_TEST_XDG_A", ".cache");
        unsafe { std::env::remove_var("AUTOPILOT_TEST_XDG_A") };

        assert_eq!(result, custom.join(APP_NAME));
    }

    #[test]
    fn empty_xdg_falls_back_to_home() {
        unsafe { std::env::set_var("AUTOPILOT_TEST_XDG_B", "") };
        let result = xdg_app_dir("AUTOPILOT_TEST_XDG_B", ".config");
        unsafe { std::env::remove_var("AUTOPILOT_TEST_XDG_B") };

        assert!(
            result.ends_with(format!(".config/{APP_NAME}").as_str()),
            "expected default .config/autopilot path, got: {result:?}"
        );
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(
            expand_tilde("/absolute/path"),
            Some(PathBuf::from("/absolute/path"))
        );
    }

    #[test]
    fn tilde_with_rest_expands() {
        let result = expand_tilde("~/work").expect("home dir should exist in test env");
        assert!(result.ends_with("work"));
        assert!(!result.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn tilde_in_middle_not_expanded() {
        assert_eq!(
            expand_tilde("/some/~/path"),
            Some(PathBuf::from("/some/~/path"))
        );
    }
}
