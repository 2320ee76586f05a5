//! Loader configuration for `BassEngine`.

use std::path::PathBuf;

/// Environment variable naming the directory that holds bass and its add-ons.
pub const ENV_LIBRARY_DIR: &str = "BASS_LIBRARY_DIR";
/// Environment variable listing add-ons to skip, e.g. "asio,cd".
pub const ENV_DISABLE_ADDONS: &str = "BASS_DISABLE_ADDONS";

/// Which libraries to load and where to look for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory searched before the default search (None = default search only)
    pub library_dir: Option<PathBuf>,
    /// Load bassasio
    pub load_asio: bool,
    /// Load basswasapi
    pub load_wasapi: bool,
    /// Load basscd
    pub load_cd: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_dir: None,
            load_asio: true,
            load_wasapi: true,
            load_cd: true,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `BASS_LIBRARY_DIR` and `BASS_DISABLE_ADDONS`.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(ENV_LIBRARY_DIR).ok(),
            std::env::var(ENV_DISABLE_ADDONS).ok(),
        )
    }

    fn from_vars(library_dir: Option<String>, disabled: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = library_dir.filter(|d| !d.trim().is_empty()) {
            config.library_dir = Some(PathBuf::from(dir.trim()));
        }

        if let Some(disabled) = disabled {
            for name in disabled.split(',').map(|s| s.trim().to_ascii_lowercase()) {
                match name.as_str() {
                    "asio" => config.load_asio = false,
                    "wasapi" => config.load_wasapi = false,
                    "cd" => config.load_cd = false,
                    "" => {}
                    other => log::warn!("{}: ignoring unknown add-on '{}'", ENV_DISABLE_ADDONS, other),
                }
            }
        }

        config
    }

    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }

    pub fn with_asio(mut self, enabled: bool) -> Self {
        self.load_asio = enabled;
        self
    }

    pub fn with_wasapi(mut self, enabled: bool) -> Self {
        self.load_wasapi = enabled;
        self
    }

    pub fn with_cd(mut self, enabled: bool) -> Self {
        self.load_cd = enabled;
        self
    }
}
