//! Application configuration from `PARLEY_*` environment variables.

use std::path::PathBuf;

use crate::server::ServerConfig;
use crate::types::{TICK_MS, TILE_SIZE};

pub const DEFAULT_DEBUG_LOG: &str = "parley-debug.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` draws the built-in atlas.
    pub atlas_path: Option<PathBuf>,
    pub tile_size: usize,
    pub tick_ms: u64,
    /// `None` disables the debug log.
    pub debug_log: Option<PathBuf>,
    /// `None` when the router bridge is disabled.
    pub router: Option<ServerConfig>,
    pub picker_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            atlas_path: None,
            tile_size: TILE_SIZE,
            tick_ms: TICK_MS,
            debug_log: Some(PathBuf::from(DEFAULT_DEBUG_LOG)),
            router: Some(ServerConfig::default()),
            picker_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable or zero numbers
    /// fall back to the defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let atlas_path = get("PARLEY_ATLAS_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or(defaults.atlas_path);

        let tile_size = get("PARLEY_TILE_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.tile_size);

        let tick_ms = get("PARLEY_TICK_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.tick_ms);

        // Set but empty disables the log.
        let debug_log = match get("PARLEY_DEBUG_LOG") {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(PathBuf::from(s.trim())),
            None => defaults.debug_log,
        };

        let router = if ServerConfig::is_disabled(&get) {
            None
        } else {
            Some(ServerConfig::from_lookup(&get))
        };

        let picker_dir = get("PARLEY_PICKER_DIR")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.picker_dir);

        Self {
            atlas_path,
            tile_size,
            tick_ms,
            debug_log,
            router,
            picker_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        AppConfig::from_lookup(|k| map.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn defaults() {
        let cfg = from(&[]);
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.tick_ms, 250);
        assert_eq!(cfg.atlas_path, None);
        assert_eq!(cfg.router.unwrap().port, 7878);
    }

    #[test]
    fn blank_atlas_path_keeps_builtin() {
        assert_eq!(from(&[("PARLEY_ATLAS_PATH", "  ")]).atlas_path, None);
    }

    #[test]
    fn overrides() {
        let cfg = from(&[
            ("PARLEY_ATLAS_PATH", "art/town.png"),
            ("PARLEY_TILE_SIZE", "8"),
            ("PARLEY_TICK_MS", "100"),
            ("PARLEY_DEBUG_LOG", ""),
            ("PARLEY_ROUTER_DISABLED", "true"),
            ("PARLEY_PICKER_DIR", "docs"),
        ]);
        assert_eq!(cfg.atlas_path, Some(PathBuf::from("art/town.png")));
        assert_eq!(cfg.tile_size, 8);
        assert_eq!(cfg.tick_ms, 100);
        assert_eq!(cfg.debug_log, None);
        assert_eq!(cfg.router, None);
        assert_eq!(cfg.picker_dir, PathBuf::from("docs"));
    }

    #[test]
    fn bad_numbers_fall_back() {
        let cfg = from(&[("PARLEY_TILE_SIZE", "0"), ("PARLEY_TICK_MS", "fast")]);
        assert_eq!(cfg.tile_size, TILE_SIZE);
        assert_eq!(cfg.tick_ms, TICK_MS);
    }
}
