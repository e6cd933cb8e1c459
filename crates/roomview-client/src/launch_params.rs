//! Launch parameter parsing for the viewer.
//!
//! On native, parameters are parsed from command-line arguments using clap.
//! On WASM, defaults are used, and `#debug` in the page URL shows the debug
//! panel.

use bevy::prelude::*;
use roomview::{ConfigError, ViewerConfig};

/// Launch parameters for the viewer.
#[derive(Resource, Debug, Clone, Default)]
pub struct LaunchParams {
    /// Viewer configuration, after command-line overrides.
    pub config: ViewerConfig,
    /// Show the debug panel.
    pub debug: bool,
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    #[command(about = "Interactive 3D room viewer")]
    struct CliArgs {
        /// JSON configuration file. Missing fields keep their defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scene description path, relative to the asset root.
        #[arg(long)]
        scene: Option<String>,

        /// Asset root: a directory, or an http(s) URL prefix.
        #[arg(long)]
        asset_root: Option<String>,

        /// Show the debug panel.
        #[arg(long)]
        debug: bool,
    }

    pub fn parse() -> Result<LaunchParams, ConfigError> {
        let args = CliArgs::parse();
        let mut config = match &args.config {
            Some(path) => ViewerConfig::from_file(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(scene) = args.scene {
            config.scene = scene;
        }
        if let Some(asset_root) = args.asset_root {
            config.asset_root = asset_root;
        }
        config.validate()?;
        Ok(LaunchParams {
            config,
            debug: args.debug,
        })
    }
}

#[cfg(target_family = "wasm")]
mod wasm {
    use super::*;

    /// Whether the page URL ends in `#debug`.
    fn debug_hash() -> bool {
        web_sys::window()
            .and_then(|w| w.location().hash().ok())
            .is_some_and(|hash| hash == "#debug")
    }

    /// The page origin, used as the asset root when none is configured.
    fn page_origin() -> Option<String> {
        web_sys::window().and_then(|w| w.location().origin().ok())
    }

    pub fn parse() -> Result<LaunchParams, ConfigError> {
        let mut config = ViewerConfig::default();
        if config.asset_root.is_empty() {
            config.asset_root = page_origin().unwrap_or_default();
        }
        Ok(LaunchParams {
            config,
            debug: debug_hash(),
        })
    }
}

/// Parse launch parameters from CLI args (native) or the page (WASM).
pub fn parse() -> Result<LaunchParams, ConfigError> {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        wasm::parse()
    }
}
