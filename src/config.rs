//! Startup configuration: a TOML file plus command-line overrides.
//!
//! ```toml
//! use_facades = true
//!
//! [grid]
//! blocks_x = 10
//! blocks_y = 10
//! seed = 42
//! height_range = { min = 2.0, max = 12.0 }
//!
//! [facade]
//! lit_colors = ["#ffe699", "#6699ff"]
//! lit_probability = 0.5
//!
//! [camera]
//! speed = 10.0
//! ```
//!
//! Every field is optional; missing ones keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::camera::OrbitSettings;
use crate::error::{CityError, CityResult};
use crate::procgen::layout::GridConfig;
use crate::render::facade_textures::FacadeConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "night_city", about = "Procedural night city with glowing window facades")]
pub struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Layout seed; overrides the file. 0 = random.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Facade seed; overrides the file. 0 = random.
    #[arg(long)]
    pub facade_seed: Option<u64>,

    /// Use plain gray buildings instead of synthesized facades.
    #[arg(long)]
    pub no_facades: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    /// Paint buildings with synthesized facades rather than flat gray.
    pub use_facades: bool,
    pub grid: GridConfig,
    pub facade: FacadeConfig,
    pub camera: OrbitSettings,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            use_facades: true,
            grid: GridConfig::default(),
            facade: FacadeConfig::default(),
            camera: OrbitSettings::default(),
        }
    }
}

impl CityConfig {
    pub fn from_toml(text: &str, path: &Path) -> CityResult<Self> {
        let config: Self = toml::from_str(text).map_err(|source| CityError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CityResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| CityError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// File (if any) with command-line overrides applied.
    pub fn from_args(args: &Args) -> CityResult<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(seed) = args.seed {
            config.grid.seed = seed;
        }
        if let Some(seed) = args.facade_seed {
            config.facade.seed = seed;
        }
        if args.no_facades {
            config.use_facades = false;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CityResult<()> {
        self.grid.validate()?;
        self.camera.validate()?;
        if self.use_facades {
            self.facade.validate()?;
        }
        Ok(())
    }
}

/// Installs the loaded configuration as resources.
pub struct ConfigPlugin {
    pub config: CityConfig,
}

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.grid.clone())
            .insert_resource(self.config.camera.clone());
        if self.config.use_facades {
            app.insert_resource(self.config.facade.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::layout::ValueRange;
    use crate::render::facade_textures::Rgba8;

    #[test]
    fn partial_file_keeps_defaults() {
        let text = r##"
            [grid]
            blocks_x = 4
            seed = 42
            height_range = { min = 1.0, max = 3.0 }

            [facade]
            lit_colors = ["#ff0000", "#00ff0080"]
        "##;
        let config = CityConfig::from_toml(text, Path::new("city.toml")).unwrap();

        assert_eq!(config.grid.blocks_x, 4);
        assert_eq!(config.grid.blocks_y, 15);
        assert_eq!(config.grid.seed, 42);
        assert_eq!(config.grid.height_range, ValueRange::new(1.0, 3.0));
        assert_eq!(
            config.facade.lit_colors,
            vec![Rgba8::new(255, 0, 0, 255), Rgba8::new(0, 255, 0, 128)]
        );
        assert_eq!(config.facade.texture_width, 128);
        assert_eq!(config.camera, OrbitSettings::default());
        assert!(config.use_facades);
    }

    #[test]
    fn empty_palette_is_rejected() {
        let err = CityConfig::from_toml("[facade]\nlit_colors = []", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, CityError::InvalidConfiguration(_)));
    }

    #[test]
    fn infinite_orbit_speed_is_rejected() {
        let err = CityConfig::from_toml("[camera]\nspeed = inf", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, CityError::InvalidConfiguration(_)));
    }

    #[test]
    fn palette_ignored_when_facades_disabled() {
        let text = "use_facades = false\n[facade]\nlit_colors = []";
        assert!(CityConfig::from_toml(text, Path::new("c.toml")).is_ok());
    }

    #[test]
    fn malformed_file_reports_path() {
        let err = CityConfig::from_toml("[grid\nblocks_x = 1", Path::new("broken.toml")).unwrap_err();
        match err {
            CityError::ConfigParse { path, .. } => assert_eq!(path, PathBuf::from("broken.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CityConfig::load(Path::new("/nonexistent/night_city.toml")).unwrap_err();
        assert!(matches!(err, CityError::ConfigFile { .. }));
    }

    #[test]
    fn command_line_overrides_file() {
        let args = Args {
            seed: Some(7),
            facade_seed: Some(9),
            no_facades: true,
            ..Default::default()
        };
        let config = CityConfig::from_args(&args).unwrap();
        assert_eq!(config.grid.seed, 7);
        assert_eq!(config.facade.seed, 9);
        assert!(!config.use_facades);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = toml::to_string(&CityConfig::default()).unwrap();
        let parsed = CityConfig::from_toml(&text, Path::new("c.toml")).unwrap();
        assert_eq!(parsed, CityConfig::default());
    }
}
