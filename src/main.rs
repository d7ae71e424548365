//! Night City - procedural grid city with glowing window facades.

use bevy::prelude::*;
use clap::Parser;

use night_city::config::{Args, CityConfig, ConfigPlugin};
use night_city::NightCityPlugins;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    // Bad config is reported before any window opens.
    let config = CityConfig::from_args(&args)?;

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Night City".into(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ConfigPlugin { config })
        .add_plugins(NightCityPlugins)
        .run();
    Ok(())
}
