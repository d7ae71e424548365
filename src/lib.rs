//! Night City - a grid of box buildings with procedural window facades.
//!
//! The generation code ([`procgen`], [`render::facade_textures`] and the orbit
//! math in [`camera`]) is plain Rust with explicit random streams. The Bevy
//! plugins wire it into a scene.

use bevy::prelude::*;

pub mod camera;
pub mod config;
pub mod error;
pub mod procgen;
pub mod render;
pub mod ui;

/// Everything except the window and the configuration.
pub struct NightCityPlugins;

impl Plugin for NightCityPlugins {
    fn build(&self, app: &mut App) {
        app.add_plugins(camera::CameraPlugin)
            .add_plugins(render::RenderPlugin)
            .add_plugins(ui::UiPlugin);
    }
}
