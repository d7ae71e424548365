//! Keyboard triggers for the editor-style commands.
//!
//! - `G`: generate city
//! - `C`: clear city
//! - `F`: apply a fresh facade to every facade target
//! - `B`: toggle bloom

use bevy::prelude::*;

use crate::camera::BloomConfig;
use crate::render::city_spawner::{ClearCity, GenerateCity};
use crate::render::facade_target::{ApplyFacade, FacadeTarget};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (city_commands, toggle_bloom));
    }
}

fn city_commands(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut generate: EventWriter<GenerateCity>,
    mut clear: EventWriter<ClearCity>,
    mut apply: EventWriter<ApplyFacade>,
    targets: Query<Entity, With<FacadeTarget>>,
) {
    if keyboard.just_pressed(KeyCode::KeyG) {
        generate.send(GenerateCity);
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        clear.send(ClearCity);
    }
    if keyboard.just_pressed(KeyCode::KeyF) {
        if targets.is_empty() {
            warn!("No facade target in the scene");
        }
        for target in &targets {
            apply.send(ApplyFacade { target });
        }
    }
}

fn toggle_bloom(keyboard: Res<ButtonInput<KeyCode>>, mut config: ResMut<BloomConfig>) {
    if keyboard.just_pressed(KeyCode::KeyB) {
        config.enabled = !config.enabled;
        info!("Bloom: {}", if config.enabled { "ON" } else { "OFF" });
    }
}
