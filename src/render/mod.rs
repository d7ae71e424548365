//! Scene-side rendering: building spawning, facade materials and lighting.

use bevy::prelude::*;

pub mod city_spawner;
pub mod facade_target;
pub mod facade_textures;

use facade_target::FacadeTarget;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(city_spawner::CitySpawnerPlugin)
            .add_plugins(facade_target::FacadeTargetPlugin)
            .insert_resource(ClearColor(Color::srgb(0.01, 0.01, 0.03)))
            .add_systems(Startup, setup_scene);
    }
}

/// Night lighting, a ground plane and a facade preview panel.
fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.6, 0.7, 1.0),
        brightness: 80.0,
    });

    // Moonlight (dim, blue-tinted)
    commands.spawn((
        DirectionalLight {
            illuminance: 800.0,
            color: Color::srgb(0.7, 0.8, 1.0),
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::XYZ,
            -std::f32::consts::FRAC_PI_4,
            std::f32::consts::FRAC_PI_4,
            0.0,
        )),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(400.0, 400.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.05, 0.05, 0.06),
            perceptual_roughness: 0.95,
            ..default()
        })),
        Transform::default(),
        Name::new("Ground"),
    ));

    // Gray until a facade is applied to it (F).
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(4.0, 8.0, 0.2))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.5, 0.5, 0.5),
            ..default()
        })),
        Transform::from_xyz(0.0, 12.0, 0.0),
        FacadeTarget,
        Name::new("Facade Preview"),
    ));
}
