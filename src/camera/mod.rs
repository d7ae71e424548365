//! Orbiting perspective camera that circles the city.
//!
//! The orbit math lives in [`OrbitState`] and knows nothing about entities;
//! the Bevy systems only resolve the target position and write the transform.

use bevy::{
    core_pipeline::{
        bloom::{Bloom, BloomPrefilter},
        tonemapping::Tonemapping,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::error::{CityError, CityResult};
use crate::render::city_spawner::CityRoot;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BloomConfig>()
            .init_resource::<OrbitSettings>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, (orbit_camera, update_bloom_intensity));
    }
}

/// Configuration for bloom effect. Lit windows are emissive, so this is what
/// makes them glow.
#[derive(Resource)]
pub struct BloomConfig {
    pub enabled: bool,
    pub intensity: f32,
    /// Luminance above this glows.
    pub threshold: f32,
    pub threshold_softness: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.3,
            threshold: 0.8,
            threshold_softness: 0.3,
        }
    }
}

/// Orbit tunables, as read from the config file.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    /// Degrees per second.
    pub speed: f32,
    /// Camera height above the target.
    pub height: f32,
    /// Orbit radius.
    pub distance: f32,
    /// Angle at startup, so the first frame is not head-on.
    pub start_angle: f32,
    /// Look-at point is raised by `height * tilt`; 0 looks straight at the target.
    pub tilt: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            speed: 6.0,
            height: 12.0,
            distance: 25.0,
            start_angle: 45.0,
            tilt: 0.2,
        }
    }
}

impl OrbitSettings {
    pub fn validate(&self) -> CityResult<()> {
        let fields = [
            ("speed", self.speed),
            ("height", self.height),
            ("distance", self.distance),
            ("start_angle", self.start_angle),
            ("tilt", self.tilt),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(CityError::invalid(format!("camera {name} must be finite")));
            }
        }
        Ok(())
    }
}

/// Accumulated orbit angle kept as whole turns plus a remainder in `[0, 360)`.
///
/// The remainder never grows, so sin/cos stay accurate however long the
/// camera has been spinning.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitAngle {
    turns: i64,
    remainder: f32,
}

impl OrbitAngle {
    pub fn from_degrees(degrees: f32) -> Self {
        let mut angle = Self::default();
        angle.advance(degrees);
        angle
    }

    pub fn advance(&mut self, delta_degrees: f32) {
        let total = self.remainder as f64 + delta_degrees as f64;
        let wraps = (total / 360.0).floor();
        // `as` saturates, so a huge step pins the turn count instead of overflowing.
        self.turns = self.turns.saturating_add(wraps as i64);
        self.remainder = total.rem_euclid(360.0) as f32;
        if self.remainder >= 360.0 {
            self.remainder -= 360.0;
            self.turns = self.turns.saturating_add(1);
        }
    }

    /// Unbounded accumulated angle.
    pub fn degrees(&self) -> f64 {
        self.turns as f64 * 360.0 + self.remainder as f64
    }

    /// Angle within the current turn.
    pub fn wrapped_degrees(&self) -> f32 {
        self.remainder
    }

    pub fn turns(&self) -> i64 {
        self.turns
    }
}

/// Where the camera sits and what it looks at for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitState {
    pub angle: OrbitAngle,
    pub speed: f32,
    pub height: f32,
    pub distance: f32,
    pub tilt: f32,
}

impl OrbitState {
    pub fn from_settings(settings: &OrbitSettings) -> Self {
        Self {
            angle: OrbitAngle::from_degrees(settings.start_angle),
            speed: settings.speed,
            height: settings.height,
            distance: settings.distance,
            tilt: settings.tilt,
        }
    }

    /// Pose for the current angle without advancing it.
    pub fn pose(&self, target: Vec3) -> OrbitPose {
        let rad = self.angle.wrapped_degrees().to_radians();
        OrbitPose {
            position: target
                + Vec3::new(rad.sin() * self.distance, self.height, rad.cos() * self.distance),
            look_at: target + Vec3::Y * (self.height * self.tilt),
        }
    }

    /// Advance by one frame. Without a target nothing changes.
    pub fn tick(&mut self, target: Option<Vec3>, dt: f32) -> Option<OrbitPose> {
        let target = target?;
        self.angle.advance(self.speed * dt);
        Some(self.pose(target))
    }
}

/// Camera that orbits `target`, or the city root when no target is set.
#[derive(Component)]
pub struct OrbitCamera {
    pub state: OrbitState,
    pub target: Option<Entity>,
}

fn setup_camera(
    mut commands: Commands,
    bloom_config: Res<BloomConfig>,
    settings: Res<OrbitSettings>,
) {
    let state = OrbitState::from_settings(&settings);
    // The city root sits at the origin; place the camera before the first tick.
    let pose = state.pose(Vec3::ZERO);

    commands.spawn((
        Camera3d::default(),
        Camera {
            hdr: true, // Required for bloom
            ..default()
        },
        Transform::from_translation(pose.position).looking_at(pose.look_at, Vec3::Y),
        Bloom {
            intensity: bloom_config.intensity,
            low_frequency_boost: 0.5,
            low_frequency_boost_curvature: 0.7,
            high_pass_frequency: 0.8,
            prefilter: BloomPrefilter {
                threshold: bloom_config.threshold,
                threshold_softness: bloom_config.threshold_softness,
            },
            composite_mode: bevy::core_pipeline::bloom::BloomCompositeMode::Additive,
            ..default()
        },
        Tonemapping::TonyMcMapface,
        OrbitCamera {
            state,
            target: None,
        },
    ));
}

fn orbit_camera(
    time: Res<Time>,
    mut cameras: Query<(&mut Transform, &mut OrbitCamera)>,
    targets: Query<&GlobalTransform>,
    roots: Query<Entity, With<CityRoot>>,
) {
    let dt = time.delta_secs();
    for (mut transform, mut orbit) in &mut cameras {
        let target_entity = orbit.target.or_else(|| roots.iter().next());
        let target = target_entity
            .and_then(|e| targets.get(e).ok())
            .map(GlobalTransform::translation);

        if let Some(pose) = orbit.state.tick(target, dt) {
            *transform = Transform::from_translation(pose.position).looking_at(pose.look_at, Vec3::Y);
        }
    }
}

fn update_bloom_intensity(config: Res<BloomConfig>, mut bloom_query: Query<&mut Bloom>) {
    if !config.is_changed() {
        return;
    }
    let intensity = if config.enabled { config.intensity } else { 0.0 };
    for mut bloom in &mut bloom_query {
        bloom.intensity = intensity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state(speed: f32) -> OrbitState {
        OrbitState::from_settings(&OrbitSettings {
            speed,
            start_angle: 0.0,
            ..default()
        })
    }

    #[test]
    fn tick_advances_angle_and_orbits_target() {
        let mut orbit = state(10.0);
        let target = Vec3::new(3.0, 1.0, -2.0);
        let pose = orbit.tick(Some(target), 1.0).unwrap();

        assert_relative_eq!(orbit.angle.degrees(), 10.0);
        let offset = pose.position - target;
        assert_relative_eq!(Vec2::new(offset.x, offset.z).length(), orbit.distance, epsilon = 1e-4);
        assert_relative_eq!(offset.y, orbit.height);
        assert_relative_eq!(offset.x, orbit.distance * 10f32.to_radians().sin(), epsilon = 1e-4);
    }

    #[test]
    fn look_at_is_raised_by_tilt() {
        let mut orbit = state(10.0);
        let pose = orbit.tick(Some(Vec3::ZERO), 0.5).unwrap();
        assert_relative_eq!(pose.look_at.y, 12.0 * 0.2);

        orbit.tilt = 0.0;
        let pose = orbit.tick(Some(Vec3::ZERO), 0.5).unwrap();
        assert_eq!(pose.look_at, Vec3::ZERO);
    }

    #[test]
    fn no_target_leaves_state_untouched() {
        let mut orbit = state(10.0);
        let before = orbit;
        assert!(orbit.tick(None, 1.0).is_none());
        assert_eq!(orbit, before);
    }

    #[test]
    fn angle_wraps_without_losing_total() {
        let mut angle = OrbitAngle::from_degrees(350.0);
        angle.advance(20.0);
        assert_eq!(angle.turns(), 1);
        assert_relative_eq!(angle.wrapped_degrees(), 10.0, epsilon = 1e-4);
        assert_relative_eq!(angle.degrees(), 370.0, epsilon = 1e-4);

        angle.advance(-30.0);
        assert_eq!(angle.turns(), 0);
        assert_relative_eq!(angle.wrapped_degrees(), 340.0, epsilon = 1e-4);
        assert_relative_eq!(angle.degrees(), 340.0, epsilon = 1e-4);
    }

    #[test]
    fn huge_steps_saturate_turn_count() {
        let mut angle = OrbitAngle::from_degrees(10.0);
        angle.advance(f32::MAX);
        angle.advance(f32::MAX);
        assert_eq!(angle.turns(), i64::MAX);
        assert!((0.0..360.0).contains(&angle.wrapped_degrees()));

        let mut angle = OrbitAngle::default();
        angle.advance(-f32::MAX);
        angle.advance(-f32::MAX);
        assert_eq!(angle.turns(), i64::MIN);
    }

    #[test]
    fn settings_must_be_finite() {
        assert!(OrbitSettings::default().validate().is_ok());
        let cases = [
            OrbitSettings { speed: f32::INFINITY, ..default() },
            OrbitSettings { height: f32::NAN, ..default() },
            OrbitSettings { distance: f32::NEG_INFINITY, ..default() },
            OrbitSettings { start_angle: f32::NAN, ..default() },
            OrbitSettings { tilt: f32::INFINITY, ..default() },
        ];
        for settings in cases {
            assert!(matches!(settings.validate(), Err(CityError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn long_sessions_stay_precise() {
        // A day at 60 fps, 6 deg/s.
        let mut orbit = state(6.0);
        let dt = 1.0 / 60.0;
        for _ in 0..(60 * 60 * 60 * 24) {
            orbit.tick(Some(Vec3::ZERO), dt);
        }
        let remainder = orbit.angle.wrapped_degrees();
        assert!((0.0..360.0).contains(&remainder));

        // Position still sits exactly on the circle.
        let pose = orbit.pose(Vec3::ZERO);
        assert_relative_eq!(Vec2::new(pose.position.x, pose.position.z).length(), 25.0, epsilon = 1e-3);
        // Total drifts only by per-step rounding, not by magnitude loss.
        assert_relative_eq!(orbit.angle.degrees(), 6.0 * 86_400.0, max_relative = 1e-3);
    }
}
