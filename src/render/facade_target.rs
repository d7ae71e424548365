//! Re-dress a single object with a freshly synthesized facade.

use bevy::prelude::*;

use crate::error::{CityError, CityResult};
use crate::procgen::random::random_stream;
use crate::render::facade_textures::{facade_material, synthesize, FacadeConfig};

pub struct FacadeTargetPlugin;

impl Plugin for FacadeTargetPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ApplyFacade>()
            .add_systems(Update, apply_facade_on_event);
    }
}

/// Marker for objects that take a facade on request.
#[derive(Component)]
pub struct FacadeTarget;

/// Regenerate a facade and bind it to `target`.
#[derive(Event)]
pub struct ApplyFacade {
    pub target: Entity,
}

/// Synthesize a facade and swap it into `slot`.
///
/// Fails without touching the slot when the facade config is absent or invalid.
pub fn apply_facade(
    facade: Option<&FacadeConfig>,
    slot: Option<&mut MeshMaterial3d<StandardMaterial>>,
    images: &mut Assets<Image>,
    materials: &mut Assets<StandardMaterial>,
) -> CityResult<()> {
    let config = facade.ok_or_else(|| CityError::missing("no facade config assigned"))?;
    let slot = slot.ok_or_else(|| CityError::missing("target has no material to replace"))?;

    let texture = synthesize(config, &mut random_stream(config.seed))?;
    slot.0 = facade_material(&texture, images, materials);
    Ok(())
}

fn apply_facade_on_event(
    mut events: EventReader<ApplyFacade>,
    facade: Option<Res<FacadeConfig>>,
    mut renderables: Query<(Option<&Name>, Option<&mut MeshMaterial3d<StandardMaterial>>)>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for event in events.read() {
        let Ok((name, slot)) = renderables.get_mut(event.target) else {
            warn!("Facade not applied: entity {:?} no longer exists", event.target);
            continue;
        };
        let label = name.map_or_else(|| format!("{:?}", event.target), |n| n.to_string());

        match apply_facade(
            facade.as_deref(),
            slot.map(Mut::into_inner),
            &mut images,
            &mut materials,
        ) {
            Ok(()) => info!("Facade applied to {label}"),
            Err(err) => warn!("Facade not applied to {label}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_leaves_material_alone() {
        let mut images = Assets::<Image>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let original = materials.add(StandardMaterial::default());
        let mut slot = MeshMaterial3d(original.clone());

        let err = apply_facade(None, Some(&mut slot), &mut images, &mut materials).unwrap_err();
        assert!(matches!(err, CityError::MissingDependency(_)));
        assert_eq!(slot.0, original);
    }

    #[test]
    fn missing_renderable_is_reported() {
        let mut images = Assets::<Image>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let config = FacadeConfig::default();

        let err = apply_facade(Some(&config), None, &mut images, &mut materials).unwrap_err();
        assert!(matches!(err, CityError::MissingDependency(_)));
        assert_eq!(images.len(), 0);
    }

    #[test]
    fn applied_material_shares_one_image() {
        let mut images = Assets::<Image>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let mut slot = MeshMaterial3d(materials.add(StandardMaterial::default()));
        let config = FacadeConfig { seed: 21, ..default() };

        apply_facade(Some(&config), Some(&mut slot), &mut images, &mut materials).unwrap();

        let material = materials.get(&slot.0).unwrap();
        assert!(material.base_color_texture.is_some());
        assert_eq!(material.base_color_texture, material.emissive_texture);
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut images = Assets::<Image>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let original = materials.add(StandardMaterial::default());
        let mut slot = MeshMaterial3d(original.clone());
        let config = FacadeConfig { lit_colors: Vec::new(), ..default() };

        let err = apply_facade(Some(&config), Some(&mut slot), &mut images, &mut materials)
            .unwrap_err();
        assert!(matches!(err, CityError::InvalidConfiguration(_)));
        assert_eq!(slot.0, original);
    }
}
