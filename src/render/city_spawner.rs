//! Turns a city layout into scene entities and tracks which ones it owns.
//!
//! [`CityGenerator`] only talks to an [`InstanceRegistry`]. The scene
//! implementation spawns buildings as children of the [`CityRoot`] entity;
//! tests swap in a registry that just records calls.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{CityError, CityResult};
use crate::procgen::layout::{generate_layout, BuildingSpec, GridConfig};
use crate::procgen::random::random_stream;
use crate::render::facade_textures::{
    facade_material, fallback_material, synthesize, FacadeConfig,
};

pub struct CitySpawnerPlugin;

impl Plugin for CitySpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GridConfig>()
            .init_resource::<SpawnedCity>()
            .add_event::<GenerateCity>()
            .add_event::<ClearCity>()
            .add_systems(Startup, (spawn_city_root, trigger_initial_generation).chain())
            .add_systems(Update, (clear_city_on_event, generate_city_on_event).chain());
    }
}

/// Event to (re)build the city from the current [`GridConfig`].
#[derive(Event)]
pub struct GenerateCity;

/// Event to remove every building the last generation created.
#[derive(Event)]
pub struct ClearCity;

/// Parent of all generated buildings. The orbit camera circles it.
#[derive(Component)]
pub struct CityRoot;

#[derive(Component)]
pub struct Building {
    pub block: UVec2,
    pub cell: UVec2,
}

/// Creates and destroys one renderable per building.
pub trait InstanceRegistry {
    type Handle;

    fn create(&mut self, spec: &BuildingSpec) -> CityResult<Self::Handle>;

    fn destroy(&mut self, handle: Self::Handle);
}

/// Owns the instances of the most recent generation until they are cleared.
#[derive(Debug)]
pub struct CityGenerator<H> {
    owned: Vec<H>,
}

impl<H> Default for CityGenerator<H> {
    fn default() -> Self {
        Self { owned: Vec::new() }
    }
}

impl<H> CityGenerator<H> {
    pub fn owned(&self) -> &[H] {
        &self.owned
    }

    /// Lay out the city and create one instance per building.
    ///
    /// The new city is fully created before the previous one is cleared, so a
    /// failure leaves the previous generation in place. If the registry fails
    /// midway, the instances created by this call are destroyed again and the
    /// error is returned.
    pub fn generate<R>(
        &mut self,
        config: &GridConfig,
        rng: &mut impl Rng,
        registry: &mut R,
    ) -> CityResult<usize>
    where
        R: InstanceRegistry<Handle = H>,
    {
        let specs = generate_layout(config, rng)?;

        let mut created = Vec::with_capacity(specs.len());
        for spec in &specs {
            match registry.create(spec) {
                Ok(handle) => created.push(handle),
                Err(err) => {
                    for handle in created.into_iter().rev() {
                        registry.destroy(handle);
                    }
                    return Err(err);
                }
            }
        }

        if config.clear_before_generate {
            self.clear(registry);
        }
        self.owned.extend(created);
        Ok(specs.len())
    }

    /// Destroy every instance this generator created. Returns how many.
    pub fn clear<R>(&mut self, registry: &mut R) -> usize
    where
        R: InstanceRegistry<Handle = H>,
    {
        let count = self.owned.len();
        for handle in self.owned.drain(..).rev() {
            registry.destroy(handle);
        }
        count
    }
}

/// The generator driving the live scene.
#[derive(Resource, Default)]
pub struct SpawnedCity(pub CityGenerator<Entity>);

/// Mesh to build with instead of the unit cube. Scaled per building, so it
/// should span `-0.5..0.5` on every axis.
#[derive(Resource, Clone)]
pub struct BuildingMesh(pub Handle<Mesh>);

/// The override mesh if one is set, otherwise a fresh unit cube.
pub fn building_mesh(custom: Option<&BuildingMesh>, meshes: &mut Assets<Mesh>) -> Handle<Mesh> {
    match custom {
        Some(BuildingMesh(handle)) => handle.clone(),
        None => meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
    }
}

/// Which material a new building gets.
enum BuildingMaterial<'a> {
    /// One material for every building (seeded facade or gray fallback).
    Shared(Handle<StandardMaterial>),
    /// Fresh facade per building, drawn from a continuing stream.
    PerBuilding {
        config: &'a FacadeConfig,
        rng: StdRng,
        images: &'a mut Assets<Image>,
        materials: &'a mut Assets<StandardMaterial>,
    },
}

struct BuildingAssets<'a> {
    mesh: Handle<Mesh>,
    material: BuildingMaterial<'a>,
}

/// Scene-backed registry: buildings become children of the city root.
pub struct SceneRegistry<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    root: Entity,
    assets: Option<BuildingAssets<'a>>,
}

impl<'a, 'w, 's> SceneRegistry<'a, 'w, 's> {
    /// Registry that can only destroy.
    pub fn new(commands: &'a mut Commands<'w, 's>, root: Entity) -> Self {
        Self {
            commands,
            root,
            assets: None,
        }
    }

    fn with_assets(mut self, assets: BuildingAssets<'a>) -> Self {
        self.assets = Some(assets);
        self
    }
}

impl InstanceRegistry for SceneRegistry<'_, '_, '_> {
    type Handle = Entity;

    fn create(&mut self, spec: &BuildingSpec) -> CityResult<Entity> {
        let assets = self
            .assets
            .as_mut()
            .ok_or_else(|| CityError::missing("no building mesh or material to spawn with"))?;

        let material = match &mut assets.material {
            BuildingMaterial::Shared(handle) => handle.clone(),
            BuildingMaterial::PerBuilding {
                config,
                rng,
                images,
                materials,
            } => {
                let texture = synthesize(config, rng)?;
                facade_material(&texture, images, materials)
            }
        };

        let entity = self
            .commands
            .spawn((
                Mesh3d(assets.mesh.clone()),
                MeshMaterial3d(material),
                Transform::from_translation(spec.position).with_scale(spec.scale),
                Building {
                    block: spec.block,
                    cell: spec.cell,
                },
                Name::new(spec.name()),
            ))
            .set_parent(self.root)
            .id();
        Ok(entity)
    }

    fn destroy(&mut self, handle: Entity) {
        self.commands.entity(handle).despawn_recursive();
    }
}

fn spawn_city_root(mut commands: Commands) {
    commands.spawn((
        CityRoot,
        Name::new("City"),
        Transform::default(),
        Visibility::default(),
    ));
}

fn trigger_initial_generation(mut events: EventWriter<GenerateCity>) {
    events.send(GenerateCity);
}

#[allow(clippy::too_many_arguments)]
fn generate_city_on_event(
    mut events: EventReader<GenerateCity>,
    mut commands: Commands,
    roots: Query<Entity, With<CityRoot>>,
    grid: Res<GridConfig>,
    facade: Option<Res<FacadeConfig>>,
    custom_mesh: Option<Res<BuildingMesh>>,
    mut city: ResMut<SpawnedCity>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    for _ in events.read() {
        let Ok(root) = roots.get_single() else {
            error!("City generation skipped: {}", CityError::missing("no CityRoot entity"));
            continue;
        };
        if let Err(err) = grid.validate() {
            error!("City generation skipped: {err}");
            continue;
        }
        if let Some(Err(err)) = facade.as_deref().map(FacadeConfig::validate) {
            error!("City generation skipped: {err}");
            continue;
        }

        info!(
            "Generating city: {}x{} blocks, {} buildings per block side...",
            grid.blocks_x, grid.blocks_y, grid.buildings_per_block
        );

        let material = match facade.as_deref() {
            Some(config) if config.seed != 0 => {
                // A seeded facade is identical for every building; build it once.
                match synthesize(config, &mut random_stream(config.seed)) {
                    Ok(texture) => BuildingMaterial::Shared(facade_material(
                        &texture,
                        &mut images,
                        &mut materials,
                    )),
                    Err(err) => {
                        error!("City generation skipped: {err}");
                        continue;
                    }
                }
            }
            Some(config) => BuildingMaterial::PerBuilding {
                config,
                rng: random_stream(0),
                images: &mut *images,
                materials: &mut *materials,
            },
            None => BuildingMaterial::Shared(fallback_material(&mut materials)),
        };

        let assets = BuildingAssets {
            mesh: building_mesh(custom_mesh.as_deref(), &mut meshes),
            material,
        };
        let mut registry = SceneRegistry::new(&mut commands, root).with_assets(assets);
        let mut rng = random_stream(grid.seed);

        match city.0.generate(&grid, &mut rng, &mut registry) {
            Ok(count) => info!(
                "City generated: {}x{} blocks, {} buildings.",
                grid.blocks_x, grid.blocks_y, count
            ),
            Err(err) => error!("City generation failed: {err}"),
        }
    }
}

fn clear_city_on_event(
    mut events: EventReader<ClearCity>,
    mut commands: Commands,
    roots: Query<Entity, With<CityRoot>>,
    mut city: ResMut<SpawnedCity>,
) {
    for _ in events.read() {
        let Ok(root) = roots.get_single() else {
            warn!("Clear skipped: {}", CityError::missing("no CityRoot entity"));
            continue;
        };
        let removed = city.0.clear(&mut SceneRegistry::new(&mut commands, root));
        info!("City cleared: {removed} buildings removed");
    }
}
