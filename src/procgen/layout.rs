//! Grid city layout: blocks of buildings separated by streets.
//!
//! The whole city is centered on the world origin. Blocks are laid out on a
//! regular grid and each block holds `buildings_per_block²` buildings. Heights
//! and footprints are drawn from the caller's random stream in a fixed order
//! (block X, block Y, cell X, cell Z), so a seeded stream replays the same city.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CityError, CityResult};

/// Inclusive `[min, max]` range for random draws.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn validate(&self, what: &str) -> CityResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(CityError::invalid(format!("{what} must be finite")));
        }
        if self.min > self.max {
            return Err(CityError::invalid(format!(
                "{what} min ({}) exceeds max ({})",
                self.min, self.max
            )));
        }
        if !(self.max - self.min).is_finite() {
            return Err(CityError::invalid(format!("{what} span overflows")));
        }
        Ok(())
    }

    /// Draw uniformly from the range; a degenerate range always yields `min`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Tunables for the city grid.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of blocks along X.
    pub blocks_x: u32,
    /// Number of blocks along Z.
    pub blocks_y: u32,
    /// Buildings per block side (a block is N×N buildings).
    pub buildings_per_block: u32,
    /// Distance between building centers inside a block.
    pub building_spacing: f32,
    /// Gap between neighbouring blocks.
    pub street_width: f32,
    pub height_range: ValueRange,
    pub footprint_range: ValueRange,
    /// Remove the previous generation before building a new one.
    pub clear_before_generate: bool,
    /// 0 = different city every run.
    pub seed: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            blocks_x: 15,
            blocks_y: 15,
            buildings_per_block: 3,
            building_spacing: 2.0,
            street_width: 4.0,
            height_range: ValueRange::new(2.0, 8.0),
            footprint_range: ValueRange::new(0.8, 1.8),
            clear_before_generate: true,
            seed: 0,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> CityResult<()> {
        if self.blocks_x == 0 || self.blocks_y == 0 {
            return Err(CityError::invalid("block counts must be positive"));
        }
        if self.buildings_per_block == 0 {
            return Err(CityError::invalid("buildings_per_block must be positive"));
        }
        if !(self.building_spacing.is_finite() && self.building_spacing > 0.0) {
            return Err(CityError::invalid("building_spacing must be positive"));
        }
        if !(self.street_width.is_finite() && self.street_width > 0.0) {
            return Err(CityError::invalid("street_width must be positive"));
        }
        self.height_range.validate("height_range")?;
        self.footprint_range.validate("footprint_range")?;
        Ok(())
    }

    /// Width of one block along either axis.
    pub fn block_extent(&self) -> f32 {
        self.buildings_per_block as f32 * self.building_spacing
    }

    /// Total (width, depth) of the city including inner streets.
    pub fn total_size(&self) -> Vec2 {
        let extent = self.block_extent();
        let span = |blocks: u32| {
            blocks as f32 * extent + blocks.saturating_sub(1) as f32 * self.street_width
        };
        Vec2::new(span(self.blocks_x), span(self.blocks_y))
    }

    /// Center of building (0,0) in block (0,0).
    pub fn origin_offset(&self) -> Vec2 {
        -self.total_size() / 2.0 + Vec2::splat(self.building_spacing / 2.0)
    }

    pub fn building_count(&self) -> usize {
        let per_block = self.buildings_per_block as usize * self.buildings_per_block as usize;
        self.blocks_x as usize * self.blocks_y as usize * per_block
    }
}

/// One box building: where it stands and how big it is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingSpec {
    /// Block indices (bx, by).
    pub block: UVec2,
    /// Position inside the block (ix, iz).
    pub cell: UVec2,
    /// Center of the box; `y` is half the height so the base sits on the ground.
    pub position: Vec3,
    /// (footprint, height, footprint).
    pub scale: Vec3,
}

impl BuildingSpec {
    pub fn height(&self) -> f32 {
        self.scale.y
    }

    pub fn footprint(&self) -> f32 {
        self.scale.x
    }

    pub fn name(&self) -> String {
        format!(
            "B_{}_{}_{}_{}",
            self.block.x, self.block.y, self.cell.x, self.cell.y
        )
    }
}

/// Lay out every building of the city.
pub fn generate_layout(config: &GridConfig, rng: &mut impl Rng) -> CityResult<Vec<BuildingSpec>> {
    config.validate()?;

    let extent = config.block_extent();
    let offset = config.origin_offset();
    let block_pitch = extent + config.street_width;
    let spacing = config.building_spacing;

    let mut specs = Vec::with_capacity(config.building_count());
    for bx in 0..config.blocks_x {
        for by in 0..config.blocks_y {
            let block_origin = Vec2::new(bx as f32 * block_pitch, by as f32 * block_pitch);

            for ix in 0..config.buildings_per_block {
                for iz in 0..config.buildings_per_block {
                    let x = offset.x + block_origin.x + ix as f32 * spacing;
                    let z = offset.y + block_origin.y + iz as f32 * spacing;
                    // Height first, then footprint: seeded replays depend on it.
                    let height = config.height_range.sample(rng);
                    let footprint = config.footprint_range.sample(rng);

                    specs.push(BuildingSpec {
                        block: UVec2::new(bx, by),
                        cell: UVec2::new(ix, iz),
                        position: Vec3::new(x, height / 2.0, z),
                        scale: Vec3::new(footprint, height, footprint),
                    });
                }
            }
        }
    }

    Ok(specs)
}
