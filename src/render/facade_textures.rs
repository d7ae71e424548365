//! Procedural window facade textures.
//!
//! A facade is a wall-coloured RGBA buffer with a regular grid of square
//! windows painted over it. Each window is lit with a colour from a palette
//! or left dark. The same buffer doubles as the emission map so windows glow
//! with exactly the colour they display.

use bevy::{
    image::{Image, ImageAddressMode, ImageFilterMode, ImageSampler, ImageSamplerDescriptor},
    prelude::*,
    render::{
        render_asset::RenderAssetUsages,
        render_resource::{Extent3d, TextureDimension, TextureFormat},
    },
};
use bytemuck::{Pod, Zeroable};
use noise::{NoiseFn, Perlin};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CityError, CityResult};

/// Noise frequency for per-window brightness variation. Off-lattice so the
/// Perlin sample is not pinned to zero at integer cell coordinates.
const VARIATION_FREQUENCY: f64 = 0.37;

/// One RGBA32 pixel.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from 0..1 channels.
    pub fn srgb(r: f32, g: f32, b: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(r), channel(g), channel(b), 255)
    }

    /// Scale brightness; alpha is kept.
    pub fn scaled(self, factor: f32) -> Self {
        let channel = |v: u8| (v as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b), self.a)
    }

    pub fn to_unit_rgb(self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| c as f32 / 255.0)
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = String;

    /// Accepts `#rrggbb` or `#rrggbbaa`.
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.strip_prefix('#').unwrap_or(&value);
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(format!("expected #rrggbb or #rrggbbaa, got {value:?}"));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("bad colour {value:?}: {e}"))
        };
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, a))
    }
}

impl From<Rgba8> for String {
    fn from(c: Rgba8) -> Self {
        format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
    }
}

/// Tunables for facade synthesis.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    pub texture_width: u32,
    pub texture_height: u32,
    /// Side of a square window in pixels.
    pub window_size: u32,
    /// Wall pixels between neighbouring windows.
    pub window_spacing: u32,
    /// Palette for lit windows. Must not be empty.
    pub lit_colors: Vec<Rgba8>,
    /// Chance that a window is lit (0..=1).
    pub lit_probability: f32,
    /// Brightness jitter of lit windows (0..=0.5). 0 keeps palette colours exact.
    pub color_variation: f32,
    pub off_color: Rgba8,
    pub background_color: Rgba8,
    pub enable_emission: bool,
    pub emission_multiplier: f32,
    /// 0 = new pattern on every synthesis.
    pub seed: u64,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            texture_width: 128,
            texture_height: 256,
            window_size: 20,
            window_spacing: 30,
            lit_colors: vec![
                Rgba8::srgb(1.0, 0.9, 0.6), // warm yellow
                Rgba8::srgb(1.0, 0.8, 0.4), // orange
                Rgba8::srgb(0.4, 0.6, 1.0), // blue
                Rgba8::srgb(1.0, 0.3, 0.3), // red
            ],
            lit_probability: 0.7,
            color_variation: 0.0,
            off_color: Rgba8::srgb(0.02, 0.02, 0.02),
            background_color: Rgba8::srgb(0.02, 0.02, 0.04),
            enable_emission: true,
            emission_multiplier: 1.2,
            seed: 0,
        }
    }
}

impl FacadeConfig {
    pub fn validate(&self) -> CityResult<()> {
        if self.texture_width == 0 || self.texture_height == 0 {
            return Err(CityError::invalid("texture dimensions must be positive"));
        }
        if self.window_size == 0 {
            return Err(CityError::invalid("window_size must be positive"));
        }
        if self.window_size.checked_add(self.window_spacing).is_none() {
            return Err(CityError::invalid("window_size + window_spacing overflows"));
        }
        if self.lit_colors.is_empty() {
            return Err(CityError::invalid("lit_colors must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.lit_probability) {
            return Err(CityError::invalid(format!(
                "lit_probability {} outside 0..=1",
                self.lit_probability
            )));
        }
        if !(0.0..=0.5).contains(&self.color_variation) {
            return Err(CityError::invalid(format!(
                "color_variation {} outside 0..=0.5",
                self.color_variation
            )));
        }
        if !(self.emission_multiplier.is_finite() && self.emission_multiplier >= 0.0) {
            return Err(CityError::invalid("emission_multiplier must be non-negative"));
        }
        Ok(())
    }

    /// Distance between the top-left corners of neighbouring windows.
    pub fn window_pitch(&self) -> u32 {
        self.window_size.saturating_add(self.window_spacing)
    }
}

/// Row-major RGBA32 image owned by whoever asked for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl PixelBuffer {
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    /// Paint a rectangle; anything past the right or bottom edge is dropped.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba8) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for py in y.min(y_end)..y_end {
            let row = self.index(0, py);
            self.pixels[row + x.min(x_end) as usize..row + x_end as usize].fill(color);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// A painted window, in the order it was drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowCell {
    /// Top-left pixel, before clipping.
    pub origin: UVec2,
    pub lit: bool,
    pub color: Rgba8,
}

/// Result of one synthesis call.
#[derive(Clone, Debug)]
pub struct FacadeTexture {
    albedo: PixelBuffer,
    cells: Vec<WindowCell>,
    emission_multiplier: Option<f32>,
    window_size: u32,
}

/// Self-illumination map. Borrows the albedo buffer instead of copying it.
#[derive(Clone, Copy, Debug)]
pub struct EmissionView<'a> {
    buffer: &'a PixelBuffer,
    multiplier: f32,
}

impl<'a> EmissionView<'a> {
    pub fn buffer(&self) -> &'a PixelBuffer {
        self.buffer
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Emitted RGB at a pixel.
    pub fn radiance(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        let rgb = self.buffer.get(x, y)?.to_unit_rgb();
        Some(rgb.map(|c| c * self.multiplier))
    }
}

impl FacadeTexture {
    pub fn albedo(&self) -> &PixelBuffer {
        &self.albedo
    }

    pub fn cells(&self) -> &[WindowCell] {
        &self.cells
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn emission(&self) -> Option<EmissionView<'_>> {
        self.emission_multiplier.map(|multiplier| EmissionView {
            buffer: &self.albedo,
            multiplier,
        })
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.albedo
    }

    /// GPU-ready image: sRGB, point filtered and tiling.
    pub fn to_image(&self) -> Image {
        let mut image = Image::new(
            Extent3d {
                width: self.albedo.width(),
                height: self.albedo.height(),
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.albedo.as_bytes().to_vec(),
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::RENDER_WORLD,
        );
        image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
            address_mode_u: ImageAddressMode::Repeat,
            address_mode_v: ImageAddressMode::Repeat,
            mag_filter: ImageFilterMode::Nearest,
            min_filter: ImageFilterMode::Nearest,
            ..default()
        });
        image
    }
}

/// Paint a facade.
///
/// Windows are visited row by row (y outer, x inner). Each one takes a draw
/// for the lit decision and, when lit, a second draw for the palette index.
/// An unseeded facade with colour variation takes one extra draw up front
/// for the noise seed.
pub fn synthesize(config: &FacadeConfig, rng: &mut impl Rng) -> CityResult<FacadeTexture> {
    config.validate()?;

    let mut albedo = PixelBuffer::filled(
        config.texture_width,
        config.texture_height,
        config.background_color,
    );
    let pitch = config.window_pitch() as usize;
    let variation = (config.color_variation > 0.0).then(|| {
        let noise_seed = match config.seed {
            0 => rng.gen::<u32>(),
            seed => seed as u32,
        };
        Perlin::new(noise_seed)
    });
    let mut cells = Vec::new();

    for (row, y) in (0..config.texture_height).step_by(pitch).enumerate() {
        for (col, x) in (0..config.texture_width).step_by(pitch).enumerate() {
            let lit = rng.gen::<f32>() < config.lit_probability;
            let color = if lit {
                let base = config.lit_colors[rng.gen_range(0..config.lit_colors.len())];
                match &variation {
                    Some(perlin) => {
                        let n = perlin.get([
                            (col as f64 + 0.5) * VARIATION_FREQUENCY,
                            (row as f64 + 0.5) * VARIATION_FREQUENCY,
                        ]) as f32;
                        base.scaled(1.0 + config.color_variation * n)
                    }
                    None => base,
                }
            } else {
                config.off_color
            };

            albedo.fill_rect(x, y, config.window_size, config.window_size, color);
            cells.push(WindowCell {
                origin: UVec2::new(x, y),
                lit,
                color,
            });
        }
    }

    Ok(FacadeTexture {
        albedo,
        cells,
        emission_multiplier: config.enable_emission.then_some(config.emission_multiplier),
        window_size: config.window_size,
    })
}

/// Upload a facade and wrap it in a material. Base colour and emission share
/// one image handle.
pub fn facade_material(
    texture: &FacadeTexture,
    images: &mut Assets<Image>,
    materials: &mut Assets<StandardMaterial>,
) -> Handle<StandardMaterial> {
    let image = images.add(texture.to_image());
    let mut material = StandardMaterial {
        base_color_texture: Some(image.clone()),
        perceptual_roughness: 0.85,
        ..default()
    };

    if let Some(emission) = texture.emission() {
        let m = emission.multiplier();
        material.emissive = LinearRgba::rgb(m, m, m);
        material.emissive_texture = Some(image);
    }

    materials.add(material)
}

/// Plain gray material used when no facade is configured.
pub fn fallback_material(materials: &mut Assets<StandardMaterial>) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: Color::srgb(0.5, 0.5, 0.5),
        perceptual_roughness: 0.9,
        ..default()
    })
}
