use bevy::math::Vec2;
use bevy_ecs::resource::Resource;
use log::debug;
use noiz::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{OUT_OF_BOUNDS_HEIGHT, TERRAIN_RESOLUTION, WORLD_SIZE};
use crate::error::WorldBuildError;

/// Seed offset for the peak factor noise layer
pub const PEAK_SEED_OFFSET: u32 = 1;
/// Seed offset for the surface detail noise layer
pub const DETAIL_SEED_OFFSET: u32 = 2;

/// Parameters for seabed synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Side length of the (square) world, centered on the origin
    pub size: f32,
    /// Number of vertices along each side of the grid
    pub resolution: usize,
    /// Frequency of the rolling base layer (lower = wider features)
    pub base_frequency: f32,
    /// Amplitude of the base layer before the peak factor is applied
    pub base_amplitude: f32,
    /// Frequency of the layer that decides where peaks get amplified
    pub peak_frequency: f32,
    /// Frequency of the surface detail layer
    pub detail_frequency: f32,
    /// Amplitude of the surface detail layer
    pub detail_amplitude: f32,
    /// Height of the radial bump at the origin
    pub bump_amplitude: f32,
    /// Falloff factor `k` of the bump, `A·exp(-((x·k)²+(z·k)²))`
    pub bump_falloff: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            size: WORLD_SIZE,
            resolution: TERRAIN_RESOLUTION,
            base_frequency: 0.01,
            base_amplitude: 4.0,
            peak_frequency: 0.004,
            detail_frequency: 0.15,
            detail_amplitude: 0.5,
            bump_amplitude: 30.0,
            bump_falloff: 0.01,
        }
    }
}

impl TerrainParams {
    /// Largest absolute contribution the noise layers can add to a sample.
    pub fn noise_bound(&self) -> f32 {
        self.base_amplitude.abs() * 2.5 + self.detail_amplitude.abs()
    }

    /// Height of the radial bump term alone.
    #[inline]
    pub fn bump(&self, x: f32, z: f32) -> f32 {
        let kx = x * self.bump_falloff;
        let kz = z * self.bump_falloff;
        self.bump_amplitude * (-(kx * kx + kz * kz)).exp()
    }

    pub fn validate(&self) -> Result<(), WorldBuildError> {
        if self.resolution < 2 {
            return Err(WorldBuildError::TerrainResolution(self.resolution));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(WorldBuildError::TerrainSize(self.size));
        }
        Ok(())
    }
}

/// The three noise layers used by the seabed, each seeded with its own offset.
#[derive(Clone)]
pub struct SeabedNoises {
    base: Noise<common_noise::Perlin>,
    peak: Noise<common_noise::Perlin>,
    detail: Noise<common_noise::Perlin>,
}

impl SeabedNoises {
    pub fn new(seed: u32) -> Self {
        let mut base = Noise::<common_noise::Perlin>::default();
        base.set_seed(seed);

        let mut peak = Noise::<common_noise::Perlin>::default();
        peak.set_seed(seed.wrapping_add(PEAK_SEED_OFFSET));

        let mut detail = Noise::<common_noise::Perlin>::default();
        detail.set_seed(seed.wrapping_add(DETAIL_SEED_OFFSET));

        Self { base, peak, detail }
    }
}

#[inline]
fn sample(noise: &Noise<common_noise::Perlin>, x: f32, z: f32, frequency: f32) -> f32 {
    noise
        .sample_for::<f32>(Vec2::new(x * frequency, z * frequency))
        .clamp(-1.0, 1.0)
}

/// Height of the synthesized seabed at world coordinates `(x, z)`.
pub fn seabed_height(x: f32, z: f32, noises: &SeabedNoises, params: &TerrainParams) -> f32 {
    let peak_factor = (sample(&noises.peak, x, z, params.peak_frequency) + 1.0) / 2.0;
    let rolling = sample(&noises.base, x, z, params.base_frequency)
        * params.base_amplitude
        * (0.5 + 2.0 * peak_factor);
    let detail = sample(&noises.detail, x, z, params.detail_frequency) * params.detail_amplitude;

    rolling + detail + params.bump(x, z)
}

/// Square height field centered on the origin.
///
/// Heights are stored row-major (`z` selects the row, `x` the column) and never
/// change after construction.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct TerrainField {
    size: f32,
    resolution: usize,
    heights: Vec<f32>,
}

impl TerrainField {
    /// Synthesizes the seabed. The same seed and parameters always give the same grid.
    pub fn build(seed: u32, params: &TerrainParams) -> Result<Self, WorldBuildError> {
        params.validate()?;

        let noises = SeabedNoises::new(seed);
        let n = params.resolution;
        let spacing = params.size / (n - 1) as f32;
        let half = params.size / 2.0;

        let mut heights = Vec::with_capacity(n * n);
        for row in 0..n {
            let z = -half + row as f32 * spacing;
            for col in 0..n {
                let x = -half + col as f32 * spacing;
                heights.push(seabed_height(x, z, &noises, params));
            }
        }

        let field = Self {
            size: params.size,
            resolution: n,
            heights,
        };
        let (min, max) = field.height_range();
        debug!(
            "Built {}x{} terrain over {} units, heights {:.2}..{:.2}",
            n, n, params.size, min, max
        );
        Ok(field)
    }

    /// Wraps an existing row-major grid.
    pub fn from_heights(
        size: f32,
        resolution: usize,
        heights: Vec<f32>,
    ) -> Result<Self, WorldBuildError> {
        TerrainParams {
            size,
            resolution,
            ..Default::default()
        }
        .validate()?;

        let expected = resolution * resolution;
        if heights.len() != expected {
            return Err(WorldBuildError::TerrainGrid {
                expected,
                actual: heights.len(),
            });
        }
        Ok(Self {
            size,
            resolution,
            heights,
        })
    }

    /// A level seabed, mostly useful for tests and tooling.
    pub fn flat(size: f32, resolution: usize, height: f32) -> Result<Self, WorldBuildError> {
        Self::from_heights(size, resolution, vec![height; resolution * resolution])
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Distance between two neighboring vertices.
    pub fn spacing(&self) -> f32 {
        self.size / (self.resolution - 1) as f32
    }

    /// Raw row-major grid, for mesh construction.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Grid sample at column `col`, row `row`.
    pub fn sample(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.resolution || row >= self.resolution {
            return None;
        }
        Some(self.heights[row * self.resolution + col])
    }

    /// World position of the vertex at column `col`, row `row`.
    pub fn vertex_position(&self, col: usize, row: usize) -> Vec2 {
        let half = self.size / 2.0;
        let spacing = self.spacing();
        Vec2::new(-half + col as f32 * spacing, -half + row as f32 * spacing)
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        let half = self.size / 2.0;
        (-half..=half).contains(&x) && (-half..=half).contains(&z)
    }

    /// Bilinear height at `(x, z)`, or `None` outside the grid.
    pub fn try_height(&self, x: f32, z: f32) -> Option<f32> {
        if !self.contains(x, z) {
            return None;
        }

        let half = self.size / 2.0;
        let spacing = self.spacing();
        let last_cell = self.resolution - 2;

        let fx = (x + half) / spacing;
        let fz = (z + half) / spacing;
        let col = (fx.floor() as usize).min(last_cell);
        let row = (fz.floor() as usize).min(last_cell);
        let tx = fx - col as f32;
        let tz = fz - row as f32;

        let n = self.resolution;
        let h00 = self.heights[row * n + col];
        let h10 = self.heights[row * n + col + 1];
        let h01 = self.heights[(row + 1) * n + col];
        let h11 = self.heights[(row + 1) * n + col + 1];

        let near = h00 + (h10 - h00) * tx;
        let far = h01 + (h11 - h01) * tx;
        Some(near + (far - near) * tz)
    }

    /// Bilinear height at `(x, z)`. Outside the grid this is
    /// [`OUT_OF_BOUNDS_HEIGHT`], which means "no ground" rather than a real height.
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.try_height(x, z).unwrap_or(OUT_OF_BOUNDS_HEIGHT)
    }

    /// Largest height change when stepping `step` units along +x or +z.
    pub fn slope(&self, x: f32, z: f32, step: f32) -> f32 {
        let h = self.height(x, z);
        let dx = (self.height(x + step, z) - h).abs();
        let dz = (self.height(x, z + step) - h).abs();
        dx.max(dz)
    }

    pub fn height_range(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &h| {
                (min.min(h), max.max(h))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(size: f32, resolution: usize) -> TerrainField {
        // height = col + 10 * row
        let heights = (0..resolution * resolution)
            .map(|i| (i % resolution) as f32 + 10.0 * (i / resolution) as f32)
            .collect();
        TerrainField::from_heights(size, resolution, heights).unwrap()
    }

    #[test]
    fn build_is_deterministic() {
        let params = TerrainParams {
            resolution: 64,
            ..Default::default()
        };
        let a = TerrainField::build(42, &params).unwrap();
        let b = TerrainField::build(42, &params).unwrap();
        assert_eq!(a.heights(), b.heights());
    }

    #[test]
    fn build_rejects_degenerate_grid() {
        let params = TerrainParams {
            resolution: 1,
            ..Default::default()
        };
        assert!(matches!(
            TerrainField::build(1, &params),
            Err(WorldBuildError::TerrainResolution(1))
        ));
    }

    #[test]
    fn query_on_vertices_returns_samples() {
        let field = ramp(4.0, 5);
        for row in 0..5 {
            for col in 0..5 {
                let p = field.vertex_position(col, row);
                let expected = field.sample(col, row).unwrap();
                assert!((field.height(p.x, p.y) - expected).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn query_interpolates_between_four_samples() {
        let field = ramp(4.0, 5);
        // Cell (1,2) spans x in [-1, 0], z in [0, 1]
        let (x, z) = (-0.75, 0.4);
        let tx = 0.25;
        let tz = 0.4;
        let h00 = field.sample(1, 2).unwrap();
        let h10 = field.sample(2, 2).unwrap();
        let h01 = field.sample(1, 3).unwrap();
        let h11 = field.sample(2, 3).unwrap();
        let expected = h00 * (1.0 - tx) * (1.0 - tz)
            + h10 * tx * (1.0 - tz)
            + h01 * (1.0 - tx) * tz
            + h11 * tx * tz;
        assert!((field.height(x, z) - expected).abs() < 1e-4);
    }

    #[test]
    fn query_on_far_edge_stays_in_grid() {
        let field = ramp(4.0, 5);
        assert!((field.height(2.0, 2.0) - field.sample(4, 4).unwrap()).abs() < 1e-4);
    }

    #[test]
    fn query_outside_returns_sentinel() {
        let field = TerrainField::flat(10.0, 11, 7.0).unwrap();
        assert_eq!(field.height(5.01, 0.0), OUT_OF_BOUNDS_HEIGHT);
        assert_eq!(field.height(0.0, -5.5), OUT_OF_BOUNDS_HEIGHT);
        assert_eq!(field.height(1e6, 1e6), OUT_OF_BOUNDS_HEIGHT);
        assert!(field.try_height(-6.0, 0.0).is_none());
        assert_eq!(field.height(5.0, -5.0), 7.0);
    }

    #[test]
    fn from_heights_checks_length() {
        assert!(matches!(
            TerrainField::from_heights(10.0, 3, vec![0.0; 8]),
            Err(WorldBuildError::TerrainGrid {
                expected: 9,
                actual: 8
            })
        ));
    }

    #[test]
    fn slope_on_ramp() {
        let field = ramp(4.0, 5);
        // spacing 1: +x adds 1, +z adds 10
        assert!((field.slope(-1.0, -1.0, 1.0) - 10.0).abs() < 1e-4);
        assert_eq!(TerrainField::flat(10.0, 11, 3.0).unwrap().slope(0.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn radial_bump_raises_center() {
        let params = TerrainParams {
            size: 500.0,
            resolution: 200,
            ..Default::default()
        };
        let field = TerrainField::build(7, &params).unwrap();
        let center = field.height(0.0, 0.0);
        let tolerance = 2.0 * params.noise_bound() + 0.05 * params.bump_amplitude;

        for (x, z) in [(200.0, 0.0), (-200.0, 0.0), (0.0, 200.0), (0.0, -200.0)] {
            let far = field.height(x, z);
            assert!(
                center - far >= params.bump_amplitude - tolerance,
                "center {center} vs far {far} at ({x}, {z})"
            );
        }
    }

    #[test]
    fn noise_stays_within_bound() {
        let params = TerrainParams {
            resolution: 50,
            bump_amplitude: 0.0,
            ..Default::default()
        };
        let field = TerrainField::build(3, &params).unwrap();
        let (min, max) = field.height_range();
        assert!(min >= -params.noise_bound() - 1e-4);
        assert!(max <= params.noise_bound() + 1e-4);
    }
}
