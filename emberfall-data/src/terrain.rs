use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Uniform heightmap grid. Positions are clamped to the grid bounds
/// and their z snapped to the interpolated surface height; both player
/// movement and monster respawn placement go through `clamp`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Terrain {
    origin: Vec2,
    cell_size: f32,
    width: usize,
    height: usize,
    heights: Vec<f32>,
}

impl Terrain {
    pub fn new(origin: Vec2, cell_size: f32, width: usize, height: usize, heights: Vec<f32>) -> Self {
        assert_eq!(heights.len(), width * height);
        assert!(cell_size > 0.0);
        Self {
            origin,
            cell_size,
            width,
            height,
            heights,
        }
    }

    /// Deserialised grids skip the constructor; reject inconsistent
    /// ones before they can be sampled.
    pub fn validate(&self) -> Result<(), String> {
        if self.cell_size <= 0.0 {
            return Err(format!("cell_size {} must be positive", self.cell_size));
        }
        if self.heights.len() != self.width * self.height {
            return Err(format!(
                "heights has {} samples, expected {}x{}",
                self.heights.len(),
                self.width,
                self.height
            ));
        }
        Ok(())
    }

    pub fn min_corner(&self) -> Vec2 {
        self.origin
    }

    pub fn max_corner(&self) -> Vec2 {
        self.origin
            + Vec2::new(
                (self.width - 1) as f32 * self.cell_size,
                (self.height - 1) as f32 * self.cell_size,
            )
    }

    fn sample(&self, column: usize, row: usize) -> f32 {
        self.heights[row * self.width + column]
    }

    /// Bilinearly interpolated surface height at (x, y), with x/y
    /// clamped into the grid first.
    pub fn height_at(&self, x: f32, y: f32) -> f32 {
        let max = self.max_corner();
        let x = x.clamp(self.origin.x, max.x);
        let y = y.clamp(self.origin.y, max.y);

        if self.width < 2 || self.height < 2 {
            return self.heights.first().copied().unwrap_or(0.0);
        }

        let gx = (x - self.origin.x) / self.cell_size;
        let gy = (y - self.origin.y) / self.cell_size;

        let column = (gx.floor() as usize).min(self.width - 2);
        let row = (gy.floor() as usize).min(self.height - 2);

        let fx = gx - column as f32;
        let fy = gy - row as f32;

        let h00 = self.sample(column, row);
        let h10 = self.sample(column + 1, row);
        let h01 = self.sample(column, row + 1);
        let h11 = self.sample(column + 1, row + 1);

        let bottom = h00 + (h10 - h00) * fx;
        let top = h01 + (h11 - h01) * fx;
        bottom + (top - bottom) * fy
    }

    /// Clamp a world position onto the terrain.
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        let max = self.max_corner();
        let x = position.x.clamp(self.origin.x, max.x);
        let y = position.y.clamp(self.origin.y, max.y);
        Vec3::new(x, y, self.height_at(x, y))
    }
}
