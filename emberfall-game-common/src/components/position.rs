use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World position as it appears on the wire and in storage:
/// `{x, y, z}` floats. Gameplay math converts through `Vec3`.
#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Horizontal distance; combat and aggro ranges ignore height.
    pub fn distance_2d(&self, other: &WorldPosition) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn distance(&self, other: &WorldPosition) -> f32 {
        Vec3::from(*self).distance(Vec3::from(*other))
    }
}

impl From<Vec3> for WorldPosition {
    fn from(value: Vec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }
}

impl From<WorldPosition> for Vec3 {
    fn from(value: WorldPosition) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}
