use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of interleaved floats per vertex: `position.xyz`, `normal.xyz`, `uv.xy`.
pub const FLOATS_PER_VERTEX: usize = 8;

/// Indexed triangle list ready to be uploaded to the graphics context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Built-in shapes usable without an asset on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Cube,
    Plane,
}

impl Shape {
    pub fn geometry(self) -> Geometry {
        match self {
            Shape::Cube => Geometry::cube(),
            Shape::Plane => Geometry::plane(),
        }
    }
}

impl Geometry {
    /// Unit cube centred on the origin with per-face normals.
    pub fn cube() -> Self {
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];
        let mut geometry = Self::default();
        for (normal, u, v) in faces {
            geometry.push_quad(normal * 0.5, normal, u * 0.5, v * 0.5);
        }
        geometry
    }

    /// Unit square in the XZ plane facing +Y.
    pub fn plane() -> Self {
        let mut geometry = Self::default();
        geometry.push_quad(Vec3::ZERO, Vec3::Y, Vec3::X * 0.5, Vec3::NEG_Z * 0.5);
        geometry
    }

    fn push_quad(&mut self, center: Vec3, normal: Vec3, half_u: Vec3, half_v: Vec3) {
        let base = self.vertex_count() as u32;
        let corners = [
            (center - half_u - half_v, [0.0, 1.0]),
            (center + half_u - half_v, [1.0, 1.0]),
            (center + half_u + half_v, [1.0, 0.0]),
            (center - half_u + half_v, [0.0, 0.0]),
        ];
        for (position, uv) in corners {
            self.vertices.extend_from_slice(&position.to_array());
            self.vertices.extend_from_slice(&normal.to_array());
            self.vertices.extend_from_slice(&uv);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let start = index * FLOATS_PER_VERTEX;
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let start = index * FLOATS_PER_VERTEX + 3;
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    /// Checks that the buffers can be drawn as an indexed triangle list.
    pub fn validate(&self) -> Result<(), String> {
        if self.vertices.len() % FLOATS_PER_VERTEX != 0 {
            return Err(format!(
                "vertex buffer length {} is not a multiple of {FLOATS_PER_VERTEX}",
                self.vertices.len()
            ));
        }
        if self.indices.is_empty() || self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count {} does not describe a triangle list",
                self.indices.len()
            ));
        }
        let vertex_count = self.vertex_count() as u32;
        if let Some(index) = self.indices.iter().find(|&&index| index >= vertex_count) {
            return Err(format!(
                "index {index} is out of bounds for {vertex_count} vertices"
            ));
        }
        Ok(())
    }
}
