use glam::Vec3;

use crate::renderer::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Triangles,
    Lines,
}

impl PrimitiveKind {
    /// Vertices consumed by one primitive.
    pub fn arity(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Lines => 2,
        }
    }
}

/// Vertex data for one drawable shape, one colour per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub primitive: PrimitiveKind,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        colors: Vec<[f32; 3]>,
        primitive: PrimitiveKind,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            colors,
            primitive,
        }
    }

    /// A mesh painted a single colour.
    pub fn uniform(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        color: [f32; 3],
        primitive: PrimitiveKind,
    ) -> Self {
        let colors = vec![color; positions.len()];
        Self::new(name, positions, colors, primitive)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.positions.is_empty() {
            return Err(RenderError::EmptyMesh(self.name.clone()));
        }
        if self.positions.len() != self.colors.len() {
            return Err(RenderError::MismatchedColors {
                name: self.name.clone(),
                positions: self.positions.len(),
                colors: self.colors.len(),
            });
        }
        if self.positions.len() % self.primitive.arity() != 0 {
            return Err(RenderError::IncompletePrimitive {
                name: self.name.clone(),
                vertices: self.positions.len(),
            });
        }
        Ok(())
    }

    /// Unit cube centred on the origin. Drawn at the player's cell, lifted
    /// to sit on the floor.
    pub fn player_cube() -> Self {
        Self::uniform(
            "player",
            cuboid_positions(Vec3::splat(-0.5), Vec3::splat(0.5)),
            [1.0, 1.0, 1.0],
            PrimitiveKind::Triangles,
        )
    }

    /// Black unit cube for the respawning obstacle.
    pub fn obstacle_cube() -> Self {
        Self::uniform(
            "obstacle",
            cuboid_positions(Vec3::splat(-0.5), Vec3::splat(0.5)),
            [0.0, 0.0, 0.0],
            PrimitiveKind::Triangles,
        )
    }

    /// One board tile: a unit-wide column whose top face sits at `z = 0.5`.
    /// Shared by static and moving tiles.
    pub fn floor_tile() -> Self {
        let positions = cuboid_positions(Vec3::new(-0.5, -0.5, -9.5), Vec3::new(0.5, 0.5, 0.5));
        let colors = positions
            .chunks(6)
            .zip(TILE_FACE_COLORS)
            .flat_map(|(face, color)| std::iter::repeat_n(color, face.len()))
            .collect();
        Self::new("tile", positions, colors, PrimitiveKind::Triangles)
    }
}

/// +Z, −Z, +X, −X, +Y, −Y.
const TILE_FACE_COLORS: [[f32; 3]; 6] = [
    [0.583, 0.771, 0.014],
    [0.310, 0.210, 0.120],
    [0.435, 0.602, 0.223],
    [0.359, 0.583, 0.152],
    [0.327, 0.483, 0.844],
    [0.393, 0.621, 0.362],
];

/// Triangle list for an axis-aligned box, six faces of two
/// counter-clockwise triangles each, faces ordered +Z, −Z, +X, −X, +Y, −Y.
pub fn cuboid_positions(min: Vec3, max: Vec3) -> Vec<[f32; 3]> {
    let [x0, y0, z0] = min.to_array();
    let [x1, y1, z1] = max.to_array();
    let faces: [[[f32; 3]; 4]; 6] = [
        [[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]],
        [[x1, y0, z0], [x0, y0, z0], [x0, y1, z0], [x1, y1, z0]],
        [[x1, y0, z1], [x1, y0, z0], [x1, y1, z0], [x1, y1, z1]],
        [[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]],
        [[x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [x0, y1, z0]],
        [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]],
    ];
    faces
        .iter()
        .flat_map(|q| [q[0], q[1], q[2], q[2], q[3], q[0]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_meshes_validate() {
        for mesh in [Mesh::player_cube(), Mesh::obstacle_cube(), Mesh::floor_tile()] {
            mesh.validate().unwrap();
            assert_eq!(mesh.vertex_count(), 36);
        }
    }

    #[test]
    fn tile_top_face_is_flush_with_half_unit() {
        let tile = Mesh::floor_tile();
        let top = tile.positions.iter().map(|p| p[2]).fold(f32::MIN, f32::max);
        let bottom = tile.positions.iter().map(|p| p[2]).fold(f32::MAX, f32::min);
        assert_eq!(top, 0.5);
        assert_eq!(bottom, -9.5);
        assert_eq!(tile.colors[0], TILE_FACE_COLORS[0]);
        assert_eq!(tile.colors[35], TILE_FACE_COLORS[5]);
    }

    #[test]
    fn cuboid_faces_wind_outward() {
        let positions = cuboid_positions(Vec3::splat(-1.0), Vec3::splat(1.0));
        for tri in positions.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(Vec3::from_array);
            let normal = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            assert!(normal.dot(centre) > 0.0, "inward face at {centre}");
        }
    }

    #[test]
    fn validation_errors() {
        let mismatched = Mesh::new(
            "bad",
            vec![[0.0; 3]; 3],
            vec![[0.0; 3]; 2],
            PrimitiveKind::Triangles,
        );
        assert!(matches!(
            mismatched.validate(),
            Err(RenderError::MismatchedColors { positions: 3, colors: 2, .. })
        ));

        let partial = Mesh::uniform("bad", vec![[0.0; 3]; 4], [0.0; 3], PrimitiveKind::Triangles);
        assert!(matches!(
            partial.validate(),
            Err(RenderError::IncompletePrimitive { vertices: 4, .. })
        ));

        let lines = Mesh::uniform("ok", vec![[0.0; 3]; 4], [0.0; 3], PrimitiveKind::Lines);
        assert!(lines.validate().is_ok());
    }
}
