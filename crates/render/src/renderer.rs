use glam::{Mat4, Vec3};

use crate::mesh::Mesh;

/// Opaque reference to a mesh uploaded to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u32);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RenderError {
    #[error("unknown mesh handle {0:?}")]
    UnknownMesh(MeshHandle),

    #[error("mesh `{0}` has no vertices")]
    EmptyMesh(String),

    #[error("mesh `{name}` has {positions} positions but {colors} colors")]
    MismatchedColors {
        name: String,
        positions: usize,
        colors: usize,
    },

    #[error("mesh `{name}`: {vertices} vertices is not a whole number of primitives")]
    IncompletePrimitive { name: String, vertices: usize },

    #[error("instance budget of {limit} draws per frame exceeded")]
    InstanceBudgetExceeded { limit: usize },
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A frame is `clear`, `set_view_projection`, any number of `draw`s, then
/// `present`. Renderers never see game state, only meshes and transforms.
pub trait Renderer {
    /// Register a mesh once; draw it by handle afterwards.
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle, RenderError>;

    /// Start a new frame.
    fn clear(&mut self);

    fn set_view_projection(&mut self, view_proj: Mat4);

    /// Queue one instance of `mesh` with the given model transform.
    fn draw(&mut self, mesh: MeshHandle, model: Mat4) -> Result<(), RenderError>;

    /// Finish the frame.
    fn present(&mut self);
}

/// One queued draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub model: Mat4,
}

impl DrawCall {
    pub fn translation(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }
}

/// A finished frame as seen by a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub view_proj: Mat4,
    pub draws: Vec<DrawCall>,
}

impl Default for RecordedFrame {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            draws: Vec::new(),
        }
    }
}

impl RecordedFrame {
    pub fn draws_of(&self, mesh: MeshHandle) -> impl Iterator<Item = &DrawCall> + '_ {
        self.draws.iter().filter(move |d| d.mesh == mesh)
    }

    pub fn count_of(&self, mesh: MeshHandle) -> usize {
        self.draws_of(mesh).count()
    }
}

/// Headless renderer that records every frame instead of drawing it.
///
/// Used by the CLI and by tests to observe exactly what a tick would draw.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    meshes: Vec<Mesh>,
    current: RecordedFrame,
    last: Option<RecordedFrame>,
    frames_presented: u64,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.last.as_ref()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Renderer for RecordingRenderer {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle, RenderError> {
        mesh.validate()?;
        let handle = MeshHandle(self.meshes.len() as u32);
        self.meshes.push(mesh.clone());
        tracing::debug!(name = %mesh.name, ?handle, "mesh recorded");
        Ok(handle)
    }

    fn clear(&mut self) {
        self.current = RecordedFrame::default();
    }

    fn set_view_projection(&mut self, view_proj: Mat4) {
        self.current.view_proj = view_proj;
    }

    fn draw(&mut self, mesh: MeshHandle, model: Mat4) -> Result<(), RenderError> {
        if self.mesh(mesh).is_none() {
            return Err(RenderError::UnknownMesh(mesh));
        }
        self.current.draws.push(DrawCall { mesh, model });
        Ok(())
    }

    fn present(&mut self) {
        self.last = Some(std::mem::take(&mut self.current));
        self.frames_presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PrimitiveKind;

    fn triangle() -> Mesh {
        Mesh::uniform(
            "tri",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [1.0, 1.0, 1.0],
            PrimitiveKind::Triangles,
        )
    }

    #[test]
    fn records_a_frame() {
        let mut r = RecordingRenderer::new();
        let h = r.upload_mesh(&triangle()).unwrap();
        assert_eq!(h, MeshHandle(0));

        r.clear();
        r.set_view_projection(Mat4::from_scale(Vec3::splat(2.0)));
        r.draw(h, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        assert!(r.last_frame().is_none());
        r.present();

        let frame = r.last_frame().unwrap();
        assert_eq!(frame.count_of(h), 1);
        assert_eq!(frame.draws[0].translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(frame.view_proj, Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(r.frames_presented(), 1);
    }

    #[test]
    fn clear_discards_unpresented_draws() {
        let mut r = RecordingRenderer::new();
        let h = r.upload_mesh(&triangle()).unwrap();
        r.clear();
        r.draw(h, Mat4::IDENTITY).unwrap();
        r.clear();
        r.present();
        assert!(r.last_frame().unwrap().draws.is_empty());
    }

    #[test]
    fn unknown_handle_is_an_error() {
        let mut r = RecordingRenderer::new();
        r.clear();
        assert_eq!(
            r.draw(MeshHandle(3), Mat4::IDENTITY),
            Err(RenderError::UnknownMesh(MeshHandle(3)))
        );
    }

    #[test]
    fn invalid_mesh_is_rejected() {
        let mut r = RecordingRenderer::new();
        let empty = Mesh::uniform("empty", Vec::new(), [0.0; 3], PrimitiveKind::Lines);
        assert!(matches!(
            r.upload_mesh(&empty),
            Err(RenderError::EmptyMesh(_))
        ));
        assert_eq!(r.mesh_count(), 0);
    }
}
