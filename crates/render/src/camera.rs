use glam::{Mat4, Vec2, Vec3};
use tilehop_common::{CameraMode, GridPos};

/// Distance of the orbiting eye from the board origin axis.
const ORBIT_RADIUS: f32 = 10.0;
/// Degrees added or removed per scroll or drag sample.
const ANGLE_STEP: f32 = 1.0;
/// Centre of the board, looked at by the overview modes.
const BOARD_CENTRE: Vec3 = Vec3::new(5.0, 5.0, 0.0);

/// How a mode places the eye.
#[derive(Debug, Clone, Copy)]
enum EyeRule {
    /// `(r·cos θ, −r·sin θ, z)`.
    Orbit { z: f32 },
    Fixed(Vec3),
    /// Player position plus an offset; the player sits at height 0 here.
    FromPlayer(Vec3),
}

/// How a mode places the look-at target.
#[derive(Debug, Clone, Copy)]
enum TargetRule {
    Fixed(Vec3),
    FromPlayer(Vec3),
}

#[derive(Debug, Clone, Copy)]
struct ModeRow {
    mode: CameraMode,
    /// Angle applied when the mode is entered. `None` keeps the current one.
    entry_angle: Option<f32>,
    eye: EyeRule,
    target: TargetRule,
    up: Vec3,
}

/// One row per mode, in `CameraMode` declaration order.
const MODE_TABLE: [ModeRow; 5] = [
    ModeRow {
        mode: CameraMode::Tower,
        entry_angle: Some(120.0),
        eye: EyeRule::Orbit { z: 7.0 },
        target: TargetRule::Fixed(BOARD_CENTRE),
        up: Vec3::Z,
    },
    ModeRow {
        mode: CameraMode::Top,
        entry_angle: Some(60.0),
        eye: EyeRule::Fixed(Vec3::new(5.0, 5.0, 7.0)),
        target: TargetRule::Fixed(BOARD_CENTRE),
        up: Vec3::Y,
    },
    ModeRow {
        mode: CameraMode::PlayerView,
        entry_angle: None,
        eye: EyeRule::FromPlayer(Vec3::new(0.0, 0.0, 3.0)),
        target: TargetRule::FromPlayer(Vec3::new(0.0, 1.0, 3.0)),
        up: Vec3::Z,
    },
    ModeRow {
        mode: CameraMode::FollowView,
        entry_angle: None,
        eye: EyeRule::FromPlayer(Vec3::new(0.0, -3.0, 4.0)),
        target: TargetRule::FromPlayer(Vec3::new(0.0, 0.0, 4.0)),
        up: Vec3::Z,
    },
    ModeRow {
        mode: CameraMode::Helicopter,
        entry_angle: Some(45.0),
        eye: EyeRule::Orbit { z: 7.0 },
        target: TargetRule::Fixed(BOARD_CENTRE),
        up: Vec3::Z,
    },
];

fn row(mode: CameraMode) -> &'static ModeRow {
    &MODE_TABLE[mode as usize]
}

/// Eye, target and up vectors for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl CameraView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 90.0,
            aspect: 1.0,
            near: 1.0,
            far: 500.0,
        }
    }
}

impl Projection {
    /// Track the framebuffer size. Zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }
}

/// Camera mode selection plus the per-frame eye/target/up computation.
///
/// Not part of the game kernel: the camera only reads the player position.
#[derive(Debug, Clone)]
pub struct CameraController {
    mode: CameraMode,
    rotation_degrees: f32,
    zoom_offset: i32,
    pub projection: Projection,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraMode::default())
    }
}

impl CameraController {
    pub fn new(mode: CameraMode) -> Self {
        let mut camera = Self {
            mode,
            rotation_degrees: 0.0,
            zoom_offset: 0,
            projection: Projection::default(),
        };
        camera.set_mode(mode);
        camera
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// True only for the active mode.
    pub fn is_active(&self, mode: CameraMode) -> bool {
        self.mode == mode
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }

    pub fn zoom_offset(&self) -> i32 {
        self.zoom_offset
    }

    /// Switch modes. Replaces the previous mode outright and applies the new
    /// mode's entry angle, if it has one.
    pub fn set_mode(&mut self, mode: CameraMode) {
        let entry = row(mode);
        if let Some(angle) = entry.entry_angle {
            self.rotation_degrees = angle;
        }
        if self.mode != mode {
            tracing::info!(from = %self.mode, to = %mode, "camera mode changed");
        }
        self.mode = mode;
    }

    /// One scroll event: horizontal rotates by a degree, vertical moves the
    /// eye one unit (scrolling up lowers it).
    pub fn on_scroll(&mut self, delta: Vec2) {
        if delta.x > 0.0 {
            self.rotation_degrees += ANGLE_STEP;
        } else if delta.x < 0.0 {
            self.rotation_degrees -= ANGLE_STEP;
        }
        if delta.y > 0.0 {
            self.zoom_offset -= 1;
        } else if delta.y < 0.0 {
            self.zoom_offset += 1;
        }
    }

    /// One pointer drag sample. Only rotates in helicopter mode while the
    /// primary button is held.
    pub fn on_drag(&mut self, dx: f32, primary_held: bool) {
        if self.mode != CameraMode::Helicopter || !primary_held {
            return;
        }
        if dx > 0.0 {
            self.rotation_degrees += ANGLE_STEP;
        } else if dx < 0.0 {
            self.rotation_degrees -= ANGLE_STEP;
        }
    }

    /// Compute this frame's eye, target and up for a player at `player`.
    pub fn resolve(&self, player: GridPos) -> CameraView {
        let entry = row(self.mode);
        let p = player.to_vec3(0.0);
        let mut eye = match entry.eye {
            EyeRule::Orbit { z } => {
                let theta = self.rotation_degrees.to_radians();
                Vec3::new(ORBIT_RADIUS * theta.cos(), -ORBIT_RADIUS * theta.sin(), z)
            }
            EyeRule::Fixed(v) => v,
            EyeRule::FromPlayer(offset) => p + offset,
        };
        eye.z += self.zoom_offset as f32;
        let target = match entry.target {
            TargetRule::Fixed(v) => v,
            TargetRule::FromPlayer(offset) => p + offset,
        };
        CameraView {
            eye,
            target,
            up: entry.up,
        }
    }

    pub fn view_projection(&self, player: GridPos) -> Mat4 {
        self.projection.matrix() * self.resolve(player).view_matrix()
    }
}
