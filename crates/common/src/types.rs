use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of columns and rows on the board.
pub const GRID_SIZE: i32 = 10;

/// Where the player starts and where a fall sends them back to.
pub const ORIGIN: GridPos = GridPos::new(0, 0);

/// The far corner. Reaching it wins the session.
pub const GOAL: GridPos = GridPos::new(GRID_SIZE - 1, GRID_SIZE - 1);

/// A cell coordinate on the board. May lie outside the grid while a move is
/// being evaluated; use [`GridPos::in_bounds`] before committing it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell `cells` steps away in `dir`.
    pub fn offset(self, dir: Direction, cells: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx * cells,
            y: self.y + dy * cells,
        }
    }

    pub fn in_bounds(self) -> bool {
        (0..GRID_SIZE).contains(&self.x) && (0..GRID_SIZE).contains(&self.y)
    }

    /// True when the cell lies past the low edge on either axis.
    pub fn below_bounds(self) -> bool {
        self.x < 0 || self.y < 0
    }

    /// World-space position of this cell at height `z`.
    pub fn to_vec3(self, z: f32) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, z)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four board directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit step `(dx, dy)` for this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

/// Camera viewpoints. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraMode {
    /// Orbiting view from a fixed tower.
    #[default]
    Tower,
    /// Straight down onto the board.
    Top,
    /// First person from the player cube.
    PlayerView,
    /// Behind and above the player.
    FollowView,
    /// Orbit that can be dragged with the primary pointer button.
    Helicopter,
}

impl CameraMode {
    pub const ALL: [CameraMode; 5] = [
        Self::Tower,
        Self::Top,
        Self::PlayerView,
        Self::FollowView,
        Self::Helicopter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Tower => "tower",
            Self::Top => "top",
            Self::PlayerView => "player",
            Self::FollowView => "follow",
            Self::Helicopter => "helicopter",
        }
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}
