use serde::{Deserialize, Serialize};
use tilehop_common::{GRID_SIZE, GridPos};

use crate::rng::SessionRng;

/// Smallest row a hazard can be drawn at. Row 0 is always safe.
pub const HAZARD_MIN: i32 = 1;
/// Largest row a hazard can be drawn at. One past the far edge.
pub const HAZARD_MAX: i32 = GRID_SIZE;

const COLUMNS: usize = GRID_SIZE as usize;

/// What the renderer should put at a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Static floor tile.
    Floor,
    /// Tile that bounces with the shared oscillator.
    Moving,
    /// Nothing drawn: a hole, or a moving tile hidden under an obstacle.
    Hole,
}

/// Per-column hazard layout.
///
/// Each column holds exactly one hole row, one obstacle row and one moving
/// tile row. Rows may coincide across the three arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    holes: [i32; COLUMNS],
    obstacles: [i32; COLUMNS],
    moving_tiles: [i32; COLUMNS],
    obstacle_generation: u64,
}

impl Default for GridState {
    /// An open board: every hazard sits on the row past the far edge.
    fn default() -> Self {
        Self {
            holes: [HAZARD_MAX; COLUMNS],
            obstacles: [HAZARD_MAX; COLUMNS],
            moving_tiles: [HAZARD_MAX; COLUMNS],
            obstacle_generation: 0,
        }
    }
}

impl GridState {
    /// Generate a fresh board: holes, moving tiles and the first obstacle layout.
    pub fn generate(rng: &mut SessionRng) -> Self {
        let mut grid = Self::default();
        grid.regenerate_hazards(rng);
        grid.regenerate_obstacles(rng);
        grid
    }

    /// Build a board from an explicit layout. Rows are clamped into
    /// `[HAZARD_MIN, HAZARD_MAX]`.
    pub fn from_layout(
        holes: [i32; COLUMNS],
        obstacles: [i32; COLUMNS],
        moving_tiles: [i32; COLUMNS],
    ) -> Self {
        let clamp = |rows: [i32; COLUMNS]| rows.map(|r| r.clamp(HAZARD_MIN, HAZARD_MAX));
        Self {
            holes: clamp(holes),
            obstacles: clamp(obstacles),
            moving_tiles: clamp(moving_tiles),
            obstacle_generation: 0,
        }
    }

    /// Redraw holes and moving tiles for every column.
    pub fn regenerate_hazards(&mut self, rng: &mut SessionRng) {
        for col in 0..COLUMNS {
            self.holes[col] = rng.uniform_inclusive(HAZARD_MIN, HAZARD_MAX);
            self.moving_tiles[col] = rng.uniform_inclusive(HAZARD_MIN, HAZARD_MAX);
        }
        tracing::debug!(holes = ?self.holes, moving = ?self.moving_tiles, "hazards generated");
    }

    /// Redraw the obstacle row of every column.
    pub fn regenerate_obstacles(&mut self, rng: &mut SessionRng) {
        for row in self.obstacles.iter_mut() {
            *row = rng.uniform_inclusive(HAZARD_MIN, HAZARD_MAX);
        }
        self.obstacle_generation += 1;
        tracing::debug!(
            generation = self.obstacle_generation,
            obstacles = ?self.obstacles,
            "obstacles regenerated"
        );
    }

    /// True iff `row` is the hole or the obstacle of `col`. Columns off the
    /// board never hold a hazard; rows are compared as-is, so row 10 can match.
    pub fn is_hazard(&self, col: i32, row: i32) -> bool {
        match column(col) {
            Some(c) => self.holes[c] == row || self.obstacles[c] == row,
            None => false,
        }
    }

    pub fn is_hazard_at(&self, pos: GridPos) -> bool {
        self.is_hazard(pos.x, pos.y)
    }

    /// Which tile to draw at `(col, row)`. Obstacles take precedence over a
    /// moving tile on the same row.
    pub fn tile_kind(&self, col: i32, row: i32) -> TileKind {
        let Some(c) = column(col) else {
            return TileKind::Hole;
        };
        let moving = self.moving_tiles[c];
        if row == moving {
            if moving != self.obstacles[c] {
                TileKind::Moving
            } else {
                TileKind::Hole
            }
        } else if row != self.holes[c] {
            TileKind::Floor
        } else {
            TileKind::Hole
        }
    }

    pub fn obstacle_at(&self, col: i32, row: i32) -> bool {
        column(col).is_some_and(|c| self.obstacles[c] == row)
    }

    /// Obstacle row of `col`, if the column exists.
    pub fn obstacle_row(&self, col: i32) -> Option<i32> {
        column(col).map(|c| self.obstacles[c])
    }

    pub fn holes(&self) -> &[i32; COLUMNS] {
        &self.holes
    }

    pub fn obstacles(&self) -> &[i32; COLUMNS] {
        &self.obstacles
    }

    pub fn moving_tiles(&self) -> &[i32; COLUMNS] {
        &self.moving_tiles
    }

    /// How many times obstacles have been drawn so far.
    pub fn obstacle_generation(&self) -> u64 {
        self.obstacle_generation
    }
}

fn column(col: i32) -> Option<usize> {
    if (0..GRID_SIZE).contains(&col) {
        Some(col as usize)
    } else {
        None
    }
}
