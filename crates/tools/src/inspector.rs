use serde::Serialize;
use tilehop_common::{GOAL, GRID_SIZE, GridPos};
use tilehop_kernel::{GameState, PlayerPhase, TileKind};

/// Board inspector for developer tooling.
///
/// Provides read-only queries against a session for debugging and the CLI.
pub struct BoardInspector;

impl BoardInspector {
    /// Produce a summary of the session state.
    pub fn summary(state: &GameState) -> BoardSummary {
        let summary = BoardSummary {
            seed: state.seed(),
            position: state.player().position(),
            score: state.player().score(),
            phase: state.player().phase(),
            obstacle_generation: state.grid().obstacle_generation(),
            pending_events: state.events().len(),
        };
        tracing::debug!(
            seed = summary.seed,
            position = %summary.position,
            score = summary.score,
            "board summary taken"
        );
        summary
    }

    /// Render the board as text, far row first.
    ///
    /// `P` player, `#` obstacle, `G` goal, `~` moving tile, `.` floor,
    /// space for a hole.
    pub fn ascii(state: &GameState) -> String {
        let grid = state.grid();
        let player = state.player().position();
        let mut out = String::with_capacity(((GRID_SIZE + 1) * GRID_SIZE) as usize);
        for row in (0..GRID_SIZE).rev() {
            for col in 0..GRID_SIZE {
                let pos = GridPos::new(col, row);
                let c = if pos == player {
                    'P'
                } else if grid.obstacle_at(col, row) {
                    '#'
                } else if pos == GOAL {
                    'G'
                } else {
                    match grid.tile_kind(col, row) {
                        TileKind::Moving => '~',
                        TileKind::Floor => '.',
                        TileKind::Hole => ' ',
                    }
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}

/// Summary of a session for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    pub seed: u64,
    pub position: GridPos,
    pub score: i64,
    pub phase: PlayerPhase,
    pub obstacle_generation: u64,
    pub pending_events: usize,
}

impl std::fmt::Display for BoardSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Board: seed={} position={} score={} phase={:?} obstacle_generation={} pending_events={}",
            self.seed,
            self.position,
            self.score,
            self.phase,
            self.obstacle_generation,
            self.pending_events
        )
    }
}
