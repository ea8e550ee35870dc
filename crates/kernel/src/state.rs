use serde::{Deserialize, Serialize};
use tilehop_common::{Direction, GridPos};

use crate::animator::MovingTileAnimator;
use crate::grid::GridState;
use crate::player::{MoveOutcome, PlayerState};
use crate::rng::SessionRng;

/// An event record produced by every state transition.
///
/// The log is append-only; hosts drain it for logging and inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Holes and moving tiles were drawn for the session.
    HazardsGenerated { seed: u64 },
    /// A new obstacle layout replaced the previous one.
    ObstaclesRespawned { generation: u64 },
    Stepped { from: GridPos, to: GridPos },
    Jumped { from: GridPos, to: GridPos },
    /// The player fell at `at`; `score` is the score after the penalty.
    Fell { at: GridPos, score: i64 },
    Won { score: i64 },
    /// A direction was released but led nowhere.
    MoveIgnored { from: GridPos, direction: Direction },
}

/// The authoritative state of one session.
///
/// Owns the board, the player, the moving-tile oscillator and the session
/// RNG. Hosts hold exactly one and pass it by reference; there are no
/// globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    grid: GridState,
    player: PlayerState,
    animator: MovingTileAnimator,
    rng: SessionRng,
    seed: u64,
    #[serde(skip)]
    event_log: Vec<GameEvent>,
}

impl GameState {
    /// Start a session: generate hazards and the first obstacle layout.
    pub fn new(seed: u64) -> Self {
        let mut rng = SessionRng::new(seed);
        let grid = GridState::generate(&mut rng);
        let mut state = Self {
            grid,
            player: PlayerState::new(),
            animator: MovingTileAnimator::default(),
            rng,
            seed,
            event_log: Vec::new(),
        };
        state.event_log.push(GameEvent::HazardsGenerated { seed });
        state.event_log.push(GameEvent::ObstaclesRespawned {
            generation: state.grid.obstacle_generation(),
        });
        tracing::info!(seed, "session board generated");
        state
    }

    /// Start a session on a fixed board. Obstacle respawns still draw from
    /// `seed`.
    pub fn with_grid(grid: GridState, seed: u64) -> Self {
        Self {
            grid,
            player: PlayerState::new(),
            animator: MovingTileAnimator::default(),
            rng: SessionRng::new(seed),
            seed,
            event_log: Vec::new(),
        }
    }

    /// Replace the player (scripted setups and tests).
    pub fn with_player(mut self, player: PlayerState) -> Self {
        self.player = player;
        self
    }

    /// Replace the oscillator, e.g. with a configured bounce rate.
    pub fn with_animator(mut self, animator: MovingTileAnimator) -> Self {
        self.animator = animator;
        self
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn animator(&self) -> &MovingTileAnimator {
        &self.animator
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_won(&self) -> bool {
        self.player.has_won()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[GameEvent] {
        &self.event_log
    }

    /// A direction key was released. `jump` is true while Space is held.
    pub fn release_direction(&mut self, dir: Direction, jump: bool) -> MoveOutcome {
        let from = self.player.position();
        let outcome = self.player.release(dir, jump, &self.grid);
        match outcome {
            MoveOutcome::Ignored => {
                tracing::debug!(%from, %dir, "move ignored");
                self.event_log
                    .push(GameEvent::MoveIgnored { from, direction: dir });
            }
            MoveOutcome::Queued(intent) => {
                tracing::debug!(%from, ?intent, "move queued");
            }
            _ => self.record(outcome),
        }
        outcome
    }

    /// Apply the queued intent, if any. Called once per tick.
    pub fn apply_pending(&mut self) -> MoveOutcome {
        let from = self.player.position();
        let pending = self.player.pending();
        let outcome = self.player.apply_pending(&self.grid);
        match (outcome, pending) {
            // A queued jump whose landing is off the board is consumed.
            (MoveOutcome::Ignored, Some(intent)) => {
                let direction = intent.direction();
                tracing::debug!(%from, ?intent, "queued move ignored");
                self.event_log.push(GameEvent::MoveIgnored { from, direction });
            }
            _ => self.record(outcome),
        }
        outcome
    }

    /// Draw a new obstacle layout.
    pub fn respawn_obstacles(&mut self) {
        self.grid.regenerate_obstacles(&mut self.rng);
        let generation = self.grid.obstacle_generation();
        tracing::info!(generation, "obstacles respawned");
        self.event_log
            .push(GameEvent::ObstaclesRespawned { generation });
    }

    /// Advance the moving-tile oscillator by `dt` seconds.
    pub fn advance_animation(&mut self, dt: f32) {
        self.animator.advance(dt);
    }

    fn record(&mut self, outcome: MoveOutcome) {
        let score = self.player.score();
        let event = match outcome {
            MoveOutcome::Stepped { from, to } => {
                tracing::debug!(%from, %to, "stepped");
                GameEvent::Stepped { from, to }
            }
            MoveOutcome::Jumped { from, to } => {
                tracing::debug!(%from, %to, "jumped");
                GameEvent::Jumped { from, to }
            }
            MoveOutcome::Fell { at } => {
                tracing::info!(%at, score, "player fell");
                GameEvent::Fell { at, score }
            }
            MoveOutcome::Won => {
                tracing::info!(score, "player reached the goal");
                GameEvent::Won { score }
            }
            MoveOutcome::Ignored | MoveOutcome::Queued(_) => return,
        };
        self.event_log.push(event);
    }
}
