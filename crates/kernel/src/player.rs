use serde::{Deserialize, Serialize};
use tilehop_common::{Direction, GOAL, GridPos, ORIGIN};

use crate::grid::GridState;

/// Score lost when the player falls into a hazard.
pub const FALL_PENALTY: i64 = 10;
/// Score gained for reaching the goal.
pub const WIN_BONUS: i64 = 100;

/// A movement the player asked for, applied on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// One cell. Hazard and goal checks already ran when it was requested.
    Step(Direction),
    /// Two cells, skipping the cell in between.
    Jump(Direction),
}

impl Intent {
    pub fn direction(self) -> Direction {
        match self {
            Self::Step(d) | Self::Jump(d) => d,
        }
    }

    /// Vertical jumps beat horizontal jumps, which beat plain steps.
    fn priority(self) -> u8 {
        match self {
            Self::Jump(d) if d.is_vertical() => 2,
            Self::Jump(_) => 1,
            Self::Step(_) => 0,
        }
    }
}

/// Result of a movement request or of applying a queued intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Nothing happened: off the board, nothing queued, or the game is over.
    Ignored,
    /// The intent waits for the next tick.
    Queued(Intent),
    Stepped { from: GridPos, to: GridPos },
    Jumped { from: GridPos, to: GridPos },
    /// Landed on a hazard at `at`; the player is back at the origin.
    Fell { at: GridPos },
    /// Reached the goal.
    Won,
}

/// Observable movement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPhase {
    Idle,
    MoveRequested(Direction),
    JumpRequested(Direction),
    Won,
}

/// Player position, score and the single pending movement intent.
///
/// A fall is not a state of its own: the player is moved back to the origin
/// and is immediately idle again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    position: GridPos,
    score: i64,
    pending: Option<Intent>,
    won: bool,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start somewhere other than the origin (used for scripted setups).
    pub fn at(position: GridPos) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn position(&self) -> GridPos {
        self.position
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn pending(&self) -> Option<Intent> {
        self.pending
    }

    pub fn has_won(&self) -> bool {
        self.won
    }

    pub fn phase(&self) -> PlayerPhase {
        if self.won {
            return PlayerPhase::Won;
        }
        match self.pending {
            None => PlayerPhase::Idle,
            Some(Intent::Step(d)) => PlayerPhase::MoveRequested(d),
            Some(Intent::Jump(d)) => PlayerPhase::JumpRequested(d),
        }
    }

    /// Handle the release of a direction key.
    ///
    /// A jump is only queued; it is resolved in [`PlayerState::apply_pending`].
    /// A step is resolved right away against the hazard layout: the target
    /// cell is probed before any upper-bound check, so a hazard row just past
    /// the far edge still causes a fall.
    pub fn release(&mut self, dir: Direction, jump: bool, grid: &GridState) -> MoveOutcome {
        if self.won {
            return MoveOutcome::Ignored;
        }
        if jump {
            return self.arm(Intent::Jump(dir));
        }

        let dest = self.position.offset(dir, 1);
        if dest.below_bounds() {
            MoveOutcome::Ignored
        } else if grid.is_hazard_at(dest) {
            self.fall(dest)
        } else if dest == GOAL {
            self.win(dest)
        } else if dest.in_bounds() {
            self.arm(Intent::Step(dir))
        } else {
            MoveOutcome::Ignored
        }
    }

    /// Consume the pending intent, if any, and move the player.
    pub fn apply_pending(&mut self, grid: &GridState) -> MoveOutcome {
        let Some(intent) = self.pending.take() else {
            return MoveOutcome::Ignored;
        };
        if self.won {
            return MoveOutcome::Ignored;
        }

        let from = self.position;
        match intent {
            Intent::Step(dir) => {
                self.position = from.offset(dir, 1);
                MoveOutcome::Stepped {
                    from,
                    to: self.position,
                }
            }
            Intent::Jump(dir) => {
                let dest = from.offset(dir, 2);
                if !dest.in_bounds() {
                    MoveOutcome::Ignored
                } else if grid.is_hazard_at(dest) {
                    self.fall(dest)
                } else if dest == GOAL {
                    self.win(dest)
                } else {
                    self.position = dest;
                    MoveOutcome::Jumped { from, to: dest }
                }
            }
        }
    }

    /// Fill the pending slot unless it already holds something of equal or
    /// higher priority.
    fn arm(&mut self, intent: Intent) -> MoveOutcome {
        match self.pending {
            Some(current) if current.priority() >= intent.priority() => MoveOutcome::Ignored,
            _ => {
                self.pending = Some(intent);
                MoveOutcome::Queued(intent)
            }
        }
    }

    fn fall(&mut self, at: GridPos) -> MoveOutcome {
        self.position = ORIGIN;
        self.score -= FALL_PENALTY;
        self.pending = None;
        MoveOutcome::Fell { at }
    }

    fn win(&mut self, at: GridPos) -> MoveOutcome {
        self.position = at;
        self.score += WIN_BONUS;
        self.pending = None;
        self.won = true;
        MoveOutcome::Won
    }
}
