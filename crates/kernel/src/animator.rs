use serde::{Deserialize, Serialize};

/// Default oscillation speed in height units per second.
/// Matches half a unit per frame at 60 Hz.
pub const DEFAULT_BOUNCE_RATE: f32 = 30.0;
/// Peak offset from rest height, in either direction.
pub const BOUNCE_AMPLITUDE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BounceDirection {
    Rising,
    Falling,
}

/// Shared vertical oscillator for every moving tile.
///
/// All moving tiles use the same phase. The offset is driven by elapsed time,
/// not by frame count, so the bounce speed does not depend on refresh rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingTileAnimator {
    offset: f32,
    direction: BounceDirection,
    rate: f32,
}

impl Default for MovingTileAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNCE_RATE)
    }
}

impl MovingTileAnimator {
    /// Start at rest height, heading down.
    pub fn new(rate: f32) -> Self {
        Self {
            offset: 0.0,
            direction: BounceDirection::Falling,
            rate: rate.abs(),
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn direction(&self) -> BounceDirection {
        self.direction
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Advance by `dt` seconds. Flips direction on reaching either bound;
    /// motion past the bound is dropped rather than reflected.
    pub fn advance(&mut self, dt: f32) {
        let delta = self.rate * dt.max(0.0);
        match self.direction {
            BounceDirection::Rising => {
                self.offset = (self.offset + delta).min(BOUNCE_AMPLITUDE);
                if self.offset >= BOUNCE_AMPLITUDE {
                    self.direction = BounceDirection::Falling;
                }
            }
            BounceDirection::Falling => {
                self.offset = (self.offset - delta).max(-BOUNCE_AMPLITUDE);
                if self.offset <= -BOUNCE_AMPLITUDE {
                    self.direction = BounceDirection::Rising;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn starts_at_rest_falling() {
        let a = MovingTileAnimator::default();
        assert_eq!(a.offset(), 0.0);
        assert_eq!(a.direction(), BounceDirection::Falling);
    }

    #[test]
    fn offset_never_leaves_bounds() {
        let mut a = MovingTileAnimator::default();
        for i in 0..10_000 {
            // Irregular frame times, including long stalls.
            let dt = FRAME * ((i % 7) as f32 + 0.3);
            a.advance(dt);
            assert!(a.offset() >= -BOUNCE_AMPLITUDE && a.offset() <= BOUNCE_AMPLITUDE);
        }
    }

    #[test]
    fn flips_exactly_at_bounds() {
        let mut a = MovingTileAnimator::new(1.0);
        a.advance(3.0);
        assert_eq!(a.offset(), -BOUNCE_AMPLITUDE);
        assert_eq!(a.direction(), BounceDirection::Rising);

        a.advance(6.0);
        assert_eq!(a.offset(), BOUNCE_AMPLITUDE);
        assert_eq!(a.direction(), BounceDirection::Falling);

        a.advance(0.5);
        assert_eq!(a.offset(), 2.5);
        assert_eq!(a.direction(), BounceDirection::Falling);
    }

    #[test]
    fn overshoot_is_clamped_not_reflected() {
        let mut a = MovingTileAnimator::new(1.0);
        a.advance(100.0);
        assert_eq!(a.offset(), -BOUNCE_AMPLITUDE);
        assert_eq!(a.direction(), BounceDirection::Rising);
    }

    #[test]
    fn speed_is_independent_of_frame_rate() {
        let mut at_60 = MovingTileAnimator::new(2.0);
        let mut at_120 = MovingTileAnimator::new(2.0);
        for _ in 0..30 {
            at_60.advance(1.0 / 60.0);
        }
        for _ in 0..60 {
            at_120.advance(1.0 / 120.0);
        }
        assert!((at_60.offset() - at_120.offset()).abs() < 1e-4);
    }

    #[test]
    fn default_rate_is_half_unit_per_frame() {
        let mut a = MovingTileAnimator::default();
        a.advance(FRAME);
        assert!((a.offset() + 0.5).abs() < 1e-5);
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut a = MovingTileAnimator::default();
        a.advance(-1.0);
        assert_eq!(a.offset(), 0.0);
    }
}
