use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Default duration of a plain transition.
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    QuadInOut,
    #[default]
    CubicInOut,
    CubicOut,
    SinInOut,
}

impl Easing {
    pub const ALL: [Easing; 5] = [
        Easing::Linear,
        Easing::QuadInOut,
        Easing::CubicInOut,
        Easing::CubicOut,
        Easing::SinInOut,
    ];

    /// Maps normalized time in `[0, 1]` to normalized progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t / 2.0
                } else {
                    let t = t - 1.0;
                    (t * (2.0 - t) + 1.0) / 2.0
                }
            }
            Easing::CubicInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
            Easing::CubicOut => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
            Easing::SinInOut => (1.0 - (std::f32::consts::PI * t).cos()) / 2.0,
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => write!(f, "Linear"),
            Easing::QuadInOut => write!(f, "Quad in-out"),
            Easing::CubicInOut => write!(f, "Cubic in-out"),
            Easing::CubicOut => write!(f, "Cubic out"),
            Easing::SinInOut => write!(f, "Sine in-out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub duration: Duration,
    pub delay: Duration,
    pub easing: Easing,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            duration: DEFAULT_TRANSITION,
            delay: Duration::ZERO,
            easing: Easing::CubicInOut,
        }
    }
}

impl Timing {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            delay: Duration::ZERO,
            easing,
        }
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    /// Eased progress at `elapsed` since the transition was issued.
    fn progress(&self, elapsed: Duration) -> f32 {
        if elapsed <= self.delay {
            return 0.0;
        }
        let active = elapsed - self.delay;
        if self.duration.is_zero() || active >= self.duration {
            return 1.0;
        }
        self.easing
            .apply(active.as_secs_f32() / self.duration.as_secs_f32())
    }

    fn total(&self) -> Duration {
        self.delay + self.duration
    }
}

/// A scalar attribute animated towards a target.
///
/// Issuing a new target while a transition is in flight starts the new one
/// from the value reached so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    running: Option<(Instant, Timing)>,
}

impl Tween {
    pub fn settled(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            running: None,
        }
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        match self.running {
            None => self.to,
            Some((start, timing)) => {
                let t = timing.progress(now.saturating_duration_since(start));
                if t >= 1.0 {
                    self.to
                } else {
                    self.from + (self.to - self.from) * t
                }
            }
        }
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.running
            .is_some_and(|(start, timing)| now.saturating_duration_since(start) < timing.total())
    }

    /// Moves towards `to`; a no-op when `to` already is the target.
    pub fn retarget(&mut self, to: f32, now: Instant, timing: Timing) {
        if to == self.to {
            return;
        }
        let from = self.value_at(now);
        self.from = from;
        self.to = to;
        self.running = Some((now, timing));
    }

    /// Restarts from `from` regardless of the current state.
    pub fn restart(&mut self, from: f32, to: f32, now: Instant, timing: Timing) {
        self.from = from;
        self.to = to;
        self.running = Some((now, timing));
    }

    pub fn jump(&mut self, to: f32) {
        *self = Tween::settled(to);
    }
}
