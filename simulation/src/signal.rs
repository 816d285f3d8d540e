use bevy_ecs::prelude::*;
use bevy_log::debug;
use bevy_time::Time;
use serde::Serialize;

/// Remaining time below this counts as expired.
const EXPIRY_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPhase {
    Red,
    #[default]
    Green,
}

impl SignalPhase {
    pub fn flipped(self) -> Self {
        match self {
            SignalPhase::Red => SignalPhase::Green,
            SignalPhase::Green => SignalPhase::Red,
        }
    }
}

/// Free-running red/green countdown.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SignalState {
    pub phase: SignalPhase,
    /// Seconds left in the current phase, within `[0, period]`
    pub timer: f32,
    pub period: f32,
    /// Set once the ego has committed to stopping in this red phase
    pub stop_line_locked: bool,
}

impl SignalState {
    pub fn new(period: f32) -> Self {
        Self {
            phase: SignalPhase::Green,
            timer: period,
            period,
            stop_line_locked: false,
        }
    }

    /// Counts down and flips when the phase runs out. Returns the new phase
    /// on a flip.
    pub fn tick(&mut self, dt: f32) -> Option<SignalPhase> {
        self.timer -= dt;
        if self.timer > EXPIRY_EPSILON {
            return None;
        }

        self.phase = self.phase.flipped();
        self.timer = self.period;
        if self.phase == SignalPhase::Green {
            self.stop_line_locked = false;
        }
        Some(self.phase)
    }

    /// Forces a fresh red phase.
    pub fn force_red(&mut self) {
        self.phase = SignalPhase::Red;
        self.timer = self.period;
    }

    pub fn is_red(&self) -> bool {
        self.phase == SignalPhase::Red
    }

    /// Whole seconds left, as shown on the HUD.
    pub fn seconds_remaining(&self) -> u32 {
        self.timer.max(0.0).ceil() as u32
    }
}

pub fn tick_signal(time: Res<Time>, mut signal: ResMut<SignalState>) {
    if let Some(phase) = signal.tick(time.delta_secs()) {
        debug!("signal flipped to {phase:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_flips_twice_and_clears_lock() {
        let mut signal = SignalState::new(15.0);

        // Uneven but exact partition of 15 seconds
        for dt in [0.5, 0.25, 4.25, 10.0] {
            signal.tick(dt);
        }
        assert_eq!(signal.phase, SignalPhase::Red);
        assert_eq!(signal.timer, 15.0);

        signal.stop_line_locked = true;
        for _ in 0..60 {
            signal.tick(0.25);
        }
        assert_eq!(signal.phase, SignalPhase::Green);
        assert_eq!(signal.timer, 15.0);
        assert!(!signal.stop_line_locked);
    }

    #[test]
    fn frame_rate_partition_flips_on_time() {
        let mut signal = SignalState::new(15.0);
        let mut flips = 0;
        for _ in 0..900 {
            if signal.tick(1.0 / 60.0).is_some() {
                flips += 1;
            }
        }
        assert_eq!(flips, 1);
        assert_eq!(signal.phase, SignalPhase::Red);
        assert!(signal.timer > 14.9 && signal.timer <= 15.0);
    }

    #[test]
    fn red_flip_keeps_lock() {
        let mut signal = SignalState::new(15.0);
        signal.stop_line_locked = true;
        assert_eq!(signal.tick(15.0), Some(SignalPhase::Red));
        assert!(signal.stop_line_locked);
    }

    #[test]
    fn timer_stays_in_range() {
        let mut signal = SignalState::new(15.0);
        for _ in 0..200 {
            signal.tick(0.7);
            assert!((0.0..=15.0).contains(&signal.timer));
        }
    }

    #[test]
    fn force_red_restarts_the_phase() {
        let mut signal = SignalState::new(15.0);
        signal.tick(9.0);
        signal.force_red();
        assert!(signal.is_red());
        assert_eq!(signal.seconds_remaining(), 15);
    }
}
