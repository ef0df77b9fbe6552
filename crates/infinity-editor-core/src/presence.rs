//! Simulated collaborator cursors.
//!
//! Decorative only: three fixed collaborators drift around a box on a fixed
//! period. Nothing here talks to a network or reflects real users.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::types::Point;

/// Default perturbation period.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(3000);

/// Default maximum move per axis per period, in pixels.
pub const DEFAULT_JITTER: f64 = 25.0;

/// Largest accepted jitter, in pixels.
pub const MAX_JITTER: f64 = 10_000.0;

/// Shortest accepted period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Box the cursors are kept in, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresenceBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for PresenceBounds {
    fn default() -> Self {
        Self {
            min_x: 50.0,
            max_x: 700.0,
            min_y: 50.0,
            max_y: 400.0,
        }
    }
}

impl PresenceBounds {
    pub fn contains(&self, p: Point) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    /// Pull `p` into the box. Inverted bounds resolve to the max edge
    /// instead of panicking.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.max(self.min_x).min(self.max_x),
            p.y.max(self.min_y).min(self.max_y),
        )
    }

    /// Finite edges with min <= max on both axes.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }
}

/// A simulated collaborator's cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollaboratorCursor {
    pub id: u32,
    pub name: String,
    /// CSS hex colour.
    pub color: String,
    pub position: Point,
}

/// The fixed collaborators every editor starts with.
pub fn seed_cursors() -> Vec<CollaboratorCursor> {
    [
        (1, "Ana Souza", "#FF6B6B", 120.0, 80.0),
        (2, "Bruno Lima", "#4ECDC4", 340.0, 210.0),
        (3, "Carla Dias", "#AA96DA", 520.0, 300.0),
    ]
    .into_iter()
    .map(|(id, name, color, x, y)| CollaboratorCursor {
        id,
        name: name.to_string(),
        color: color.to_string(),
        position: Point::new(x, y),
    })
    .collect()
}

pub struct CollaboratorPresenceSimulator<R = StdRng> {
    cursors: Vec<CollaboratorCursor>,
    rng: R,
    period: Duration,
    jitter: f64,
    bounds: PresenceBounds,
    next_tick: Option<Instant>,
}

impl CollaboratorPresenceSimulator<StdRng> {
    /// Start the simulation at `now`. A fixed seed makes the drift
    /// reproducible; without one the generator is seeded from the OS.
    pub fn start(
        now: Instant,
        period: Duration,
        jitter: f64,
        bounds: PresenceBounds,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(now, period, jitter, bounds, rng)
    }
}

impl<R: Rng> CollaboratorPresenceSimulator<R> {
    pub fn with_rng(now: Instant, period: Duration, jitter: f64, bounds: PresenceBounds, rng: R) -> Self {
        let cursors = seed_cursors()
            .into_iter()
            .map(|mut c| {
                c.position = bounds.clamp(c.position);
                c
            })
            .collect();
        let period = period.max(MIN_PERIOD);
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, MAX_JITTER)
        } else {
            tracing::warn!(target: "infinity::presence", jitter, "non-finite jitter, cursors will not move");
            0.0
        };
        tracing::debug!(target: "infinity::presence", ?period, "presence interval started");
        Self {
            cursors,
            rng,
            period,
            jitter,
            bounds,
            next_tick: Some(now + period),
        }
    }

    pub fn cursors(&self) -> &[CollaboratorCursor] {
        &self.cursors
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Perturb the cursors when a period has elapsed. Returns whether they moved.
    ///
    /// A late poll runs one perturbation, not one per missed period.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_tick else {
            return false;
        };
        if due > now {
            return false;
        }
        self.perturb();
        let next = due + self.period;
        self.next_tick = Some(if next <= now { now + self.period } else { next });
        true
    }

    fn perturb(&mut self) {
        let jitter = self.jitter;
        if jitter == 0.0 {
            return;
        }
        for cursor in &mut self.cursors {
            let dx = self.rng.random_range(-jitter..=jitter);
            let dy = self.rng.random_range(-jitter..=jitter);
            let moved = Point::new(cursor.position.x + dx, cursor.position.y + dy);
            cursor.position = self.bounds.clamp(moved);
        }
    }

    /// Clear the interval. Only the first call returns true.
    pub fn stop(&mut self) -> bool {
        if self.next_tick.take().is_some() {
            tracing::debug!(target: "infinity::presence", "presence interval cleared");
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator(seed: u64) -> (CollaboratorPresenceSimulator, Instant) {
        let t0 = Instant::now();
        let sim = CollaboratorPresenceSimulator::start(
            t0,
            DEFAULT_PERIOD,
            DEFAULT_JITTER,
            PresenceBounds::default(),
            Some(seed),
        );
        (sim, t0)
    }

    #[test]
    fn test_seed_cursors() {
        let (sim, _) = simulator(1);
        let names: Vec<_> = sim.cursors().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Ana Souza", "Bruno Lima", "Carla Dias"]);
    }

    #[test]
    fn test_moves_once_per_period() {
        let (mut sim, t0) = simulator(7);
        let before = sim.cursors().to_vec();

        assert!(!sim.poll(t0 + Duration::from_millis(2999)));
        assert_eq!(sim.cursors(), before.as_slice());
        assert!(sim.poll(t0 + DEFAULT_PERIOD));
        assert!(!sim.poll(t0 + DEFAULT_PERIOD));
        for (old, new) in before.iter().zip(sim.cursors()) {
            assert!((new.position.x - old.position.x).abs() <= DEFAULT_JITTER);
            assert!((new.position.y - old.position.y).abs() <= DEFAULT_JITTER);
        }
    }

    #[test]
    fn test_cursors_stay_in_bounds() {
        let (mut sim, t0) = simulator(42);
        let bounds = PresenceBounds::default();
        for i in 1..=2000u32 {
            sim.poll(t0 + DEFAULT_PERIOD * i);
            assert!(sim.cursors().iter().all(|c| bounds.contains(c.position)));
        }
    }

    #[test]
    fn test_same_seed_same_drift() {
        let (mut a, t0) = simulator(9);
        let mut b = CollaboratorPresenceSimulator::start(
            t0,
            DEFAULT_PERIOD,
            DEFAULT_JITTER,
            PresenceBounds::default(),
            Some(9),
        );
        a.poll(t0 + DEFAULT_PERIOD);
        b.poll(t0 + DEFAULT_PERIOD);
        assert_eq!(a.cursors(), b.cursors());
    }

    #[test]
    fn test_bad_bounds_and_jitter_do_not_panic() {
        let t0 = Instant::now();
        let inverted = PresenceBounds {
            min_x: 700.0,
            max_x: 50.0,
            min_y: f64::NAN,
            max_y: 400.0,
        };
        assert!(!inverted.is_valid());
        assert_eq!(inverted.clamp(Point::new(10.0, 10.0)), Point::new(50.0, 10.0));

        let mut sim = CollaboratorPresenceSimulator::start(
            t0,
            Duration::ZERO,
            f64::INFINITY,
            inverted,
            Some(4),
        );
        let start = sim.cursors().to_vec();
        assert!(sim.poll(t0 + Duration::from_millis(1)));
        assert_eq!(sim.cursors(), start.as_slice());
        assert!(sim.next_deadline().is_some_and(|d| d > t0 + Duration::from_millis(1)));
    }

    #[test]
    fn test_stop_once() {
        let (mut sim, t0) = simulator(3);
        assert!(sim.stop());
        assert!(!sim.stop());
        assert!(!sim.poll(t0 + DEFAULT_PERIOD * 10));
        assert!(!sim.is_running());
    }
}
