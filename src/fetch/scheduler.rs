//! Polite-pacing scheduler (spec.md §4.3, §9): a small closed-form state
//! struct — no timer threads — tracking fatigue and 429 cooldown per
//! host, consulted before every fetch to compute the next sleep.

use std::time::Duration;

use chrono::{Datelike, Utc, Weekday};
use rand::Rng;

use crate::config::HumanBehaviorConfig;
use crate::utils::DEFAULT_COOLDOWN_PAGES;

/// Per-host adaptive delay state (spec.md §3: owned by the Fetcher,
/// mutated only from its task).
#[derive(Debug, Clone, Default)]
pub struct FatigueState {
    pages_fetched: u32,
    cooldown_pages_remaining: u32,
}

impl FatigueState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fatigue multiplier: grows with pages fetched this session as
    /// `1 + k * floor(count / session_break_after)`.
    fn fatigue_multiplier(&self, session_break_after: u32) -> f64 {
        if session_break_after == 0 {
            return 1.0;
        }
        let k = 0.15;
        1.0 + k * f64::from(self.pages_fetched / session_break_after)
    }

    fn weekend_multiplier(&self, weekend_factor: f64) -> f64 {
        let today = Utc::now().weekday();
        if matches!(today, Weekday::Sat | Weekday::Sun) {
            weekend_factor
        } else {
            1.0
        }
    }

    /// Doubles the base delay for `cooldown_pages` pages following a 429
    /// (spec.md §4.3).
    pub fn set_cooldown(&mut self) {
        self.cooldown_pages_remaining = DEFAULT_COOLDOWN_PAGES;
    }

    fn cooldown_multiplier(&self) -> f64 {
        if self.cooldown_pages_remaining > 0 {
            2.0
        } else {
            1.0
        }
    }

    /// Complexity adaptation: bounded multiplier growth for large or
    /// heading-heavy response bodies (spec.md §4.3).
    fn complexity_multiplier(body_len: usize, heading_count: usize) -> f64 {
        let size_factor = (body_len as f64 / 200_000.0).min(1.0);
        let heading_factor = (heading_count as f64 / 20.0).min(1.0);
        1.0 + 0.5 * size_factor.max(heading_factor)
    }

    /// Record that a page finished; advances the session-break counter
    /// and ticks down any active cooldown.
    pub fn record_fetch(&mut self) {
        self.pages_fetched += 1;
        if self.cooldown_pages_remaining > 0 {
            self.cooldown_pages_remaining -= 1;
        }
    }

    #[must_use]
    pub fn current_multiplier(&self, config: &HumanBehaviorConfig) -> f64 {
        self.fatigue_multiplier(config.session_break_after)
            * self.weekend_multiplier(config.weekend_factor)
            * self.cooldown_multiplier()
    }
}

/// Computes sleep durations from a [`HumanBehaviorConfig`] and a host's
/// [`FatigueState`]. Pure with respect to I/O — callers own the actual
/// `tokio::time::sleep`.
pub struct Scheduler<'a> {
    config: &'a HumanBehaviorConfig,
}

impl<'a> Scheduler<'a> {
    #[must_use]
    pub fn new(config: &'a HumanBehaviorConfig) -> Self {
        Self { config }
    }

    /// Pre-request delay: `base_reading_time ± variance%`, scaled by the
    /// current fatigue/weekend/cooldown multiplier.
    #[must_use]
    pub fn reading_delay(&self, fatigue: &FatigueState) -> Duration {
        let (min, max) = self.config.base_reading_time;
        let base = rand::rng().random_range(min..=max);
        let jitter = self.apply_variance(base);
        self.scaled(jitter, fatigue)
    }

    /// Post-response delay before the next enqueue.
    #[must_use]
    pub fn navigation_delay(&self, fatigue: &FatigueState) -> Duration {
        let (min, max) = self.config.navigation_decision;
        let base = rand::rng().random_range(min..=max);
        let jitter = self.apply_variance(base);
        self.scaled(jitter, fatigue)
    }

    /// Long "session break" pause injected every `session_break_after`
    /// pages (spec.md §4.3), in addition to the regular reading delay.
    #[must_use]
    pub fn session_break_delay(&self, fatigue: &FatigueState) -> Option<Duration> {
        if self.config.session_break_after == 0 {
            return None;
        }
        let due = fatigue.pages_fetched > 0
            && fatigue.pages_fetched % self.config.session_break_after == 0;
        due.then(|| Duration::from_secs_f64(rand::rng().random_range(30.0..=60.0)))
    }

    /// Additional delay proportional to response complexity (spec.md
    /// §4.3's "complexity adaptation").
    #[must_use]
    pub fn complexity_delay(
        &self,
        fatigue: &FatigueState,
        body_len: usize,
        heading_count: usize,
    ) -> Duration {
        let (min, _) = self.config.base_reading_time;
        let multiplier = FatigueState::complexity_multiplier(body_len, heading_count);
        self.scaled(min * multiplier, fatigue)
    }

    fn apply_variance(&self, base_secs: f64) -> f64 {
        let variance = f64::from(self.config.variance_percent) / 100.0;
        let delta = base_secs * variance;
        base_secs + rand::rng().random_range(-delta..=delta)
    }

    fn scaled(&self, secs: f64, fatigue: &FatigueState) -> Duration {
        let multiplier = fatigue.current_multiplier(self.config);
        Duration::from_secs_f64((secs * multiplier).max(0.0))
    }
}
