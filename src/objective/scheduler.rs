//! Objective scheduler - decides when the next objective cycle starts and ends

use crate::core::config::SchedulerConfig;

/// What the host should do with its objective after a scheduler step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    Start,
    Stop,
    Idle,
}

/// Counts down an objective's active window, then a cooldown before the next one
#[derive(Debug, Clone)]
pub struct ObjectiveScheduler {
    config: SchedulerConfig,
    active: bool,
    remaining_secs: f64,
    cooldown_secs: f64,
}

impl ObjectiveScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            remaining_secs: config.active_window_secs,
            cooldown_secs: 0.0,
            active: false,
            config,
        }
    }

    /// Resume with a window already partly used, e.g. after a host restart
    pub fn with_remaining(mut self, remaining_secs: f64) -> Self {
        self.remaining_secs = remaining_secs.clamp(0.0, self.config.active_window_secs);
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds left in the current (or next) active window
    pub fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    /// The objective ended early (someone won); begin the cooldown
    pub fn objective_finished(&mut self) {
        if self.active {
            tracing::info!("objective finished before its window closed");
        }
        self.active = false;
        self.remaining_secs = self.config.active_window_secs;
        self.cooldown_secs = self.config.cooldown_secs;
    }

    /// Advance by `elapsed_secs`
    pub fn step(&mut self, elapsed_secs: f64) -> ScheduleAction {
        if !self.active {
            self.cooldown_secs = (self.cooldown_secs - elapsed_secs).max(0.0);
            if self.cooldown_secs > 0.0 {
                return ScheduleAction::Idle;
            }
            self.active = true;
            tracing::info!(window_secs = self.remaining_secs, "objective window opened");
            return ScheduleAction::Start;
        }

        self.remaining_secs -= elapsed_secs;
        if self.remaining_secs > 0.0 {
            return ScheduleAction::Idle;
        }

        tracing::info!("objective window closed");
        self.objective_finished();
        ScheduleAction::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(window: f64, cooldown: f64) -> ObjectiveScheduler {
        ObjectiveScheduler::new(SchedulerConfig {
            active_window_secs: window,
            cooldown_secs: cooldown,
        })
    }

    #[test]
    fn test_starts_immediately_without_cooldown() {
        let mut sched = scheduler(10.0, 0.0);
        assert_eq!(sched.step(1.0), ScheduleAction::Start);
        assert!(sched.is_active());
    }

    #[test]
    fn test_window_closes_and_restarts() {
        let mut sched = scheduler(10.0, 0.0);
        sched.step(1.0);
        for _ in 0..9 {
            assert_eq!(sched.step(1.0), ScheduleAction::Idle);
        }
        assert_eq!(sched.step(1.0), ScheduleAction::Stop);
        assert_eq!(sched.remaining_secs(), 10.0);
        assert_eq!(sched.step(1.0), ScheduleAction::Start);
    }

    #[test]
    fn test_cooldown_delays_next_start() {
        let mut sched = scheduler(5.0, 3.0);
        sched.step(1.0);
        sched.objective_finished();
        assert_eq!(sched.step(1.0), ScheduleAction::Idle);
        assert_eq!(sched.step(1.0), ScheduleAction::Idle);
        assert_eq!(sched.step(1.0), ScheduleAction::Start);
    }

    #[test]
    fn test_resume_with_remaining_time() {
        let mut sched = scheduler(100.0, 0.0).with_remaining(2.0);
        assert_eq!(sched.step(1.0), ScheduleAction::Start);
        assert_eq!(sched.step(1.0), ScheduleAction::Idle);
        assert_eq!(sched.step(1.0), ScheduleAction::Stop);
    }
}
