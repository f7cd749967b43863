use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathingPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathingPhase {
    pub fn next(self) -> Self {
        match self {
            BreathingPhase::Inhale => BreathingPhase::Hold,
            BreathingPhase::Hold => BreathingPhase::Exhale,
            BreathingPhase::Exhale => BreathingPhase::Inhale,
        }
    }
}

impl fmt::Display for BreathingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BreathingPhase::Inhale => "Inhale",
            BreathingPhase::Hold => "Hold",
            BreathingPhase::Exhale => "Exhale",
        };
        f.pad(label)
    }
}

/// Phase lengths in ticks (seconds when driven by the CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathingPattern {
    pub inhale: u32,
    pub hold: u32,
    pub exhale: u32,
}

impl BreathingPattern {
    pub const FOUR_SEVEN_EIGHT: Self = Self {
        inhale: 4,
        hold: 7,
        exhale: 8,
    };

    pub fn duration(&self, phase: BreathingPhase) -> u32 {
        let ticks = match phase {
            BreathingPhase::Inhale => self.inhale,
            BreathingPhase::Hold => self.hold,
            BreathingPhase::Exhale => self.exhale,
        };
        ticks.max(1)
    }

    pub fn cycle_length(&self) -> u32 {
        self.duration(BreathingPhase::Inhale)
            + self.duration(BreathingPhase::Hold)
            + self.duration(BreathingPhase::Exhale)
    }
}

impl Default for BreathingPattern {
    fn default() -> Self {
        Self::FOUR_SEVEN_EIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreathingTick {
    pub phase: BreathingPhase,
    pub seconds_remaining: u32,
    pub cycles_completed: u32,
}

#[derive(Debug, Clone, Copy)]
struct Running {
    phase: BreathingPhase,
    remaining: u32,
}

/// Inhale → hold → exhale countdown that cycles until stopped. Holds no
/// resources, so stopping needs no cleanup.
#[derive(Debug, Clone, Default)]
pub struct BreathingTimer {
    pattern: BreathingPattern,
    running: Option<Running>,
    cycles_completed: u32,
}

impl BreathingTimer {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self {
            pattern,
            running: None,
            cycles_completed: 0,
        }
    }

    pub fn pattern(&self) -> BreathingPattern {
        self.pattern
    }

    /// (Re)starts at the top of the inhale phase.
    pub fn start(&mut self) -> BreathingTick {
        self.cycles_completed = 0;
        let running = Running {
            phase: BreathingPhase::Inhale,
            remaining: self.pattern.duration(BreathingPhase::Inhale),
        };
        self.running = Some(running);
        self.snapshot(running)
    }

    pub fn stop(&mut self) {
        self.running = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn current(&self) -> Option<BreathingTick> {
        self.running.map(|running| self.snapshot(running))
    }

    /// Advances one unit of time. Returns `None` when the timer is stopped.
    pub fn tick(&mut self) -> Option<BreathingTick> {
        let mut running = self.running?;
        running.remaining = running.remaining.saturating_sub(1);

        if running.remaining == 0 {
            if running.phase == BreathingPhase::Exhale {
                self.cycles_completed += 1;
            }
            running.phase = running.phase.next();
            running.remaining = self.pattern.duration(running.phase);
        }

        self.running = Some(running);
        Some(self.snapshot(running))
    }

    fn snapshot(&self, running: Running) -> BreathingTick {
        BreathingTick {
            phase: running.phase,
            seconds_remaining: running.remaining,
            cycles_completed: self.cycles_completed,
        }
    }
}

/// Drives `timer` once per `period` until `max_cycles` complete or `cancel`
/// resolves. Returns the number of completed cycles.
pub async fn run_session<C, F>(
    timer: &mut BreathingTimer,
    period: Duration,
    max_cycles: Option<u32>,
    cancel: C,
    mut on_tick: F,
) -> u32
where
    C: Future<Output = ()>,
    F: FnMut(BreathingTick),
{
    on_tick(timer.start());
    tracing::debug!(?period, ?max_cycles, "breathing session started");

    if max_cycles == Some(0) {
        timer.stop();
        return 0;
    }

    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(cancel);

    while timer.is_running() {
        tokio::select! {
            _ = &mut cancel => {
                tracing::info!("breathing session cancelled");
                break;
            }
            _ = ticker.tick() => {
                let Some(tick) = timer.tick() else { break };
                on_tick(tick);
                if max_cycles.is_some_and(|limit| tick.cycles_completed >= limit) {
                    break;
                }
            }
        }
    }

    let completed = timer.current().map_or(0, |tick| tick.cycles_completed);
    timer.stop();
    tracing::debug!(completed, "breathing session finished");
    completed
}
