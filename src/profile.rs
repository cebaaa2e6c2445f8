//! Ramp/soak thermal profile execution.
//!
//! The profile runs in three stretches: hold the current setpoint while the
//! chamber stabilizes, ramp the setpoint towards the final temperature at a
//! fixed rate, then soak at the final temperature for a configured duration.
//! The loop polls the controller once per wall-clock second and logs every
//! accepted sample.

use std::io;
use std::time::Instant;

use chrono::{DateTime, Local};
use log::{error, info};

use crate::controller::Gc89800;
use crate::transport::Transport;

/// Seconds the loop holds before ramping begins.
pub const STABILIZE_SECS: u32 = 300;
/// The ramp is over once the measured temperature is within this fraction of
/// the final target; the remaining gap closes on its own during the soak.
pub const APPROACH_FRACTION: f64 = 0.997;
/// Semantic read attempts per tick, on top of the channel's own retries.
pub const READ_ATTEMPTS: u32 = 3;

/// One ramp/soak run, supplied once and never changed mid-run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileConfig {
    /// Final temperature in engineering units.
    pub final_temp: f64,
    /// Ramp rate in units per minute.
    pub ramp_rate: f64,
    /// Soak duration in minutes once the final temperature is reached.
    pub soak_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stabilizing,
    Ramping,
    Soaking,
    Done,
}

/// Where accepted samples go. One call per accepted tick.
pub trait ProfileSink {
    fn record(
        &mut self,
        at: DateTime<Local>,
        current_temp: f64,
        set_temp: f64,
    ) -> io::Result<()>;
}

/// The ramp/soak state machine. One [`advance`](Self::advance) per accepted
/// tick; wall-clock gating and device I/O live in [`ProfileRunner`].
#[derive(Debug)]
pub struct RampSoak {
    config: ProfileConfig,
    phase: Phase,
    stable_remaining: u32,
    soak_elapsed: u64,
    target: Option<f64>,
}

impl RampSoak {
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            config,
            phase: Phase::Stabilizing,
            stable_remaining: STABILIZE_SECS,
            soak_elapsed: 0,
            target: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Stabilization countdown, in ticks.
    pub fn stable_remaining(&self) -> u32 {
        self.stable_remaining
    }

    /// Accumulated soak ticks. Never reset, even if the temperature dips
    /// back below the approach band mid-soak.
    pub fn soak_elapsed(&self) -> u64 {
        self.soak_elapsed
    }

    /// Advance one tick with a fresh temperature reading. Returns the
    /// setpoint to command this tick, if any.
    pub fn advance(&mut self, current_temp: f64) -> Option<f64> {
        if self.phase == Phase::Done {
            return None;
        }
        // The ramp baseline is the first temperature ever observed, not the
        // final target: the setpoint left on the device may be far from
        // ambient, and starting the ramp there would command a large jump.
        let target = *self.target.get_or_insert(current_temp);

        if self.stable_remaining > 0 {
            self.stable_remaining -= 1;
            return None;
        }

        if current_temp < self.config.final_temp * APPROACH_FRACTION {
            if self.phase != Phase::Ramping {
                info!("ramping towards {:.2}", self.config.final_temp);
            }
            self.phase = Phase::Ramping;
            let next = target + self.config.ramp_rate / 60.0;
            self.target = Some(next);
            Some(next)
        } else {
            if self.phase != Phase::Soaking {
                info!("temperature reached final setpoint, soaking");
            }
            self.phase = Phase::Soaking;
            self.soak_elapsed += 1;
            if self.soak_elapsed > self.config.soak_limit * 60 {
                self.phase = Phase::Done;
            }
            // The final setpoint is rewritten every soak tick.
            Some(self.config.final_temp)
        }
    }
}

/// Gates the loop to at most one state advance per wall-clock second.
///
/// The tick is derived from a monotonic elapsed-second counter, so only a
/// change of the whole-second value advances state. That keeps the loop
/// idempotent under scheduling jitter: re-running within the same second is
/// a no-op.
#[derive(Debug)]
pub struct SecondTicker {
    started: Instant,
    last: Option<u64>,
}

impl SecondTicker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            last: None,
        }
    }

    /// Consume the current second if it has not been consumed yet.
    pub fn tick(&mut self) -> bool {
        let second = self.started.elapsed().as_secs();
        self.accept(second)
    }

    fn accept(&mut self, second: u64) -> bool {
        if self.last == Some(second) {
            false
        } else {
            self.last = Some(second);
            true
        }
    }
}

impl Default for SecondTicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry a semantic read a bounded number of times; first success wins.
/// Misses and hard errors are reported, never propagated.
fn retry_read<E: std::fmt::Display>(
    what: &str,
    mut read: impl FnMut() -> Result<Option<f64>, E>,
) -> Option<f64> {
    for attempt in 1..=READ_ATTEMPTS {
        match read() {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {
                error!("failed to retrieve {what} (attempt {attempt}/{READ_ATTEMPTS}), retrying")
            }
            Err(e) => {
                error!("serial error retrieving {what} (attempt {attempt}/{READ_ATTEMPTS}): {e}")
            }
        }
    }
    None
}

/// Drives a [`RampSoak`] against a real device, once per wall-clock second,
/// until the profile completes.
pub struct ProfileRunner<'a, T: Transport, S: ProfileSink> {
    device: &'a mut Gc89800<T>,
    sink: &'a mut S,
    state: RampSoak,
    ticker: SecondTicker,
}

impl<'a, T: Transport, S: ProfileSink> ProfileRunner<'a, T, S> {
    pub fn new(device: &'a mut Gc89800<T>, sink: &'a mut S, config: ProfileConfig) -> Self {
        Self {
            device,
            sink,
            state: RampSoak::new(config),
            ticker: SecondTicker::new(),
        }
    }

    pub fn state(&self) -> &RampSoak {
        &self.state
    }

    /// Run the profile to completion.
    ///
    /// Only reaching [`Phase::Done`] ends the loop; persistent device
    /// unresponsiveness degrades to skipped ticks at the 1 Hz cadence, since
    /// a single missed tick has negligible thermal impact.
    pub fn run(&mut self) {
        info!(
            "starting temperature profile: final {:.2}, ramp {:.2}/min, soak {} min",
            self.state.config.final_temp, self.state.config.ramp_rate, self.state.config.soak_limit
        );
        while !self.state.is_done() {
            self.tick();
        }
        info!("temperature profile complete");
    }

    /// One loop pass: read both registers and, when both succeed on a fresh
    /// second, log the sample and advance the state machine. A tick whose
    /// reads fail is skipped entirely: no log row, no setpoint change, no
    /// state advance.
    pub fn tick(&mut self) {
        let current = retry_read("current temperature", || self.device.read_temperature());
        let setpoint = retry_read("set temperature", || self.device.read_setpoint());
        let (Some(current), Some(setpoint)) = (current, setpoint) else {
            error!("failed to retrieve temperature data after {READ_ATTEMPTS} attempts");
            return;
        };

        if !self.ticker.tick() {
            return;
        }

        if let Err(e) = self.sink.record(Local::now(), current, setpoint) {
            error!("failed to append sample row: {e}");
        }

        if let Some(command) = self.state.advance(current) {
            if let Err(e) = self.device.write_setpoint(command) {
                error!("failed to write setpoint {command:.2}: {e}");
            }
        }
        self.report(current, setpoint);
    }

    fn report(&self, current: f64, setpoint: f64) {
        match self.state.phase() {
            Phase::Stabilizing => {
                let left = self.state.stable_remaining();
                info!(
                    "current {current:.2}, set {setpoint:.2}, stability time left {}m {}s",
                    left / 60,
                    left % 60
                );
            }
            Phase::Soaking | Phase::Done => {
                let soak = self.state.soak_elapsed();
                info!(
                    "current {current:.2}, set {setpoint:.2}, soak time {}m {}s",
                    soak / 60,
                    soak % 60
                );
            }
            Phase::Ramping => info!("current {current:.2}, set {setpoint:.2}"),
        }
    }
}
