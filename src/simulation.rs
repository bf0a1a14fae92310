//! Owned state of one dive simulation: tissues, run clock and gases.
//!
//! Every exposure (ascent/descent leg, constant-depth leg, deco stop) goes
//! through [`Simulation`], which advances the tissues and the clock together.
//! Independent dives never share a `Simulation`.

use tracing::trace;

use crate::buhlmann::{ambient_pressure, InertFractions, TissueState};
use crate::error::DecoError;
use crate::models::{DivePlan, GasMix};

/// Upper bound of one-minute extensions at a single stop.
pub const DEFAULT_MAX_STOP_MINUTES: u32 = 10_000;

/// Mixes with at most this nitrogen fraction are treated as oxygen-rich deco gases.
const DECO_GAS_MAX_N2: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerOptions {
    pub max_stop_minutes: u32,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_stop_minutes: DEFAULT_MAX_STOP_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunClock {
    /// Minutes since the start of the dive.
    pub run_time: f64,
    /// Count of applied segments, used to correlate report lines.
    pub segment_number: u32,
    /// Duration of the most recently applied segment.
    pub segment_time: f64,
}

/// Result of holding at a deco stop until the ceiling clears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopHold {
    /// Minutes spent at the stop including the initial clock alignment.
    pub segment_time: f64,
    /// Number of one-minute extensions after the first interval.
    pub extensions: u32,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    tissues: TissueState,
    clock: RunClock,
    mixes: Vec<GasMix>,
    o2_deco_factor: f64,
    options: SchedulerOptions,
}

impl Simulation {
    /// Fresh simulation at surface equilibrium for the gases of `plan`.
    pub fn new(plan: &DivePlan) -> Self {
        Self::with_options(plan, SchedulerOptions::default())
    }

    pub fn with_options(plan: &DivePlan, options: SchedulerOptions) -> Self {
        Self {
            tissues: TissueState::surface_equilibrium(),
            clock: RunClock::default(),
            mixes: plan.mixes.clone(),
            o2_deco_factor: plan.o2_deco_factor,
            options,
        }
    }

    pub fn tissues(&self) -> &TissueState {
        &self.tissues
    }

    pub fn clock(&self) -> RunClock {
        self.clock
    }

    fn mix(&self, mix_number: u32) -> Result<&GasMix, DecoError> {
        usize::try_from(mix_number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.mixes.get(i))
            .ok_or_else(|| DecoError::UnknownMix {
                mix: mix_number,
                context: format!("segment {}", self.clock.segment_number + 1),
            })
    }

    /// Ascend or descend linearly from `from_depth` to `to_depth`.
    ///
    /// `rate` is metres per minute, negative for ascents. Returns the segment time.
    pub fn apply_depth_change(
        &mut self,
        from_depth: f64,
        to_depth: f64,
        rate: f64,
        mix_number: u32,
    ) -> Result<f64, DecoError> {
        let mix = *self.mix(mix_number)?;
        let segment_time = if from_depth == to_depth {
            0.0
        } else {
            (to_depth - from_depth) / rate
        };
        if !segment_time.is_finite() || segment_time < 0.0 {
            return Err(DecoError::invalid("depth change rate", rate));
        }

        let gas = InertFractions {
            he: mix.he_fraction,
            n2: mix.n2_fraction,
        };
        self.tissues
            .load_linear(ambient_pressure(from_depth), rate, gas, segment_time);

        self.clock.run_time += segment_time;
        self.clock.segment_number += 1;
        self.clock.segment_time = segment_time;
        Ok(segment_time)
    }

    /// Hold at `depth` until the run clock reads `end_run_time`.
    pub fn apply_constant_depth(
        &mut self,
        depth: f64,
        end_run_time: f64,
        mix_number: u32,
    ) -> Result<f64, DecoError> {
        let mix = *self.mix(mix_number)?;
        let segment_time = end_run_time - self.clock.run_time;
        if segment_time < 0.0 {
            return Err(DecoError::NegativeSegmentTime {
                segment: self.clock.segment_number + 1,
                end_run_time,
                run_time: self.clock.run_time,
            });
        }

        let gas = InertFractions {
            he: mix.he_fraction,
            n2: mix.n2_fraction,
        };
        let (pi_he, pi_n2) = gas.inspired_at(ambient_pressure(depth));
        self.tissues.load_constant(pi_he, pi_n2, segment_time);

        // Set, not accumulate, so repeated holds do not drift.
        self.clock.run_time = end_run_time;
        self.clock.segment_number += 1;
        self.clock.segment_time = segment_time;
        Ok(segment_time)
    }

    /// Inspired fractions used while stopping on `mix`.
    ///
    /// Oxygen-rich deco gases (N2 fraction in [0, 0.2]) are weighted toward
    /// nitrogen by the O2 deco factor.
    pub fn stop_fractions(&self, mix: &GasMix) -> InertFractions {
        let n2 = if (0.0..=DECO_GAS_MAX_N2).contains(&mix.n2_fraction) {
            1.0 - self.o2_deco_factor + self.o2_deco_factor * mix.n2_fraction
        } else {
            mix.n2_fraction
        };
        InertFractions {
            he: mix.he_fraction,
            n2,
        }
    }

    /// Hold at `stop_depth` until the ceiling at `gf` is no deeper than `next_stop`.
    ///
    /// The clock first moves to the next whole minute, then extends one
    /// minute at a time.
    pub fn hold_at_stop(
        &mut self,
        stop_depth: f64,
        next_stop: f64,
        gf: f64,
        mix_number: u32,
    ) -> Result<StopHold, DecoError> {
        let mix = *self.mix(mix_number)?;
        let aligned = (self.clock.run_time + 0.5).round();
        let mut interval = aligned - self.clock.run_time;
        let mut segment_time = interval;
        self.clock.run_time = aligned;
        self.clock.segment_number += 1;

        let (pi_he, pi_n2) = self
            .stop_fractions(&mix)
            .inspired_at(ambient_pressure(stop_depth));

        let mut extensions = 0;
        loop {
            self.tissues.load_constant(pi_he, pi_n2, interval);
            let ceiling = self.tissues.ceiling(gf)?;
            if ceiling <= next_stop {
                break;
            }
            if extensions >= self.options.max_stop_minutes {
                return Err(DecoError::StopDidNotClear {
                    depth: stop_depth,
                    minutes: extensions,
                });
            }
            trace!(stop_depth, ceiling, next_stop, "extending stop by one minute");
            interval = 1.0;
            segment_time += 1.0;
            self.clock.run_time += 1.0;
            extensions += 1;
        }

        self.clock.segment_time = segment_time;
        Ok(StopHold {
            segment_time,
            extensions,
        })
    }
}
