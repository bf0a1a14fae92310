//! Decompression ascent scheduler.
//!
//! Starting from the deco start depth the diver ascends in fixed 3 m
//! candidate steps while the ceiling allows it. Once the ceiling is deeper
//! than the next candidate a stop is owed at the current depth; from then on
//! every depth is a stop, spaced by the configured step size, held in whole
//! minutes until the ceiling at the interpolated gradient factor clears the
//! next stop.

use std::collections::VecDeque;

use tracing::debug;

use crate::buhlmann::ambient_pressure;
use crate::error::DecoError;
use crate::models::{AscentWaypoint, DecoParameters, GasSwitch, ReportEvent, StopWaypoint};
use crate::report::ReportSink;
use crate::simulation::Simulation;

/// Spacing of candidate depths before the first stop, independent of the step size.
pub const CANDIDATE_STEP: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    AscendingWithoutStop { depth: f64, candidate: f64 },
    Stopped { stop_depth: f64, next_stop: f64 },
    Surfaced,
}

/// First candidate stop depth below `start_depth`: the multiple of 3 at
/// `floor(start / 3 - 0.5) * 3`, never negative.
pub fn first_candidate(start_depth: f64) -> f64 {
    let trial = ((start_depth / CANDIDATE_STEP) - 0.5).floor() * CANDIDATE_STEP;
    if trial <= 0.0 {
        0.0
    } else {
        trial
    }
}

pub struct DecoScheduler<'a, S: ReportSink> {
    sim: &'a mut Simulation,
    sink: &'a mut S,
    start_depth: f64,
    mix_number: u32,
    ascent_rate: f64,
    step_size: f64,
    gf_high: f64,
    gf_low: f64,
    switches: VecDeque<GasSwitch>,
    gf: f64,
    /// Set once, at the depth where the first stop is owed.
    gf_slope: f64,
    /// Run time at the end of the previous stop.
    last_stop_run_time: Option<f64>,
}

impl<'a, S: ReportSink> DecoScheduler<'a, S> {
    /// Set up a scheduler over `sim`. Fails if `params` would not let the
    /// ascent reach the surface (non-negative rate, zero step size).
    pub fn new(
        sim: &'a mut Simulation,
        sink: &'a mut S,
        params: &DecoParameters,
    ) -> Result<Self, DecoError> {
        params.validate()?;
        Ok(Self {
            sim,
            sink,
            start_depth: params.start_depth,
            mix_number: params.mix_number,
            ascent_rate: params.ascent_rate,
            step_size: params.step_size,
            gf_high: params.gf_high,
            gf_low: params.gf_low,
            switches: params.switches.iter().copied().collect(),
            gf: params.gf_low,
            gf_slope: 0.0,
            last_stop_run_time: None,
        })
    }

    /// Drive the ascent to the surface.
    pub fn run(mut self) -> Result<(), DecoError> {
        let mut phase = Phase::AscendingWithoutStop {
            depth: self.start_depth,
            candidate: first_candidate(self.start_depth),
        };
        loop {
            phase = match phase {
                Phase::AscendingWithoutStop { depth, candidate } => {
                    self.ascend_without_stop(depth, candidate)?
                }
                Phase::Stopped {
                    stop_depth,
                    next_stop,
                } => self.process_stop(stop_depth, next_stop)?,
                Phase::Surfaced => return Ok(()),
            };
        }
    }

    fn ascend_without_stop(&mut self, depth: f64, candidate: f64) -> Result<Phase, DecoError> {
        let ceiling = self.sim.tissues().ceiling(self.gf)?;
        if ceiling > candidate {
            self.gf_slope = if depth > 0.0 {
                (self.gf_high - self.gf_low) / (0.0 - depth)
            } else {
                0.0
            };
            debug!(depth, ceiling, candidate, slope = self.gf_slope, "first stop owed");
            return Ok(Phase::Stopped {
                stop_depth: depth,
                next_stop: candidate,
            });
        }

        self.ascend(depth, candidate)?;
        if candidate == 0.0 {
            return Ok(Phase::Surfaced);
        }
        self.apply_switch(candidate);
        Ok(Phase::AscendingWithoutStop {
            depth: candidate,
            candidate: (candidate - CANDIDATE_STEP).max(0.0),
        })
    }

    fn process_stop(&mut self, stop_depth: f64, next_stop: f64) -> Result<Phase, DecoError> {
        // The label belongs to this stop; the limit used to leave it is the
        // one interpolated at the next stop.
        let stop_gf = self.gf;
        self.gf = next_stop * self.gf_slope + self.gf_high;

        let hold = self
            .sim
            .hold_at_stop(stop_depth, next_stop, self.gf, self.mix_number)?;
        let leading_compartment = self.sim.tissues().leading_compartment(self.gf)?;
        let clock = self.sim.clock();
        let stop_time = match self.last_stop_run_time {
            None => (hold.segment_time + 0.5).round(),
            Some(previous) => clock.run_time - previous,
        };
        debug!(
            stop_depth,
            stop_time,
            extensions = hold.extensions,
            run_time = clock.run_time,
            gf = stop_gf,
            "deco stop"
        );
        self.sink.emit(ReportEvent::Stop {
            waypoint: StopWaypoint {
                segment_number: clock.segment_number,
                segment_time: hold.segment_time,
                mix_number: self.mix_number,
                stop_depth: stop_depth.floor(),
                stop_time: stop_time.floor(),
                run_time: clock.run_time.floor(),
                gradient_factor: stop_gf,
                leading_compartment,
            },
        });
        self.last_stop_run_time = Some(clock.run_time);

        self.ascend(stop_depth, next_stop)?;
        if next_stop == 0.0 {
            return Ok(Phase::Surfaced);
        }
        self.apply_switch(next_stop);
        Ok(Phase::Stopped {
            stop_depth: next_stop,
            next_stop: (next_stop - self.step_size).max(0.0),
        })
    }

    /// Ascend to `to_depth` on the active gas and report the leg.
    fn ascend(&mut self, from_depth: f64, to_depth: f64) -> Result<(), DecoError> {
        let segment_time =
            self.sim
                .apply_depth_change(from_depth, to_depth, self.ascent_rate, self.mix_number)?;
        let percent_m_value = self
            .sim
            .tissues()
            .percent_m_value(ambient_pressure(to_depth))?;
        let clock = self.sim.clock();
        self.sink.emit(ReportEvent::Ascent {
            waypoint: AscentWaypoint {
                segment_number: clock.segment_number,
                segment_time,
                run_time: clock.run_time,
                mix_number: self.mix_number,
                to_depth,
                rate: self.ascent_rate,
                percent_m_value,
                gradient_factor: (to_depth == 0.0).then_some(self.gf),
            },
        });
        Ok(())
    }

    /// Take on the next deco parameters when `depth` is the scheduled switch depth.
    fn apply_switch(&mut self, depth: f64) {
        if self.switches.front().is_some_and(|s| s.depth == depth) {
            if let Some(switch) = self.switches.pop_front() {
                debug!(
                    depth,
                    mix = switch.mix_number,
                    rate = switch.ascent_rate,
                    step = switch.step_size,
                    "gas switch"
                );
                self.mix_number = switch.mix_number;
                self.ascent_rate = switch.ascent_rate;
                self.step_size = switch.step_size;
            }
        }
    }
}
