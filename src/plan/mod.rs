//! Dive plan loading and validation.
//!
//! Plans arrive either in the legacy token format (see [`parser`]) or as JSON.
//! Both paths validate the whole plan before any tissue computation.
//!
//! # Example
//!
//! ```
//! use decoplan_compute::plan::parse;
//!
//! let plan = parse(
//!     "SHORT AIR DIVE\n1\n.21,0,.79\n1.0\n1\n0,18,18,1\n2\n18,40,1\n99\n18\n1,-10,3,0.85,0.40\n0",
//! )
//! .expect("plan should parse");
//! assert_eq!(plan.mixes.len(), 1);
//! assert_eq!(plan.segments.len(), 2);
//! ```

pub mod parser;

pub use parser::parse;

use crate::error::DecoError;
use crate::models::{DecoParameters, DivePlan, DiveSegment, GasMix};

/// Allowed deviation of a mix's fraction sum from 1.
pub const FRACTION_TOLERANCE: f64 = 1e-9;

impl DivePlan {
    /// Deserialise a plan from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, DecoError> {
        let plan: DivePlan = serde_json::from_str(json).map_err(|e| DecoError::Json {
            message: e.to_string(),
        })?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn to_json(&self) -> Result<String, DecoError> {
        serde_json::to_string_pretty(self).map_err(|e| DecoError::Json {
            message: e.to_string(),
        })
    }

    /// Check gases, profile and deco parameters for consistency.
    pub fn validate(&self) -> Result<(), DecoError> {
        for (i, mix) in self.mixes.iter().enumerate() {
            validate_mix(i as u32 + 1, mix)?;
        }

        if !(self.o2_deco_factor > 0.0 && self.o2_deco_factor <= 1.0) {
            return Err(DecoError::invalid("O2 deco factor", self.o2_deco_factor));
        }

        for (i, segment) in self.segments.iter().enumerate() {
            let context = format!("profile segment {}", i + 1);
            self.require_mix(segment.mix_number(), &context)?;
            validate_segment(segment)?;
        }

        self.validate_deco(&self.deco)
    }

    fn require_mix(&self, mix_number: u32, context: &str) -> Result<(), DecoError> {
        match self.mix(mix_number) {
            Some(_) => Ok(()),
            None => Err(DecoError::UnknownMix {
                mix: mix_number,
                context: context.to_string(),
            }),
        }
    }

    fn validate_deco(&self, deco: &DecoParameters) -> Result<(), DecoError> {
        deco.validate()?;
        self.require_mix(deco.mix_number, "deco parameters")?;
        for switch in &deco.switches {
            self.require_mix(switch.mix_number, &format!("gas switch at {}", switch.depth))?;
        }
        Ok(())
    }
}

impl DecoParameters {
    /// Check depths, rates, step sizes and gradient factors. Mix numbers
    /// are checked against the plan by [`DivePlan::validate`].
    pub fn validate(&self) -> Result<(), DecoError> {
        require_depth("deco start depth", self.start_depth)?;
        require_ascent_rate(self.ascent_rate)?;
        require_step_size(self.step_size)?;
        for (name, gf) in [("GF high", self.gf_high), ("GF low", self.gf_low)] {
            if !(gf > 0.0 && gf <= 1.0) {
                return Err(DecoError::invalid(name, gf));
            }
        }

        for switch in &self.switches {
            if !(switch.depth > 0.0) {
                return Err(DecoError::invalid("gas switch depth", switch.depth));
            }
            require_ascent_rate(switch.ascent_rate)?;
            require_step_size(switch.step_size)?;
        }
        Ok(())
    }
}

fn validate_mix(mix_number: u32, mix: &GasMix) -> Result<(), DecoError> {
    let in_range = [mix.o2_fraction, mix.he_fraction, mix.n2_fraction]
        .iter()
        .all(|f| (0.0..=1.0).contains(f));
    let sum = mix.fraction_sum();
    if !in_range || (sum - 1.0).abs() > FRACTION_TOLERANCE {
        return Err(DecoError::MixFractions {
            mix: mix_number,
            sum,
        });
    }
    Ok(())
}

fn validate_segment(segment: &DiveSegment) -> Result<(), DecoError> {
    match *segment {
        DiveSegment::DepthChange {
            from_depth,
            to_depth,
            rate,
            ..
        } => {
            require_depth("segment start depth", from_depth)?;
            require_depth("segment end depth", to_depth)?;
            let wrong_sign = (to_depth > from_depth && !(rate > 0.0))
                || (to_depth < from_depth && !(rate < 0.0));
            if wrong_sign || !rate.is_finite() {
                return Err(DecoError::invalid("depth change rate", rate));
            }
        }
        DiveSegment::ConstantDepth {
            depth,
            end_run_time,
            ..
        } => {
            require_depth("segment depth", depth)?;
            if !end_run_time.is_finite() {
                return Err(DecoError::invalid("segment end run time", end_run_time));
            }
        }
    }
    Ok(())
}

fn require_depth(name: &str, depth: f64) -> Result<(), DecoError> {
    if depth.is_finite() && depth >= 0.0 {
        Ok(())
    } else {
        Err(DecoError::invalid(name, depth))
    }
}

fn require_ascent_rate(rate: f64) -> Result<(), DecoError> {
    if rate.is_finite() && rate < 0.0 {
        Ok(())
    } else {
        Err(DecoError::invalid("deco ascent rate", rate))
    }
}

fn require_step_size(step: f64) -> Result<(), DecoError> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(DecoError::invalid("step size", step))
    }
}
