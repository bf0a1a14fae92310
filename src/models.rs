use serde::{Deserialize, Serialize};

/// Breathing gas fractions. Mixes are numbered from 1 in the order they are
/// listed in a plan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct GasMix {
    pub o2_fraction: f64,
    pub he_fraction: f64,
    pub n2_fraction: f64,
}

impl GasMix {
    pub fn new(o2_fraction: f64, he_fraction: f64, n2_fraction: f64) -> Self {
        Self {
            o2_fraction,
            he_fraction,
            n2_fraction,
        }
    }

    pub fn fraction_sum(&self) -> f64 {
        self.o2_fraction + self.he_fraction + self.n2_fraction
    }
}

/// One leg of the pre-decompression profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiveSegment {
    /// Linear ascent or descent. `rate` is in metres per minute, positive
    /// down and negative up.
    DepthChange {
        from_depth: f64,
        to_depth: f64,
        rate: f64,
        mix_number: u32,
    },
    /// Hold at `depth` until the run clock reads `end_run_time`.
    ConstantDepth {
        depth: f64,
        end_run_time: f64,
        mix_number: u32,
    },
}

impl DiveSegment {
    pub fn mix_number(&self) -> u32 {
        match self {
            DiveSegment::DepthChange { mix_number, .. }
            | DiveSegment::ConstantDepth { mix_number, .. } => *mix_number,
        }
    }
}

/// Deco parameter change that takes effect when the ascent reaches `depth`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct GasSwitch {
    pub depth: f64,
    pub mix_number: u32,
    pub ascent_rate: f64,
    pub step_size: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DecoParameters {
    /// Depth the decompression ascent starts from (normally the last profile depth).
    pub start_depth: f64,
    pub mix_number: u32,
    /// Metres per minute, negative.
    pub ascent_rate: f64,
    /// Distance between deco stops once the first stop is owed.
    pub step_size: f64,
    pub gf_high: f64,
    pub gf_low: f64,
    /// Scheduled switches, deepest first. The list ends where the legacy
    /// format writes a switch depth of 0.
    #[serde(default)]
    pub switches: Vec<GasSwitch>,
}

/// A complete dive plan: gases, profile and decompression settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DivePlan {
    pub description: String,
    pub mixes: Vec<GasMix>,
    /// Weighting applied to nitrogen in oxygen-rich deco gases (0 < f <= 1).
    pub o2_deco_factor: f64,
    pub segments: Vec<DiveSegment>,
    pub deco: DecoParameters,
}

impl DivePlan {
    /// Look up a mix by its 1-based mix number.
    pub fn mix(&self, mix_number: u32) -> Option<&GasMix> {
        let index = usize::try_from(mix_number).ok()?.checked_sub(1)?;
        self.mixes.get(index)
    }
}

// ============================================================================
// Report records
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum Direction {
    Ascent,
    Descent,
    /// Start and end depth are equal. Kept as reported, not rejected.
    Invalid,
}

impl Direction {
    pub fn between(from_depth: f64, to_depth: f64) -> Self {
        if to_depth > from_depth {
            Direction::Descent
        } else if from_depth > to_depth {
            Direction::Ascent
        } else {
            Direction::Invalid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Ascent => "Ascent",
            Direction::Descent => "Descent",
            Direction::Invalid => "ERROR",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DepthChangeWaypoint {
    pub segment_number: u32,
    pub segment_time: f64,
    pub run_time: f64,
    pub mix_number: u32,
    pub direction: Direction,
    pub from_depth: f64,
    pub to_depth: f64,
    pub rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct ConstantDepthWaypoint {
    pub segment_number: u32,
    pub segment_time: f64,
    pub run_time: f64,
    pub mix_number: u32,
    pub depth: f64,
}

/// Ascent leg of the decompression phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct AscentWaypoint {
    pub segment_number: u32,
    pub segment_time: f64,
    pub run_time: f64,
    pub mix_number: u32,
    pub to_depth: f64,
    pub rate: f64,
    /// Highest fraction of the M-value across compartments on arrival. Not clamped.
    pub percent_m_value: f64,
    /// Gradient factor in force on surfacing; `None` for intermediate legs.
    pub gradient_factor: Option<f64>,
}

/// A completed decompression stop. Depth, duration and run time are floored
/// to whole units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct StopWaypoint {
    pub segment_number: u32,
    pub segment_time: f64,
    pub mix_number: u32,
    pub stop_depth: f64,
    pub stop_time: f64,
    pub run_time: f64,
    pub gradient_factor: f64,
    /// Compartment (1-16) that held the diver at this stop.
    pub leading_compartment: u32,
}

/// Structured report events, in emission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEvent {
    Heading {
        description: String,
        o2_deco_factor: f64,
    },
    GasMixSummary {
        mix_number: u32,
        mix: GasMix,
    },
    DepthChange {
        waypoint: DepthChangeWaypoint,
    },
    ConstantDepth {
        waypoint: ConstantDepthWaypoint,
    },
    Ascent {
        waypoint: AscentWaypoint,
    },
    Stop {
        waypoint: StopWaypoint,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DecoSummary {
    pub deco_required: bool,
    pub first_stop_depth: Option<f64>,
    pub stop_count: u32,
    /// Minutes from the start of the decompression ascent to surfacing.
    pub deco_time: f64,
    pub total_run_time: f64,
    pub max_percent_m_value: f64,
    pub max_depth: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DiveReport {
    pub events: Vec<ReportEvent>,
    pub summary: DecoSummary,
}

impl DiveReport {
    pub fn stops(&self) -> impl Iterator<Item = &StopWaypoint> {
        self.events.iter().filter_map(|e| match e {
            ReportEvent::Stop { waypoint } => Some(waypoint),
            _ => None,
        })
    }

    pub fn ascents(&self) -> impl Iterator<Item = &AscentWaypoint> {
        self.events.iter().filter_map(|e| match e {
            ReportEvent::Ascent { waypoint } => Some(waypoint),
            _ => None,
        })
    }
}
