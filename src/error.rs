use thiserror::Error;

/// Error type for dive plan loading and decompression scheduling.
///
/// Every variant aborts the run: the computation is deterministic, so there is
/// nothing to retry and no partial schedule is returned.
#[derive(Error, Debug, Clone, PartialEq, uniffi::Error)]
pub enum DecoError {
    #[error("parse error at token {token}: {message}")]
    Parse { token: u32, message: String },

    #[error("invalid JSON dive plan: {message}")]
    Json { message: String },

    #[error("gas mix #{mix} fractions sum to {sum}, expected 1")]
    MixFractions { mix: u32, sum: f64 },

    #[error("unknown profile code {code} for segment {segment}")]
    UnknownSegmentCode { segment: u32, code: i64 },

    #[error("unknown gas mix #{mix} referenced by {context}")]
    UnknownMix { mix: u32, context: String },

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("segment {segment} ends at run time {end_run_time} before current run time {run_time}")]
    NegativeSegmentTime {
        segment: u32,
        end_run_time: f64,
        run_time: f64,
    },

    #[error("compartment {compartment} has zero combined inert gas tension")]
    NumericDegeneracy { compartment: u32 },

    #[error("ceiling did not clear after {minutes} minutes at stop depth {depth}")]
    StopDidNotClear { depth: f64, minutes: u32 },
}

impl DecoError {
    pub(crate) fn invalid(name: &str, value: f64) -> Self {
        DecoError::InvalidParameter {
            name: name.to_string(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deco_error_display() {
        let err = DecoError::Parse {
            token: 5,
            message: "expected a number".to_string(),
        };
        assert_eq!(err.to_string(), "parse error at token 5: expected a number");

        let err = DecoError::MixFractions { mix: 2, sum: 0.9 };
        assert_eq!(err.to_string(), "gas mix #2 fractions sum to 0.9, expected 1");

        let err = DecoError::UnknownSegmentCode {
            segment: 3,
            code: 7,
        };
        assert_eq!(err.to_string(), "unknown profile code 7 for segment 3");

        let err = DecoError::invalid("step size", 0.0);
        assert_eq!(err.to_string(), "invalid value for step size: 0");

        let err = DecoError::NegativeSegmentTime {
            segment: 2,
            end_run_time: 10.0,
            run_time: 12.5,
        };
        assert_eq!(
            err.to_string(),
            "segment 2 ends at run time 10 before current run time 12.5"
        );
    }
}
