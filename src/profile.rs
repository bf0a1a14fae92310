//! Replays the pre-decompression profile against the tissue model.

use tracing::{debug, warn};

use crate::error::DecoError;
use crate::models::{ConstantDepthWaypoint, DepthChangeWaypoint, Direction, DiveSegment, ReportEvent};
use crate::report::ReportSink;
use crate::simulation::Simulation;

/// Apply each segment in order, emitting one waypoint per segment.
///
/// Returns the depth at the end of the profile. The end of `segments` hands
/// control to the decompression scheduler.
pub fn run_profile<S: ReportSink>(
    sim: &mut Simulation,
    segments: &[DiveSegment],
    sink: &mut S,
) -> Result<f64, DecoError> {
    let mut depth = 0.0;
    for segment in segments {
        match *segment {
            DiveSegment::DepthChange {
                from_depth,
                to_depth,
                rate,
                mix_number,
            } => {
                let direction = Direction::between(from_depth, to_depth);
                if direction == Direction::Invalid {
                    warn!(
                        segment = sim.clock().segment_number + 1,
                        depth = from_depth,
                        "depth change segment starts and ends at the same depth"
                    );
                }
                let segment_time = sim.apply_depth_change(from_depth, to_depth, rate, mix_number)?;
                let clock = sim.clock();
                debug!(
                    segment = clock.segment_number,
                    from_depth, to_depth, segment_time, run_time = clock.run_time,
                    "applied depth change"
                );
                sink.emit(ReportEvent::DepthChange {
                    waypoint: DepthChangeWaypoint {
                        segment_number: clock.segment_number,
                        segment_time,
                        run_time: clock.run_time,
                        mix_number,
                        direction,
                        from_depth,
                        to_depth,
                        rate,
                    },
                });
                depth = to_depth;
            }
            DiveSegment::ConstantDepth {
                depth: hold_depth,
                end_run_time,
                mix_number,
            } => {
                let segment_time = sim.apply_constant_depth(hold_depth, end_run_time, mix_number)?;
                let clock = sim.clock();
                debug!(
                    segment = clock.segment_number,
                    depth = hold_depth,
                    segment_time,
                    run_time = clock.run_time,
                    "applied constant depth"
                );
                sink.emit(ReportEvent::ConstantDepth {
                    waypoint: ConstantDepthWaypoint {
                        segment_number: clock.segment_number,
                        segment_time,
                        run_time: clock.run_time,
                        mix_number,
                        depth: hold_depth,
                    },
                });
                depth = hold_depth;
            }
        }
    }
    Ok(depth)
}
