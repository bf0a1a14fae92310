pub mod buhlmann;
pub mod error;
pub mod models;
pub mod plan;
pub mod profile;
pub mod report;
pub mod schedule;
pub mod simulation;

uniffi::setup_scaffolding!();

use tracing::{debug, warn};

pub use buhlmann::TissueState;
pub use error::DecoError;
pub use models::{
    AscentWaypoint, ConstantDepthWaypoint, DecoParameters, DecoSummary, DepthChangeWaypoint,
    Direction, DivePlan, DiveReport, DiveSegment, GasMix, GasSwitch, ReportEvent, StopWaypoint,
};
pub use report::ReportSink;
pub use schedule::DecoScheduler;
pub use simulation::{RunClock, SchedulerOptions, Simulation};

/// Compute the full decompression schedule for `plan`.
pub fn plan_dive(plan: &DivePlan) -> Result<DiveReport, DecoError> {
    plan_dive_with_options(plan, SchedulerOptions::default())
}

pub fn plan_dive_with_options(
    plan: &DivePlan,
    options: SchedulerOptions,
) -> Result<DiveReport, DecoError> {
    let mut events = Vec::new();
    run_plan(plan, options, &mut events)?;
    let summary = report::summarize(&events);
    debug!(
        stops = summary.stop_count,
        run_time = summary.total_run_time,
        "decompression schedule complete"
    );
    Ok(DiveReport { events, summary })
}

/// Run `plan` and stream its report events into `sink`.
///
/// The plan is validated before any tissue computation. On error the events
/// already emitted are not a usable partial schedule.
pub fn run_plan<S: ReportSink>(
    plan: &DivePlan,
    options: SchedulerOptions,
    sink: &mut S,
) -> Result<(), DecoError> {
    plan.validate()?;

    sink.emit(ReportEvent::Heading {
        description: plan.description.clone(),
        o2_deco_factor: plan.o2_deco_factor,
    });
    for (i, mix) in plan.mixes.iter().enumerate() {
        sink.emit(ReportEvent::GasMixSummary {
            mix_number: i as u32 + 1,
            mix: *mix,
        });
    }

    let mut sim = Simulation::with_options(plan, options);
    let end_depth = profile::run_profile(&mut sim, &plan.segments, sink)?;
    if end_depth != plan.deco.start_depth {
        warn!(
            profile_end = end_depth,
            deco_start = plan.deco.start_depth,
            "decompression starts at a different depth than the profile ends"
        );
    }
    DecoScheduler::new(&mut sim, sink, &plan.deco)?.run()
}

// ============================================================================
// FFI
// ============================================================================

#[uniffi::export]
pub fn parse_dive_plan(text: String) -> Result<DivePlan, DecoError> {
    plan::parse(&text)
}

#[uniffi::export]
pub fn dive_plan_from_json(json: String) -> Result<DivePlan, DecoError> {
    DivePlan::from_json(&json)
}

#[uniffi::export]
pub fn compute_deco_schedule(plan: DivePlan) -> Result<DiveReport, DecoError> {
    plan_dive(&plan)
}

#[uniffi::export]
pub fn compute_deco_schedule_from_text(text: String) -> Result<DiveReport, DecoError> {
    let plan = plan::parse(&text)?;
    plan_dive(&plan)
}

#[uniffi::export]
pub fn render_report(report: DiveReport) -> String {
    report::render(&report)
}
