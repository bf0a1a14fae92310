//! Report events: collection, summary and the text table.
//!
//! The scheduler only emits structured [`ReportEvent`]s into a [`ReportSink`].
//! Rendering them as the classic fixed-width decompression table is done here,
//! after the run.

use std::fmt;

use crate::models::{
    AscentWaypoint, ConstantDepthWaypoint, DecoSummary, DepthChangeWaypoint, DiveReport,
    ReportEvent, StopWaypoint,
};

/// Receiver of report events in emission order.
pub trait ReportSink {
    fn emit(&mut self, event: ReportEvent);
}

impl ReportSink for Vec<ReportEvent> {
    fn emit(&mut self, event: ReportEvent) {
        self.push(event);
    }
}

/// Summarise a finished run from its events.
pub fn summarize(events: &[ReportEvent]) -> DecoSummary {
    let mut summary = DecoSummary {
        deco_required: false,
        first_stop_depth: None,
        stop_count: 0,
        deco_time: 0.0,
        total_run_time: 0.0,
        max_percent_m_value: 0.0,
        max_depth: 0.0,
    };
    // Run time when the profile hands over to the scheduler.
    let mut deco_start: Option<f64> = None;
    let mut last_profile_run_time = 0.0;

    for event in events {
        match event {
            ReportEvent::DepthChange { waypoint } => {
                summary.max_depth = summary
                    .max_depth
                    .max(waypoint.from_depth)
                    .max(waypoint.to_depth);
                last_profile_run_time = waypoint.run_time;
            }
            ReportEvent::ConstantDepth { waypoint } => {
                summary.max_depth = summary.max_depth.max(waypoint.depth);
                last_profile_run_time = waypoint.run_time;
            }
            ReportEvent::Ascent { waypoint } => {
                deco_start.get_or_insert(last_profile_run_time);
                summary.max_percent_m_value =
                    summary.max_percent_m_value.max(waypoint.percent_m_value);
                summary.total_run_time = waypoint.run_time;
            }
            ReportEvent::Stop { waypoint } => {
                deco_start.get_or_insert(last_profile_run_time);
                summary.deco_required = true;
                summary.first_stop_depth.get_or_insert(waypoint.stop_depth);
                summary.stop_count += 1;
            }
            ReportEvent::Heading { .. } | ReportEvent::GasMixSummary { .. } => {}
        }
    }

    summary.deco_time = deco_start.map_or(0.0, |start| summary.total_run_time - start);
    summary
}

// ============================================================================
// Text table
// ============================================================================

const RULE: &str = "------------------------------------------------------------------------------------";

/// Render a report as the fixed-width decompression table.
pub fn render(report: &DiveReport) -> String {
    report.to_string()
}

impl fmt::Display for DiveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut profile_header = false;
        let mut deco_header = false;

        for event in &self.events {
            match event {
                ReportEvent::Heading {
                    description,
                    o2_deco_factor,
                } => write_heading(f, description, *o2_deco_factor)?,
                ReportEvent::GasMixSummary { mix_number, mix } => writeln!(
                    f,
                    "                          Gasmix #{:>2}  {:5.3}  {:5.3}  {:5.3}",
                    mix_number, mix.o2_fraction, mix.he_fraction, mix.n2_fraction
                )?,
                ReportEvent::DepthChange { waypoint } => {
                    if !profile_header {
                        write_profile_header(f)?;
                        profile_header = true;
                    }
                    write_depth_change(f, waypoint)?;
                }
                ReportEvent::ConstantDepth { waypoint } => {
                    if !profile_header {
                        write_profile_header(f)?;
                        profile_header = true;
                    }
                    write_constant_depth(f, waypoint)?;
                }
                ReportEvent::Ascent { waypoint } => {
                    if !deco_header {
                        write_deco_header(f)?;
                        deco_header = true;
                    }
                    write_ascent(f, waypoint)?;
                }
                ReportEvent::Stop { waypoint } => {
                    if !deco_header {
                        write_deco_header(f)?;
                        deco_header = true;
                    }
                    write_stop(f, waypoint)?;
                }
            }
        }
        Ok(())
    }
}

fn write_heading(f: &mut fmt::Formatter<'_>, description: &str, o2_deco_factor: f64) -> fmt::Result {
    writeln!(f, "{:^84}", "DECOMPRESSION CALCULATION PROGRAM")?;
    writeln!(f)?;
    writeln!(f, "Description:    {description}")?;
    writeln!(f)?;
    writeln!(
        f,
        "O2 Deco Factor: nitrox/O2 deco gases weighted at {:.0}% of their O2 fraction",
        o2_deco_factor * 100.0
    )?;
    writeln!(f)?;
    writeln!(f, "Gasmix Summary:                        FO2    FHe    FN2")
}

fn write_profile_header(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{:^84}", "DIVE PROFILE")?;
    writeln!(f)?;
    writeln!(f, "Seg   Segm.  Run    | Mix | Direction  From    To      Rate      | Constant")?;
    writeln!(f, "  #   (min)  (min)  |  #  |            (msw)   (msw)   (msw/min) | (msw)")?;
    writeln!(f, "{RULE}")
}

fn write_deco_header(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{:^84}", "DECOMPRESSION PROFILE")?;
    writeln!(f)?;
    writeln!(f, "Seg   Segm.  Run    | Mix | To     Rate      Max    | Stop   Stop   Run    GF     Ctl")?;
    writeln!(f, "  #   (min)  (min)  |  #  | (msw)  (msw/min) %M     | (msw)  (min)  (min)         cpt")?;
    writeln!(f, "{RULE}")
}

fn write_depth_change(f: &mut fmt::Formatter<'_>, w: &DepthChangeWaypoint) -> fmt::Result {
    writeln!(
        f,
        "{:>3}   {:>5.1}  {:>6.1} | {:>3} | {:<9} {:>6.0}  {:>6.0}  {:>8.1}  |",
        w.segment_number,
        w.segment_time,
        w.run_time,
        w.mix_number,
        w.direction.label(),
        w.from_depth,
        w.to_depth,
        w.rate
    )
}

fn write_constant_depth(f: &mut fmt::Formatter<'_>, w: &ConstantDepthWaypoint) -> fmt::Result {
    writeln!(
        f,
        "{:>3}   {:>5.1}  {:>6.1} | {:>3} | {:42}| {:>6.0}",
        w.segment_number, w.segment_time, w.run_time, w.mix_number, "", w.depth
    )
}

fn write_ascent(f: &mut fmt::Formatter<'_>, w: &AscentWaypoint) -> fmt::Result {
    write!(
        f,
        "{:>3}   {:>5.1}  {:>6.1} | {:>3} | {:>4.0}   {:>6.1}   {:>5.1}% |",
        w.segment_number,
        w.segment_time,
        w.run_time,
        w.mix_number,
        w.to_depth,
        w.rate,
        w.percent_m_value * 100.0
    )?;
    if let Some(gf) = w.gradient_factor {
        write!(f, "{:>27.2}", gf)?;
    }
    writeln!(f)
}

fn write_stop(f: &mut fmt::Formatter<'_>, w: &StopWaypoint) -> fmt::Result {
    writeln!(
        f,
        "{:>3}   {:>5.1}  {:>6} | {:>3} | {:26}| {:>4}   {:>4}   {:>4}   {:>5.2}  {:>3}",
        w.segment_number,
        w.segment_time,
        "",
        w.mix_number,
        "",
        w.stop_depth,
        w.stop_time,
        w.run_time,
        w.gradient_factor,
        w.leading_compartment
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, GasMix};

    fn sample_events() -> Vec<ReportEvent> {
        let mut events = Vec::new();
        events.emit(ReportEvent::Heading {
            description: "TEST DIVE".to_string(),
            o2_deco_factor: 1.0,
        });
        events.emit(ReportEvent::GasMixSummary {
            mix_number: 1,
            mix: GasMix::new(0.21, 0.0, 0.79),
        });
        events.emit(ReportEvent::DepthChange {
            waypoint: DepthChangeWaypoint {
                segment_number: 1,
                segment_time: 2.0,
                run_time: 2.0,
                mix_number: 1,
                direction: Direction::Descent,
                from_depth: 0.0,
                to_depth: 40.0,
                rate: 20.0,
            },
        });
        events.emit(ReportEvent::ConstantDepth {
            waypoint: ConstantDepthWaypoint {
                segment_number: 2,
                segment_time: 23.0,
                run_time: 25.0,
                mix_number: 1,
                depth: 40.0,
            },
        });
        events.emit(ReportEvent::Ascent {
            waypoint: AscentWaypoint {
                segment_number: 3,
                segment_time: 0.4,
                run_time: 25.4,
                mix_number: 1,
                to_depth: 36.0,
                rate: -10.0,
                percent_m_value: 0.62,
                gradient_factor: None,
            },
        });
        events.emit(ReportEvent::Stop {
            waypoint: StopWaypoint {
                segment_number: 4,
                segment_time: 3.6,
                mix_number: 1,
                stop_depth: 6.0,
                stop_time: 4.0,
                run_time: 32.0,
                gradient_factor: 0.3,
                leading_compartment: 4,
            },
        });
        events.emit(ReportEvent::Ascent {
            waypoint: AscentWaypoint {
                segment_number: 5,
                segment_time: 0.6,
                run_time: 40.0,
                mix_number: 1,
                to_depth: 0.0,
                rate: -10.0,
                percent_m_value: 0.81,
                gradient_factor: Some(0.85),
            },
        });
        events
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&sample_events());
        assert!(summary.deco_required);
        assert_eq!(summary.first_stop_depth, Some(6.0));
        assert_eq!(summary.stop_count, 1);
        assert_eq!(summary.max_depth, 40.0);
        assert_eq!(summary.total_run_time, 40.0);
        assert!((summary.deco_time - 15.0).abs() < 1e-12);
        assert!((summary.max_percent_m_value - 0.81).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert!(!summary.deco_required);
        assert_eq!(summary.first_stop_depth, None);
        assert_eq!(summary.deco_time, 0.0);
    }

    #[test]
    fn test_render_sections() {
        let events = sample_events();
        let summary = summarize(&events);
        let text = render(&DiveReport { events, summary });
        assert!(text.contains("Description:    TEST DIVE"));
        assert!(text.contains("Gasmix # 1  0.210  0.000  0.790"));
        assert!(text.contains("DIVE PROFILE"));
        assert!(text.contains("DECOMPRESSION PROFILE"));
        assert!(text.contains("Descent"));
        assert!(text.contains("62.0%"));
        assert!(text.contains("0.85"));
        assert_eq!(text.matches("DECOMPRESSION PROFILE").count(), 1);
    }

    #[test]
    fn test_stop_row_and_display() {
        let events = sample_events();
        let summary = summarize(&events);
        let report = DiveReport { events, summary };
        let text = report.to_string();
        assert_eq!(text, render(&report));
        let row = text
            .lines()
            .find(|line| line.starts_with("  4 "))
            .expect("stop row");
        assert!(row.ends_with("   6      4     32    0.30    4"), "{row}");
    }
}
