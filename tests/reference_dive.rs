use decoplan_compute::{
    compute_deco_schedule_from_text, parse_dive_plan, plan_dive, render_report, DecoError,
    DiveReport, ReportEvent, StopWaypoint,
};

const REFERENCE_DIVE: &str = "SAMPLE DIVE TO 90 METERS OF SEAWATER GAUGE (MSWG) FOR 20 MINUTES
4
.13,.50,.37
.36,.00,.64
.50,.00,.50
.80,.00,.20
1.0
1
0,90,23,1
2
90,20,1
99
90
1,-10,3,0.75,0.30
33
2,-10,3
21
3,-10,3
9
4,-10,3
0
";

fn reference_report() -> DiveReport {
    compute_deco_schedule_from_text(REFERENCE_DIVE.to_string()).expect("reference dive runs")
}

/// Mix breathed on the ascent leg that arrives at `depth`. The switch
/// happens on arrival, so the leg into a switch depth uses the old mix.
fn ascent_mix(depth: f64) -> u32 {
    if depth >= 33.0 {
        1
    } else if depth >= 21.0 {
        2
    } else if depth >= 9.0 {
        3
    } else {
        4
    }
}

/// Mix breathed while stopped at `depth`: a stop at a switch depth is
/// already on the new mix.
fn stop_mix(depth: f64) -> u32 {
    if depth > 33.0 {
        1
    } else if depth > 21.0 {
        2
    } else if depth > 9.0 {
        3
    } else {
        4
    }
}

fn stop_at(report: &DiveReport, depth: f64) -> StopWaypoint {
    report
        .stops()
        .find(|s| s.stop_depth == depth)
        .cloned()
        .unwrap_or_else(|| panic!("no stop at {depth} m"))
}

#[test]
fn test_reference_dive_event_order() {
    let report = reference_report();
    assert!(matches!(report.events[0], ReportEvent::Heading { .. }));
    for (i, event) in report.events[1..5].iter().enumerate() {
        match event {
            ReportEvent::GasMixSummary { mix_number, .. } => assert_eq!(*mix_number, i as u32 + 1),
            other => panic!("expected gas mix summary, got {other:?}"),
        }
    }
    match &report.events[5] {
        ReportEvent::DepthChange { waypoint } => {
            assert_eq!(waypoint.segment_number, 1);
            assert!((waypoint.run_time - 90.0 / 23.0).abs() < 1e-9);
            assert!((waypoint.run_time - 3.9).abs() < 0.05);
        }
        other => panic!("expected descent, got {other:?}"),
    }
    match &report.events[6] {
        ReportEvent::ConstantDepth { waypoint } => {
            assert_eq!(waypoint.segment_number, 2);
            assert_eq!(waypoint.run_time, 20.0);
            assert_eq!(waypoint.depth, 90.0);
        }
        other => panic!("expected bottom hold, got {other:?}"),
    }
}

#[test]
fn test_reference_dive_stops() {
    let report = reference_report();
    let stops: Vec<_> = report.stops().collect();
    assert!(!stops.is_empty());

    for pair in stops.windows(2) {
        assert!(pair[1].stop_depth < pair[0].stop_depth);
    }
    for stop in &stops {
        assert_eq!(stop.stop_depth % 3.0, 0.0, "stop at {}", stop.stop_depth);
        assert_eq!(stop.mix_number, stop_mix(stop.stop_depth), "stop at {}", stop.stop_depth);
        assert!(stop.stop_time >= 1.0);
    }
    assert!(stops[0].stop_depth > 33.0);
    assert_eq!(stops[0].gradient_factor, 0.30);
    assert_eq!(stops.last().map(|s| s.stop_depth), Some(3.0));

    // Segment numbers keep increasing through the whole ascent.
    let mut last_segment = 2;
    for event in &report.events[7..] {
        let segment = match event {
            ReportEvent::Ascent { waypoint } => waypoint.segment_number,
            ReportEvent::Stop { waypoint } => waypoint.segment_number,
            other => panic!("unexpected event in deco phase {other:?}"),
        };
        assert_eq!(segment, last_segment + 1);
        last_segment = segment;
    }
}

#[test]
fn test_reference_dive_gas_switches() {
    let report = reference_report();
    for ascent in report.ascents() {
        assert_eq!(
            ascent.mix_number,
            ascent_mix(ascent.to_depth),
            "ascent to {}",
            ascent.to_depth
        );
        assert!(
            ascent.percent_m_value < 1.0,
            "M-value exceeded on arrival at {}: {}",
            ascent.to_depth,
            ascent.percent_m_value
        );
    }
}

#[test]
fn test_reference_dive_surfaces() {
    let report = reference_report();
    match report.events.last() {
        Some(ReportEvent::Ascent { waypoint }) => {
            assert_eq!(waypoint.to_depth, 0.0);
            assert_eq!(waypoint.gradient_factor, Some(0.75));
            assert_eq!(waypoint.run_time, report.summary.total_run_time);
        }
        other => panic!("expected surfacing ascent, got {other:?}"),
    }
    let summary = &report.summary;
    assert!(summary.deco_required);
    assert_eq!(summary.max_depth, 90.0);
    assert_eq!(summary.stop_count as usize, report.stops().count());
    assert!((summary.deco_time - (summary.total_run_time - 20.0)).abs() < 1e-9);
    assert!(summary.max_percent_m_value < 1.0);
}

#[test]
fn test_reference_dive_is_deterministic() {
    let plan = parse_dive_plan(REFERENCE_DIVE.to_string()).unwrap();
    assert_eq!(plan_dive(&plan).unwrap(), plan_dive(&plan).unwrap());
    assert_eq!(plan_dive(&plan).unwrap(), reference_report());
}

#[test]
fn test_reference_dive_schedule_values() {
    let report = reference_report();

    let first = report.stops().next().cloned().unwrap();
    assert_eq!(first.stop_depth, 51.0);
    assert_eq!(first.run_time, 24.0);
    assert_eq!(first.stop_time, 1.0);
    assert_eq!(first.gradient_factor, 0.30);

    let at_33 = stop_at(&report, 33.0);
    assert_eq!(at_33.mix_number, 2);
    assert_eq!(at_33.stop_time, 2.0);
    assert_eq!(at_33.run_time, 34.0);

    assert_eq!(stop_at(&report, 21.0).mix_number, 3);
    assert_eq!(stop_at(&report, 9.0).stop_time, 10.0);
    assert_eq!(stop_at(&report, 6.0).stop_time, 15.0);

    let last = stop_at(&report, 3.0);
    assert_eq!(last.stop_time, 31.0);
    assert_eq!(last.run_time, 115.0);
    assert_eq!(report.stops().count(), 17);

    let surfacing = report.ascents().last().cloned().unwrap();
    assert_eq!(surfacing.to_depth, 0.0);
    assert!((surfacing.run_time - 115.3).abs() < 1e-6, "{}", surfacing.run_time);
    assert!((surfacing.percent_m_value - 0.9123).abs() < 5e-5, "{}", surfacing.percent_m_value);
    assert_eq!(surfacing.gradient_factor, Some(0.75));
}

#[test]
fn test_o2_deco_factor_lengthens_oxygen_stops() {
    let neutral = parse_dive_plan(REFERENCE_DIVE.to_string()).unwrap();
    let mut weighted = neutral.clone();
    weighted.o2_deco_factor = 0.8;

    let neutral_report = plan_dive(&neutral).unwrap();
    let weighted_report = plan_dive(&weighted).unwrap();

    // Mix 4 has 20% N2; at factor 0.8 it is held as 36% N2.
    for depth in [9.0, 6.0, 3.0] {
        let neutral_stop = stop_at(&neutral_report, depth);
        let weighted_stop = stop_at(&weighted_report, depth);
        assert!(
            weighted_stop.stop_time > neutral_stop.stop_time,
            "stop at {depth} m: {} vs {}",
            weighted_stop.stop_time,
            neutral_stop.stop_time
        );
    }
    assert_eq!(stop_at(&weighted_report, 9.0).stop_time, 11.0);
    assert_eq!(stop_at(&weighted_report, 6.0).stop_time, 17.0);
    assert_eq!(stop_at(&weighted_report, 3.0).stop_time, 35.0);

    // Stops deeper than the oxygen switch are unaffected.
    let deep = |report: &DiveReport| {
        report
            .stops()
            .filter(|s| s.stop_depth > 9.0)
            .cloned()
            .collect::<Vec<_>>()
    };
    assert_eq!(deep(&weighted_report), deep(&neutral_report));
}

#[test]
fn test_reference_dive_renders() {
    let text = render_report(reference_report());
    assert!(text.contains("SAMPLE DIVE TO 90 METERS"));
    assert!(text.contains("DIVE PROFILE"));
    assert!(text.contains("DECOMPRESSION PROFILE"));
    assert!(text.contains("Gasmix # 4  0.800  0.000  0.200"));
}

#[test]
fn test_negative_hold_rejected_end_to_end() {
    let input = REFERENCE_DIVE.replace("90,20,1", "90,2,1");
    match compute_deco_schedule_from_text(input) {
        Err(DecoError::NegativeSegmentTime {
            segment,
            end_run_time,
            ..
        }) => {
            assert_eq!(segment, 2);
            assert_eq!(end_run_time, 2.0);
        }
        other => panic!("expected negative segment time, got {other:?}"),
    }
}

#[test]
fn test_bad_mix_rejected_before_simulation() {
    let input = REFERENCE_DIVE.replace(".50,.00,.50", ".50,.00,.40");
    assert!(matches!(
        compute_deco_schedule_from_text(input),
        Err(DecoError::MixFractions { mix: 3, .. })
    ));
}
