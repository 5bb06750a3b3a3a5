use marktrack_analysis::calibration::ScaleFactor;
use marktrack_analysis::summary::SummaryOutcome;
use marktrack_analysis::tracker::{
    FrameInput, FrameTracker, StepOutcome, TrackerConfig, TrackerState,
};
use marktrack_common::clock::FrameClock;
use marktrack_model::sample::MarkerDetection;
use marktrack_model::series::MarkerPair;
use proptest::prelude::*;

fn run(fps: f64, scale: Option<f64>, frames: Vec<Vec<MarkerDetection>>) -> FrameTracker {
    let mut tracker = FrameTracker::new(TrackerConfig {
        clock: FrameClock::new(fps).unwrap(),
        scale: scale.map(|s| ScaleFactor::new(s).unwrap()),
        pair: MarkerPair::default(),
    });
    for detections in frames {
        tracker.step(FrameInput::Frame(detections)).unwrap();
    }
    tracker.step(FrameInput::EndOfStream).unwrap();
    tracker
}

#[test]
fn thirty_fps_pair_displacement_over_one_second() {
    // 2 px per mm: marker 0 at y=100mm, marker 1 at y=150mm then 120mm.
    let mut frames = vec![Vec::new(); 31];
    frames[0] = vec![
        MarkerDetection::square(0, 50.0, 200.0, 10.0),
        MarkerDetection::square(1, 50.0, 300.0, 10.0),
    ];
    frames[30] = vec![
        MarkerDetection::square(0, 50.0, 200.0, 10.0),
        MarkerDetection::square(1, 50.0, 240.0, 10.0),
    ];

    let tracker = run(30.0, Some(2.0), frames);
    let output = tracker.finish();
    assert_eq!(output.state, TrackerState::Finished);
    assert_eq!(output.frames_read, 31);
    assert_eq!(output.store.len(), 2);

    let points = output.series.points();
    assert_eq!(points.len(), 2);
    assert!((points[0].timestamp.seconds - 0.0).abs() < 1e-12);
    assert!((points[0].separation - 50.0).abs() < 1e-9);
    assert!((points[1].timestamp.seconds - 1.0).abs() < 1e-12);
    assert!((points[1].separation - 20.0).abs() < 1e-9);

    let SummaryOutcome::Displacement(summary) = SummaryOutcome::from_series(&output.series) else {
        panic!("expected a displacement summary");
    };
    assert!((summary.net + 30.0).abs() < 1e-9);
}

#[test]
fn target_never_seen_yields_no_co_occurrence() {
    let frames = (0..20)
        .map(|i| vec![MarkerDetection::square(0, 10.0, 10.0 + i as f64, 3.0)])
        .collect();
    let output = run(25.0, None, frames).finish();
    assert_eq!(output.store.len(), 20);
    assert!(output.series.is_empty());
    assert_eq!(
        SummaryOutcome::from_series(&output.series),
        SummaryOutcome::NoCoOccurrence
    );
}

#[test]
fn cancellation_keeps_partial_series() {
    let mut tracker = FrameTracker::new(TrackerConfig {
        clock: FrameClock::new(30.0).unwrap(),
        scale: None,
        pair: MarkerPair::default(),
    });
    let pair = vec![
        MarkerDetection::square(0, 0.0, 10.0, 2.0),
        MarkerDetection::square(1, 0.0, 40.0, 2.0),
    ];
    tracker.step(FrameInput::Frame(pair.clone())).unwrap();
    tracker.step(FrameInput::Frame(pair.clone())).unwrap();
    assert_eq!(
        tracker.step(FrameInput::Cancelled).unwrap(),
        StepOutcome::Halted(TrackerState::Stopped)
    );
    assert_eq!(
        tracker.step(FrameInput::Frame(pair)).unwrap(),
        StepOutcome::Halted(TrackerState::Stopped)
    );

    let output = tracker.finish();
    assert_eq!(output.series.len(), 2);
    assert!(SummaryOutcome::from_series(&output.series).summary().is_some());
}

fn frame_strategy() -> impl Strategy<Value = Vec<MarkerDetection>> {
    proptest::collection::vec(
        (0u32..4, 0.0f64..640.0, 0.0f64..480.0)
            .prop_map(|(id, x, y)| MarkerDetection::square(id, x, y, 5.0)),
        0..4,
    )
}

proptest! {
    #[test]
    fn timestamps_step_by_one_frame_duration(
        fps in 1.0f64..120.0,
        frames in proptest::collection::vec(frame_strategy(), 1..60),
    ) {
        let clock = FrameClock::new(fps).unwrap();
        let mut tracker = FrameTracker::new(TrackerConfig {
            clock,
            scale: None,
            pair: MarkerPair::default(),
        });
        let mut previous: Option<f64> = None;
        for detections in frames {
            let outcome = tracker.step(FrameInput::Frame(detections)).unwrap();
            let StepOutcome::Processed(record) = outcome else {
                panic!("tracker halted while running");
            };
            if let Some(prev) = previous {
                let step = record.timestamp.seconds - prev;
                prop_assert!((step - clock.frame_duration_secs()).abs() < 1e-9);
            }
            previous = Some(record.timestamp.seconds);
        }
    }

    #[test]
    fn series_entry_iff_pair_in_store(
        frames in proptest::collection::vec(frame_strategy(), 1..60),
    ) {
        let frame_count = frames.len() as u64;
        let output = run(30.0, None, frames).finish();
        let pair = MarkerPair::default();
        for frame_index in 0..frame_count {
            let both = output
                .store
                .get(frame_index)
                .map(|p| p.contains_key(&pair.reference) && p.contains_key(&pair.target))
                .unwrap_or(false);
            prop_assert_eq!(both, output.series.at_frame(frame_index).is_some());
        }
    }
}
