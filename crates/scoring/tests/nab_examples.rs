//! Worked scoring examples, end to end through the public API.

use andeped_scoring::{
    anomaly_window_size, binarize, build_windows, evaluate, rising_edges, ConfusionCounts,
    GroundTruth, Metrics, ScoringOptions, Thresholds, WindowSize,
};

#[test]
fn single_anomaly_window() {
    let w = anomaly_window_size(20, 1);
    assert_eq!(w, 2);
    let labels = build_windows(&[5], w, 20);
    for (i, label) in labels.iter().enumerate() {
        let expected = if (3..=7).contains(&i) { 1 } else { 0 };
        assert_eq!(*label, expected, "index {i}");
    }
}

#[test]
fn confusion_on_short_stream() {
    let detections = [false, false, true, false, false];
    let windows = [0, 0, 1, 1, 0];
    let counts = ConfusionCounts::measure(&rising_edges(&detections), &windows, 1, false).unwrap();
    assert_eq!(counts.true_positives, 1);
    assert_eq!(counts.false_positives, 0.0);
    assert_eq!(counts.false_negatives, 0);
    assert_eq!(counts.true_negatives, 4.0);
}

#[test]
fn metric_examples() {
    let one_each = ConfusionCounts {
        true_positives: 1,
        false_positives: 1.0,
        true_negatives: 0.0,
        false_negatives: 1,
    };
    let m = Metrics::from_counts(&one_each);
    assert_eq!((m.precision, m.recall, m.f1), (0.5, 0.5, 0.5));
    assert_eq!(Metrics::from_counts(&ConfusionCounts::default()), Metrics::default());
}

#[test]
fn labels_thresholds_and_scores() {
    let labels = GroundTruth::from_json_str(
        r#"{"realTweets/Twitter_volume_AAPL.csv": ["2015-03-03 00:10:00"]}"#,
    )
    .unwrap();
    let timestamps: Vec<String> = (0..30)
        .map(|m| format!("2015-03-03 00:{:02}:00", m))
        .collect();
    let flags = labels.indices("Twitter_volume_AAPL", &timestamps).unwrap();
    assert_eq!(flags, vec![10]);

    let thresholds = Thresholds::from_json_str(
        r#"{"bayesChangePt": {"standard": {"threshold": 0.99}}}"#,
        "standard",
    )
    .unwrap();
    let mut scores = vec![0.1; 30];
    scores[11] = 0.995;
    scores[12] = 0.999;
    scores[25] = 1.0;
    let detections = binarize(&scores, thresholds.threshold_for("bayesChangePt").unwrap());

    let options = ScoringOptions {
        window_size: WindowSize::Nab,
        normalize: false,
        rising_edge: true,
    };
    let eval = evaluate(&detections, &flags, &options).unwrap();
    // W = ceil(3 / 1) = 3: window 7..=13.
    assert_eq!(eval.window_size, 3);
    assert_eq!(eval.counts.true_positives, 1);
    assert_eq!(eval.counts.false_positives, 1.0);
    assert_eq!(eval.counts.false_negatives, 0);
    assert_eq!(eval.metrics.precision, 0.5);
    assert_eq!(eval.metrics.recall, 1.0);
}

#[test]
fn evaluation_serializes() {
    let eval = evaluate(&[false, true, false], &[1], &ScoringOptions::default()).unwrap();
    let json = serde_json::to_value(&eval).unwrap();
    assert!(json["counts"]["true_positives"].is_u64());
    assert!(json["metrics"]["f1"].is_number());
}
