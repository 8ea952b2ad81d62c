use fretcam_visualizer::{SimulationSettings, Simulator};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!['G', 'M', 'X', 'Y', 'Z', 'I', 'J', 'R', 'F', 'S', 'P', 'Q']),
        -500.0f64..500.0,
    )
        .prop_map(|(letter, value)| format!("{}{:.3}", letter, value))
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::collection::vec(word(), 0..6), 0..30)
        .prop_map(|lines| {
            lines
                .into_iter()
                .map(|words| words.join(" "))
                .collect::<Vec<_>>()
                .join("\n")
        })
}

proptest! {
    #[test]
    fn arbitrary_text_never_panics(text in ".{0,200}") {
        let result = Simulator::default().simulate(&text);
        prop_assert!(!result.points.is_empty());
    }

    #[test]
    fn random_programs_give_finite_statistics(text in program()) {
        let result = Simulator::default().simulate(&text);
        prop_assert!(result.cut_distance.is_finite() && result.cut_distance >= 0.0);
        prop_assert!(result.rapid_distance.is_finite() && result.rapid_distance >= 0.0);
        prop_assert!(result.feed_time.is_finite() && result.feed_time >= 0.0);
        prop_assert!(result.total_time.is_finite());
    }

    #[test]
    fn simulation_is_idempotent(text in program()) {
        let sim = Simulator::new(SimulationSettings {
            record_trajectory: true,
            ..Default::default()
        });
        let first = sim.simulate(&text);
        let second = sim.simulate(&text);
        prop_assert_eq!(first.trajectory.len(), second.trajectory.len());
        prop_assert_eq!(first, second);
    }
}
