use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use samgen_core::{GenerationConfig, Phase, PhasePolicy, RepetitionRange};
use samgen_system_denials::{derive_denials, phase_runs, DenialSelector};
use samgen_system_synthesizer::synthesize;

fn policy() -> impl Strategy<Value = PhasePolicy> {
    prop_oneof![
        Just(PhasePolicy::DenialOnly),
        Just(PhasePolicy::HoldOrDecrement),
        Just(PhasePolicy::FlatHold),
    ]
}

prop_compose! {
    fn config()(
        peak in 1u32..400,
        step_fraction in 0.0f64..1.0,
        days in 0i64..150,
        denial_lo in 1u32..5,
        denial_extra in 0u32..5,
        hold_lo in 1u32..4,
        hold_extra in 0u32..4,
        policy in policy(),
    ) -> GenerationConfig {
        let start = NaiveDate::from_ymd_opt(2023, 12, 20).expect("start");
        let step_count = 1 + (f64::from(peak - 1) * step_fraction) as u32;
        GenerationConfig::new(
            start,
            start + Duration::days(days),
            peak,
            step_count,
            RepetitionRange::new("denial range", denial_lo, denial_lo + denial_extra)
                .expect("denial range"),
        )
        .expect("config")
        .with_policy(policy)
        .with_hold_range(
            RepetitionRange::new("hold range", hold_lo, hold_lo + hold_extra).expect("hold range"),
        )
    }
}

proptest! {
    #[test]
    fn levels_stay_within_zero_and_peak(config in config(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let samples = synthesize(&config, &mut rng).expect("samples");
        for sample in &samples {
            prop_assert!(sample.level() <= config.peak());
            if sample.phase().is_peak() {
                prop_assert_eq!(sample.level(), config.peak());
            }
        }
    }

    #[test]
    fn one_sample_per_calendar_day(config in config(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let samples = synthesize(&config, &mut rng).expect("samples");
        prop_assert_eq!(samples.len() as u64, config.total_days());
        prop_assert_eq!(samples.first().map(|sample| sample.date()), Some(config.start()));
        for pair in samples.windows(2) {
            prop_assert_eq!(pair[1].date() - pair[0].date(), Duration::days(1));
        }
    }

    #[test]
    fn completed_runs_draw_from_their_range(config in config(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let samples = synthesize(&config, &mut rng).expect("samples");

        let denial_runs = phase_runs(&samples, Phase::Denial);
        let denials = derive_denials(&samples, config.increment(), DenialSelector::DenialPhase);
        let denial_days: usize = denial_runs.iter().map(|run| run.len()).sum();
        prop_assert_eq!(denials.len(), denial_days);
        prop_assert!(denials.iter().all(|event| event.magnitude() == config.increment()));

        let hold_runs = phase_runs(&samples, Phase::Hold);
        for (runs, range) in [
            (&denial_runs, config.denial_range()),
            (&hold_runs, config.hold_range().unwrap_or(config.denial_range())),
        ] {
            for run in runs.iter() {
                let truncated = run.start_index() + run.len() == samples.len();
                prop_assert!(run.len() as u32 <= range.hi());
                if !truncated {
                    prop_assert!(range.contains(run.len() as u32));
                }
            }
        }
    }
}
