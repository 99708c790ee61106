use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use samgen_system_wave::{generate_wave, WaveConfig};

prop_compose! {
    fn config()(
        length in 50usize..400,
        cycles in 1usize..10,
        peak in 100u32..1000,
        randomness in 1u8..=10,
        tenths in 2u32..=10,
    ) -> WaveConfig {
        WaveConfig::new(length, cycles, peak, randomness, f64::from(tenths) / 20.0)
            .expect("config")
    }
}

proptest! {
    #[test]
    fn values_stay_between_floor_and_peak(config in config(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let values = generate_wave(&config, &mut rng).expect("wave");
        prop_assert_eq!(values.len(), config.length());
        for value in values {
            prop_assert!(value >= config.min_value());
            prop_assert!(value <= f64::from(config.peak()));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible(config in config(), seed in any::<u64>()) {
        let first = generate_wave(&config, &mut ChaCha8Rng::seed_from_u64(seed)).expect("wave");
        let second = generate_wave(&config, &mut ChaCha8Rng::seed_from_u64(seed)).expect("wave");
        prop_assert_eq!(first, second);
    }
}

#[test]
fn every_cycle_comes_close_to_the_peak() {
    let config = WaveConfig::new(120, 4, 300, 3, 0.25).expect("config");
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let values = generate_wave(&config, &mut rng).expect("wave");
    for cycle in values.chunks(config.cycle_length()) {
        let high = cycle.iter().copied().fold(f64::MIN, f64::max);
        assert!(high >= 300.0 - 3.0, "cycle peaked at {high}");
    }
}

#[test]
fn profile_values_deserialize_and_validate() {
    let parsed: Result<WaveConfig, _> = from_json(
        r#"{"length":100,"cycles":3,"peak":300,"randomness":5,"min_fraction":0.25}"#,
    );
    assert!(parsed.is_ok());
    let rejected: Result<WaveConfig, _> = from_json(
        r#"{"length":100,"cycles":3,"peak":300,"randomness":0,"min_fraction":0.25}"#,
    );
    assert!(rejected.is_err());
}

fn from_json(input: &str) -> Result<WaveConfig, serde_json::Error> {
    serde_json::from_str(input)
}
