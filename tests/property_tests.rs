//! Property-based tests for the prime calculator.
//!
//! These use `proptest` to check invariants over randomly generated inputs:
//!
//! - **Primality primitive**: trial division agrees with an independent
//!   square-root-bounded check, and composite verdicts carry a real divisor.
//! - **Prime store**: accepted values stay strictly increasing; joins never
//!   carry a trailing separator.
//! - **Engine**: a bounded run yields exactly the primes below its frontier
//!   (soundness and completeness).
//!
//! ```bash
//! cargo test --test property_tests
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```

use prime_calculator::{
    is_prime, next_candidate, trial_division, CalculatorConfig, Primality, PrimeCalculator,
    PrimeStore,
};
use proptest::prelude::*;

/// Independent reference: divisor search bounded by sqrt(n).
fn reference_is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

// == Primality primitive =======================================================

proptest! {
    #[test]
    fn prop_trial_division_matches_reference(n in 0u64..20_000) {
        prop_assert_eq!(is_prime(n), reference_is_prime(n), "disagreement at {}", n);
    }

    /// The reported divisor divides n, and nothing between it and n does.
    #[test]
    fn prop_composite_divisor_is_largest(n in 4u64..5_000) {
        if let Primality::Composite { divisor } = trial_division(n, || false) {
            prop_assert!(divisor > 1 && divisor < n);
            prop_assert_eq!(n % divisor, 0);
            prop_assert!((divisor + 1..n).all(|d| n % d != 0));
        } else {
            prop_assert!(reference_is_prime(n));
        }
    }

    #[test]
    fn prop_next_candidate_increments(n in 0u64..u64::MAX) {
        prop_assert_eq!(next_candidate(n).unwrap(), n + 1);
    }
}

// == Prime store ===============================================================

proptest! {
    /// Whatever order values arrive in, the store keeps a strictly
    /// increasing sequence and only accepts values above the current last.
    #[test]
    fn prop_store_stays_strictly_increasing(values in prop::collection::vec(0u64..1_000, 0..100)) {
        let store = PrimeStore::new();
        for v in values {
            let before = store.last();
            let accepted = store.push(v);
            prop_assert_eq!(accepted, before.map_or(true, |last| v > last));
        }
        let snap = store.snapshot();
        prop_assert!(snap.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_join_has_no_trailing_separator(
        count in 1usize..50,
        separator in "[,;| ]{1,3}",
    ) {
        let store = PrimeStore::new();
        for p in (2u64..).filter(|&n| reference_is_prime(n)).take(count) {
            store.push(p);
        }
        let joined = store.join(&separator);
        prop_assert!(!joined.ends_with(&separator));
        let parts: Vec<u64> = joined
            .split(separator.as_str())
            .map(|s| s.parse().unwrap())
            .collect();
        prop_assert_eq!(parts, store.snapshot());
    }
}

// == Engine ====================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every value in the set is prime, and every prime up to the frontier
    /// is in the set.
    #[test]
    fn prop_bounded_run_is_sound_and_complete(max_candidate in 2u64..2_000) {
        let calc = PrimeCalculator::with_config(CalculatorConfig {
            max_candidate: Some(max_candidate),
            ..Default::default()
        });
        let summary = calc.run().unwrap();
        let expected: Vec<u64> = (2..=max_candidate).filter(|&n| reference_is_prime(n)).collect();
        prop_assert_eq!(summary.last_candidate, Some(max_candidate));
        prop_assert_eq!(calc.primes(), expected);
    }

    #[test]
    fn prop_latest_prime_is_last_of_set(max_primes in 1u64..200) {
        let calc = PrimeCalculator::with_config(CalculatorConfig {
            max_primes: Some(max_primes),
            ..Default::default()
        });
        calc.run().unwrap();
        let primes = calc.primes();
        prop_assert_eq!(primes.len() as u64, max_primes);
        prop_assert_eq!(calc.latest_prime().unwrap(), *primes.last().unwrap());
    }
}
