use std::time::Duration;

use pageloom_core::BackoffParam;
use rand::Rng;

/// Returns 0 when `max` is zero; otherwise a uniformly distributed value in
/// `[0, max)` drawn from `rng`.
pub fn compute_jitter(max: Duration, rng: &mut impl Rng) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let max_nanos = max.as_nanos().min(u64::MAX as u128) as u64;
    if max_nanos == 0 {
        return Duration::ZERO;
    }
    let drawn = rng.random_range(0..max_nanos);
    Duration::from_nanos(drawn)
}

/// `min(initial * multiplier^(count-1), max) + jitter`. `count = 1` yields
/// `initial + jitter`. The random source is the only non-determinism — same
/// seed, same call sequence, same delays.
pub fn exponential_backoff_delay(
    count: u32,
    jitter: Duration,
    rng: &mut impl Rng,
    param: &BackoffParam,
) -> Duration {
    let count = count.max(1);
    let exponent = (count - 1) as i32;
    let scaled_secs = param.initial.as_secs_f64() * param.multiplier.powi(exponent);
    let capped_secs = scaled_secs.min(param.max.as_secs_f64());
    let base = Duration::from_secs_f64(capped_secs.max(0.0));
    base + compute_jitter(jitter, rng)
}

/// Largest element of `durations`; zero for an empty input. Does not
/// mutate its input.
pub fn max_duration(durations: &[Duration]) -> Duration {
    durations.iter().copied().max().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn jitter_zero_when_max_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(compute_jitter(Duration::ZERO, &mut rng), Duration::ZERO);
    }

    #[test]
    fn jitter_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let max = Duration::from_millis(100);
        for _ in 0..200 {
            let j = compute_jitter(max, &mut rng);
            assert!(j < max);
        }
    }

    #[test]
    fn first_attempt_is_initial_plus_jitter() {
        let param = BackoffParam {
            initial: Duration::from_millis(500),
            multiplier: 2.0,
            max: Duration::from_secs(30),
        };
        let mut rng = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        let delay = exponential_backoff_delay(1, Duration::ZERO, &mut rng, &param);
        let jitter = compute_jitter(Duration::ZERO, &mut rng2);
        assert_eq!(delay, param.initial + jitter);
    }

    #[test]
    fn caps_at_max() {
        let param = BackoffParam {
            initial: Duration::from_millis(500),
            multiplier: 10.0,
            max: Duration::from_secs(5),
        };
        let mut rng = StdRng::seed_from_u64(3);
        let delay = exponential_backoff_delay(10, Duration::ZERO, &mut rng, &param);
        assert_eq!(delay, Duration::from_secs(5));
    }

    #[test]
    fn deterministic_with_same_seed() {
        let param = BackoffParam::default();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for count in 1..6 {
            let da = exponential_backoff_delay(count, Duration::from_millis(50), &mut a, &param);
            let db = exponential_backoff_delay(count, Duration::from_millis(50), &mut b, &param);
            assert_eq!(da, db);
        }
    }

    #[test]
    fn max_duration_empty_is_zero() {
        assert_eq!(max_duration(&[]), Duration::ZERO);
    }

    #[test]
    fn max_duration_picks_largest() {
        let ds = [
            Duration::from_secs(1),
            Duration::from_secs(9),
            Duration::from_secs(3),
        ];
        assert_eq!(max_duration(&ds), Duration::from_secs(9));
        // input not mutated in place — still 3 elements, same order
        assert_eq!(ds[1], Duration::from_secs(9));
    }
}
