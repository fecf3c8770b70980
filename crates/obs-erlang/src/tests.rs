//! Unit tests for the Erlang formulas.

use crate::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[cfg(test)]
mod erlang_b {
    use super::*;

    #[test]
    fn reference_values() {
        // Closed form for c = 2: (A^2 / 2) / (1 + A + A^2 / 2) = 2 / 5.
        assert!(close(erlang_b(2.0, 2).unwrap(), 0.4));
        assert!(close(erlang_b(2.0, 3).unwrap(), 4.0 / 19.0));
        // Single server: A / (1 + A).
        assert!(close(erlang_b(1.2, 1).unwrap(), 1.2 / 2.2));
    }

    #[test]
    fn zero_servers_lose_everything() {
        assert_eq!(erlang_b(0.5, 0).unwrap(), 1.0);
        assert_eq!(erlang_b(50.0, 0).unwrap(), 1.0);
    }

    #[test]
    fn bounded_and_decreasing_in_servers() {
        for &load in &[0.1, 1.0, 2.0, 7.5, 40.0] {
            let mut prev = erlang_b(load, 0).unwrap();
            for c in 1..=60 {
                let b = erlang_b(load, c).unwrap();
                assert!(b > 0.0 && b <= 1.0, "B({load}, {c}) = {b}");
                assert!(b < prev, "B({load}, {c}) = {b} not below {prev}");
                prev = b;
            }
        }
    }

    #[test]
    fn increasing_in_load() {
        for c in 1..=20 {
            let mut prev = 0.0;
            for i in 1..=50 {
                let load = i as f64 * 0.5;
                let b = erlang_b(load, c).unwrap();
                assert!(b > prev, "B({load}, {c}) = {b} not above {prev}");
                prev = b;
            }
        }
    }

    #[test]
    fn stable_for_many_servers() {
        let b = erlang_b(900.0, 1000).unwrap();
        assert!(b.is_finite() && b > 0.0 && b < 0.01, "got {b}");
    }

    #[test]
    fn rejects_invalid_load() {
        assert_eq!(erlang_b(0.0, 2), Err(ErlangError::InvalidLoad(0.0)));
        assert!(erlang_b(-1.0, 2).is_err());
        assert!(erlang_b(f64::NAN, 2).is_err());
    }
}

#[cfg(test)]
mod erlang_c {
    use super::*;

    #[test]
    fn reference_values() {
        assert!(close(erlang_c(2.0, 3).unwrap(), 4.0 / 9.0));
        // M/M/1: probability of waiting equals rho.
        assert!(close(erlang_c(0.5, 1).unwrap(), 0.5));
    }

    #[test]
    fn saturates_at_rho_one_inclusive() {
        assert!(matches!(erlang_c(2.0, 2), Err(ErlangError::Saturated { servers: 2, .. })));
        assert!(matches!(erlang_c(3.0, 2), Err(ErlangError::Saturated { .. })));
        assert!(matches!(erlang_c(1.0, 0), Err(ErlangError::Saturated { .. })));
        assert!(erlang_c(1.999, 2).is_ok());
    }

    #[test]
    fn saturation_iff_rho_at_least_one() {
        for c in 1..=10u32 {
            for i in 1..=40 {
                let load = i as f64 * 0.37;
                let result = erlang_c(load, c);
                assert_eq!(result.is_err(), load / c as f64 >= 1.0, "load {load}, c {c}");
            }
        }
    }

    #[test]
    fn delay_at_least_loss() {
        for c in 1..=15u32 {
            for i in 1..=30 {
                let load = c as f64 * i as f64 / 31.0;
                let ec = erlang_c(load, c).unwrap();
                let eb = erlang_b(load, c).unwrap();
                assert!(ec >= eb, "C({load}, {c}) = {ec} < B = {eb}");
                assert!(ec <= 1.0);
            }
        }
    }

    #[test]
    fn helpers() {
        assert!(close(offered_load(0.4, 3.0), 1.2));
        assert!(close(traffic_intensity(1.2, 2), 0.6));
        assert!(traffic_intensity(1.0, 0).is_infinite());
        // M/M/1 with rho = 0.5 and unit service: Wq = rho / (mu - lambda) = 1.
        assert!(close(mmc_mean_wait(0.5, 1, 1.0).unwrap(), 1.0));
        assert!(mmc_mean_wait(2.0, 2, 1.0).is_err());
    }
}
