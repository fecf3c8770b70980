//! Unit tests for obs-rvs.

use obs_core::SimRng;

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

#[cfg(test)]
mod variates {
    use super::*;
    use crate::{VariateError, exponential, gamma_erlangk, generate_rvs};

    #[test]
    fn exponential_mean_close_to_inverse_rate() {
        let mut rng = SimRng::new(42);
        let samples: Vec<f64> = (0..20_000)
            .map(|_| exponential(0.4, rng.inner()).unwrap())
            .collect();
        let m = mean(&samples);
        // Expected 2.5; 20k samples keeps the standard error near 0.018.
        assert!((m - 2.5).abs() < 0.1, "got {m}");
        assert!(samples.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn erlang_mean_matches_overall_mean() {
        let mut rng = SimRng::new(7);
        let samples: Vec<f64> = (0..20_000)
            .map(|_| gamma_erlangk(3, 6.0, rng.inner()).unwrap())
            .collect();
        let m = mean(&samples);
        assert!((m - 6.0).abs() < 0.15, "got {m}");
    }

    #[test]
    fn erlang_variance_shrinks_with_stages() {
        // Var = b^2 / k, so k = 4 has a quarter of the k = 1 variance.
        let var = |k: u32| {
            let v = generate_rvs(k, 2.0, 20_000, Some(11)).unwrap();
            let m = mean(&v);
            v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / v.len() as f64
        };
        let v1 = var(1);
        let v4 = var(4);
        assert!((v1 - 4.0).abs() < 0.4, "k=1 var {v1}");
        assert!((v4 - 1.0).abs() < 0.1, "k=4 var {v4}");
    }

    #[test]
    fn generate_rvs_is_reproducible() {
        let a = generate_rvs(2, 1.0, 50, Some(123)).unwrap();
        let b = generate_rvs(2, 1.0, 50, Some(123)).unwrap();
        let c = generate_rvs(2, 1.0, 50, Some(124)).unwrap();
        assert_eq!(a.len(), 50);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unseeded_still_produces_samples() {
        let v = generate_rvs(1, 1.0, 5, None).unwrap();
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut rng = SimRng::new(1);
        assert!(matches!(exponential(0.0, rng.inner()), Err(VariateError::InvalidRate(_))));
        assert!(matches!(exponential(-1.0, rng.inner()), Err(VariateError::InvalidRate(_))));
        assert!(matches!(gamma_erlangk(0, 1.0, rng.inner()), Err(VariateError::ZeroStages)));
        assert!(matches!(gamma_erlangk(2, f64::INFINITY, rng.inner()), Err(VariateError::InvalidMean(_))));
        assert!(generate_rvs(1, 0.0, 3, Some(1)).is_err());
    }
}

#[cfg(test)]
mod service {
    use super::*;
    use crate::{ServiceDistribution, exponential};

    #[test]
    fn single_stage_matches_plain_exponential() {
        let svc = ServiceDistribution::new(1, 3.0).unwrap();
        assert_eq!(svc.stages(), 1);
        assert_eq!(svc.mean(), 3.0);

        let mut a = SimRng::new(6353);
        let mut b = SimRng::new(6353);
        for _ in 0..10 {
            let x = svc.sample(&mut a);
            let y = exponential(1.0 / 3.0, b.inner()).unwrap();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn multi_stage_is_erlang() {
        let svc = ServiceDistribution::new(4, 2.0).unwrap();
        assert_eq!(svc.stages(), 4);
        let mut rng = SimRng::new(3);
        let v: Vec<f64> = (0..10_000).map(|_| svc.sample(&mut rng)).collect();
        assert!((mean(&v) - 2.0).abs() < 0.06);
    }

    #[test]
    fn invalid_service_parameters() {
        assert!(ServiceDistribution::new(0, 1.0).is_err());
        assert!(ServiceDistribution::new(1, 0.0).is_err());
    }
}
