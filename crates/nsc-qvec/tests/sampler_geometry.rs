use nsc_core::{NscError, Vec3, WavevectorSet};
use nsc_qvec::{
    FibonacciSphere, FixedSet, RandomSphere, SamplerSpec, SymmetricSampler, WavevectorSampler,
};
use proptest::prelude::*;

fn assert_on_shell(set: &WavevectorSet, magnitude: f64) {
    for q in set.as_slice() {
        assert!((q.norm() - magnitude).abs() < 1e-9 * magnitude.max(1.0));
    }
}

#[test]
fn zero_magnitude_collapses_to_origin() {
    let set = FibonacciSphere::new(8).unwrap().sample(0.0).unwrap();
    assert_eq!(set.as_slice(), &[Vec3::zeros()]);
}

#[test]
fn invalid_magnitudes_are_sampling_errors() {
    let sampler = FibonacciSphere::new(8).unwrap();
    assert!(matches!(sampler.sample(-1.0), Err(NscError::Sampling(_))));
    assert!(matches!(sampler.sample(f64::NAN), Err(NscError::Sampling(_))));
}

#[test]
fn zero_counts_are_rejected() {
    assert!(FibonacciSphere::new(0).is_err());
    assert!(RandomSphere::new(0, 1).is_err());
    assert!(FixedSet::new(vec![]).is_err());
    assert!(FixedSet::new(vec![Vec3::zeros()]).is_err());
}

#[test]
fn symmetric_sets_sum_to_zero() {
    let sampler = SymmetricSampler::new(RandomSphere::new(7, 3).unwrap());
    let set = sampler.sample(2.0).unwrap();
    assert_eq!(set.len(), 14);
    let total: Vec3 = set.as_slice().iter().sum();
    assert!(total.norm() < 1e-12);
}

#[test]
fn fixed_set_rescales_directions() {
    let sampler = FixedSet::new(vec![Vec3::new(0.0, 3.0, 4.0)]).unwrap();
    let set = sampler.sample(10.0).unwrap();
    assert!((set.as_slice()[0] - Vec3::new(0.0, 6.0, 8.0)).norm() < 1e-12);
}

#[test]
fn closures_act_as_samplers() {
    let sampler = |magnitude: f64| WavevectorSet::from_rows(&[[magnitude, 0.0, 0.0]]);
    let set = sampler.sample(1.25).unwrap();
    assert_eq!(set.as_slice()[0].x, 1.25);
}

#[test]
fn spec_builds_symmetric_fibonacci_by_default() {
    let sampler = SamplerSpec::default().build().unwrap();
    let set = sampler.sample(1.0).unwrap();
    assert_eq!(set.len(), 128);
    assert_on_shell(&set, 1.0);
}

#[test]
fn spec_parses_from_json() {
    let spec: SamplerSpec =
        serde_json::from_str(r#"{"kind": "random", "count": 5, "seed": 9, "symmetric": false}"#)
            .unwrap();
    assert_eq!(
        spec,
        SamplerSpec::Random {
            count: 5,
            seed: 9,
            symmetric: false
        }
    );
    assert_eq!(spec.build().unwrap().sample(1.0).unwrap().len(), 5);
}

proptest! {
    #[test]
    fn fibonacci_points_lie_on_shell(count in 1usize..200, magnitude in 0.01f64..50.0) {
        let set = FibonacciSphere::new(count).unwrap().sample(magnitude).unwrap();
        prop_assert_eq!(set.len(), count);
        assert_on_shell(&set, magnitude);
    }

    #[test]
    fn random_points_lie_on_shell(count in 1usize..64, seed in any::<u64>(), magnitude in 0.01f64..50.0) {
        let set = RandomSphere::new(count, seed).unwrap().sample(magnitude).unwrap();
        prop_assert_eq!(set.len(), count);
        assert_on_shell(&set, magnitude);
    }
}
