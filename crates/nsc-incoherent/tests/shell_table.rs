use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nsc_core::{CountingProgress, NoProgress, NscError, Trajectory, Vec3, WavevectorSet, Weights};
use nsc_incoherent::{
    intermediate, shell_average, AveragingPolicy, ImaginaryPolicy, RunOpts, ShellAverager, ShellTable,
};
use nsc_qvec::{FibonacciSphere, FixedSet, SamplerSpec, SymmetricSampler};

fn drifting_atoms() -> (Trajectory, Weights) {
    let tr = Trajectory::new(vec![
        (0..5).map(|t| Vec3::new(0.3 * t as f64, 0.1, 0.0)).collect(),
        (0..5).map(|t| Vec3::new(-0.1, 0.2 * t as f64, 0.05 * t as f64)).collect(),
        vec![Vec3::new(1.0, 1.0, 1.0); 5],
    ])
    .unwrap();
    (tr, Weights::new(vec![1.0, 2.0, 0.5]).unwrap())
}

#[test]
fn rows_follow_input_order() {
    let (tr, weights) = drifting_atoms();
    let magnitudes = [2.0, 0.5, 1.0, 0.5];
    let sampler = SymmetricSampler::new(FibonacciSphere::new(16).unwrap());
    let table = ShellAverager::new(sampler, Some(2))
        .unwrap()
        .run(&tr, &weights, &magnitudes, &NoProgress)
        .unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.magnitudes, magnitudes.to_vec());
    for row in &table.rows {
        assert_eq!(row.len(), 5);
    }
    let (first, again) = (table.row(1).unwrap(), table.row(3).unwrap());
    assert!(first.iter().zip(again).all(|(a, b)| (a - b).abs() < 1e-12));
    assert_eq!(table.shell_sizes, vec![32; 4]);
    assert!(table.imaginary_residuals.iter().all(|r| *r < 1e-12));
}

#[test]
fn rows_equal_single_set_pipeline() {
    let (tr, weights) = drifting_atoms();
    let sampler = SymmetricSampler::new(FibonacciSphere::new(8).unwrap());
    let expected = intermediate(
        &tr,
        &weights,
        &nsc_qvec::WavevectorSampler::sample(&sampler, 1.5).unwrap(),
        Some(1),
        AveragingPolicy::Mean,
    )
    .unwrap();
    let matrix = shell_average(&tr, &[1.5], &weights, sampler, Some(1)).unwrap();
    assert_eq!(matrix.shape(), (1, 5));
    for lag in 0..5 {
        assert!((matrix[(0, lag)] - expected[lag].re).abs() < 1e-12);
    }
}

#[test]
fn zero_magnitude_row_is_one() {
    let (tr, weights) = drifting_atoms();
    let matrix = shell_average(&tr, &[0.0], &weights, FibonacciSphere::new(4).unwrap(), Some(1)).unwrap();
    assert!(matrix.iter().all(|v| (v - 1.0).abs() < 1e-12));
}

#[test]
fn empty_magnitude_list_gives_empty_table() {
    let (tr, weights) = drifting_atoms();
    let matrix = shell_average(&tr, &[], &weights, FibonacciSphere::new(4).unwrap(), None).unwrap();
    assert_eq!(matrix.shape(), (0, 5));
}

#[test]
fn asymmetric_set_rejected_under_strict_policy() {
    let (tr, weights) = drifting_atoms();
    let sampler = FixedSet::new(vec![Vec3::new(1.0, 0.0, 0.0)]).unwrap();
    let averager = ShellAverager::new(sampler, Some(1))
        .unwrap()
        .with_imaginary(ImaginaryPolicy::Reject { tolerance: 1e-6 })
        .unwrap();
    let err = averager.run(&tr, &weights, &[1.0], &NoProgress).unwrap_err();
    assert!(matches!(err, NscError::Imaginary(_)));
    assert_eq!(err.info().context["magnitude_index"], "0");
}

#[test]
fn asymmetric_set_recorded_under_warn_policy() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (tr, weights) = drifting_atoms();
    let sampler = FixedSet::new(vec![Vec3::new(1.0, 0.0, 0.0)]).unwrap();
    let table = ShellAverager::new(sampler, Some(1))
        .unwrap()
        .run(&tr, &weights, &[1.0], &NoProgress)
        .unwrap();
    assert!(table.imaginary_residuals[0] > 1e-6);
}

#[test]
fn sampler_failures_name_the_shell() {
    let (tr, weights) = drifting_atoms();
    let err = shell_average(&tr, &[1.0, -2.0], &weights, FibonacciSphere::new(4).unwrap(), Some(1))
        .unwrap_err();
    assert!(matches!(err, NscError::Sampling(_)));
    assert_eq!(err.info().context["magnitude_index"], "1");
}

#[test]
fn sampler_is_called_once_per_magnitude() {
    let (tr, weights) = drifting_atoms();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let sampler = move |magnitude: f64| {
        seen.fetch_add(1, Ordering::SeqCst);
        WavevectorSet::from_rows(&[[magnitude, 0.0, 0.0], [-magnitude, 0.0, 0.0]])
    };
    let progress = CountingProgress::default();
    ShellAverager::new(sampler, Some(2))
        .unwrap()
        .run(&tr, &weights, &[0.5, 1.0, 1.5], &progress)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(progress.magnitudes(), 3);
    assert_eq!(progress.atoms(), 9);
}

#[test]
fn shape_errors_surface_before_sampling() {
    let (tr, _) = drifting_atoms();
    let weights = Weights::new(vec![1.0, 1.0]).unwrap();
    let sampler = |_: f64| -> Result<WavevectorSet, NscError> { panic!("sampler must not run") };
    let err = ShellAverager::new(sampler, Some(1))
        .unwrap()
        .run(&tr, &weights, &[1.0], &NoProgress)
        .unwrap_err();
    assert!(matches!(err, NscError::Shape(_)));
}

#[test]
fn table_from_opts_round_trips_as_json() {
    let (tr, weights) = drifting_atoms();
    let opts = RunOpts {
        workers: Some(2),
        sampler: SamplerSpec::Random {
            count: 6,
            seed: 17,
            symmetric: true,
        },
        ..RunOpts::default()
    };
    let table = ShellAverager::from_opts(&opts)
        .unwrap()
        .run(&tr, &weights, &[0.8, 1.6], &NoProgress)
        .unwrap();
    assert_eq!(table.provenance.config_hash, opts.config_hash().unwrap());
    assert_eq!(table.provenance.workers, 2);
    assert_eq!(table.provenance.n_atoms, 3);
    let bytes = table.to_json_bytes().unwrap();
    let back = ShellTable::from_json_bytes(&bytes).unwrap();
    assert_eq!(back.provenance, table.provenance);
    assert_eq!(back.shell_sizes, table.shell_sizes);
    for (restored, original) in back.rows.iter().zip(&table.rows) {
        assert!(restored.iter().zip(original).all(|(a, b)| (a - b).abs() < 1e-12));
    }
}

#[test]
fn weighted_policy_selects_one_wavevector() {
    let (tr, weights) = drifting_atoms();
    let sampler =
        |magnitude: f64| WavevectorSet::from_rows(&[[magnitude, 0.0, 0.0], [0.0, magnitude, 0.0]]);
    let table = ShellAverager::new(sampler, Some(2))
        .unwrap()
        .with_policy(AveragingPolicy::Weighted(vec![1.0, 0.0]))
        .with_imaginary(ImaginaryPolicy::Discard)
        .unwrap()
        .run(&tr, &weights, &[1.2], &NoProgress)
        .unwrap();
    let expected = intermediate(
        &tr,
        &weights,
        &WavevectorSet::from_rows(&[[1.2, 0.0, 0.0]]).unwrap(),
        Some(1),
        AveragingPolicy::Mean,
    )
    .unwrap();
    let row = table.row(0).unwrap();
    for lag in 0..5 {
        assert!((row[lag] - expected[lag].re).abs() < 1e-12);
    }
    let residual = expected.iter().map(|v| v.im.abs()).fold(0.0, f64::max);
    assert!((table.imaginary_residuals[0] - residual).abs() < 1e-12);
}

#[test]
fn unusable_tolerance_is_rejected() {
    for tolerance in [f64::NAN, -1e-6, f64::INFINITY] {
        let sampler = FixedSet::new(vec![Vec3::new(1.0, 0.0, 0.0)]).unwrap();
        let err = ShellAverager::new(sampler, Some(1))
            .unwrap()
            .with_imaginary(ImaginaryPolicy::Reject { tolerance })
            .unwrap_err();
        assert!(matches!(err, NscError::Shape(_)));
        assert_eq!(err.info().code, "invalid_tolerance");
    }
    let opts = RunOpts {
        imaginary: ImaginaryPolicy::Warn { tolerance: f64::NAN },
        ..RunOpts::default()
    };
    assert!(matches!(ShellAverager::from_opts(&opts), Err(NscError::Shape(_))));
}

#[test]
fn short_rows_fail_to_decode() {
    let (tr, weights) = drifting_atoms();
    let table = shell_table(&tr, &weights);
    let mut value: serde_json::Value = serde_json::from_slice(&table.to_json_bytes().unwrap()).unwrap();
    value["rows"][0] = serde_json::json!([1.0, 2.0]);
    let err = ShellTable::from_json_bytes(&serde_json::to_vec(&value).unwrap()).unwrap_err();
    assert!(matches!(err, NscError::Serde(_)));
    assert_eq!(err.info().code, "table_shape");
    assert_eq!(err.info().context["row"], "0");
}

#[test]
fn mismatched_columns_fail_to_decode() {
    let (tr, weights) = drifting_atoms();
    let table = shell_table(&tr, &weights);
    let mut value: serde_json::Value = serde_json::from_slice(&table.to_json_bytes().unwrap()).unwrap();
    value["shell_sizes"] = serde_json::json!([]);
    let err = ShellTable::from_json_bytes(&serde_json::to_vec(&value).unwrap()).unwrap_err();
    assert_eq!(err.info().code, "table_shape");
    assert_eq!(err.info().context["field"], "shell_sizes");
}

#[test]
fn hand_built_table_with_ragged_rows_has_no_matrix() {
    let (tr, weights) = drifting_atoms();
    let mut table = shell_table(&tr, &weights);
    assert_eq!(table.as_matrix().unwrap().shape(), (2, 5));
    table.rows[1].pop();
    let err = table.as_matrix().unwrap_err();
    assert!(matches!(err, NscError::Shape(_)));
    assert_eq!(err.info().context["row"], "1");
}

fn shell_table(tr: &Trajectory, weights: &Weights) -> ShellTable {
    let sampler = SymmetricSampler::new(FibonacciSphere::new(4).unwrap());
    ShellAverager::new(sampler, Some(1))
        .unwrap()
        .run(tr, weights, &[0.5, 1.0], &NoProgress)
        .unwrap()
}
