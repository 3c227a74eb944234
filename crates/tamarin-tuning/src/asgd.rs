//! Adaptive stochastic gradient descent with Nesterov momentum (Nadam).
//!
//! The optimizer estimates the gradient of an injected cost function by
//! centered finite differences over a cached training set, applies the
//! bias-corrected Nadam update with an annealed momentum schedule, and
//! clips every feature into its box constraint.

use crate::error::{Result, TuningError};
use log::{debug, info, log_enabled, Level};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_STEP: f64 = 1e-3;
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;
pub const DEFAULT_EPSILON: f64 = 1e-8;
pub const DEFAULT_FIRST_MOMENT_DECAY: f64 = 0.99;
pub const DEFAULT_SECOND_MOMENT_DECAY: f64 = 0.999;
pub const DEFAULT_ANNEALING_EXPONENT: f64 = 4e-3;

type CostFn<D> = Arc<dyn Fn(&[f64], &D) -> f64 + Send + Sync>;
type Loader<D> = Box<
    dyn FnOnce(&Path) -> std::result::Result<Vec<D>, Box<dyn std::error::Error + Send + Sync>>,
>;

/// Outcome of one optimization epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The features were updated.
    Stepped,
    /// Every raw gradient component was exactly zero.
    Converged,
    /// The epoch counter reached the configured cap.
    EpochCapReached,
    /// The cooperative stop flag was raised.
    Cancelled,
}

enum DataSource<D> {
    Loaded(Vec<D>),
    Cached(PathBuf, Loader<D>),
}

pub struct AsgdBuilder<D> {
    features: Vec<f64>,
    min: Vec<f64>,
    max: Vec<f64>,
    h: f64,
    learning_rate: f64,
    epsilon: f64,
    mu: f64,
    nu: f64,
    annealing_exponent: f64,
    max_epoch: Option<u64>,
    sample_size: Option<usize>,
    seed: Option<u64>,
    stop: Option<Arc<AtomicBool>>,
    cost: Option<CostFn<D>>,
    data: Option<DataSource<D>>,
}

impl<D> AsgdBuilder<D> {
    pub fn new(features: Vec<f64>, min: Vec<f64>, max: Vec<f64>) -> Self {
        AsgdBuilder {
            features,
            min,
            max,
            h: DEFAULT_STEP,
            learning_rate: DEFAULT_LEARNING_RATE,
            epsilon: DEFAULT_EPSILON,
            mu: DEFAULT_FIRST_MOMENT_DECAY,
            nu: DEFAULT_SECOND_MOMENT_DECAY,
            annealing_exponent: DEFAULT_ANNEALING_EXPONENT,
            max_epoch: None,
            sample_size: None,
            seed: None,
            stop: None,
            cost: None,
            data: None,
        }
    }

    pub fn cost_fn<F>(mut self, cost: F) -> Self
    where
        F: Fn(&[f64], &D) -> f64 + Send + Sync + 'static,
    {
        self.cost = Some(Arc::new(cost));
        self
    }

    pub fn training_data(mut self, data: Vec<D>) -> Self {
        self.data = Some(DataSource::Loaded(data));
        self
    }

    /// Defer training-data loading to `loader`, run once at build time.
    /// Loader failures surface as [`TuningError::TrainingData`].
    pub fn cache_training_data<P, L>(mut self, path: P, loader: L) -> Self
    where
        P: Into<PathBuf>,
        L: FnOnce(&Path) -> std::result::Result<Vec<D>, Box<dyn std::error::Error + Send + Sync>>
            + 'static,
    {
        self.data = Some(DataSource::Cached(path.into(), Box::new(loader)));
        self
    }

    pub fn step_size(mut self, h: f64) -> Self {
        self.h = h;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn first_moment_decay(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    pub fn second_moment_decay(mut self, nu: f64) -> Self {
        self.nu = nu;
        self
    }

    pub fn annealing_exponent(mut self, exponent: f64) -> Self {
        self.annealing_exponent = exponent;
        self
    }

    pub fn max_epoch(mut self, max_epoch: u64) -> Self {
        self.max_epoch = Some(max_epoch);
        self
    }

    /// Mini-batch size, drawn uniformly with replacement every epoch.
    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    /// Fixed PRNG seed for deterministic sampling in tests.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cooperative cancellation flag, checked between epochs.
    pub fn stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn build(self) -> Result<Asgd<D>> {
        let dims = self.features.len();
        if dims == 0 {
            return Err(TuningError::InvalidArgument(
                "feature vector is empty".to_string(),
            ));
        }
        if self.min.len() != dims || self.max.len() != dims {
            return Err(TuningError::InvalidArgument(format!(
                "box constraint dimensions {}/{} do not match {} features",
                self.min.len(),
                self.max.len(),
                dims
            )));
        }
        for decay in [self.mu, self.nu] {
            if !(0.0..=1.0).contains(&decay) {
                return Err(TuningError::InvalidArgument(format!(
                    "moment decay {} outside [0, 1]",
                    decay
                )));
            }
        }
        for i in 0..dims {
            if self.max[i] - self.min[i] < 2.0 * self.h.abs() {
                return Err(TuningError::InvalidArgument(format!(
                    "box [{}, {}] narrower than twice the step size",
                    self.min[i], self.max[i]
                )));
            }
        }
        if self.sample_size == Some(0) {
            return Err(TuningError::InvalidArgument(
                "sample size must be positive".to_string(),
            ));
        }
        let cost = self.cost.ok_or_else(|| {
            TuningError::InvalidArgument("no cost function provided".to_string())
        })?;
        let training = match self.data {
            Some(DataSource::Loaded(data)) => data,
            Some(DataSource::Cached(path, loader)) => {
                loader(&path).map_err(TuningError::TrainingData)?
            }
            None => {
                return Err(TuningError::InvalidArgument(
                    "no training data provided".to_string(),
                ))
            }
        };
        if training.is_empty() {
            return Err(TuningError::InvalidArgument(
                "training data is empty".to_string(),
            ));
        }

        let mut features = self.features;
        for i in 0..dims {
            features[i] = features[i].clamp(self.min[i], self.max[i]);
        }
        let seed = self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });

        Ok(Asgd {
            m: vec![0.0; dims],
            n: vec![0.0; dims],
            momentum_pi: 1.0,
            t: 1,
            features,
            min: self.min,
            max: self.max,
            h: self.h,
            learning_rate: self.learning_rate,
            epsilon: self.epsilon,
            mu: self.mu,
            nu: self.nu,
            annealing_exponent: self.annealing_exponent,
            max_epoch: self.max_epoch,
            sample_size: self.sample_size,
            training,
            cost,
            rng: StdRng::seed_from_u64(seed),
            stop: self.stop,
        })
    }
}

pub struct Asgd<D> {
    features: Vec<f64>,
    min: Vec<f64>,
    max: Vec<f64>,
    m: Vec<f64>,
    n: Vec<f64>,
    /// Running product of the annealed momentum schedule through epoch
    /// `t - 1`.
    momentum_pi: f64,
    t: u64,
    h: f64,
    learning_rate: f64,
    epsilon: f64,
    mu: f64,
    nu: f64,
    annealing_exponent: f64,
    max_epoch: Option<u64>,
    sample_size: Option<usize>,
    training: Vec<D>,
    cost: CostFn<D>,
    rng: StdRng,
    stop: Option<Arc<AtomicBool>>,
}

impl<D: Sync> Asgd<D> {
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn epoch(&self) -> u64 {
        self.t
    }

    /// Mean cost of the current features over the full training set.
    pub fn full_cost(&self) -> f64 {
        let sum: f64 = self
            .training
            .iter()
            .map(|sample| (self.cost)(&self.features, sample))
            .sum();
        sum / self.training.len() as f64
    }

    /// Run epochs until convergence, cancellation or the epoch cap, and
    /// return the final feature vector.
    pub fn train(&mut self) -> &[f64] {
        while self.step() == StepOutcome::Stepped {}
        &self.features
    }

    /// Run a single epoch.
    pub fn step(&mut self) -> StepOutcome {
        if let Some(stop) = &self.stop {
            if stop.load(Ordering::Relaxed) {
                return StepOutcome::Cancelled;
            }
        }
        if let Some(cap) = self.max_epoch {
            if self.t > cap {
                return StepOutcome::EpochCapReached;
            }
        }

        let batch = self.sample_batch();
        let gradient = self.gradient(&batch);
        if gradient.iter().all(|&g| g == 0.0) {
            return StepOutcome::Converged;
        }

        let deltas = self.nadam_update(&gradient);
        self.log_epoch(&deltas);
        self.t += 1;
        StepOutcome::Stepped
    }

    fn sample_batch(&mut self) -> Vec<usize> {
        match self.sample_size {
            Some(size) => (0..size)
                .map(|_| self.rng.gen_range(0..self.training.len()))
                .collect(),
            None => (0..self.training.len()).collect(),
        }
    }

    /// Centered-difference gradient estimate, falling back to a one-sided
    /// difference against the box edges.
    fn gradient(&self, batch: &[usize]) -> Vec<f64> {
        let base_cost = self.batch_cost(&self.features, batch);
        (0..self.features.len())
            .into_par_iter()
            .map(|i| {
                let feature = self.features[i];
                if feature + self.h > self.max[i] {
                    let mut probe = self.features.clone();
                    probe[i] = feature - self.h;
                    (base_cost - self.batch_cost(&probe, batch)) / self.h
                } else if feature - self.h < self.min[i] {
                    let mut probe = self.features.clone();
                    probe[i] = feature + self.h;
                    (self.batch_cost(&probe, batch) - base_cost) / self.h
                } else {
                    let mut plus = self.features.clone();
                    plus[i] = feature + self.h;
                    let mut minus = self.features.clone();
                    minus[i] = feature - self.h;
                    (self.batch_cost(&plus, batch) - self.batch_cost(&minus, batch))
                        / (2.0 * self.h)
                }
            })
            .collect()
    }

    fn batch_cost(&self, features: &[f64], batch: &[usize]) -> f64 {
        let sum: f64 = batch
            .iter()
            .map(|&index| (self.cost)(features, &self.training[index]))
            .sum();
        sum / batch.len() as f64
    }

    /// Bias-corrected Nadam update with the annealed momentum schedule;
    /// returns the applied deltas.
    fn nadam_update(&mut self, gradient: &[f64]) -> Vec<f64> {
        let t = self.t as f64;
        let mu_t = self.mu * (1.0 - 0.5 * 0.96f64.powf(t * self.annealing_exponent));
        let mu_next = self.mu * (1.0 - 0.5 * 0.96f64.powf((t + 1.0) * self.annealing_exponent));
        let pi_t = self.momentum_pi * mu_t;
        let pi_next = pi_t * mu_next;

        let mut deltas = vec![0.0; gradient.len()];
        for i in 0..gradient.len() {
            let g = gradient[i];
            self.m[i] = self.mu * self.m[i] + (1.0 - self.mu) * g;
            self.n[i] = self.nu * self.n[i] + (1.0 - self.nu) * g * g;
            let m_hat = self.m[i] / (1.0 - pi_next);
            let g_hat = g / (1.0 - pi_t);
            let n_hat = self.n[i] / (1.0 - self.nu.powf(t));
            let m_bar = (1.0 - mu_t) * g_hat + mu_next * m_hat;
            let delta = self.learning_rate * m_bar / (n_hat.sqrt() + self.epsilon);
            deltas[i] = delta;
            self.features[i] = (self.features[i] - delta).clamp(self.min[i], self.max[i]);
        }
        self.momentum_pi = pi_t;
        deltas
    }

    fn log_epoch(&self, deltas: &[f64]) {
        if !log_enabled!(Level::Info) {
            return;
        }
        let mut ranked: Vec<(usize, f64)> = deltas
            .iter()
            .enumerate()
            .map(|(i, d)| (i, d.abs()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(5);
        info!(
            "epoch {}: cost {:.6}, top |delta| {:?}",
            self.t,
            self.full_cost(),
            ranked
        );
        debug!(
            "epoch {}: deltas {:?}, features {:?}",
            self.t, deltas, self.features
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic_builder() -> AsgdBuilder<()> {
        AsgdBuilder::new(vec![0.0, 0.0], vec![-10.0, -10.0], vec![10.0, 10.0])
            .cost_fn(|features, _| {
                (features[0] - 3.0).powi(2) + (features[1] + 2.0).powi(2)
            })
            .training_data(vec![()])
            .seed(7)
    }

    #[test]
    fn test_empty_features_rejected() {
        let result = AsgdBuilder::<()>::new(vec![], vec![], vec![])
            .cost_fn(|_, _| 0.0)
            .training_data(vec![()])
            .build();
        assert!(matches!(result, Err(TuningError::InvalidArgument(_))));
    }

    #[test]
    fn test_bad_decay_rejected() {
        let result = quadratic_builder().first_moment_decay(1.5).build();
        assert!(matches!(result, Err(TuningError::InvalidArgument(_))));
        let result = quadratic_builder().second_moment_decay(-0.1).build();
        assert!(matches!(result, Err(TuningError::InvalidArgument(_))));
    }

    #[test]
    fn test_narrow_box_rejected() {
        let result = AsgdBuilder::<()>::new(vec![0.0], vec![-1e-4], vec![1e-4])
            .cost_fn(|_, _| 0.0)
            .training_data(vec![()])
            .build();
        assert!(matches!(result, Err(TuningError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_sample_size_rejected() {
        let result = quadratic_builder().sample_size(0).build();
        assert!(matches!(result, Err(TuningError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_cost_or_data_rejected() {
        let no_cost = AsgdBuilder::<()>::new(vec![0.0], vec![-1.0], vec![1.0])
            .training_data(vec![()])
            .build();
        assert!(no_cost.is_err());
        let no_data = AsgdBuilder::<()>::new(vec![0.0], vec![-1.0], vec![1.0])
            .cost_fn(|_, _| 0.0)
            .build();
        assert!(no_data.is_err());
    }

    #[test]
    fn test_loader_failure_is_training_data_error() {
        let result = AsgdBuilder::<()>::new(vec![0.0], vec![-1.0], vec![1.0])
            .cost_fn(|_, _| 0.0)
            .cache_training_data("/nonexistent/data.epd", |path| {
                Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no file at {}", path.display()),
                )
                .into())
            })
            .build();
        assert!(matches!(result, Err(TuningError::TrainingData(_))));
    }

    #[test]
    fn test_zero_gradient_converges_immediately() {
        let mut asgd = AsgdBuilder::<()>::new(vec![0.5], vec![-1.0], vec![1.0])
            .cost_fn(|_, _| 42.0)
            .training_data(vec![()])
            .build()
            .unwrap();
        assert_eq!(asgd.step(), StepOutcome::Converged);
        assert_eq!(asgd.epoch(), 1);
    }

    #[test]
    fn test_cancellation_between_epochs() {
        let stop = Arc::new(AtomicBool::new(true));
        let mut asgd = quadratic_builder().stop_flag(Arc::clone(&stop)).build().unwrap();
        assert_eq!(asgd.step(), StepOutcome::Cancelled);
        stop.store(false, Ordering::Relaxed);
        assert_eq!(asgd.step(), StepOutcome::Stepped);
    }

    #[test]
    fn test_epoch_cap_respected() {
        let mut asgd = quadratic_builder().max_epoch(5).build().unwrap();
        let final_features = asgd.train().to_vec();
        assert_eq!(asgd.epoch(), 6);
        assert_eq!(asgd.features(), final_features.as_slice());
    }

    #[test]
    fn test_features_stay_inside_box() {
        let mut asgd = AsgdBuilder::new(vec![0.9], vec![-1.0], vec![1.0])
            // Steep slope pushing the feature upward against the boundary.
            .cost_fn(|features: &[f64], _: &()| -100.0 * features[0])
            .training_data(vec![()])
            .max_epoch(500)
            .seed(3)
            .build()
            .unwrap();
        asgd.train();
        let value = asgd.features()[0];
        assert!((-1.0..=1.0).contains(&value), "escaped box: {}", value);
        assert!(value > 0.95, "should ride the upper boundary: {}", value);
    }

    #[test]
    fn test_descent_on_quadratic_is_monotone_at_checkpoints() {
        let mut asgd = quadratic_builder().build().unwrap();
        let mut costs = vec![asgd.full_cost()];
        for _ in 0..10 {
            for _ in 0..1000 {
                if asgd.step() != StepOutcome::Stepped {
                    break;
                }
            }
            costs.push(asgd.full_cost());
        }
        for window in costs.windows(2).skip(1) {
            assert!(
                window[1] <= window[0] + 1e-4,
                "cost increased: {:?}",
                costs
            );
        }
        assert!(costs.last().unwrap() < &costs[0]);
    }

    #[test]
    fn test_convergence_to_quadratic_minimum() {
        let mut asgd = quadratic_builder().max_epoch(20_000).build().unwrap();
        asgd.train();
        let features = asgd.features();
        assert!(
            (features[0] - 3.0).abs() < 0.1,
            "x converged to {}",
            features[0]
        );
        assert!(
            (features[1] + 2.0).abs() < 0.1,
            "y converged to {}",
            features[1]
        );
    }

    #[test]
    fn test_sampling_is_deterministic_with_seed() {
        let run = || {
            let mut asgd = quadratic_builder()
                .sample_size(1)
                .max_epoch(50)
                .build()
                .unwrap();
            asgd.train().to_vec()
        };
        assert_eq!(run(), run());
    }
}
