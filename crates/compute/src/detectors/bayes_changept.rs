//! Bayesian online changepoint detection (Adams & MacKay, 2007).
//!
//! Maintains a posterior over the current run length with a Student-t
//! predictive model and a constant hazard. The anomaly score grows when the
//! most probable run length collapses relative to the previous step.

use andeped_core::Result;

use super::{Detector, DetectorOptions};

const MAX_RUN_LENGTH: usize = 500;
const LAMBDA: f64 = 250.0;

/// Conjugate Normal-Gamma parameters, one entry per run length.
#[derive(Debug, Clone)]
struct StudentT {
    alpha0: f64,
    beta0: f64,
    kappa0: f64,
    mu0: f64,
    alpha: Vec<f64>,
    beta: Vec<f64>,
    kappa: Vec<f64>,
    mu: Vec<f64>,
    max_len: usize,
}

impl StudentT {
    fn new(alpha: f64, beta: f64, kappa: f64, mu: f64, max_len: usize) -> Self {
        Self {
            alpha0: alpha,
            beta0: beta,
            kappa0: kappa,
            mu0: mu,
            alpha: vec![alpha],
            beta: vec![beta],
            kappa: vec![kappa],
            mu: vec![mu],
            max_len,
        }
    }

    /// Predictive density of `x` under each run length's parameters.
    fn pdf(&self, x: f64) -> Vec<f64> {
        (0..self.mu.len())
            .map(|i| {
                let df = 2.0 * self.alpha[i];
                let scale =
                    (self.beta[i] * (self.kappa[i] + 1.0) / (self.alpha[i] * self.kappa[i])).sqrt();
                student_t_pdf(x, df, self.mu[i], scale)
            })
            .collect()
    }

    /// Posterior update; run length `i` becomes `i + 1` and the prior is
    /// prepended as run length 0. Entries past `max_len` are never read.
    fn update(&mut self, x: f64) {
        let n = self.mu.len().min(self.max_len - 1);
        let mut mu = Vec::with_capacity(n + 1);
        let mut kappa = Vec::with_capacity(n + 1);
        let mut alpha = Vec::with_capacity(n + 1);
        let mut beta = Vec::with_capacity(n + 1);
        mu.push(self.mu0);
        kappa.push(self.kappa0);
        alpha.push(self.alpha0);
        beta.push(self.beta0);
        for i in 0..n {
            let k = self.kappa[i];
            mu.push((k * self.mu[i] + x) / (k + 1.0));
            kappa.push(k + 1.0);
            alpha.push(self.alpha[i] + 0.5);
            beta.push(self.beta[i] + k * (x - self.mu[i]).powi(2) / (2.0 * (k + 1.0)));
        }
        self.mu = mu;
        self.kappa = kappa;
        self.alpha = alpha;
        self.beta = beta;
    }
}

fn student_t_pdf(x: f64, df: f64, loc: f64, scale: f64) -> f64 {
    let z = (x - loc) / scale;
    let log_norm = libm::lgamma((df + 1.0) / 2.0)
        - libm::lgamma(df / 2.0)
        - 0.5 * (df * std::f64::consts::PI).ln()
        - scale.ln();
    (log_norm - (df + 1.0) / 2.0 * (1.0 + z * z / df).ln()).exp()
}

#[derive(Debug, Clone)]
pub struct BayesChangePtDetector {
    max_run_length: usize,
    hazard: f64,
    /// Run length posterior for the previous and current record.
    previous: Vec<f64>,
    current: Vec<f64>,
    record_number: usize,
    previous_max_run: usize,
    likelihood: StudentT,
}

impl BayesChangePtDetector {
    pub fn new(_options: DetectorOptions) -> Self {
        Self::with_limits(MAX_RUN_LENGTH, LAMBDA)
    }

    pub fn with_limits(max_run_length: usize, lambda: f64) -> Self {
        let max_run_length = max_run_length.max(1);
        let mut previous = vec![0.0; max_run_length + 2];
        // Record 0 is a boundary: run length is known to be 0.
        previous[0] = 1.0;
        Self {
            max_run_length,
            hazard: 1.0 / lambda,
            previous,
            current: vec![0.0; max_run_length + 2],
            record_number: 0,
            previous_max_run: 1,
            likelihood: StudentT::new(0.1, 0.001, 1.0, 0.0, max_run_length + 1),
        }
    }
}

impl Detector for BayesChangePtDetector {
    fn name(&self) -> &str {
        "bayesChangePt"
    }

    fn score(&mut self, value: f64) -> Result<f64> {
        if self.record_number > 0 {
            std::mem::swap(&mut self.previous, &mut self.current);
            self.current.iter_mut().for_each(|p| *p = 0.0);
        }

        let predictive = self.likelihood.pdf(value);
        let idx = self.record_number.min(self.max_run_length);

        let mut changepoint_mass = 0.0;
        for i in 0..=idx {
            let joint = self.previous[i] * predictive[i];
            self.current[i + 1] = joint * (1.0 - self.hazard);
            changepoint_mass += joint * self.hazard;
        }
        self.current[0] = changepoint_mass;

        let total: f64 = self.current.iter().sum();
        if total > 0.0 && total.is_finite() {
            self.current.iter_mut().for_each(|p| *p /= total);
        } else {
            // Every run length became implausible: restart from a changepoint.
            self.current.iter_mut().for_each(|p| *p = 0.0);
            self.current[0] = 1.0;
        }

        self.likelihood.update(value);

        let max_run = self
            .current
            .iter()
            .enumerate()
            .fold((0usize, f64::NEG_INFINITY), |(best_i, best_p), (i, &p)| {
                if p > best_p { (i, p) } else { (best_i, best_p) }
            })
            .0;

        let score = if max_run < self.previous_max_run {
            1.0 - max_run as f64 / self.previous_max_run as f64
        } else {
            0.0
        };

        self.record_number += 1;
        self.previous_max_run = max_run;

        Ok(score)
    }
}
