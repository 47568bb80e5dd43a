//! Variational mode decomposition (Dragomiretskiy & Zosso, 2014).
//!
//! The signal is mirror-extended to twice its length, moved to the frequency
//! domain, and `k` band-limited modes are fitted with ADMM updates on the
//! positive half of the spectrum. Centre frequencies start uniformly spread
//! over `[0, 0.5)`.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

use andeped_core::config::DecompositionConfig;
use andeped_core::{AndepedError, Result};

use super::{Decomposer, Decomposition};

type C64 = Complex<f64>;

/// Reference decomposition routine.
#[derive(Debug, Clone)]
pub struct Vmd {
    tau: f64,
    tol: f64,
    max_iterations: usize,
    dc: bool,
    sum_from: usize,
    strict_convergence: bool,
}

impl Default for Vmd {
    fn default() -> Self {
        Self::from_config(&DecompositionConfig::default())
    }
}

impl Vmd {
    pub fn from_config(config: &DecompositionConfig) -> Self {
        Self {
            tau: config.tau,
            tol: config.tol,
            max_iterations: config.max_iterations.max(2),
            dc: config.dc,
            sum_from: config.sum_from,
            strict_convergence: false,
        }
    }

    /// Treat hitting the iteration cap as a degenerate decomposition.
    pub fn with_strict_convergence(mut self, strict: bool) -> Self {
        self.strict_convergence = strict;
        self
    }

    /// Decompose into `k` modes. Returns the modes (each `values.len()` rounded
    /// down to even), the final centre frequencies, and the iteration count.
    pub fn modes(&self, values: &[f64], alpha: f64, k: usize) -> Result<ModeSet> {
        if k == 0 {
            return Err(AndepedError::DegenerateDecomposition(
                "mode count must be positive".into(),
            ));
        }
        let n = values.len() - values.len() % 2;
        if n < 2 {
            return Err(AndepedError::DegenerateDecomposition(format!(
                "need at least two samples, got {}",
                values.len()
            )));
        }
        let signal = &values[..n];

        // Mirror-extend: reversed first half, signal, reversed second half.
        let half = n / 2;
        let t_len = 2 * n;
        let mut mirrored: Vec<C64> = Vec::with_capacity(t_len);
        mirrored.extend(signal[..half].iter().rev().map(|&v| C64::new(v, 0.0)));
        mirrored.extend(signal.iter().map(|&v| C64::new(v, 0.0)));
        mirrored.extend(signal[n - half..].iter().rev().map(|&v| C64::new(v, 0.0)));

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(t_len);
        let ifft = planner.plan_fft_inverse(t_len);

        fft.process(&mut mirrored);
        let mut f_hat_plus = centre_shift(&mirrored);
        for bin in f_hat_plus.iter_mut().take(t_len / 2) {
            *bin = C64::new(0.0, 0.0);
        }

        let freqs: Vec<f64> = (0..t_len)
            .map(|i| i as f64 / t_len as f64 - 0.5)
            .collect();

        let mut omega: Vec<f64> = (0..k).map(|i| 0.5 / k as f64 * i as f64).collect();
        if self.dc {
            omega[0] = 0.0;
        }

        let zero = C64::new(0.0, 0.0);
        let mut lambda = vec![zero; t_len];
        let mut u_prev = vec![vec![zero; t_len]; k];
        let mut u_next = vec![vec![zero; t_len]; k];
        let mut sum_uk = vec![zero; t_len];

        let mut u_diff = self.tol + f64::EPSILON;
        let mut iterations = 0usize;

        while u_diff > self.tol && iterations < self.max_iterations - 1 {
            for mode in 0..k {
                // Running sum of all other modes, mixing fresh and previous estimates.
                let (added, removed) = if mode == 0 {
                    (&u_prev[k - 1], &u_prev[0])
                } else {
                    (&u_next[mode - 1], &u_prev[mode])
                };
                for i in 0..t_len {
                    sum_uk[i] = added[i] + sum_uk[i] - removed[i];
                }

                let w = omega[mode];
                for i in 0..t_len {
                    let denom = 1.0 + alpha * (freqs[i] - w).powi(2);
                    u_next[mode][i] = (f_hat_plus[i] - sum_uk[i] - lambda[i] / 2.0) / denom;
                }

                if !(self.dc && mode == 0) {
                    if let Some(centre) = spectral_centroid(&u_next[mode], &freqs) {
                        omega[mode] = centre;
                    }
                }
            }

            if self.tau != 0.0 {
                for i in 0..t_len {
                    let total: C64 = u_next.iter().map(|u| u[i]).sum();
                    lambda[i] += (total - f_hat_plus[i]) * self.tau;
                }
            }

            iterations += 1;

            u_diff = f64::EPSILON;
            for mode in 0..k {
                let energy: f64 = u_next[mode]
                    .iter()
                    .zip(&u_prev[mode])
                    .map(|(a, b)| (a - b).norm_sqr())
                    .sum();
                u_diff += energy / t_len as f64;
            }

            std::mem::swap(&mut u_prev, &mut u_next);
        }

        let converged = u_diff <= self.tol;
        debug!(iterations, converged, u_diff, "vmd finished");

        // Rebuild the full Hermitian spectrum of each mode and return to time domain.
        let quarter = t_len / 4;
        let mut modes = Vec::with_capacity(k);
        for u_plus in &u_prev {
            let mut u_hat = vec![zero; t_len];
            u_hat[t_len / 2..].copy_from_slice(&u_plus[t_len / 2..]);
            for j in 0..t_len / 2 {
                u_hat[t_len / 2 - j] = u_plus[t_len / 2 + j].conj();
            }
            u_hat[0] = u_hat[t_len - 1].conj();

            let mut time = centre_shift(&u_hat);
            ifft.process(&mut time);
            let mode: Vec<f64> = time[quarter..quarter + n]
                .iter()
                .map(|c| c.re / t_len as f64)
                .collect();
            modes.push(mode);
        }

        let all_finite = modes.iter().flatten().chain(&omega).all(|v| v.is_finite());
        if !all_finite {
            return Err(AndepedError::DegenerateDecomposition(
                "decomposition produced non-finite values".into(),
            ));
        }

        Ok(ModeSet {
            modes,
            center_frequencies: omega,
            iterations,
            converged,
        })
    }
}

/// Raw decomposition output.
#[derive(Debug, Clone)]
pub struct ModeSet {
    pub modes: Vec<Vec<f64>>,
    pub center_frequencies: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl Decomposer for Vmd {
    fn decompose(&self, values: &[f64], alpha: f64, k: usize) -> Result<Decomposition> {
        let set = self.modes(values, alpha, k)?;

        if !set.converged && self.strict_convergence {
            return Err(AndepedError::DegenerateDecomposition(format!(
                "no convergence after {} iterations",
                set.iterations
            )));
        }

        let background = &set.modes[self.sum_from.min(set.modes.len())..];
        if background.is_empty() {
            return Err(AndepedError::DegenerateDecomposition(format!(
                "no components left after skipping the first {}",
                self.sum_from
            )));
        }

        let mut component_sum = vec![0.0; background[0].len()];
        for mode in background {
            for (acc, v) in component_sum.iter_mut().zip(mode) {
                *acc += v;
            }
        }
        // Odd inputs lose their last sample to the decomposition; repeat the final value.
        if let Some(&last) = component_sum.last() {
            component_sum.resize(values.len(), last);
        }

        let residual = values
            .iter()
            .zip(&component_sum)
            .map(|(v, bg)| v - bg)
            .collect();

        Ok(Decomposition {
            residual,
            center_frequencies: set.center_frequencies,
            component_sum,
            iterations: set.iterations,
            converged: set.converged,
        })
    }
}

/// Swap spectrum halves. For even lengths this is its own inverse.
fn centre_shift(spectrum: &[C64]) -> Vec<C64> {
    let mut out = spectrum.to_vec();
    out.rotate_left(spectrum.len() / 2);
    out
}

/// Power-weighted mean frequency over the positive half of the spectrum.
fn spectral_centroid(u: &[C64], freqs: &[f64]) -> Option<f64> {
    let start = u.len() / 2;
    let mut weighted = 0.0;
    let mut power = 0.0;
    for (c, &f) in u[start..].iter().zip(&freqs[start..]) {
        let p = c.norm_sqr();
        weighted += f * p;
        power += p;
    }
    if power > 0.0 {
        Some(weighted / power)
    } else {
        None
    }
}
