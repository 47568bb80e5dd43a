//! Black-box search over decomposition parameters.
//!
//! The search knows nothing about the pipeline: it proposes `(alpha, k)`
//! candidates and reads back a scalar objective from a caller-supplied closure.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use andeped_core::config::SearchConfig;
use andeped_core::{AndepedError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub alpha_min: f64,
    pub alpha_max: f64,
    pub k_min: usize,
    pub k_max: usize,
}

impl ParameterSpace {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            alpha_min: config.alpha_min,
            alpha_max: config.alpha_max,
            k_min: config.k_min,
            k_max: config.k_max,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.alpha_min.is_finite() && self.alpha_max.is_finite())
            || self.alpha_min <= 0.0
            || self.alpha_min > self.alpha_max
        {
            return Err(AndepedError::InvalidParameter(format!(
                "alpha range [{}, {}] is invalid",
                self.alpha_min, self.alpha_max
            )));
        }
        if self.k_min == 0 || self.k_min > self.k_max {
            return Err(AndepedError::InvalidParameter(format!(
                "k range [{}, {}] is invalid",
                self.k_min, self.k_max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub alpha: f64,
    pub k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Minimize,
    Maximize,
}

impl Direction {
    fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Minimize => candidate < incumbent,
            Direction::Maximize => candidate > incumbent,
        }
    }
}

/// One evaluated candidate plus whatever the objective produced alongside the score.
#[derive(Debug, Clone)]
pub struct Trial<A> {
    pub number: usize,
    pub candidate: Candidate,
    pub objective: f64,
    pub artefact: A,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<A> {
    pub best: Trial<A>,
    /// `(candidate, objective)` of every trial in evaluation order.
    pub history: Vec<(Candidate, f64)>,
}

/// Progress of a single search. Lives on the stack of `RandomSearch::run`.
#[derive(Debug, Clone, Copy, Default)]
struct SearchProgress {
    completed: usize,
    total: usize,
}

/// Seeded uniform random search.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    pub trials: usize,
    pub seed: u64,
    pub direction: Direction,
}

impl RandomSearch {
    pub fn new(trials: usize, seed: u64, direction: Direction) -> Self {
        Self { trials, seed, direction }
    }

    /// Evaluate `trials` candidates and keep the best finite objective.
    ///
    /// Errors from the objective abort the search.
    pub fn run<A, F>(&self, space: &ParameterSpace, mut objective: F) -> Result<SearchOutcome<A>>
    where
        F: FnMut(&Candidate) -> Result<(f64, A)>,
    {
        space.validate()?;
        if self.trials == 0 {
            return Err(AndepedError::InvalidParameter(
                "search needs at least one trial".into(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut progress = SearchProgress {
            completed: 0,
            total: self.trials,
        };
        let mut best: Option<Trial<A>> = None;
        let mut history = Vec::with_capacity(self.trials);

        for number in 0..self.trials {
            let candidate = Candidate {
                alpha: rng.gen_range(space.alpha_min..=space.alpha_max),
                k: rng.gen_range(space.k_min..=space.k_max),
            };
            let (value, artefact) = objective(&candidate)?;
            history.push((candidate, value));
            progress.completed += 1;
            debug!(
                trial = number,
                alpha = candidate.alpha,
                k = candidate.k,
                objective = value,
                "trial {}/{} finished",
                progress.completed,
                progress.total
            );

            if !value.is_finite() {
                continue;
            }
            let better = match &best {
                None => true,
                Some(b) => self.direction.improves(value, b.objective),
            };
            if better {
                best = Some(Trial {
                    number,
                    candidate,
                    objective: value,
                    artefact,
                });
            }
        }

        let best = best.ok_or_else(|| {
            AndepedError::DegenerateDecomposition(format!(
                "none of {} trials produced a finite objective",
                progress.total
            ))
        })?;
        info!(
            trial = best.number,
            alpha = best.candidate.alpha,
            k = best.candidate.k,
            objective = best.objective,
            "search finished"
        );
        Ok(SearchOutcome { best, history })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> ParameterSpace {
        ParameterSpace {
            alpha_min: 1.0,
            alpha_max: 100.0,
            k_min: 1,
            k_max: 5,
        }
    }

    #[test]
    fn candidates_stay_in_space() {
        let search = RandomSearch::new(50, 1, Direction::Minimize);
        let outcome = search.run(&space(), |c| Ok((c.alpha, ()))).unwrap();
        for (c, _) in &outcome.history {
            assert!((1.0..=100.0).contains(&c.alpha));
            assert!((1..=5).contains(&c.k));
        }
        assert_eq!(outcome.history.len(), 50);
    }

    #[test]
    fn picks_minimum_or_maximum() {
        let min = RandomSearch::new(20, 9, Direction::Minimize)
            .run(&space(), |c| Ok((c.alpha, c.k)))
            .unwrap();
        let lowest = min.history.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
        assert_eq!(min.best.objective, lowest);
        assert_eq!(min.best.artefact, min.best.candidate.k);

        let max = RandomSearch::new(20, 9, Direction::Maximize)
            .run(&space(), |c| Ok((c.alpha, ())))
            .unwrap();
        let highest = max.history.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(max.best.objective, highest);
    }

    #[test]
    fn same_seed_same_history() {
        let search = RandomSearch::new(10, 123, Direction::Maximize);
        let a = search.run(&space(), |c| Ok((c.alpha, ()))).unwrap();
        let b = search.run(&space(), |c| Ok((c.alpha, ()))).unwrap();
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn non_finite_objectives_are_skipped() {
        let mut calls = 0;
        let outcome = RandomSearch::new(3, 5, Direction::Minimize)
            .run(&space(), |_| {
                calls += 1;
                Ok((if calls == 2 { 1.0 } else { f64::NAN }, calls))
            })
            .unwrap();
        assert_eq!(outcome.best.artefact, 2);
    }

    #[test]
    fn all_non_finite_is_error() {
        let err = RandomSearch::new(3, 5, Direction::Minimize)
            .run(&space(), |_| Ok((f64::NAN, ())))
            .unwrap_err();
        assert!(matches!(err, AndepedError::DegenerateDecomposition(_)));
    }

    #[test]
    fn objective_error_aborts() {
        let err = RandomSearch::new(3, 5, Direction::Minimize)
            .run::<(), _>(&space(), |_| Err(AndepedError::ZeroFrequency("test".into())))
            .unwrap_err();
        assert!(matches!(err, AndepedError::ZeroFrequency(_)));
    }

    #[test]
    fn invalid_space_rejected() {
        let bad = ParameterSpace { k_min: 0, ..space() };
        assert!(RandomSearch::new(1, 0, Direction::Minimize)
            .run(&bad, |_| Ok((0.0, ())))
            .is_err());
    }
}
