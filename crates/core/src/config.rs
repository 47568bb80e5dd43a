use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::params::Mode;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "t"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Identifier stamped on every exported file.
    pub test_id: String,
    pub algorithms: Vec<String>,
    pub stream: StreamConfig,
    pub decomposition: DecompositionConfig,
    pub search: SearchConfig,
    pub scoring: ScoringConfig,
    pub paths: PathsConfig,
}

const DEFAULT_ALGORITHMS: &str = "windowedGaussian,bayesChangePt";

impl HarnessConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ANDEPED_PROFILE`. When set (e.g. `BENCH`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ANDEPED_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            test_id: profiled_env_or(p, "TEST_ID", "00001"),
            algorithms: profiled_env_or(p, "ALGORITHMS", DEFAULT_ALGORITHMS)
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            stream: StreamConfig::from_env_profiled(p),
            decomposition: DecompositionConfig::from_env_profiled(p),
            search: SearchConfig::from_env_profiled(p),
            scoring: ScoringConfig::from_env_profiled(p),
            paths: PathsConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  algorithms:    {}", self.algorithms.join(", "));
        tracing::info!(
            "  stream:        mode={}, L={}, range=[{}, {}], truncate_pattern={}",
            self.stream.mode,
            self.stream.length_budget,
            self.stream.scale_min,
            self.stream.scale_max,
            self.stream.truncate_pattern
        );
        tracing::info!(
            "  decomposition: tau={}, tol={:e}, max_iter={}, sum_from={}",
            self.decomposition.tau,
            self.decomposition.tol,
            self.decomposition.max_iterations,
            self.decomposition.sum_from
        );
        tracing::info!(
            "  search:        trials={}, alpha=[{}, {}], k=[{}, {}], seed={}",
            self.search.trials,
            self.search.alpha_min,
            self.search.alpha_max,
            self.search.k_min,
            self.search.k_max,
            self.search.seed
        );
        tracing::info!(
            "  scoring:       window={}, normalize={}, rising_edge={}",
            self.scoring
                .fixed_window_size
                .map(|w| w.to_string())
                .unwrap_or_else(|| "NAB".into()),
            self.scoring.normalize,
            self.scoring.rising_edge
        );
        tracing::info!(
            "  paths:         offline={}, online={}, results={}",
            self.paths.offline_dir.display(),
            self.paths.online_dir.display(),
            self.paths.results_dir.display()
        );
    }
}

// ── Streaming ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub mode: Mode,
    /// `L`: trailing residual length handed to the detector side.
    pub length_budget: usize,
    pub scale_min: f64,
    pub scale_max: f64,
    /// Cut the precomputed pattern to a whole number of its longest period.
    pub truncate_pattern: bool,
}

impl StreamConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            mode: profiled_env_or(p, "MODE", "II")
                .parse()
                .unwrap_or(Mode::Precomputed),
            length_budget: profiled_env_parse(p, "LENGTH_BUDGET", 200),
            scale_min: profiled_env_parse(p, "SCALE_MIN", -1.0),
            scale_max: profiled_env_parse(p, "SCALE_MAX", 1.0),
            truncate_pattern: profiled_env_bool(p, "TRUNCATE_PATTERN", false),
        }
    }
}

// ── Decomposition ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionConfig {
    /// Noise tolerance (dual ascent step); 0 disables the Lagrangian update.
    pub tau: f64,
    pub tol: f64,
    pub max_iterations: usize,
    /// Pin the first mode to zero frequency.
    pub dc: bool,
    /// Components from this index onward form the background.
    pub sum_from: usize,
}

impl DecompositionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            tau: profiled_env_parse(p, "VMD_TAU", 0.0),
            tol: profiled_env_parse(p, "VMD_TOL", 1e-7),
            max_iterations: profiled_env_parse(p, "VMD_MAX_ITERATIONS", 500),
            dc: profiled_env_bool(p, "VMD_DC", false),
            sum_from: profiled_env_parse(p, "VMD_SUM_FROM", 0),
        }
    }
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            tau: 0.0,
            tol: 1e-7,
            max_iterations: 500,
            dc: false,
            sum_from: 0,
        }
    }
}

// ── Parameter search ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub trials: usize,
    pub alpha_min: f64,
    pub alpha_max: f64,
    pub k_min: usize,
    pub k_max: usize,
    pub seed: u64,
}

impl SearchConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            trials: profiled_env_parse(p, "SEARCH_TRIALS", 30),
            alpha_min: profiled_env_parse(p, "ALPHA_MIN", 1.0),
            alpha_max: profiled_env_parse(p, "ALPHA_MAX", 5000.0),
            k_min: profiled_env_parse(p, "K_MIN", 1),
            k_max: profiled_env_parse(p, "K_MAX", 15),
            seed: profiled_env_parse(p, "SEARCH_SEED", 42),
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// `None` selects the NAB window size formula.
    pub fixed_window_size: Option<usize>,
    pub normalize: bool,
    pub rising_edge: bool,
    /// Profile key inside the thresholds file.
    pub threshold_profile: String,
}

impl ScoringConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            fixed_window_size: profiled_env_opt(p, "WINDOW_SIZE")
                .filter(|v| !v.eq_ignore_ascii_case("nab"))
                .and_then(|v| v.parse().ok()),
            normalize: profiled_env_bool(p, "NORMALIZE_METRICS", true),
            rising_edge: profiled_env_bool(p, "RISING_EDGE", true),
            threshold_profile: profiled_env_or(p, "THRESHOLD_PROFILE", "standard"),
        }
    }
}

// ── Paths ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub offline_dir: PathBuf,
    pub online_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Where winning mode patterns are exported.
    pub pattern_dir: PathBuf,
    pub labels_file: Option<PathBuf>,
    pub thresholds_file: Option<PathBuf>,
}

impl PathsConfig {
    fn from_env_profiled(p: &str) -> Self {
        let results_dir = PathBuf::from(profiled_env_or(p, "RESULTS_DIR", "results"));
        let pattern_dir = PathBuf::from(profiled_env_or(
            p,
            "PATTERN_DIR",
            results_dir.join("modesums").to_str().unwrap_or("results/modesums"),
        ));
        Self {
            offline_dir: PathBuf::from(profiled_env_or(p, "OFFLINE_DATA_DIR", "data_offline")),
            online_dir: PathBuf::from(profiled_env_or(p, "ONLINE_DATA_DIR", "data_online")),
            results_dir,
            pattern_dir,
            labels_file: profiled_env_opt(p, "LABELS_FILE").map(PathBuf::from),
            thresholds_file: profiled_env_opt(p, "THRESHOLDS_FILE").map(PathBuf::from),
        }
    }
}
