use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// End-to-end hard timeout for a suggestion request (§4.6, §5).
pub const HARD_TIMEOUT_MS: u64 = 150;
/// Deadline for the composite cache Get (§4.6).
pub const CANDIDATE_RETRIEVAL_DEADLINE_MS: u64 = 20;
/// Deadline for running the scorer (§4.6, §4.9).
pub const RANKING_DEADLINE_MS: u64 = 10;
/// Row-count threshold above which a purge triggers an opportunistic vacuum (§4.7).
pub const VACUUM_THRESHOLD: u64 = 10_000;

/// Recognized configuration keys (§6.4), all optional with the spec's
/// stated defaults. Unknown keys in the TOML file are ignored by `serde`
/// (forward-compatible, matching the wire schema philosophy of §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retention_days: u32,
    pub auto_vacuum: bool,
    pub tau_ms: i64,
    pub cache_ttl_ms: i64,
    pub memory_budget_mb: u64,
    pub top_k: usize,
    pub pipeline_max_segments: usize,
    pub alias_max_depth: u32,
    pub scorer_weights: ScorerWeights,
    pub amplifier: AmplifierConfig,
    pub typing: TypingConfig,
    pub enable_recovery: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retention_days: 90,
            auto_vacuum: true,
            tau_ms: 7 * 86_400_000,
            cache_ttl_ms: 5 * 60_000,
            memory_budget_mb: 50,
            top_k: 3,
            pipeline_max_segments: nextcmd_normalize::DEFAULT_MAX_SEGMENTS,
            alias_max_depth: 5,
            scorer_weights: ScorerWeights::default(),
            amplifier: AmplifierConfig::default(),
            typing: TypingConfig::default(),
            enable_recovery: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerWeights {
    pub repo_trans: f64,
    pub dir_trans: f64,
    pub global_trans: f64,
    pub dir_freq: f64,
    pub repo_freq: f64,
    pub global_freq: f64,
    pub project_task: f64,
    pub dangerous_penalty: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        let d = nextcmd_engine::ScoreConfig::default();
        Self {
            repo_trans: d.weight_repo_trans,
            dir_trans: d.weight_dir_trans,
            global_trans: d.weight_global_trans,
            dir_freq: d.weight_dir_freq,
            repo_freq: d.weight_repo_freq,
            global_freq: d.weight_global_freq,
            project_task: d.weight_project_task,
            dangerous_penalty: d.dangerous_penalty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplifierConfig {
    pub workflow_boost_factor: f64,
    pub pipeline_confidence_weight: f64,
    pub recovery_boost_factor: f64,
    pub dismissal_penalty_factor: f64,
}

impl Default for AmplifierConfig {
    fn default() -> Self {
        let d = nextcmd_engine::ScoreConfig::default();
        Self {
            workflow_boost_factor: d.workflow_boost_factor,
            pipeline_confidence_weight: d.pipeline_confidence_weight,
            recovery_boost_factor: d.recovery_boost_factor,
            dismissal_penalty_factor: d.dismissal_penalty_factor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub fast_threshold_ms: i64,
    pub pause_threshold_ms: i64,
    pub idle_timeout_ms: i64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            fast_threshold_ms: 100,
            pause_threshold_ms: 300,
            idle_timeout_ms: 2_000,
        }
    }
}

impl Config {
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.tau_ms = config.tau_ms.max(nextcmd_types::MIN_TAU_MS);
        Ok(config)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(Error::from)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn score_config(&self) -> nextcmd_engine::ScoreConfig {
        nextcmd_engine::ScoreConfig {
            tau_ms: self.tau_ms,
            weight_repo_trans: self.scorer_weights.repo_trans,
            weight_dir_trans: self.scorer_weights.dir_trans,
            weight_global_trans: self.scorer_weights.global_trans,
            weight_dir_freq: self.scorer_weights.dir_freq,
            weight_repo_freq: self.scorer_weights.repo_freq,
            weight_global_freq: self.scorer_weights.global_freq,
            weight_project_task: self.scorer_weights.project_task,
            dangerous_penalty: self.scorer_weights.dangerous_penalty,
            workflow_boost_factor: self.amplifier.workflow_boost_factor,
            pipeline_confidence_weight: self.amplifier.pipeline_confidence_weight,
            recovery_boost_factor: self.amplifier.recovery_boost_factor,
            dismissal_penalty_factor: self.amplifier.dismissal_penalty_factor,
            default_top_k: self.top_k,
            frequency_candidate_limit: 25,
        }
    }

    pub fn write_config(&self) -> nextcmd_engine::WriteConfig {
        nextcmd_engine::WriteConfig {
            tau_ms: self.tau_ms,
            pipeline_max_segments: self.pipeline_max_segments,
            slot_tuple_positions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_defaults() {
        let c = Config::default();
        assert_eq!(c.retention_days, 90);
        assert_eq!(c.top_k, 3);
        assert_eq!(c.tau_ms, 7 * 86_400_000);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.retention_days = 30;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.retention_days, 30);
    }

    #[test]
    fn load_nonexistent_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.retention_days, 90);
    }

    #[test]
    fn load_clamps_a_sub_day_tau_ms_to_the_one_day_floor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.tau_ms = 1_000;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.tau_ms, nextcmd_types::MIN_TAU_MS);
    }
}
