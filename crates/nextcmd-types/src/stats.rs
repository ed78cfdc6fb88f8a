use crate::scope::Scope;
use serde::{Deserialize, Serialize};

/// Decayed-frequency aggregate (§3 `CommandStat`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandStat {
    pub scope: Scope,
    pub template_id: String,
    pub score: f64,
    pub success_count: i64,
    pub failure_count: i64,
    pub last_seen_ms: i64,
}

impl CommandStat {
    /// Re-decay `score` to `now_ms` without mutating the stored row.
    /// Every read that compares two entries must do this to a common "now".
    pub fn decayed_score(&self, now_ms: i64, tau_ms: i64) -> f64 {
        decay(self.score, self.last_seen_ms, now_ms, tau_ms)
    }
}

/// τ is clamped to a minimum of 1 day (§4.4 step 3, §6.4), regardless of
/// what a caller or a loaded config passes in.
pub const MIN_TAU_MS: i64 = 86_400_000;

/// Fold the decay recurrence `s <- s * exp(-(dt)/tau)`. Shared by every
/// aggregate with a decayed weight (§8 property 3).
pub fn decay(score: f64, last_ts: i64, now_ms: i64, tau_ms: i64) -> f64 {
    let dt = (now_ms - last_ts).max(0) as f64;
    let tau = tau_ms.max(MIN_TAU_MS) as f64;
    score * (-dt / tau).exp()
}

/// Decayed-frequency aggregate for an active project type in a scope
/// (§4.4 step 6). Keyed by (scope, project_type) the same way
/// `CommandStat` is keyed by (scope, template_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTypeStat {
    pub scope: Scope,
    pub project_type: String,
    pub score: f64,
    pub last_seen_ms: i64,
}

impl ProjectTypeStat {
    pub fn decayed_score(&self, now_ms: i64, tau_ms: i64) -> f64 {
        decay(self.score, self.last_seen_ms, now_ms, tau_ms)
    }
}

/// Project-type-scoped bigram transition (§4.4 step 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTypeTransition {
    pub scope: Scope,
    pub project_type: String,
    pub prev_template_id: String,
    pub next_template_id: String,
    pub weight: f64,
    pub last_seen_ms: i64,
}

impl ProjectTypeTransition {
    pub fn decayed_weight(&self, now_ms: i64, tau_ms: i64) -> f64 {
        decay(self.weight, self.last_seen_ms, now_ms, tau_ms)
    }
}

/// Bigram transition aggregate (§3 `TransitionStat`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionStat {
    pub scope: Scope,
    pub prev_template_id: String,
    pub next_template_id: String,
    pub weight: f64,
    pub count: i64,
    pub last_seen_ms: i64,
}

impl TransitionStat {
    pub fn decayed_weight(&self, now_ms: i64, tau_ms: i64) -> f64 {
        decay(self.weight, self.last_seen_ms, now_ms, tau_ms)
    }
}

/// Per-template distribution of a single slot position's values (§3 `SlotStat`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStat {
    pub template_id: String,
    pub position: usize,
    pub value: String,
    pub count: i64,
    pub last_seen_ms: i64,
}

/// Co-occurrence of a configured tuple of slot positions (§3 `SlotCorrelation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCorrelation {
    pub template_id: String,
    pub positions: Vec<usize>,
    pub tuple_hash: String,
    pub values: Vec<String>,
    pub count: i64,
    pub last_seen_ms: i64,
}

/// Adjacent-segment bigram within pipelines (§3 `PipelineTransition`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTransition {
    pub scope: Scope,
    pub prev_template_id: String,
    pub next_template_id: String,
    pub operator: crate::event::BoundaryOp,
    pub weight: f64,
    pub count: i64,
    pub last_seen_ms: i64,
}

impl PipelineTransition {
    pub fn decayed_weight(&self, now_ms: i64, tau_ms: i64) -> f64 {
        decay(self.weight, self.last_seen_ms, now_ms, tau_ms)
    }
}

/// Whole-chain pipeline pattern (§3 `PipelinePattern`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePattern {
    pub scope: Scope,
    pub pattern_hash: String,
    pub display: String,
    pub operator_chain: String,
    pub count: i64,
    pub last_seen_ms: i64,
}

/// Closed set of exit-code classes used to key `FailureRecovery` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitClass {
    General,
    NotFound,
    Sigint,
    Sigkill,
    Unknown,
}

impl ExitClass {
    /// Classify a raw process exit code. Negative codes encode a signal
    /// number as `-signum` by convention of the ingestion boundary (§6.1).
    pub fn from_exit_code(exit_code: i32) -> Self {
        match exit_code {
            0 => ExitClass::General, // not meaningful for a success code; callers gate on failure first
            127 => ExitClass::NotFound,
            130 => ExitClass::Sigint,
            137 => ExitClass::Sigkill,
            code if code < 0 => ExitClass::Unknown,
            _ => ExitClass::General,
        }
    }
}

/// Whether a recovery row was observed from real user behavior or seeded
/// ahead of time (§8 scenario S4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySource {
    Learned,
    Bootstrap,
}

/// Failure -> recovery aggregate (§3 `FailureRecovery`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecovery {
    pub scope: Scope,
    pub failed_template_id: String,
    pub exit_class: ExitClass,
    pub recovery_template_id: String,
    pub weight: f64,
    pub count: i64,
    pub success_rate: f64,
    pub source: RecoverySource,
    pub last_seen_ms: i64,
}

impl FailureRecovery {
    /// Running moving average: `rate <- (n-1)/n * rate_old + (exit==0 ? 1 : 0)/n`.
    pub fn record_outcome(&mut self, recovery_exit_code: i32, now_ms: i64) {
        self.count += 1;
        let n = self.count as f64;
        let success = if recovery_exit_code == 0 { 1.0 } else { 0.0 };
        self.success_rate = (n - 1.0) / n * self.success_rate + success / n;
        self.weight += 1.0;
        self.last_seen_ms = now_ms;
    }
}

/// Dismissal suppression ladder (§4.10). No downgrade path except manual
/// user reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionLevel {
    None,
    Soft,
    Learned,
    Permanent,
}

impl SuppressionLevel {
    /// Transition on `RecordDismissal`: none -> soft (1) -> learned (>=3).
    pub fn next_on_dismissal(self, dismissal_count: i64) -> Self {
        match self {
            SuppressionLevel::Permanent => SuppressionLevel::Permanent,
            _ if dismissal_count >= 3 => SuppressionLevel::Learned,
            _ if dismissal_count >= 1 => SuppressionLevel::Soft,
            _ => SuppressionLevel::None,
        }
    }

    /// Score multiplier applied by the dismissal-penalty amplifier (§4.5).
    pub fn penalty_factor(self, learned_factor: f64) -> f64 {
        match self {
            SuppressionLevel::None | SuppressionLevel::Soft => 1.0,
            SuppressionLevel::Learned => learned_factor,
            SuppressionLevel::Permanent => 0.0,
        }
    }
}

/// Dismissal pattern (§3 `DismissalPattern`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissalPattern {
    pub scope: Scope,
    pub context_template_id: String,
    pub dismissed_template_id: String,
    pub dismissal_count: i64,
    pub last_dismissal_ms: i64,
    pub level: SuppressionLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_at_zero_elapsed_is_identity() {
        assert_eq!(decay(5.0, 1_000, 1_000, 86_400_000), 5.0);
    }

    #[test]
    fn decay_reduces_with_elapsed_time() {
        let d = decay(1.0, 0, 86_400_000, 86_400_000);
        assert!((d - (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn suppression_ladder_progresses_and_never_downgrades() {
        assert_eq!(
            SuppressionLevel::None.next_on_dismissal(1),
            SuppressionLevel::Soft
        );
        assert_eq!(
            SuppressionLevel::Soft.next_on_dismissal(3),
            SuppressionLevel::Learned
        );
        assert_eq!(
            SuppressionLevel::Permanent.next_on_dismissal(0),
            SuppressionLevel::Permanent
        );
    }

    #[test]
    fn permanent_suppression_zeroes_score() {
        assert_eq!(SuppressionLevel::Permanent.penalty_factor(0.3), 0.0);
        assert_eq!(SuppressionLevel::Learned.penalty_factor(0.3), 0.3);
        assert_eq!(SuppressionLevel::Soft.penalty_factor(0.3), 1.0);
    }

    #[test]
    fn recovery_running_average_matches_spec_formula() {
        let mut fr = FailureRecovery {
            scope: Scope::Global,
            failed_template_id: "t1".into(),
            exit_class: ExitClass::General,
            recovery_template_id: "t2".into(),
            weight: 0.0,
            count: 0,
            success_rate: 0.0,
            source: RecoverySource::Bootstrap,
            last_seen_ms: 0,
        };
        fr.record_outcome(0, 100);
        assert_eq!(fr.success_rate, 1.0);
        fr.record_outcome(1, 200);
        assert!((fr.success_rate - 0.5).abs() < 1e-9);
    }
}
