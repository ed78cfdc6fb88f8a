use serde::{Deserialize, Serialize};

/// Closed set of reason tags a suggestion's score can be attributed to
/// (§4.5, §9 "dynamic reason dictionaries" re-architected as a closed enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    RepoTrans,
    DirTrans,
    GlobalTrans,
    DirFreq,
    RepoFreq,
    GlobalFreq,
    ProjectTask,
    Dangerous,
    WorkflowBoost,
    PipelineConf,
    RecoveryBoost,
    DismissalPenalty,
}

impl ReasonTag {
    /// Localized-lookup stand-in (§9): a short human description.
    pub fn description(self) -> &'static str {
        match self {
            ReasonTag::RepoTrans => "often follows this command in this repo",
            ReasonTag::DirTrans => "often follows this command in this directory",
            ReasonTag::GlobalTrans => "often follows this command",
            ReasonTag::DirFreq => "frequently run in this directory",
            ReasonTag::RepoFreq => "frequently run in this repo",
            ReasonTag::GlobalFreq => "frequently run",
            ReasonTag::ProjectTask => "defined as a project task",
            ReasonTag::Dangerous => "looks destructive",
            ReasonTag::WorkflowBoost => "matches the active workflow's next step",
            ReasonTag::PipelineConf => "often chained after this command",
            ReasonTag::RecoveryBoost => "often fixes this failure",
            ReasonTag::DismissalPenalty => "previously dismissed",
        }
    }
}

/// One reason contributing to a suggestion's score, with its numeric
/// contribution for the explain layer (§3 `Suggestion`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reason {
    pub tag: ReasonTag,
    pub contribution: f64,
}

/// Risk classification surfaced on the wire (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    Safe,
    Destructive,
}

/// A ranked suggestion (§3 `Suggestion`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub command: String,
    #[serde(default)]
    pub template_id: Option<String>,
    pub score: f64,
    pub confidence: f64,
    pub risk: Risk,
    pub reasons: Vec<Reason>,
}

impl Suggestion {
    pub fn reason_tags(&self) -> impl Iterator<Item = ReasonTag> + '_ {
        self.reasons.iter().map(|r| r.tag)
    }
}
