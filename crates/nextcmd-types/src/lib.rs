// Shared domain and wire types for the nextcmd suggestion engine.
// This crate defines schemas only; the Store owns all persistence and
// the engine/runtime crates own all behavior.

pub mod cache;
pub mod error;
pub mod event;
pub mod project;
pub mod scope;
pub mod session;
pub mod stats;
pub mod suggestion;
pub mod template;
pub mod wire;

pub use cache::SuggestionCacheEntry;
pub use error::{Error, Result};
pub use event::{BoundaryOp, CommandEvent, PipelineEvent};
pub use project::{ProjectTask, TaskKind};
pub use scope::Scope;
pub use session::{Session, ShellKind};
pub use stats::{
    CommandStat, DismissalPattern, ExitClass, FailureRecovery, MIN_TAU_MS, PipelinePattern,
    PipelineTransition, ProjectTypeStat, ProjectTypeTransition, RecoverySource, SlotCorrelation,
    SlotStat, SuppressionLevel, TransitionStat, decay,
};
pub use suggestion::{Reason, ReasonTag, Risk, Suggestion};
pub use template::{CommandTemplate, NormalizedCommand, PreNorm, Slot, SlotTag};
pub use wire::{
    ErrorCode, ErrorEnvelope, IngestEvent, ReasonWire, SuggestRequest, SuggestResponse,
    SuggestionWire, WIRE_VERSION, WireEventType,
};
