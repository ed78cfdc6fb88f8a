//! Tokenization, slot extraction, alias expansion, and pipeline
//! splitting for raw shell command text (§4.1, §4.2, C1/C2).

mod alias;
mod error;
mod head;
mod normalizer;
mod pipeline;
mod slots;
mod tokenize;

pub use error::{Error, Result};
pub use normalizer::Normalizer;
pub use pipeline::{split, split_and_normalize, NormalizedSegment, RawSegment, DEFAULT_MAX_SEGMENTS};
pub use slots::classify as classify_slot;
