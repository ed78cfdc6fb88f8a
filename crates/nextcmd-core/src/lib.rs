pub mod error;
pub mod hash;
pub mod path;
pub mod text;

pub use error::{Error, Result};
pub use hash::{content_hash, repo_key, short_hash};
pub use path::{expand_tilde, normalize_path, resolve_data_dir};
pub use text::floor_char_boundary;
