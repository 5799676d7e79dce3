//! View state: global viewer settings, camera pose and per-scene parameters,
//! plus the flat query-string form used for shareable links.
//!
//! # Invariants
//! - Decoding never fails; each bad or missing field takes its default.
//! - Encoding omits every field equal to its default.
//! - `decode(&encode(&s)) == s` for any state the controls can produce.

mod codec;
mod state;

pub use codec::{decode, encode, keys};
pub use state::{GlobalConfig, SceneParams, ViewState};

/// Why a single query field was rejected (and replaced by its default).
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ViewStateError {
    #[error("`{key}`: cannot parse {value:?}")]
    Unparsable { key: String, value: String },
    #[error("`{key}`: {value} is outside the accepted range")]
    OutOfRange { key: String, value: String },
    #[error("`cameraState`: {0}")]
    Camera(String),
}
