//! Streaming: concurrent cascade loading and frame-driven attachment.
//!
//! # Invariants
//! - Fetch and decode run on the async runtime; the composer and progress
//!   board are only touched from the thread that polls the [`LoadSession`].
//! - A cascade attaches only after its mesh and both feature textures have
//!   all arrived; a failed sub-asset suppresses that cascade alone.
//! - A manifest failure abandons its scene without affecting siblings.
//! - Progress markers only go from pending to loaded.
//! - Events arriving for an unloaded scene are discarded.

mod assemble;
mod loader;
mod progress;
mod session;

pub use assemble::{AssembledCascade, CascadeAssembler};
pub use loader::{CascadeLoader, CascadeTask, LoadEvent, LoadPoll, LoadedAsset, SceneLoad};
pub use progress::{LoadProgress, ProgressBoard, LOADED_MARKER, PENDING_MARKER};
pub use session::{LoadSession, StreamConfig, StreamStats};

#[cfg(test)]
pub(crate) mod testutil;
