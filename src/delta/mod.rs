//! Delta engine: snapshot comparison, commits and their reversal.
//!
//! ```text
//! baseline ─┐
//!           ├─ compute_delta ─► DeltaSet (modified → added → removed, 1-based change_index)
//! current ──┘
//!
//! Commit ── get_revert(live) ─► Commit (added ⇄ removed, modified read from live)
//! ```

pub mod commit;
pub mod engine;
pub mod history;

pub use commit::{get_revert, Commit, CommitSet};
pub use engine::{
    compute_delta, compute_delta_with, ChangeCounter, ChangeKind, DeltaSet, Modification,
    ProjectDelta,
};
pub use history::{CommitHistory, HistoryEntry};
