//! Core types for the trace graph kernel.

pub mod artifact;
pub mod trace;

pub use artifact::{Artifact, ArtifactId};
pub use trace::{ApprovalStatus, TraceId, TraceKind, TraceLink};
