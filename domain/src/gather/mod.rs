//! Gather item entities - the content units flowing through the pipeline.
//!
//! A [`CandidateItem`] is freshly generated and not yet checked for
//! duplication. Once a candidate survives dedup and is persisted it becomes
//! a [`GatherItem`] carrying [`AutomationMetadata`] that records which task,
//! department and iteration produced it. Persisted items are never edited
//! in place by the pipeline.

mod item;

pub use item::{AutomationMetadata, CandidateItem, ContextItem, GatherItem, MediaKind, MediaRef};
