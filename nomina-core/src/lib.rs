//! # nomina-core
//!
//! Core types for nomina: shared data structures used by the resolution engine.
//!
//! This crate provides:
//! - **Input**: `CandidateSpan`, `EntityType`, `Provenance`
//! - **Working model**: `Mention`, `EntityCluster`, `ClusterArena`
//! - **Output**: `Entity`, `SpanIndexEntry`, `Tier`, `Confidence`

#![warn(missing_docs)]

pub mod cluster;
pub mod confidence;
pub mod entity;
pub mod error;
pub mod mention;

pub use cluster::{ClusterArena, EntityCluster, EntityId};
pub use confidence::{Confidence, ConfidenceBand};
pub use entity::{CandidateSpan, Entity, EntityType, Provenance, SpanIndexEntry, Tier};
pub use error::{Error, Result};
pub use mention::{Mention, MentionId, MentionType};
