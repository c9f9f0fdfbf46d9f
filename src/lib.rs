//! # nomina
//!
//! Entity resolution for Rust.
//!
//! Takes the noisy name spans several extractors tagged in one document
//! and turns them into a deduplicated registry of entities, each with a
//! canonical name, aliases, a calibrated confidence and a quality tier.
//!
//! - **Clustering**: surface variants ("Gandalf", "Gandalf the Grey") join one entity
//! - **Aliases**: ambiguous short forms ("Smith") resolve by recency and strength
//! - **Scoring**: provenance, repetition and naming context combine into a confidence
//! - **Tiers**: A (core), B (secondary), C (isolated, never merged)
//! - **Reconciliation**: one name typed two ways becomes one entity
//!
//! ## Quick Start
//!
//! ```rust
//! use nomina::{CandidateSpan, EntityType, Provenance, ResolutionSession};
//!
//! let text = "Harry Potter looked up. Harry grinned.";
//! let spans = vec![
//!     CandidateSpan::new("Harry Potter", EntityType::Person, 0, 12, Provenance::Whitelist),
//!     CandidateSpan::new("Harry", EntityType::Person, 24, 29, Provenance::Ner),
//! ];
//! let output = ResolutionSession::default().resolve_text(text, &spans);
//! assert_eq!(output.entities.len(), 1);
//! assert_eq!(output.entities[0].canonical, "Harry Potter");
//! assert_eq!(output.entities[0].mention_count, 2);
//! ```
//!
//! ## Configuration
//!
//! Every constant lives in [`ResolverConfig`], loadable from JSON:
//!
//! ```rust
//! use nomina::ResolverConfig;
//!
//! let config = ResolverConfig::from_json(r#"{"filter": {"min_confidence": 0.6}}"#).unwrap();
//! assert_eq!(config.filter.min_confidence, 0.6);
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Clustering and canonicalization | [`clustering`], [`variant`] |
//! | Alias disambiguation | [`alias`] |
//! | Cross-type merge and filters | [`merge`] |
//! | Confidence | [`confidence`] |
//! | Tiers | [`tier`] |
//! | Orchestration | [`session`] |
//!
//! Types shared by every stage ([`Mention`], [`EntityCluster`],
//! [`ClusterArena`], [`Confidence`]) live in `nomina-core`.

#![warn(missing_docs)]

pub mod alias;
pub mod clustering;
pub mod confidence;
pub mod config;
pub mod context;
pub mod lexicon;
pub mod merge;
pub mod normalize;
pub mod session;
pub mod stats;
pub mod tier;
pub mod variant;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use nomina::prelude::*;
    //!
    //! let session = ResolutionSession::new(ResolverConfig::default());
    //! let spans = vec![CandidateSpan::new("Bree", EntityType::Place, 0, 4, Provenance::Ner)];
    //! for e in session.resolve(&spans).entities {
    //!     println!("{} ({}): {}", e.canonical, e.entity_type.as_label(), e.confidence);
    //! }
    //! ```
    pub use crate::config::ResolverConfig;
    pub use crate::session::{ResolutionOutput, ResolutionSession};
    pub use crate::stats::ResolutionStats;
    pub use nomina_core::{
        CandidateSpan, Confidence, Entity, EntityId, EntityType, Error, Provenance, Result,
        SpanIndexEntry, Tier,
    };
}

// Re-exports
pub use nomina_core::{
    CandidateSpan, ClusterArena, Confidence, ConfidenceBand, Entity,
    EntityCluster, EntityId, EntityType, Error, Mention, MentionId, MentionType, Provenance,
    Result, SpanIndexEntry, Tier,
};

pub use alias::{AliasRegistry, AliasStrength};
pub use clustering::{Clustered, ClusteringEngine, IngestOutcome, IngestReport};
pub use config::{AliasConfig, ConfidenceConfig, FilterConfig, ResolverConfig, TierConfig};
pub use merge::FilterReport;
pub use normalize::{DefaultNormalizer, EnglishPronouns, NameNormalizer, PronounClassifier};
pub use session::{
    entity_at, filter_entities_by_confidence, order_for_ingestion, parse_spans_json,
    ResolutionOutput, ResolutionSession,
};
pub use stats::ResolutionStats;
pub use tier::{TierAssignment, TierReason};
