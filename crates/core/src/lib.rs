//! Axiom simulation core - deterministic, tick-based combat rules
//!
//! This crate owns all truth state of a match (entities, the player weapon,
//! the tick counter) and is the only place gameplay rules execute. Hosts talk
//! to it through a [`Core`] handle and versioned parameter structs; the only
//! data that crosses the boundary are plain records and little-endian byte
//! blobs written into caller-owned buffers.
//!
//! - **Deterministic**: identical action scripts produce bit-identical
//!   snapshots across independent instances
//! - **Resumable**: a save blob restores a content-loaded instance to the
//!   exact tick it was taken at
//! - **Validate-then-mutate**: a failing call leaves the instance untouched
//!
//! # Module Structure
//!
//! - [`cursor`]: bounds-checked byte reader/writer used by both codecs
//! - [`world`]: the truth store (entities, weapon, queue, event log)
//! - [`lifecycle`]: `Created → ContentLoaded → Running` gating
//! - [`content`]: content source seam and the placeholder test range
//! - [`intake`]: action batch validation
//! - [`tick`]: the per-tick rule engine
//! - [`snapshot`]: snapshot blob encoder and decoder view
//! - [`save`]: save blob codec with checksum validation
//! - [`diagnostics`]: versioned diagnostics record
//! - [`handle`]: the [`Core`] instance and its boundary operations
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use axiom_core::{ActionBatch, ContentLoadParams, Core, CreateParams, SnapshotView};
//! use axiom_types::RawAction;
//!
//! let mut core = Core::create(CreateParams::v1()).unwrap();
//! core.load_content(&ContentLoadParams::v1(Path::new("content"))).unwrap();
//!
//! let actions: Vec<_> = (1..=5).map(|t| RawAction::fire_once(t, 1, 0)).collect();
//! core.submit(&ActionBatch::v1(&actions)).unwrap();
//! core.step(5).unwrap();
//!
//! let snap = SnapshotView::parse(&core.snapshot_bytes().unwrap()).unwrap();
//! assert_eq!(snap.tick, 5);
//! assert!(snap.entity(100).unwrap().is_dead());
//! assert_eq!(snap.weapon.unwrap().ammo_in_mag, 7);
//! ```

pub mod content;
pub mod cursor;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod intake;
pub mod lifecycle;
pub mod save;
pub mod snapshot;
pub mod tick;
pub mod world;

pub use axiom_types as types;

pub use content::{
    ContentLoadParams, ContentSet, ContentSource, PlaceholderContent, WeaponParams,
};
pub use diagnostics::{abi_version, AbiVersion, Diagnostics};
pub use error::{CoreError, CoreResult, ResultCode};
pub use handle::{Core, CreateParams, LogSink};
pub use intake::ActionBatch;
pub use lifecycle::Lifecycle;
pub use save::SaveView;
pub use snapshot::{SnapshotView, WeaponRecord};
pub use world::World;
