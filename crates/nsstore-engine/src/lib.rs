//! Storage engines for nsstore.
//!
//! An engine is the flat, origin-scoped key-value facility that namespaced
//! stores are layered on: string keys, string values, synchronous access,
//! limited capacity. It is the same contract a browser exposes through its
//! local storage, expressed as the [`StorageEngine`] trait so callers can
//! inject whichever backend they need.
//!
//! # Backends
//!
//! - [`InMemoryEngine`] -- `HashMap`-based engine for tests and embedding
//! - [`FileEngine`] -- one JSON file per origin, rewritten atomically
//!
//! # Rules
//!
//! 1. Engines never interpret values; they store opaque strings.
//! 2. Capacity is accounted in UTF-16 code units of key plus value.
//! 3. A write that would exceed the quota fails and leaves state untouched.
//! 4. All errors are propagated; swallowing is the caller's decision.

pub mod error;
pub mod file;
pub mod memory;
pub mod quota;
pub mod traits;

pub use error::{EngineError, EngineResult};
pub use file::FileEngine;
pub use memory::InMemoryEngine;
pub use quota::{entry_units, Quota, DEFAULT_QUOTA_UNITS};
pub use traits::StorageEngine;
