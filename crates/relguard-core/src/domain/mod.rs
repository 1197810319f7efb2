//! Domain models for relguard.
//!
//! - `RelguardError`: fatal precondition failures
//! - `ResolvedVersion` / `ResolvedBranch`: the outcome of version resolution

pub mod error;
pub mod version;

pub use error::{RelguardError, Result};
pub use version::{
    classify_version, derive_version, is_release_tag, resolve_version, short_hash_to_int,
    ResolvedBranch, ResolvedVersion,
};
