//! Relationship resolution: reverse relationships, dependent keys and row
//! snapshot projection.
//!
//! Everything here is implemented as methods on the model types; the
//! module only adds behavior that needs a [`DataMap`](crate::DataMap) to
//! look things up.

mod reverse;
mod snapshot;

pub use snapshot::Snapshot;
