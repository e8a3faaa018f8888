//! File-backed storage for the service layer.

pub mod snapshot;
