//! Pure token and name handling used by the dispatcher.
//!
//! Nothing here performs I/O or calls hooks; every function maps its inputs
//! to a deterministic output.

pub mod categories;
pub mod names;
pub mod order;
pub mod partition;
pub mod short_opts;
