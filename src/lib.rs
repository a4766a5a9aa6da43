//! Workspace root for the UDP session server.
//!
//! The crates live in `shared/`, `server/` and `client/`; this package only
//! hosts the cross-crate tests under `tests/`.
