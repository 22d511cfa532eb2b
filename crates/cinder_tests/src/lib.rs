//! End-to-end suites for the Cinder semantic core live in `tests/`.
//!
//! This crate intentionally exports nothing.
