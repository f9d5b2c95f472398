//! yangplug integration test infrastructure
//!
//! This crate holds the end-to-end tests of the plugin contracts:
//!
//! - **revisions**: compilation of the `revision-label-scheme` extension and
//!   the exact diagnostics it reports
//! - **identityref**: storing, printing and comparing data values through the
//!   built-in type plugin, including deferred module implementation
//! - **json_modules**: modules loaded from their JSON form compile the same way
//!   as built ones
//! - **proptest_identities**: derivation and value properties over generated
//!   identity graphs
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p yangplug-tests
//!
//! # With compiler and plugin logs
//! RUST_LOG=yangplug=debug cargo test -p yangplug-tests -- --nocapture
//! ```

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use harness::{init_tracing, Harness};
