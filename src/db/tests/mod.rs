//! Shared repository tests
//!
//! Each repository module holds test functions that take the repository as a
//! trait object, then instantiates them for every backend:
//!
//! - SQLite: in-memory, runs with every `cargo test`
//! - PostgreSQL: one database per test in a testcontainer, marked `#[ignore]`
//!
//! ```bash
//! cargo test                       # SQLite only
//! cargo test -- --ignored          # PostgreSQL (requires Docker)
//! cargo test -- --include-ignored  # everything
//! ```

mod saml_configurations;
