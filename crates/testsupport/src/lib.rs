//! Shared fixtures for testing csvql end to end: isolated fixture
//! directories ([`fixtures::Workspace`]), a thin query/DDL wrapper
//! ([`context::TestDb`]), row/batch assertion helpers, and `proptest`
//! generators for the universal invariants in spec §8.
//!
//! # Example
//!
//! ```no_run
//! use testsupport::prelude::*;
//!
//! let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
//! let batch = db.query("SELECT name FROM people WHERE score >= 20 ORDER BY name").unwrap();
//! assert_eq!(batch.rows.len(), 2);
//! ```

pub mod assertions;
pub mod context;
pub mod fixtures;
pub mod proptest_generators;

/// Convenient re-exports for tests.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::context::*;
    pub use crate::fixtures::*;
}
