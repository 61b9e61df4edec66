//! OrgPress Shared Types and Utilities
//!
//! Domain types, errors and database helpers shared by the OrgPress crates.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
