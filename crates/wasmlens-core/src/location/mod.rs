//! Variable and location resolution.
//!
//! Source↔offset translation lives on [`crate::modules::DebugModule`]
//! directly; this module adds the scope queries and the closed-set
//! location-expression interpreter they feed into.

pub mod expr;
mod variables;

pub use expr::LocationOp;
