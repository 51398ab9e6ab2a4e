//! Canonical row model.
//!
//! Every parser produces a [`Table`] and every writer consumes one. The
//! model is format-agnostic: rows are ordered maps of scalar [`Value`]s.

mod row;
mod table;
mod value;

pub use row::Row;
pub use table::Table;
pub use value::Value;
