//! SQL construction: identifier validation and query text assembly.
//!
//! Identifiers cannot be bound as parameters, so every caller-supplied
//! table or column name passes the allow-list in [`ident`] and is then
//! interpolated with standard double-quoting. Everything else the
//! engine sends is a bound parameter. This module is the only place in
//! the crate that concatenates SQL text.

pub mod ident;

pub(crate) mod builder;
