#![cfg(target_endian = "little")]
#![deny(missing_docs)]

//! The column type registry for Columnix
//!
//! This crate contains the closed set of column value types, the per-column configuration
//! ([`ColumnDef`]) and the ordered [`Schema`] shared by writers and readers, as well as the
//! [`Value`] sum type that rows are made of.

pub use column::*;
pub use column_type::*;
pub use compression::*;
pub use encoding::*;
pub use nullability::*;
pub use schema::*;
pub use value::*;

mod column;
mod column_type;
mod compression;
mod encoding;
mod nullability;
mod schema;
mod value;
