//! Postgres type system as seen from the wire.
//!
//! ## [`Format`][PgFormat] and Format Codes
//!
//! Data of a particular data type might be transmitted in any of several different formats.
//! As of PostgreSQL 7.4 the only supported formats are “text” and “binary”. Text has format
//! code zero, and Binary has format code one.
//!
//! Clients can specify a format code for each transmitted parameter value and for each column of a query result.
//!
//! See [`PgFormat`] for details.
//!
//! ## [`Oid`]
//!
//! Every value on the wire is tagged by the [`Oid`] of its data type. Builtin oids are listed in
//! [`oid`], anything else must be resolved through a [`TypeRegistry`][crate::TypeRegistry].
//!
//! <https://www.postgresql.org/docs/17/protocol-overview.html>

pub(crate) mod pg_type;
mod pg_format;

pub use pg_type::{Kind, Oid, PgType, array_of, element_of, is_optional, oid};
pub use pg_format::PgFormat;
