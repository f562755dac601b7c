//! Postgres wire value transcoding.
//!
//! Convert between rust values and the postgres on-wire representation, in both text and binary
//! format, without owning a connection. Message framing, statements and transport are left to
//! the caller, the engine only needs a [`Cursor`] over `DataRow` bytes and a [`TypeRegistry`].
//!
//! # Examples
//!
//! Encode parameters:
//!
//! ```
//! use postcode::{Codec, postgres::oid};
//!
//! let codec = Codec::default();
//! let params = codec
//!     .params()
//!     .bind(oid::INT4, 420)
//!     .bind(oid::TEXT_ARRAY, vec!["foo", "bar"])
//!     .finish()
//!     .unwrap();
//!
//! assert_eq!(params[0].as_slice(), Some(&420i32.to_be_bytes()[..]));
//! ```
//!
//! Decode a row into destinations:
//!
//! ```
//! use bytes::{BufMut, BytesMut};
//! use postcode::{ByteCursor, Codec, ColumnDesc, postgres::{PgFormat, oid}};
//!
//! let columns = [
//!     ColumnDesc::new("id", oid::INT4, PgFormat::Binary),
//!     ColumnDesc::new("name", oid::TEXT, PgFormat::Text),
//! ];
//!
//! let mut data_row = BytesMut::new();
//! data_row.put_u16(2);
//! data_row.put_i32(4);
//! data_row.put_i32(420);
//! data_row.put_i32(-1);
//!
//! let (mut id, mut name) = (0i32, Some(String::new()));
//! let mut cursor = ByteCursor::new(data_row.freeze());
//!
//! Codec::default()
//!     .decode_row(&mut cursor, &columns, &mut [&mut id, &mut name])
//!     .unwrap();
//!
//! assert_eq!(id, 420);
//! assert_eq!(name, None);
//! ```

pub mod common;
mod ext;

// Protocol
pub mod postgres;
pub mod cursor;
mod registry;
mod config;

// Encoding
mod value;
pub mod encode;

// Decoding
pub mod decode;
pub mod scan;
pub mod row;

pub mod types;
mod codec;
mod error;


pub use common::ByteStr;
pub use cursor::{ByteCursor, Cursor, UnexpectedEof};
pub use registry::TypeRegistry;
pub use config::{Config, ParseError};

pub use encode::{Encode, Encoded, EncodeError, ParamError, ParamType, Params};
pub use decode::{ColumnError, Decode, DecodeError, RowError};
pub use scan::{Scan, ValueReader};
pub use row::{Column, ColumnDesc, FromRow, Row};

pub use types::{Inet, InvalidInet, Nullable, Value};
#[cfg(feature = "json")]
pub use types::Json;

pub use codec::Codec;
pub use error::{Error, ErrorKind, Result};

#[cfg(feature = "macros")]
pub use postcode_macros::{Decode, Encode, FromRow};
