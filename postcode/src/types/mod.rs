//! Builtin type codecs.
//!
//! Implementation of [`Decode`][d] and [`Encode`][e] for rust and external types.
//!
//! | Rust type                         | Postgres type                               |
//! | --------------------------------- | ------------------------------------------- |
//! | `bool`                            | `bool`                                      |
//! | `i16`, `i32`, `i64`               | `int2`, `int4`, `int8`                      |
//! | `f32`, `f64`                      | `float4`, `float8`                          |
//! | `u32`                             | `oid`                                       |
//! | `String`, `&str`, [`ByteStr`][b]  | `text`, `varchar`, `bpchar`, `name`         |
//! | `Bytes`, `Vec<u8>`, `&[u8]`       | `bytea`                                     |
//! | [`Date`][td]                      | `date`                                      |
//! | [`PrimitiveDateTime`][tp]         | `timestamp`                                 |
//! | [`OffsetDateTime`][to]            | `timestamptz`, `timestamp`, `date`          |
//! | [`UtcDateTime`][tu]               | `timestamptz`                               |
//! | [`Inet`]                          | `inet`, `cidr`                              |
//! | [`IpAddr`][ip]                    | `inet`                                      |
//! | [`Json`], requires `json` feature | `json`, `jsonb`                             |
//! | `Vec<T>`, `&[T]`                  | one dimensional array of `T`                |
//! | `Option<T>`, [`Nullable<T>`]      | `T`, or `NULL`                              |
//! | [`Value`]                         | any of the above                            |
//!
//! Both text and binary format are supported for every type.
//!
//! [d]: crate::Decode
//! [e]: crate::Encode
//! [b]: crate::ByteStr
//! [td]: ::time::Date
//! [tp]: ::time::PrimitiveDateTime
//! [to]: ::time::OffsetDateTime
//! [tu]: ::time::UtcDateTime
//! [ip]: std::net::IpAddr

mod numeric;
mod text;
pub(crate) mod time;
mod inet;
mod nullable;
mod array;
mod dynamic;

#[cfg(feature = "json")]
mod json;
#[cfg(feature = "json")]
pub use json::Json;

pub use inet::{Inet, InvalidInet};
pub use nullable::Nullable;
pub use dynamic::Value;
