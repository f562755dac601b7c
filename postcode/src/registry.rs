//! The [`TypeRegistry`].
use std::collections::HashMap;

use crate::{
    DecodeError, Row,
    common::ByteStr,
    postgres::{self, Oid, pg_type::BUILTINS},
};

/// Mapping of type [`Oid`] to type name, as reported by the server.
///
/// The registry is populated once when the connection is set up, usually from
///
/// ```sql
/// SELECT oid, typname FROM pg_type
/// ```
///
/// and is read only afterwards.
///
/// The transcoding engine only consult the registry to check whether an
/// [optional][postgres::is_optional] type exists on the server, to resolve array element of
/// non builtin array types, and to name types in error messages.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    names: HashMap<Oid, ByteStr>,
}

impl TypeRegistry {
    /// Create empty registry.
    pub fn new() -> TypeRegistry {
        Self::default()
    }

    /// Create registry containing every builtin type and its array type.
    ///
    /// Note that this include types which older server may not have, like `jsonb`.
    pub fn with_builtins() -> TypeRegistry {
        let mut me = Self::new();
        for &(element, array, name) in BUILTINS {
            me.names.insert(element, ByteStr::from_static(name));
            me.names.insert(array, ByteStr::from(format!("_{name}")));
        }
        me.names.insert(postgres::oid::UNKNOWN, ByteStr::from_static("unknown"));
        me
    }

    /// Populate registry from rows of `SELECT oid, typname FROM pg_type`.
    pub fn from_rows<I>(rows: I) -> Result<TypeRegistry, DecodeError>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut me = Self::new();
        for row in rows {
            let (oid, name): (u32, ByteStr) = row.decode()?;
            me.names.insert(oid, name);
        }
        Ok(me)
    }

    /// Register a type, returns previous name if any.
    pub fn insert(&mut self, oid: Oid, name: impl Into<ByteStr>) -> Option<ByteStr> {
        self.names.insert(oid, name.into())
    }

    /// Returns the type name of `oid`.
    pub fn lookup_name(&self, oid: Oid) -> Option<&str> {
        self.names.get(&oid).map(ByteStr::as_str)
    }

    /// Returns the oid of type named `name`.
    ///
    /// This is a linear search.
    pub fn lookup_oid(&self, name: &str) -> Option<Oid> {
        self.names
            .iter()
            .find_map(|(oid, e)| (e.as_str() == name).then_some(*oid))
    }

    /// Returns `true` if `oid` is registered.
    pub fn contains(&self, oid: Oid) -> bool {
        self.names.contains_key(&oid)
    }

    /// Returns `false` if `oid` is an optional type which the server does not have.
    ///
    /// Non optional types are always supported.
    pub fn supports(&self, oid: Oid) -> bool {
        !postgres::is_optional(oid) || self.contains(oid)
    }

    /// Returns the element oid of an array type.
    ///
    /// Builtin arrays are resolved statically, others follow postgres naming convention
    /// where array of type `foo` is named `_foo`.
    pub fn element_of(&self, array: Oid) -> Option<Oid> {
        if let Some(element) = postgres::element_of(array) {
            return Some(element);
        }
        let element = self.lookup_name(array)?.strip_prefix('_')?;
        self.lookup_oid(element)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over registered types, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Oid, &str)> {
        self.names.iter().map(|(oid, name)| (*oid, name.as_str()))
    }
}

impl<N: Into<ByteStr>> Extend<(Oid, N)> for TypeRegistry {
    fn extend<T: IntoIterator<Item = (Oid, N)>>(&mut self, iter: T) {
        self.names.extend(iter.into_iter().map(|(oid, name)| (oid, name.into())));
    }
}

impl<N: Into<ByteStr>> FromIterator<(Oid, N)> for TypeRegistry {
    fn from_iter<T: IntoIterator<Item = (Oid, N)>>(iter: T) -> Self {
        let mut me = Self::new();
        me.extend(iter);
        me
    }
}
