/// Postgres object identifier.
///
/// The oid type is implemented as an unsigned four-byte integer.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
pub type Oid = u32;

/// A type that have corresponding postgres oid.
pub trait PgType {
    /// Oid used when the value is bound without declared type.
    const OID: Oid;

    /// Returns `true` if this type can be transcoded from or into `oid`.
    fn accepts(oid: Oid) -> bool {
        oid == Self::OID
    }
}

impl<T: PgType + ?Sized> PgType for &T {
    const OID: Oid = T::OID;

    fn accepts(oid: Oid) -> bool {
        T::accepts(oid)
    }
}

/// Builtin oids.
///
/// Values are stable across server versions, the source is `pg_type.dat`.
pub mod oid {
    use super::Oid;

    /// 0 means type unspecified
    pub const UNSPECIFIED: Oid = 0;

    pub const BOOL: Oid = 16;
    pub const BYTEA: Oid = 17;
    pub const NAME: Oid = 19;
    pub const INT8: Oid = 20;
    pub const INT2: Oid = 21;
    pub const INT4: Oid = 23;
    pub const TEXT: Oid = 25;
    pub const OID: Oid = 26;
    pub const JSON: Oid = 114;
    pub const CIDR: Oid = 650;
    pub const FLOAT4: Oid = 700;
    pub const FLOAT8: Oid = 701;
    pub const UNKNOWN: Oid = 705;
    pub const INET: Oid = 869;
    pub const BPCHAR: Oid = 1042;
    pub const VARCHAR: Oid = 1043;
    pub const DATE: Oid = 1082;
    pub const TIMESTAMP: Oid = 1114;
    pub const TIMESTAMPTZ: Oid = 1184;
    pub const JSONB: Oid = 3802;

    pub const BOOL_ARRAY: Oid = 1000;
    pub const BYTEA_ARRAY: Oid = 1001;
    pub const NAME_ARRAY: Oid = 1003;
    pub const INT2_ARRAY: Oid = 1005;
    pub const INT4_ARRAY: Oid = 1007;
    pub const TEXT_ARRAY: Oid = 1009;
    pub const BPCHAR_ARRAY: Oid = 1014;
    pub const VARCHAR_ARRAY: Oid = 1015;
    pub const INT8_ARRAY: Oid = 1016;
    pub const FLOAT4_ARRAY: Oid = 1021;
    pub const FLOAT8_ARRAY: Oid = 1022;
    pub const OID_ARRAY: Oid = 1028;
    pub const INET_ARRAY: Oid = 1041;
    pub const CIDR_ARRAY: Oid = 651;
    pub const DATE_ARRAY: Oid = 1182;
    pub const TIMESTAMP_ARRAY: Oid = 1115;
    pub const TIMESTAMPTZ_ARRAY: Oid = 1185;
    pub const JSON_ARRAY: Oid = 199;
    pub const JSONB_ARRAY: Oid = 3807;
}

/// (element, array, name)
pub(crate) const BUILTINS: &[(Oid, Oid, &str)] = &[
    (oid::BOOL, oid::BOOL_ARRAY, "bool"),
    (oid::BYTEA, oid::BYTEA_ARRAY, "bytea"),
    (oid::NAME, oid::NAME_ARRAY, "name"),
    (oid::INT8, oid::INT8_ARRAY, "int8"),
    (oid::INT2, oid::INT2_ARRAY, "int2"),
    (oid::INT4, oid::INT4_ARRAY, "int4"),
    (oid::TEXT, oid::TEXT_ARRAY, "text"),
    (oid::OID, oid::OID_ARRAY, "oid"),
    (oid::JSON, oid::JSON_ARRAY, "json"),
    (oid::CIDR, oid::CIDR_ARRAY, "cidr"),
    (oid::FLOAT4, oid::FLOAT4_ARRAY, "float4"),
    (oid::FLOAT8, oid::FLOAT8_ARRAY, "float8"),
    (oid::INET, oid::INET_ARRAY, "inet"),
    (oid::BPCHAR, oid::BPCHAR_ARRAY, "bpchar"),
    (oid::VARCHAR, oid::VARCHAR_ARRAY, "varchar"),
    (oid::DATE, oid::DATE_ARRAY, "date"),
    (oid::TIMESTAMP, oid::TIMESTAMP_ARRAY, "timestamp"),
    (oid::TIMESTAMPTZ, oid::TIMESTAMPTZ_ARRAY, "timestamptz"),
    (oid::JSONB, oid::JSONB_ARRAY, "jsonb"),
];

/// Returns the element oid of a builtin array type.
pub const fn element_of(array: Oid) -> Option<Oid> {
    let mut i = 0;
    while i < BUILTINS.len() {
        if BUILTINS[i].1 == array {
            return Some(BUILTINS[i].0);
        }
        i += 1;
    }
    None
}

/// Returns the array oid of a builtin element type.
pub const fn array_of(element: Oid) -> Option<Oid> {
    let mut i = 0;
    while i < BUILTINS.len() {
        if BUILTINS[i].0 == element {
            return Some(BUILTINS[i].1);
        }
        i += 1;
    }
    None
}

/// Returns `true` for types which does not exist on every server version.
///
/// `json` appears in 9.2 and `jsonb` in 9.4.
pub const fn is_optional(oid: Oid) -> bool {
    matches!(oid, oid::JSON | oid::JSONB | oid::JSON_ARRAY | oid::JSONB_ARRAY)
}

/// The wire layout family an oid belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    /// `text`, `varchar`, `bpchar`, `name` and `unknown`
    Text,
    Bytea,
    Date,
    Timestamp,
    TimestampTz,
    Inet,
    Cidr,
    Json,
    Jsonb,
    /// One dimensional array with the element oid.
    Array(Oid),
}

impl Kind {
    /// Resolve the kind of builtin `oid`.
    pub const fn of(oid: Oid) -> Option<Kind> {
        let kind = match oid {
            oid::BOOL => Kind::Bool,
            oid::INT2 => Kind::Int2,
            oid::INT4 => Kind::Int4,
            oid::INT8 => Kind::Int8,
            oid::FLOAT4 => Kind::Float4,
            oid::FLOAT8 => Kind::Float8,
            oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME | oid::UNKNOWN => Kind::Text,
            oid::BYTEA => Kind::Bytea,
            oid::DATE => Kind::Date,
            oid::TIMESTAMP => Kind::Timestamp,
            oid::TIMESTAMPTZ => Kind::TimestampTz,
            oid::INET => Kind::Inet,
            oid::CIDR => Kind::Cidr,
            oid::JSON => Kind::Json,
            oid::JSONB => Kind::Jsonb,
            // `oid` columns are not a scalar kind of their own
            oid::OID => return None,
            _ => match element_of(oid) {
                Some(element) => Kind::Array(element),
                None => return None,
            },
        };
        Some(kind)
    }

    /// Returns `true` if the kind is an array.
    pub const fn is_array(&self) -> bool {
        matches!(self, Kind::Array(_))
    }
}

macro_rules! oid {
    ($ty:ty, $oid:path $(, $doc:literal)? ) => {
        impl PgType for $ty {
            $(#[doc = $doc])?
            const OID: Oid = $oid;
        }
    };
}

oid!(bool, oid::BOOL, "`bool` boolean, 'true'/'false'");
oid!(i64, oid::INT8, "`int8` ~18 digit integer, 8-byte storage");
oid!(i16, oid::INT2, "`int2` -32 thousand to 32 thousand, 2-byte storage");
oid!(i32, oid::INT4, "`int4` -2 billion to 2 billion integer, 4-byte storage");
oid!(u32, oid::OID, "`oid` object identifier(oid), maximum 4 billion");
oid!(f32, oid::FLOAT4, "`float4` single-precision floating point number, 4-byte storage");
oid!(f64, oid::FLOAT8, "`float8` double-precision floating point number, 8-byte storage");
