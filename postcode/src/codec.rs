//! The [`Codec`], transcoding entry point.
use bytes::{Buf, Bytes};
use std::sync::Arc;

use crate::{
    Config, Encode, Encoded, EncodeError, ParamError, ParamType, Params, RowError, Scan,
    TypeRegistry,
    common::{span, verbose},
    cursor::Cursor,
    decode::{ColumnError, DecodeError},
    ext::UsizeExt,
    postgres::{Oid, PgFormat},
    row::{ColumnDesc, Row},
    scan::ValueReader,
};

/// Value transcoding engine.
///
/// A [`Codec`] is cheap to clone, the [`TypeRegistry`] is shared.
#[derive(Debug, Clone)]
pub struct Codec {
    config: Config,
    registry: Arc<TypeRegistry>,
}

impl Codec {
    /// Create new codec.
    pub fn new(config: Config, registry: impl Into<Arc<TypeRegistry>>) -> Codec {
        Self { config, registry: registry.into() }
    }

    /// Returns the codec config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the [`ParamType`] of `oid` in the configured parameter format.
    pub fn param_type(&self, oid: Oid) -> ParamType {
        self.param_type_as(oid, self.config.param_format)
    }

    fn param_type_as(&self, oid: Oid, format: PgFormat) -> ParamType {
        ParamType::new(oid, format)
            .with_timezone(self.config.timezone)
            .with_element(self.registry.element_of(oid))
    }

    /// Start building parameter list of mixed types.
    pub fn params<'q>(&self) -> Params<'_, 'q> {
        Params::new(self)
    }

    /// Encode parameters in order, stops at the first error.
    ///
    /// Every value shares one rust type `E`. Use [`Value`][crate::Value] to mix types in one
    /// call, or [`Codec::params`] to bind each value with its own type.
    ///
    /// ```
    /// use postcode::{Codec, Value, postgres::oid};
    ///
    /// let codec = Codec::default();
    /// let params = codec
    ///     .encode_parameters([
    ///         (oid::INT4, Value::from(1i32)),
    ///         (oid::INT8, Value::from(2i64)),
    ///         (oid::TEXT, Value::Null),
    ///     ])
    ///     .unwrap();
    /// assert_eq!(params[1].as_slice(), Some(&2i64.to_be_bytes()[..]));
    /// assert!(params[2].is_null());
    /// ```
    pub fn encode_parameters<'q, I, E>(&self, params: I) -> Result<Vec<Encoded<'q>>, ParamError>
    where
        I: IntoIterator<Item = (Oid, E)>,
        E: Encode<'q>,
    {
        span!("encode_parameters");
        params
            .into_iter()
            .enumerate()
            .map(|(index, (oid, value))| {
                self.encode_param(index, oid, self.config.param_format, value)
            })
            .collect()
    }

    pub(crate) fn encode_param<'q, E: Encode<'q>>(
        &self,
        index: usize,
        oid: Oid,
        format: PgFormat,
        value: E,
    ) -> Result<Encoded<'q>, ParamError> {
        let error = |source| ParamError { index, oid, source };

        if !self.registry.supports(oid) {
            return Err(error(EncodeError::Unsupported(oid)));
        }

        let encoded = value.encode(&self.param_type_as(oid, format)).map_err(error)?;
        if encoded.remaining().to_i32().is_none() {
            return Err(error(EncodeError::malformed(oid, "value too large for protocol")));
        }

        verbose!(index, oid, len = encoded.remaining(), is_null = encoded.is_null(), "encoded");
        Ok(encoded)
    }

    /// Decode one `DataRow` into `targets`, one destination per column.
    ///
    /// `cursor` must be at the start of the `DataRow` body, the leading column count.
    ///
    /// Destination count is checked before any column is read. Each column is then read within
    /// its declared length, after a destination returns, the cursor is moved to the end of the
    /// column, so one failing column does not prevent the rest of the row from being decoded.
    /// Failed columns leave their destination untouched and are collected in
    /// [`RowError::Columns`].
    ///
    /// A length prefix which points past the end of the buffer fails the whole row.
    pub fn decode_row(
        &self,
        cursor: &mut dyn Cursor,
        columns: &[ColumnDesc],
        targets: &mut [&mut dyn Scan],
    ) -> Result<(), RowError> {
        span!("decode_row", columns = columns.len());

        if targets.len() != columns.len() {
            return Err(RowError::Arity { columns: columns.len(), targets: targets.len() });
        }

        let start = cursor.position();
        let count = match cursor.read_u16() {
            Ok(ok) => ok as usize,
            Err(_) => {
                let source = DecodeError::malformed(0, "truncated DataRow");
                return Err(RowError::Columns(vec![self.column_error(0, 0, source)]));
            }
        };
        if count != columns.len() {
            // leave the row unread
            let _ = cursor.advance_to(start);
            return Err(RowError::Arity { columns: count, targets: targets.len() });
        }

        let mut errors = vec![];

        for (index, (desc, target)) in columns.iter().zip(targets.iter_mut()).enumerate() {
            let oid = desc.oid();
            let len = match cursor.read_i32() {
                Ok(-1) => None,
                Ok(len) if len >= 0 && len as usize <= cursor.remaining() => Some(len as usize),
                Ok(len) => {
                    let reason = format!("value length {len} with {} bytes left in DataRow", cursor.remaining());
                    errors.push(self.column_error(index, oid, DecodeError::malformed(oid, reason)));
                    break;
                }
                Err(_) => {
                    errors.push(self.column_error(index, oid, DecodeError::malformed(oid, "truncated DataRow")));
                    break;
                }
            };

            let end = cursor.position() + len.unwrap_or(0);
            let result = {
                let mut reader = ValueReader::new(&mut *cursor, desc, self.config.timezone, len);
                Scan::scan(&mut **target, &mut reader)
            };

            if cursor.position() != end {
                verbose!(index, left = end - cursor.position(), "column partially consumed");
                if cursor.advance_to(end).is_err() {
                    errors.push(self.column_error(index, oid, DecodeError::malformed(oid, "truncated DataRow")));
                    break;
                }
            }

            if let Err(source) = result {
                let error = self.column_error(index, oid, source);
                #[cfg(feature = "log")]
                log::warn!("{error}");
                errors.push(error);
            }
        }

        match errors.is_empty() {
            true => Ok(()),
            false => Err(RowError::Columns(errors)),
        }
    }

    /// Create owned [`Row`] from `DataRow` body.
    pub fn row(&self, columns: Arc<[ColumnDesc]>, data: Bytes) -> Result<Row, RowError> {
        Row::new(self.clone(), columns, data)
    }

    fn column_error(&self, index: usize, oid: Oid, source: DecodeError) -> ColumnError {
        ColumnError {
            index,
            oid,
            type_name: self.registry.lookup_name(oid).map(|e| e.to_owned().into()),
            source,
        }
    }
}

/// Codec with builtin types, `UTC` timezone and binary parameter format.
///
/// The timezone is not read from the environment, use
/// `Codec::new(Config::from_env(), TypeRegistry::with_builtins())` to decode zoneless values in
/// the process local offset.
impl Default for Codec {
    fn default() -> Self {
        Self::new(Config::default(), TypeRegistry::with_builtins())
    }
}

#[cfg(test)]
mod test {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::{cursor::ByteCursor, postgres::oid};

    fn data_row(values: &[Option<&[u8]>]) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u16(values.len() as _);
        for value in values {
            match value {
                Some(v) => {
                    buf.put_i32(v.len() as _);
                    buf.put_slice(v);
                }
                None => buf.put_i32(-1),
            }
        }
        buf
    }

    /// Reads only one byte of the value.
    #[derive(Default)]
    struct Short(Option<u8>);

    impl Scan for Short {
        fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError> {
            self.0 = Some(reader.read_u8()?);
            Ok(())
        }
    }

    struct Failing;

    impl Scan for Failing {
        fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError> {
            reader.read(2)?;
            Err(DecodeError::custom("nope"))
        }
    }

    #[test]
    fn short_scanner_keeps_alignment() {
        let columns = [
            ColumnDesc::new("a", oid::TEXT, PgFormat::Text),
            ColumnDesc::new("b", oid::INT4, PgFormat::Binary),
        ];
        let mut cursor = ByteCursor::new(data_row(&[Some(b"hello"), Some(&42i32.to_be_bytes())]).freeze());

        let (mut short, mut b) = (Short::default(), 0i32);
        Codec::default()
            .decode_row(&mut cursor, &columns, &mut [&mut short, &mut b])
            .unwrap();

        assert_eq!(short.0, Some(b'h'));
        assert_eq!(b, 42);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn failing_scanner() {
        let columns = [
            ColumnDesc::new("a", oid::BYTEA, PgFormat::Binary),
            ColumnDesc::new("b", oid::TEXT, PgFormat::Text),
        ];
        let mut cursor = ByteCursor::new(data_row(&[Some(b"\x01\x02\x03"), Some(b"ok")]).freeze());

        let mut b = String::new();
        let err = Codec::default()
            .decode_row(&mut cursor, &columns, &mut [&mut Failing, &mut b])
            .unwrap_err();

        assert_eq!(err.columns().len(), 1);
        let first = err.first().unwrap();
        assert_eq!((first.index(), first.oid(), first.type_name()), (0, oid::BYTEA, Some("bytea")));
        assert!(matches!(first.error(), DecodeError::Custom(_)));
        assert_eq!(b, "ok");
    }

    #[test]
    fn arity_checked_before_read() {
        let columns = [
            ColumnDesc::new("a", oid::INT4, PgFormat::Binary),
            ColumnDesc::new("b", oid::INT4, PgFormat::Binary),
        ];
        let mut cursor = ByteCursor::new(data_row(&[Some(b"1"), Some(b"2")]).freeze());
        let (mut a, mut b, mut c) = (0i32, 0i32, 0i32);

        let err = Codec::default()
            .decode_row(&mut cursor, &columns, &mut [&mut a, &mut b, &mut c])
            .unwrap_err();

        assert!(err.is_arity());
        assert_eq!(cursor.position(), 0);
        assert_eq!((a, b, c), (0, 0, 0));
    }

    #[test]
    fn column_count_from_wire() {
        let columns = [ColumnDesc::new("a", oid::TEXT, PgFormat::Text)];
        let mut cursor = ByteCursor::new(data_row(&[Some(b"1"), Some(b"2")]).freeze());
        let mut a = String::new();

        let err = Codec::default()
            .decode_row(&mut cursor, &columns, &mut [&mut a])
            .unwrap_err();

        assert!(matches!(err, RowError::Arity { columns: 2, targets: 1 }));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn truncated_row_is_fatal() {
        let columns = [
            ColumnDesc::new("a", oid::TEXT, PgFormat::Text),
            ColumnDesc::new("b", oid::TEXT, PgFormat::Text),
        ];
        let mut buf = data_row(&[Some(b"abc"), Some(b"def")]);
        buf.truncate(buf.len() - 1);
        let mut cursor = ByteCursor::new(buf.freeze());

        let (mut a, mut b) = (String::new(), String::new());
        let err = Codec::default()
            .decode_row(&mut cursor, &columns, &mut [&mut a, &mut b])
            .unwrap_err();

        assert_eq!(a, "abc");
        assert_eq!(b, "");
        assert_eq!(err.first().unwrap().index(), 1);
        assert!(err.first().unwrap().error().is_malformed());
    }

    #[test]
    fn unsupported_optional_type() {
        let registry: TypeRegistry = [(oid::INT4, "int4")].into_iter().collect();
        let codec = Codec::new(Config::new(), registry);
        let err = codec.encode_parameters([(oid::JSON, "{}")]).unwrap_err();
        assert!(matches!(err.error(), EncodeError::Unsupported(oid::JSON)));
    }

    #[test]
    fn default_is_utc() {
        let codec = Codec::default();
        assert!(codec.config().get_timezone().is_utc());
        assert_eq!(codec.config().get_param_format(), PgFormat::Binary);

        let columns = [ColumnDesc::new("t", oid::TIMESTAMP, PgFormat::Text)];
        let mut cursor = ByteCursor::new(data_row(&[Some(b"2000-01-01 07:00:00")]).freeze());
        let mut value = time::OffsetDateTime::UNIX_EPOCH;
        codec.decode_row(&mut cursor, &columns, &mut [&mut value]).unwrap();
        assert!(value.offset().is_utc());
        assert_eq!(value.hour(), 7);
    }
}
