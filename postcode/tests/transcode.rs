use bytes::{BufMut, Bytes, BytesMut};
use postcode::{
    ByteCursor, Codec, ColumnDesc, Config, Cursor, DecodeError, Encoded, Inet, Nullable, Scan,
    TypeRegistry, ValueReader,
    postgres::{Oid, PgFormat, oid},
};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

fn codec() -> Codec {
    Codec::default()
}

fn data_row(params: &[Encoded]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u16(params.len() as _);
    for param in params {
        param.put(&mut buf);
    }
    buf.freeze()
}

fn raw_row(values: &[Option<&[u8]>]) -> Bytes {
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
    buf.freeze()
}

fn describe(params: &[Encoded]) -> Vec<ColumnDesc> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| ColumnDesc::new(format!("c{i}"), p.oid(), p.format()))
        .collect()
}

fn date() -> Date {
    Date::from_calendar_date(2024, Month::February, 29).unwrap()
}

fn datetime() -> PrimitiveDateTime {
    date().with_time(Time::from_hms_micro(13, 37, 0, 250).unwrap())
}

#[test]
fn scalar_roundtrip() {
    let codec = codec();
    for format in [PgFormat::Binary, PgFormat::Text] {
        let params = codec
            .params()
            .bind_with(oid::BOOL, format, true)
            .bind_with(oid::INT2, format, -7i16)
            .bind_with(oid::INT4, format, i32::MAX)
            .bind_with(oid::INT8, format, i64::MIN)
            .bind_with(oid::FLOAT4, format, 1.5f32)
            .bind_with(oid::FLOAT8, format, f64::INFINITY)
            .bind_with(oid::TEXT, format, "hello world")
            .bind_with(oid::BYTEA, format, vec![0u8, 0xff, 0x10])
            .bind_with(oid::DATE, format, date())
            .bind_with(oid::TIMESTAMP, format, datetime())
            .finish()
            .unwrap();
        let columns = describe(&params);
        let mut cursor = ByteCursor::new(data_row(&params));

        let mut b = false;
        let mut i2 = 0i16;
        let mut i4 = 0i32;
        let mut i8 = 0i64;
        let mut f4 = 0f32;
        let mut f8 = 0f64;
        let mut text = String::new();
        let mut bytea = Bytes::new();
        let mut d = Date::MIN;
        let mut ts = PrimitiveDateTime::MIN;

        codec
            .decode_row(&mut cursor, &columns, &mut [
                &mut b, &mut i2, &mut i4, &mut i8, &mut f4, &mut f8, &mut text, &mut bytea,
                &mut d, &mut ts,
            ])
            .unwrap();

        assert!(b, "{format}");
        assert_eq!(i2, -7);
        assert_eq!(i4, i32::MAX);
        assert_eq!(i8, i64::MIN);
        assert_eq!(f4, 1.5);
        assert_eq!(f8, f64::INFINITY);
        assert_eq!(text, "hello world");
        assert_eq!(&bytea[..], &[0, 0xff, 0x10]);
        assert_eq!(d, date());
        assert_eq!(ts, datetime());
        assert_eq!(cursor.remaining(), 0);
    }
}

#[test]
fn timestamptz_uses_configured_offset() {
    let offset = UtcOffset::from_hms(7, 0, 0).unwrap();
    let codec = Codec::new(Config::new().timezone(offset), TypeRegistry::with_builtins());
    let value = datetime().assume_utc();

    for format in [PgFormat::Binary, PgFormat::Text] {
        let params = codec.params().bind_with(oid::TIMESTAMPTZ, format, value).finish().unwrap();
        let mut cursor = ByteCursor::new(data_row(&params));
        let mut out = OffsetDateTime::UNIX_EPOCH;
        codec.decode_row(&mut cursor, &describe(&params), &mut [&mut out]).unwrap();
        assert_eq!(out, value);
        if format == PgFormat::Binary {
            assert_eq!(out.offset(), offset);
        }
    }
}

#[test]
fn mismatch_leaves_destination_untouched() {
    let codec = codec();
    let columns = [
        ColumnDesc::new("id", oid::INT8, PgFormat::Binary),
        ColumnDesc::new("name", oid::TEXT, PgFormat::Binary),
    ];
    let mut cursor = ByteCursor::new(raw_row(&[Some(&9i64.to_be_bytes()), Some(b"foo")]));

    let mut id = 5i32;
    let mut name = String::new();
    let err = codec.decode_row(&mut cursor, &columns, &mut [&mut id, &mut name]).unwrap_err();

    assert_eq!(id, 5);
    assert_eq!(name, "foo");
    let first = err.first().unwrap();
    assert_eq!(first.index(), 0);
    assert_eq!(first.oid(), oid::INT8);
    assert_eq!(first.type_name(), Some("int8"));
    assert!(first.error().is_type_mismatch());
}

#[test]
fn encode_mismatch_reports_kind_and_oid() {
    let err = codec().params().bind(oid::DATE, 1i16).finish().unwrap_err();
    assert_eq!(err.index(), 0);
    assert_eq!(err.oid(), oid::DATE);
    assert!(err.error().is_type_mismatch());
    assert!(err.to_string().contains("OID 1082"));
}

#[test]
fn encode_parameters_of_mixed_types() {
    use postcode::Value;

    for format in [PgFormat::Binary, PgFormat::Text] {
        let codec = Codec::new(Config::new().param_format(format), TypeRegistry::with_builtins());
        let params = codec
            .encode_parameters([
                (oid::INT4, Value::from(7i32)),
                (oid::INT8, Value::from(-2i64)),
                (oid::TEXT, Value::from("hi")),
                (oid::BOOL, Value::Null),
            ])
            .unwrap();

        let expected: Vec<Vec<u8>> = match format {
            PgFormat::Binary => vec![
                7i32.to_be_bytes().to_vec(),
                (-2i64).to_be_bytes().to_vec(),
                b"hi".to_vec(),
            ],
            PgFormat::Text => vec![b"7".to_vec(), b"-2".to_vec(), b"hi".to_vec()],
        };

        assert_eq!(params.len(), 4);
        assert!(params.iter().all(|p| p.format() == format));
        for (param, bytes) in params.iter().zip(&expected) {
            assert_eq!(param.as_slice(), Some(&bytes[..]), "{format}");
        }
        assert!(params[3].is_null());
        assert_eq!(params[3].oid(), oid::BOOL);

        let mut buf = BytesMut::new();
        for param in &params {
            param.put(&mut buf);
        }
        let mut at = 0;
        for bytes in &expected {
            assert_eq!(&buf[at..at + 4], &(bytes.len() as i32).to_be_bytes());
            assert_eq!(&buf[at + 4..at + 4 + bytes.len()], &bytes[..]);
            at += 4 + bytes.len();
        }
        assert_eq!(&buf[at..], &(-1i32).to_be_bytes());
    }

    let err = codec()
        .encode_parameters([(oid::INT4, Value::from(1i32)), (oid::DATE, Value::from(2i16))])
        .unwrap_err();
    assert_eq!(err.index(), 1);
    assert_eq!(err.oid(), oid::DATE);
    assert!(err.error().is_type_mismatch());
    assert!(err.to_string().starts_with("parameter 1: "));
}

#[test]
fn nullable_and_option() {
    let codec = codec();
    for format in [PgFormat::Binary, PgFormat::Text] {
        let params = codec
            .params()
            .bind_with(oid::INT4, format, Nullable::<i32>::null())
            .bind_with(oid::TEXT, format, Nullable::new(String::from("x")))
            .bind_with(oid::INT8, format, None::<i64>)
            .finish()
            .unwrap();
        assert!(params[0].is_null());
        assert!(params[2].is_null());

        let mut cursor = ByteCursor::new(data_row(&params));
        let mut a = Nullable::new(1i32);
        let mut b = Nullable::<String>::null();
        let mut c = Some(3i64);
        codec
            .decode_row(&mut cursor, &describe(&params), &mut [&mut a, &mut b, &mut c])
            .unwrap();

        assert!(!a.is_valid());
        assert_eq!(a.get(), None);
        assert_eq!(b.get().map(String::as_str), Some("x"));
        assert_eq!(c, None);
    }
}

#[test]
fn null_into_non_nullable() {
    let columns = [ColumnDesc::new("n", oid::INT4, PgFormat::Binary)];
    let mut cursor = ByteCursor::new(raw_row(&[None]));
    let mut n = 4i32;
    let err = codec().decode_row(&mut cursor, &columns, &mut [&mut n]).unwrap_err();
    assert!(matches!(err.first().unwrap().error(), DecodeError::Null));
    assert_eq!(n, 4);
}

#[test]
fn arrays() {
    let codec = codec();
    for format in [PgFormat::Binary, PgFormat::Text] {
        let params = codec
            .params()
            .bind_with(oid::INT4_ARRAY, format, Vec::<i32>::new())
            .bind_with(oid::TEXT_ARRAY, format, vec!["only"])
            .bind_with(oid::INT8_ARRAY, format, vec![Some(1i64), None, Some(-3)])
            .bind_with(oid::TEXT_ARRAY, format, vec![Some("a b"), Some("NULL"), Some("\"{}\""), None])
            .finish()
            .unwrap();
        let mut cursor = ByteCursor::new(data_row(&params));

        let mut empty = vec![1i32];
        let mut single = Vec::<String>::new();
        let mut many = Vec::<Option<i64>>::new();
        let mut quoted = Vec::<Option<String>>::new();
        codec
            .decode_row(&mut cursor, &describe(&params), &mut [
                &mut empty, &mut single, &mut many, &mut quoted,
            ])
            .unwrap();

        assert!(empty.is_empty(), "{format}");
        assert_eq!(single, ["only"]);
        assert_eq!(many, [Some(1), None, Some(-3)]);
        assert_eq!(quoted, [
            Some(String::from("a b")),
            Some(String::from("NULL")),
            Some(String::from("\"{}\"")),
            None,
        ]);
    }
}

#[test]
fn malformed_column_does_not_stop_row() {
    let codec = codec();
    let columns = [
        ColumnDesc::new("d", oid::DATE, PgFormat::Binary),
        ColumnDesc::new("n", oid::INT4, PgFormat::Binary),
        ColumnDesc::new("s", oid::TEXT, PgFormat::Text),
    ];
    let mut cursor = ByteCursor::new(raw_row(&[
        Some(&[0, 0, 1]),
        Some(&42i32.to_be_bytes()),
        Some(b"hello"),
    ]));

    let mut d = date();
    let mut n = 0i32;
    let mut s = String::new();
    let err = codec.decode_row(&mut cursor, &columns, &mut [&mut d, &mut n, &mut s]).unwrap_err();

    assert_eq!(d, date());
    assert_eq!(n, 42);
    assert_eq!(s, "hello");
    assert_eq!(err.columns().len(), 1);
    assert!(err.first().unwrap().error().is_malformed());
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn rows_are_independent() {
    let codec = codec();
    let columns = [
        ColumnDesc::new("d", oid::DATE, PgFormat::Binary),
        ColumnDesc::new("n", oid::INT4, PgFormat::Binary),
    ];
    let mut buf = BytesMut::new();
    buf.put(raw_row(&[Some(b"bad"), Some(&1i32.to_be_bytes())]));
    buf.put(raw_row(&[Some(&0i32.to_be_bytes()), Some(&2i32.to_be_bytes())]));
    let mut cursor = ByteCursor::new(buf.freeze());

    let mut d = date();
    let mut n = 0i32;
    assert!(codec.decode_row(&mut cursor, &columns, &mut [&mut d, &mut n]).is_err());
    assert_eq!(n, 1);

    codec.decode_row(&mut cursor, &columns, &mut [&mut d, &mut n]).unwrap();
    assert_eq!(d, Date::from_calendar_date(2000, Month::January, 1).unwrap());
    assert_eq!(n, 2);
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn cidr_network() {
    let codec = codec();
    let network: Inet = "192.168.1.0/24".parse().unwrap();
    for format in [PgFormat::Binary, PgFormat::Text] {
        let params = codec.params().bind_with(oid::CIDR, format, network).finish().unwrap();
        let mut cursor = ByteCursor::new(data_row(&params));
        let mut out: Inet = "0.0.0.0".parse().unwrap();
        codec.decode_row(&mut cursor, &describe(&params), &mut [&mut out]).unwrap();
        assert_eq!(out, network);
        assert_eq!(out.netmask(), 24);
        assert_eq!(out.to_string(), "192.168.1.0/24");
    }

    let host: Inet = "192.168.1.1/24".parse().unwrap();
    let err = codec.params().bind(oid::CIDR, host).finish().unwrap_err();
    assert!(!err.error().is_type_mismatch());
}

#[test]
fn arity_mismatch_reads_nothing() {
    let columns = [
        ColumnDesc::new("a", oid::INT4, PgFormat::Binary),
        ColumnDesc::new("b", oid::INT4, PgFormat::Binary),
    ];
    let mut cursor = ByteCursor::new(raw_row(&[Some(&1i32.to_be_bytes()), Some(&2i32.to_be_bytes())]));
    let (mut a, mut b, mut c) = (0i32, 0i32, 0i32);

    let err = codec().decode_row(&mut cursor, &columns, &mut [&mut a, &mut b, &mut c]).unwrap_err();
    assert!(err.is_arity());
    assert_eq!(cursor.position(), 0);
    assert_eq!((a, b, c), (0, 0, 0));
}

/// Reads a single byte of whatever the column holds.
struct Peek(u8);

impl Scan for Peek {
    fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError> {
        self.0 = reader.read_u8()?;
        Ok(())
    }
}

/// Reads part of the value then fails.
struct Reject;

impl Scan for Reject {
    fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError> {
        reader.read(2)?;
        Err(DecodeError::custom("rejected"))
    }
}

#[test]
fn custom_scanners_keep_alignment() {
    let codec = codec();
    let columns = [
        ColumnDesc::new("a", oid::INT4, PgFormat::Binary),
        ColumnDesc::new("b", oid::TEXT, PgFormat::Text),
        ColumnDesc::new("c", oid::TEXT, PgFormat::Text),
    ];
    let mut cursor = ByteCursor::new(raw_row(&[
        Some(&0x0102_0304i32.to_be_bytes()),
        Some(b"ignored"),
        Some(b"last"),
    ]));

    let mut peek = Peek(0);
    let mut last = String::new();
    let err = codec
        .decode_row(&mut cursor, &columns, &mut [&mut peek, &mut Reject, &mut last])
        .unwrap_err();

    assert_eq!(peek.0, 1);
    assert_eq!(last, "last");
    let first = err.first().unwrap();
    assert_eq!(first.index(), 1);
    assert!(matches!(first.error(), DecodeError::Custom(_)));
}

#[test]
fn dynamic_value() {
    use postcode::Value;

    let codec = codec();
    let columns: Vec<ColumnDesc> = [oid::INT2, oid::TEXT, oid::INET, oid::FLOAT8_ARRAY]
        .into_iter()
        .map(|oid: Oid| ColumnDesc::new("v", oid, PgFormat::Text))
        .collect();
    let mut cursor = ByteCursor::new(raw_row(&[
        Some(b"12"),
        None,
        Some(b"::1"),
        Some(b"{1.5,NULL}"),
    ]));

    let mut values = [Value::Null, Value::Null, Value::Null, Value::Null];
    let [a, b, c, d] = &mut values;
    codec.decode_row(&mut cursor, &columns, &mut [a, b, c, d]).unwrap();

    assert_eq!(values[0], Value::Int2(12));
    assert!(values[1].is_null());
    assert_eq!(values[2], Value::Inet("::1".parse().unwrap()));
    assert_eq!(values[3], Value::Array(vec![Value::Float8(1.5), Value::Null]));
}
