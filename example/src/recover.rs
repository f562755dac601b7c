use bytes::{BufMut, BytesMut};
use postcode::{
    ByteCursor, Codec, ColumnDesc, Cursor, DecodeError, Result, Scan, ValueReader,
    postgres::{PgFormat, oid},
};
use time::Date;

/// Counts bytes without decoding them.
#[derive(Default)]
struct Len(usize);

impl Scan for Len {
    fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError> {
        self.0 = reader.len().unwrap_or(0);
        Ok(())
    }
}

pub fn main() -> Result<()> {
    let codec = Codec::default();
    let columns = [
        ColumnDesc::new("born", oid::DATE, PgFormat::Binary),
        ColumnDesc::new("age", oid::INT4, PgFormat::Binary),
        ColumnDesc::new("bio", oid::TEXT, PgFormat::Text),
    ];

    // the date column is one byte short
    let mut buf = BytesMut::new();
    buf.put_u16(3);
    buf.put_i32(3);
    buf.put_slice(&[0, 0, 1]);
    buf.put_i32(4);
    buf.put_i32(42);
    buf.put_i32(5);
    buf.put_slice(b"hello");

    let mut cursor = ByteCursor::new(buf.freeze());
    let mut born = Date::MIN;
    let mut age = 0i32;
    let mut bio = Len::default();

    let err = codec
        .decode_row(&mut cursor, &columns, &mut [&mut born, &mut age, &mut bio])
        .unwrap_err();

    tracing::warn!("{err}");
    assert_eq!(born, Date::MIN);
    assert_eq!(age, 42);
    assert_eq!(bio.0, 5);
    assert_eq!(cursor.remaining(), 0);

    Ok(())
}
