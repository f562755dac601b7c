//! Stand in for a postgres server, echo bound parameters back as a row.
use bytes::{BufMut, Bytes, BytesMut};
use postcode::{ColumnDesc, Encoded};

/// Build `RowDescription` columns from parameters, as if selecting `$1, $2, ...`.
pub fn describe(params: &[Encoded]) -> Vec<ColumnDesc> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| ColumnDesc::new(format!("c{}", i + 1), p.oid(), p.format()))
        .collect()
}

/// Build `DataRow` body from parameters.
pub fn data_row(params: &[Encoded]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u16(params.len() as _);
    for param in params {
        param.put(&mut buf);
    }
    buf.freeze()
}
