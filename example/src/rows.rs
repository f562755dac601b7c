use postcode::{Codec, FromRow, Result, postgres::{PgFormat, oid}};

use crate::server;

#[derive(Debug, FromRow)]
struct User {
    id: i32,
    name: String,
    email: Option<String>,
}

#[derive(Debug, FromRow)]
struct UserTuple(i32, String, Option<String>);

pub fn main() -> Result<()> {
    let codec = Codec::default();

    for format in [PgFormat::Binary, PgFormat::Text] {
        let params = codec
            .params()
            .bind_with(oid::INT4, format, 1)
            .bind_with(oid::TEXT, format, "John")
            .bind_with(oid::TEXT, format, None::<&str>)
            .finish()?;

        let mut columns = server::describe(&params);
        for (col, name) in columns.iter_mut().zip(["id", "name", "email"]) {
            *col = postcode::ColumnDesc::new(name, col.oid(), col.format());
        }
        let columns: std::sync::Arc<[_]> = columns.into();
        let data = server::data_row(&params);

        let user: User = codec.row(columns.clone(), data.clone())?.decode()?;
        let tuple: UserTuple = codec.row(columns, data)?.decode()?;

        assert_eq!((user.id, user.name.as_str(), user.email.as_deref()), (1, "John", None));
        assert_eq!((tuple.0, tuple.1.as_str(), tuple.2), (1, "John", None));
        tracing::info!(?user, %format);
    }

    Ok(())
}
