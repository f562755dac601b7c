use postcode::{Codec, Config, Decode, Encode, Nullable, Result, TypeRegistry, postgres::oid, types::Json};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

use crate::server;

#[derive(Debug, Decode, Encode, PartialEq)]
struct UserId(i32);

#[derive(Encode)]
struct Name<'a>(&'a str);

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
struct Meta {
    tags: Vec<String>,
}

pub fn main() -> Result<()> {
    let codec = Codec::new(Config::from_env(), TypeRegistry::with_builtins());
    let now = UtcDateTime::now().replace_microsecond(0).unwrap_or(UtcDateTime::UNIX_EPOCH);
    let meta = Meta { tags: vec!["a".into(), "b c".into()] };

    let params = codec
        .params()
        .push(UserId(420))
        .bind(oid::TEXT, Name("Deez"))
        .bind(oid::TIMESTAMPTZ, now)
        .bind(oid::INT8, Nullable::<i64>::null())
        .bind(oid::JSONB, Json(&meta))
        .bind(oid::INT4_ARRAY, vec![1, 2, 3])
        .finish()?;

    tracing::info!(params = params.len(), "encoded");

    let columns = server::describe(&params);
    let row = codec.row(columns.into(), server::data_row(&params))?;

    let id: UserId = row.try_get("c1")?;
    let name: String = row.try_get(1)?;
    let at: UtcDateTime = row.try_get(2)?;
    let score: Nullable<i64> = row.try_get(3)?;
    let Json(echo): Json<Meta> = row.try_get(4)?;
    let list: Vec<i32> = row.try_get(5)?;

    assert_eq!(id, UserId(420));
    assert_eq!(name, "Deez");
    assert_eq!(at, now);
    assert!(!score.is_valid());
    assert_eq!(echo, meta);
    assert_eq!(list, [1, 2, 3]);

    // mismatch is reported with the declared oid
    let err = codec.params().bind(oid::DATE, UserId(1)).finish().unwrap_err();
    tracing::info!("{err}");

    Ok(())
}
