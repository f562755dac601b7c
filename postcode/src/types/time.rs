use time::{
    Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcDateTime, UtcOffset,
    error::ComponentRange, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    Decode, DecodeError, Encode,
    encode::{EncodeError, Encoded, ParamType},
    postgres::{Oid, PgFormat, PgType, oid},
    row::Column,
    value::ValueRef,
};

impl PgType for Date {
    /// `date` calendar date (year, month, day)
    const OID: Oid = oid::DATE;
}

impl PgType for PrimitiveDateTime {
    /// `timestamp` date and time
    const OID: Oid = oid::TIMESTAMP;
}

impl PgType for OffsetDateTime {
    /// `timestamptz` date and time with time zone
    const OID: Oid = oid::TIMESTAMPTZ;

    fn accepts(oid: Oid) -> bool {
        matches!(oid, oid::TIMESTAMPTZ | oid::TIMESTAMP | oid::DATE)
    }
}

impl PgType for UtcDateTime {
    /// `timestamptz` date and time with time zone
    const OID: Oid = oid::TIMESTAMPTZ;
}

// source: `from_julian_day` docs
const PG_EPOCH_DATE: Date = match Date::from_julian_day(2_451_545) {
    Ok(ok) => ok,
    Err(_) => panic!("2000-01-01 is a valid date"),
};

const PG_EPOCH: PrimitiveDateTime = PrimitiveDateTime::new(PG_EPOCH_DATE, Time::MIDNIGHT);

const PG_EPOCH_UTC: OffsetDateTime = PG_EPOCH.assume_utc();

const DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

const DATETIME: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");

// ===== Era =====

/// Postgres writes years before 1 AD as `0044-03-15 BC`, 1 BC being year 0.
fn split_era(text: &str) -> (&str, bool) {
    match text.strip_suffix(" BC") {
        Some(text) => (text, true),
        None => (text, false),
    }
}

/// Parse text with the year counted in its era.
fn parse_era<T>(
    text: &str,
    bc: bool,
    parse: impl FnOnce(&str) -> Result<T, time::error::Parse>,
    with_year: impl FnOnce(T, i32) -> Result<T, ComponentRange>,
) -> Result<T, String> {
    if !bc {
        return parse(text).map_err(|e| e.to_string());
    }
    let (year, rest) = text.split_at(text.find('-').ok_or("missing year")?);
    let year = year.parse::<i32>().map_err(|_| format!("invalid year {year:?}"))?;
    // 2000 is a leap year, so february 29 parses before moving to the real year
    let value = parse(&format!("2000{rest}")).map_err(|e| e.to_string())?;
    with_year(value, 1 - year).map_err(|e| e.to_string())
}

/// Format value, years before 1 AD get the ` BC` suffix after `offset`.
fn format_era<T>(
    value: T,
    year: i32,
    offset: &str,
    with_year: impl FnOnce(T, i32) -> Result<T, ComponentRange>,
    format: impl FnOnce(T) -> Result<String, time::error::Format>,
) -> Result<String, String> {
    if year > 0 {
        return format(value).map(|e| e + offset).map_err(|e| e.to_string());
    }
    let value = with_year(value, 2000).map_err(|e| e.to_string())?;
    let text = format(value).map_err(|e| e.to_string())?;
    Ok(format!("{:04}{}{offset} BC", 1 - year, &text[4..]))
}

// ===== Offset =====

/// Parse numeric offset `+HH`, `+HHMM`, `+HH:MM` or `+HH:MM:SS`.
pub(crate) fn parse_offset(offset: &str) -> Option<UtcOffset> {
    let (sign, rest) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };

    let mut hms = [0i8; 3];
    let fields: Vec<&str> = match rest.contains(':') {
        true => rest.split(':').collect(),
        false if !rest.is_ascii() => return None,
        false => match rest.len() {
            2 | 4 | 6 => (0..rest.len()).step_by(2).map(|i| &rest[i..i + 2]).collect(),
            _ => return None,
        },
    };
    if fields.len() > 3 {
        return None;
    }
    for (field, slot) in fields.into_iter().zip(&mut hms) {
        if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = sign * field.parse::<i8>().ok()?;
    }

    UtcOffset::from_hms(hms[0], hms[1], hms[2]).ok()
}

/// Format offset as `+HH:MM`, seconds are included only when non zero.
fn format_offset(offset: UtcOffset) -> String {
    let (h, m, s) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    let (h, m, s) = (h.unsigned_abs(), m.unsigned_abs(), s.unsigned_abs());
    match s {
        0 => format!("{sign}{h:02}:{m:02}"),
        _ => format!("{sign}{h:02}:{m:02}:{s:02}"),
    }
}

/// Split `2000-01-01 00:00:00+07` into datetime and offset.
fn split_offset(text: &str) -> Option<(&str, &str)> {
    let at = text.get(DATE_LEN..)?.rfind(|c: char| c == '+' || c == '-')? + DATE_LEN;
    Some(text.split_at(at))
}

const DATE_LEN: usize = "2000-01-01".len();

// ===== Decode =====

fn micros(col: &Column) -> Result<i64, DecodeError> {
    match i64::from_be_bytes(col.fixed()?) {
        i64::MAX | i64::MIN => Err(col.malformed("infinite timestamp")),
        micros => Ok(micros),
    }
}

fn decode_date(col: &Column) -> Result<Date, DecodeError> {
    match col.format() {
        PgFormat::Binary => match i32::from_be_bytes(col.fixed()?) {
            i32::MAX | i32::MIN => Err(col.malformed("infinite date")),
            days => PG_EPOCH_DATE
                .checked_add(Duration::days(days.into()))
                .ok_or_else(|| col.malformed("date out of range")),
        },
        PgFormat::Text => {
            let (text, bc) = split_era(col.text()?);
            parse_era(text, bc, |e| Date::parse(e, DATE), Date::replace_year)
                .map_err(|e| col.malformed(e))
        }
    }
}

fn parse_datetime(text: &str, bc: bool) -> Result<PrimitiveDateTime, String> {
    parse_era(text, bc, |e| PrimitiveDateTime::parse(e, DATETIME), PrimitiveDateTime::replace_year)
}

fn decode_timestamp(col: &Column) -> Result<PrimitiveDateTime, DecodeError> {
    match col.format() {
        PgFormat::Binary => PG_EPOCH
            .checked_add(Duration::microseconds(micros(col)?))
            .ok_or_else(|| col.malformed("timestamp out of range")),
        PgFormat::Text => {
            let (text, bc) = split_era(col.text()?);
            parse_datetime(text, bc).map_err(|e| col.malformed(e))
        }
    }
}

/// Decode `timestamptz`, text value keeps the offset sent by the server.
fn decode_timestamptz(col: &Column) -> Result<OffsetDateTime, DecodeError> {
    match col.format() {
        PgFormat::Binary => PG_EPOCH_UTC
            .checked_add(Duration::microseconds(micros(col)?))
            .and_then(|e| e.checked_to_offset(col.timezone()))
            .ok_or_else(|| col.malformed("timestamp out of range")),
        PgFormat::Text => {
            let (text, bc) = split_era(col.text()?);
            let (datetime, offset) = split_offset(text)
                .ok_or_else(|| col.malformed(format!("missing offset in {text:?}")))?;
            let offset = parse_offset(offset)
                .ok_or_else(|| col.malformed(format!("invalid offset {offset:?}")))?;
            let datetime = parse_datetime(datetime, bc).map_err(|e| col.malformed(e))?;
            Ok(datetime.assume_offset(offset))
        }
    }
}

impl Decode for Date {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        decode_date(&col)
    }
}

impl Decode for PrimitiveDateTime {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        decode_timestamp(&col)
    }
}

impl Decode for OffsetDateTime {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        match col.oid() {
            oid::TIMESTAMP => Ok(decode_timestamp(&col)?.assume_offset(col.timezone())),
            oid::DATE => Ok(decode_date(&col)?.midnight().assume_offset(col.timezone())),
            _ => decode_timestamptz(&col),
        }
    }
}

impl Decode for UtcDateTime {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        Ok(decode_timestamptz(&col)?.into())
    }
}

// ===== Encode =====

fn text(value: Result<String, String>, oid: Oid) -> Result<ValueRef<'static>, EncodeError> {
    value
        .map(ValueRef::from)
        .map_err(|e| EncodeError::malformed(oid, e))
}

fn format_datetime(datetime: PrimitiveDateTime, offset: &str) -> Result<String, String> {
    format_era(datetime, datetime.year(), offset, PrimitiveDateTime::replace_year, |e| {
        e.format(DATETIME)
    })
}

fn micros_since(duration: Duration, oid: Oid) -> Result<i64, EncodeError> {
    i64::try_from(duration.whole_microseconds())
        .map_err(|_| EncodeError::malformed(oid, "timestamp out of range"))
}

fn encode_date(date: Date, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
    let value = match ty.format() {
        PgFormat::Binary => {
            let days = i32::try_from((date - PG_EPOCH_DATE).whole_days())
                .map_err(|_| EncodeError::malformed(ty.oid(), "date out of range"))?;
            ValueRef::inline(&days.to_be_bytes())
        }
        PgFormat::Text => {
            let value = format_era(date, date.year(), "", Date::replace_year, |e| e.format(DATE));
            text(value, ty.oid())?
        }
    };
    Ok(Encoded::new(value, ty))
}

fn encode_timestamp(datetime: PrimitiveDateTime, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
    let value = match ty.format() {
        PgFormat::Binary => {
            let micros = micros_since(datetime - PG_EPOCH, ty.oid())?;
            ValueRef::inline(&micros.to_be_bytes())
        }
        PgFormat::Text => text(format_datetime(datetime, ""), ty.oid())?,
    };
    Ok(Encoded::new(value, ty))
}

fn encode_timestamptz(datetime: OffsetDateTime, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
    let value = match ty.format() {
        PgFormat::Binary => {
            let micros = micros_since(datetime - PG_EPOCH_UTC, ty.oid())?;
            ValueRef::inline(&micros.to_be_bytes())
        }
        PgFormat::Text => {
            let local = PrimitiveDateTime::new(datetime.date(), datetime.time());
            text(format_datetime(local, &format_offset(datetime.offset())), ty.oid())?
        }
    };
    Ok(Encoded::new(value, ty))
}

impl Encode<'static> for Date {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        encode_date(self, ty)
    }
}

impl Encode<'static> for PrimitiveDateTime {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        encode_timestamp(self, ty)
    }
}

impl Encode<'static> for OffsetDateTime {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        if ty.oid() == oid::TIMESTAMPTZ {
            return encode_timestamptz(self, ty);
        }
        let local = self
            .checked_to_offset(ty.timezone())
            .ok_or_else(|| EncodeError::malformed(ty.oid(), "timestamp out of range"))?;
        match ty.oid() {
            oid::DATE => encode_date(local.date(), ty),
            _ => encode_timestamp(PrimitiveDateTime::new(local.date(), local.time()), ty),
        }
    }
}

impl Encode<'static> for UtcDateTime {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        encode_timestamptz(self.into(), ty)
    }
}
