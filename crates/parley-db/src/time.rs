use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use rusqlite::types::Type;

/// Fixed-width UTC text so that lexical order in SQL equals time order.
const STORE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Current time at the precision the store keeps (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn encode(t: &DateTime<Utc>) -> String {
    t.format(STORE_FORMAT).to_string()
}

pub(crate) fn decode(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, PARSE_FORMAT)
        .map(|ndt| ndt.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    decode(idx, &raw)
}
