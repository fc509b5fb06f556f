use std::collections::HashMap;

use parley_types::UserId;
use rusqlite::{Connection, OptionalExtension};

use crate::Result;
use crate::models::UserRow;

/// Create an account. A taken login yields [`crate::Error::Conflict`].
pub fn insert(conn: &Connection, login: &str, password_hash: &str) -> Result<UserId> {
    conn.execute(
        "INSERT INTO users (login, password) VALUES (?1, ?2)",
        (login, password_hash),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_login(conn: &Connection, login: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, login, password FROM users WHERE login = ?1")?;

    let row = stmt
        .query_row([login], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                login: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Display name of a user (their login).
pub fn find_name_by_id(conn: &Connection, id: UserId) -> Result<Option<String>> {
    let name = conn
        .query_row("SELECT login FROM users WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(name)
}

/// Batch-fetch display names. Ids without an account are absent from the map.
pub fn find_names_by_ids(conn: &Connection, ids: &[UserId]) -> Result<HashMap<UserId, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT id, login FROM users WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let names = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, UserId>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, Error};

    #[test]
    fn duplicate_login_is_a_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| insert(conn, "alice", "hash")).unwrap();

        let err = db.with_conn(|conn| insert(conn, "alice", "other")).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn lookups_by_login_and_id() {
        let db = Database::open_in_memory().unwrap();
        let id = db.with_conn(|conn| insert(conn, "alice", "hash")).unwrap();

        let row = db.with_conn(|conn| find_by_login(conn, "alice")).unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.password, "hash");
        assert!(db.with_conn(|conn| find_by_login(conn, "bob")).unwrap().is_none());

        let name = db.with_conn(|conn| find_name_by_id(conn, id)).unwrap();
        assert_eq!(name.as_deref(), Some("alice"));
        assert!(db.with_conn(|conn| find_name_by_id(conn, id + 100)).unwrap().is_none());
    }

    #[test]
    fn batch_name_lookup_skips_unknown_ids() {
        let db = Database::open_in_memory().unwrap();
        let alice = db.with_conn(|conn| insert(conn, "alice", "h")).unwrap();
        let bob = db.with_conn(|conn| insert(conn, "bob", "h")).unwrap();

        let names = db
            .with_conn(|conn| find_names_by_ids(conn, &[alice, bob, 999]))
            .unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&alice], "alice");
        assert_eq!(names[&bob], "bob");
    }
}
