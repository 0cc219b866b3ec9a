use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::ParticipantRole;
use crate::models::{ContactCard, Provider, Requester};

use super::{format_ts, parse_ts, parse_uuid};

pub fn insert_provider(conn: &Connection, provider: &Provider) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO providers (id, display_name, email, specialty, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            provider.id.to_string(),
            provider.display_name,
            provider.email,
            provider.specialty,
            format_ts(provider.created_at),
        ],
    )?;
    Ok(())
}

pub fn insert_requester(conn: &Connection, requester: &Requester) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO requesters (id, display_name, email, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            requester.id.to_string(),
            requester.display_name,
            requester.email,
            format_ts(requester.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_provider(conn: &Connection, id: &Uuid) -> Result<Provider, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, display_name, email, specialty, created_at
         FROM providers WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    );

    match result {
        Ok((id, display_name, email, specialty, created_at)) => Ok(Provider {
            id: parse_uuid(&id)?,
            display_name,
            email,
            specialty,
            created_at: parse_ts(&created_at)?,
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DatabaseError::NotFound {
            entity_type: "Provider".into(),
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

pub fn get_requester(conn: &Connection, id: &Uuid) -> Result<Requester, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, display_name, email, created_at
         FROM requesters WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, display_name, email, created_at)) => Ok(Requester {
            id: parse_uuid(&id)?,
            display_name,
            email,
            created_at: parse_ts(&created_at)?,
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DatabaseError::NotFound {
            entity_type: "Requester".into(),
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Resolves contact info for a participant id, trying the provider table
/// first and the requester table second. NotFound when neither role matches.
pub fn get_contact(conn: &Connection, id: &Uuid) -> Result<ContactCard, DatabaseError> {
    match get_provider(conn, id) {
        Ok(provider) => {
            return Ok(ContactCard {
                email: provider.email,
                display_name: provider.display_name,
                role: ParticipantRole::Provider,
            })
        }
        Err(DatabaseError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    match get_requester(conn, id) {
        Ok(requester) => Ok(ContactCard {
            email: requester.email,
            display_name: requester.display_name,
            role: ParticipantRole::Requester,
        }),
        Err(DatabaseError::NotFound { .. }) => Err(DatabaseError::NotFound {
            entity_type: "Participant".into(),
            id: id.to_string(),
        }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_provider() -> Provider {
        Provider {
            id: Uuid::new_v4(),
            display_name: "Dr. Vega".into(),
            email: "vega@example.com".into(),
            specialty: Some("Psychotherapy".into()),
            created_at: parse_ts("2025-01-01 09:00:00").unwrap(),
        }
    }

    fn make_requester() -> Requester {
        Requester {
            id: Uuid::new_v4(),
            display_name: "Ana Sousa".into(),
            email: "ana@example.com".into(),
            created_at: parse_ts("2025-01-01 09:00:00").unwrap(),
        }
    }

    #[test]
    fn provider_round_trips() {
        let conn = test_db();
        let provider = make_provider();
        insert_provider(&conn, &provider).unwrap();

        let loaded = get_provider(&conn, &provider.id).unwrap();
        assert_eq!(loaded.display_name, "Dr. Vega");
        assert_eq!(loaded.specialty.as_deref(), Some("Psychotherapy"));
    }

    #[test]
    fn contact_resolves_provider_role() {
        let conn = test_db();
        let provider = make_provider();
        insert_provider(&conn, &provider).unwrap();

        let contact = get_contact(&conn, &provider.id).unwrap();
        assert_eq!(contact.role, ParticipantRole::Provider);
        assert_eq!(contact.email, "vega@example.com");
    }

    #[test]
    fn contact_resolves_requester_role() {
        let conn = test_db();
        let requester = make_requester();
        insert_requester(&conn, &requester).unwrap();

        let contact = get_contact(&conn, &requester.id).unwrap();
        assert_eq!(contact.role, ParticipantRole::Requester);
        assert_eq!(contact.display_name, "Ana Sousa");
    }

    #[test]
    fn contact_missing_under_both_roles_is_not_found() {
        let conn = test_db();
        let result = get_contact(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
