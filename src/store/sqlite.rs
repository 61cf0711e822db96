// src/store/sqlite.rs

use super::{RecordStore, ReferenceKind};
use crate::db::connection::Database;
use crate::domain::fields::{FieldValue, OfferField};
use crate::domain::offer::{NewOffer, Offer, OfferFields, OfferId, OfferPatch};
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};

/// Record store backed by the embedded SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Text(s) => ToSqlOutput::Owned(SqlValue::Text(s.clone())),
            FieldValue::Int(n) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
        })
    }
}

/// `id, <all field columns>, created_at, updated_at`
fn select_columns() -> String {
    let fields: Vec<&str> = OfferField::ALL.iter().map(|f| f.column()).collect();
    format!("id, {}, created_at, updated_at", fields.join(", "))
}

fn offer_from_row(row: &Row<'_>) -> rusqlite::Result<Offer> {
    let mut fields = OfferFields::default();
    for (i, field) in OfferField::ALL.iter().enumerate() {
        let value = match field {
            OfferField::EstimatedRevenue => FieldValue::Int(row.get(i + 1)?),
            _ => FieldValue::Text(row.get(i + 1)?),
        };
        fields.set(*field, value);
    }
    let n = OfferField::ALL.len();
    Ok(Offer {
        id: OfferId(row.get(0)?),
        fields,
        docs_count: 0,
        created_at: row.get(n + 1)?,
        updated_at: row.get(n + 2)?,
    })
}

fn find_offer(conn: &Connection, id: OfferId) -> Result<Option<Offer>, ServerError> {
    conn.query_row(
        &format!("SELECT {} FROM offers WHERE id = ?1", select_columns()),
        params![id.0],
        offer_from_row,
    )
    .optional()
    .map_err(|e| ServerError::Transport(e.to_string()))
}

impl RecordStore for SqliteStore {
    fn list_offers(&self) -> Result<Vec<Offer>, ServerError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM offers ORDER BY created_at DESC, id DESC",
                select_columns()
            ))?;
            let rows = stmt.query_map([], offer_from_row)?;

            let mut offers = Vec::new();
            for r in rows {
                offers.push(r?);
            }
            Ok(offers)
        })
    }

    fn create_offer(&self, offer: &NewOffer) -> Result<Offer, ServerError> {
        let assignments = offer.assignments();
        let columns: Vec<&str> = assignments.iter().map(|(f, _)| f.column()).collect();
        let placeholders: Vec<String> = (1..=assignments.len() + 2).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO offers ({}, created_at, updated_at) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        let now = Utc::now();

        self.db.with_conn(|conn| {
            let mut values: Vec<&dyn ToSql> = assignments.iter().map(|(_, v)| v as &dyn ToSql).collect();
            values.push(&now);
            values.push(&now);
            conn.execute(&sql, params_from_iter(values))?;

            let id = OfferId(conn.last_insert_rowid());
            find_offer(conn, id)?.ok_or(ServerError::InternalError)
        })
    }

    fn update_offer(&self, id: OfferId, patch: &OfferPatch) -> Result<Offer, ServerError> {
        self.db.with_conn(|conn| {
            if !patch.is_empty() {
                let sets: Vec<String> = patch
                    .changes()
                    .iter()
                    .enumerate()
                    .map(|(i, (f, _))| format!("{} = ?{}", f.column(), i + 1))
                    .collect();
                let n = sets.len();
                let sql = format!(
                    "UPDATE offers SET {}, updated_at = ?{} WHERE id = ?{}",
                    sets.join(", "),
                    n + 1,
                    n + 2
                );
                let now = Utc::now();
                let mut values: Vec<&dyn ToSql> =
                    patch.changes().iter().map(|(_, v)| v as &dyn ToSql).collect();
                values.push(&now);
                values.push(&id.0);

                let changed = conn.execute(&sql, params_from_iter(values))?;
                if changed == 0 {
                    return Err(ServerError::NotFound);
                }
            }
            find_offer(conn, id)?.ok_or(ServerError::NotFound)
        })
    }

    fn delete_offers(&self, ids: &[OfferId]) -> Result<(), ServerError> {
        if ids.is_empty() {
            return Ok(());
        }
        let placeholders: Vec<&str> = ids.iter().map(|_| "?").collect();
        let sql = format!("DELETE FROM offers WHERE id IN ({})", placeholders.join(", "));

        self.db.with_conn(|conn| {
            conn.execute(&sql, params_from_iter(ids.iter().map(|id| id.0)))?;
            Ok(())
        })
    }

    fn list_references(&self, kind: ReferenceKind) -> Result<Vec<String>, ServerError> {
        let sql = format!(
            "SELECT {col} FROM {table} ORDER BY {col}",
            col = kind.column(),
            table = kind.table()
        );
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut values = Vec::new();
            for r in rows {
                values.push(r?);
            }
            Ok(values)
        })
    }

    fn add_reference(&self, kind: ReferenceKind, value: &str) -> Result<(), ServerError> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}) VALUES (?1)",
            kind.table(),
            kind.column()
        );
        self.db.with_conn(|conn| {
            conn.execute(&sql, params![value])?;
            Ok(())
        })
    }
}
