//! Card Repository
//!
//! SQLite implementation of the card gateway. Timestamps are stored as
//! unix milliseconds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use card_board::error::GatewayResult;
use card_board::{Card, CardChanges, CardDraft, CardGateway, CardId, GatewayError};

use super::db::SharedConnection;

const SELECT_COLUMNS: &str =
    "SELECT id, title, content, card_type, color, size, position, user_id, created_at, updated_at FROM cards";

/// Raw column values before they are checked against the card enums
struct CardRow {
    id: i64,
    title: String,
    content: String,
    card_type: String,
    color: String,
    size: String,
    position: i32,
    owner: String,
    created_at: i64,
    updated_at: i64,
}

impl CardRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            card_type: row.get(3)?,
            color: row.get(4)?,
            size: row.get(5)?,
            position: row.get(6)?,
            owner: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_card(self) -> GatewayResult<Card> {
        let invalid = |e: card_board::ValidationError| GatewayError::Invalid(e.to_string());
        Ok(Card {
            id: CardId::new(self.id.to_string()),
            title: self.title,
            content: self.content,
            card_type: self.card_type.parse().map_err(invalid)?,
            color: self.color.parse().map_err(invalid)?,
            size: self.size.parse().map_err(invalid)?,
            position: self.position,
            owner: self.owner,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

fn from_millis(millis: i64) -> GatewayResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| GatewayError::Invalid(format!("timestamp out of range: {}", millis)))
}

fn transport(e: rusqlite::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Database ids are integers; anything else cannot exist
fn row_id(id: &CardId) -> GatewayResult<i64> {
    id.as_str().parse().map_err(|_| GatewayError::NotFound(id.clone()))
}

fn find(conn: &Connection, id: i64) -> GatewayResult<Option<Card>> {
    let row = conn
        .query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), params![id], CardRow::from_row)
        .optional()
        .map_err(transport)?;
    row.map(CardRow::into_card).transpose()
}

/// SQLite implementation of the card gateway
pub struct SqliteCardGateway {
    conn: SharedConnection,
}

impl SqliteCardGateway {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CardGateway for SqliteCardGateway {
    async fn list(&self, owner: &str) -> GatewayResult<Vec<Card>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "{} WHERE user_id = ?1 ORDER BY position ASC, created_at DESC, id DESC",
                SELECT_COLUMNS
            ))
            .map_err(transport)?;
        let rows = stmt
            .query_map(params![owner], CardRow::from_row)
            .map_err(transport)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(transport)?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    async fn create(&self, owner: &str, draft: &CardDraft) -> GatewayResult<Card> {
        let conn = self.conn.lock().await;
        let now = Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO cards (title, content, card_type, color, size, position, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                draft.title,
                draft.content,
                draft.card_type.as_str(),
                draft.color.as_str(),
                draft.size.as_str(),
                draft.position,
                owner,
                now,
            ],
        )
        .map_err(transport)?;

        let id = conn.last_insert_rowid();
        find(&conn, id)?.ok_or_else(|| GatewayError::NotFound(CardId::new(id.to_string())))
    }

    async fn update(&self, id: &CardId, changes: &CardChanges) -> GatewayResult<Card> {
        let row = row_id(id)?;
        let conn = self.conn.lock().await;
        let updated = conn
            .execute(
                "UPDATE cards SET
                    title = COALESCE(?1, title),
                    content = COALESCE(?2, content),
                    card_type = COALESCE(?3, card_type),
                    color = COALESCE(?4, color),
                    size = COALESCE(?5, size),
                    position = COALESCE(?6, position),
                    updated_at = ?7
                 WHERE id = ?8",
                params![
                    changes.title,
                    changes.content,
                    changes.card_type.map(|t| t.as_str()),
                    changes.color.map(|c| c.as_str()),
                    changes.size.map(|s| s.as_str()),
                    changes.position,
                    Utc::now().timestamp_millis(),
                    row,
                ],
            )
            .map_err(transport)?;
        if updated == 0 {
            return Err(GatewayError::NotFound(id.clone()));
        }

        find(&conn, row)?.ok_or_else(|| GatewayError::NotFound(id.clone()))
    }

    async fn delete(&self, id: &CardId) -> GatewayResult<()> {
        let row = row_id(id)?;
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM cards WHERE id = ?1", params![row])
            .map_err(transport)?;
        if deleted == 0 {
            return Err(GatewayError::NotFound(id.clone()));
        }
        Ok(())
    }
}
