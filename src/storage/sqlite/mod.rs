#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

mod migration;

use async_trait::async_trait;
use eyre::{Context, Result};
use tokio_rusqlite::{Connection, OpenFlags, ToSql, named_params, params};

use crate::models::{ChatRecord, ChatRecordFilter, Role};
use crate::storage::Storage;

use migration::MIGRATION;

pub struct Sqlite {
    conn: Connection,
}

impl Sqlite {
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            )
            .await
            .wrap_err(format!("opening database path: {}", path))?,
            None => Connection::open_in_memory()
                .await
                .wrap_err("opening in-memory database")?,
        };

        let ret = Self { conn };
        ret.run_migration().await.wrap_err("running migration")?;
        Ok(ret)
    }

    async fn run_migration(&self) -> Result<()> {
        self.conn
            .call(|conn| Ok(conn.execute_batch(MIGRATION)?))
            .await
            .wrap_err("executing migration")?;
        Ok(())
    }
}

#[async_trait]
impl Storage for Sqlite {
    async fn insert_chat_messages(&self, records: &[ChatRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let records = records.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for record in records {
                    tx.execute(
                        r#"INSERT INTO chat_messages (id, user_id, role, content, created_at)
                VALUES (:id, :user_id, :role, :content, :created_at)
                "#,
                        named_params! {
                            ":id": record.id(),
                            ":user_id": record.user_id(),
                            ":role": record.role().as_str(),
                            ":content": record.content(),
                            ":created_at": record.created_at().timestamp_millis(),
                        },
                    )?;
                }
                Ok(tx.commit()?)
            })
            .await
            .wrap_err("inserting chat messages")?;
        Ok(())
    }

    async fn get_chat_messages(&self, filter: ChatRecordFilter) -> Result<Vec<ChatRecord>> {
        let records = self
            .conn
            .call(move |conn| {
                let (query, params) = filter_to_query(&filter);
                let mut stmt = conn.prepare(&query)?;
                let params: Vec<(&str, &dyn ToSql)> =
                    params.iter().map(|(n, v)| (*n, v.as_ref())).collect();
                let mut rows = stmt.query(params.as_slice())?;

                let mut records = vec![];
                while let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let user_id: String = row.get(1)?;
                    let role: String = row.get(2)?;
                    let content: String = row.get(3)?;
                    let created_at: i64 = row.get(4)?;

                    let role = role
                        .parse::<Role>()
                        .map_err(|err| tokio_rusqlite::Error::Other(err.into()))?;
                    let created_at = chrono::DateTime::from_timestamp_millis(created_at).ok_or(
                        tokio_rusqlite::Error::Other(eyre::eyre!("invalid created_at").into()),
                    )?;

                    let message = crate::models::Message::new(role, content);
                    records.push(
                        ChatRecord::new(user_id, &message)
                            .with_id(id)
                            .with_created_at(created_at),
                    );
                }
                Ok(records)
            })
            .await
            .wrap_err("querying chat messages")?;

        // Rows come back newest first so that LIMIT keeps the latest ones.
        Ok(records.into_iter().rev().collect())
    }

    async fn delete_chat_messages(&self, user_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let deleted =
                    tx.execute("DELETE FROM chat_messages WHERE user_id = ?", params![user_id])?;
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .wrap_err("deleting chat messages")?;
        Ok(deleted)
    }
}

fn filter_to_query(filter: &ChatRecordFilter) -> (String, Vec<(&str, Box<dyn ToSql>)>) {
    let mut query =
        String::from("SELECT id, user_id, role, content, created_at FROM chat_messages WHERE 1=1");
    let mut params: Vec<(&str, Box<dyn ToSql>)> = vec![];

    if let Some(user_id) = filter.user_id() {
        query.push_str(" AND user_id = :user_id");
        params.push((":user_id", Box::new(user_id.to_string())));
    }

    if let Some(role) = filter.role() {
        query.push_str(" AND role = :role");
        params.push((":role", Box::new(role.as_str().to_string())));
    }

    if let Some(content_contains) = filter.content_contains() {
        query.push_str(" AND content LIKE :content_contains");
        params.push((
            ":content_contains",
            Box::new(format!("%{}%", content_contains)),
        ));
    }

    query.push_str(" ORDER BY created_at DESC, rowid DESC");

    if let Some(limit) = filter.limit() {
        query.push_str(" LIMIT :limit");
        params.push((":limit", Box::new(limit as i64)));
    }

    (query, params)
}
