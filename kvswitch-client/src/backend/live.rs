use std::collections::BTreeMap;

use deadpool::managed::Status;
use kvswitch_core::proto::{Command, Reply};
use redis::Value;
use tracing::debug;

use crate::{
    backend::Backend,
    error::{ClientError, ClientResult},
    pool::{ConnectionPool, PooledConnection, borrow, build_pool, within},
    settings::Settings,
};

/// Backend talking to a real store through a pooled connection.
///
/// The first command after construction or [`Backend::release`] borrows a
/// connection from the pool and keeps it; later commands reuse it until
/// `release` hands it back. Methods take `&mut self`, so one backend serves
/// one caller at a time. Clone it to get a sibling sharing the same pool
/// for another concurrent caller.
pub struct LiveBackend {
    settings: Settings,
    pool: Option<ConnectionPool>,
    conn: Option<PooledConnection>,
    queued: Vec<Command>,
}

impl LiveBackend {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            pool: None,
            conn: None,
            queued: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Pool occupancy, `None` until the backend is set up.
    pub fn status(&self) -> Option<Status> {
        self.pool.as_ref().map(|pool| pool.status())
    }

    pub fn is_holding_connection(&self) -> bool {
        self.conn.is_some()
    }

    async fn acquire(&mut self) -> ClientResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| ClientError::Pool("backend is not set up".to_string()))?;
        let conn = borrow(pool, self.settings.wait_timeout()).await?;
        debug!("Borrowed connection, pool status: {:?}", pool.status());

        self.conn = Some(conn);
        Ok(())
    }
}

impl Clone for LiveBackend {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            pool: self.pool.clone(),
            conn: None,
            queued: Vec::new(),
        }
    }
}

impl Backend for LiveBackend {
    fn setup(&mut self) -> ClientResult<()> {
        // Siblings keep the pool they were cloned with.
        if self.pool.is_none() {
            self.pool = Some(build_pool(&self.settings)?);
        }

        Ok(())
    }

    async fn execute(&mut self, command: Command) -> ClientResult<Reply> {
        self.acquire().await?;

        let timeout = self.settings.response_timeout();
        let queued = std::mem::take(&mut self.queued);
        let conn = self.conn.as_mut().ok_or(ClientError::NotAcquired)?;

        let value: Value = if queued.is_empty() {
            let cmd = to_redis(&command);
            within(timeout, cmd.query_async(&mut conn.inner), ClientError::from).await?
        } else {
            debug!("Sending {} queued commands ahead of {}", queued.len(), command.name);

            let mut pipe = redis::pipe();
            for queued_command in &queued {
                pipe.add_command(to_redis(queued_command)).ignore();
            }
            pipe.add_command(to_redis(&command));

            let value: Value =
                within(timeout, pipe.query_async(&mut conn.inner), ClientError::from).await?;
            single_reply(value)
        };

        Ok(reply_from_value(value))
    }

    async fn queue_only(&mut self, command: Command) -> ClientResult<()> {
        self.acquire().await?;

        debug!("Queued {}", command.name);
        self.queued.push(command);

        Ok(())
    }

    async fn release(&mut self) -> ClientResult<()> {
        let mut conn = self.conn.take().ok_or(ClientError::NotAcquired)?;
        let queued = std::mem::take(&mut self.queued);

        if !queued.is_empty() {
            debug!("Flushing {} queued commands on release", queued.len());

            let mut pipe = redis::pipe();
            for queued_command in &queued {
                pipe.add_command(to_redis(queued_command)).ignore();
            }

            let flushed: ClientResult<()> = within(
                self.settings.response_timeout(),
                pipe.query_async(&mut conn.inner),
                ClientError::from,
            )
            .await;

            conn.mark_returned();
            return flushed;
        }

        conn.mark_returned();
        debug!("Released connection");
        Ok(())
    }
}

impl Drop for LiveBackend {
    fn drop(&mut self) {
        // A held connection goes back to the pool with the backend.
        if let Some(conn) = self.conn.as_mut() {
            conn.mark_returned();
        }
    }
}

fn to_redis(command: &Command) -> redis::Cmd {
    let mut cmd = redis::cmd(&command.name);
    for arg in &command.args {
        cmd.arg(arg.to_bytes());
    }
    cmd
}

/// A pipeline answers with the replies it did not ignore; we keep exactly one.
fn single_reply(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.pop().unwrap_or(Value::Nil),
        other => other,
    }
}

fn reply_from_value(value: Value) -> Reply {
    match value {
        Value::Nil => Reply::Nil,
        Value::Int(i) => Reply::Int(i),
        Value::Double(d) => Reply::Double(d),
        Value::Boolean(b) => Reply::Int(b as i64),
        Value::Okay => Reply::Status("OK".to_string()),
        Value::SimpleString(s) => Reply::Status(s),
        Value::VerbatimString { text, .. } => Reply::Status(text),
        Value::BulkString(bytes) => Reply::Bytes(bytes),
        Value::Array(items) | Value::Set(items) => {
            Reply::Array(items.into_iter().map(reply_from_value).collect())
        }
        Value::Map(pairs) => map_reply(pairs),
        Value::Attribute { data, .. } => reply_from_value(*data),
        Value::Push { data, .. } => Reply::Array(data.into_iter().map(reply_from_value).collect()),
        Value::BigNumber(n) => Reply::Status(n.to_string()),
        other => Reply::Status(format!("{other:?}")),
    }
}

fn map_reply(pairs: Vec<(Value, Value)>) -> Reply {
    let replies: Vec<(Reply, Reply)> = pairs
        .into_iter()
        .map(|(k, v)| (reply_from_value(k), reply_from_value(v)))
        .collect();

    let as_strings: Option<BTreeMap<String, String>> = replies
        .iter()
        .map(|(k, v)| Some((text_of(k)?, text_of(v)?)))
        .collect();

    match as_strings {
        Some(map) => Reply::Map(map),
        None => Reply::Array(
            replies
                .into_iter()
                .flat_map(|(k, v)| [k, v])
                .collect(),
        ),
    }
}

fn text_of(reply: &Reply) -> Option<String> {
    match reply {
        Reply::Status(s) => Some(s.clone()),
        Reply::Bytes(bytes) => String::from_utf8(bytes.clone()).ok(),
        Reply::Int(i) => Some(i.to_string()),
        _ => None,
    }
}
