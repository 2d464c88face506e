use std::{
    future::Future,
    time::{Duration, Instant},
};

use deadpool::{
    Runtime,
    managed::{Manager, Metrics, Object, Pool, PoolError, RecycleError, RecycleResult},
};
use redis::{RedisError, RedisResult, aio::MultiplexedConnection};
use tracing::debug;

use crate::{
    error::{ClientError, ClientResult},
    settings::Settings,
};

/// Pooled store connection, stamped when it goes back to the pool.
pub struct Connection {
    pub inner: MultiplexedConnection,
    returned_at: Option<Instant>,
}

impl Connection {
    pub fn mark_returned(&mut self) {
        self.returned_at = Some(Instant::now());
    }

    /// Time spent in the pool since the last return, zero if never returned.
    pub fn idle_for(&self) -> Duration {
        self.returned_at
            .map(|at| at.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

pub struct ConnectionManager {
    client: redis::Client,
    addr: String,
    idle_timeout: Duration,
    connect_timeout: Option<Duration>,
    response_timeout: Option<Duration>,
}

impl Manager for ConnectionManager {
    type Type = Connection;
    type Error = ClientError;

    async fn create(&self) -> Result<Connection, Self::Error> {
        debug!("Dialing {}", self.addr);

        let inner = within(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
            ClientError::Connection,
        )
        .await?;

        Ok(Connection {
            inner,
            returned_at: None,
        })
    }

    async fn recycle(&self, conn: &mut Connection, _: &Metrics) -> RecycleResult<Self::Error> {
        let idle = conn.idle_for();
        if idle > self.idle_timeout {
            debug!("Dropping connection idle for {:?}", idle);
            return Err(RecycleError::Backend(ClientError::IdleExpired));
        }

        let ping = redis::cmd("PING");
        let _: () = within(
            self.response_timeout,
            ping.query_async(&mut conn.inner),
            ClientError::Connection,
        )
        .await
        .map_err(RecycleError::Backend)?;

        Ok(())
    }
}

impl ConnectionManager {
    pub fn new(settings: &Settings) -> ClientResult<Self> {
        let addr = settings.url();
        let client = redis::Client::open(addr.as_str()).map_err(ClientError::Connection)?;

        Ok(Self {
            client,
            addr,
            idle_timeout: settings.idle_timeout(),
            connect_timeout: settings.connect_timeout(),
            response_timeout: settings.response_timeout(),
        })
    }
}

pub type ConnectionPool = Pool<ConnectionManager>;
pub type PooledConnection = Object<ConnectionManager>;

pub fn build_pool(settings: &Settings) -> ClientResult<ConnectionPool> {
    let manager = ConnectionManager::new(settings)?;

    ConnectionPool::builder(manager)
        .max_size(settings.max_idle.max(1))
        .wait_timeout(settings.wait_timeout())
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| ClientError::Pool(e.to_string()))
}

/// Borrows a connection, handing dial and health-check failures back as they are.
pub async fn borrow(
    pool: &ConnectionPool,
    wait_timeout: Option<Duration>,
) -> ClientResult<PooledConnection> {
    pool.get().await.map_err(|e| match (e, wait_timeout) {
        (PoolError::Backend(e), _) => e,
        (PoolError::Timeout(_), Some(limit)) => ClientError::Timeout(limit),
        (other, _) => ClientError::Pool(other.to_string()),
    })
}

pub async fn within<T, F>(
    limit: Option<Duration>,
    fut: F,
    on_error: fn(RedisError) -> ClientError,
) -> ClientResult<T>
where
    F: Future<Output = RedisResult<T>>,
{
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ClientError::Timeout(limit))?,
        None => fut.await,
    };

    result.map_err(on_error)
}
