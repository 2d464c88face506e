use kvswitch_core::proto::{Command, Reply};

use crate::error::ClientResult;

pub mod canned;
pub mod live;

/// Command execution against some store, swappable behind [`crate::Client`].
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Called exactly once by [`crate::Client::new`], before any command.
    fn setup(&mut self) -> ClientResult<()>;

    async fn execute(&mut self, command: Command) -> ClientResult<Reply>;

    /// Sends without waiting for the reply. Backends that cannot defer
    /// sends succeed trivially.
    async fn queue_only(&mut self, command: Command) -> ClientResult<()>;

    async fn release(&mut self) -> ClientResult<()>;
}
