mod backend;
pub mod error;
mod pool;
pub mod settings;

pub use backend::{Backend, canned::TestBackend, live::LiveBackend};
pub use deadpool::managed::Status;
pub use kvswitch_core::proto::{Arg, Command, Reply, cmd};

use crate::{error::ClientResult, settings::Settings};

/// Single entry point for issuing commands.
///
/// Forwards every call to the backend it was built with, unchanged. One
/// client serves one caller at a time; use one client per concurrent task.
pub struct Client<B: Backend> {
    backend: B,
}

impl<B: Backend> Client<B> {
    pub fn new(mut backend: B) -> ClientResult<Self> {
        backend.setup()?;

        Ok(Self { backend })
    }

    pub async fn execute(&mut self, command: Command) -> ClientResult<Reply> {
        self.backend.execute(command).await
    }

    pub async fn queue_only(&mut self, command: Command) -> ClientResult<()> {
        self.backend.queue_only(command).await
    }

    pub async fn release(&mut self) -> ClientResult<()> {
        self.backend.release().await
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl Client<LiveBackend> {
    pub fn live(settings: Settings) -> ClientResult<Self> {
        Self::new(LiveBackend::new(settings))
    }

    /// Another client drawing from the same pool.
    pub fn sibling(&self) -> ClientResult<Self> {
        Self::new(self.backend.clone())
    }

    pub fn status(&self) -> Option<Status> {
        self.backend.status()
    }
}

impl Client<TestBackend> {
    pub fn canned() -> ClientResult<Self> {
        Self::new(TestBackend)
    }
}
