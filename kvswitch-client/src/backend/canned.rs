use std::collections::BTreeMap;

use kvswitch_core::proto::{Command, Reply};

use crate::{backend::Backend, error::ClientResult};

/// Fixed replies for a handful of commands, no I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestBackend;

impl Backend for TestBackend {
    fn setup(&mut self) -> ClientResult<()> {
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> ClientResult<Reply> {
        Ok(canned_reply(&command.name))
    }

    async fn queue_only(&mut self, _command: Command) -> ClientResult<()> {
        Ok(())
    }

    async fn release(&mut self) -> ClientResult<()> {
        Ok(())
    }
}

fn canned_reply(name: &str) -> Reply {
    match name {
        "SMEMBERS" => Reply::Array(vec![
            Reply::from("12"),
            Reply::from("234"),
            Reply::from("2"),
        ]),
        "EXEC" => Reply::Array(vec![Reply::Map(BTreeMap::from([(
            "dear".to_string(),
            "me".to_string(),
        )]))]),
        _ => Reply::Nil,
    }
}
