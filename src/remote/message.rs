use anyhow::Result;

use super::{NodeInfo, RemoteContainer};

#[derive(Debug)]
pub enum RemoteMessage {
    Connected(Result<()>),
    Containers(Result<Vec<RemoteContainer>>),
    NodeInfo(Result<NodeInfo>),
    Logs {
        container_id: String,
        result: Result<String>,
    },
    Disconnected,
}
