//! Node-level container inspection over ssh.

mod crictl;
mod message;
mod ssh;

use std::{fmt, ops::Deref, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::{kube::LogOptions, stream::LineSender};

pub use self::{
    crictl::{ContainerState, NodeInfo, RemoteContainer},
    message::RemoteMessage,
    ssh::{askpass_reply, key_requires_passphrase, SshClient},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("identity file is encrypted; passphrase required")]
    PassphraseRequired,

    #[error("not connected")]
    NotConnected,

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("invalid container id {0:?}")]
    InvalidContainerId(String),
}

/// A host whose container runtime is inspected through a remote shell.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Used by the next [`RemoteHost::connect`].
    fn set_passphrase(&self, passphrase: String);

    /// Fails with [`RemoteError::PassphraseRequired`] when the identity file is
    /// encrypted and no passphrase was supplied.
    async fn connect(&self) -> Result<()>;

    async fn containers(&self) -> Result<Vec<RemoteContainer>>;

    async fn node_info(&self) -> Result<NodeInfo>;

    async fn logs(&self, container_id: &str, options: &LogOptions) -> Result<String>;

    /// Follows the container log until the remote command exits or `out` is closed.
    async fn stream_logs(
        &self,
        container_id: &str,
        options: &LogOptions,
        out: LineSender,
    ) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct RemoteHandle(Arc<dyn RemoteHost>);

impl RemoteHandle {
    pub fn new(host: impl RemoteHost + 'static) -> Self {
        Self(Arc::new(host))
    }
}

impl Deref for RemoteHandle {
    type Target = dyn RemoteHost;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RemoteHandle")
    }
}

/// Returns true when the error chain carries [`RemoteError::PassphraseRequired`].
pub fn is_passphrase_required(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RemoteError>()
        .is_some_and(|err| *err == RemoteError::PassphraseRequired)
}

#[cfg(test)]
pub mod mock {
    use anyhow::Result;
    use mockall::mock;

    use crate::{kube::LogOptions, stream::LineSender};

    use super::{NodeInfo, RemoteContainer, RemoteHost};

    mock! {
        pub TestRemoteHost {}

        #[async_trait::async_trait]
        impl RemoteHost for TestRemoteHost {
            fn set_passphrase(&self, passphrase: String);
            async fn connect(&self) -> Result<()>;
            async fn containers(&self) -> Result<Vec<RemoteContainer>>;
            async fn node_info(&self) -> Result<NodeInfo>;
            async fn logs(&self, container_id: &str, options: &LogOptions) -> Result<String>;
            async fn stream_logs(&self, container_id: &str, options: &LogOptions, out: LineSender) -> Result<()>;
            async fn disconnect(&self) -> Result<()>;
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn パスフレーズ要求エラーを判別する() {
        assert!(is_passphrase_required(&RemoteError::PassphraseRequired.into()));
        assert!(!is_passphrase_required(&RemoteError::NotConnected.into()));
        assert!(!is_passphrase_required(&anyhow!("connection refused")));
    }
}
