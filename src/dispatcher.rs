//! Event loop core.
//!
//! [`Dispatcher::handle`] consumes one [`Message`] at a time, mutates
//! [`AppState`] and returns the tasks to run next. It performs no I/O itself.

mod keys;
mod modals;
mod navigation;
mod refresh;
mod results;
mod state;
mod streams;


use crate::{
    config::{Config, HostEntry},
    features::notification::NotificationKind,
    logger,
    message::{Message, UserEvent},
    remote::{RemoteHandle, SshClient},
    task::{ClusterRequest, RemoteRequest, Task},
};

pub use self::{
    refresh::RefreshTarget,
    state::{AppState, ClusterSession, RemoteSession, ViewState},
};

/// Builds the remote client for a configured host.
pub type Connector = Box<dyn Fn(&HostEntry) -> RemoteHandle + Send>;

pub struct Dispatcher {
    state: AppState,
    connector: Connector,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        Self::with_connector(
            config,
            Box::new(|entry| RemoteHandle::new(SshClient::new(entry.clone()))),
        )
    }

    pub fn with_connector(config: &Config, connector: Connector) -> Self {
        Self {
            state: AppState::new(config),
            connector,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Connects right away when exactly one cluster is configured.
    pub fn init(&mut self) -> Vec<Task> {
        if let [entry] = self.state.clusters.items() {
            let entry = entry.clone();
            return self.connect(entry);
        }

        self.state.view = ViewState::ConfigSelect;

        vec![]
    }

    pub fn handle(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::User(UserEvent::Key(key)) => self.on_key(key),
            Message::User(_) => vec![],
            Message::Tick => {
                self.state.tick();
                vec![]
            }
            Message::Refresh(target) => self.on_refresh(target),
            Message::Cluster(message) => self.on_cluster(message),
            Message::Remote(message) => self.on_remote(message),
            Message::Stream(message) => self.on_stream(message),
            Message::ExpireNotification(id) => {
                self.state.notifier.expire(id);
                vec![]
            }
            Message::Error(err) => {
                logger!(error, "{:#}", err);
                self.state.error = Some(format!("{:#}", err));
                vec![]
            }
        }
    }

    /// Stops every stream and closes the remote connection.
    pub fn shutdown(&mut self) -> Vec<Task> {
        self.state.pod_stream.stop();
        self.state.remote_stream.stop();
        self.state.multi_stream.stop();

        self.disconnect_remote().into_iter().collect()
    }

    fn quit(&mut self) -> Vec<Task> {
        logger!(info, "quit requested");

        let mut tasks = self.shutdown();
        tasks.push(Task::Quit);
        tasks
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) -> Task {
        self.state.notifier.show(kind, message)
    }

    fn cluster_task(&self, request: ClusterRequest) -> Option<Task> {
        let session = self.state.cluster.as_ref()?;

        Some(Task::Cluster {
            client: session.client.clone(),
            request,
        })
    }

    fn remote_task(&self, request: RemoteRequest) -> Option<Task> {
        let session = self.state.remote.as_ref()?;

        Some(Task::Remote {
            client: session.client.clone(),
            request,
        })
    }

    fn disconnect_remote(&mut self) -> Option<Task> {
        self.state.remote_stream.stop();
        self.state.remote_containers.clear();
        self.state.remote_log_container = None;
        self.state.node_info.clear();

        let session = self.state.remote.take()?;

        logger!(info, "disconnecting from {}", session.host.name);

        Some(Task::Remote {
            client: session.client,
            request: RemoteRequest::Disconnect,
        })
    }
}
