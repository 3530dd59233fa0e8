//! Deferred operations.
//!
//! A [`Task`] is plain data until [`TaskExecutor`] runs it; the application
//! loop only ever returns tasks, which keeps it free of I/O and lets tests
//! inspect exactly what would be executed.

mod executor;

use std::time::Duration;

use crate::{
    config::ClusterEntry,
    dispatcher::RefreshTarget,
    kube::{ClusterHandle, ClusterMessage, KubeClient, LogOptions, LogTarget, Mutation},
    logger,
    message::Message,
    remote::{RemoteHandle, RemoteMessage},
    stream::{LineQueue, StreamTask},
};

pub use self::executor::TaskExecutor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterRequest {
    Namespaces,
    Pods { namespace: String },
    PodDetail { namespace: String, name: String },
    Containers { namespace: String, pod: String },
    Logs { target: LogTarget, options: LogOptions },
    Deployments { namespace: String },
    DeploymentDetail { namespace: String, name: String },
    Services { namespace: String },
    ServiceDetail { namespace: String, name: String },
    Events { namespace: String },
    MetricsAvailable,
    Metrics { namespace: String },
    Mutate { namespace: String, mutation: Mutation },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRequest {
    Connect { passphrase: Option<String> },
    Containers,
    NodeInfo,
    Logs { container_id: String, options: LogOptions },
    Disconnect,
}

#[derive(Debug)]
pub enum Task {
    /// Handled by the application loop itself.
    Quit,
    ConnectCluster(ClusterEntry),
    Cluster {
        client: ClusterHandle,
        request: ClusterRequest,
    },
    Remote {
        client: RemoteHandle,
        request: RemoteRequest,
    },
    Stream(StreamTask),
    /// Await the next line of a running stream.
    NextLine(LineQueue),
    ScheduleRefresh {
        after: Duration,
        target: RefreshTarget,
    },
    ExpireNotification {
        after: Duration,
        id: u64,
    },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::ConnectCluster(_) => "connect-cluster",
            Self::Cluster { .. } => "cluster",
            Self::Remote { .. } => "remote",
            Self::Stream(_) => "stream",
            Self::NextLine(_) => "next-line",
            Self::ScheduleRefresh { .. } => "schedule-refresh",
            Self::ExpireNotification { .. } => "expire-notification",
        }
    }

    /// Produces the single result message of this task.
    pub async fn run(self) -> Option<Message> {
        let message = match self {
            Self::Quit => return None,
            Self::ConnectCluster(entry) => {
                ClusterMessage::Connected(KubeClient::connect(&entry).await).into()
            }
            Self::Cluster { client, request } => run_cluster(client, request).await.into(),
            Self::Remote { client, request } => run_remote(client, request).await.into(),
            Self::Stream(task) => task.run().await.into(),
            Self::NextLine(queue) => queue.next().await.into(),
            Self::ScheduleRefresh { after, target } => {
                tokio::time::sleep(after).await;
                Message::Refresh(target)
            }
            Self::ExpireNotification { after, id } => {
                tokio::time::sleep(after).await;
                Message::ExpireNotification(id)
            }
        };

        Some(message)
    }
}

async fn run_cluster(client: ClusterHandle, request: ClusterRequest) -> ClusterMessage {
    match request {
        ClusterRequest::Namespaces => ClusterMessage::Namespaces(client.namespaces().await),
        ClusterRequest::Pods { namespace } => {
            let result = client.pods(&namespace).await;
            ClusterMessage::Pods { namespace, result }
        }
        ClusterRequest::PodDetail { namespace, name } => {
            let result = client.pod_detail(&namespace, &name).await;
            ClusterMessage::PodDetail {
                namespace,
                name,
                result,
            }
        }
        ClusterRequest::Containers { namespace, pod } => {
            let result = client.containers(&namespace, &pod).await;
            ClusterMessage::Containers {
                namespace,
                pod,
                result,
            }
        }
        ClusterRequest::Logs { target, options } => {
            let result = client.logs(&target, &options).await;
            ClusterMessage::Logs { target, result }
        }
        ClusterRequest::Deployments { namespace } => {
            let result = client.deployments(&namespace).await;
            ClusterMessage::Deployments { namespace, result }
        }
        ClusterRequest::DeploymentDetail { namespace, name } => {
            let result = client.deployment(&namespace, &name).await;
            ClusterMessage::DeploymentDetail {
                namespace,
                name,
                result,
            }
        }
        ClusterRequest::Services { namespace } => {
            let result = client.services(&namespace).await;
            ClusterMessage::Services { namespace, result }
        }
        ClusterRequest::ServiceDetail { namespace, name } => {
            let result = client.service(&namespace, &name).await;
            ClusterMessage::ServiceDetail {
                namespace,
                name,
                result,
            }
        }
        ClusterRequest::Events { namespace } => {
            let result = client.events(&namespace).await;
            ClusterMessage::Events { namespace, result }
        }
        ClusterRequest::MetricsAvailable => {
            ClusterMessage::MetricsAvailable(client.metrics_available().await)
        }
        ClusterRequest::Metrics { namespace } => {
            let result = client.pod_metrics(&namespace).await;
            ClusterMessage::Metrics { namespace, result }
        }
        ClusterRequest::Mutate {
            namespace,
            mutation,
        } => {
            let result = match &mutation {
                Mutation::DeletePod(name) => client.delete_pod(&namespace, name).await,
                Mutation::RestartPod(name) => client.restart_pod(&namespace, name).await,
                Mutation::DeleteDeployment(name) => {
                    client.delete_deployment(&namespace, name).await
                }
                Mutation::RestartDeployment(name) => {
                    client.restart_deployment(&namespace, name).await
                }
                Mutation::ScaleDeployment { name, replicas } => {
                    client.scale_deployment(&namespace, name, *replicas).await
                }
            };

            ClusterMessage::Mutated { mutation, result }
        }
    }
}

async fn run_remote(client: RemoteHandle, request: RemoteRequest) -> RemoteMessage {
    match request {
        RemoteRequest::Connect { passphrase } => {
            if let Some(passphrase) = passphrase {
                client.set_passphrase(passphrase);
            }

            RemoteMessage::Connected(client.connect().await)
        }
        RemoteRequest::Containers => RemoteMessage::Containers(client.containers().await),
        RemoteRequest::NodeInfo => RemoteMessage::NodeInfo(client.node_info().await),
        RemoteRequest::Logs {
            container_id,
            options,
        } => {
            let result = client.logs(&container_id, &options).await;
            RemoteMessage::Logs {
                container_id,
                result,
            }
        }
        RemoteRequest::Disconnect => {
            if let Err(err) = client.disconnect().await {
                logger!(warn, "failed to disconnect: {}", err);
            }

            RemoteMessage::Disconnected
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    use crate::{
        kube::{mock::MockTestClusterClient, PodUsage},
        remote::mock::MockTestRemoteHost,
    };

    use super::*;

    #[tokio::test]
    async fn スケール要求はレプリカ数を渡す() {
        let mut client = MockTestClusterClient::new();
        client
            .expect_scale_deployment()
            .with(eq("default"), eq("web"), eq(3))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let task = Task::Cluster {
            client: ClusterHandle::new(client),
            request: ClusterRequest::Mutate {
                namespace: "default".to_string(),
                mutation: Mutation::ScaleDeployment {
                    name: "web".to_string(),
                    replicas: 3,
                },
            },
        };

        let Some(Message::Cluster(ClusterMessage::Mutated { mutation, result })) = task.run().await
        else {
            panic!("expected a mutation result");
        };

        assert_eq!(
            mutation,
            Mutation::ScaleDeployment {
                name: "web".to_string(),
                replicas: 3
            }
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn 取得エラーは結果メッセージとして返る() {
        let mut client = MockTestClusterClient::new();
        client
            .expect_pods()
            .returning(|_| Err(anyhow!("connection refused")));

        let task = Task::Cluster {
            client: ClusterHandle::new(client),
            request: ClusterRequest::Pods {
                namespace: "default".to_string(),
            },
        };

        let Some(Message::Cluster(ClusterMessage::Pods { namespace, result })) = task.run().await
        else {
            panic!("expected a pods result");
        };

        assert_eq!(namespace, "default");
        assert_eq!(result.unwrap_err().to_string(), "connection refused");
    }

    #[tokio::test]
    async fn メトリクスは要求した名前空間と一緒に返る() {
        let mut client = MockTestClusterClient::new();
        client
            .expect_pod_metrics()
            .with(eq("kube-system"))
            .returning(|_| {
                Ok([(
                    "coredns-5d".to_string(),
                    PodUsage {
                        cpu_millis: 3,
                        memory_bytes: 16 * 1024 * 1024,
                    },
                )]
                .into())
            });

        let task = Task::Cluster {
            client: ClusterHandle::new(client),
            request: ClusterRequest::Metrics {
                namespace: "kube-system".to_string(),
            },
        };

        let Some(Message::Cluster(ClusterMessage::Metrics { namespace, result })) =
            task.run().await
        else {
            panic!("expected a metrics result");
        };

        assert_eq!(namespace, "kube-system");
        assert_eq!(
            result.unwrap().get("coredns-5d").map(PodUsage::cpu),
            Some("3m".to_string())
        );
    }

    #[tokio::test]
    async fn 接続前にパスフレーズを設定する() {
        let mut seq = mockall::Sequence::new();

        let mut host = MockTestRemoteHost::new();
        host.expect_set_passphrase()
            .with(eq("secret".to_string()))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        host.expect_connect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let task = Task::Remote {
            client: RemoteHandle::new(host),
            request: RemoteRequest::Connect {
                passphrase: Some("secret".to_string()),
            },
        };

        let Some(Message::Remote(RemoteMessage::Connected(result))) = task.run().await else {
            panic!("expected a connection result");
        };

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn 切断エラーは握りつぶす() {
        let mut host = MockTestRemoteHost::new();
        host.expect_disconnect()
            .returning(|| Err(anyhow!("control socket missing")));

        let task = Task::Remote {
            client: RemoteHandle::new(host),
            request: RemoteRequest::Disconnect,
        };

        assert!(matches!(
            task.run().await,
            Some(Message::Remote(RemoteMessage::Disconnected))
        ));
    }

    #[tokio::test]
    async fn 終了タスクはメッセージを返さない() {
        assert!(Task::Quit.run().await.is_none());
    }
}
