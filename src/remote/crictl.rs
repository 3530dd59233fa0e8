use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    features::list::ListItem,
    kube::{format_age, LogOptions},
};

use super::RemoteError;

const POD_NAME_LABEL: &str = "io.kubernetes.pod.name";
const POD_NAMESPACE_LABEL: &str = "io.kubernetes.pod.namespace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
pub enum ContainerState {
    #[serde(rename = "CONTAINER_RUNNING")]
    Running,

    #[serde(rename = "CONTAINER_EXITED")]
    Exited,

    #[serde(rename = "CONTAINER_CREATED")]
    Created,

    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub attempt: u32,
    pub age: String,
    pub pod: Option<String>,
    pub namespace: Option<String>,
}

impl RemoteContainer {
    /// Abbreviated id as printed by `crictl ps`.
    pub fn short_id(&self) -> &str {
        self.id.get(..13).unwrap_or(&self.id)
    }
}

impl ListItem for RemoteContainer {
    fn key(&self) -> &str {
        &self.id
    }

    fn filter_value(&self) -> String {
        match &self.pod {
            Some(pod) => format!("{} {}", self.name, pod),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeInfo {
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub memory: String,
    pub load: String,
    pub uptime: String,
    pub runtime: String,
}

impl NodeInfo {
    pub fn rows(&self) -> [(&'static str, &str); 7] {
        [
            ("Hostname", &self.hostname),
            ("OS", &self.os),
            ("Kernel", &self.kernel),
            ("Memory", &self.memory),
            ("Load", &self.load),
            ("Uptime", &self.uptime),
            ("Runtime", &self.runtime),
        ]
    }
}

#[derive(Deserialize)]
struct PsOutput {
    #[serde(default)]
    containers: Vec<PsContainer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PsContainer {
    id: String,
    metadata: PsMetadata,
    image: PsImage,
    state: ContainerState,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct PsMetadata {
    name: String,
    #[serde(default)]
    attempt: u32,
}

#[derive(Deserialize)]
struct PsImage {
    image: String,
}

/// Parses `crictl ps -a -o json`.
pub fn parse_containers(json: &str, now: DateTime<Utc>) -> Result<Vec<RemoteContainer>> {
    let output: PsOutput = serde_json::from_str(json)?;

    Ok(output
        .containers
        .into_iter()
        .map(|mut container| {
            let created = container
                .created_at
                .parse::<i64>()
                .ok()
                .map(DateTime::from_timestamp_nanos);

            RemoteContainer {
                id: container.id,
                name: container.metadata.name,
                image: container.image.image,
                state: container.state,
                attempt: container.metadata.attempt,
                age: format_age(created, now),
                pod: container.labels.remove(POD_NAME_LABEL),
                namespace: container.labels.remove(POD_NAMESPACE_LABEL),
            }
        })
        .collect())
}

/// Shell snippet printing `key=value` lines understood by [`parse_node_info`].
pub fn node_info_script(crictl: &str) -> String {
    [
        "echo hostname=$(hostname)".to_string(),
        "echo os=$( . /etc/os-release 2>/dev/null; echo \"$PRETTY_NAME\")".to_string(),
        "echo kernel=$(uname -r)".to_string(),
        "echo memory=$(free -h | awk '/^Mem:/ {print $3\"/\"$2}')".to_string(),
        "echo load=$(cut -d' ' -f1-3 /proc/loadavg)".to_string(),
        "echo uptime=$(uptime -p)".to_string(),
        format!(
            "echo runtime=$({} version 2>/dev/null | awk '/^RuntimeName|^RuntimeVersion/ {{print $2}}' | paste -sd' ')",
            crictl
        ),
    ]
    .join("; ")
}

pub fn parse_node_info(output: &str) -> NodeInfo {
    let mut info = NodeInfo::default();

    for (key, value) in output.lines().filter_map(|line| line.split_once('=')) {
        let value = value.trim().to_string();

        match key.trim() {
            "hostname" => info.hostname = value,
            "os" => info.os = value,
            "kernel" => info.kernel = value,
            "memory" => info.memory = value,
            "load" => info.load = value,
            "uptime" => info.uptime = value,
            "runtime" => info.runtime = value,
            _ => {}
        }
    }

    info
}

/// Container ids are interpolated into a remote shell command line.
pub fn validate_container_id(id: &str) -> Result<(), RemoteError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(RemoteError::InvalidContainerId(id.to_string()))
    }
}

pub fn logs_command(crictl: &str, container_id: &str, options: &LogOptions, follow: bool) -> String {
    let mut command = vec![crictl.to_string(), "logs".to_string()];

    if follow {
        command.push("-f".to_string());
    }

    if let Some(tail) = options.tail_lines {
        command.push(format!("--tail={}", tail));
    }

    if options.timestamps {
        command.push("--timestamps".to_string());
    }

    command.push(container_id.to_string());
    command.push("2>&1".to_string());

    command.join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn crictl_psの出力をパースする() {
        let json = indoc! {r#"
            {
              "containers": [
                {
                  "id": "3f2a9c0d1b7e44aa9f0e",
                  "podSandboxId": "a1b2",
                  "metadata": {"name": "nginx", "attempt": 2},
                  "image": {"image": "docker.io/library/nginx:1.25"},
                  "imageRef": "sha256:abc",
                  "state": "CONTAINER_RUNNING",
                  "createdAt": "1714561200000000000",
                  "labels": {
                    "io.kubernetes.pod.name": "web-7",
                    "io.kubernetes.pod.namespace": "default"
                  },
                  "annotations": {}
                },
                {
                  "id": "9e8d7c",
                  "metadata": {"name": "init"},
                  "image": {"image": "busybox"},
                  "state": "CONTAINER_UNKNOWN",
                  "createdAt": "",
                  "labels": {}
                }
              ]
            }
        "#};

        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let containers = parse_containers(json, now).unwrap();

        assert_eq!(
            containers,
            vec![
                RemoteContainer {
                    id: "3f2a9c0d1b7e44aa9f0e".to_string(),
                    name: "nginx".to_string(),
                    image: "docker.io/library/nginx:1.25".to_string(),
                    state: ContainerState::Running,
                    attempt: 2,
                    age: "1h".to_string(),
                    pod: Some("web-7".to_string()),
                    namespace: Some("default".to_string()),
                },
                RemoteContainer {
                    id: "9e8d7c".to_string(),
                    name: "init".to_string(),
                    image: "busybox".to_string(),
                    state: ContainerState::Unknown,
                    attempt: 0,
                    age: "<unknown>".to_string(),
                    pod: None,
                    namespace: None,
                },
            ]
        );
        assert_eq!(containers[0].short_id(), "3f2a9c0d1b7e4");
        assert_eq!(containers[1].short_id(), "9e8d7c");
    }

    #[test]
    fn ノード情報をパースする() {
        let output = indoc! {"
            hostname=node-1
            os=Ubuntu 22.04.4 LTS
            kernel=5.15.0-105-generic
            memory=3.1Gi/15Gi
            load=0.12 0.08 0.01
            uptime=up 3 days, 2 hours
            runtime=containerd v1.7.2
            garbage
        "};

        assert_eq!(
            parse_node_info(output),
            NodeInfo {
                hostname: "node-1".to_string(),
                os: "Ubuntu 22.04.4 LTS".to_string(),
                kernel: "5.15.0-105-generic".to_string(),
                memory: "3.1Gi/15Gi".to_string(),
                load: "0.12 0.08 0.01".to_string(),
                uptime: "up 3 days, 2 hours".to_string(),
                runtime: "containerd v1.7.2".to_string(),
            }
        );
    }

    #[rstest]
    #[case("3f2a9c", true)]
    #[case("", false)]
    #[case("abc; rm -rf /", false)]
    #[case("abc$(id)", false)]
    fn コンテナidを検証する(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(validate_container_id(id).is_ok(), valid);
    }

    #[test]
    fn ログコマンドを組み立てる() {
        let options = LogOptions {
            tail_lines: Some(100),
            timestamps: true,
        };

        assert_eq!(
            logs_command("sudo -n crictl", "3f2a9c", &options, true),
            "sudo -n crictl logs -f --tail=100 --timestamps 3f2a9c 2>&1"
        );
        assert_eq!(
            logs_command("crictl", "3f2a9c", &LogOptions::default(), false),
            "crictl logs 3f2a9c 2>&1"
        );
    }
}
