use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Default)]
pub enum ConfigLoadOption {
    #[default]
    Default,

    Path(PathBuf),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{kind} entry has an empty name")]
    EmptyName { kind: &'static str },

    #[error("{kind} name {name:?} is defined more than once")]
    DuplicateName { kind: &'static str, name: String },
}

/// Named kubeconfig entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub context: Option<String>,
}

/// Named remote host reachable over ssh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostEntry {
    pub name: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    #[serde(default)]
    pub sudo: bool,
}

impl HostEntry {
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Lines retained by each log viewer
    pub max_lines: usize,
    pub directory: Option<PathBuf>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_lines: 10_000,
            directory: None,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub clusters: Vec<ClusterEntry>,
    pub hosts: Vec<HostEntry>,
    pub refresh_interval_secs: u64,
    pub log_tail_lines: i64,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clusters: Vec::new(),
            hosts: Vec::new(),
            refresh_interval_secs: 5,
            log_tail_lines: 100,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(option: ConfigLoadOption) -> Result<Self> {
        let figment = Figment::new();

        let config: Self = match option {
            ConfigLoadOption::Default => figment.merge(Serialized::defaults(Self::default())),
            ConfigLoadOption::Path(path) => figment
                .merge(Serialized::defaults(Self::default()))
                .merge(Yaml::file(path)),
        }
        .merge(Env::prefixed("KUBENAV_").split("__"))
        .extract_lossy()?;

        let config = config.normalize();

        config.validate()?;

        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    fn normalize(mut self) -> Self {
        for cluster in &mut self.clusters {
            cluster.path = expand_tilde(&cluster.path);
        }

        for host in &mut self.hosts {
            host.identity_file = host.identity_file.as_deref().map(expand_tilde);
        }

        self.logging.directory = self.logging.directory.as_deref().map(expand_tilde);

        if self.clusters.is_empty() {
            if let Some(path) = default_kubeconfig() {
                self.clusters.push(ClusterEntry {
                    name: "default".to_string(),
                    path,
                    context: None,
                });
            }
        }

        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_names("cluster", self.clusters.iter().map(|c| c.name.as_str()))?;
        validate_names("host", self.hosts.iter().map(|h| h.name.as_str()))?;

        Ok(())
    }
}

fn validate_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName { kind });
        }

        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }

    Ok(())
}

fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// `$KUBECONFIG` (first entry) or `~/.kube/config`, when the file exists.
fn default_kubeconfig() -> Option<PathBuf> {
    let path = match std::env::var_os("KUBECONFIG") {
        Some(value) => std::env::split_paths(&value).next()?,
        None => dirs::home_dir()?.join(".kube").join("config"),
    };

    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn 設定ファイルのクラスタとホストを読み込む() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                indoc! {r#"
                    clusters:
                      - name: prod
                        path: /etc/kube/prod.yaml
                        context: admin@prod
                    hosts:
                      - name: node-1
                        host: 10.0.0.11
                        user: core
                        sudo: true
                    refresh_interval_secs: 10
                    logging:
                      max_lines: 500
                "#},
            )?;

            let config = Config::load(ConfigLoadOption::Path("config.yaml".into())).unwrap();

            assert_eq!(
                config.clusters,
                vec![ClusterEntry {
                    name: "prod".to_string(),
                    path: PathBuf::from("/etc/kube/prod.yaml"),
                    context: Some("admin@prod".to_string()),
                }]
            );
            assert_eq!(
                config.hosts,
                vec![HostEntry {
                    name: "node-1".to_string(),
                    host: "10.0.0.11".to_string(),
                    port: 22,
                    user: Some("core".to_string()),
                    identity_file: None,
                    sudo: true,
                }]
            );
            assert_eq!(config.refresh_interval(), Duration::from_secs(10));
            assert_eq!(config.log_tail_lines, 100);
            assert_eq!(config.logging.max_lines, 500);
            assert_eq!(config.logging.level, "info");

            Ok(())
        });
    }

    #[test]
    fn 環境変数で上書きできる() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                indoc! {r#"
                    clusters:
                      - name: dev
                        path: /etc/kube/dev.yaml
                "#},
            )?;
            jail.set_env("KUBENAV_LOG_TAIL_LINES", "20");
            jail.set_env("KUBENAV_LOGGING__LEVEL", "debug");

            let config = Config::load(ConfigLoadOption::Path("config.yaml".into())).unwrap();

            assert_eq!(config.log_tail_lines, 20);
            assert_eq!(config.logging.level, "debug");

            Ok(())
        });
    }

    #[test]
    fn クラスタ未設定のときkubeconfig環境変数からエントリを作る() {
        Jail::expect_with(|jail| {
            jail.create_file("kubeconfig.yaml", "apiVersion: v1")?;
            jail.set_env("KUBECONFIG", "kubeconfig.yaml");

            let config = Config::load(ConfigLoadOption::Default).unwrap();

            assert_eq!(
                config.clusters,
                vec![ClusterEntry {
                    name: "default".to_string(),
                    path: PathBuf::from("kubeconfig.yaml"),
                    context: None,
                }]
            );

            Ok(())
        });
    }

    #[test]
    fn 名前が重複しているとエラーを返す() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                indoc! {r#"
                    hosts:
                      - name: node
                        host: a
                      - name: node
                        host: b
                "#},
            )?;

            let err = Config::load(ConfigLoadOption::Path("config.yaml".into())).unwrap_err();

            assert_eq!(
                err.downcast_ref::<ConfigError>(),
                Some(&ConfigError::DuplicateName {
                    kind: "host",
                    name: "node".to_string()
                })
            );

            Ok(())
        });
    }

    #[test]
    fn チルダをホームディレクトリに展開する() {
        let Some(home) = dirs::home_dir() else {
            return;
        };

        assert_eq!(
            expand_tilde(Path::new("~/.kube/config")),
            home.join(".kube/config")
        );
        assert_eq!(
            expand_tilde(Path::new("/etc/kube")),
            PathBuf::from("/etc/kube")
        );
    }
}
