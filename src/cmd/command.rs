use std::{path::PathBuf, str::FromStr};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::config::{ConfigLoadOption, LoggingConfig};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Command {
    /// Config file path
    #[arg(short = 'c', long, display_order = 1000)]
    pub config_file: Option<PathBuf>,

    /// Logging
    #[arg(short = 'l', long, display_order = 1000)]
    pub logging: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(
        long,
        value_name = "LEVEL",
        value_parser = parse_log_level,
        requires = "logging",
        display_order = 1000
    )]
    pub log_level: Option<LevelFilter>,
}

impl Command {
    pub fn init() -> Self {
        Self::parse()
    }

    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();

        if let Some(level) = self.log_level {
            config.level = level.to_string().to_lowercase();
        }

        config
    }

    pub fn config_load_option(&self) -> Result<ConfigLoadOption> {
        let option = if let Some(path) = &self.config_file {
            match path.try_exists() {
                Ok(true) => ConfigLoadOption::Path(path.clone()),
                Ok(false) => {
                    eprintln!("Config file not found: {:?}", path);

                    ConfigLoadOption::Default
                }
                Err(err) => {
                    eprintln!("Failed to check config file exists: {}", err);

                    ConfigLoadOption::Default
                }
            }
        } else {
            let Some(path) = xdg_config_home().map(|dir| dir.join("config.yaml")) else {
                return Ok(ConfigLoadOption::Default);
            };

            match path.try_exists() {
                Ok(true) => ConfigLoadOption::Path(path),
                Ok(false) => ConfigLoadOption::Default,
                Err(err) => {
                    eprintln!("Failed to check config file exists: {}", err);

                    ConfigLoadOption::Default
                }
            }
        };

        Ok(option)
    }
}

fn parse_log_level(value: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(value).map_err(|_| format!("invalid log level: {}", value))
}

fn xdg_config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(path) => Some(PathBuf::from(path).join("kubenav")),
        None => dirs::home_dir().map(|home| home.join(".config").join("kubenav")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod logging {
        use clap::error::ErrorKind;
        use pretty_assertions::assert_eq;
        use rstest::rstest;

        use super::*;

        #[test]
        fn デフォルトではロギングが無効() {
            let cmd = Command::try_parse_from(["kubenav"]).unwrap();

            assert_eq!(cmd.logging, false);
            assert_eq!(cmd.log_level, None);
        }

        #[rstest]
        #[case::short(&["kubenav", "-l"])]
        #[case::long(&["kubenav", "--logging"])]
        fn フラグを指定するとロギングが有効になる(#[case] args: &[&str]) {
            let cmd = Command::try_parse_from(args).unwrap();

            assert_eq!(cmd.logging, true);
        }

        #[test]
        fn ログレベルを指定できる() {
            let cmd = Command::try_parse_from(["kubenav", "-l", "--log-level", "debug"]).unwrap();

            assert_eq!(cmd.log_level, Some(LevelFilter::Debug));
            assert_eq!(
                cmd.logging_config(&LoggingConfig::default()).level,
                "debug"
            );
        }

        #[test]
        fn ロギング無しでログレベルを指定するとエラーを返す() {
            let cmd = Command::try_parse_from(["kubenav", "--log-level", "debug"]);

            assert_eq!(cmd.unwrap_err().kind(), ErrorKind::MissingRequiredArgument)
        }

        #[test]
        fn 不正なログレベルはエラーを返す() {
            let cmd = Command::try_parse_from(["kubenav", "-l", "--log-level", "loud"]);

            assert_eq!(cmd.unwrap_err().kind(), ErrorKind::ValueValidation)
        }
    }

    mod config_file {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn 設定ファイルのパスを指定できる() {
            let cmd = Command::try_parse_from(["kubenav", "-c", "/tmp/kubenav.yaml"]).unwrap();

            assert_eq!(cmd.config_file, Some(PathBuf::from("/tmp/kubenav.yaml")));
        }

        #[test]
        fn 存在しない設定ファイルはデフォルト扱いになる() {
            let cmd =
                Command::try_parse_from(["kubenav", "-c", "/nonexistent/kubenav.yaml"]).unwrap();

            assert!(matches!(
                cmd.config_load_option().unwrap(),
                ConfigLoadOption::Default
            ));
        }
    }
}
