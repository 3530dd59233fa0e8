use anyhow::Result;

use kubenav::{
    app::App, cmd::Command, config::Config, logging::Logger, remote::askpass_reply,
    signal::set_signal_handler,
};

fn main() -> Result<()> {
    // started by ssh as SSH_ASKPASS
    if let Some(secret) = askpass_reply() {
        println!("{}", secret);
        return Ok(());
    }

    let command = Command::init();

    let config = Config::load(command.config_load_option()?)?;

    let logger = if command.logging {
        Logger::init(&command.logging_config(&config.logging))?
    } else {
        Logger::disabled()
    };

    set_signal_handler()?;

    let result = App::run(config, &logger);

    logger.close();

    result
}
