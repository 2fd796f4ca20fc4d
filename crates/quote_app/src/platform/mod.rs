pub mod app;
pub mod config;
pub mod effects;
pub mod logging;
pub mod render;

use std::io;

use anyhow::{Context, Result};
use quote_client::ClientHandle;
use quote_logging::{level_from_verbosity, quote_info};

use crate::cli::{Cli, Command};
use app::App;
use config::AppConfig;
use effects::EffectRunner;

pub fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref(), |key| std::env::var(key).ok())
        .context("loading configuration")?
        .with_overrides(&cli.overrides());
    config.validate().context("checking configuration")?;

    logging::initialize(config.log_destination, level_from_verbosity(cli.verbose));
    quote_info!("api={} ws={}", config.api_url, config.ws_url);

    let live_enabled = matches!(
        cli.command,
        Command::Watch { .. } | Command::Submit { watch: true, .. }
    );
    let client = ClientHandle::new(config.client_settings()).context("starting client")?;
    let runner = EffectRunner::new(client, live_enabled);
    let mut app = App::new(runner, io::stdout().lock());
    app.execute(cli.command)
}
