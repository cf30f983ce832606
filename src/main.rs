mod api;
mod cache;
mod cli;
mod commands;
mod config;
mod error;
mod messages;
mod notify;
mod session;
mod views;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = cli::Args::parse();
  let _log_guard = init_tracing();

  let config = config::Config::load(args.config.as_deref())?;

  match args.command {
    cli::Command::Login { email } => commands::login(&config, email).await,
    cli::Command::Signup {
      name,
      email,
      role_id,
    } => commands::signup(&config, name, email, role_id).await,
    cli::Command::Logout => commands::logout(),
    command => {
      let app = commands::App::new(&config).await?;
      app.run(command).await
    }
  }
}

/// Log to a file under the platform data directory so stdout stays clean
/// for command output. Level comes from RUST_LOG, default warn.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()?.join("crmc");
  std::fs::create_dir_all(&log_dir).ok()?;
  let appender = tracing_appender::rolling::never(log_dir, "crmc.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .init();

  Some(guard)
}
