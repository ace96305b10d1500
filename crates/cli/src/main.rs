use anyhow::Context;
use clap::{Parser, Subcommand};

/// Command-line entrypoint for the bookshelf service
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = bookshelf_kernel::settings::Settings::load()
        .with_context(|| "failed to load bookshelf settings")?;

    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => bookshelf_app::run(settings).await,
        Command::Migrate => {
            let applied = bookshelf_app::migrate(&settings).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
            Ok(())
        }
    }
}
