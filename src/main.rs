//! Dayloop CLI entry point.

use clap::Parser;

use dayloop::cli::context::AppContext;
use dayloop::cli::{commands, handle_error, Cli, Commands};

#[tokio::main]
async fn main() {
    let Cli {
        command,
        json,
        config,
    } = Cli::parse();

    let result = async {
        let ctx = AppContext::bootstrap(config.as_deref()).await?;
        match command {
            Commands::Serve(args) => commands::serve::execute(args, &ctx).await,
            Commands::Progress(args) => commands::progress::execute(args, &ctx, json).await,
            Commands::Sweep => commands::sweep::execute(&ctx, json).await,
        }
    }
    .await;

    if let Err(err) = result {
        handle_error(&err, json);
    }
}
