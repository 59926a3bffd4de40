use std::io;
use std::io::Write;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use net_disk_cli::{
    commands::{
        auth_cmd::{self, AuthCommands},
        browse_cmd,
        config_cmd::{self, ConfigCommands},
        ls_cmd::{self, LsArgs},
        repos_cmd::{self, ReposCommands},
        upload_cmd::{self, UploadArgs},
    },
    errors::Error,
    session::GlobalOptions,
};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// net-disk: use your GitHub repositories as a network disk
#[derive(Parser)]
#[command(name = "net-disk")]
#[command(about = "Browse and upload files in your GitHub repositories", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// GitHub personal access token, overriding GITHUB_TOKEN and the keyring
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Auth(AuthCommands),

    #[command(subcommand)]
    Config(ConfigCommands),

    #[command(subcommand)]
    Repos(ReposCommands),

    /// List a folder of a repository
    Ls(LsArgs),

    /// Upload files and folders into a repository
    Upload(UploadArgs),

    /// Start an interactive browsing session
    Browse,

    /// Show the CLI version
    Version,
}

fn ask_user_for_value(request: &str) -> Result<String, Error> {
    print!("{}", request);

    io::stdout().flush().map_err(|_| Error::StdOutFlushFailed)?;

    let mut temp = String::new();
    io::stdin().read_line(&mut temp)?;
    Ok(temp.trim().to_string())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("NET_DISK_LOG"))
        .init();

    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config.clone(),
        token: cli.token.clone(),
    };

    let result = match &cli.command {
        Commands::Auth(cmd) => auth_cmd::execute(cmd, &options, &ask_user_for_value).await,
        Commands::Config(cmd) => config_cmd::execute(cmd, options.config.as_deref()).await,
        Commands::Repos(cmd) => repos_cmd::execute(cmd, &options).await,
        Commands::Ls(args) => ls_cmd::execute(args, &options).await,
        Commands::Upload(args) => upload_cmd::execute(args, &options, &ask_user_for_value).await,
        Commands::Browse => browse_cmd::execute(&options, &ask_user_for_value).await,
        Commands::Version => {
            // Print version info from baked-in value
            println!(
                "net-disk version {}",
                option_env!("NET_DISK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Error: {e}");
        eprintln!("Error: {e}");
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(error: &Error) -> i32 {
    match error {
        Error::InvalidArguments(_) => 2,
        _ => 1,
    }
}
