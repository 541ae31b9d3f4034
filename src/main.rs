use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info_span;

use cognito_backup::cli::{
    handle_cloud_command, handle_config_command, handle_list_command, read_event, CloudCommands,
};
use cognito_backup::cloud::LocalCloud;
use cognito_backup::config::{CloudPaths, Environment};
use cognito_backup::handler::Handler;
use cognito_backup::logging::{self, LogOptions};

#[derive(Parser)]
#[command(
    name = "cognito-backup",
    version,
    about = "Encrypted backups of a user directory pool",
    long_about = "cognito-backup lists the users and groups of a user pool, encrypts \
                  them with a key service and stores them in an object store bucket, \
                  optionally deleting backups older than a rotation limit."
)]
struct Cli {
    /// Log output format (TEXT or JSON)
    #[arg(long, global = true, env = "FORMATTER_TYPE", default_value = "TEXT")]
    log_format: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "debug")]
    log_level: String,

    /// Root directory of the local service backends
    #[arg(long, global = true, env = "LOCAL_CLOUD_ROOT")]
    cloud_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backup invocation
    Run {
        /// Invocation event JSON file (`-` for stdin)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },

    /// Show the resolved configuration
    Config {
        #[arg(short, long)]
        event: Option<PathBuf>,
    },

    /// List the objects in the backup bucket
    List {
        #[arg(short, long)]
        event: Option<PathBuf>,
    },

    /// Local service backend management
    #[command(subcommand)]
    Cloud(CloudCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogOptions::from_names(&cli.log_format, &cli.log_level))?;

    let env = Environment::from_process();
    let paths = CloudPaths::resolve(cli.cloud_root, &env)?;
    let cloud = LocalCloud::new(paths);

    match cli.command {
        Commands::Run { event } => {
            let event = read_event(event.as_deref())?;
            let handler = Handler::new(env, cloud, info_span!("invocation"));
            match handler.handle(event.as_ref()) {
                Ok(response) => println!("{}", serde_json::to_string(&response)?),
                Err(failure) => {
                    println!("{}", serde_json::to_string(&failure.response())?);
                    return Err(failure.into());
                }
            }
        }
        Commands::Config { event } => {
            let event = read_event(event.as_deref())?;
            let handler = Handler::new(env, cloud, info_span!("config"));
            handle_config_command(&handler, event.as_ref())?;
        }
        Commands::List { event } => {
            let event = read_event(event.as_deref())?;
            let handler = Handler::new(env, cloud.clone(), info_span!("list"));
            handle_list_command(&handler, &cloud, event.as_ref())?;
        }
        Commands::Cloud(cmd) => {
            handle_cloud_command(&cloud, cmd)?;
        }
    }

    Ok(())
}
