use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "lanes")]
#[command(version, about = "Collaborative project board client")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL, e.g. http://localhost:5000 (overrides config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Path to the config file. Defaults to the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the auth token locally
    Login {
        username: String,
    },
    /// Forget the stored auth token
    Logout,
    /// List your projects
    Projects,
    /// Print a project's board
    Board {
        project: i64,
        /// Free-text card search
        #[arg(short, long)]
        query: Option<String>,
        /// Filter by status: all, completed, pending
        #[arg(long, default_value = "all")]
        status: String,
        /// Search attachment contents too
        #[arg(long)]
        include_attachments: bool,
    },
    /// Create a card
    Add {
        project: i64,
        title: String,
        /// Destination column; defaults to the first column
        #[arg(short, long)]
        column: Option<String>,
    },
    /// Move a card into a column at an index
    Move {
        project: i64,
        card: i64,
        column: String,
        #[arg(default_value_t = 0)]
        index: usize,
    },
    /// Toggle a card's completion flag
    Done {
        project: i64,
        card: i64,
    },
    /// Delete a card (asks for confirmation)
    Delete {
        project: i64,
        card: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Manage a project's columns
    Columns {
        project: i64,
        #[command(subcommand)]
        command: ColumnCommands,
    },
    /// Join a project's chat: stream messages and typing notices
    Watch {
        project: i64,
    },
}

#[derive(Subcommand)]
pub enum ColumnCommands {
    /// Show the committed column list
    List,
    /// Append a new column
    Add { name: String },
    /// Delete an empty column
    Delete {
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Rename a column, migrating its cards
    Rename { old: String, new: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "lanes=debug" } else { "lanes=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = lanes::config::ClientConfig::load(cli.config.as_deref())?
        .with_server(cli.server.as_deref());

    match &cli.command {
        Commands::Login { username } => cmd::cmd_login(&config, username).await?,
        Commands::Logout => cmd::cmd_logout()?,
        Commands::Projects => cmd::cmd_projects(&config).await?,
        Commands::Board {
            project,
            query,
            status,
            include_attachments,
        } => {
            cmd::cmd_board(
                &config,
                *project,
                query.as_deref(),
                status,
                *include_attachments,
            )
            .await?
        }
        Commands::Add {
            project,
            title,
            column,
        } => cmd::cmd_add(&config, *project, title, column.as_deref()).await?,
        Commands::Move {
            project,
            card,
            column,
            index,
        } => cmd::cmd_move(&config, *project, *card, column, *index).await?,
        Commands::Done { project, card } => cmd::cmd_done(&config, *project, *card).await?,
        Commands::Delete { project, card, yes } => {
            cmd::cmd_delete(&config, *project, *card, *yes).await?
        }
        Commands::Columns { project, command } => {
            cmd::cmd_columns(&config, *project, command).await?
        }
        Commands::Watch { project } => cmd::cmd_watch(&config, *project).await?,
    }

    Ok(())
}
