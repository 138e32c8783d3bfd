//! pomo - a terminal pomodoro timer
//!
//! Run several countdowns at once, keep a todo list next to them, and let
//! a todo complete itself when its timer runs out.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

use pomo::cli::{self, Cli, Commands, Display, TodoCommands};
use pomo::notification::{DesktopNotifier, Notifier, SilentNotifier};
use pomo::timer::{TimerEvent, TimerManager};
use pomo::todo::TodoManager;
use pomo::types::AppConfig;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so they never interleave with tables on stdout.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a command needs, wired from the configuration.
struct Services {
    config: AppConfig,
    todos: Arc<TodoManager>,
    timers: TimerManager,
    events: mpsc::UnboundedReceiver<TimerEvent>,
}

impl Services {
    fn build(cli: &Cli) -> Result<Self> {
        let mut config =
            AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
        if let Some(dir) = &cli.data_dir {
            config = config.with_data_dir(dir);
        }
        if cli.no_notify {
            config = config.without_notifications();
        }

        let data_dir = config.resolved_data_dir();
        tracing::debug!("Using data directory {}", data_dir.display());
        let todos = Arc::new(
            TodoManager::open(&data_dir)
                .with_context(|| format!("Failed to open todos in {}", data_dir.display()))?,
        );

        let notifier: Arc<dyn Notifier> = if config.notifications {
            Arc::new(DesktopNotifier::new())
        } else {
            Arc::new(SilentNotifier)
        };

        let (tx, events) = mpsc::unbounded_channel();
        let timers = TimerManager::new()
            .with_tick_interval(config.tick_interval())
            .with_default_title(config.default_title.clone())
            .with_todo_store(todos.clone())
            .with_notifier(notifier)
            .with_events(tx);

        Ok(Self {
            config,
            todos,
            timers,
            events,
        })
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    if let Some(Commands::Completions { shell }) = &cli.command {
        generate_completions(*shell);
        return Ok(());
    }

    let services = Services::build(&cli)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Start(args) => {
            let minutes = args
                .minutes
                .unwrap_or_else(|| i64::from(services.config.default_minutes));
            let title = args.title.unwrap_or_default();
            cli::run_single(services.timers, services.events, minutes, &title, None).await?;
        }
        Commands::Run => {
            cli::run_interactive(services.timers, services.todos, services.events).await?;
        }
        Commands::Todo(command) => execute_todo(command, services).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Executes a `todo` subcommand.
async fn execute_todo(command: TodoCommands, services: Services) -> Result<()> {
    let todos = &services.todos;
    match command {
        TodoCommands::Add(args) => {
            let todo = todos.add(&args.title, args.timer)?;
            match args.timer {
                Some(minutes) => {
                    Display::show_success(&format!(
                        "Todo '{}' created with {}m timer [ID: {}]",
                        todo.title,
                        minutes,
                        Display::short_id(&todo.id)
                    ));
                    if !args.no_start {
                        cli::run_single(
                            services.timers,
                            services.events,
                            i64::from(minutes),
                            &todo.title,
                            Some(todo.id.clone()),
                        )
                        .await?;
                    }
                }
                None => Display::show_success(&format!(
                    "Todo '{}' created [ID: {}]",
                    todo.title,
                    Display::short_id(&todo.id)
                )),
            }
        }
        TodoCommands::List { all } => {
            Display::show_todos(&todos.list_all(), all, &todos.count());
        }
        TodoCommands::Done { id } => {
            let todo = todos.complete(&id)?;
            Display::show_success(&format!("Todo '{}' marked as complete", todo.title));
        }
        TodoCommands::Delete { id } => {
            let todo = todos.delete(&id)?;
            Display::show_success(&format!("Todo '{}' deleted", todo.title));
        }
        TodoCommands::Clear => {
            let count = todos.clear_completed()?;
            Display::show_success(&format!("Cleared {} completed todo(s)", count));
        }
    }
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
