use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// mcpkg - Build and dependency tool for Minecraft server plugins
#[derive(Parser)]
#[command(name = "mcpkg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// When to use colored output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Path to the project file (defaults to ./mcpkg.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new plugin project in the current directory
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// Fully-qualified main class (e.g., com.example.MyPlugin)
        #[arg(long)]
        main: Option<String>,

        /// Initial project version
        #[arg(long = "version", default_value = "1.0.0")]
        project_version: String,

        /// Short description for plugin.yml
        #[arg(long, default_value = "")]
        description: String,

        /// Plugin author (repeatable)
        #[arg(long = "author")]
        authors: Vec<String>,

        /// Target platform (paper, spigot, bukkit)
        #[arg(long, default_value = "paper")]
        platform: String,

        /// Target game version (defaults to the newest platform API)
        #[arg(long)]
        game_version: Option<String>,
    },

    /// Compile and package the plugin into dist/
    Build,

    /// Install all dependencies, or add one
    Install {
        /// Package (e.g., luckperms@5.4.102, maven:group:artifact@1.0, ./libs/Vault.jar)
        package: Option<String>,

        /// Re-download artifacts and ignore game version checks
        #[arg(short, long)]
        force: bool,

        /// Allow beta and alpha versions
        #[arg(long)]
        beta: bool,
    },

    /// Remove a dependency
    Remove {
        /// Dependency key
        name: String,
    },

    /// Show registry details for a plugin
    Info {
        /// Plugin slug with optional version (e.g., luckperms@5.4.102)
        package: String,
    },

    /// Search the registry for plugins
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        limit: u32,

        /// Number of results to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: u8, color: ColorChoice) {
    let default = match verbose {
        0 => "warn",
        1 => "mcpkg=debug",
        _ => "mcpkg=trace",
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("MCPKG_LOG").unwrap_or_else(|_| default.into()),
    );
    let ansi = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(ansi)
                .with_target(false)
                .without_time(),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.color);

    let project_file = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init {
            name,
            main,
            project_version,
            description,
            authors,
            platform,
            game_version,
        } => commands::init::run(
            project_file,
            mcpkg::InitOptions {
                name,
                main,
                version: project_version,
                description,
                authors,
                platform,
                game_version,
            },
        ),
        Commands::Build => commands::build::run(project_file),
        Commands::Install {
            package,
            force,
            beta,
        } => commands::install::run(project_file, package, force, beta),
        Commands::Remove { name } => commands::remove::run(project_file, &name),
        Commands::Info { package } => commands::info::run(project_file, &package),
        Commands::Search {
            query,
            limit,
            offset,
        } => commands::search::run(&query, limit, offset),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "mcpkg", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if cli.verbose > 0 {
            eprintln!("Error: {:?}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}
