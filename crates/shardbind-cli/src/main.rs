use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shardbind_binder::{SqlBindingEngine, StatementContext};
use shardbind_core::{Config, DatabaseType};
use shardbind_sql::Statement;

const DEFAULT_CONFIG_FILE: &str = "shardbind.toml";
const CONFIG_ENV: &str = "SHARDBIND_CONFIG";

/// shardbind - Dialect-aware SQL parsing and statement binding
#[derive(Parser)]
#[command(name = "shardbind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: $SHARDBIND_CONFIG, then shardbind.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a SQL statement and show what it references
    Parse {
        /// SQL text
        sql: String,

        /// Database type name (e.g. MySQL, SQLServer)
        #[arg(short = 't', long, conflicts_with = "url")]
        database_type: Option<String>,

        /// Connection URL used to resolve the database type
        #[arg(short, long)]
        url: Option<String>,

        /// Print the statement context as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a connection URL to its database type
    Resolve {
        /// Connection URL (e.g. jdbc:mysql://localhost:3306/demo)
        url: String,
    },

    /// List registered database types
    Types,

    /// Write a config file with the default settings
    Init {
        /// Output path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    init_tracing(&config, cli.verbose);
    tracing::debug!(
        default_database_type = %config.default_database_type,
        disabled_features = ?config.features.disabled,
        "Loaded configuration"
    );

    let engine = SqlBindingEngine::from_config(&config);

    match cli.command {
        Commands::Parse {
            sql,
            database_type,
            url,
            json,
        } => parse_command(&engine, &sql, database_type.as_deref(), url.as_deref(), json),
        Commands::Resolve { url } => resolve_command(&engine, &url),
        Commands::Types => types_command(&engine),
        Commands::Init { output, force } => init_command(&output, force),
    }
}

/// Load config from the flag, the environment, or the working directory
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        });

    match path {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            if verbose {
                eprintln!("{}", "No config file found, using defaults".yellow());
            }
            Ok(Config::default())
        }
    }
}

/// Log to stderr; config `log_level` wins over RUST_LOG
fn init_tracing(config: &Config, verbose: bool) {
    let filter = match &config.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" })),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Parse command - parse, bind and print a statement context
fn parse_command(
    engine: &SqlBindingEngine,
    sql: &str,
    database_type: Option<&str>,
    url: Option<&str>,
    json: bool,
) -> Result<()> {
    let database_type = match (database_type, url) {
        (Some(name), _) => engine.database_types().get_by_name(name)?,
        (None, Some(url)) => engine.resolve_database_type(url)?,
        (None, None) => engine.default_database_type()?,
    };

    let context = engine
        .parse_and_bind(database_type, sql)
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
    } else {
        print_context(&context);
    }

    Ok(())
}

fn print_context(context: &StatementContext) {
    println!(
        "{} {} ({})",
        "Statement:".cyan(),
        context.statement().kind().bold(),
        context.category()
    );
    println!("{} {}", "Database type:".cyan(), context.database_type());

    if context.tables().is_empty() {
        println!("{} {}", "Tables:".cyan(), "none".dimmed());
    } else {
        println!("{}", "Tables:".cyan());
        for table in context.tables() {
            println!("  - {}", table);
        }
    }

    if !context.aliases().is_empty() {
        println!("{}", "Aliases:".cyan());
        for (alias, table) in context.aliases() {
            println!("  - {} -> {}", alias, table);
        }
    }

    if !context.columns().is_empty() {
        println!("{}", "Columns:".cyan());
        for column in context.columns() {
            println!("  - {}", column);
        }
    }

    if let Statement::Update(update) = context.statement() {
        if let Some(hints) = update.with_table_hint_segment() {
            println!("{} {}", "Table hints:".cyan(), hints.hints.join(", "));
        }
        if let Some(hints) = update.option_hint_segment() {
            println!("{} {}", "Query hints:".cyan(), hints.hints.join(", "));
        }
    }
}

/// Resolve command - show the database type family for a URL
fn resolve_command(engine: &SqlBindingEngine, url: &str) -> Result<()> {
    let registry = engine.database_types();
    let database_type = engine
        .resolve_database_type(url)
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("{} {}", "Database type:".cyan(), database_type.name().green().bold());

    match registry.get_trunk(database_type) {
        Some(trunk) => println!("{} {}", "Trunk:".cyan(), trunk.name()),
        None => {
            let branches: Vec<&str> = registry
                .get_all_branch_types(database_type)
                .into_iter()
                .map(DatabaseType::name)
                .collect();
            if !branches.is_empty() {
                println!("{} {}", "Branches:".cyan(), branches.join(", "));
            }
        }
    }

    let schema = registry.get_default_schema_name(database_type, None);
    println!(
        "{} {}",
        "Default schema:".cyan(),
        schema.as_deref().unwrap_or("database name")
    );

    Ok(())
}

/// Types command - list every registered database type
fn types_command(engine: &SqlBindingEngine) -> Result<()> {
    for database_type in engine.database_types().types() {
        let prefixes = if database_type.url_prefixes().is_empty() {
            "-".dimmed().to_string()
        } else {
            database_type.url_prefixes().join(", ")
        };

        match database_type.trunk_name() {
            Some(trunk) => println!(
                "{} {} {}",
                database_type.name().bold(),
                format!("(branch of {})", trunk).dimmed(),
                prefixes
            ),
            None => println!("{} {}", database_type.name().bold(), prefixes),
        }
    }

    Ok(())
}

/// Init command - write the default config
fn init_command(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    Config::default()
        .save_to_file(output)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    println!("{} {}", "Wrote".green(), output.display());
    Ok(())
}
