//! sqltag: run SQL templates from the command line
//!
//! # Usage
//!
//! ```bash
//! # Execute a query
//! sqltag "SELECT * FROM users WHERE active = {}" --bind true
//!
//! # Dry run (show SQL only)
//! sqltag "SELECT * FROM users WHERE id = {} AND name = {}" --bind 42,bob --dry-run
//!
//! # Stream rows through a cursor
//! sqltag "SELECT * FROM events" --cursor --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqltag::parser::{parse_binding, parse_fragments};
use sqltag::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqltag")]
#[command(version)]
#[command(about = "Compile and run parameterized SQL templates", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqltag 'SELECT * FROM users WHERE active = {}' --bind true
    sqltag 'SELECT * FROM orders WHERE user_id = {} LIMIT {}' --bind 42,10
    sqltag 'UPDATE users SET verified = {} WHERE id = {}' --bind true,7 --dry-run")]
struct Cli {
    /// The SQL template to execute ({} marks a slot, {{ and }} are literal braces)
    template: Option<String>,

    /// Don't execute, just show the compiled SQL
    #[arg(short, long)]
    dry_run: bool,

    /// Values for the template slots, in order
    #[arg(short, long, value_delimiter = ',')]
    bind: Vec<String>,

    /// Stream rows through a cursor instead of fetching them all at once
    #[arg(long)]
    cursor: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Database connection URL
    #[arg(long, env = "SQLTAG_DATABASE_URL")]
    database_url: Option<String>,

    /// SQL dialect (defaults to the one implied by the URL)
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Config file (defaults to ./sqltag.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a template splits into fragments and compiles
    Explain {
        /// The SQL template to explain
        template: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Explain { template }) => explain_template(template, &cli),
        None => match &cli.template {
            Some(template) => execute_template(template, &cli).await,
            None => {
                println!("{}", "sqltag: lazy SQL templates".cyan().bold());
                println!();
                println!("Usage: sqltag <TEMPLATE> [OPTIONS]");
                println!();
                println!("Try: sqltag --help");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sqltag=debug" } else { "sqltag=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file merged with command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    let mut builder = sqltag::config::ConfigBuilder::from_config(config);
    if let Some(url) = &cli.database_url {
        builder = builder.database_url(url);
    }
    if let Some(dialect) = cli.dialect {
        builder = builder.dialect(dialect);
    }
    Ok(builder.build())
}

fn build_template(text: &str, bindings: &[String]) -> Result<Template<SqlxDriver>> {
    let values = bindings.iter().map(|b| parse_binding(b));
    Template::parse(text, values).context("invalid template")
}

async fn execute_template(text: &str, cli: &Cli) -> Result<()> {
    if cli.verbose {
        println!("{} {}", "Input:".dimmed(), text.yellow());
    }

    let config = load_config(cli)?;
    let dialect = config.dialect()?;
    let template = build_template(text, &cli.bind)?;

    // Dry run or no database URL - just show SQL
    if cli.dry_run || config.database.url.is_none() {
        let tag = SqlTag::new(SqlxDriver::offline(dialect));
        print_compiled(&tag.compile(template));

        if config.database.url.is_none() && !cli.dry_run {
            println!();
            println!(
                "{}",
                "⚠ No database URL. Use --database-url or set SQLTAG_DATABASE_URL".yellow()
            );
        }
        return Ok(());
    }

    if cli.verbose {
        if let Some(url) = &config.database.url {
            println!("{} {}", "Connecting to:".dimmed(), url);
        }
    }

    let driver = SqlxDriver::connect_with(&config)
        .await
        .context("failed to connect")?;
    let tag = SqlTag::builder(driver)
        .on_after_query(|event| {
            tracing::info!(
                target: "sqltag",
                rows = event.rows.len(),
                rows_affected = event.info.rows_affected,
                elapsed_ms = event.elapsed.as_millis() as u64,
                "done"
            );
        })
        .build();
    let query = tag.query(template);

    if cli.cursor {
        stream_output(query.cursor_with(config.cursor_options()), &cli.format).await?;
        return Ok(());
    }

    let result = query.fetch().await?;
    if result.is_empty() && result.info().rows_affected > 0 {
        println!("{} {} rows affected", "✓".green(), result.info().rows_affected);
    } else {
        format_output(result.rows(), &cli.format);
    }

    Ok(())
}

fn print_compiled(compiled: &CompiledQuery) {
    println!("{}", "Compiled SQL:".green().bold());
    println!("{}", compiled.sql.white());

    if !compiled.params.is_empty() {
        println!();
        println!("{}", "Params:".cyan());
        for (i, param) in compiled.params.iter().enumerate() {
            println!("  [{}] {} {}", i, param.to_string().yellow(), param.type_name().dimmed());
        }
    }
}

fn format_output(results: &[SqlxRow], format: &OutputFormat) {
    if results.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results).unwrap_or_default());
        }
        OutputFormat::Table => {
            // Get column names from first row
            let columns: Vec<&String> = results[0].keys().collect();

            // Calculate column widths
            let mut widths: HashMap<&String, usize> =
                columns.iter().map(|c| (*c, c.chars().count())).collect();
            for row in results {
                for (col, val) in row {
                    let len = val_to_string(val).chars().count();
                    if let Some(w) = widths.get_mut(col) {
                        *w = (*w).max(len);
                    }
                }
            }

            // Print header
            let header: Vec<String> = columns
                .iter()
                .map(|c| format!("{:width$}", c, width = widths[*c]))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            // Print separator
            let sep: Vec<String> = columns.iter().map(|c| "─".repeat(widths[*c])).collect();
            println!("{}", sep.join("─┼─").dimmed());

            // Print rows
            for row in results {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        let val = row.get(*c).map(val_to_string).unwrap_or_default();
                        format!("{:width$}", val, width = widths[*c])
                    })
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", results.len().to_string().cyan());
        }
    }
}

/// Print rows as they arrive. Widths are unknown up front, so table mode
/// prints one unpadded line per row.
async fn stream_output(mut cursor: Cursor<SqlxDriver>, format: &OutputFormat) -> Result<()> {
    let mut header_printed = false;

    while let Some(row) = cursor.next().await {
        let row = row?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&row)?),
            OutputFormat::Table => {
                if !header_printed {
                    let header: Vec<&str> = row.keys().map(String::as_str).collect();
                    println!("{}", header.join(" │ ").white().bold());
                    header_printed = true;
                }
                let cells: Vec<String> = row.values().map(val_to_string).collect();
                println!("{}", cells.join(" │ "));
            }
        }
    }

    if matches!(format, OutputFormat::Table) {
        println!();
        println!("{} row(s) streamed", cursor.rows_yielded().to_string().cyan());
    }
    Ok(())
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

fn explain_template(text: &str, cli: &Cli) -> Result<()> {
    println!("{}", "sqltag Template Explanation".cyan().bold());
    println!();
    println!("{} {}", "Template:".dimmed(), text.yellow());
    println!();

    let fragments = parse_fragments(text).context("invalid template")?;
    println!("{}", "Parsed Structure:".green().bold());
    for (i, fragment) in fragments.iter().enumerate() {
        println!("  {} {:?}", format!("fragment {}:", i).dimmed(), fragment);
        if i + 1 < fragments.len() {
            let bound = cli
                .bind
                .get(i)
                .map(|b| parse_binding(b).to_string())
                .unwrap_or_else(|| "(unbound)".to_string());
            println!("  {} {}", format!("slot {}:", i).dimmed(), bound.cyan());
        }
    }
    println!();

    let slots = fragments.len() - 1;
    if cli.bind.len() != slots {
        println!(
            "{}",
            format!("⚠ {} slot(s), {} binding(s); not compiling", slots, cli.bind.len()).yellow()
        );
        return Ok(());
    }

    let config = load_config(cli)?;
    let tag = SqlTag::new(SqlxDriver::offline(config.dialect()?));
    print_compiled(&tag.compile(build_template(text, &cli.bind)?));
    Ok(())
}
