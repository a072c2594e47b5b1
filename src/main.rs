//! CLI entry point for `emlview`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use humansize::{format_size, BINARY};

use emlview::config::Config;
use emlview::error::EmlError;
use emlview::model::email::ParsedEmail;
use emlview::parser::eml::parse_eml_file;
use emlview::parser::header::parse_date;
use emlview::parser::mime::html_to_text;

#[derive(Parser)]
#[command(
    name = "emlview",
    version,
    about = "View and extract .eml email files from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// EML file to show (shorthand for `show`)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a message summary (headers, body preview, attachment list)
    Show {
        path: PathBuf,
        /// Print the full parsed message as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the plain-text body (falls back to HTML converted to text)
    Text { path: PathBuf },
    /// Print the raw HTML body
    Html { path: PathBuf },
    /// List attachments, or extract them with --output
    Attachments {
        path: PathBuf,
        /// Extract attachments into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the message as a plain text file
    Export {
        path: PathBuf,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = emlview::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Some(Commands::Show { path, json }) => cmd_show(&path, json, &config),
        Some(Commands::Text { path }) => cmd_text(&path),
        Some(Commands::Html { path }) => cmd_html(&path),
        Some(Commands::Attachments { path, output }) => {
            cmd_attachments(&path, output.as_deref(), &config)
        }
        Some(Commands::Export { path, output }) => cmd_export(&path, output.as_deref(), &config),
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => match cli.file {
            Some(path) => cmd_show(&path, false, &config),
            None => {
                eprintln!("No file given. Usage: emlview <FILE.eml>");
                Ok(())
            }
        },
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = emlview::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "emlview.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Validate the path and parse the message.
///
/// Caller-level failures (missing file, wrong extension) are reported here,
/// once; the parse itself cannot fail.
fn open_message(path: &Path) -> anyhow::Result<ParsedEmail> {
    if !path.exists() {
        return Err(EmlError::FileNotFound(path.to_path_buf()).into());
    }

    let is_eml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"));
    if !is_eml {
        return Err(EmlError::NotAnEmlFile(path.to_path_buf()).into());
    }

    Ok(parse_eml_file(path)?)
}

/// Show a message summary, or the full parse as JSON.
fn cmd_show(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let email = open_message(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&email)?);
        return Ok(());
    }

    let date_display = parse_date(&email.date)
        .map(|d| d.format(&config.general.date_format).to_string())
        .unwrap_or_else(|| email.date.clone());

    println!();
    println!("  {:<9} {}", "From:", email.from);
    if !email.to.is_empty() {
        println!("  {:<9} {}", "To:", email.to);
    }
    if !email.cc.is_empty() {
        println!("  {:<9} {}", "Cc:", email.cc);
    }
    if !date_display.is_empty() {
        println!("  {:<9} {}", "Date:", date_display);
    }
    println!("  {:<9} {}", "Subject:", email.subject);
    println!();

    let body = body_for_display(&email);
    if body.is_empty() {
        println!("  (no body)");
    } else {
        let limit = config.display.text_preview_lines;
        let mut shown = 0usize;
        for line in body.lines() {
            if limit > 0 && shown >= limit {
                println!("  […]");
                break;
            }
            println!("  {line}");
            shown += 1;
        }
    }

    if !email.attachments.is_empty() {
        println!();
        println!("  Attachments:");
        for att in &email.attachments {
            println!(
                "    {} ({}, {})",
                att.name,
                if att.content_type.is_empty() {
                    "unknown type"
                } else {
                    att.content_type.as_str()
                },
                format_size(att.size, BINARY)
            );
        }
    }
    println!();

    Ok(())
}

/// Print the plain-text body.
fn cmd_text(path: &Path) -> anyhow::Result<()> {
    let email = open_message(path)?;
    let body = body_for_display(&email);
    if body.is_empty() {
        eprintln!("Message has no body.");
    } else {
        println!("{body}");
    }
    Ok(())
}

/// Print the raw HTML body.
fn cmd_html(path: &Path) -> anyhow::Result<()> {
    let email = open_message(path)?;
    if email.html.is_empty() {
        eprintln!("Message has no HTML body.");
    } else {
        println!("{}", email.html);
    }
    Ok(())
}

/// List attachments, or extract them when an output directory is given.
fn cmd_attachments(path: &Path, output: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let email = open_message(path)?;

    if email.attachments.is_empty() {
        println!("  No attachments.");
        return Ok(());
    }

    match output.or(config.export.default_output_dir.as_deref()) {
        Some(dir) => {
            let paths = emlview::export::attachment::save_all_attachments(&email, dir)?;
            println!("  Extracted {} attachment(s) to {}", paths.len(), dir.display());
            for p in &paths {
                println!("    {}", p.display());
            }
        }
        None => {
            println!(
                "  {} attachment(s) in {}",
                email.attachments.len(),
                path.display()
            );
            for att in &email.attachments {
                println!(
                    "    {} ({}, {})",
                    att.name,
                    if att.content_type.is_empty() {
                        "unknown type"
                    } else {
                        att.content_type.as_str()
                    },
                    format_size(att.size, BINARY)
                );
            }
        }
    }

    Ok(())
}

/// Export the message as a `.txt` file.
fn cmd_export(path: &Path, output: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let email = open_message(path)?;

    let fallback = PathBuf::from(".");
    let dir = output
        .or(config.export.default_output_dir.as_deref())
        .unwrap_or(&fallback);

    let out = emlview::export::text::export_text(&email, dir)?;
    println!("  Exported to {}", out.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "emlview", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// The body to display: the text part, or the HTML part converted to text.
fn body_for_display(email: &ParsedEmail) -> String {
    if !email.text.is_empty() {
        email.text.clone()
    } else if !email.html.is_empty() {
        html_to_text(&email.html)
    } else {
        String::new()
    }
}
