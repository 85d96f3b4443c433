//! LegAI CLI: contract analysis, document chat, MCP server
//!
//! Usage:
//!   legai analyze <file> [--language code] [--export path] [--json]
//!   legai chat <file> [--language code]
//!   legai languages
//!   legai mcp
//!
//! Global: --config path, --backend mock|gemini

use clap::{Parser, Subcommand, ValueEnum};
use legai::{
    intake, BackendKind, ChatMessage, ReviewConfig, ReviewSession, Sender, SessionError,
    SUPPORTED_LANGUAGES,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "legai",
    version,
    about = "Turn legal jargon into clear, actionable guidance"
)]
struct Cli {
    /// Path to YAML config (default: ~/.config/legai/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the configured backend
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Mock,
    Gemini,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document and print the risk summary
    Analyze {
        /// PDF, DOCX or TXT file
        file: PathBuf,
        /// Output language code
        #[arg(long)]
        language: Option<String>,
        /// Write the plain-text report here (a directory gets analysis-<name>.txt)
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print the analysis as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Analyze a document, then answer questions about it on stdin
    Chat {
        /// PDF, DOCX or TXT file
        file: PathBuf,
        /// Output language code
        #[arg(long)]
        language: Option<String>,
    },
    /// List supported output languages
    Languages,
    /// Start the MCP (Model Context Protocol) server on stdio
    Mcp,
}

/// Logs go to stderr so stdout (and the MCP stdio transport) stay clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEGAI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, backend: Option<BackendArg>) -> Result<ReviewConfig, String> {
    let mut config = ReviewConfig::load(path).map_err(|e| e.to_string())?;
    if let Some(arg) = backend {
        config.backend = match arg {
            BackendArg::Mock => BackendKind::Mock,
            BackendArg::Gemini => BackendKind::Gemini,
        };
    }
    Ok(config)
}

fn open_session(config: &ReviewConfig) -> Result<ReviewSession, String> {
    let backend = config.build_backend().map_err(|e| e.to_string())?;
    Ok(ReviewSession::new(backend).with_timeout(config.request_timeout()))
}

fn print_message(msg: &ChatMessage) {
    let who = match msg.sender {
        Sender::User => "you",
        Sender::Ai => "assistant",
    };
    println!("{}> {}", who, msg.text);
}

/// Load the file and run the analysis; prints the user-facing message on failure.
async fn analyze_file(session: &ReviewSession, file: &Path, language: &str) -> Result<(), i32> {
    let document = match intake::load_path(file) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "intake failed");
            eprintln!("Error: {}", e.user_message());
            return Err(1);
        }
    };
    eprintln!("Analyzing {}...", document.file_name);
    match session.submit(&document, language).await {
        Ok(_) => Ok(()),
        Err(SessionError::Review(e)) => {
            eprintln!("Error: {}", e.user_message());
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(1)
        }
    }
}

fn write_export(session: &ReviewSession, target: &Path) -> i32 {
    let Some((file_name, report)) = session.export_report() else {
        eprintln!("Error: no analysis to export");
        return 1;
    };
    let path = if target.is_dir() {
        target.join(file_name)
    } else {
        target.to_path_buf()
    };
    match std::fs::write(&path, report) {
        Ok(()) => {
            eprintln!("Wrote {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: cannot write '{}': {}", path.display(), e);
            1
        }
    }
}

async fn cmd_analyze(
    config: &ReviewConfig,
    file: &Path,
    language: &str,
    export: Option<&Path>,
    json: bool,
) -> i32 {
    let session = match open_session(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(code) = analyze_file(&session, file, language).await {
        return code;
    }
    let Some(analysis) = session.analysis() else {
        return 1;
    };

    if json {
        match serde_json::to_string_pretty(analysis.as_ref()) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        println!(
            "Risk score: {}/10 ({})",
            analysis.risk_score(),
            analysis.risk_level()
        );
        println!("\n{}\n", analysis.risk_explanation());
        println!("Suggestions:");
        for suggestion in analysis.suggestions() {
            println!("  ✓ {}", suggestion);
        }
        println!("\nHighlighted clauses:");
        for segment in analysis.flagged_segments() {
            println!("  [{}] {}", segment.kind, segment.text.trim());
        }
    }

    match export {
        Some(target) => write_export(&session, target),
        None => 0,
    }
}

async fn cmd_chat(config: &ReviewConfig, file: &Path, language: &str) -> i32 {
    let session = match open_session(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(code) = analyze_file(&session, file, language).await {
        return code;
    }
    for msg in session.transcript() {
        print_message(&msg);
    }

    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        if std::io::stdout().flush().is_err() {
            return 1;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return 0,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/quit" | "/exit") {
            return 0;
        }
        match session.send_message(line).await {
            Ok(turn) => print_message(&turn.reply),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}

fn cmd_languages() -> i32 {
    println!("{:<6}  {}", "CODE", "LANGUAGE");
    println!("{}", "-".repeat(24));
    for lang in SUPPORTED_LANGUAGES {
        println!("{:<6}  {}", lang.code, lang.name);
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = match load_config(cli.config.as_deref(), cli.backend) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Languages => cmd_languages(),
        Commands::Mcp => legai::mcp::run_mcp_server(config),
        Commands::Analyze {
            file,
            language,
            export,
            json,
        } => {
            let language = language.unwrap_or_else(|| config.default_language.clone());
            run_async(cmd_analyze(&config, &file, &language, export.as_deref(), json))
        }
        Commands::Chat { file, language } => {
            let language = language.unwrap_or_else(|| config.default_language.clone());
            run_async(cmd_chat(&config, &file, &language))
        }
    };
    std::process::exit(code);
}

fn run_async(fut: impl std::future::Future<Output = i32>) -> i32 {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(fut),
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            1
        }
    }
}
