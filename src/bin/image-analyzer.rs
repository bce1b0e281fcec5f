// image-analyzer - analyze images with Gemini from the terminal

use anyhow::Context;
use clap::{Parser, Subcommand};
use image_analyzer::analysis::{
    BatchAnalyzer, GeminiClient, SessionController, SessionState, TurnError,
};
use image_analyzer::config::{self, AnalyzerConfig, CONFIG_FILE};
use image_analyzer::render::Presenter;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Analyze one or more images with a prompt using Gemini", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Model to use (overrides config and GEMINI_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Report every image even if some fail, instead of aborting the batch
    #[arg(short, long, global = true)]
    keep_going: bool,

    /// Verbose logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze the given images once and exit
    Analyze {
        /// Prompt sent with every image (empty: describe the images)
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// Image files (jpg, jpeg, png)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Interactive session: set a prompt, add images, analyze, clear
    Session,
    /// Create an example .image-analyzer.json in the current directory
    Init,
}

/// One line of input in an interactive session
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Prompt(String),
    Add(Vec<PathBuf>),
    Remove(String),
    Images,
    Analyze,
    Clear,
    Help,
    Exit,
    Empty,
    Unknown(String),
}

impl SessionCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return SessionCommand::Empty;
        }
        if !line.starts_with('/') {
            return match line {
                "exit" | "quit" => SessionCommand::Exit,
                _ => SessionCommand::Prompt(line.to_string()),
            };
        }

        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match cmd {
            "/prompt" => SessionCommand::Prompt(rest.to_string()),
            "/add" => SessionCommand::Add(rest.split_whitespace().map(PathBuf::from).collect()),
            "/remove" => SessionCommand::Remove(rest.to_string()),
            "/images" => SessionCommand::Images,
            "/analyze" => SessionCommand::Analyze,
            "/clear" | "/reset" => SessionCommand::Clear,
            "/help" => SessionCommand::Help,
            "/exit" | "/quit" => SessionCommand::Exit,
            _ => SessionCommand::Unknown(cmd.to_string()),
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("image_analyzer={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn build_controller(args: &Args) -> anyhow::Result<SessionController> {
    let mut config = AnalyzerConfig::load().context("failed to load configuration")?;
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if args.keep_going {
        config.keep_going = true;
    }

    let client = GeminiClient::with_config(&config)?;
    let analyzer = BatchAnalyzer::new(Arc::new(client)).with_policy(config.failure_policy());

    Ok(SessionController::new(analyzer, config::api_key()))
}

async fn run_once(
    controller: &SessionController,
    presenter: &Presenter,
    prompt: String,
    files: &[PathBuf],
) -> bool {
    let mut state = SessionState::new();
    state.set_prompt(prompt);

    for file in files {
        if let Err(e) = controller.add_image(&mut state, file).await {
            presenter.warn(&e.to_string());
        }
    }
    if !state.images.is_empty() {
        presenter.print_uploads(&state.images);
    }

    analyze_turn(controller, presenter, &mut state).await
}

async fn analyze_turn(
    controller: &SessionController,
    presenter: &Presenter,
    state: &mut SessionState,
) -> bool {
    if !state.images.is_empty() {
        presenter.print_processing(state.images.len());
    }

    match controller.analyze(state).await {
        Ok(report) => {
            presenter.print_report(&report, &state.results);
            report.is_complete()
        }
        Err(e) => {
            presenter.print_turn_error(&e);
            if let TurnError::ConfigurationError(_) = e {
                presenter.warn("Set GEMINI_API_KEY in the environment or in a .env file");
            }
            false
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <text>            set the prompt");
    println!("  /prompt [text]    set or clear the prompt");
    println!("  /add <path>...    add jpg, jpeg or png images");
    println!("  /remove <name>    remove an image by filename");
    println!("  /images           list added images");
    println!("  /analyze          🚀 analyze images");
    println!("  /clear            🔄 clear everything and restart");
    println!("  exit              quit");
    println!();
}

async fn run_session(controller: &SessionController, presenter: &Presenter) -> anyhow::Result<()> {
    presenter.print_banner(controller.analyzer().model());
    println!("🔍 Enter a prompt (e.g., 'Describe these images?')");
    print_help();

    let mut state = SessionState::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match SessionCommand::parse(&input) {
            SessionCommand::Empty => continue,
            SessionCommand::Exit => break,
            SessionCommand::Help => print_help(),
            SessionCommand::Prompt(prompt) => {
                if prompt.is_empty() {
                    println!("Prompt cleared.\n");
                } else {
                    println!("Prompt set.\n");
                }
                state.set_prompt(prompt);
            }
            SessionCommand::Add(paths) => {
                if paths.is_empty() {
                    presenter.warn("Usage: /add <path>...");
                    continue;
                }
                for path in paths {
                    if let Err(e) = controller.add_image(&mut state, &path).await {
                        presenter.warn(&e.to_string());
                    }
                }
                presenter.print_uploads(&state.images);
            }
            SessionCommand::Remove(name) => match state.remove_image(&name) {
                Some(_) => presenter.print_uploads(&state.images),
                None => presenter.warn(&format!("No image named {}", name)),
            },
            SessionCommand::Images => presenter.print_uploads(&state.images),
            SessionCommand::Analyze => {
                analyze_turn(controller, presenter, &mut state).await;
            }
            SessionCommand::Clear => {
                controller.reset(&mut state);
                println!("Session cleared.\n");
                presenter.print_banner(controller.analyzer().model());
            }
            SessionCommand::Unknown(cmd) => {
                presenter.warn(&format!("Unknown command: {} (try /help)", cmd));
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Command::Init = args.command {
        AnalyzerConfig::write_example(CONFIG_FILE)?;
        println!("✅ Created example config at: {}", CONFIG_FILE);
        return Ok(());
    }

    let controller = build_controller(&args)?;
    let presenter = Presenter::new();

    match &args.command {
        Command::Analyze { prompt, files } => {
            if !run_once(&controller, &presenter, prompt.clone(), files).await {
                std::process::exit(1);
            }
        }
        Command::Session => run_session(&controller, &presenter).await?,
        Command::Init => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image_analyzer::analysis::{
        ClientError, FailurePolicy, GenerationClient, ImageHandle, ImageKind,
    };

    struct AlwaysFails;

    #[async_trait]
    impl GenerationClient for AlwaysFails {
        async fn generate(
            &self,
            _api_key: &str,
            _prompt: &str,
            _image: &ImageHandle,
        ) -> Result<String, ClientError> {
            Err(ClientError::ApiError {
                status: 503,
                message: "overloaded".to_string(),
            })
        }

        fn model(&self) -> &str {
            "always-fails"
        }
    }

    fn failing_controller(policy: FailurePolicy) -> SessionController {
        let analyzer = BatchAnalyzer::new(Arc::new(AlwaysFails)).with_policy(policy);
        SessionController::new(analyzer, Some("key".to_string()))
    }

    fn two_images() -> SessionState {
        let mut state = SessionState::new();
        for name in ["a.png", "b.png"] {
            state.add_image(ImageHandle::new(name, ImageKind::Png, 1, 1, vec![0u8]));
        }
        state
    }

    #[tokio::test]
    async fn test_keep_going_with_failures_is_unsuccessful() {
        let controller = failing_controller(FailurePolicy::BestEffort);
        let mut state = two_images();

        let ok = analyze_turn(&controller, &Presenter::new(), &mut state).await;

        assert!(!ok);
        assert_eq!(state.results.len(), 2);
    }

    #[tokio::test]
    async fn test_stop_on_error_failure_is_unsuccessful() {
        let controller = failing_controller(FailurePolicy::StopOnError);
        let mut state = two_images();

        let ok = analyze_turn(&controller, &Presenter::new(), &mut state).await;

        assert!(!ok);
        assert!(state.results.is_empty());
    }

    #[test]
    fn test_plain_text_sets_prompt() {
        assert_eq!(
            SessionCommand::parse("Describe the cats\n"),
            SessionCommand::Prompt("Describe the cats".to_string())
        );
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(
            SessionCommand::parse("/add a.jpg  b.png"),
            SessionCommand::Add(vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")])
        );
        assert_eq!(SessionCommand::parse("/prompt"), SessionCommand::Prompt(String::new()));
        assert_eq!(SessionCommand::parse("/reset"), SessionCommand::Clear);
        assert_eq!(SessionCommand::parse("/analyze"), SessionCommand::Analyze);
        assert_eq!(SessionCommand::parse("quit"), SessionCommand::Exit);
        assert_eq!(SessionCommand::parse("   "), SessionCommand::Empty);
        assert_eq!(
            SessionCommand::parse("/nope x"),
            SessionCommand::Unknown("/nope".to_string())
        );
    }

    #[test]
    fn test_cli_parses() {
        let argv = ["image-analyzer", "-vv", "analyze", "-p", "hi", "a.png"];
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(
            args.command,
            Command::Analyze { ref prompt, ref files } if prompt == "hi" && files.len() == 1
        ));

        assert!(Args::try_parse_from(["image-analyzer", "analyze"]).is_err());
    }
}
