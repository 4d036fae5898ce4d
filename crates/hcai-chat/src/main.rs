//! Terminal chat front-end for the HCAI tutor.
//!
//! Reads settings from the environment (and `.env`), then either answers a
//! single `--prompt` or runs an interactive REPL on stdin. Without an API key
//! every answer is the demo-mode notice.
//!
//! ```sh
//! # Interactive
//! hcai-chat --explain --topic fairness
//!
//! # One-shot
//! hcai-chat --prompt "What is fairness in ML?"
//! ```

mod commands;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use commands::{Command, HELP, Input, parse_input};
use hcai_tutor::prelude::*;
use hcai_tutor::prompt::{REFLECTION_PROMPT, SCENARIOS, TUTOR_PERSONA};
use hcai_tutor::safety::DISALLOWED_TOPICS;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Chat with the HCAI tutor from the terminal.
#[derive(Parser)]
#[command(name = "hcai-chat", version)]
struct Cli {
    /// Single question to answer (one-shot mode). Without this, starts a REPL.
    #[arg(long)]
    prompt: Option<String>,

    /// Model to use; overrides MODEL_NAME.
    #[arg(long)]
    model: Option<String>,

    /// Chat completions endpoint; overrides API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Session log file; overrides LOG_PATH.
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Start with Explain steps on.
    #[arg(long)]
    explain: bool,

    /// Start with a mini-lesson selected.
    #[arg(long)]
    topic: Option<String>,

    /// Load settings from this file instead of `./.env`.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Ignore any configured API key and answer in demo mode.
    #[arg(long)]
    demo: bool,

    /// Diagnostic log level (RUST_LOG takes precedence).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Mutable REPL state carried between inputs.
struct ChatState {
    session: Session,
    options: TurnOptions,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            if let Err(e) = dotenvy::from_path(path) {
                eprintln!("Error: failed to load {}: {e}", path.display());
                std::process::exit(1);
            }
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    init_tracing(&cli.log_level);

    let mut config = match TutorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(log_path) = cli.log_path {
        config.log_path = log_path;
    }
    if cli.demo {
        config.api_key = None;
    }

    let topic = match cli.topic.as_deref() {
        None => None,
        Some(query) => match find_lesson(query) {
            Some(lesson) => Some(lesson.name.to_string()),
            None => {
                eprintln!("Error: no mini-lesson matches '{query}' (see /lessons)");
                std::process::exit(1);
            }
        },
    };

    let controller = match config.build_controller() {
        Ok(c) => c.with_event_handler(&LoggingHandler),
        Err(e) => {
            eprintln!("Error: failed to create API client: {e}");
            std::process::exit(1);
        }
    };

    let mut state = ChatState {
        session: Session::new(),
        options: TurnOptions {
            explain_mode: cli.explain,
            topic,
        },
    };

    if let Some(prompt) = cli.prompt {
        let outcome = controller
            .handle_turn(&mut state.session, &prompt, &state.options)
            .await;
        println!("{}", render_outcome(&outcome));
        return;
    }

    run_repl(&controller, &mut state).await;
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_repl(controller: &TurnController<'_>, state: &mut ChatState) {
    let mode = if controller.is_live() {
        controller.model().to_string()
    } else {
        "demo mode".to_string()
    };
    println!("HCAI Tutor ({mode}). Type /help for commands, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error: failed to read input: {e}");
                break;
            }
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Invalid(message) => println!("{message}"),
            Input::Chat(text) => {
                let outcome = controller
                    .handle_turn(&mut state.session, &text, &state.options)
                    .await;
                println!("{}", render_outcome(&outcome));
            }
            Input::Command(Command::Quit) => break,
            Input::Command(command) => println!("{}", run_command(command, controller, state)),
        }
    }
}

/// Apply a non-quit command and return the text to show.
fn run_command(command: Command, controller: &TurnController<'_>, state: &mut ChatState) -> String {
    match command {
        Command::Help => HELP.to_string(),
        Command::About => about_text(controller),
        Command::Scenarios => SCENARIOS
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {s}", i + 1))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Reflect => REFLECTION_PROMPT.to_string(),
        Command::Lessons => LESSONS
            .iter()
            .map(|l| {
                let marker = if state.options.topic.as_deref() == Some(l.name) {
                    "*"
                } else {
                    " "
                };
                format!("{marker} {}", l.name)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Lesson(query) => match find_lesson(&query) {
            Some(lesson) => {
                state.options.topic = Some(lesson.name.to_string());
                lesson.render()
            }
            None => format!("No mini-lesson matches '{query}'. Try /lessons."),
        },
        Command::LessonOff => {
            state.options.topic = None;
            "Mini-lesson cleared.".to_string()
        }
        Command::Explain(on) => {
            state.options.explain_mode = on;
            format!("Explain steps {}.", if on { "on" } else { "off" })
        }
        Command::History => {
            let logged = match controller.logger().read_records() {
                Ok(records) => records.len().to_string(),
                Err(e) => format!("unreadable ({e})"),
            };
            format!(
                "{} turn(s) this session. Session log {}: {logged} row(s).",
                state.session.len(),
                controller.logger().path().display()
            )
        }
        Command::Reset => {
            state.session.reset();
            "Conversation cleared.".to_string()
        }
        Command::Quit => String::new(),
    }
}

fn about_text(controller: &TurnController<'_>) -> String {
    let mut out = String::from("Persona:\n");
    out.push_str(TUTOR_PERSONA);
    out.push_str("\n\nThe tutor will not help with:");
    for topic in DISALLOWED_TOPICS {
        out.push_str("\n- ");
        out.push_str(topic);
    }
    let mode = if controller.is_live() { "live" } else { "demo" };
    out.push_str(&format!("\n\nModel: {} ({mode})", controller.model()));
    out
}

fn render_outcome(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Blocked { refusal } => format!("[blocked] {refusal}"),
        TurnOutcome::Answered {
            text,
            source,
            log_failures,
        } => {
            let mut out = match source {
                AnswerSource::ModelError(e) => format!("tutor [{}]> {text}", e.kind()),
                AnswerSource::Live | AnswerSource::Demo => format!("tutor> {text}"),
            };
            if *log_failures > 0 {
                out.push_str(&format!(
                    "\n(note: {log_failures} session log row(s) could not be written)"
                ));
            }
            out
        }
    }
}
