mod args;
mod command;

use std::io::BufRead;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use echochat::{
    build_engine, Change, ChatConfig, ChatEngine, ChatMessage, DataPath, DataPathType,
    FileIdentity, Role, WebsocketTransport,
};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::command::{Command, HELP};

// Timers (reconnects, mock replies, keepalive) only advance when we poll.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum Input {
    Line(String),
    Wake,
    Eof,
}

fn setup_logging(path: &DataPath) -> WorkerGuard {
    let log_path = path.path(DataPathType::Log);

    use tracing_appender::{
        non_blocking,
        rolling::{RollingFileAppender, Rotation},
    };

    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        log_path,
        format!("echochat-{}.log", env!("CARGO_PKG_VERSION")),
    );

    let (non_blocking_writer, guard) = non_blocking(file_appender);

    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    // stdout belongs to the conversation
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("echochat=info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    guard
}

fn spawn_stdin_reader(tx: Sender<Input>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    error!("error reading stdin: {err}");
                    break;
                }
            }
        }
        let _ = tx.send(Input::Eof);
    });
}

/// Prints the conversation as it changes.
#[derive(Default)]
struct Printer {
    printed: Vec<String>,
}

impl Printer {
    fn messages(&mut self, messages: &[ChatMessage]) {
        let still_prefix = self.printed.len() <= messages.len()
            && self
                .printed
                .iter()
                .zip(messages)
                .all(|(id, msg)| *id == msg.id);

        if !still_prefix {
            println!("--- conversation reset ---");
            self.printed.clear();
        }

        for msg in &messages[self.printed.len()..] {
            let who = match msg.role {
                Role::User => "you",
                Role::Bot => "bot",
                Role::Admin => "*",
            };
            println!(
                "[{}] {who}: {}",
                msg.timestamp.format("%H:%M:%S"),
                msg.content
            );
            self.printed.push(msg.id.clone());
        }
    }

    fn change(&mut self, engine: &dyn ChatEngine, change: Change) {
        let state = engine.state();
        match change {
            Change::Messages => self.messages(&state.messages),
            Change::Connection => {
                let conn = &state.connection;
                if conn.reconnect_attempt > 0 {
                    println!(
                        "({}, reconnect attempt {})",
                        conn.status, conn.reconnect_attempt
                    );
                } else {
                    println!("({})", conn.status);
                }
            }
            Change::Typing => {
                if state.typing_users.agent {
                    println!("(agent is typing...)");
                } else if state.typing_users.bot {
                    println!("(bot is typing...)");
                }
            }
            Change::Takeover => {
                if let Some(agent) = state.agent() {
                    println!("(talking to {})", agent.display_name());
                }
            }
            Change::Presence => println!("({} agents online)", state.online_agents),
            Change::Draft | Change::LocalTyping => {}
        }
    }
}

fn run(
    engine: &mut dyn ChatEngine,
    identity_path: &DataPath,
    mut bot: String,
    inputs: Receiver<Input>,
) {
    let changes = engine.subscribe();
    let mut printer = Printer::default();

    engine.load_history(&bot);
    engine.connect_ws(&bot);

    loop {
        match inputs.recv_timeout(POLL_INTERVAL) {
            Ok(Input::Line(line)) => match Command::parse(&line) {
                Some(Command::Quit) => break,
                Some(Command::Send(text)) => {
                    engine.send_message(&text);
                    engine.set_draft("");
                }
                Some(Command::Draft(text)) => engine.set_draft(&text),
                Some(Command::Typing(typing)) => engine.set_typing(typing),
                Some(Command::Connect(other)) => {
                    if let Some(other) = other {
                        bot = other;
                    }
                    engine.connect_ws(&bot);
                }
                Some(Command::Disconnect) => engine.disconnect_ws(),
                Some(Command::History) => engine.load_history(&bot),
                Some(Command::Clear) => engine.clear(),
                Some(Command::Forget) => {
                    FileIdentity::new(identity_path).reset();
                    println!("(anonymous id forgotten, /connect to start over)");
                }
                Some(Command::Help) => println!("{HELP}"),
                Some(Command::Unknown(cmd)) => println!("unknown command '{cmd}', try /help"),
                None => {}
            },
            Ok(Input::Wake) | Err(RecvTimeoutError::Timeout) => {}
            Ok(Input::Eof) | Err(RecvTimeoutError::Disconnected) => break,
        }

        engine.poll(Instant::now());

        for change in changes.try_iter() {
            printer.change(engine, change);
        }
    }

    engine.disconnect_ws();
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (args, unrecognized) = Args::parse(&args);

    let mut config = ChatConfig::from_env();
    args.apply(&mut config);

    let path = config.data_path();
    let _guard = setup_logging(&path);

    for arg in unrecognized {
        error!("unrecognized argument: {arg}");
    }

    info!(
        "echochat {} ({} mode) talking to {} as bot '{}'",
        env!("CARGO_PKG_VERSION"),
        if config.mock { "mock" } else { "live" },
        config.host,
        args.bot
    );

    let (tx, inputs) = crossbeam_channel::unbounded();
    let wake_tx = tx.clone();
    let wakeup = move || {
        let _ = wake_tx.send(Input::Wake);
    };

    let identity = Box::new(FileIdentity::new(&path));
    let mut engine = build_engine(&config, WebsocketTransport::new(wakeup), identity);

    spawn_stdin_reader(tx);
    println!("{HELP}");

    run(engine.as_mut(), &path, args.bot, inputs);
}
