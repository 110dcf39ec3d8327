use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use complibot::app::App;
use complibot::config::Cli;
use complibot::hydration::HydrationController;
use complibot::logging;
use complibot::prompt::build_system_prompt;
use complibot::runtime::{HostEvent, RuntimeController};
use complibot::runtimes::{runtime_from_config, search_backend_from_config};
use complibot::tools::RetrievalToolExecutor;
use complibot::view::TranscriptPrinter;
use snapshot_store::{FileStorage, SnapshotStore};

const IDLE_TICK: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let instructions =
        build_system_prompt(&cli.prompt_options()).context("invalid prompt configuration")?;
    let chat_runtime = runtime_from_config(&cli).context("failed to initialize chat runtime")?;
    let search = search_backend_from_config(&cli).context("failed to initialize vector search")?;
    let profile = chat_runtime.profile();
    tracing::info!(runtime = %profile.runtime_id, model = %profile.model_id, "chat runtime ready");

    let (events, receiver) = mpsc::channel();
    let mut host = RuntimeController::new(
        chat_runtime,
        RetrievalToolExecutor::new(search),
        events.clone(),
    );

    let data_dir = cli.data_dir();
    tracing::debug!(path = %data_dir.display(), "conversation storage");
    let hydration = HydrationController::new(SnapshotStore::new(FileStorage::new(data_dir)))
        .with_debounce(cli.save_debounce());
    let mut app = App::new(hydration, instructions).with_assistant_name(cli.ai_name.clone());

    #[cfg(unix)]
    let _interrupts = complibot::signals::forward_interrupts(events.clone())
        .context("failed to install signal handlers")?;
    spawn_input_reader(events).context("failed to start input reader")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut printer = TranscriptPrinter::new();

    app.start();
    render(&mut app, &mut printer, &mut out)?;

    while !app.should_exit() {
        let timeout = app
            .save_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_TICK);

        match receiver.recv_timeout(timeout) {
            Ok(HostEvent::Run(event)) => {
                host.on_run_event(&event);
                app.on_run_event(event, Instant::now());
            }
            Ok(HostEvent::Input(line)) => app.on_input(&line, &mut host),
            Ok(HostEvent::InputClosed) => app.on_input_closed(),
            Ok(HostEvent::Interrupt) => app.on_interrupt(&mut host),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        app.persist(Instant::now());
        render(&mut app, &mut printer, &mut out)?;
    }

    app.shutdown(&mut host);
    host.cancel_active_run();
    render(&mut app, &mut printer, &mut out)?;
    writeln!(out)?;
    Ok(())
}

fn render(app: &mut App, printer: &mut TranscriptPrinter, out: &mut dyn Write) -> io::Result<()> {
    if app.take_transcript_replaced() {
        printer.reset(out)?;
    }
    printer.render(app.session().messages(), app.assistant_name(), out)?;
    for notice in app.take_notices() {
        printer.notice(&notice, out)?;
    }
    Ok(())
}

fn spawn_input_reader(events: Sender<HostEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("complibot-input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if events.send(HostEvent::Input(line)).is_err() {
                    return;
                }
            }
            let _ = events.send(HostEvent::InputClosed);
        })?;
    Ok(())
}
