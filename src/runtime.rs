use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use chat_runtime::{
    CancelSignal, ChatRuntime, RunEvent, RunId, RunMessage, RunRequest, RuntimeProfile,
    ToolCallRequest,
};

use crate::session::HostOps;
use crate::tools::RetrievalToolExecutor;

/// Everything the host loop reacts to, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Run(RunEvent),
    Input(String),
    InputClosed,
    Interrupt,
}

struct ActiveRun {
    run_id: RunId,
    cancel: CancelSignal,
    join_handle: Option<JoinHandle<()>>,
}

/// Runs each reply on its own worker thread and forwards its events to the host
/// loop over `events`.
pub struct RuntimeController {
    events: Sender<HostEvent>,
    next_run_id: AtomicU64,
    active_run: Mutex<Option<ActiveRun>>,
    runtime: Arc<dyn ChatRuntime>,
    tools: RetrievalToolExecutor,
}

impl RuntimeController {
    pub fn new(
        runtime: Arc<dyn ChatRuntime>,
        tools: RetrievalToolExecutor,
        events: Sender<HostEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            events,
            next_run_id: AtomicU64::new(1),
            active_run: Mutex::new(None),
            runtime,
            tools,
        })
    }

    #[must_use]
    pub fn profile(&self) -> RuntimeProfile {
        self.runtime.profile()
    }

    /// Must be called by the host loop for every run event it receives.
    pub fn on_run_event(&self, event: &RunEvent) {
        if event.is_terminal() {
            self.clear_active_run_if_matching(event.run_id());
        }
    }

    /// Cancels whatever run is active, e.g. on shutdown.
    pub fn cancel_active_run(&self) {
        if let Some(active_run) = self.lock_active_run().as_ref() {
            active_run.cancel.store(true, Ordering::SeqCst);
        }
    }

    fn start_run_internal(
        self: &Arc<Self>,
        messages: Vec<RunMessage>,
        instructions: String,
    ) -> Result<RunId, String> {
        let mut active_run = self.lock_active_run();
        // A stopped run may still be winding down; it no longer blocks a new one.
        if let Some(active) = active_run.as_ref() {
            if !active.cancel.load(Ordering::SeqCst) {
                return Err("Run already active".to_string());
            }
        }

        let run_id = self.next_run_id.fetch_add(1, Ordering::SeqCst);
        let cancel = Arc::new(AtomicBool::new(false));
        let request = RunRequest {
            run_id,
            messages,
            instructions,
            tools: self.tools.definitions(),
        };
        let join_handle = self.spawn_worker(request, Arc::clone(&cancel))?;

        *active_run = Some(ActiveRun {
            run_id,
            cancel,
            join_handle: Some(join_handle),
        });

        Ok(run_id)
    }

    fn spawn_worker(
        self: &Arc<Self>,
        request: RunRequest,
        cancel: CancelSignal,
    ) -> Result<JoinHandle<()>, String> {
        let run_id = request.run_id;
        let controller = Arc::clone(self);
        thread::Builder::new()
            .name(format!("complibot-run-{run_id}"))
            .spawn(move || controller.run_worker(request, cancel))
            .map_err(|error| format!("Failed to spawn run worker: {error}"))
    }

    fn run_worker(self: Arc<Self>, request: RunRequest, cancel: CancelSignal) {
        let run_id = request.run_id;
        tracing::debug!(run_id, messages = request.messages.len(), "run worker started");

        let terminal_emitted = Arc::new(AtomicBool::new(false));
        let terminal_emitted_for_emit = Arc::clone(&terminal_emitted);
        let events = self.events.clone();
        let runtime = Arc::clone(&self.runtime);
        let tools = &self.tools;

        let mut emit = move |event: RunEvent| {
            if event.is_terminal() {
                terminal_emitted_for_emit.store(true, Ordering::SeqCst);
            }
            // The host loop may already be gone during shutdown.
            let _ = events.send(HostEvent::Run(event));
        };
        let mut execute_tool = |call: ToolCallRequest| tools.execute(call);

        let run_outcome = catch_unwind(AssertUnwindSafe(|| {
            runtime.run(request, Arc::clone(&cancel), &mut execute_tool, &mut emit)
        }));

        match run_outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => emit(RunEvent::Failed { run_id, error }),
            Err(_) => emit(RunEvent::Failed {
                run_id,
                error: "Chat runtime panicked".to_string(),
            }),
        }

        if !terminal_emitted.load(Ordering::SeqCst) {
            emit(RunEvent::Failed {
                run_id,
                error: "Chat runtime exited without terminal event".to_string(),
            });
        }
    }

    fn clear_active_run_if_matching(&self, run_id: RunId) {
        let mut active_run = self.lock_active_run();
        let matches = active_run.as_ref().map(|active| active.run_id) == Some(run_id);
        if !matches {
            return;
        }

        let Some(mut completed) = active_run.take() else {
            return;
        };

        if let Some(join_handle) = completed.join_handle.take() {
            if join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn cancel_run_internal(&self, run_id: RunId) {
        let active_run = self.lock_active_run();
        if let Some(active_run) = active_run.as_ref() {
            if active_run.run_id == run_id {
                active_run.cancel.store(true, Ordering::SeqCst);
            }
        }
    }

    fn lock_active_run(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        lock_unpoisoned(&self.active_run)
    }
}

impl HostOps for Arc<RuntimeController> {
    fn start_run(
        &mut self,
        messages: Vec<RunMessage>,
        instructions: String,
    ) -> Result<RunId, String> {
        self.start_run_internal(messages, instructions)
    }

    fn cancel_run(&mut self, run_id: RunId) {
        self.cancel_run_internal(run_id);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
