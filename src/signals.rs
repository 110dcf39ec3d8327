use std::io;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use signal_hook::iterator::{Handle, Signals};

use crate::runtime::HostEvent;

/// Forwards SIGINT/SIGTERM to the host loop until dropped.
pub struct InterruptForwarder {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for InterruptForwarder {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn forward_interrupts(events: Sender<HostEvent>) -> io::Result<InterruptForwarder> {
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM])?;
    let handle = signals.handle();

    let thread = thread::Builder::new()
        .name("complibot-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::debug!(signal, "interrupt received");
                if events.send(HostEvent::Interrupt).is_err() {
                    break;
                }
            }
        })?;

    Ok(InterruptForwarder {
        handle,
        thread: Some(thread),
    })
}
