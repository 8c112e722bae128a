//! Subprocess-backed speech output.
//!
//! Announcements are spoken by an external text-to-speech program
//! (`espeak` by default, `say` on macOS). Each utterance runs as a child
//! process watched from a background thread; the exit status becomes the
//! utterance's [`SpeechOutcome`]. Cancellation kills the child.

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};
use tuner_core::speech::{SpeechOutcome, SpeechSink};

/// How often the watcher thread checks whether the child has exited.
const WATCH_INTERVAL: Duration = Duration::from_millis(25);

/// Speaks by spawning a text-to-speech program per utterance.
pub struct CommandSpeech {
    program: String,
    /// Shared slot for the currently playing child. Each utterance gets
    /// its own slot so a watcher never reaps a successor's process.
    current: Option<Arc<Mutex<Option<Child>>>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            current: None,
        }
    }
}

fn lock(slot: &Mutex<Option<Child>>) -> MutexGuard<'_, Option<Child>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SpeechSink for CommandSpeech {
    fn speak(&mut self, text: &str) -> Receiver<SpeechOutcome> {
        let (tx, rx) = bounded(1);

        let child = match Command::new(&self.program)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let _ = tx.send(SpeechOutcome::Errored(format!(
                    "failed to launch {}: {e}",
                    self.program
                )));
                return rx;
            }
        };

        let slot = Arc::new(Mutex::new(Some(child)));
        self.current = Some(Arc::clone(&slot));

        let program = self.program.clone();
        thread::spawn(move || {
            loop {
                enum Watch {
                    Running,
                    Cancelled,
                    Exited(std::process::ExitStatus),
                    Failed(std::io::Error),
                }

                let watch = {
                    let mut guard = lock(&slot);
                    match guard.take() {
                        // Cancellation emptied the slot underneath us.
                        None => Watch::Cancelled,
                        Some(mut child) => match child.try_wait() {
                            Ok(Some(status)) => Watch::Exited(status),
                            Ok(None) => {
                                *guard = Some(child);
                                Watch::Running
                            }
                            Err(e) => Watch::Failed(e),
                        },
                    }
                };

                match watch {
                    Watch::Running => thread::sleep(WATCH_INTERVAL),
                    Watch::Cancelled => break,
                    Watch::Exited(status) => {
                        let outcome = if status.success() {
                            SpeechOutcome::Completed
                        } else {
                            SpeechOutcome::Errored(format!("{program} exited with {status}"))
                        };
                        let _ = tx.send(outcome);
                        break;
                    }
                    Watch::Failed(e) => {
                        let _ = tx.send(SpeechOutcome::Errored(format!(
                            "failed to wait for {program}: {e}"
                        )));
                        break;
                    }
                }
            }
        });

        rx
    }

    fn cancel(&mut self) {
        if let Some(slot) = self.current.take() {
            let mut guard = lock(&slot);
            if let Some(mut child) = guard.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}
