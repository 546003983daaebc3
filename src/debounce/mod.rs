//! Debounced query pipe.
//!
//! [`Debouncer`] is the timer primitive: `push` arms (or re-arms) it with the
//! latest value, `poll` fires once the input has been silent for the full
//! delay, `cancel` voids it. It never reads the clock itself, which keeps it
//! deterministic under test.
//!
//! [`DebouncedPipe`] runs a `Debouncer` on a tokio task for callers that work
//! with channels: raw values go in, committed values come out. Closing the
//! pipe before the delay elapses emits nothing.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct Armed<T> {
    value: T,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    armed: Option<Armed<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, armed: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm with `value`, replacing any pending value and restarting the delay
    pub fn push(&mut self, value: T, now: Instant) {
        self.armed = Some(Armed { value, deadline: now + self.delay });
    }

    /// When the pending value will fire, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|armed| armed.deadline)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Take the pending value if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.armed.as_ref().is_some_and(|armed| now >= armed.deadline);
        if due { self.armed.take().map(|armed| armed.value) } else { None }
    }

    /// Drop the pending value without emitting it. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }
}

/// Channel-driven debouncer running on its own task
pub struct DebouncedPipe<T> {
    input: Option<mpsc::UnboundedSender<T>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> DebouncedPipe<T> {
    /// Start the pipe. Committed values arrive on the returned receiver.
    pub fn spawn(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_pipe(delay, input_rx, output_tx, cancel.clone()));
        (Self { input: Some(input_tx), cancel, task: Some(task) }, output_rx)
    }

    /// Feed one raw value. Returns false once the pipe has been closed.
    pub fn send(&self, value: T) -> bool {
        !self.cancel.is_cancelled()
            && self.input.as_ref().is_some_and(|input| input.send(value).is_ok())
    }

    /// End of input: the pending value, if any, still fires once its delay
    /// elapses, then the pipe stops
    pub async fn finish(mut self) {
        self.input.take();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Tear the pipe down, voiding any pending value
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<T> Drop for DebouncedPipe<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_pipe<T>(
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
) {
    let mut debouncer = Debouncer::new(delay);
    let mut input_open = true;

    loop {
        let deadline = debouncer.deadline();
        if !input_open && deadline.is_none() {
            break;
        }
        let wake_at = deadline.unwrap_or_else(Instant::now);

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                if debouncer.cancel() {
                    debug!("debounce pipe closed with a pending value");
                }
                break;
            }

            received = input.recv(), if input_open => match received {
                Some(value) => debouncer.push(value, Instant::now()),
                None => input_open = false,
            },

            _ = sleep_until(wake_at), if deadline.is_some() => {
                if let Some(value) = debouncer.poll(Instant::now())
                    && output.send(value).is_err()
                {
                    break;
                }
            }
        }
    }
}
