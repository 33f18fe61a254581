//! Tokio driver for a round
//!
//! [`RoundHandle::spawn`] moves a [`RoundController`] into its own task.
//! Commands arrive over a channel; alarms the controller schedules are
//! served by a single timer slot, and scheduling a new alarm aborts the one
//! still pending. An alarm that had already fired before the abort is
//! dropped by the controller's token checks.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
};

use crate::{AlarmMessage, game::RoundController, quiz::bank::QuestionSource, session::Tunnel};

/// Input accepted by a running round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a round, or a new one after the last finished
    Start,
    /// Submit the local player's answer
    Answer(usize),
    /// Stop the task and hand the controller back
    Shutdown,
}

/// At most one pending alarm
struct TimerSlot {
    alarms: mpsc::UnboundedSender<AlarmMessage>,
    pending: Option<JoinHandle<()>>,
}

impl TimerSlot {
    fn new(alarms: mpsc::UnboundedSender<AlarmMessage>) -> Self {
        Self {
            alarms,
            pending: None,
        }
    }

    fn schedule(&mut self, alarm: AlarmMessage, delay: Duration) {
        self.clear();

        let alarms = self.alarms.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = alarms.send(alarm);
        }));
    }

    fn clear(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Handle to a round running on its own task
#[derive(Debug)]
pub struct RoundHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<RoundController>,
}

impl RoundHandle {
    /// Spawns the task driving `controller`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<Q, T>(controller: RoundController, source: Q, tunnel: T) -> Self
    where
        Q: QuestionSource + Send + 'static,
        T: Tunnel + Send + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(controller, source, tunnel, receiver));

        Self { commands, task }
    }

    /// Sends a command
    ///
    /// # Returns
    ///
    /// `false` if the task has already stopped
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Starts a round
    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    /// Submits the local player's answer
    pub fn answer(&self, index: usize) -> bool {
        self.send(Command::Answer(index))
    }

    /// Stops the task and returns the controller in its final state
    ///
    /// # Errors
    ///
    /// Returns the join error if the task panicked or was cancelled.
    pub async fn shutdown(self) -> Result<RoundController, JoinError> {
        let _ = self.commands.send(Command::Shutdown);
        self.task.await
    }
}

async fn run<Q: QuestionSource, T: Tunnel>(
    mut controller: RoundController,
    source: Q,
    tunnel: T,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> RoundController {
    let (alarm_sender, mut alarms) = mpsc::unbounded_channel();
    let mut timer = TimerSlot::new(alarm_sender);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Start) => {
                    if let Err(error) =
                        controller.start(&source, |alarm, delay| timer.schedule(alarm, delay), &tunnel)
                    {
                        tracing::warn!(%error, "round not started");
                    }
                }
                Some(Command::Answer(index)) => {
                    controller.submit_answer(index, |alarm, delay| timer.schedule(alarm, delay), &tunnel);
                }
                Some(Command::Shutdown) | None => break,
            },
            Some(alarm) = alarms.recv() => {
                controller.receive_alarm(&alarm, |alarm, delay| timer.schedule(alarm, delay), &tunnel);
            }
        }
    }

    timer.clear();
    tracing::debug!(phase = ?controller.phase(), "round task stopped");
    controller
}
