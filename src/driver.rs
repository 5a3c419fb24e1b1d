//! Event loop that runs a [`CaptureMachine`].
//!
//! One tokio task owns the machine and handles events one at a time. Effects
//! that need to wait (camera acquisition, submission) run as their own tasks
//! and post an epoch-tagged completion back through a weak sender, so they
//! never keep the loop alive. A completion that arrives after the loop has
//! stopped is dropped, and dropping a camera session releases it.
//!
//! After every event the loop publishes a [`CaptureSnapshot`] on a `watch`
//! channel and forwards notifications on their own channel. Closing the
//! handle drains the queue, tears the machine down and ends the loop.

use crate::error::ErrorInfo;
use crate::machine::{CaptureMachine, CaptureSnapshot, Effect, Event, Intent};
use crate::submit::PredictionService;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("capture loop has stopped")]
pub struct LoopClosed;

/// Client side of a running capture loop.
pub struct CaptureHandle {
    events: mpsc::UnboundedSender<Event>,
    snapshots: watch::Receiver<CaptureSnapshot>,
    notifications: mpsc::UnboundedReceiver<ErrorInfo>,
    task: JoinHandle<()>,
}

/// Start a capture loop on the current tokio runtime.
pub fn spawn(machine: CaptureMachine, service: Arc<dyn PredictionService>) -> CaptureHandle {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());
    let (notify_tx, notify_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run(
        machine,
        LoopContext {
            service,
            completions: events_tx.downgrade(),
            snapshots: snapshot_tx,
            notifications: notify_tx,
        },
        events_rx,
    ));

    CaptureHandle {
        events: events_tx,
        snapshots: snapshot_rx,
        notifications: notify_rx,
        task,
    }
}

impl CaptureHandle {
    pub fn send(&self, intent: Intent) -> Result<(), LoopClosed> {
        self.events.send(intent.into()).map_err(|_| LoopClosed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until a published snapshot satisfies `predicate`. The current
    /// snapshot is checked first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&CaptureSnapshot) -> bool,
    ) -> Result<CaptureSnapshot, LoopClosed> {
        self.snapshots
            .wait_for(predicate)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| LoopClosed)
    }

    pub async fn next_notification(&mut self) -> Option<ErrorInfo> {
        self.notifications.recv().await
    }

    pub fn try_notification(&mut self) -> Option<ErrorInfo> {
        self.notifications.try_recv().ok()
    }

    /// Stop accepting intents, let the loop drain and tear down, and return
    /// the final snapshot.
    pub async fn shutdown(self) -> CaptureSnapshot {
        let CaptureHandle {
            events,
            snapshots,
            task,
            ..
        } = self;
        drop(events);
        if let Err(e) = task.await {
            warn!(error = %e, "capture loop ended abnormally");
        }
        snapshots.borrow().clone()
    }
}

struct LoopContext {
    service: Arc<dyn PredictionService>,
    completions: mpsc::WeakUnboundedSender<Event>,
    snapshots: watch::Sender<CaptureSnapshot>,
    notifications: mpsc::UnboundedSender<ErrorInfo>,
}

async fn run(
    mut machine: CaptureMachine,
    ctx: LoopContext,
    mut events: mpsc::UnboundedReceiver<Event>,
) {
    debug!("capture loop started");
    while let Some(event) = events.recv().await {
        for effect in machine.handle(event) {
            execute(effect, &machine, &ctx);
        }
        ctx.snapshots.send_replace(machine.snapshot());
    }

    machine.teardown();
    ctx.snapshots.send_replace(machine.snapshot());
    debug!("capture loop stopped");
}

fn execute(effect: Effect, machine: &CaptureMachine, ctx: &LoopContext) {
    match effect {
        Effect::AcquireCamera { epoch } => {
            let camera = machine.camera().clone();
            let completions = ctx.completions.clone();
            tokio::spawn(async move {
                let result = camera.acquire().await;
                post(&completions, Event::CameraAcquired { epoch, result });
            });
        }
        Effect::Submit { epoch, image } => {
            let service = ctx.service.clone();
            let completions = ctx.completions.clone();
            tokio::spawn(async move {
                let result = service.predict(image).await;
                post(&completions, Event::SubmissionFinished { epoch, result });
            });
        }
        Effect::Notify(info) => {
            if ctx.notifications.send(info).is_err() {
                debug!("notification dropped: no listener");
            }
        }
    }
}

fn post(completions: &mpsc::WeakUnboundedSender<Event>, event: Event) {
    let Some(tx) = completions.upgrade() else {
        debug!("capture loop gone; dropping completion");
        return;
    };
    if tx.send(event).is_err() {
        debug!("capture loop gone; dropping completion");
    }
}
