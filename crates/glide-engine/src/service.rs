//! Serialized async front-end for a [`Controller`].

use glide_ids::{AnimationHandle, WindowId};
use glide_world::{EventCursor, WorldEvent};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, trace, warn};

use crate::{Controller, Error, Outcome, Result, Slot};

/// Work items processed by the controller task, strictly in arrival order.
enum Command {
    /// A world event.
    Event {
        /// The event.
        event: WorldEvent,
        /// Optional reply channel for the outcomes.
        reply: Option<oneshot::Sender<Vec<Outcome>>>,
    },
    /// An engine completion.
    Completed {
        /// Finished handle.
        handle: AnimationHandle,
        /// Optional reply channel for the outcome.
        reply: Option<oneshot::Sender<Outcome>>,
    },
    /// Registry lookup.
    Handle {
        /// Effect name.
        effect: String,
        /// Window.
        window: WindowId,
        /// Slot.
        slot: Slot,
        /// Reply channel.
        reply: oneshot::Sender<Option<AnimationHandle>>,
    },
    /// Drop registry entries of windows the world no longer knows.
    Reconcile,
    /// Live handle count.
    LiveCount {
        /// Reply channel.
        reply: oneshot::Sender<usize>,
    },
    /// Stop the task and hand the controller back.
    Shutdown {
        /// Reply channel.
        reply: oneshot::Sender<Controller>,
    },
}

/// Owns the task that runs a [`Controller`].
pub struct ControllerService;

impl ControllerService {
    /// Move `controller` into a tokio task and return a handle feeding it.
    ///
    /// Must be called from within a tokio runtime. The task ends when every
    /// handle is dropped or [`ControllerHandle::shutdown`] is called.
    pub fn spawn(controller: Controller) -> ControllerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(controller, rx));
        ControllerHandle { tx }
    }
}

/// Task body: process commands until the queue closes or a shutdown arrives.
async fn run(mut controller: Controller, mut rx: mpsc::UnboundedReceiver<Command>) {
    debug!("controller service started");
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Event { event, reply } => {
                let outcomes = controller.handle_event(&event);
                if let Some(reply) = reply {
                    let _ignored = reply.send(outcomes);
                }
            }
            Command::Completed { handle, reply } => {
                let outcome = controller.on_completed(handle);
                if let Some(reply) = reply {
                    let _ignored = reply.send(outcome);
                }
            }
            Command::Handle {
                effect,
                window,
                slot,
                reply,
            } => {
                let _ignored = reply.send(controller.handle(&effect, window, &slot));
            }
            Command::Reconcile => {
                controller.reconcile();
            }
            Command::LiveCount { reply } => {
                let _ignored = reply.send(controller.live_count());
            }
            Command::Shutdown { reply } => {
                debug!("controller service shutting down");
                let _ignored = reply.send(controller);
                return;
            }
        }
    }
    debug!("controller service queue closed");
}

/// Cloneable sender side of a running [`ControllerService`].
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    /// Command queue.
    tx: mpsc::UnboundedSender<Command>,
}

impl ControllerHandle {
    /// Enqueue a command.
    fn send(&self, cmd: Command) -> Result<()> {
        self.tx.send(cmd).map_err(|_| Error::ServiceClosed)
    }

    /// Enqueue a world event without waiting for it to be processed.
    pub fn send_event(&self, event: WorldEvent) -> Result<()> {
        self.send(Command::Event { event, reply: None })
    }

    /// Process a world event and return its outcomes.
    pub async fn dispatch(&self, event: WorldEvent) -> Result<Vec<Outcome>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Event {
            event,
            reply: Some(reply),
        })?;
        rx.await.map_err(|_| Error::ServiceClosed)
    }

    /// Enqueue an engine completion without waiting.
    pub fn send_completed(&self, handle: AnimationHandle) -> Result<()> {
        self.send(Command::Completed {
            handle,
            reply: None,
        })
    }

    /// Route an engine completion and return its outcome.
    pub async fn completed(&self, handle: AnimationHandle) -> Result<Outcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Completed {
            handle,
            reply: Some(reply),
        })?;
        rx.await.map_err(|_| Error::ServiceClosed)
    }

    /// Live handle of `effect` for `(window, slot)`, observed after every
    /// previously enqueued command.
    pub async fn handle(
        &self,
        effect: &str,
        window: WindowId,
        slot: Slot,
    ) -> Result<Option<AnimationHandle>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Handle {
            effect: effect.to_string(),
            window,
            slot,
            reply,
        })?;
        rx.await.map_err(|_| Error::ServiceClosed)
    }

    /// Number of live handles, observed after every previously enqueued command.
    pub async fn live_count(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::LiveCount { reply })?;
        rx.await.map_err(|_| Error::ServiceClosed)
    }

    /// Stop the task and take the controller back.
    pub async fn shutdown(&self) -> Result<Controller> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply })?;
        rx.await.map_err(|_| Error::ServiceClosed)
    }

    /// Forward every event from `cursor` into the queue until the
    /// subscription or the service closes.
    pub fn pump(&self, mut cursor: EventCursor) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut lost = cursor.lost_count;
            while let Some(event) = cursor.next().await {
                trace!(kind = ?event.kind(), "pump forwarding event");
                if tx.send(Command::Event { event, reply: None }).is_err() {
                    break;
                }
                if cursor.lost_count > lost {
                    warn!(
                        lost = cursor.lost_count - lost,
                        "world events dropped, requesting reconcile"
                    );
                    lost = cursor.lost_count;
                    if tx.send(Command::Reconcile).is_err() {
                        break;
                    }
                }
            }
            debug!(lost = cursor.lost_count, "event pump stopped");
        })
    }
}
