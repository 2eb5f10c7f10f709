//! Projector Actor: Dedicated thread that keeps a projection up to date.
//!
//! The actor owns a [`FilteredProjector`]. Producers never talk to it
//! directly: a listener on the recorder pushes a unit "wake" into a
//! one-slot channel, so any burst of notifications collapses into a single
//! pending update and producers never block. Updates run at most once per
//! frame interval and every non-empty [`Delta`] is sent downstream.

use super::messages::ProjectorCommand;
use crate::error::{Error, Result};
use crate::projection::{Delta, FilteredProjector};
use crate::record::Record;
use crate::store::{ChangeNotifier, ListenerId, Recorder};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for the projector actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Minimum time between two updates.
    pub frame_interval: Duration,
    /// How long the loop waits for work before re-checking shutdown.
    pub poll_timeout: Duration,
    /// Name of the actor thread.
    pub thread_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            poll_timeout: Duration::from_millis(50),
            thread_name: "livelog-projector".to_string(),
        }
    }
}

/// Clonable handle for sending commands to a running actor.
pub struct ProjectorHandle<T, L> {
    commands: Sender<ProjectorCommand<T, L>>,
}

impl<T, L> Clone for ProjectorHandle<T, L> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<T, L> fmt::Debug for ProjectorHandle<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectorHandle")
            .field("queued", &self.commands.len())
            .finish()
    }
}

impl<T, L> ProjectorHandle<T, L> {
    /// Send a raw command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActorClosed`] if the actor thread has stopped.
    pub fn send(&self, command: ProjectorCommand<T, L>) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::ActorClosed)
    }

    /// Show only lines whose text satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActorClosed`] if the actor thread has stopped.
    pub fn set_filter<P>(&self, predicate: P) -> Result<()>
    where
        P: Fn(&str) -> bool + Send + 'static,
    {
        self.send(ProjectorCommand::SetFilter(Box::new(predicate)))
    }

    /// Show every line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActorClosed`] if the actor thread has stopped.
    pub fn clear_filter(&self) -> Result<()> {
        self.send(ProjectorCommand::ClearFilter)
    }

    /// Replace the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActorClosed`] if the actor thread has stopped.
    pub fn set_mapping<F>(&self, map: F) -> Result<()>
    where
        F: Fn(&T) -> Option<Record<L>> + Send + 'static,
    {
        self.send(ProjectorCommand::SetMapping(Box::new(map)))
    }

    /// Force an update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActorClosed`] if the actor thread has stopped.
    pub fn refresh(&self) -> Result<()> {
        self.send(ProjectorCommand::Refresh)
    }
}

/// Projector actor running on its own thread.
pub struct ProjectorActor<T, L> {
    /// Handle to the actor thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Command sender.
    commands: ProjectorHandle<T, L>,
    /// Notifier the wake listener is registered with.
    notifier: Arc<ChangeNotifier>,
    /// Wake listener id.
    listener: ListenerId,
}

impl<T, L> ProjectorActor<T, L>
where
    T: Send + Sync + 'static,
    L: Send + Sync + 'static,
{
    /// Spawn the actor.
    ///
    /// `projector` should project the store of `recorder`: the actor wakes
    /// on the recorder's notifications. Deltas are sent on `deltas`; the
    /// actor stops when that receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the OS refuses to create the thread.
    pub fn spawn(
        recorder: &Recorder<T>,
        projector: FilteredProjector<T, L>,
        deltas: Sender<Delta<L>>,
        config: RenderConfig,
    ) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        // One slot: any number of notifications coalesce into one wake
        let (wake_tx, wake_rx) = bounded::<()>(1);
        let (command_tx, command_rx) = unbounded();

        let name = config.thread_name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                Self::run_loop(
                    projector,
                    &wake_rx,
                    &command_rx,
                    &deltas,
                    &shutdown_clone,
                    &config,
                );
            })
            .map_err(|source| Error::Spawn { name, source })?;

        let listener = recorder.subscribe(move || {
            let _ = wake_tx.try_send(());
        });
        // Content recorded before the listener existed
        let _ = command_tx.send(ProjectorCommand::Refresh);
        debug!(?listener, "projector actor spawned");

        Ok(Self {
            handle: Some(handle),
            shutdown,
            commands: ProjectorHandle {
                commands: command_tx,
            },
            notifier: Arc::clone(recorder.notifier()),
            listener,
        })
    }

    /// Main actor loop.
    fn run_loop(
        mut projector: FilteredProjector<T, L>,
        wake_rx: &Receiver<()>,
        command_rx: &Receiver<ProjectorCommand<T, L>>,
        deltas: &Sender<Delta<L>>,
        shutdown: &Arc<AtomicBool>,
        config: &RenderConfig,
    ) {
        let mut dirty = false;
        let mut last_frame: Option<Instant> = None;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let next_frame = last_frame.map(|at| at + config.frame_interval);
            let timeout = match next_frame {
                Some(at) if dirty => at.saturating_duration_since(Instant::now()),
                _ if dirty => Duration::ZERO,
                _ => config.poll_timeout,
            };

            select! {
                recv(wake_rx) -> wake => {
                    if wake.is_err() {
                        break;
                    }
                    dirty = true;
                }
                recv(command_rx) -> command => match command {
                    Ok(ProjectorCommand::SetFilter(predicate)) => {
                        projector.set_filter(predicate);
                        dirty = true;
                    }
                    Ok(ProjectorCommand::ClearFilter) => {
                        projector.clear_filter();
                        dirty = true;
                    }
                    Ok(ProjectorCommand::SetMapping(map)) => {
                        projector.set_mapping(map);
                        dirty = true;
                    }
                    Ok(ProjectorCommand::Refresh) => dirty = true,
                    Ok(ProjectorCommand::Shutdown) | Err(_) => break,
                },
                default(timeout) => {}
            }

            let due = next_frame.map_or(true, |at| Instant::now() >= at);
            if dirty && due {
                dirty = false;
                last_frame = Some(Instant::now());
                let delta = projector.update();
                if !delta.is_empty() && deltas.send(delta).is_err() {
                    debug!("delta receiver dropped");
                    break;
                }
            }
        }

        debug!(lines = projector.document().line_count(), "projector actor stopped");
    }
}

impl<T, L> ProjectorActor<T, L> {
    /// A handle for sending commands from other threads.
    pub fn handle(&self) -> ProjectorHandle<T, L> {
        self.commands.clone()
    }

    /// Whether the actor thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the actor to stop and detach it from the recorder.
    pub fn shutdown(&self) {
        self.notifier.unsubscribe(self.listener);
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.commands.send(ProjectorCommand::Shutdown);
    }

    /// Stop the actor and wait for its thread to finish.
    pub fn join(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("projector thread panicked");
            }
        }
    }
}

impl<T, L> Drop for ProjectorActor<T, L> {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl<T, L> fmt::Debug for ProjectorActor<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectorActor")
            .field("running", &self.is_running())
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}
