use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use exam_core::model::{Catalog, Category, QuestionId, SessionReport};

use super::clock::SessionClock;
use super::controller::{SessionController, Transition};
use super::results::ResultsSink;
use super::snapshot::{Phase, SessionSnapshot};
use crate::Clock;
use crate::catalog::CatalogLoader;
use crate::config::ExamConfig;
use crate::error::{LoadError, SessionError};

/// Input accepted from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SelectAnswer { question: QuestionId, choice: String },
    RequestSubmit,
    ConfirmSubmit,
    CancelSubmit,
    RetryLoad,
    Shutdown,
}

/// Everything that can reach the controller, in arrival order.
#[derive(Debug)]
pub(super) enum RuntimeEvent {
    Command(SessionCommand),
    /// `ack` receives the generation of the new session.
    Start {
        category: Category,
        ack: oneshot::Sender<u64>,
    },
    Tick {
        generation: u64,
    },
    CatalogLoaded {
        generation: u64,
        result: Result<Catalog, LoadError>,
    },
}

/// Serializes all session events through one queue and owns the async side
/// effects: the fetch task and the timer task.
///
/// Only [`SessionHandle`]s keep the queue open. Spawned tasks hold weak
/// senders, so dropping every handle stops the runtime.
pub struct SessionRuntime {
    controller: SessionController,
    loader: CatalogLoader,
    tick_period: Duration,
    results: Arc<dyn ResultsSink>,
    events: WeakUnboundedSender<RuntimeEvent>,
    inbox: UnboundedReceiver<RuntimeEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
    clock: SessionClock,
    fetch: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    /// Spawn a runtime on the current tokio runtime.
    pub fn spawn(
        loader: CatalogLoader,
        config: &ExamConfig,
        results: Arc<dyn ResultsSink>,
    ) -> (SessionHandle, JoinHandle<()>) {
        Self::spawn_with_clock(loader, config, results, Clock::default_clock())
    }

    /// Like [`SessionRuntime::spawn`], stamping reports with `clock`.
    pub fn spawn_with_clock(
        loader: CatalogLoader,
        config: &ExamConfig,
        results: Arc<dyn ResultsSink>,
        clock: Clock,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (sender, inbox) = mpsc::unbounded_channel();
        let (snapshots, receiver) = watch::channel(SessionSnapshot::idle());

        let runtime = Self {
            controller: SessionController::new(clock, config.duration_secs),
            loader,
            tick_period: config.tick_period,
            results,
            events: sender.downgrade(),
            inbox,
            snapshots,
            clock: SessionClock::default(),
            fetch: None,
        };
        let task = tokio::spawn(runtime.run());

        let handle = SessionHandle {
            events: sender,
            snapshots: receiver,
        };
        (handle, task)
    }

    async fn run(mut self) {
        while let Some(event) = self.inbox.recv().await {
            if matches!(event, RuntimeEvent::Command(SessionCommand::Shutdown)) {
                break;
            }
            let transition = self.handle(event);
            if !transition.is_applied() {
                debug!(generation = self.controller.generation(), "event ignored");
            }
            self.sync_clock();
            if let Transition::Ended(report) = &transition {
                self.results.deliver(report);
            }
            if transition.is_applied() {
                self.snapshots.send_replace(self.controller.snapshot());
            }
        }

        self.clock.stop();
        self.cancel_fetch();
        debug!("session runtime stopped");
    }

    fn handle(&mut self, event: RuntimeEvent) -> Transition {
        match event {
            RuntimeEvent::Command(command) => self.command(command),
            RuntimeEvent::Start { category, ack } => {
                let generation = self.controller.start(category.clone());
                self.spawn_fetch(generation, category);
                // The caller may have given up waiting.
                let _ = ack.send(generation);
                Transition::Applied
            }
            RuntimeEvent::Tick { generation } => self.controller.tick(generation),
            RuntimeEvent::CatalogLoaded { generation, result } => {
                if generation == self.controller.generation() {
                    self.fetch = None;
                }
                self.controller.catalog_loaded(generation, result)
            }
        }
    }

    fn command(&mut self, command: SessionCommand) -> Transition {
        match command {
            SessionCommand::RetryLoad => match self.controller.retry_load() {
                Some((generation, category)) => {
                    self.spawn_fetch(generation, category);
                    Transition::Applied
                }
                None => Transition::Ignored,
            },
            SessionCommand::SelectAnswer { question, choice } => {
                self.controller.select_answer(&question, &choice)
            }
            SessionCommand::RequestSubmit => self.controller.request_submit(),
            SessionCommand::ConfirmSubmit => self.controller.confirm_submit(),
            SessionCommand::CancelSubmit => self.controller.cancel_submit(),
            SessionCommand::Shutdown => Transition::Ignored,
        }
    }

    fn spawn_fetch(&mut self, generation: u64, category: Category) {
        self.cancel_fetch();
        let loader = self.loader.clone();
        let events = self.events.clone();

        self.fetch = Some(tokio::spawn(async move {
            let result = loader.load(&category).await;
            if let Some(events) = events.upgrade() {
                let _ = events.send(RuntimeEvent::CatalogLoaded { generation, result });
            }
        }));
    }

    fn cancel_fetch(&mut self) {
        if let Some(task) = self.fetch.take() {
            task.abort();
        }
    }

    /// Keep exactly one timer alive while the controller is active.
    fn sync_clock(&mut self) {
        let generation = self.controller.generation();
        if !self.controller.clock_running() {
            self.clock.stop();
        } else if !self.clock.is_running_for(generation) {
            self.clock
                .start(generation, self.tick_period, self.events.clone());
        }
    }
}

/// Cloneable front door to a [`SessionRuntime`].
///
/// Commands other than `start` are fire-and-forget; state is observed through
/// snapshots.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: UnboundedSender<RuntimeEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has stopped.
    pub fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.events
            .send(RuntimeEvent::Command(command))
            .map_err(|_| SessionError::Closed)
    }

    /// Begin a new session for `category`, abandoning any current one.
    ///
    /// Resolves once the runtime has taken the request, with the generation
    /// that identifies the new session in snapshots.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has stopped.
    pub async fn start(&self, category: Category) -> Result<u64, SessionError> {
        let (ack, generation) = oneshot::channel();
        self.events
            .send(RuntimeEvent::Start { category, ack })
            .map_err(|_| SessionError::Closed)?;
        generation.await.map_err(|_| SessionError::Closed)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has stopped.
    pub fn select_answer(
        &self,
        question: QuestionId,
        choice: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::SelectAnswer {
            question,
            choice: choice.into(),
        })
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has stopped.
    pub fn request_submit(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::RequestSubmit)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has stopped.
    pub fn confirm_submit(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::ConfirmSubmit)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has stopped.
    pub fn cancel_submit(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::CancelSubmit)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has stopped.
    pub fn retry_load(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::RetryLoad)
    }

    /// Stop the runtime after the commands already queued.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime has already stopped.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown)
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `ready`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime stops first.
    pub async fn wait_until(
        &self,
        ready: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(ready)
            .await
            .map_err(|_| SessionError::Closed)?
            .clone();
        Ok(snapshot)
    }

    /// Wait for the session begun as `generation` to end and return its
    /// report.
    ///
    /// Reports of earlier sessions are skipped. A retry after a failed load
    /// moves to a later generation and still counts.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runtime stops first.
    pub async fn wait_for_end(&self, generation: u64) -> Result<SessionReport, SessionError> {
        let snapshot = self
            .wait_until(|s| s.phase == Phase::Ended && s.generation >= generation)
            .await?;
        snapshot.report.ok_or(SessionError::Closed)
    }
}
