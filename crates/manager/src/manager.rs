use crate::config::PlaygroundConfig;
use crate::parser::{ParseCache, PromptParser};
use crate::sink::PlaygroundSink;
use crate::store::{self, Store};
use crate::{ManagerError, Result};
use log::{debug, info, warn};
use playground_protocol::{
    ClientMessage, EditorEvent, EditorFile, ParsedPrompt, PlaygroundMap, PlaygroundState,
    PromptRef, RevealTarget,
};
use playground_resolver::{
    reconcile_map, resolve_state, sanitize_pin, IdGenerator, MatchContext, StateInput, UuidIds,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot, watch};

/// Millisecond clock used to stamp `updated_at`.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// External collaborators of a playground session.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn Store>,
    pub parser: Arc<dyn PromptParser>,
    pub sink: Arc<dyn PlaygroundSink>,
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Clock,
}

impl Collaborators {
    pub fn new(
        store: Arc<dyn Store>,
        parser: Arc<dyn PromptParser>,
        sink: Arc<dyn PlaygroundSink>,
    ) -> Self {
        Self {
            store,
            parser,
            sink,
            ids: Arc::new(UuidIds),
            clock: Arc::new(unix_ms_now),
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

#[must_use]
pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

enum Task {
    Editor(EditorEvent),
    Pin(PromptRef),
    Unpin,
    PromptChange(Option<PromptRef>),
    Broadcast,
    Snapshot(oneshot::Sender<PlaygroundState>),
    Shutdown,
}

/// Handle to a running playground session.
///
/// Every call enqueues a task; tasks run one at a time in submission order on a single
/// tokio task, after the persisted map and pin have been loaded.
#[derive(Clone)]
pub struct PlaygroundManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    task_tx: mpsc::Sender<Task>,
    state_tx: watch::Sender<PlaygroundState>,
}

impl PlaygroundManager {
    /// Spawns the session loop. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(collaborators: Collaborators, config: PlaygroundConfig) -> Self {
        let (task_tx, task_rx) = mpsc::channel(config.queue_capacity);
        let (state_tx, _) = watch::channel(PlaygroundState::default());

        let session = Session::new(collaborators, config, state_tx.clone());
        tokio::spawn(session.run(task_rx));

        Self {
            inner: Arc::new(ManagerInner { task_tx, state_tx }),
        }
    }

    async fn enqueue(&self, task: Task) -> Result<()> {
        self.inner
            .task_tx
            .send(task)
            .await
            .map_err(|_| ManagerError::QueueClosed)
    }

    pub async fn handle_event(&self, event: EditorEvent) -> Result<()> {
        self.enqueue(Task::Editor(event)).await
    }

    pub async fn active_changed(&self, file: Option<EditorFile>) -> Result<()> {
        self.handle_event(EditorEvent::ActiveChanged(file)).await
    }

    pub async fn cursor_updated(&self, file: EditorFile) -> Result<()> {
        self.handle_event(EditorEvent::CursorUpdated(file)).await
    }

    pub async fn file_saved(&self, file: EditorFile) -> Result<()> {
        self.handle_event(EditorEvent::FileSaved(file)).await
    }

    pub async fn file_changed(&self, file: EditorFile) -> Result<()> {
        self.handle_event(EditorEvent::FileChanged(file)).await
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<()> {
        let task = match message {
            ClientMessage::RequestState => Task::Broadcast,
            ClientMessage::Pin(reference) => Task::Pin(reference),
            ClientMessage::Unpin => Task::Unpin,
            ClientMessage::PromptChange(reference) => Task::PromptChange(reference),
        };
        self.enqueue(task).await
    }

    pub async fn pin(&self, reference: PromptRef) -> Result<()> {
        self.enqueue(Task::Pin(reference)).await
    }

    pub async fn unpin(&self) -> Result<()> {
        self.enqueue(Task::Unpin).await
    }

    pub async fn prompt_change(&self, reference: Option<PromptRef>) -> Result<()> {
        self.enqueue(Task::PromptChange(reference)).await
    }

    /// State after every task queued before this call has run.
    pub async fn request_state(&self) -> Result<PlaygroundState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(Task::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| ManagerError::QueueClosed)
    }

    /// Latest published state without waiting for the queue.
    #[must_use]
    pub fn state_snapshot(&self) -> PlaygroundState {
        self.inner.state_tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<PlaygroundState> {
        self.inner.state_tx.subscribe()
    }

    /// Stops the loop once the tasks queued so far have run.
    pub async fn shutdown(&self) -> Result<()> {
        self.enqueue(Task::Shutdown).await
    }
}

impl Drop for PlaygroundManager {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.task_tx.try_send(Task::Shutdown);
        }
    }
}

struct Session {
    collaborators: Collaborators,
    config: PlaygroundConfig,
    state_tx: watch::Sender<PlaygroundState>,
    map: PlaygroundMap,
    pin: Option<PromptRef>,
    active: Option<EditorFile>,
    cache: ParseCache,
    state: PlaygroundState,
}

impl Session {
    fn new(
        collaborators: Collaborators,
        config: PlaygroundConfig,
        state_tx: watch::Sender<PlaygroundState>,
    ) -> Self {
        let now = (collaborators.clock)();
        let cache = ParseCache::new(config.parse_cache_capacity);
        Self {
            collaborators,
            config,
            state_tx,
            map: PlaygroundMap::empty(now),
            pin: None,
            active: None,
            cache,
            state: PlaygroundState::default(),
        }
    }

    async fn run(mut self, mut task_rx: mpsc::Receiver<Task>) {
        self.hydrate().await;

        while let Some(task) = task_rx.recv().await {
            match task {
                Task::Shutdown => break,
                Task::Snapshot(reply) => {
                    let _ = reply.send(self.state.clone());
                }
                Task::Broadcast => self.broadcast().await,
                Task::Editor(event) => self.on_editor_event(event).await,
                Task::Pin(reference) => self.on_pin(reference).await,
                Task::Unpin => self.on_unpin().await,
                Task::PromptChange(reference) => self.on_prompt_change(reference).await,
            }
        }

        debug!("Playground session stopped");
    }

    async fn hydrate(&mut self) {
        let store = self.collaborators.store.as_ref();
        let scope = self.config.scope;

        match store::load::<PlaygroundMap>(store, scope, &self.config.map_key).await {
            Ok(Some(map)) => {
                info!("Loaded playground map with {} files", map.files.len());
                self.map = map;
            }
            Ok(None) => debug!("No stored playground map"),
            Err(err) => warn!("Failed to load playground map, starting empty: {err}"),
        }

        match store::load::<PromptRef>(store, scope, &self.config.pin_key).await {
            Ok(pin) => self.pin = pin,
            Err(err) => warn!("Failed to load playground pin: {err}"),
        }

        self.refresh().await;
    }

    async fn on_editor_event(&mut self, event: EditorEvent) {
        debug!(
            "Playground event {} ({})",
            event.name(),
            event.file().map_or("<none>", |file| file.path.as_str())
        );
        self.active = match event {
            EditorEvent::ActiveChanged(file) => file,
            EditorEvent::CursorUpdated(file)
            | EditorEvent::FileSaved(file)
            | EditorEvent::FileChanged(file) => Some(file),
        };
        self.refresh().await;
        self.broadcast().await;
    }

    async fn on_pin(&mut self, reference: PromptRef) {
        debug!(
            "Pinning prompt {} in file {}",
            reference.prompt_id, reference.file_id
        );
        if self.map.pair(&reference).is_some() {
            self.pin = Some(reference);
            self.save_pin().await;
        } else {
            debug!("Pin to unknown prompt {} ignored", reference.prompt_id);
        }
        self.refresh().await;
        self.broadcast().await;
    }

    async fn on_unpin(&mut self) {
        debug!("Unpinning prompt");
        self.pin = None;
        self.save_pin().await;
        self.refresh().await;
        self.broadcast().await;
    }

    async fn on_prompt_change(&mut self, reference: Option<PromptRef>) {
        match reference {
            None => {
                if self.pin.take().is_some() {
                    debug!("Prompt change cleared the pin");
                    self.save_pin().await;
                }
            }
            Some(reference)
                if self.live_pin().is_some() && self.map.pair(&reference).is_some() =>
            {
                debug!("Prompt change moved the pin to {}", reference.prompt_id);
                self.pin = Some(reference);
                self.save_pin().await;
            }
            Some(reference) => match self.map.pair(&reference) {
                Some((file, prompt)) => {
                    let target = RevealTarget {
                        path: file.path.clone(),
                        span: prompt.span,
                        prompt: reference,
                    };
                    self.collaborators.sink.reveal(target).await;
                }
                None => debug!(
                    "Prompt change to unknown prompt {} ignored",
                    reference.prompt_id
                ),
            },
        }
        self.refresh().await;
        self.broadcast().await;
    }

    /// Reparses the active file, folds it into the map and recomputes the state.
    async fn refresh(&mut self) {
        let timestamp = (self.collaborators.clock)();
        let mut parsed: Arc<[ParsedPrompt]> = Arc::from(Vec::new());
        let mut parse_error = None;

        if let Some(file) = &self.active {
            let outcome = self
                .cache
                .parse(self.collaborators.parser.as_ref(), file);
            parse_error = outcome.error().map(str::to_string);

            if outcome.is_usable() {
                let ctx = MatchContext::new(timestamp, self.collaborators.ids.as_ref())
                    .with_thresholds(self.config.thresholds);
                let reconciled = reconcile_map(&self.map, &file.path, &outcome.prompts, &ctx);
                debug!(
                    "Reconciled {}: {:?} (path score {:?}, distance score {:?})",
                    file.path, reconciled.outcome, reconciled.path_score, reconciled.distance_score
                );
                let next = match reconciled.map {
                    Cow::Owned(next) => Some(next),
                    Cow::Borrowed(_) => None,
                };
                if let Some(next) = next {
                    self.map = next;
                    self.save_map().await;
                }
            } else {
                debug!("Skipping reconciliation of {}: no usable parse", file.path);
            }
            parsed = outcome.prompts;
        }

        self.drop_dangling_pin().await;

        self.state = resolve_state(
            &StateInput::new(&self.map)
                .with_file(self.active.as_ref(), &parsed)
                .with_pin(self.pin.as_ref())
                .with_parse_error(parse_error.as_deref())
                .with_preview_length(self.config.preview_length),
        );
        self.state_tx.send_replace(self.state.clone());
    }

    fn live_pin(&self) -> Option<PromptRef> {
        sanitize_pin(&self.map, self.pin.as_ref())
    }

    /// A pin whose prompt left the map is forgotten, in memory and in the store.
    async fn drop_dangling_pin(&mut self) {
        if self.pin.is_some() && self.live_pin().is_none() {
            debug!("Dropping pin to a prompt that is no longer tracked");
            self.pin = None;
            self.save_pin().await;
        }
    }

    async fn broadcast(&self) {
        self.collaborators.sink.send_state(&self.state).await;
    }

    async fn save_map(&self) {
        if let Err(err) = store::save(
            self.collaborators.store.as_ref(),
            self.config.scope,
            &self.config.map_key,
            &self.map,
        )
        .await
        {
            warn!("Failed to persist playground map: {err}");
        }
    }

    async fn save_pin(&self) {
        let store = self.collaborators.store.as_ref();
        let result = match &self.pin {
            Some(pin) => store::save(store, self.config.scope, &self.config.pin_key, pin).await,
            None => store.clear(self.config.scope, &self.config.pin_key).await,
        };
        if let Err(err) = result {
            warn!("Failed to persist playground pin: {err}");
        }
    }
}
