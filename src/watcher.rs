// System
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Third Party
use async_trait::async_trait;
use futures::{future, stream::BoxStream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, WatchEvent, WatchParams},
    Client,
};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// Local
use crate::error::StreamError;
use crate::events::{EventKind, LifecycleEvent, PodRef};
use crate::filter::EventFilter;
use crate::notifier::Notify;

/// Default server-side timeout of a single watch session.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(60);
/// Flat delay before reopening a session after an error.
pub const BACKOFF: Duration = Duration::from_secs(5);

/// One watch session. It ends cleanly when the server-side timeout elapses.
pub type EventStream = BoxStream<'static, Result<LifecycleEvent, StreamError>>;

/// Opens watch sessions over the pods of one namespace.
#[async_trait]
pub trait PodEventSource: Send + Sync {
    async fn open(&self, session_timeout: Duration) -> Result<EventStream, StreamError>;
}

#[async_trait]
impl<T: PodEventSource + ?Sized> PodEventSource for Arc<T> {
    async fn open(&self, session_timeout: Duration) -> Result<EventStream, StreamError> {
        (**self).open(session_timeout).await
    }
}

/// Pod watch sessions against the Kubernetes API.
///
/// Each session resumes from the last resourceVersion seen so a recycled session does not
/// replay pods that were already announced. The first session starts from "0", which replays
/// existing pods as added.
pub struct KubePodEventSource {
    pods: Api<Pod>,
    resource_version: Arc<Mutex<Option<String>>>,
}

impl KubePodEventSource {
    pub fn new(client: &Client, namespace: &str) -> Self {
        Self {
            pods: Api::namespaced(client.clone(), namespace),
            resource_version: Arc::new(Mutex::new(None)),
        }
    }

    fn cursor(&self) -> String {
        lock(&self.resource_version)
            .clone()
            .unwrap_or_else(|| "0".to_string())
    }
}

fn lock(cursor: &Mutex<Option<String>>) -> std::sync::MutexGuard<'_, Option<String>> {
    cursor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn record_version(cursor: &Mutex<Option<String>>, pod: &Pod) {
    if let Some(version) = &pod.metadata.resource_version {
        *lock(cursor) = Some(version.clone());
    }
}

/// Turn a raw watch event into a lifecycle event, keeping `cursor` current.
/// Bookmarks only move the cursor and yield nothing.
fn translate(
    event: kube::Result<WatchEvent<Pod>>,
    cursor: &Mutex<Option<String>>,
) -> Option<Result<LifecycleEvent, StreamError>> {
    let (kind, pod) = match event {
        Ok(WatchEvent::Added(pod)) => (EventKind::Created, pod),
        Ok(WatchEvent::Modified(pod)) => (EventKind::Updated, pod),
        Ok(WatchEvent::Deleted(pod)) => (EventKind::Removed, pod),
        Ok(WatchEvent::Bookmark(bookmark)) => {
            *lock(cursor) = Some(bookmark.metadata.resource_version);
            return None;
        }
        Ok(WatchEvent::Error(response)) => {
            let error = StreamError::Api(response);
            if error.is_expired() {
                *lock(cursor) = None;
            }
            return Some(Err(error));
        }
        Err(e) => return Some(Err(StreamError::Transport(e))),
    };
    record_version(cursor, &pod);
    Some(Ok(LifecycleEvent::new(kind, PodRef::from(&pod))))
}

#[async_trait]
impl PodEventSource for KubePodEventSource {
    async fn open(&self, session_timeout: Duration) -> Result<EventStream, StreamError> {
        let version = self.cursor();
        let params = WatchParams::default().timeout(session_timeout.as_secs() as u32);
        debug!("Opening pod watch from resourceVersion {}", version);
        let stream = match self.pods.watch(&params, &version).await {
            Ok(stream) => stream,
            Err(e) => {
                let error = StreamError::Connect(e);
                if error.is_expired() {
                    *lock(&self.resource_version) = None;
                }
                return Err(error);
            }
        };

        let cursor = self.resource_version.clone();
        Ok(stream
            .filter_map(move |event| future::ready(translate(event, &cursor)))
            .boxed())
    }
}

enum WatchState {
    Connecting,
    Streaming(EventStream),
    Backoff,
    Stopped,
}

/// Keeps a watch session open and forwards every event that passes the filter.
///
/// Events are handled one at a time, in stream order. Stopping is cooperative: the loop checks
/// the token at the top of every iteration and abandons a pending read or backoff as soon as
/// the token is cancelled. An in-flight notification always runs to its own timeout.
pub struct WatchLoop<S, N> {
    source: S,
    notifier: N,
    filter: EventFilter,
    token: CancellationToken,
    session_timeout: Duration,
    backoff: Duration,
}

impl<S: PodEventSource, N: Notify> WatchLoop<S, N> {
    pub fn new(source: S, notifier: N, token: CancellationToken) -> Self {
        Self {
            source,
            notifier,
            filter: EventFilter,
            token,
            session_timeout: SESSION_TIMEOUT,
            backoff: BACKOFF,
        }
    }

    pub fn with_session_timeout(mut self, session_timeout: Duration) -> Self {
        self.session_timeout = session_timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    async fn handle_event(&self, event: LifecycleEvent) {
        if self.filter.should_ignore(&event.pod) {
            debug!(
                "Ignoring {} event for system pod {}/{}",
                event.kind, event.pod.namespace, event.pod.name
            );
            return;
        }
        let result = self.notifier.send(&event.message()).await;
        info!(
            delivered = result.delivered,
            "Processed {} event for pod: {}", event.kind, event.pod.name
        );
    }

    /// State machine loop that runs until the token is cancelled.
    pub async fn run(&self) {
        let mut state = WatchState::Connecting;
        loop {
            if self.token.is_cancelled() {
                state = WatchState::Stopped;
            }
            state = match state {
                WatchState::Connecting => {
                    debug!("State: Connecting");
                    match self.source.open(self.session_timeout).await {
                        Ok(stream) => {
                            info!("Starting to watch pod events...");
                            WatchState::Streaming(stream)
                        }
                        Err(e) => {
                            error!("Failed to start pod watch: {}", e);
                            WatchState::Backoff
                        }
                    }
                }
                WatchState::Streaming(mut stream) => {
                    let next = tokio::select! {
                        _ = self.token.cancelled() => None,
                        item = stream.next() => Some(item),
                    };
                    match next {
                        None => WatchState::Stopped,
                        Some(Some(Ok(event))) => {
                            if self.token.is_cancelled() {
                                WatchState::Stopped
                            } else {
                                self.handle_event(event).await;
                                WatchState::Streaming(stream)
                            }
                        }
                        Some(Some(Err(e))) => {
                            error!("Pod watch failed: {}", e);
                            WatchState::Backoff
                        }
                        Some(None) => {
                            debug!("Watch session timed out, reopening");
                            WatchState::Connecting
                        }
                    }
                }
                WatchState::Backoff => {
                    warn!("Retrying watch in {} seconds...", self.backoff.as_secs());
                    tokio::select! {
                        _ = self.token.cancelled() => WatchState::Stopped,
                        _ = time::sleep(self.backoff) => WatchState::Connecting,
                    }
                }
                WatchState::Stopped => {
                    info!("Pod watch stopped");
                    return;
                }
            };
        }
    }
}
