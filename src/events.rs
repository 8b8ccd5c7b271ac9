// System
use std::collections::BTreeMap;
use std::fmt;

// Third Party
use k8s_openapi::api::core::v1::Pod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Removed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Created => "Created",
            EventKind::Updated => "Updated",
            EventKind::Removed => "Removed",
        };
        f.write_str(name)
    }
}

/// Identifying metadata of a pod, captured at the moment of the event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

impl PodRef {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }
}

impl From<&Pod> for PodRef {
    fn from(pod: &Pod) -> Self {
        Self {
            name: pod
                .metadata
                .name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    pub pod: PodRef,
}

impl LifecycleEvent {
    pub fn new(kind: EventKind, pod: PodRef) -> Self {
        Self { kind, pod }
    }

    /// The chat message announcing this event.
    pub fn message(&self) -> String {
        let name = &self.pod.name;
        match self.kind {
            EventKind::Created => format!("Hello world from {}", name),
            EventKind::Updated => format!("Things have changed, {}", name),
            EventKind::Removed => format!("Goodbye world from, {}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationResult {
    pub delivered: bool,
}

impl NotificationResult {
    pub fn delivered() -> Self {
        Self { delivered: true }
    }

    pub fn failed() -> Self {
        Self { delivered: false }
    }
}
