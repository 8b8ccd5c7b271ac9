// Local
use crate::events::PodRef;
use crate::utils::{SYSTEM_LABEL_PREFIX, SYSTEM_NAMESPACE};

/// Decides which pod events are noise from cluster system components.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventFilter;

impl EventFilter {
    /// Pods in the system namespace, or carrying any label key with the
    /// system-component prefix, are ignored.
    pub fn should_ignore(&self, pod: &PodRef) -> bool {
        if pod.namespace == SYSTEM_NAMESPACE {
            return true;
        }
        pod.labels
            .keys()
            .any(|key| key.starts_with(SYSTEM_LABEL_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_namespace_is_ignored_regardless_of_labels() {
        let filter = EventFilter;
        assert!(filter.should_ignore(&PodRef::new("coredns-abc", "kube-system")));
        assert!(filter.should_ignore(
            &PodRef::new("proxy", "kube-system").with_label("app", "proxy")
        ));
    }

    #[test]
    fn system_label_prefix_is_ignored() {
        let filter = EventFilter;
        assert!(filter.should_ignore(
            &PodRef::new("dns", "default").with_label("k8s-app", "kube-dns")
        ));
        assert!(filter.should_ignore(
            &PodRef::new("metrics", "default")
                .with_label("app", "metrics")
                .with_label("k8s-app.example.com/role", "agent")
        ));
    }

    #[test]
    fn user_pods_pass() {
        let filter = EventFilter;
        assert!(!filter.should_ignore(&PodRef::new("web-1", "default")));
        assert!(!filter.should_ignore(
            &PodRef::new("web-1", "shop")
                .with_label("app", "web")
                .with_label("tier", "k8s-app")
        ));
        assert!(!filter.should_ignore(
            &PodRef::new("web-1", "kube-system-shadow").with_label("my-k8s-app", "x")
        ));
    }

    #[test]
    fn filtering_is_repeatable() {
        let filter = EventFilter;
        let pods = [
            PodRef::new("web-1", "default"),
            PodRef::new("dns", "kube-system"),
            PodRef::new("agent", "default").with_label("k8s-app", "agent"),
        ];
        for pod in &pods {
            let first = filter.should_ignore(pod);
            for _ in 0..3 {
                assert_eq!(filter.should_ignore(pod), first);
            }
        }
    }
}
