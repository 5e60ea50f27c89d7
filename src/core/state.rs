use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::assignment::ProblemHosts;
use crate::services::probe::ReachabilityProbe;
use crate::services::storage::BlobStore;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    hosts: ProblemHosts,
    store: Arc<dyn BlobStore>,
    probe: Arc<dyn ReachabilityProbe>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        store: Arc<dyn BlobStore>,
        probe: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        let hosts = ProblemHosts {
            interactivities: settings.probe().interactivities_host.clone(),
            repository: settings.probe().repository_host.clone(),
        };
        Self { inner: Arc::new(InnerState { settings, hosts, store, probe }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn hosts(&self) -> &ProblemHosts {
        &self.inner.hosts
    }

    pub(crate) fn store(&self) -> &dyn BlobStore {
        self.inner.store.as_ref()
    }

    pub(crate) fn probe(&self) -> &dyn ReachabilityProbe {
        self.inner.probe.as_ref()
    }
}
