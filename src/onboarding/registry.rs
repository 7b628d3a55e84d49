//! Wizard registry: live wizards keyed by id, shared between HTTP handlers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::model::WizardKind;
use super::wizard::{StepWizard, WizardDeps};

/// Handle to one running wizard. Calls on the same wizard are serialized by
/// the mutex.
pub type SharedWizard = Arc<Mutex<StepWizard>>;

struct Entry {
    wizard: SharedWizard,
    cancel: CancellationToken,
    touched: std::sync::Mutex<Instant>,
}

impl Entry {
    fn touch(&self) {
        *self.touched.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.touched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// In-memory set of running wizards. Nothing is persisted; completed wizards
/// are removed by the caller and abandoned ones by `sweep_idle`.
pub struct WizardRegistry {
    deps: WizardDeps,
    wizards: RwLock<HashMap<Uuid, Entry>>,
}

impl WizardRegistry {
    pub fn new(deps: WizardDeps) -> Arc<Self> {
        Arc::new(Self {
            deps,
            wizards: RwLock::new(HashMap::new()),
        })
    }

    /// Start a wizard and return its id.
    pub async fn create(&self, kind: WizardKind) -> (Uuid, SharedWizard) {
        let wizard = StepWizard::new(kind, &self.deps);
        let id = wizard.id();
        let cancel = wizard.cancel_handle();
        let shared = Arc::new(Mutex::new(wizard));
        self.wizards.write().await.insert(
            id,
            Entry {
                wizard: Arc::clone(&shared),
                cancel,
                touched: std::sync::Mutex::new(Instant::now()),
            },
        );
        (id, shared)
    }

    /// Look up a wizard. Counts as activity for the idle sweep.
    pub async fn get(&self, id: Uuid) -> Option<SharedWizard> {
        let wizards = self.wizards.read().await;
        let entry = wizards.get(&id)?;
        entry.touch();
        Some(Arc::clone(&entry.wizard))
    }

    /// Drop a wizard, cancelling anything it has in flight. Returns false if
    /// the id was unknown.
    pub async fn remove(&self, id: Uuid) -> bool {
        let Some(entry) = self.wizards.write().await.remove(&id) else {
            return false;
        };
        // Cancel without taking the lock: a request still holding it is
        // woken through the token.
        entry.cancel.cancel();
        if let Ok(mut wizard) = entry.wizard.try_lock() {
            wizard.teardown();
        }
        info!(wizard_id = %id, "Wizard removed");
        true
    }

    /// Remove every wizard nobody has looked up for `max_idle`. Returns how
    /// many were dropped.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let stale: Vec<Uuid> = self
            .wizards
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.idle_for() >= max_idle)
            .map(|(id, _)| *id)
            .collect();

        let mut removed = 0;
        for id in stale {
            if self.remove(id).await {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "Swept idle wizards");
        } else {
            debug!("No idle wizards to sweep");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.wizards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.wizards.read().await.is_empty()
    }
}

/// Spawn a background task that periodically drops idle wizards.
pub fn spawn_sweep_task(
    registry: Arc<WizardRegistry>,
    max_idle: Duration,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            registry.sweep_idle(max_idle).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WizardConfig;
    use crate::onboarding::state::WizardStatus;

    fn registry() -> Arc<WizardRegistry> {
        let config = WizardConfig {
            simulated_delay: Duration::ZERO,
            ..WizardConfig::default()
        };
        WizardRegistry::new(WizardDeps::simulated(&config))
    }

    #[tokio::test]
    async fn create_get_remove() {
        let registry = registry();
        let (id, _) = registry.create(WizardKind::Kyc).await;
        assert_eq!(registry.len().await, 1);

        let wizard = registry.get(id).await.unwrap();
        assert_eq!(wizard.lock().await.kind(), WizardKind::Kyc);

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn remove_cancels_the_wizard() {
        let registry = registry();
        let (id, wizard) = registry.create(WizardKind::SignUp).await;
        let cancel = wizard.lock().await.cancel_handle();

        registry.remove(id).await;
        assert!(cancel.is_cancelled());
        assert_eq!(wizard.lock().await.status(), WizardStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_idle_wizards() {
        let registry = registry();
        let (stale, _) = registry.create(WizardKind::SignUp).await;
        let (active, _) = registry.create(WizardKind::Kyc).await;

        tokio::time::sleep(Duration::from_secs(20 * 60)).await;
        assert!(registry.get(active).await.is_some());
        tokio::time::sleep(Duration::from_secs(15 * 60)).await;

        assert_eq!(registry.sweep_idle(Duration::from_secs(30 * 60)).await, 1);
        assert!(registry.get(stale).await.is_none());
        assert!(registry.get(active).await.is_some());
        assert_eq!(registry.sweep_idle(Duration::from_secs(30 * 60)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_task_cancels_abandoned_wizards() {
        let registry = registry();
        let (_, wizard) = registry.create(WizardKind::SignUp).await;
        let cancel = wizard.lock().await.cancel_handle();

        let task = spawn_sweep_task(
            Arc::clone(&registry),
            Duration::from_secs(5 * 60),
            Duration::from_secs(60),
        );
        tokio::time::sleep(Duration::from_secs(7 * 60)).await;
        tokio::task::yield_now().await;

        assert!(registry.is_empty().await);
        assert!(cancel.is_cancelled());
        task.abort();
    }
}
