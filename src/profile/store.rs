//! ProfileStore: owns the canonical profile, its load/commit lifecycle and
//! write-through persistence.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::store::SettingsStore;
use crate::sync::{CredentialStore, ProfileSource};

use super::model::{Profile, ProfileUpdate, settings_keys};

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Profile change notifications.
#[derive(Debug, Clone)]
pub enum ProfileEvent {
    /// `load()` installed a new baseline.
    Loaded(Profile),
    /// A commit was merged in memory.
    Updated(Profile),
}

impl ProfileEvent {
    pub fn profile(&self) -> &Profile {
        match self {
            Self::Loaded(p) | Self::Updated(p) => p,
        }
    }
}

/// Where the baseline installed by `load()` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    LocalCache,
    Defaults,
}

enum PersistJob {
    Write { profile: Profile, push: bool },
    Flush(oneshot::Sender<()>),
}

struct StoreState {
    profile: Profile,
    loaded: bool,
    /// Commits made before the first load resolved; re-applied over the
    /// loaded baseline.
    pending: ProfileUpdate,
}

/// Owner of the session's profile record.
pub struct ProfileStore {
    state: RwLock<StoreState>,
    defaults: Profile,
    db: Arc<dyn SettingsStore>,
    credentials: CredentialStore,
    remote: Option<Arc<dyn ProfileSource>>,
    tx: broadcast::Sender<ProfileEvent>,
    persist_tx: mpsc::UnboundedSender<PersistJob>,
}

impl ProfileStore {
    /// Create a store holding the default profile and start its persistence
    /// writer. Must be called from within a tokio runtime.
    pub fn new(db: Arc<dyn SettingsStore>, remote: Option<Arc<dyn ProfileSource>>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let credentials = CredentialStore::new(Arc::clone(&db));
        let defaults = Profile::default();

        spawn_persist_task(
            persist_rx,
            Arc::clone(&db),
            credentials.clone(),
            remote.clone(),
        );

        Arc::new(Self {
            state: RwLock::new(StoreState {
                profile: defaults.clone(),
                loaded: false,
                pending: ProfileUpdate::default(),
            }),
            defaults,
            db,
            credentials,
            remote,
            tx,
            persist_tx,
        })
    }

    /// Subscribe to profile change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        self.tx.subscribe()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Current snapshot.
    pub async fn get(&self) -> Profile {
        self.state.read().await.profile.clone()
    }

    /// Whether `load()` has resolved at least once.
    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.loaded
    }

    /// Retrieve the persisted profile and install it as the baseline.
    ///
    /// The local slot is read first; the remote source, when configured and
    /// a credential is stored, overrides it. Failures never propagate: the
    /// store falls back to the local cache or defaults. Commits made while
    /// the load was outstanding are re-applied on top of the result.
    pub async fn load(&self) -> LoadSource {
        let mut baseline = self.defaults.clone();
        let mut source = LoadSource::Defaults;

        if let Some(cached) = self.read_local().await {
            if baseline.merge_value(&cached) > 0 {
                source = LoadSource::LocalCache;
            }
        }

        if let Some(ref remote) = self.remote {
            match self.fetch_remote(remote.as_ref()).await {
                RemoteOutcome::Fetched(value) => {
                    baseline = self.defaults.clone();
                    baseline.merge_value(&value);
                    source = LoadSource::Remote;
                }
                RemoteOutcome::Rejected => {
                    baseline = self.defaults.clone();
                    source = LoadSource::Defaults;
                }
                RemoteOutcome::Unavailable => {}
            }
        }

        let mut state = self.state.write().await;
        let pending = std::mem::take(&mut state.pending);
        pending.apply(&mut baseline);
        state.profile = baseline;
        state.loaded = true;

        let snapshot = state.profile.clone();
        let _ = self.tx.send(ProfileEvent::Loaded(snapshot.clone()));
        self.enqueue(PersistJob::Write {
            profile: snapshot,
            push: !pending.is_empty(),
        });

        info!(source = ?source, reapplied = !pending.is_empty(), "Profile loaded");
        source
    }

    /// Shallow-merge `update` into the profile, notify subscribers and queue
    /// persistence. Returns the new snapshot without waiting for the write.
    ///
    /// Before the first load resolves, the update is held in memory only;
    /// `load()` persists it merged over the loaded baseline, so the cached
    /// slot is never overwritten before it has been read.
    pub async fn commit(&self, update: ProfileUpdate) -> Profile {
        let mut state = self.state.write().await;
        update.apply(&mut state.profile);

        let snapshot = state.profile.clone();
        let _ = self.tx.send(ProfileEvent::Updated(snapshot.clone()));
        if state.loaded {
            self.enqueue(PersistJob::Write {
                profile: snapshot.clone(),
                push: true,
            });
        } else {
            state.pending.absorb(&update);
            debug!("Commit held until profile load resolves");
        }

        debug!(profile_id = %snapshot.id, "Profile committed");
        snapshot
    }

    /// Wait until every persistence job queued so far has run.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.persist_tx.send(PersistJob::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    fn enqueue(&self, job: PersistJob) {
        if self.persist_tx.send(job).is_err() {
            warn!("Profile persistence writer stopped; change kept in memory only");
        }
    }

    async fn read_local(&self) -> Option<serde_json::Value> {
        match self
            .db
            .get_setting(settings_keys::DEFAULT_USER, settings_keys::USER_PROFILE)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to read cached profile");
                None
            }
        }
    }

    async fn fetch_remote(&self, remote: &dyn ProfileSource) -> RemoteOutcome {
        let token = match self.credentials.get().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(source = remote.name(), "No stored credential; skipping remote fetch");
                return RemoteOutcome::Unavailable;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                return RemoteOutcome::Unavailable;
            }
        };

        match remote.fetch(&token).await {
            Ok(value) => RemoteOutcome::Fetched(value),
            Err(e) if e.is_unauthorized() => {
                warn!(source = remote.name(), error = %e, "Remote rejected credential");
                if let Err(e) = self.credentials.clear().await {
                    warn!(error = %e, "Failed to clear rejected credential");
                }
                RemoteOutcome::Rejected
            }
            Err(e) => {
                warn!(source = remote.name(), error = %e, "Remote profile fetch failed; using fallback");
                RemoteOutcome::Unavailable
            }
        }
    }
}

enum RemoteOutcome {
    Fetched(serde_json::Value),
    /// Credential rejected and cleared.
    Rejected,
    Unavailable,
}

/// Spawn the single writer that applies persistence jobs in queue order.
fn spawn_persist_task(
    mut rx: mpsc::UnboundedReceiver<PersistJob>,
    db: Arc<dyn SettingsStore>,
    credentials: CredentialStore,
    remote: Option<Arc<dyn ProfileSource>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match job {
                PersistJob::Write { profile, push } => {
                    write_local(db.as_ref(), &profile).await;
                    if push {
                        if let Some(ref remote) = remote {
                            push_remote(remote.as_ref(), &credentials, &profile).await;
                        }
                    }
                }
                PersistJob::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Profile persistence writer stopped");
    })
}

async fn write_local(db: &dyn SettingsStore, profile: &Profile) {
    let value = match serde_json::to_value(profile) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Failed to serialize profile");
            return;
        }
    };
    if let Err(e) = db
        .set_setting(settings_keys::DEFAULT_USER, settings_keys::USER_PROFILE, &value)
        .await
    {
        warn!(error = %e, "Failed to persist profile locally");
    }
}

async fn push_remote(remote: &dyn ProfileSource, credentials: &CredentialStore, profile: &Profile) {
    let token = match credentials.get().await {
        Ok(Some(token)) => token,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "Failed to read stored credential");
            return;
        }
    };
    match remote.push(&token, profile).await {
        Ok(()) => debug!(source = remote.name(), "Profile pushed to remote"),
        Err(e) if e.is_unauthorized() => {
            warn!(source = remote.name(), error = %e, "Remote rejected credential on push");
            if let Err(e) = credentials.clear().await {
                warn!(error = %e, "Failed to clear rejected credential");
            }
        }
        Err(e) => warn!(source = remote.name(), error = %e, "Failed to push profile to remote"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::{DatabaseError, SyncError};
    use crate::profile::model::{ExperienceLevel, StartupStage};
    use crate::store::LibSqlBackend;

    async fn memory_db() -> Arc<LibSqlBackend> {
        Arc::new(LibSqlBackend::new_memory().await.unwrap())
    }

    /// Remote stub with a canned fetch result that records pushes.
    struct StubSource {
        fetch: Result<serde_json::Value, SyncError>,
        gate: Option<Arc<Notify>>,
        pushed: Mutex<Vec<Profile>>,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn returning(fetch: Result<serde_json::Value, SyncError>) -> Arc<Self> {
            Arc::new(Self {
                fetch,
                gate: None,
                pushed: Mutex::new(Vec::new()),
                seen_tokens: Mutex::new(Vec::new()),
            })
        }

        fn gated(fetch: serde_json::Value, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                fetch: Ok(fetch),
                gate: Some(gate),
                pushed: Mutex::new(Vec::new()),
                seen_tokens: Mutex::new(Vec::new()),
            })
        }
    }

    fn clone_result(r: &Result<serde_json::Value, SyncError>) -> Result<serde_json::Value, SyncError> {
        match r {
            Ok(v) => Ok(v.clone()),
            Err(SyncError::Unauthorized { endpoint, status }) => Err(SyncError::Unauthorized {
                endpoint: endpoint.clone(),
                status: *status,
            }),
            Err(SyncError::Status { endpoint, status }) => Err(SyncError::Status {
                endpoint: endpoint.clone(),
                status: *status,
            }),
            Err(other) => Err(SyncError::Network {
                endpoint: "stub".into(),
                reason: other.to_string(),
            }),
        }
    }

    #[async_trait]
    impl ProfileSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(&self, token: &SecretString) -> Result<serde_json::Value, SyncError> {
            self.seen_tokens
                .lock()
                .unwrap()
                .push(token.expose_secret().to_string());
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            clone_result(&self.fetch)
        }

        async fn push(&self, _token: &SecretString, profile: &Profile) -> Result<(), SyncError> {
            self.pushed.lock().unwrap().push(profile.clone());
            Ok(())
        }
    }

    /// Settings store whose writes always fail.
    struct FailingWrites;

    #[async_trait]
    impl SettingsStore for FailingWrites {
        async fn get_setting(
            &self,
            _user_id: &str,
            _key: &str,
        ) -> Result<Option<serde_json::Value>, DatabaseError> {
            Ok(None)
        }

        async fn set_setting(
            &self,
            _user_id: &str,
            _key: &str,
            _value: &serde_json::Value,
        ) -> Result<(), DatabaseError> {
            Err(DatabaseError::Query("disk full".into()))
        }

        async fn delete_setting(&self, _user_id: &str, _key: &str) -> Result<bool, DatabaseError> {
            Ok(false)
        }
    }

    async fn cached_profile(db: &LibSqlBackend) -> Option<serde_json::Value> {
        db.get_setting(settings_keys::DEFAULT_USER, settings_keys::USER_PROFILE)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn starts_with_defaults_before_load() {
        let store = ProfileStore::new(memory_db().await, None);
        let p = store.get().await;
        assert!(p.display_name.is_empty());
        assert!(!store.is_loaded().await);
    }

    #[tokio::test]
    async fn load_without_anything_uses_defaults() {
        let store = ProfileStore::new(memory_db().await, None);
        assert_eq!(store.load().await, LoadSource::Defaults);
        assert!(store.is_loaded().await);
        assert_eq!(store.get().await.experience_level, ExperienceLevel::Unset);
    }

    #[tokio::test]
    async fn load_reads_local_cache() {
        let db = memory_db().await;
        db.set_setting(
            settings_keys::DEFAULT_USER,
            settings_keys::USER_PROFILE,
            &json!({ "displayName": "Asha", "startupStage": "prototype" }),
        )
        .await
        .unwrap();

        let store = ProfileStore::new(db, None);
        assert_eq!(store.load().await, LoadSource::LocalCache);
        let p = store.get().await;
        assert_eq!(p.display_name, "Asha");
        assert_eq!(p.startup_stage, StartupStage::Prototype);
        // Fields missing from the cache keep defaults.
        assert!(p.location.country.is_empty());
    }

    #[tokio::test]
    async fn malformed_cache_falls_back_to_defaults() {
        let db = memory_db().await;
        db.set_raw_setting(settings_keys::DEFAULT_USER, settings_keys::USER_PROFILE, "{oops")
            .await;

        let store = ProfileStore::new(db, None);
        assert_eq!(store.load().await, LoadSource::Defaults);
        assert!(store.get().await.display_name.is_empty());
    }

    #[tokio::test]
    async fn remote_wins_over_cache() {
        let db = memory_db().await;
        db.set_setting(
            settings_keys::DEFAULT_USER,
            settings_keys::USER_PROFILE,
            &json!({ "displayName": "Cached", "educationLevel": "PhD" }),
        )
        .await
        .unwrap();
        let store_db: Arc<dyn SettingsStore> = db.clone();
        CredentialStore::new(Arc::clone(&store_db))
            .set(&SecretString::from("tok"))
            .await
            .unwrap();

        let remote = StubSource::returning(Ok(json!({ "displayName": "Remote" })));
        let store = ProfileStore::new(store_db, Some(remote.clone()));
        assert_eq!(store.load().await, LoadSource::Remote);

        let p = store.get().await;
        assert_eq!(p.display_name, "Remote");
        // Missing remote fields keep defaults, not cached values.
        assert!(p.education_level.is_empty());
        assert_eq!(remote.seen_tokens.lock().unwrap().as_slice(), ["tok"]);

        store.flush().await;
        assert_eq!(cached_profile(&db).await.unwrap()["displayName"], "Remote");
    }

    #[tokio::test]
    async fn remote_skipped_without_credential() {
        let db = memory_db().await;
        let remote = StubSource::returning(Ok(json!({ "displayName": "Remote" })));
        let store = ProfileStore::new(db, Some(remote.clone()));

        assert_eq!(store.load().await, LoadSource::Defaults);
        assert!(remote.seen_tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_clears_credential_and_uses_defaults() {
        let db = memory_db().await;
        db.set_setting(
            settings_keys::DEFAULT_USER,
            settings_keys::USER_PROFILE,
            &json!({ "displayName": "Cached" }),
        )
        .await
        .unwrap();
        let store_db: Arc<dyn SettingsStore> = db.clone();
        let creds = CredentialStore::new(Arc::clone(&store_db));
        creds.set(&SecretString::from("expired")).await.unwrap();

        let remote = StubSource::returning(Err(SyncError::Unauthorized {
            endpoint: "stub".into(),
            status: 401,
        }));
        let store = ProfileStore::new(store_db, Some(remote));

        assert_eq!(store.load().await, LoadSource::Defaults);
        assert!(store.get().await.display_name.is_empty());
        assert!(creds.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_keeps_credential_and_uses_cache() {
        let db = memory_db().await;
        db.set_setting(
            settings_keys::DEFAULT_USER,
            settings_keys::USER_PROFILE,
            &json!({ "displayName": "Cached" }),
        )
        .await
        .unwrap();
        let store_db: Arc<dyn SettingsStore> = db.clone();
        let creds = CredentialStore::new(Arc::clone(&store_db));
        creds.set(&SecretString::from("tok")).await.unwrap();

        let remote = StubSource::returning(Err(SyncError::Status {
            endpoint: "stub".into(),
            status: 500,
        }));
        let store = ProfileStore::new(store_db, Some(remote));

        assert_eq!(store.load().await, LoadSource::LocalCache);
        assert_eq!(store.get().await.display_name, "Cached");
        assert!(creds.get().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn commit_merges_notifies_and_persists() {
        let db = memory_db().await;
        let store = ProfileStore::new(db.clone(), None);
        store.load().await;
        let mut rx = store.subscribe();

        let snapshot = store
            .commit(ProfileUpdate {
                display_name: Some("Asha".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(snapshot.display_name, "Asha");

        // Subscribers see the change as soon as commit returns.
        match rx.try_recv().unwrap() {
            ProfileEvent::Updated(p) => assert_eq!(p.display_name, "Asha"),
            other => panic!("Expected Updated, got {other:?}"),
        }

        store.flush().await;
        assert_eq!(cached_profile(&db).await.unwrap()["displayName"], "Asha");
    }

    #[tokio::test]
    async fn last_commit_is_last_write() {
        let db = memory_db().await;
        let store = ProfileStore::new(db.clone(), None);
        store.load().await;

        for name in ["a", "b", "c", "d"] {
            store
                .commit(ProfileUpdate {
                    display_name: Some(name.into()),
                    ..Default::default()
                })
                .await;
        }
        store.flush().await;
        assert_eq!(cached_profile(&db).await.unwrap()["displayName"], "d");
    }

    #[tokio::test]
    async fn persistence_failure_keeps_memory_update() {
        let store = ProfileStore::new(Arc::new(FailingWrites), None);
        store.load().await;
        store
            .commit(ProfileUpdate {
                startup_stage: Some(StartupStage::Idea),
                ..Default::default()
            })
            .await;
        store.flush().await;
        assert_eq!(store.get().await.startup_stage, StartupStage::Idea);
    }

    #[tokio::test]
    async fn commits_before_load_survive_late_load() {
        let db = memory_db().await;
        let store_db: Arc<dyn SettingsStore> = db.clone();
        CredentialStore::new(Arc::clone(&store_db))
            .set(&SecretString::from("tok"))
            .await
            .unwrap();

        let gate = Arc::new(Notify::new());
        let remote = StubSource::gated(
            json!({ "displayName": "Remote", "educationLevel": "PhD" }),
            Arc::clone(&gate),
        );
        let store = ProfileStore::new(store_db, Some(remote.clone()));

        let loader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.load().await })
        };
        // Let the loader reach the gated fetch.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        store
            .commit(ProfileUpdate {
                display_name: Some("Typed".into()),
                ..Default::default()
            })
            .await;

        gate.notify_one();
        assert_eq!(loader.await.unwrap(), LoadSource::Remote);

        let p = store.get().await;
        assert_eq!(p.display_name, "Typed");
        assert_eq!(p.education_level, "PhD");

        // The reconciled profile is pushed back to the remote.
        store.flush().await;
        let pushed = remote.pushed.lock().unwrap();
        assert_eq!(pushed.last().unwrap().display_name, "Typed");
    }

    #[tokio::test]
    async fn commit_before_load_keeps_cached_profile() {
        let db = memory_db().await;
        db.set_setting(
            settings_keys::DEFAULT_USER,
            settings_keys::USER_PROFILE,
            &json!({
                "displayName": "Asha",
                "educationLevel": "PhD",
                "onboardingCompleted": true
            }),
        )
        .await
        .unwrap();
        let store = ProfileStore::new(db.clone(), None);

        store
            .commit(ProfileUpdate {
                startup_stage: Some(StartupStage::Idea),
                ..Default::default()
            })
            .await;
        store.flush().await;
        // Nothing reaches the slot until the cache has been read.
        assert_eq!(cached_profile(&db).await.unwrap()["displayName"], "Asha");

        assert_eq!(store.load().await, LoadSource::LocalCache);
        let p = store.get().await;
        assert_eq!(p.display_name, "Asha");
        assert_eq!(p.education_level, "PhD");
        assert!(p.onboarding_completed);
        assert_eq!(p.startup_stage, StartupStage::Idea);

        store.flush().await;
        let cached = cached_profile(&db).await.unwrap();
        assert_eq!(cached["displayName"], "Asha");
        assert_eq!(cached["onboardingCompleted"], true);
        assert_eq!(cached["startupStage"], "idea");
    }

    #[tokio::test]
    async fn commit_pushes_when_credential_present() {
        let db = memory_db().await;
        let store_db: Arc<dyn SettingsStore> = db.clone();
        CredentialStore::new(Arc::clone(&store_db))
            .set(&SecretString::from("tok"))
            .await
            .unwrap();
        let remote = StubSource::returning(Ok(json!({})));
        let store = ProfileStore::new(store_db, Some(remote.clone()));
        store.load().await;

        store
            .commit(ProfileUpdate {
                experience_level: Some(ExperienceLevel::Student),
                ..Default::default()
            })
            .await;
        store.flush().await;

        let pushed = remote.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].experience_level, ExperienceLevel::Student);
    }
}
