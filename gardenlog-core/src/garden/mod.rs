//! In-memory cache of beds and activities in front of a [`RemoteStore`].
//!
//! Reads are served from the cache. Every mutation goes to the store first
//! and touches the cache only once the store has confirmed it, so the cache
//! never shows a record the spreadsheet does not have. Failures leave the
//! cache as it was and raise a short-lived [`ErrorNotice`].
//!
//! Operations may overlap. Each one locks the cache only to apply its own
//! result, so results land in the order responses arrive. Nothing guards
//! against two updates of the same record racing; the last response wins.

mod seed;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::Backend;
use crate::models::{timestamp, GardenActivity, GardenBed, NewActivity, NewBed, Record};
use crate::store::{RemoteStore, StoreError};

/// How long an error notice stays visible.
pub const ERROR_DISPLAY_DURATION: Duration = Duration::from_secs(5);

/// Load progress of one cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// A user-level operation on the garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    AddBed,
    UpdateBed,
    DeleteBed,
    AddActivity,
    UpdateActivity,
    DeleteActivity,
}

impl Action {
    /// Text shown to the user when the action fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Action::Load => "Failed to load garden data. Using offline data instead.",
            Action::AddBed => "Failed to add garden bed",
            Action::UpdateBed => "Failed to update garden bed",
            Action::DeleteBed => "Failed to delete garden bed",
            Action::AddActivity => "Failed to add activity",
            Action::UpdateActivity => "Failed to update activity",
            Action::DeleteActivity => "Failed to delete activity",
        }
    }
}

#[derive(Error, Debug)]
pub enum GardenError {
    #[error("{}", .action.failure_message())]
    Failed {
        action: Action,
        #[source]
        source: StoreError,
    },
}

impl GardenError {
    pub fn action(&self) -> Action {
        match self {
            GardenError::Failed { action, .. } => *action,
        }
    }

    /// The store error underneath.
    pub fn store_error(&self) -> &StoreError {
        match self {
            GardenError::Failed { source, .. } => source,
        }
    }
}

/// The most recent failure, until it expires or something succeeds.
#[derive(Debug, Clone)]
pub struct ErrorNotice {
    message: String,
    raised_at: Instant,
}

impl ErrorNotice {
    fn new(action: Action) -> Self {
        Self {
            message: action.failure_message().to_string(),
            raised_at: Instant::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_expired(&self) -> bool {
        self.raised_at.elapsed() >= ERROR_DISPLAY_DURATION
    }
}

struct Collection<T> {
    records: Vec<T>,
    state: LoadState,
    /// Set once a load has succeeded; seed data is only used before that.
    loaded: bool,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            state: LoadState::Uninitialized,
            loaded: false,
        }
    }
}

impl<T: Record> Collection<T> {
    fn replace(&mut self, records: Vec<T>) {
        self.records = records;
        self.state = LoadState::Ready;
        self.loaded = true;
    }

    /// Installs seed records if nothing has ever been loaded. Returns
    /// whether it did.
    fn fall_back(&mut self, seed: impl FnOnce() -> Vec<T>) -> bool {
        self.state = LoadState::Ready;
        if self.loaded || !self.records.is_empty() {
            return false;
        }
        self.records = seed();
        true
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Swaps in the confirmed version of the record sent as `id`, keeping
    /// the cached id and creation time and stamping `updated_at` with the
    /// current time.
    fn apply_update(&mut self, id: &str, mut confirmed: T) -> T {
        let now = timestamp::now();
        match self.records.iter_mut().find(|r| r.id() == id) {
            Some(cached) => {
                confirmed.keep_identity(cached);
                confirmed.touch(now.max(cached.updated_at()));
                *cached = confirmed.clone();
            }
            None => confirmed.touch(now.max(confirmed.updated_at())),
        }
        confirmed
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);
        self.records.len() != before
    }
}

#[derive(Default)]
struct GardenState {
    beds: Collection<GardenBed>,
    activities: Collection<GardenActivity>,
    error: Option<ErrorNotice>,
    in_flight: usize,
}

fn beds(state: &mut GardenState) -> &mut Collection<GardenBed> {
    &mut state.beds
}

fn activities(state: &mut GardenState) -> &mut Collection<GardenActivity> {
    &mut state.activities
}

/// Counts an operation as in flight until dropped.
struct InFlight<'a> {
    garden: &'a Garden,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.garden.state();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

/// The garden as the front end sees it: cached collections plus the
/// operations that change them.
///
/// Construct one per session with [`Garden::new`], then call
/// [`Garden::refresh`] to load.
pub struct Garden {
    store: Arc<dyn RemoteStore>,
    state: Mutex<GardenState>,
}

impl Garden {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            state: Mutex::new(GardenState::default()),
        }
    }

    pub fn backend(&self) -> Backend {
        self.store.backend()
    }

    fn state(&self) -> MutexGuard<'_, GardenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> InFlight<'_> {
        self.state().in_flight += 1;
        InFlight { garden: self }
    }

    fn fail(&self, action: Action, source: StoreError) -> GardenError {
        tracing::warn!("{}: {}", action.failure_message(), source);
        self.state().error = Some(ErrorNotice::new(action));
        GardenError::Failed { action, source }
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    pub fn beds(&self) -> Vec<GardenBed> {
        self.state().beds.records.clone()
    }

    pub fn activities(&self) -> Vec<GardenActivity> {
        self.state().activities.records.clone()
    }

    pub fn bed(&self, id: &str) -> Option<GardenBed> {
        self.state().beds.get(id).cloned()
    }

    pub fn activity(&self, id: &str) -> Option<GardenActivity> {
        self.state().activities.get(id).cloned()
    }

    /// Cached activities of one bed, in cache order. No remote call.
    pub fn activities_for_bed(&self, bed_id: &str) -> Vec<GardenActivity> {
        self.state()
            .activities
            .records
            .iter()
            .filter(|a| a.bed_id == bed_id)
            .cloned()
            .collect()
    }

    pub fn bed_state(&self) -> LoadState {
        self.state().beds.state
    }

    pub fn activity_state(&self) -> LoadState {
        self.state().activities.state
    }

    /// True while a load or any mutation is outstanding.
    pub fn is_loading(&self) -> bool {
        let state = self.state();
        state.in_flight > 0
            || state.beds.state == LoadState::Loading
            || state.activities.state == LoadState::Loading
    }

    /// The current error notice, if one was raised less than
    /// [`ERROR_DISPLAY_DURATION`] ago and nothing has succeeded since.
    pub fn error(&self) -> Option<ErrorNotice> {
        let mut state = self.state();
        if state.error.as_ref().is_some_and(ErrorNotice::is_expired) {
            state.error = None;
        }
        state.error.clone()
    }

    pub fn dismiss_error(&self) {
        self.state().error = None;
    }

    // ── Loading ─────────────────────────────────────────────────────────────

    /// Reloads both collections from the store.
    ///
    /// A collection that loads is replaced wholesale. One that fails keeps
    /// its current records; if it has never loaded and is empty it gets the
    /// seed records instead.
    pub async fn refresh(&self) -> Result<(), GardenError> {
        let _in_flight = self.begin();
        {
            let mut state = self.state();
            state.beds.state = LoadState::Loading;
            state.activities.state = LoadState::Loading;
        }

        let loaded_beds = self.store.list_beds().await;
        let loaded_activities = self.store.list_activities().await;

        let mut state = self.state();
        let mut failure = None;

        match loaded_beds {
            Ok(records) => state.beds.replace(records),
            Err(e) => {
                if state.beds.fall_back(seed::beds) {
                    tracing::warn!("Using built-in beds until the store is reachable");
                }
                failure.get_or_insert(e);
            }
        }
        match loaded_activities {
            Ok(records) => state.activities.replace(records),
            Err(e) => {
                if state.activities.fall_back(seed::activities) {
                    tracing::warn!("Using built-in activities until the store is reachable");
                }
                failure.get_or_insert(e);
            }
        }

        match failure {
            None => {
                tracing::info!(
                    "Loaded {} bed(s) and {} activity(ies)",
                    state.beds.records.len(),
                    state.activities.records.len()
                );
                state.error = None;
                Ok(())
            }
            Some(source) => {
                drop(state);
                Err(self.fail(Action::Load, source))
            }
        }
    }

    // ── Mutations ───────────────────────────────────────────────────────────

    async fn add<T, F>(
        &self,
        action: Action,
        select: fn(&mut GardenState) -> &mut Collection<T>,
        call: F,
    ) -> Result<T, GardenError>
    where
        T: Record,
        F: Future<Output = Result<T, StoreError>>,
    {
        let _in_flight = self.begin();
        match call.await {
            Ok(created) => {
                let mut state = self.state();
                select(&mut state).records.push(created.clone());
                state.error = None;
                Ok(created)
            }
            Err(source) => Err(self.fail(action, source)),
        }
    }

    async fn update<T, F>(
        &self,
        action: Action,
        select: fn(&mut GardenState) -> &mut Collection<T>,
        id: String,
        call: F,
    ) -> Result<T, GardenError>
    where
        T: Record,
        F: Future<Output = Result<T, StoreError>>,
    {
        let _in_flight = self.begin();
        match call.await {
            Ok(confirmed) => {
                let mut state = self.state();
                let updated = select(&mut state).apply_update(&id, confirmed);
                state.error = None;
                Ok(updated)
            }
            Err(source) => Err(self.fail(action, source)),
        }
    }

    /// Creates a bed and appends the stored version to the cache.
    pub async fn add_bed(&self, bed: NewBed) -> Result<GardenBed, GardenError> {
        self.add(Action::AddBed, beds, self.store.create_bed(bed))
            .await
    }

    pub async fn update_bed(&self, bed: GardenBed) -> Result<GardenBed, GardenError> {
        let id = bed.id.clone();
        self.update(Action::UpdateBed, beds, id, self.store.update_bed(bed))
            .await
    }

    /// Deletes a bed, then each of its cached activities one at a time.
    ///
    /// Not atomic: if an activity delete fails, the bed stays deleted and
    /// that activity and any after it stay in the cache.
    pub async fn delete_bed(&self, bed_id: &str) -> Result<(), GardenError> {
        let _in_flight = self.begin();

        if let Err(source) = self.store.delete_bed(bed_id).await {
            return Err(self.fail(Action::DeleteBed, source));
        }

        let doomed: Vec<String> = {
            let mut state = self.state();
            state.beds.remove(bed_id);
            state
                .activities
                .records
                .iter()
                .filter(|a| a.bed_id == bed_id)
                .map(|a| a.id.clone())
                .collect()
        };

        for id in doomed {
            if let Err(source) = self.store.delete_activity(&id).await {
                return Err(self.fail(Action::DeleteBed, source));
            }
            self.state().activities.remove(&id);
        }

        self.state().error = None;
        Ok(())
    }

    pub async fn add_activity(&self, activity: NewActivity) -> Result<GardenActivity, GardenError> {
        self.add(
            Action::AddActivity,
            activities,
            self.store.create_activity(activity),
        )
        .await
    }

    pub async fn update_activity(
        &self,
        activity: GardenActivity,
    ) -> Result<GardenActivity, GardenError> {
        let id = activity.id.clone();
        self.update(
            Action::UpdateActivity,
            activities,
            id,
            self.store.update_activity(activity),
        )
        .await
    }

    pub async fn delete_activity(&self, id: &str) -> Result<(), GardenError> {
        let _in_flight = self.begin();
        match self.store.delete_activity(id).await {
            Ok(()) => {
                let mut state = self.state();
                state.activities.remove(id);
                state.error = None;
                Ok(())
            }
            Err(source) => Err(self.fail(Action::DeleteActivity, source)),
        }
    }
}
