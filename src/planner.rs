//! One session over every collection.
//!
//! Owns a controller per collection, the history ledger, the reward tracker
//! and the notifier. Mutations that can complete the day (todos, habits,
//! journal) re-evaluate the reward predicates afterwards.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::backend::{BackendKind, PersistenceBackend};
use crate::controller::{CollectionController, ControllerError};
use crate::history::HistoryLedger;
use crate::models::{
    CalendarEvent, Goal, Habit, JournalEntry, Memory, MoodEntry, Note, Quote, Todo,
};
use crate::preferences::Preferences;
use crate::rewards::{self, NotificationKind, Notifier, RewardState, RewardTracker};
use crate::store::{Collection, RecordStore};
use crate::utils;

pub struct Planner {
    store: RecordStore,
    ledger: HistoryLedger,
    preferences: Preferences,
    backend_kind: BackendKind,
    notifier: Arc<dyn Notifier>,
    rewards: RewardTracker,
    fixed_today: Option<NaiveDate>,
    todos: CollectionController<Todo>,
    habits: CollectionController<Habit>,
    goals: CollectionController<Goal>,
    notes: CollectionController<Note>,
    journal: CollectionController<JournalEntry>,
    memories: CollectionController<Memory>,
    events: CollectionController<CalendarEvent>,
    quotes: CollectionController<Quote>,
    moods: CollectionController<MoodEntry>,
}

impl Planner {
    /// Load every collection through `backend`. The ledger, preferences and
    /// tag vocabulary always live in local storage.
    pub async fn open(
        store: RecordStore,
        backend: Arc<dyn PersistenceBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ControllerError> {
        let ledger = HistoryLedger::new(store.clone());
        let backend_kind = backend.kind();

        let mut planner = Self {
            preferences: Preferences::new(store.clone()),
            backend_kind,
            notifier,
            rewards: RewardTracker::default(),
            fixed_today: None,
            todos: CollectionController::open(backend.clone(), ledger.clone()).await?,
            habits: CollectionController::open(backend.clone(), ledger.clone()).await?,
            goals: CollectionController::open(backend.clone(), ledger.clone()).await?,
            notes: CollectionController::open(backend.clone(), ledger.clone()).await?,
            journal: CollectionController::open(backend.clone(), ledger.clone()).await?,
            memories: CollectionController::open(backend.clone(), ledger.clone()).await?,
            events: CollectionController::open(backend.clone(), ledger.clone()).await?,
            quotes: CollectionController::open(backend.clone(), ledger.clone()).await?,
            moods: CollectionController::open(backend, ledger.clone()).await?,
            store,
            ledger,
        };
        planner.rewards = RewardTracker::primed(planner.reward_state());

        tracing::info!(backend = ?backend_kind, "planner opened");
        Ok(planner)
    }

    /// Pin "today" to a fixed date instead of the local clock
    pub fn set_today(&mut self, today: NaiveDate) {
        self.fixed_today = Some(today);
        self.rewards = RewardTracker::primed(self.reward_state());
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(utils::today)
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn todos(&self) -> &[Todo] {
        self.todos.records()
    }

    pub fn habits(&self) -> &[Habit] {
        self.habits.records()
    }

    pub fn goals(&self) -> &[Goal] {
        self.goals.records()
    }

    pub fn journal(&self) -> &[JournalEntry] {
        self.journal.records()
    }

    pub fn notes(&mut self) -> &mut CollectionController<Note> {
        &mut self.notes
    }

    pub fn memories(&mut self) -> &mut CollectionController<Memory> {
        &mut self.memories
    }

    pub fn events(&mut self) -> &mut CollectionController<CalendarEvent> {
        &mut self.events
    }

    pub fn quotes(&mut self) -> &mut CollectionController<Quote> {
        &mut self.quotes
    }

    pub fn moods(&mut self) -> &mut CollectionController<MoodEntry> {
        &mut self.moods
    }

    pub fn reward_state(&self) -> RewardState {
        RewardState::evaluate(
            self.todos.records(),
            self.habits.records(),
            self.journal.records(),
            self.today(),
        )
    }

    /// Re-evaluate the predicates and notify for each one that just became
    /// true. Delivery is skipped when notifications are disabled.
    pub fn check_rewards(&mut self) -> Vec<NotificationKind> {
        let fired = self.rewards.observe(self.reward_state());
        for kind in &fired {
            self.deliver(*kind);
        }
        fired
    }

    fn deliver(&self, kind: NotificationKind) {
        if !self.preferences.notifications_enabled() {
            tracing::debug!(%kind, "notification suppressed");
            return;
        }
        let (title, message) = rewards::celebration(kind);
        self.notifier.notify(kind, title, message);
    }

    pub async fn add_todo(&mut self, todo: Todo) -> Result<Todo, ControllerError> {
        let created = self.todos.create(todo).await?;
        self.check_rewards();
        Ok(created)
    }

    pub async fn update_todo(&mut self, todo: Todo) -> Result<Todo, ControllerError> {
        let updated = self.todos.update(todo).await?;
        self.check_rewards();
        Ok(updated)
    }

    pub async fn toggle_todo(&mut self, id: &str) -> Result<Todo, ControllerError> {
        let toggled = self.todos.toggle(id).await?;
        self.check_rewards();
        Ok(toggled)
    }

    pub async fn delete_todo(&mut self, id: &str) -> Result<Todo, ControllerError> {
        let removed = self.todos.delete(id).await?;
        self.check_rewards();
        Ok(removed)
    }

    pub async fn add_habit(&mut self, habit: Habit) -> Result<Habit, ControllerError> {
        let created = self.habits.create(habit).await?;
        self.check_rewards();
        Ok(created)
    }

    pub async fn update_habit(&mut self, habit: Habit) -> Result<Habit, ControllerError> {
        let updated = self.habits.update(habit).await?;
        self.check_rewards();
        Ok(updated)
    }

    /// Mark or unmark `date` (today when `None`) on a habit
    pub async fn toggle_habit(
        &mut self,
        id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Habit, ControllerError> {
        let today = self.today();
        let toggled = self
            .habits
            .toggle_completion(id, date.unwrap_or(today), today)
            .await?;
        self.check_rewards();
        Ok(toggled)
    }

    pub async fn delete_habit(&mut self, id: &str) -> Result<Habit, ControllerError> {
        let removed = self.habits.delete(id).await?;
        self.check_rewards();
        Ok(removed)
    }

    pub async fn add_journal(&mut self, entry: JournalEntry) -> Result<JournalEntry, ControllerError> {
        let created = self.journal.create(entry).await?;
        self.remember_journal_tags(&created.tags);
        self.check_rewards();
        Ok(created)
    }

    pub async fn update_journal(&mut self, entry: JournalEntry) -> Result<JournalEntry, ControllerError> {
        let updated = self.journal.update(entry).await?;
        self.remember_journal_tags(&updated.tags);
        self.check_rewards();
        Ok(updated)
    }

    pub async fn delete_journal(&mut self, id: &str) -> Result<JournalEntry, ControllerError> {
        let removed = self.journal.delete(id).await?;
        self.check_rewards();
        Ok(removed)
    }

    pub async fn add_goal(&mut self, goal: Goal) -> Result<Goal, ControllerError> {
        self.goals.create(goal).await
    }

    pub async fn update_goal(&mut self, goal: Goal) -> Result<Goal, ControllerError> {
        self.goals.update(goal).await
    }

    pub async fn set_goal_progress(&mut self, id: &str, progress: f64) -> Result<Goal, ControllerError> {
        self.goals.set_progress(id, progress).await
    }

    /// Complete a goal; this always celebrates, it is an explicit action
    pub async fn complete_goal(&mut self, id: &str) -> Result<Goal, ControllerError> {
        let goal = self.goals.complete(id).await?;
        self.deliver(NotificationKind::Goal);
        Ok(goal)
    }

    pub async fn archive_goal(&mut self, id: &str) -> Result<Goal, ControllerError> {
        self.goals.archive(id).await
    }

    pub async fn delete_goal(&mut self, id: &str) -> Result<Goal, ControllerError> {
        self.goals.delete(id).await
    }

    /// Known journal tags, in the order first used
    pub fn journal_tags(&self) -> Vec<String> {
        self.store.load(Collection::JournalTags)
    }

    fn remember_journal_tags(&self, tags: &[String]) {
        let mut known = self.journal_tags();
        let before = known.len();
        for tag in tags {
            if !known.contains(tag) {
                known.push(tag.clone());
            }
        }
        if known.len() != before {
            self.store.save(Collection::JournalTags, &known);
        }
    }
}
