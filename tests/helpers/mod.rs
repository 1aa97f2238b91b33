#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

use daybook::backend::{LocalBackend, RemoteBackend};
use daybook::remote::InMemoryRemote;
use daybook::rewards::{NotificationKind, Notifier};
use daybook::{Database, Planner, RecordStore};

pub fn memory_store() -> RecordStore {
    RecordStore::new(Arc::new(Database::open_in_memory().expect("in-memory database")))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Notifier that remembers what it was asked to show
#[derive(Default)]
pub struct RecordingNotifier {
    fired: Mutex<Vec<NotificationKind>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.fired.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, _title: &str, _message: &str) {
        self.fired.lock().unwrap().push(kind);
    }
}

pub async fn local_planner(store: &RecordStore, today: NaiveDate) -> (Planner, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let backend = Arc::new(LocalBackend::new(store.clone()));
    let mut planner = Planner::open(store.clone(), backend, notifier.clone())
        .await
        .expect("planner opens");
    planner.set_today(today);
    (planner, notifier)
}

pub async fn remote_planner(
    store: &RecordStore,
    remote: Arc<InMemoryRemote>,
    user_id: &str,
    today: NaiveDate,
) -> Planner {
    let backend = Arc::new(RemoteBackend::new(remote, user_id));
    let mut planner = Planner::open(store.clone(), backend, Arc::new(RecordingNotifier::default()))
        .await
        .expect("planner opens");
    planner.set_today(today);
    planner
}
