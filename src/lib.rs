pub mod backend;
pub mod backup;
pub mod cli;
pub mod config;
pub mod controller;
pub mod database;
pub mod history;
pub mod models;
pub mod planner;
pub mod preferences;
pub mod remote;
pub mod rewards;
pub mod store;
pub mod utils;
pub mod views;

pub use config::Config;
pub use database::Database;
pub use history::{HistoryEntry, HistoryLedger};
pub use models::{CalendarEvent, Goal, Habit, JournalEntry, Memory, MoodEntry, Note, Quote, Todo};
pub use planner::Planner;
pub use store::{Collection, RecordStore};
pub use utils::Profile;
