use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use thiserror::Error;

use crate::backend;
use crate::backup::{self, BackupError};
use crate::controller::ControllerError;
use crate::models::{
    CalendarEvent, Frequency, Goal, Habit, JournalEntry, Memory, MoodEntry, Note, Priority, Quote,
    Record, Todo,
};
use crate::planner::Planner;
use crate::preferences::Preference;
use crate::remote::RemoteMirror;
use crate::utils::{self, parse_date};
use crate::views::{self, DateWindow};

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Goals, habits, todos and journal kept locally, optionally mirrored remotely")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Act as this signed-in user instead of the configured one
    #[arg(long)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage todos
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },
    /// Manage habits
    Habit {
        #[command(subcommand)]
        action: HabitAction,
    },
    /// Manage goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Manage journal entries
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
    /// Manage memories
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Manage calendar events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Manage motivational quotes
    Quote {
        #[command(subcommand)]
        action: QuoteAction,
    },
    /// Record or list moods
    Mood {
        #[command(subcommand)]
        action: MoodAction,
    },
    /// Write or show the reflection for a day
    Reflect {
        /// Reflection text; shows the stored one when omitted
        text: Option<String>,
        /// Day (YYYY-MM-DD), today by default
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Show or clear the activity history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Show today's overview and statistics
    Stats,
    /// Write a full backup as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Restore a backup, overwriting every key it contains
    Import {
        file: String,
        /// Confirm overwriting existing data
        #[arg(long)]
        yes: bool,
    },
    /// Copy all local data into the remote mirror for the signed-in user
    Migrate,
    /// Read or change preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
pub enum TodoAction {
    Add {
        title: String,
        /// Due date (YYYY-MM-DD or YYYY-MM-DDTHH:MM)
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Toggle completion
    Done { id: String },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
    },
    Rm { id: String },
    List,
}

#[derive(Subcommand)]
pub enum HabitAction {
    Add {
        name: String,
        #[arg(long, value_parser = parse_frequency, default_value = "daily")]
        frequency: Frequency,
        #[arg(long)]
        category: Option<String>,
    },
    /// Toggle completion for a day (today by default)
    Check {
        id: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_frequency)]
        frequency: Option<Frequency>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Rm { id: String },
    List,
}

#[derive(Subcommand)]
pub enum GoalAction {
    Add {
        title: String,
        #[arg(long, default_value_t = 100.0)]
        target: f64,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Progress { id: String, value: f64 },
    Complete { id: String },
    Archive { id: String },
    Rm { id: String },
    List,
}

#[derive(Subcommand)]
pub enum NoteAction {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,
    },
    Pin { id: String },
    Rm { id: String },
    List {
        #[arg(long)]
        tag: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum JournalAction {
    Add {
        content: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    Edit {
        id: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,
    },
    Rm { id: String },
    List,
}

#[derive(Subcommand)]
pub enum MemoryAction {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,
    },
    Pin { id: String },
    Rm { id: String },
    List,
}

#[derive(Subcommand)]
pub enum EventAction {
    Add {
        title: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Rm { id: String },
    List,
}

#[derive(Subcommand)]
pub enum QuoteAction {
    Add {
        text: String,
        #[arg(long)]
        author: Option<String>,
    },
    Rm { id: String },
    List,
}

#[derive(Subcommand)]
pub enum MoodAction {
    Add {
        mood: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    List,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Newest entries first
    List {
        /// Only this entity type (todo, habit, goal, ...)
        #[arg(long = "type")]
        entity_type: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Counts by type, action, day and month
    Summary,
    /// Delete the entire history
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PrefsAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    ControllerError(#[from] ControllerError),
    #[error("Backup error: {0}")]
    BackupError(#[from] BackupError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Unknown preference: {0}")]
    UnknownPreference(String),
    #[error("{0}")]
    NotConfirmed(String),
    #[error("Migration needs a signed-in user and a configured remote")]
    RemoteUnavailable,
    #[error("Migration failed; some collections may already be copied")]
    MigrationFailed,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| format!("Invalid date format '{}': {}", value, e))
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    match value.to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(format!("unknown priority '{}', expected low, medium or high", other)),
    }
}

fn parse_frequency(value: &str) -> Result<Frequency, String> {
    match value.to_ascii_lowercase().as_str() {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        other => Err(format!("unknown frequency '{}', expected daily, weekly or monthly", other)),
    }
}

fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn validate_due(due: Option<String>) -> Result<Option<String>, CliError> {
    match due {
        Some(d) if utils::parse_local_datetime(&d).is_none() => {
            Err(CliError::DateParseError(format!("Invalid due date '{}'", d)))
        }
        other => Ok(other),
    }
}

/// Copy of the record with `id`, for editing
fn existing<T: Record>(records: &[T], id: String) -> Result<T, CliError> {
    match records.iter().find(|r| r.id() == id) {
        Some(record) => Ok(record.clone()),
        None => Err(ControllerError::NotFound {
            collection: T::COLLECTION,
            id,
        }
        .into()),
    }
}

fn check(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

/// Remote pieces needed by `migrate`
pub struct RemoteContext {
    pub mirror: Option<Arc<dyn RemoteMirror>>,
    pub user_id: Option<String>,
}

/// Run one command against an open planner
pub async fn dispatch(
    command: Option<Commands>,
    planner: &mut Planner,
    remote: &RemoteContext,
) -> Result<(), CliError> {
    match command {
        None | Some(Commands::Stats) => {
            print_stats(planner);
            Ok(())
        }
        Some(Commands::Todo { action }) => handle_todo(action, planner).await,
        Some(Commands::Habit { action }) => handle_habit(action, planner).await,
        Some(Commands::Goal { action }) => handle_goal(action, planner).await,
        Some(Commands::Note { action }) => handle_note(action, planner).await,
        Some(Commands::Journal { action }) => handle_journal(action, planner).await,
        Some(Commands::Memory { action }) => handle_memory(action, planner).await,
        Some(Commands::Event { action }) => handle_event(action, planner).await,
        Some(Commands::Quote { action }) => handle_quote(action, planner).await,
        Some(Commands::Mood { action }) => handle_mood(action, planner).await,
        Some(Commands::Reflect { text, date }) => {
            let date = date.unwrap_or_else(|| planner.today());
            match text {
                Some(text) => {
                    planner.preferences().set_reflection(date, &text);
                    println!("Reflection saved for {}", date);
                }
                None => match planner.preferences().reflection(date) {
                    Some(text) => println!("{}", text),
                    None => println!("No reflection for {}", date),
                },
            }
            Ok(())
        }
        Some(Commands::History { action }) => handle_history(action, planner),
        Some(Commands::Export { output }) => {
            let json = backup::export_string(planner.store())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Backup written to {}", path);
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        Some(Commands::Import { file, yes }) => {
            if !yes {
                return Err(CliError::NotConfirmed(
                    "Import overwrites existing data; re-run with --yes".to_string(),
                ));
            }
            let raw = std::fs::read_to_string(&file)?;
            let restored = backup::import(planner.store(), &raw)?;
            println!("Restored {} keys from {}", restored, file);
            Ok(())
        }
        Some(Commands::Migrate) => {
            let (Some(mirror), Some(user_id)) = (&remote.mirror, &remote.user_id) else {
                return Err(CliError::RemoteUnavailable);
            };
            if backend::migrate_local_to_remote(planner.store(), mirror.as_ref(), user_id).await {
                println!("Local data copied to the remote mirror");
                Ok(())
            } else {
                Err(CliError::MigrationFailed)
            }
        }
        Some(Commands::Prefs { action }) => handle_prefs(action, planner),
    }
}

async fn handle_todo(action: TodoAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        TodoAction::Add {
            title,
            due,
            priority,
            category,
            description,
        } => {
            let mut todo = Todo::new(title);
            todo.due_date = validate_due(due)?;
            todo.priority = priority.unwrap_or_default();
            todo.category = category;
            todo.description = description;
            let todo = planner.add_todo(todo).await?;
            println!("Todo created successfully (ID: {})", todo.id);
        }
        TodoAction::Done { id } => {
            let todo = planner.toggle_todo(&id).await?;
            println!("{} {}", check(todo.completed), todo.title);
        }
        TodoAction::Edit {
            id,
            title,
            due,
            priority,
            category,
        } => {
            let mut todo = existing(planner.todos(), id)?;
            if let Some(title) = title {
                todo.title = title;
            }
            if due.is_some() {
                todo.due_date = validate_due(due)?;
            }
            if let Some(priority) = priority {
                todo.priority = priority;
            }
            if category.is_some() {
                todo.category = category;
            }
            planner.update_todo(todo).await?;
            println!("Todo updated");
        }
        TodoAction::Rm { id } => {
            let todo = planner.delete_todo(&id).await?;
            println!("Deleted todo '{}'", todo.title);
        }
        TodoAction::List => {
            let now = Local::now().naive_local();
            for todo in planner.todos() {
                let overdue = if views::is_overdue(todo, now) { " (overdue)" } else { "" };
                let due = todo.due_date.as_deref().unwrap_or("-");
                println!(
                    "{} {}  {:?}  due {}{}  [{}]",
                    check(todo.completed),
                    todo.title,
                    todo.priority,
                    due,
                    overdue,
                    todo.id
                );
            }
        }
    }
    Ok(())
}

async fn handle_habit(action: HabitAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        HabitAction::Add {
            name,
            frequency,
            category,
        } => {
            let mut habit = Habit::new(name, frequency);
            habit.category = category;
            let habit = planner.add_habit(habit).await?;
            println!("Habit created successfully (ID: {})", habit.id);
        }
        HabitAction::Check { id, date } => {
            let day = date.unwrap_or_else(|| planner.today());
            let habit = planner.toggle_habit(&id, Some(day)).await?;
            println!(
                "{} {} on {} (streak {})",
                check(habit.is_completed_on(day)),
                habit.name,
                day,
                habit.streak
            );
        }
        HabitAction::Edit {
            id,
            name,
            frequency,
            category,
            description,
        } => {
            let mut habit = existing(planner.habits(), id)?;
            if let Some(name) = name {
                habit.name = name;
            }
            if let Some(frequency) = frequency {
                habit.frequency = frequency;
            }
            if category.is_some() {
                habit.category = category;
            }
            if description.is_some() {
                habit.description = description;
            }
            planner.update_habit(habit).await?;
            println!("Habit updated");
        }
        HabitAction::Rm { id } => {
            let habit = planner.delete_habit(&id).await?;
            println!("Deleted habit '{}'", habit.name);
        }
        HabitAction::List => {
            let today = planner.today();
            for habit in planner.habits() {
                println!(
                    "{} {}  {:?}  streak {}  [{}]",
                    check(habit.is_completed_on(today)),
                    habit.name,
                    habit.frequency,
                    habit.streak,
                    habit.id
                );
            }
        }
    }
    Ok(())
}

async fn handle_goal(action: GoalAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        GoalAction::Add {
            title,
            target,
            deadline,
            category,
        } => {
            let mut goal = Goal::new(title, target);
            goal.deadline = validate_due(deadline)?;
            goal.category = category;
            let goal = planner.add_goal(goal).await?;
            println!("Goal created successfully (ID: {})", goal.id);
        }
        GoalAction::Edit {
            id,
            title,
            target,
            deadline,
            category,
        } => {
            let mut goal = existing(planner.goals(), id)?;
            if let Some(title) = title {
                goal.title = title;
            }
            if let Some(target) = target {
                goal.target = target;
            }
            if deadline.is_some() {
                goal.deadline = validate_due(deadline)?;
            }
            if category.is_some() {
                goal.category = category;
            }
            planner.update_goal(goal).await?;
            println!("Goal updated");
        }
        GoalAction::Progress { id, value } => {
            let goal = planner.set_goal_progress(&id, value).await?;
            println!("{}: {}/{} ({:.0}%)", goal.title, goal.progress, goal.target, goal.ratio() * 100.0);
        }
        GoalAction::Complete { id } => {
            let goal = planner.complete_goal(&id).await?;
            println!("Goal '{}' completed", goal.title);
        }
        GoalAction::Archive { id } => {
            let goal = planner.archive_goal(&id).await?;
            println!("Goal '{}' archived", goal.title);
        }
        GoalAction::Rm { id } => {
            let goal = planner.delete_goal(&id).await?;
            println!("Deleted goal '{}'", goal.title);
        }
        GoalAction::List => {
            for goal in planner.goals().iter().filter(|g| !g.archived) {
                println!(
                    "{} {}  {}/{}  [{}]",
                    check(goal.completed),
                    goal.title,
                    goal.progress,
                    goal.target,
                    goal.id
                );
            }
        }
    }
    Ok(())
}

async fn handle_note(action: NoteAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        NoteAction::Add {
            title,
            content,
            tags,
        } => {
            let mut note = Note::new(title, content);
            note.tags = split_tags(tags);
            let note = planner.notes().create(note).await?;
            println!("Note created successfully (ID: {})", note.id);
        }
        NoteAction::Edit {
            id,
            title,
            content,
            tags,
        } => {
            let mut note = existing(planner.notes().records(), id)?;
            if let Some(title) = title {
                note.title = title;
            }
            if let Some(content) = content {
                note.content = content;
            }
            if tags.is_some() {
                note.tags = split_tags(tags);
            }
            planner.notes().update(note).await?;
            println!("Note updated");
        }
        NoteAction::Pin { id } => {
            let note = planner.notes().toggle_pin(&id).await?;
            println!("{} '{}'", if note.pinned { "Pinned" } else { "Unpinned" }, note.title);
        }
        NoteAction::Rm { id } => {
            let note = planner.notes().delete(&id).await?;
            println!("Deleted note '{}'", note.title);
        }
        NoteAction::List { tag } => {
            let notes = planner.notes();
            let listed: Vec<&Note> = match tag {
                Some(ref tag) => views::filter_by_tag(notes.records(), tag),
                None => notes.records().iter().collect(),
            };
            let (pinned, rest): (Vec<&Note>, Vec<&Note>) = listed.into_iter().partition(|n| n.pinned);
            for note in pinned.into_iter().chain(rest) {
                let marker = if note.pinned { "*" } else { " " };
                println!("{} {}  {}  [{}]", marker, note.title, note.tags.join(","), note.id);
            }
        }
    }
    Ok(())
}

async fn handle_journal(action: JournalAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        JournalAction::Add {
            content,
            title,
            mood,
            tags,
            date,
        } => {
            let mut entry = JournalEntry::new(date.unwrap_or_else(|| planner.today()), content);
            entry.title = title;
            entry.mood = mood;
            entry.tags = split_tags(tags);
            let entry = planner.add_journal(entry).await?;
            println!("Journal entry created successfully (ID: {})", entry.id);
        }
        JournalAction::Edit {
            id,
            content,
            title,
            mood,
            tags,
        } => {
            let mut entry = existing(planner.journal(), id)?;
            if let Some(content) = content {
                entry.content = content;
            }
            if title.is_some() {
                entry.title = title;
            }
            if mood.is_some() {
                entry.mood = mood;
            }
            if tags.is_some() {
                entry.tags = split_tags(tags);
            }
            planner.update_journal(entry).await?;
            println!("Journal entry updated");
        }
        JournalAction::Rm { id } => {
            planner.delete_journal(&id).await?;
            println!("Journal entry deleted");
        }
        JournalAction::List => {
            let mut entries: Vec<&JournalEntry> = planner.journal().iter().collect();
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            for entry in entries {
                println!(
                    "{}  {}  {}  [{}]",
                    entry.date,
                    entry.title.as_deref().unwrap_or(""),
                    entry.mood.as_deref().unwrap_or(""),
                    entry.id
                );
            }
        }
    }
    Ok(())
}

async fn handle_memory(action: MemoryAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        MemoryAction::Add {
            title,
            description,
            date,
            tags,
        } => {
            let mut memory = Memory::new(title, date.unwrap_or_else(|| planner.today()));
            memory.description = description;
            memory.tags = split_tags(tags);
            let memory = planner.memories().create(memory).await?;
            println!("Memory created successfully (ID: {})", memory.id);
        }
        MemoryAction::Edit {
            id,
            title,
            description,
            date,
            tags,
        } => {
            let mut memory = existing(planner.memories().records(), id)?;
            if let Some(title) = title {
                memory.title = title;
            }
            if let Some(description) = description {
                memory.description = description;
            }
            if let Some(date) = date {
                memory.date = utils::format_date(date);
            }
            if tags.is_some() {
                memory.tags = split_tags(tags);
            }
            planner.memories().update(memory).await?;
            println!("Memory updated");
        }
        MemoryAction::Pin { id } => {
            let memory = planner.memories().toggle_pin(&id).await?;
            println!("{} '{}'", if memory.pinned { "Pinned" } else { "Unpinned" }, memory.title);
        }
        MemoryAction::Rm { id } => {
            let memory = planner.memories().delete(&id).await?;
            println!("Deleted memory '{}'", memory.title);
        }
        MemoryAction::List => {
            for memory in planner.memories().records() {
                let marker = if memory.pinned { "*" } else { " " };
                println!("{} {}  {}  [{}]", marker, memory.date, memory.title, memory.id);
            }
        }
    }
    Ok(())
}

async fn handle_event(action: EventAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        EventAction::Add {
            title,
            date,
            time,
            category,
        } => {
            let mut event = CalendarEvent::new(title, date);
            event.time = time;
            event.category = category;
            let event = planner.events().create(event).await?;
            println!("Event created successfully (ID: {})", event.id);
        }
        EventAction::Rm { id } => {
            let event = planner.events().delete(&id).await?;
            println!("Deleted event '{}'", event.title);
        }
        EventAction::List => {
            let mut events: Vec<&CalendarEvent> = planner.events().records().iter().collect();
            events.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
            for event in events {
                println!(
                    "{} {}  {}  [{}]",
                    event.date,
                    event.time.as_deref().unwrap_or("     "),
                    event.title,
                    event.id
                );
            }
        }
    }
    Ok(())
}

async fn handle_quote(action: QuoteAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        QuoteAction::Add { text, author } => {
            let quote = Quote {
                id: String::new(),
                text,
                author,
                created_at: String::new(),
            };
            let quote = planner.quotes().create(quote).await?;
            println!("Quote saved (ID: {})", quote.id);
        }
        QuoteAction::Rm { id } => {
            planner.quotes().delete(&id).await?;
            println!("Quote deleted");
        }
        QuoteAction::List => {
            for quote in planner.quotes().records() {
                match &quote.author {
                    Some(author) => println!("\"{}\" - {}  [{}]", quote.text, author, quote.id),
                    None => println!("\"{}\"  [{}]", quote.text, quote.id),
                }
            }
        }
    }
    Ok(())
}

async fn handle_mood(action: MoodAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        MoodAction::Add { mood, note, date } => {
            let entry = MoodEntry {
                id: String::new(),
                date: utils::format_date(date.unwrap_or_else(|| planner.today())),
                mood,
                note,
                created_at: String::new(),
            };
            let entry = planner.moods().create(entry).await?;
            println!("Mood recorded (ID: {})", entry.id);
        }
        MoodAction::List => {
            let moods = planner.moods().records().to_vec();
            for (mood, count) in views::mood_distribution(planner.journal(), &moods) {
                println!("{:>4}  {}", count, mood);
            }
        }
    }
    Ok(())
}

fn handle_history(action: HistoryAction, planner: &mut Planner) -> Result<(), CliError> {
    match action {
        HistoryAction::List { entity_type, limit } => {
            for entry in planner.ledger().query_recent(entity_type.as_deref(), limit) {
                println!(
                    "{}  {:<8} {:<11} {}{}",
                    entry.timestamp,
                    entry.entity_type,
                    entry.action,
                    entry.name,
                    entry.details.map(|d| format!(" ({})", d)).unwrap_or_default()
                );
            }
        }
        HistoryAction::Summary => {
            let summary = planner.ledger().summarize();
            println!("Total: {}", summary.total);
            for (label, counts) in [
                ("By type", &summary.by_type),
                ("By action", &summary.by_action),
                ("By month", &summary.by_month),
            ] {
                println!("{}:", label);
                for (key, count) in counts {
                    println!("  {:<12} {}", key, count);
                }
            }
        }
        HistoryAction::Clear { yes } => {
            if !yes {
                return Err(CliError::NotConfirmed(
                    "Clearing history cannot be undone; re-run with --yes".to_string(),
                ));
            }
            planner.ledger().clear();
            println!("History cleared");
        }
    }
    Ok(())
}

fn handle_prefs(action: PrefsAction, planner: &mut Planner) -> Result<(), CliError> {
    let prefs = planner.preferences();
    match action {
        PrefsAction::List => {
            for pref in Preference::ALL {
                println!("{:<20} {}", pref.key(), prefs.get(pref).unwrap_or_default());
            }
        }
        PrefsAction::Get { key } => {
            let pref = Preference::from_key(&key).ok_or(CliError::UnknownPreference(key))?;
            println!("{}", prefs.get(pref).unwrap_or_default());
        }
        PrefsAction::Set { key, value } => {
            let pref = Preference::from_key(&key).ok_or_else(|| CliError::UnknownPreference(key.clone()))?;
            if pref.is_flag() && value != "true" && value != "false" {
                return Err(CliError::UnknownPreference(format!("{} expects true or false", key)));
            }
            prefs.set(pref, &value);
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

fn print_stats(planner: &Planner) {
    let today = planner.today();
    let now = Local::now().naive_local();

    let todos = planner.todos();
    let done = todos.iter().filter(|t| t.completed).count();
    println!("Today: {}", today);
    println!("Tasks: {}/{} done", done, todos.len());
    println!(
        "Habits: {:.0}% of today's habits done",
        views::completion_rate(planner.habits(), today) * 100.0
    );
    let overdue = todos.iter().filter(|t| views::is_overdue(*t, now)).count();
    if overdue > 0 {
        println!("Overdue tasks: {}", overdue);
    }

    let upcoming = views::upcoming_deadlines(todos, now);
    if !upcoming.is_empty() {
        println!("Upcoming:");
        for todo in upcoming {
            println!("  {}  {}", todo.due_date.as_deref().unwrap_or(""), todo.title);
        }
    }

    let leaders = views::streak_leaderboard(planner.habits());
    if !leaders.is_empty() {
        println!("Top streaks:");
        for habit in leaders {
            println!("  {:>3}  {}", habit.streak, habit.name);
        }
    }

    let tags = views::top_tags(planner.journal());
    if !tags.is_empty() {
        println!("Top journal tags:");
        for (tag, count) in tags {
            println!("  {:>3}  {}", count, tag);
        }
    }

    println!("Journal, last 7 days:");
    for bucket in views::entries_over_time(planner.journal(), DateWindow::last_7_days(today)) {
        println!("  {}  {}", bucket.date, "#".repeat(bucket.count));
    }
}
