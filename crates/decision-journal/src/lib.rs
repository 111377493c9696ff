pub mod journal;

pub use journal::{DecisionJournal, DecisionStats, NewJournalEntry};
