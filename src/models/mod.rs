pub mod chat;
pub mod sleep;
pub mod workout;

pub use chat::{ChatMessage, ChatRequest, MessagePart, Role};
pub use sleep::{ProcessedSleepEntry, ScoreBand, SleepDayEntry, SleepScores, SleepSummary};
pub use workout::{Exercise, Workout, WorkoutDraft, WorkoutStep};
