mod catalog;
mod countdown;
mod ids;
mod ledger;
mod outcome;
mod question;

pub use ids::{Category, QuestionId, SessionId};

pub use catalog::{Catalog, CatalogError};
pub use countdown::{Countdown, TickOutcome, format_secs};
pub use ledger::{AnswerLedger, RecordOutcome};
pub use outcome::{
    EndReason, PerformanceBand, QuestionReview, SessionOutcome, SessionReport, percentage,
};
pub use question::{Difficulty, Question, QuestionRecord, normalize_options};
