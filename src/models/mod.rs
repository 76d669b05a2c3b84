pub mod mode;
pub mod question;
pub mod usage;

pub use mode::{Mode, UnknownMode};
pub use question::{Answer, Feedback, Fingerprint, QuestionContext, QuestionKind};
pub use usage::TokenUsage;
