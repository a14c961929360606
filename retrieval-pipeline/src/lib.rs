pub mod answer_retrieval;
pub mod prompt;

pub use answer_retrieval::{AnswerPipeline, TOP_K};
