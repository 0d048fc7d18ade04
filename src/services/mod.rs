pub mod classifier;
pub mod export_writer;
pub mod llm_service;
pub mod report;
pub mod warn_writer;

pub use classifier::{classify, classify_cards, Classified};
pub use export_writer::ExportWriter;
pub use llm_service::{parse_card_response, CardReader, LlmService};
pub use report::{aggregate, filter, AnswerCounts, Filter};
pub use warn_writer::WarnWriter;
