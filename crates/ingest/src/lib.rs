pub mod completion;
pub mod dedup;
pub mod fingerprint;
pub mod parser;
pub mod pipeline;
pub mod rules;
pub mod similarity;
pub(crate) mod util;

pub use completion::{
    ChatCompletion, ChatCompletionConfig, CompletionBackend, CompletionError, MockCompletion,
    DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_URL,
};
pub use dedup::{Admission, DedupGate};
pub use fingerprint::fingerprint;
pub use parser::{extract_amount, ParseSource, ParsedTransaction, TextParser};
pub use pipeline::IngestPipeline;
pub use rules::{KeywordRule, KeywordRules, RulesError};
pub use similarity::similarity;
