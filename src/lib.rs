pub mod cache;
pub mod config;
pub mod error;
pub mod finding;
pub mod gloss;
pub mod index;
pub mod normalize;
pub mod parser;
pub mod resolve;
pub mod rule;
pub mod runner;
pub mod score;
pub mod analyzer {
    pub mod comments;
    pub mod lower;
}

// Re-export selected API for consumers
pub use cache::SharedCaches;
pub use config::{CommentContext, Config, RuleOptions, Sensitivity};
pub use error::{Error, Result};
pub use finding::{Finding, Severity};
pub use parser::{parse_file, traverse, ParsedFile, SourceComment, SyntaxTree};
pub use rule::RedundantCommentRule;
pub use runner::{lint_files, FileReport};
pub use score::is_obvious;
