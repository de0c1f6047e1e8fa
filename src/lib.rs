// Patent Feed - Core Library
// Exposes all modules for use in the CLI and tests

pub mod error;
pub mod identifier;
pub mod parser;
pub mod extractor;
pub mod transport;
pub mod patents;
pub mod kit;

// Re-export commonly used types
pub use error::{ExtractError, FetchError, LineDefect, SequenceError};
pub use identifier::{canonical_id, CompositeKey};
pub use parser::{decode_line, first_field, CompositeKeyParser, LineOutcome, LineParser};
pub use extractor::{extract, ExtractConfig, ExtractSummary, Extractor};
pub use transport::{FeedClient, FeedReader, DEFAULT_TIMEOUT};
pub use patents::{fetch_identifiers, us_patents};
pub use kit::{download, extract_links, hash_file, Download, FileDigest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
