/*!
 * dirdigest - Concatenate a directory's text files into one digest for LLM context
 *
 * Walks a directory, admits text files that pass the size, binary, hidden and
 * selection filters, renders them between delimiter markers and optionally
 * wraps the result with attachment blocks produced by pluggable renderers.
 */

pub mod attachment;
pub mod binary;
pub mod config;
pub mod error;
pub mod report;
pub mod scanner;
pub mod settings;
pub mod types;
pub mod utils;
pub mod walker;
pub mod writer;


// Re-export main components for easier access
pub use attachment::{
    apply_attachments, register_renderer, AttachmentComposer, AttachmentDescriptor, LogRenderer,
    Position, Renderer, RendererRegistry, RendererType,
};
pub use binary::is_binary;
pub use config::Config;
pub use error::{DigestError, Result};
pub use report::{DigestReport, ReportFormat, Reporter};
pub use scanner::{build_digest, Scanner};
pub use settings::Settings;
pub use types::{AllowSet, CancelToken, CandidateFile, DigestResult, TraversalOptions};
pub use walker::{enumerate, enumerate_candidates, Walker};
pub use writer::DigestWriter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
