//! Basic low-level line and tag reading functionality.
pub mod buffered_line_source;
pub mod line_source;
pub mod parsing_error;
pub mod tag_reader;

pub use buffered_line_source::BufferedLineSource;
pub use line_source::{InMemoryLineSource, LineSource};
pub use parsing_error::{ParsingError, ParsingErrorType};
pub use tag_reader::{Tag, TagReader};
