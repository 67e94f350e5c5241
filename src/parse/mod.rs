pub mod front_matter;
pub mod metadata;
pub mod task_parser;

pub use metadata::{clean_description, extract, first_marker_offset, line_tags, LineMetadata};
pub use task_parser::{parse_checklist_line, parse_document, ChecklistLine};
