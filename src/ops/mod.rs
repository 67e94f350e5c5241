pub mod line_edit;

pub use line_edit::{add_tag, complete, move_to_column, remove_tag, uncomplete};
