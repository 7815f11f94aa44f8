mod summary;

pub use summary::{render_summary, write_summary_json};
