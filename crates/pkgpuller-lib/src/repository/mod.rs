mod apt;
mod fetcher;
mod rpm;
pub mod types;

pub use apt::parse_packages_index;
pub use fetcher::{FetchOutcome, FetchedIndex, ScratchFiles, fetch_index, read_local_index};
pub use rpm::{parse_primary, primary_location};
pub use types::{IndexEntry, IndexError, RepositoryIndex};
