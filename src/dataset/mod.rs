//! CSV dataset storage for collected pull request data.

mod row;
mod store;

pub use row::PullRequestRow;
pub use store::{DEFAULT_BATCH_SIZE, Dataset, last_recorded_number, read_rows, write_rows};
