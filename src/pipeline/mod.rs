//! Pipeline stage handlers, one per collection phase.
//!
//! Each stage reads and/or extends the dataset and is independently
//! resumable: scrape appends new rows, comments and categorize fill columns
//! in existing rows, and filter derives a separate dataset.

mod categorize;
mod comments;
mod filter;
mod scrape;

pub use categorize::run_categorize;
pub use comments::run_comments;
pub use filter::run_filter;
pub use scrape::{ScrapeOptions, checked_task_items, run_scrape};
