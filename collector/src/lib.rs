mod error;
mod fetch;
mod ids;
mod login;

#[cfg(test)]
mod fake;

pub use error::CollectError;
pub use fetch::{collect, CollectSummary, TIMELINE_LIMIT};
pub use ids::{collected_ids, load_ids, remaining_ids, remove_partial_files};
pub use login::{login, LoginSummary};
