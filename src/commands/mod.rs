//! CLI command handlers.

mod companies;
mod download;
mod fetch;
mod validate;

pub use companies::run_companies_command;
pub use download::run_download_command;
pub use fetch::run_fetch_command;
pub use validate::run_validate_command;
