//! CLI command implementations.

mod config;
mod create_page;
mod doctor;
mod generate;
mod init;
mod mcp;
mod optimize;
mod preview;
mod serve;
mod status;
mod update_homepage;

pub use config::run_config;
pub use create_page::run_create_page;
pub use doctor::run_doctor;
pub use generate::run_generate;
pub use init::run_init;
pub use mcp::run_mcp;
pub use optimize::run_optimize;
pub use preview::run_preview;
pub use serve::run_serve;
pub use status::run_status;
pub use update_homepage::run_update_homepage;
