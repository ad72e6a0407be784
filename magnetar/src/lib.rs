// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

#[path = "commands.rs"]
pub mod commands;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    crawl_options_from_matches, load_urls_from_file, load_urls_from_source, parse_url_line,
};

// Re-export crawl functionality from magnetar-core
pub use magnetar_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
