pub mod aggregate;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod resolver;
pub mod result;
pub mod signal;
pub mod stage;
pub mod visited;

pub use aggregate::LinkTable;
pub use crawler::{Crawler, DiscoveryCallback, ProgressCallback};
pub use error::ScanError;
pub use extract::{HtmlLinkExtractor, LinkExtractor};
pub use result::{DiscoveredLink, LinkSighting, Target};
pub use visited::VisitedSet;
