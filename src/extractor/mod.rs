//! Resource extraction providers
//!
//! The pipeline never talks to a media origin itself. It goes through the
//! [`MediaExtractor`] trait, which has two blocking operations: produce the
//! catalog of renditions for a URL, and transfer one rendition to a local path.
//!
//! ## Implementations
//!
//! - [`YtDlpExtractor`]: drives the external `yt-dlp` binary
//! - [`NoOpExtractor`]: stand-in when no provider is installed; every call
//!   fails with `Error::NotSupported`
//!
//! ## Usage
//!
//! ```no_run
//! use dvorfs_dl::config::ExtractorConfig;
//! use dvorfs_dl::extractor::{MediaExtractor, YtDlpExtractor};
//!
//! let extractor = YtDlpExtractor::from_config(&ExtractorConfig::default())
//!     .expect("yt-dlp not found");
//! let info = extractor
//!     .extract_catalog("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!     .expect("extraction failed");
//! println!("{} renditions", info.formats.len());
//! ```

mod cli;
mod noop;
mod parser;
mod traits;

pub use cli::YtDlpExtractor;
pub use noop::NoOpExtractor;
pub use parser::parse_resource_info;
pub use traits::MediaExtractor;
