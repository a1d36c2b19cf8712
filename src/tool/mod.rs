pub mod cache;
pub mod download;
pub mod fetch;
pub mod unpack;

pub use cache::ToolCache;
pub use download::{Downloader, HttpDownloader};
pub use fetch::ArchiveFetcher;
