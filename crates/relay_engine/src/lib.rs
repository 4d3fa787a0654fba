//! Relay engine: upstream HTTP access for the download/resolve proxy.
mod client;
mod download;
mod filename;
mod hf;
mod persist;
mod proxy;
mod resolve;

pub use client::{
    UpstreamClient, UpstreamError, UpstreamSettings, DEFAULT_HF_BASE, DEFAULT_USER_AGENT,
};
pub use download::{DownloadOutcome, Downloader};
pub use filename::{extract_filename, filename_from_disposition, FALLBACK_FILENAME};
pub use hf::{SearchItem, SearchKind, SearchPage, SearchRequest};
pub use persist::{ensure_download_dir, PersistError, StreamingFileWriter};
pub use proxy::{ProxyStream, PASSTHROUGH_HEADERS};
pub use resolve::Resolution;
