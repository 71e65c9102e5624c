pub mod client;

pub use client::{sha1_hex, verify_sha1, DownloadEntry, Downloader, StreamedFile};
