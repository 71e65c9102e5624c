// ─── Version Browser Core ───
// Non-interactive plumbing behind the browser.
//
// Architecture:
//   core/
//     config      — Optional JSON config with built-in defaults
//     http        — Shared client + 429 rate-limit window
//     version/    — Version manifest + per-version descriptor
//     downloader/ — Rate-limited single, streamed and batch downloads
//     assets/     — Asset index + hashed resource sync
//     archive/    — Scoped temporary archive + prefix-filtered extraction
//     pipeline    — The download operation tying the above together

pub mod archive;
pub mod assets;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod version;
