//! Attachment downloads.
//!
//! Each hosted attachment is fetched on its own tokio task so that every
//! attachment of a document downloads in parallel. Reading a task's bytes is
//! the only point that waits.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dfid_transition::fetch::{FetchTask, HttpFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new()?);
//! let task = FetchTask::spawn(fetcher, "http://r4d.dfid.gov.uk/pdfs/some.pdf");
//! let bytes = task.bytes().await?;
//! println!("fetched {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod task;

pub use client::{AttachmentFetcher, HttpFetcher, USER_AGENT};
pub use error::DownloadError;
pub use task::FetchTask;
