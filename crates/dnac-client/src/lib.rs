//! Client library for the DNA Center task API.
//!
//! Reads task status, waits for asynchronous operations to finish and
//! downloads the files they produce. Everything is built on the
//! [`Transport`] seam; [`HttpTransport`] is the reqwest implementation.

pub mod artifact;
pub mod client;
pub mod command_runner;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod reader;
pub mod tasks;
pub mod transport;
pub mod waiter;

#[cfg(test)]
pub(crate) mod testing;

pub use artifact::{Artifact, ArtifactFetcher};
pub use client::Client;
pub use command_runner::{CommandRunnerRequest, CommandRunnerService};
pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use files::{FileInfo, FileService};
pub use http::HttpTransport;
pub use reader::TaskReader;
pub use tasks::{TaskQuery, TaskService};
pub use transport::{ApiRequest, ApiResponse, Transport};
pub use waiter::{Completion, CompletionWaiter, TransportErrorPolicy, WaitError, WaitPolicy};
