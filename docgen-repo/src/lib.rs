//! Docgen Repository - Remote repository crawling and analysis
//!
//! Reads a repository through a hosting API, walks its tree and builds the
//! structural analysis handed to documentation generation.

pub mod analyzer;
pub mod api;
pub mod classifier;
pub mod dependencies;
pub mod profiler;
pub mod service;
pub mod walker;

pub use analyzer::*;
pub use api::{
    decode_utf8, parse_repository_url, GitHubHost, HostConfig, HostFactory, HostFailure,
    InMemoryHost, RepositoryHost,
};
pub use classifier::{classify, extension_of, language_for_extension};
pub use dependencies::*;
pub use profiler::*;
pub use service::*;
pub use walker::*;
