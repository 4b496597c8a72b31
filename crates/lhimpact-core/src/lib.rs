//! Core types, configuration, and error handling for lhimpact.
//!
//! This crate provides the shared foundation used by the other lhimpact
//! crates:
//! - [`ImpactError`] — unified error type using `thiserror`
//! - [`ImpactConfig`] — configuration loaded from `.lhimpact.toml`
//! - The Lighthouse report data model: [`LighthouseReport`], [`Category`],
//!   [`Audit`], [`ScoreDisplayMode`]
//! - GitHub artifact models: [`Gist`], [`IssueComment`]

mod config;
mod error;
mod types;

pub use config::{CommandConfig, Credentials, GithubConfig, ImpactConfig};
pub use error::ImpactError;
pub use types::{
    Audit, AuditRef, Category, Gist, IssueComment, LighthouseReport, ScoreDisplayMode,
};

/// A convenience `Result` type for lhimpact operations.
pub type Result<T> = std::result::Result<T, ImpactError>;
