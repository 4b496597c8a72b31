//! GitHub and process integration for lhimpact.
//!
//! Provides the integration glue around the pure core: shell command
//! execution, the gist artifact store, the pull-request comment store, the
//! command-backed report generator, and the pipeline that sequences a full
//! measure-compare-publish run.

pub mod exec;
pub mod generator;
pub mod gists;
pub mod pipeline;
pub mod pulls;
