//! reviewkit: collect work evidence and draft self-assessment reports.
//!
//! The library gathers three kinds of evidence: daily records kept in a
//! remote store, assigned work pulled from Jira or Trello, and rows imported
//! from spreadsheet uploads. A reducer-style [`state::Store`] holds the
//! working state, [`pipeline::aggregate`] normalizes it, and
//! [`report::synthesize`] renders the markdown report. Binaries: the
//! `reviewkit` CLI and the `reviewkit-proxy` CORS proxy for browser-side
//! Jira calls.

pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod importer;
pub mod pipeline;
pub mod proxy;
pub mod records;
pub mod report;
pub mod state;
pub mod trackers;
pub mod types;
pub mod util;

pub use error::{Error, Result};
