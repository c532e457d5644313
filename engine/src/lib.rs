//! Calorie tracker engine
//!
//! Energy balance, weight prediction and the persisted log document. The
//! CLI binary and the browser module both drive `state::TrackerStore`.

pub mod config;
pub mod error;
pub mod migration;
pub mod services;
pub mod state;
pub mod storage;
