//! # CCNS Runtime
//!
//! Deploys the name service onto a local transport and runs the
//! register → relay → lookup scenario.
//!
//! ## Modular Structure
//!
//! - `config` - `RuntimeConfig`, loaded from JSON and environment
//! - `deployment` - component wiring and the scenario driver
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (file, then environment)
//! 3. Deploy source and destination components
//! 4. Register the configured name and relay the messages
//! 5. Report the owner resolved on each domain

pub mod config;
pub mod deployment;

pub use config::{FeeTokenChoice, RuntimeConfig, CONFIG_PATH_ENV};
pub use deployment::{Deployment, ScenarioReport, RECEIVER_ADDRESS, REGISTRAR_ADDRESS};
