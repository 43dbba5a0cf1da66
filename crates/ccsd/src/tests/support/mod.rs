//! Test doubles and harnesses shared by unit and behavioural suites.

mod client;
mod compiler;
mod config_loader;
mod reporter;
mod world;

pub(crate) use client::send_request;
pub(crate) use compiler::{RecordingCompiler, RecordingProvider};
pub(crate) use config_loader::{FailingConfigLoader, TestConfigLoader};
pub(crate) use reporter::{HealthEvent, RecordingHealthReporter};
pub(crate) use world::{TestWorld, world};
