//! Test suites for service bootstrap and the wire protocol.

mod behaviour;
pub(crate) mod support;
