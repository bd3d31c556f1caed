//! Backend boundary: the dispatcher that performs real backend calls and
//! the monitor that reports whether the backend is reachable.
//!
//! Both are traits so the queue core stays independent of transport
//! details; production implementations shell out to a configured backend
//! program and probe a TCP endpoint respectively.

pub mod dispatcher;
pub mod monitor;

pub use dispatcher::{CommandDispatcher, DispatchError, Dispatcher};
pub use monitor::{ConnectionMonitor, ConnectionState, ProbeMonitor, StaticMonitor};
