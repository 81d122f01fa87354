//! A core library for supervising a small fixed set of named external processes
//!
//! Each configured process is owned by a [`supervisor::ProcessSupervisor`]
//! that launches it with stdout and stderr redirected into a rotating log
//! file, and stops it again with a bounded graceful-termination wait. The
//! ordered collection of supervisors lives in a
//! [`registry::SupervisorRegistry`], which is what the interactive menu
//! front-end (the `tsk` binary) talks to. The core never touches the
//! terminal; rendering and keystroke handling live in [`menu`] and the
//! binary.

pub mod config;
pub mod error;
pub mod menu;
pub mod registry;
pub mod rotation;
pub mod supervisor;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::config::{ProcessSpec, TskConfig};
    pub use crate::error::{Result, TskError};
    pub use crate::registry::{LookupError, SupervisorRegistry};
    pub use crate::rotation::LogRotator;
    pub use crate::supervisor::{
        ProcessStatus, ProcessSupervisor, StartError, StopError, ToggleError,
    };
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
