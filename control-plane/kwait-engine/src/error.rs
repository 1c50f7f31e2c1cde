use std::fmt;
use std::time::Duration;

use kwait_models::ReleaseNameError;
use kwait_storage::StorageError;

use crate::orchestrator::OrchestratorError;
use crate::poller::{PendingResource, join_pending};

/// Caller-facing failure of a wait.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("release name is invalid: {name}")]
    InvalidReleaseName {
        name: String,
        #[source]
        source: ReleaseNameError,
    },

    #[error("release: not found: {name}")]
    ReleaseNotFound { name: String },

    #[error("failed to load release {name}")]
    Storage {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("kubernetes cluster unreachable")]
    Connectivity {
        #[source]
        source: OrchestratorError,
    },

    #[error("unable to build kubernetes objects from release manifest of {release}")]
    ManifestBuild {
        release: String,
        #[source]
        source: OrchestratorError,
    },

    #[error(
        "release {release} not ready: timed out after {elapsed:?} waiting for: {}",
        join_pending(.pending)
    )]
    Timeout {
        release: String,
        elapsed: Duration,
        pending: Vec<PendingResource>,
    },

    #[error("release {release} not ready: {resource}: {reason}")]
    FatalResource {
        release: String,
        resource: String,
        reason: String,
    },

    #[error("release {release} not ready")]
    Orchestrator {
        release: String,
        #[source]
        source: OrchestratorError,
    },
}

impl WaitError {
    /// Terminal state of the wait that produced this error.
    pub fn phase(&self) -> WaitPhase {
        match self {
            WaitError::Connectivity { .. } => WaitPhase::ConnectivityFailed,
            WaitError::ManifestBuild { .. } => WaitPhase::BuildFailed,
            WaitError::Timeout { .. } => WaitPhase::TimedOut,
            WaitError::FatalResource { .. }
            | WaitError::Orchestrator { .. } => WaitPhase::FatalResourceError,
            // release lookup happens before the wait state machine starts
            WaitError::InvalidReleaseName { .. }
            | WaitError::ReleaseNotFound { .. }
            | WaitError::Storage { .. } => WaitPhase::Idle,
        }
    }

    /// Release name the error refers to.
    pub fn release(&self) -> Option<&str> {
        match self {
            WaitError::InvalidReleaseName { name, .. }
            | WaitError::ReleaseNotFound { name }
            | WaitError::Storage { name, .. } => Some(name),
            WaitError::ManifestBuild { release, .. }
            | WaitError::Timeout { release, .. }
            | WaitError::FatalResource { release, .. }
            | WaitError::Orchestrator { release, .. } => Some(release),
            WaitError::Connectivity { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitPhase {
    Idle,
    ConnectivityChecked,
    ManifestBuilt,
    Polling,
    Succeeded,
    TimedOut,
    FatalResourceError,
    ConnectivityFailed,
    BuildFailed,
}

impl WaitPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WaitPhase::Succeeded
                | WaitPhase::TimedOut
                | WaitPhase::FatalResourceError
                | WaitPhase::ConnectivityFailed
                | WaitPhase::BuildFailed
        )
    }
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaitPhase::Idle => "Idle",
            WaitPhase::ConnectivityChecked => "ConnectivityChecked",
            WaitPhase::ManifestBuilt => "ManifestBuilt",
            WaitPhase::Polling => "Polling",
            WaitPhase::Succeeded => "Succeeded",
            WaitPhase::TimedOut => "TimedOut",
            WaitPhase::FatalResourceError => "FatalResourceError",
            WaitPhase::ConnectivityFailed => "ConnectivityFailed",
            WaitPhase::BuildFailed => "BuildFailed",
        };
        f.write_str(s)
    }
}
