//! Datastore connection and session traits

use crate::error::StoreError;
use crate::tree::DataTree;

/// Which datastore a session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatastoreKind {
    /// Intended configuration, persists across sessions.
    Running,
    /// Runtime state; a session's contribution lives as long as the session.
    Operational,
}

impl DatastoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Operational => "operational",
        }
    }
}

impl std::fmt::Display for DatastoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatastoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "operational" => Ok(Self::Operational),
            other => Err(format!("unknown datastore '{other}'")),
        }
    }
}

/// An open connection to a datastore backend.
///
/// Closing the connection is dropping it.
pub trait Datastore {
    type Session: Session;

    /// Start a session on `kind`. Calls block until the backend answers.
    fn start_session(&self, kind: DatastoreKind) -> Result<Self::Session, StoreError>;
}

/// A session on one datastore.
///
/// Edits are staged with [`edit_batch`](Session::edit_batch) and become
/// visible only through [`apply_changes`](Session::apply_changes), which
/// commits the whole staged batch or nothing. Dropping a session without
/// calling [`stop`](Session::stop) still releases it.
pub trait Session {
    /// Backend-assigned identifier, for diagnostics.
    fn id(&self) -> &str;

    fn datastore(&self) -> DatastoreKind;

    /// Stage a tree as one batched edit.
    fn edit_batch(&mut self, tree: &DataTree) -> Result<(), StoreError>;

    /// Commit everything staged since the last commit.
    ///
    /// On error the staged batch is discarded.
    fn apply_changes(&mut self) -> Result<(), StoreError>;

    /// Drop staged edits without committing them.
    fn discard_changes(&mut self);

    /// Read the leaves selected by `xpath` from the session's datastore.
    fn get_data(&self, xpath: &str) -> Result<DataTree, StoreError>;

    /// Cheap round trip proving the session is still held by the backend.
    /// Must not modify any data.
    fn keepalive(&self) -> Result<(), StoreError>;

    /// Release the session. Operational data it contributed goes away.
    fn stop(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datastore_kind_round_trip() {
        for kind in [DatastoreKind::Running, DatastoreKind::Operational] {
            assert_eq!(kind.as_str().parse::<DatastoreKind>(), Ok(kind));
        }
        assert!("startup".parse::<DatastoreKind>().is_err());
    }
}
