use anyerror::AnyError;

use crate::error::StorageError;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::RaftMetaStore;
use crate::Term;

/// Meta store kept in memory, counting every save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemMetaStore {
    pub term: Term,
    pub voted_for: Option<Endpoint>,
    pub configuration: Option<Configuration>,

    pub term_saves: u64,
    pub configuration_saves: u64,

    /// When set, every save fails.
    pub fail: bool,
}

impl RaftMetaStore for MemMetaStore {
    fn save_term(&mut self, term: Term, voted_for: Option<&Endpoint>) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::new("term", AnyError::error("mem meta store is failing")));
        }

        self.term = term;
        self.voted_for = voted_for.cloned();
        self.term_saves += 1;
        Ok(())
    }

    fn save_configuration(&mut self, configuration: &Configuration) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::new(
                "configuration",
                AnyError::error("mem meta store is failing"),
            ));
        }

        self.configuration = Some(configuration.clone());
        self.configuration_saves += 1;
        Ok(())
    }
}
