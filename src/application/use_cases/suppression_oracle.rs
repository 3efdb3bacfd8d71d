//! Combined suppression test over the user list, DNC, TCPA and the shared
//! global list.
//!
//! Sources are held as shared hash sets so one loaded list can serve many
//! concurrent jobs. A missing source behaves like an empty one.

use std::sync::Arc;

use crate::domain::phone::PhoneKey;
use crate::domain::scrub_options::ScrubOptions;
use crate::domain::suppression::{KeySet, SourceName};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub excluded: bool,
    /// Every enabled source containing the key, in registration order.
    pub matched: Vec<SourceName>,
}

#[derive(Debug, Clone, Default)]
pub struct SuppressionOracle {
    sources: Vec<(SourceName, Arc<KeySet>)>,
}

impl SuppressionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. Registering the same name twice replaces it.
    pub fn with_source(mut self, name: SourceName, keys: Arc<KeySet>) -> Self {
        self.sources.retain(|(existing, _)| *existing != name);
        self.sources.push((name, keys));
        self
    }

    /// A key is excluded when any source enabled by `options` contains it.
    /// Disabled sources neither exclude nor get attributed.
    pub fn classify(&self, key: &PhoneKey, options: &ScrubOptions) -> Classification {
        let matched: Vec<SourceName> = self
            .sources
            .iter()
            .filter(|(name, keys)| name.is_enabled(options) && keys.contains(key))
            .map(|(name, _)| *name)
            .collect();

        Classification {
            excluded: !matched.is_empty(),
            matched,
        }
    }
}
