//! Per-call load options. No global state.

use crate::decode::UnknownKeys;
use crate::document::DEFAULT_SOURCE;
use crate::interp::{NameEnv, Substitution};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Accept a stream of several documents.
    pub multi_document: bool,
    pub name_env: NameEnv,
    pub name_substitution: Substitution,
    pub unknown_keys: UnknownKeys,
    /// Label reported in positions, e.g. a file path.
    pub source: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            multi_document: false,
            name_env: NameEnv::default(),
            name_substitution: Substitution::new(),
            unknown_keys: UnknownKeys::default(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multi_document(mut self, on: bool) -> Self {
        self.multi_document = on;
        self
    }

    pub fn name_env(mut self, env: NameEnv) -> Self {
        self.name_env = env;
        self
    }

    /// Replace references to record `from` with record `to`.
    pub fn substitute(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.name_substitution.insert(from.into(), to.into());
        self
    }

    pub fn name_substitution(mut self, table: Substitution) -> Self {
        self.name_substitution = table;
        self
    }

    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn source(mut self, label: impl Into<String>) -> Self {
        self.source = label.into();
        self
    }
}
