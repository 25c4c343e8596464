//! Resolver with a fixed set of installed programs.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::codec::ExecutableResolver;

/// Resolves only the programs it was created with, under `/usr/bin`.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    programs: HashSet<String>,
}

impl StaticResolver {
    pub fn new<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            programs: programs.into_iter().map(Into::into).collect(),
        }
    }
}

impl ExecutableResolver for StaticResolver {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.programs
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}
