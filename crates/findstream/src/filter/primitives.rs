//! Leaf filters.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use super::glob::{glob_to_regex, GlobScope};
use super::type_filter::parse_type_codes;
use super::{Decision, Filter};
use crate::error::{FindError, Result};
use crate::node::PathNode;
use crate::types::FileKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

#[async_trait]
impl Filter for Always {
    async fn decide(&self, _node: &PathNode) -> Result<Decision> {
        Ok(Decision::INCLUDE)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

#[async_trait]
impl Filter for Never {
    async fn decide(&self, _node: &PathNode) -> Result<Decision> {
        Ok(Decision::EXCLUDE)
    }
}

/// Glob match against a node's name or its whole path.
#[derive(Debug, Clone)]
pub struct GlobMatch {
    scope: GlobScope,
    glob: String,
    pattern: Regex,
}

impl GlobMatch {
    pub fn new(scope: GlobScope, glob: &str, case_insensitive: bool) -> Result<Self> {
        let pattern = RegexBuilder::new(&glob_to_regex(glob, scope))
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|error| FindError::config(format!("invalid glob {glob:?}: {error}")))?;
        Ok(Self {
            scope,
            glob: glob.to_string(),
            pattern,
        })
    }

    pub fn glob(&self) -> &str {
        self.glob.as_str()
    }

    pub fn is_match(&self, node: &PathNode) -> bool {
        match self.scope {
            GlobScope::Name => self.pattern.is_match(node.name()),
            GlobScope::Path => self.pattern.is_match(&node.to_string_with('/')),
        }
    }
}

#[async_trait]
impl Filter for GlobMatch {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        Ok(Decision::matched(self.is_match(node)))
    }
}

/// Unanchored regex search over the `/`-joined path.
#[derive(Debug, Clone)]
pub struct RegexMatch {
    pattern: Regex,
}

impl RegexMatch {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|error| FindError::config(format!("invalid regex {pattern:?}: {error}")))?;
        Ok(Self { pattern })
    }
}

#[async_trait]
impl Filter for RegexMatch {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        Ok(Decision::matched(
            self.pattern.is_match(&node.to_string_with('/')),
        ))
    }
}

/// File kind match; needs the node's metadata.
#[derive(Debug, Clone)]
pub struct TypeMatch {
    kinds: Vec<FileKind>,
}

impl TypeMatch {
    pub fn new(codes: &str) -> Result<Self> {
        Ok(Self {
            kinds: parse_type_codes(codes)?,
        })
    }

    pub fn kinds(&self) -> &[FileKind] {
        self.kinds.as_slice()
    }
}

#[async_trait]
impl Filter for TypeMatch {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        let kind = node.stat().await?.kind();
        Ok(Decision::matched(self.kinds.contains(&kind)))
    }
}
