//! Scan configuration.
//!
//! [`FindConfig`] is the plain-data form, usually read from JSON:
//!
//! ```json
//! { "start": ["src", "docs"], "maxDepth": 3, "expr": {"name": "*.md"},
//!   "caseInsensitive": false, "fanOut": true }
//! ```
//!
//! It compiles to [`FindOptions`], which a [`Finder`] turns into a [`Scan`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::error::{FindError, Result};
use crate::filter::{self, DynFilter};
use crate::fs::{FileSystem, LocalFs};
use crate::query;
use crate::scan::{ErrorCallback, FanOut, Scan};

/// One start path or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartPaths {
    One(String),
    Many(Vec<String>),
}

impl Default for StartPaths {
    fn default() -> Self {
        Self::One(".".to_string())
    }
}

impl StartPaths {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path],
            Self::Many(paths) => paths,
        }
    }
}

/// Deserializable scan configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindConfig {
    /// Roots, in traversal order. Defaults to `"."`.
    #[serde(default)]
    pub start: StartPaths,
    /// Deepest level whose directories are still listed. Unbounded if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Match expression. Everything is emitted if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<serde_json::Value>,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Look up each directory's children concurrently.
    #[serde(default)]
    pub fan_out: bool,
}

impl FindConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|error| FindError::config(format!("invalid scan configuration: {error}")))
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .map_err(|error| FindError::config(format!("invalid scan configuration: {error}")))
    }

    /// Validates the configuration and compiles its expression. No
    /// filesystem access happens here.
    pub fn into_options(self) -> Result<FindOptions> {
        let roots = self.start.into_vec();
        if roots.is_empty() {
            return Err(FindError::config("start: at least one path is required"));
        }
        let filter = match &self.expr {
            Some(expression) => query::compile(expression, self.case_insensitive)?,
            None => filter::always(),
        };
        Ok(FindOptions {
            roots,
            filter,
            max_depth: self.max_depth,
            fan_out: FanOut::from(self.fan_out),
        })
    }
}

/// Compiled, validated scan options.
#[derive(Debug, Clone)]
pub struct FindOptions {
    pub roots: Vec<String>,
    pub filter: DynFilter,
    pub max_depth: Option<usize>,
    pub fan_out: FanOut,
}

impl FindOptions {
    /// Options for scanning `roots` with `filter`, unbounded and sequential.
    pub fn new<I, S>(roots: I, filter: DynFilter) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            filter,
            max_depth: None,
            fan_out: FanOut::Sequential,
        }
    }
}

/// Entry point tying options to a filesystem and the scan's side channels.
pub struct Finder {
    options: FindOptions,
    fs: Arc<dyn FileSystem>,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
}

impl Finder {
    /// Scans the local disk unless [`with_fs`](Finder::with_fs) says otherwise.
    pub fn new(options: FindOptions) -> Self {
        Self {
            options,
            fs: Arc::new(LocalFs),
            on_error: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Parses and compiles a JSON configuration.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(Self::new(FindConfig::from_json(value)?.into_options()?))
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.options.fan_out = fan_out;
        self
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Builds the scan. Nothing is read until it is polled.
    pub fn scan(&self) -> Scan {
        let scan = Scan::new(
            Arc::clone(&self.fs),
            self.options.roots.iter().cloned(),
            Arc::clone(&self.options.filter),
        )
        .with_max_depth(self.options.max_depth)
        .with_fan_out(self.options.fan_out)
        .with_cancel(self.cancel.clone());
        match &self.on_error {
            Some(callback) => scan.on_error(Arc::clone(callback)),
            None => scan,
        }
    }
}
