use crate::{Error, Result};
use anyhow::Context;
use std::{env, time::Duration};

/// Batch size used by the `*_all` operations when none is given.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Defaults applied by a [`crate::Session`] to every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub batch_size: usize,
    /// Passed through to the driver with every command.
    pub command_timeout: Option<Duration>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            command_timeout: None,
        }
    }
}

impl Configuration {
    pub const BATCH_SIZE_VAR: &'static str = "BARGE_BATCH_SIZE";
    pub const COMMAND_TIMEOUT_VAR: &'static str = "BARGE_COMMAND_TIMEOUT";

    /// Defaults overridden by `BARGE_BATCH_SIZE` and `BARGE_COMMAND_TIMEOUT` (seconds).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut result = Self::default();
        if let Some(value) = lookup(Self::BATCH_SIZE_VAR) {
            let batch_size = value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid {} `{}`", Self::BATCH_SIZE_VAR, value))?;
            if batch_size == 0 {
                return Err(Error::msg(format!(
                    "{} must be greater than zero",
                    Self::BATCH_SIZE_VAR
                )));
            }
            result.batch_size = batch_size;
        }
        if let Some(value) = lookup(Self::COMMAND_TIMEOUT_VAR) {
            let seconds = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {} `{}`", Self::COMMAND_TIMEOUT_VAR, value))?;
            result.command_timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
        }
        Ok(result)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }
}
