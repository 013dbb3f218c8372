use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`CartPoleEnv`](super::CartPoleEnv).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CartPoleConfig {
    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,

    /// Pause after each rendered frame, in milliseconds.
    pub render_wait_millis: u64,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            max_steps: 500,
            render_wait_millis: 20,
        }
    }
}

impl CartPoleConfig {
    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the pause after each rendered frame.
    pub fn render_wait_millis(mut self, v: u64) -> Self {
        self.render_wait_millis = v;
        self
    }

    /// Constructs [`CartPoleConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CartPoleConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
