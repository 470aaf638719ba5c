use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;

const DEFAULT_PROMPTS: &[&str] = &[
    "Draw a peacock in Madhubani style",
    "Sketch a Warli harvest dance",
    "Draw a fish surrounded by lotus flowers",
    "Paint the sun rising over a village",
    "Draw a tree of life with birds",
    "Sketch an elephant carrying a palanquin",
    "Draw a bride and groom in a wedding procession",
    "Sketch farmers working in a paddy field",
    "Draw a tiger hiding in tall grass",
    "Paint the moon over a quiet river",
];

/// Fixed, ordered list of drawing prompts. Never empty.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    prompts: Vec<String>,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            prompts: DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PromptCatalog {
    pub fn new(prompts: Vec<String>) -> Result<Self> {
        let prompts: Vec<String> = prompts
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if prompts.is_empty() {
            bail!("prompt catalog must contain at least one prompt");
        }
        Ok(Self { prompts })
    }

    /// Loads one prompt per non-blank line; lines starting with `#` are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompts from {}", path.display()))?;
        let prompts = contents
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .map(str::to_string)
            .collect();
        Self::new(prompts).with_context(|| format!("No prompts found in {}", path.display()))
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Uniform pick with replacement; repeats across rounds are allowed.
    pub fn pick(&self) -> String {
        self.prompts
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}
