//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use command_palette::SearchSuggestion;
use tempfile::TempDir;

/// Isolated home with config/data directories and catalog files
pub struct TestHome {
    temp_dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    /// Write a config file and return its path
    pub fn with_config(&self, toml: &str) -> PathBuf {
        let path = self.path().join("config.toml");
        fs::write(&path, toml).expect("Failed to write config");
        path
    }

    /// Write `<source>.json` holding `suggestions` and return its path
    pub fn with_catalog(&self, source: &str, suggestions: &[SearchSuggestion]) -> PathBuf {
        let path = self.path().join(format!("{source}.json"));
        let json = serde_json::to_string_pretty(suggestions).expect("Failed to serialize catalog");
        fs::write(&path, json).expect("Failed to write catalog");
        path
    }

    /// The binary with HOME and XDG directories pointed inside this home
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_command-palette"));
        cmd.env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("share"))
            .env_remove("RUST_LOG");
        cmd
    }
}

pub fn people_catalog() -> Vec<SearchSuggestion> {
    vec![
        SearchSuggestion::new("1", "person", "Jean Dupont", "/people/1").with_subtitle("ACME"),
        SearchSuggestion::new("2", "person", "Marie Curie", "/people/2"),
        SearchSuggestion::new("3", "person", "Paul Durand", "/people/3").with_subtitle("Dupont SA"),
    ]
}

pub fn organisation_catalog() -> Vec<SearchSuggestion> {
    vec![
        SearchSuggestion::new("9", "organisation", "Dupont SA", "/organisations/9"),
        SearchSuggestion::new("10", "organisation", "ACME", "/organisations/10"),
    ]
}
