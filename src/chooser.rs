//! File choosers for NeuroML and LEMS files.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::config::ChooserConfig;
use crate::error::{Result, WidgetsError};

/// A directory listing restricted to one filename pattern
#[derive(Debug, Clone)]
pub struct FileChooser {
    title: String,
    root: PathBuf,
    pattern: Pattern,
    default_filename: String,
    show_hidden: bool,
}

impl FileChooser {
    pub fn new(title: impl Into<String>, pattern: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern).map_err(|e| WidgetsError::Config {
            message: format!("invalid file pattern '{pattern}': {e}"),
        })?;
        Ok(Self {
            title: title.into(),
            root: PathBuf::from("."),
            pattern,
            default_filename: String::new(),
            show_hidden: false,
        })
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_default(mut self, filename: impl Into<String>) -> Self {
        self.default_filename = filename.into();
        self
    }

    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn default_filename(&self) -> &str {
        &self.default_filename
    }

    pub fn matches(&self, filename: &str) -> bool {
        if !self.show_hidden && filename.starts_with('.') {
            return false;
        }
        self.pattern.matches(filename)
    }

    /// Matching files directly inside the root directory, sorted by name
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| WidgetsError::io(&self.root, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WidgetsError::io(&self.root, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name();
            if is_file && self.matches(&name.to_string_lossy()) {
                files.push(entry.path());
            }
        }
        files.sort();
        tracing::debug!(
            "{}: {} file(s) matching {} in {}",
            self.title,
            files.len(),
            self.pattern,
            self.root.display()
        );
        Ok(files)
    }

    /// Resolve a chosen filename, or the default when `filename` is empty
    pub fn select(&self, filename: &str) -> Result<PathBuf> {
        let filename = if filename.is_empty() {
            self.default_filename.as_str()
        } else {
            filename
        };
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.is_empty() || !self.matches(&name) {
            return Err(WidgetsError::Validation {
                message: format!("'{filename}' does not match {}", self.pattern),
            });
        }
        Ok(self.root.join(filename))
    }
}

/// Chooser for NeuroML model files (`*.nml` unless configured otherwise)
pub fn nml_file_chooser(config: &ChooserConfig, default: &str) -> Result<FileChooser> {
    Ok(FileChooser::new("Choose NeuroML file", &config.nml_pattern)?
        .with_default(default)
        .with_hidden(config.show_hidden))
}

/// Chooser for LEMS simulation files (`LEMS*xml` unless configured otherwise)
pub fn lems_file_chooser(config: &ChooserConfig, default: &str) -> Result<FileChooser> {
    Ok(FileChooser::new("Choose LEMS file", &config.lems_pattern)?
        .with_default(default)
        .with_hidden(config.show_hidden))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_matching_visible_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.nml", "a.nml", ".hidden.nml", "LEMS_sim.xml", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("dir.nml")).unwrap();

        let chooser = nml_file_chooser(&ChooserConfig::default(), "")
            .unwrap()
            .with_root(dir.path());
        let names: Vec<String> = chooser
            .list()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.nml", "b.nml"]);

        let hidden = chooser.with_hidden(true).list().unwrap();
        assert_eq!(hidden.len(), 3);
    }

    #[test]
    fn lems_pattern() {
        let chooser = lems_file_chooser(&ChooserConfig::default(), "LEMS_sim.xml").unwrap();
        assert!(chooser.matches("LEMS_net.xml"));
        assert!(!chooser.matches("sim.xml"));
        assert_eq!(chooser.select("").unwrap(), PathBuf::from("./LEMS_sim.xml"));
        assert!(chooser.select("cell.nml").is_err());
    }
}
