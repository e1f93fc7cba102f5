// src/executors/language.rs
//! Language dispatch: which interpreter runs which file, and how to ask it
//! for a syntax-only check.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use which::which;

use crate::config::types::LanguageOverride;
use crate::errors::CodepadError;

/// Placeholder replaced with the scratch file path in argument templates.
pub const FILE_PLACEHOLDER: &str = "{file}";

const PYTHON_SYNTAX_CHECK: &str =
    "import sys; compile(open(sys.argv[1]).read(), sys.argv[1], 'exec')";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Python, Language::JavaScript];

    /// Parses a user-supplied language identifier. Case and surrounding
    /// whitespace are ignored.
    pub fn parse(name: &str) -> Option<Language> {
        match name.trim().to_lowercase().as_str() {
            "python" | "python3" | "py" => Some(Language::Python),
            "javascript" | "js" | "node" | "nodejs" => Some(Language::JavaScript),
            _ => None,
        }
    }

    /// Guesses the language from a file extension, used by the CLI.
    pub fn from_path(path: &Path) -> Option<Language> {
        match path.extension()?.to_str()? {
            "py" => Some(Language::Python),
            "js" | "mjs" | "cjs" => Some(Language::JavaScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one language is executed and syntax-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSpec {
    pub extension: String,
    pub program: String,
    pub run_args: Vec<String>,
    pub check_args: Vec<String>,
}

impl LanguageSpec {
    fn defaults_for(language: Language) -> Self {
        match language {
            Language::Python => Self {
                extension: "py".to_string(),
                program: "python3".to_string(),
                run_args: vec![FILE_PLACEHOLDER.to_string()],
                // parse only; nothing may be written next to the scratch file
                check_args: vec![
                    "-c".to_string(),
                    PYTHON_SYNTAX_CHECK.to_string(),
                    FILE_PLACEHOLDER.to_string(),
                ],
            },
            Language::JavaScript => Self {
                extension: "js".to_string(),
                program: "node".to_string(),
                run_args: vec![FILE_PLACEHOLDER.to_string()],
                check_args: vec!["--check".to_string(), FILE_PLACEHOLDER.to_string()],
            },
        }
    }

    pub fn run_args_for(&self, file: &Path) -> Vec<String> {
        expand_args(&self.run_args, file)
    }

    pub fn check_args_for(&self, file: &Path) -> Vec<String> {
        expand_args(&self.check_args, file)
    }

    fn apply(&mut self, overrides: &LanguageOverride) {
        if let Some(program) = &overrides.program {
            self.program = program.clone();
        }
        if let Some(run_args) = &overrides.run_args {
            self.run_args = run_args.clone();
        }
        if let Some(check_args) = &overrides.check_args {
            self.check_args = check_args.clone();
        }
        if let Some(extension) = &overrides.extension {
            self.extension = extension.trim_start_matches('.').to_string();
        }
    }
}

// The extension becomes part of a file name inside the scratch directory,
// so it must not carry separators or traversal segments.
fn check_extension(name: &str, extension: &str) -> Result<(), CodepadError> {
    let bare = extension.trim_start_matches('.');
    if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CodepadError::ConfigError(format!(
            "Invalid file extension '{}' for '{}': only letters and digits are allowed",
            extension, name
        )));
    }
    Ok(())
}

fn expand_args(template: &[String], file: &Path) -> Vec<String> {
    let file = file.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace(FILE_PLACEHOLDER, &file))
        .collect()
}

/// Availability of one interpreter on the host.
#[derive(Debug, Clone, Serialize)]
pub struct InterpreterStatus {
    pub language: Language,
    pub program: String,
    pub available: bool,
}

/// Closed dispatch table from `Language` to its `LanguageSpec`.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    specs: HashMap<Language, LanguageSpec>,
}

impl Default for LanguageTable {
    fn default() -> Self {
        let specs = Language::ALL
            .iter()
            .map(|lang| (*lang, LanguageSpec::defaults_for(*lang)))
            .collect();
        Self { specs }
    }
}

impl LanguageTable {
    /// Builds the table from the built-in defaults plus configured overrides.
    /// Override keys go through `Language::parse`, so `node` and `js` both
    /// address the JavaScript entry.
    pub fn from_overrides(
        overrides: &HashMap<String, LanguageOverride>,
    ) -> Result<Self, CodepadError> {
        let mut table = Self::default();
        let mut seen: HashMap<Language, &str> = HashMap::new();
        for (name, language_override) in overrides {
            let language = Language::parse(name).ok_or_else(|| {
                CodepadError::ConfigError(format!(
                    "Unknown language '{}' in execution.languages",
                    name
                ))
            })?;
            if let Some(previous) = seen.insert(language, name) {
                return Err(CodepadError::ConfigError(format!(
                    "execution.languages keys '{}' and '{}' both configure {}",
                    previous, name, language
                )));
            }
            if let Some(extension) = &language_override.extension {
                check_extension(name, extension)?;
            }
            table.set(language, |spec| spec.apply(language_override));
        }
        Ok(table)
    }

    /// Replaces the spec for one language.
    pub fn with_spec(mut self, language: Language, spec: LanguageSpec) -> Self {
        self.specs.insert(language, spec);
        self
    }

    fn set(&mut self, language: Language, f: impl FnOnce(&mut LanguageSpec)) {
        let spec = self
            .specs
            .entry(language)
            .or_insert_with(|| LanguageSpec::defaults_for(language));
        f(spec);
    }

    pub fn get(&self, language: Language) -> &LanguageSpec {
        // every variant is inserted by Default and never removed
        &self.specs[&language]
    }

    /// Looks up a raw language identifier.
    pub fn resolve(&self, name: &str) -> Option<(Language, &LanguageSpec)> {
        let language = Language::parse(name)?;
        Some((language, self.get(language)))
    }

    /// Reports which interpreters can be found on PATH.
    pub fn available(&self) -> Vec<InterpreterStatus> {
        Language::ALL
            .iter()
            .map(|lang| {
                let spec = self.get(*lang);
                InterpreterStatus {
                    language: *lang,
                    program: spec.program.clone(),
                    available: which(&spec.program).is_ok(),
                }
            })
            .collect()
    }
}
