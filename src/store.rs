//! AWS credentials file storage.
//!
//! The credentials file is an INI document with one section per profile:
//!
//! ```ini
//! [default]
//! aws_access_key_id=AKIA...
//! aws_secret_access_key=...
//!
//! [default-sts]
//! aws_access_key_id=ASIA...
//! aws_secret_access_key=...
//! aws_session_token=...
//! expiration=2024-01-01T12:00:00Z
//! ```
//!
//! [`CredentialsDocument`] keeps the text it was loaded from. Saving rewrites only the keys
//! that were explicitly set, in place and with their original spacing; comments, blank lines
//! and every other section are written back byte for byte.
//!
//! [`CredentialsFile`] is the on-disk [`CredentialStore`]. It refuses to load a missing or
//! empty file, and saves through a temporary file in the same directory that is renamed over
//! the target, so an interrupted save never leaves a truncated credentials file behind.

use std::{
    env, fmt,
    io::{self, Write},
    path::{Path, PathBuf},
};

use configparser::ini::Ini;
use log::debug;
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Name given to keys that appear before any section header.
///
/// The parser's own default is `default`, which would merge a real `[default]` profile into
/// the header-less block.
const HEADERLESS_SECTION: &str = "\u{0}headerless";

const COMMENT_PREFIXES: [char; 2] = ['#', ';'];
const DELIMITERS: [char; 2] = ['=', ':'];

/// Sectioned key/value view of an AWS credentials file.
pub struct CredentialsDocument {
    ini: Ini,
    /// Text the document was parsed from.
    source: String,
    /// `(section, key)` pairs set since parsing, in first-set order.
    edits: Vec<(String, String)>,
}

impl CredentialsDocument {
    /// Parses credentials file content.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut ini = Ini::new_cs();
        ini.set_default_section(HEADERLESS_SECTION);
        // Secrets and credential_process commands may contain `#` or `;`.
        ini.set_inline_comment_symbols(Some(&[]));
        ini.read(content.to_owned())?;

        Ok(Self {
            ini,
            source: content.to_owned(),
            edits: Vec::new(),
        })
    }

    /// Sets `key` in `section`, creating the section if needed and overwriting any
    /// existing value in place.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.set(section, key, Some(value.to_owned()));
        if !self.edits.iter().any(|(s, k)| s == section && k == key) {
            self.edits.push((section.to_owned(), key.to_owned()));
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    /// Section names in file order.
    pub fn sections(&self) -> Vec<String> {
        self.ini
            .get_map_ref()
            .keys()
            .filter(|name| name.as_str() != HEADERLESS_SECTION)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ini.get_map_ref().is_empty()
    }

    fn edited_value(&self, section: &str, key: &str) -> Option<String> {
        self.edits
            .iter()
            .any(|(s, k)| s == section && k == key)
            .then(|| self.ini.get(section, key))
            .flatten()
    }

    /// `key=value` lines for edits to `section` that are not in `written` yet.
    fn pending_lines<'a>(
        &'a self,
        section: &str,
        written: &mut Vec<(&'a str, &'a str)>,
    ) -> String {
        let mut lines = String::new();
        for (s, k) in &self.edits {
            if s != section || written.iter().any(|&(ws, wk)| ws == s && wk == k) {
                continue;
            }
            if let Some(value) = self.ini.get(s, k) {
                lines.push_str(&format!("{k}={value}\n"));
            }
            written.push((s.as_str(), k.as_str()));
        }
        lines
    }

    /// Re-renders the loaded text with the edited keys replaced in place.
    ///
    /// Lines outside edited keys are copied unchanged. Keys new to an existing section go
    /// after its last key line, and new sections are appended at the end.
    fn render(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut section: Option<&str> = None;
        let mut seen: Vec<&str> = Vec::new();
        let mut written: Vec<(&str, &str)> = Vec::new();
        let mut insert_at = 0;

        for line in self.source.split_inclusive('\n') {
            if let Some(name) = section_name(line) {
                if let Some(current) = section {
                    let pending = self.pending_lines(current, &mut written);
                    insert_lines(&mut out, insert_at, &pending);
                }
                section = Some(name);
                seen.push(name);
                out.push_str(line);
                insert_at = out.len();
                continue;
            }

            match key_line(line) {
                Some((key, prefix)) => {
                    match section.and_then(|name| Some((name, self.edited_value(name, key)?))) {
                        Some((name, value)) => {
                            out.push_str(prefix);
                            out.push_str(&value);
                            out.push_str(line_ending(line));
                            written.push((name, key));
                        }
                        None => out.push_str(line),
                    }
                    insert_at = out.len();
                }
                None => out.push_str(line),
            }
        }
        if let Some(current) = section {
            let pending = self.pending_lines(current, &mut written);
            insert_lines(&mut out, insert_at, &pending);
        }

        for (name, _) in &self.edits {
            if seen.contains(&name.as_str()) {
                continue;
            }
            seen.push(name.as_str());
            if !out.is_empty() {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                if !out.ends_with("\n\n") {
                    out.push('\n');
                }
            }
            out.push_str(&format!("[{name}]\n"));
            out.push_str(&self.pending_lines(name, &mut written));
        }
        out
    }
}

fn section_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix('[')?;
    let end = rest.rfind(']')?;
    Some(rest[..end].trim())
}

/// Splits a `key = value` line into its key and everything up to the start of the value.
fn key_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() || trimmed.starts_with(COMMENT_PREFIXES) {
        return None;
    }
    let pos = line.find(DELIMITERS)?;
    let after = &line[pos + 1..];
    let value_start = pos + 1 + (after.len() - after.trim_start_matches([' ', '\t']).len());
    Some((line[..pos].trim(), &line[..value_start]))
}

fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn insert_lines(out: &mut String, at: usize, lines: &str) {
    if lines.is_empty() {
        return;
    }
    if at > 0 && !out[..at].ends_with('\n') {
        out.insert_str(at, &format!("\n{lines}"));
    } else {
        out.insert_str(at, lines);
    }
}

impl fmt::Display for CredentialsDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for CredentialsDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsDocument")
            .field("sections", &self.sections())
            .finish()
    }
}

/// Loads and persists a [`CredentialsDocument`].
pub trait CredentialStore {
    /// Location reported to the operator after a save.
    fn path(&self) -> &Path;

    fn load(&self) -> Result<CredentialsDocument, StoreError>;

    fn save(&self, document: &CredentialsDocument) -> Result<(), StoreError>;
}

/// Credentials file on the local filesystem.
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `AWS_SHARED_CREDENTIALS_FILE` if set, otherwise `~/.aws/credentials`.
    pub fn from_env() -> Result<Self, StoreError> {
        let path = env::var_os("AWS_SHARED_CREDENTIALS_FILE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|d| d.join(".aws").join("credentials")))
            .ok_or(StoreError::NoHomeDir)?;
        Ok(Self::new(path))
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for CredentialsFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialsDocument, StoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            match source.kind() {
                io::ErrorKind::NotFound => StoreError::NotFound(self.path.clone()),
                _ => StoreError::Read {
                    path: self.path.clone(),
                    source,
                },
            }
        })?;

        let document = CredentialsDocument::parse(&content).map_err(|message| StoreError::Parse {
            path: self.path.clone(),
            message,
        })?;
        if document.is_empty() {
            return Err(StoreError::Empty(self.path.clone()));
        }

        debug!(
            "Loaded {} profiles from {}",
            document.sections().len(),
            self.path.display()
        );
        Ok(document)
    }

    fn save(&self, document: &CredentialsDocument) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        // Created with mode 0600 on Unix.
        let mut file = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        file.write_all(document.to_string().as_bytes())
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| self.write_error(e))?;
        file.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}
