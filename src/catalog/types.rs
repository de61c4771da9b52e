use super::defaults::default_forms;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Identifier -> download URL, ordered by identifier
pub type FormMap = BTreeMap<String, String>;

/// A single downloadable form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormEntry {
    pub identifier: String,
    pub url: String,
}

impl FormEntry {
    pub fn new(identifier: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}' (expected light or dark)")),
        }
    }
}

/// When the live listing was last fetched successfully.
/// Persisted as the literal string "Never" or a timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LastChecked {
    #[default]
    Never,
    At(String),
}

impl From<String> for LastChecked {
    fn from(value: String) -> Self {
        if value == "Never" {
            LastChecked::Never
        } else {
            LastChecked::At(value)
        }
    }
}

impl From<LastChecked> for String {
    fn from(value: LastChecked) -> Self {
        match value {
            LastChecked::Never => "Never".to_string(),
            LastChecked::At(ts) => ts,
        }
    }
}

impl fmt::Display for LastChecked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastChecked::Never => write!(f, "Never"),
            LastChecked::At(ts) => write!(f, "{ts}"),
        }
    }
}

/// The active form catalog plus session metadata.
///
/// This is also the on-disk record: a missing `forms` key is seeded with
/// the built-in table, every other missing key takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_forms")]
    pub forms: FormMap,

    #[serde(default)]
    pub last_folder: String,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub last_checked: LastChecked,

    /// Full set extracted by the most recent successful sync
    #[serde(default)]
    pub form_versions: FormMap,

    /// Identifiers the user added by hand
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub custom_forms: BTreeSet<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_forms(default_forms())
    }
}

impl Catalog {
    /// A catalog with no forms at all
    pub fn empty() -> Self {
        Self::with_forms(FormMap::new())
    }

    pub fn with_forms(forms: FormMap) -> Self {
        Self {
            forms,
            last_folder: String::new(),
            theme: Theme::default(),
            last_checked: LastChecked::Never,
            form_versions: FormMap::new(),
            custom_forms: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.forms.get(identifier).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = FormEntry> + '_ {
        self.forms
            .iter()
            .map(|(identifier, url)| FormEntry::new(identifier.clone(), url.clone()))
    }

    /// Case-insensitive substring match on identifiers; an empty query matches everything
    pub fn search(&self, query: &str) -> Vec<FormEntry> {
        let query = query.trim().to_lowercase();
        self.entries()
            .filter(|entry| query.is_empty() || entry.identifier.to_lowercase().contains(&query))
            .collect()
    }
}
