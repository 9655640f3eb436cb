//! Destination names for compressed assets

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::Arc;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\\)?(\w+)(\\)?\]").expect("placeholder pattern is valid"));

/// Structural decomposition of an asset name.
///
/// For `js/main.js?v=1#top`:
/// `original = "js/main.js?v=1#top"`, `file = "js/main.js"`, `path = "js/"`,
/// `base = "main.js"`, `name = "main"`, `ext = ".js"`, `query = "?v=1"`,
/// `fragment = "#top"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathData {
    /// The name exactly as given
    pub original: String,
    /// The name without query and fragment
    pub file: String,
    /// Directory including the trailing `/`, or empty
    pub path: String,
    /// File name with extension
    pub base: String,
    /// File name without extension
    pub name: String,
    /// Extension including the leading `.`, or empty
    pub ext: String,
    /// Query string including the leading `?`, or empty
    pub query: String,
    /// Fragment including the leading `#`, or empty
    pub fragment: String,
}

impl PathData {
    /// Decompose an asset name
    pub fn parse(file: &str) -> Self {
        let (resource, fragment) = match file.find(['?', '#']) {
            Some(i) if file.as_bytes()[i] == b'#' => (&file[..i], &file[i..]),
            Some(i) => match file[i..].find('#') {
                Some(j) => (&file[..i + j], &file[i + j..]),
                None => (file, ""),
            },
            None => (file, ""),
        };

        let (path_part, query) = match resource.find('?') {
            Some(i) => (&resource[..i], &resource[i..]),
            None => (resource, ""),
        };

        let (dir, base) = match path_part.rfind('/') {
            Some(i) => (&path_part[..=i], &path_part[i + 1..]),
            None => ("", path_part),
        };

        let ext = extension(base);
        let name = &base[..base.len() - ext.len()];

        Self {
            original: file.to_string(),
            file: path_part.to_string(),
            path: dir.to_string(),
            base: base.to_string(),
            name: name.to_string(),
            ext: ext.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        }
    }

    fn placeholder(&self, token: &str) -> Option<&str> {
        let value = match token {
            "file" => &self.file,
            "path" => &self.path,
            "base" | "filebase" => &self.base,
            "name" => &self.name,
            "ext" => &self.ext,
            "query" => &self.query,
            "fragment" => &self.fragment,
            _ => return None,
        };
        Some(value)
    }
}

/// Extension of a file name, `.`-prefixed; dotfiles have none.
fn extension(base: &str) -> &str {
    match base.rfind('.') {
        Some(0) | None => "",
        Some(i) => &base[i..],
    }
}

/// Signature of a custom naming function
pub type FilenameFn = dyn Fn(&PathData) -> String + Send + Sync;

/// How to name a compressed asset
#[derive(Clone)]
pub enum Filename {
    /// Template with `[path]`, `[base]`, `[name]`, `[ext]`, `[file]`,
    /// `[query]` and `[fragment]` placeholders
    Template(String),
    /// Function of the decomposed original name
    Function {
        /// Stable identity of the function, used to label relations
        identity: String,
        /// The naming function
        func: Arc<FilenameFn>,
    },
}

impl Filename {
    /// Template filename
    pub fn template(template: impl Into<String>) -> Self {
        Self::Template(template.into())
    }

    /// Function filename. `identity` must change whenever the function's
    /// behavior does.
    pub fn function<F>(identity: impl Into<String>, func: F) -> Self
    where
        F: Fn(&PathData) -> String + Send + Sync + 'static,
    {
        Self::Function {
            identity: identity.into(),
            func: Arc::new(func),
        }
    }

    /// Resolve the destination name for `original`
    pub fn resolve(&self, original: &str) -> String {
        let data = PathData::parse(original);

        match self {
            Self::Template(template) => render(template, &data),
            Self::Function { func, .. } => func(&data),
        }
    }

    /// Whether the destination name is derived from content-identifying
    /// parts of the original name
    pub fn embeds_original_name(&self) -> bool {
        match self {
            Self::Template(template) => ["[name]", "[base]", "[file]"]
                .iter()
                .any(|token| template.contains(token)),
            Self::Function { .. } => false,
        }
    }

    /// Extension of a template (query stripped), without the dot
    pub fn template_extension(&self) -> Option<&str> {
        match self {
            Self::Template(template) => {
                let without_query = template.split('?').next().unwrap_or(template);
                let base = without_query.rsplit('/').next().unwrap_or(without_query);
                Some(extension(base).trim_start_matches('.'))
            }
            Self::Function { .. } => None,
        }
    }
}

impl fmt::Debug for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Function { identity, .. } => f
                .debug_struct("Function")
                .field("identity", identity)
                .finish_non_exhaustive(),
        }
    }
}

impl From<&str> for Filename {
    fn from(template: &str) -> Self {
        Self::template(template)
    }
}

impl From<String> for Filename {
    fn from(template: String) -> Self {
        Self::Template(template)
    }
}

fn render(template: &str, data: &PathData) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[2];
            let escaped = caps.get(1).is_some() && caps.get(3).is_some();

            match data.placeholder(token) {
                Some(value) if !escaped => value.to_string(),
                _ if escaped => format!("[{}]", token),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
