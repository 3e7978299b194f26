use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One algorithm implementation under comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique within a batch.  Escaped by [Candidate::dir_name] to name
    /// its artifact directory.
    pub id: String,
    /// Source code content, not path.  Opaque to the pipeline.
    pub source: String,
    /// Name the [Loader](crate::Loader) binds to a solver.
    pub entry: String,
    /// The prompt which produced `source`, if any.
    #[serde(default)]
    pub prompt: String,
}

impl Candidate {
    pub fn new<I, S, E>(id: I, source: S, entry: E) -> Self
    where
        I: AsRef<str>,
        S: AsRef<str>,
        E: AsRef<str>,
    {
        Self {
            id: id.as_ref().to_owned(),
            source: source.as_ref().to_owned(),
            entry: entry.as_ref().to_owned(),
            prompt: String::new(),
        }
    }

    pub fn with_prompt<T: AsRef<str>>(mut self, prompt: T) -> Self {
        self.prompt = prompt.as_ref().to_owned();
        self
    }

    /// The id as a single path component.  Bytes outside
    /// `[0-9A-Za-z._-]` are written as `%XX`, and so are the dots of `.`
    /// and `..`, so distinct ids never share a directory.  Only the empty
    /// id is rejected.
    pub fn dir_name(&self) -> Result<String> {
        escape_dir_name(&self.id)
    }
}

pub(crate) fn escape_dir_name(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(Error::BadCandidateId(id.to_owned()));
    }
    let dots_only = id.bytes().all(|b| b == b'.');
    let mut r = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b"_-".contains(&b) || (b == b'.' && !dots_only) {
            r.push(char::from(b));
        } else {
            r.push_str(&format!("%{:02X}", b));
        }
    }
    Ok(r)
}
