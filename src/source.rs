use std::fmt;
use std::sync::Arc;

use crate::highlights::fragment::{parse_highlight_fragment, split_fragment};

const DOI_RESOLVER: &str = "https://doi.org/";

/// A document source, fully normalized. Entering a new URL or picking a new
/// file replaces the whole value; comparison is by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    RemoteUrl(String),
    Bytes(DocumentBytes),
}

impl Source {
    pub fn remote_url(url: impl Into<String>) -> Self {
        Self::RemoteUrl(url.into())
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::Bytes(DocumentBytes::new(data))
    }

    /// Stable identity string used for highlight-store keys and document ids.
    pub fn identity_key(&self) -> String {
        match self {
            Self::RemoteUrl(url) => url.clone(),
            Self::Bytes(bytes) => format!("bytes:{:016x}", bytes.digest()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::RemoteUrl(url) => url.clone(),
            Self::Bytes(bytes) => format!("in-memory document ({} bytes)", bytes.len()),
        }
    }
}

/// An in-memory document buffer with a precomputed digest, so source
/// comparison does not rescan the bytes on every mismatch.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentBytes {
    digest: u64,
    data: Arc<Vec<u8>>,
}

impl DocumentBytes {
    pub fn new(data: Vec<u8>) -> Self {
        let digest = digest_bytes(&data);
        Self {
            digest,
            data: Arc::new(data),
        }
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shared(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.data)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for DocumentBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentBytes")
            .field("len", &self.data.len())
            .field("digest", &format_args!("{:016x}", self.digest))
            .finish()
    }
}

fn digest_bytes(data: &[u8]) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    data.len().hash(&mut hasher);
    hasher.finish()
}

/// Outcome of resolving typed URL/DOI input. No validation happens here;
/// an unfetchable URL surfaces later as a load failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub source: Option<Source>,
    pub highlight_target: Option<String>,
}

/// Resolves raw text input into a source. Empty input means nothing to
/// load. Bare DOIs gain the resolver prefix; a `#highlight-<id>` fragment
/// is split off as the deep-link target and never reaches the fetch URL.
pub fn resolve_url_input(raw: &str) -> ResolvedInput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ResolvedInput {
            source: None,
            highlight_target: None,
        };
    }

    let (body, fragment) = split_fragment(trimmed);
    let highlight_target = fragment
        .and_then(parse_highlight_fragment)
        .map(str::to_string);

    let url = match as_doi(body) {
        Some(doi) => format!("{DOI_RESOLVER}{doi}"),
        None => body.to_string(),
    };

    ResolvedInput {
        source: Some(Source::RemoteUrl(url)),
        highlight_target,
    }
}

fn as_doi(input: &str) -> Option<&str> {
    let body = match input.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("doi:") => input[4..].trim_start(),
        _ => input,
    };
    if body.contains(char::is_whitespace) {
        return None;
    }
    let rest = body.strip_prefix("10.")?;
    let (registrant, suffix) = rest.split_once('/')?;
    if registrant.is_empty() || suffix.is_empty() {
        return None;
    }
    if !registrant
        .bytes()
        .all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }
    Some(body)
}
