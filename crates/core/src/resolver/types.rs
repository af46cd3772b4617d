use std::path::PathBuf;

use thiserror::Error;

use crate::pages::DocumentRef;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("pages directory does not exist: {0}")]
    MissingDir(String),

    #[error("failed to read pages directory {0} : {1}")]
    WalkError(String, #[source] walkdir::Error),

    #[error("failed to read page {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("page {0} redirects to an invalid target")]
    BadRedirect(String),
}

/// Result of resolving a document reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFetch {
    /// Source text of the page.
    pub text: String,
    /// Reference the text was finally read from (differs after a redirect).
    pub final_ref: DocumentRef,
    /// Further pages the result depends on.
    pub deps: Vec<DocumentRef>,
}
