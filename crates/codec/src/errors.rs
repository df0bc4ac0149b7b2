// SPDX-License-Identifier: MIT

//! Schema and I/O errors for the `execTree` XML dialect (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed xml attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("document root is not execTree")]
    MissingRoot,

    #[error("tree config file version is not supported: {0}")]
    UnsupportedVersion(String),

    #[error("missing required attribute `{attribute}` on <{element}>")]
    MissingAttribute { element: &'static str, attribute: &'static str },

    #[error("invalid value for attribute `{attribute}` on <{element}>: {value}")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("<execJob> {name} declares neither jobpath nor subtreeuuid")]
    AmbiguousJobRunner { name: String },

    #[error("<execJob> {name} declares both jobpath and subtreeuuid")]
    ConflictingJobRunner { name: String },

    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(&'static str),

    #[error("unexpected element <{found}> inside <{inside}>")]
    UnexpectedElement { inside: &'static str, found: String },

    #[error("dependency state {0} is not a recognized terminal state")]
    UnknownDependencyState(u8),

    #[error(transparent)]
    Engine(#[from] jobtree_engine::EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
