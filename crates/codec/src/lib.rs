// SPDX-License-Identifier: MIT

//! Reading and writing the `execTree` XML document format (spec §6) that
//! describes a [`jobtree_engine::Tree`] on disk.

pub mod convert;
pub mod doc;
pub mod errors;
pub mod xml;

pub use convert::{build_tree, tree_to_doc};
pub use doc::{DependencyDoc, DependencyStateDoc, JobDoc, ResourceDoc, RunnerDoc, TreeDoc};
pub use errors::CodecError;
pub use xml::{parse_tree_document, write_tree_document};

use std::sync::Arc;

use jobtree_engine::{Runner, Tree};

/// Parse an `execTree` XML document directly into a runnable [`Tree`].
pub fn load_tree(xml: &str, runner: Arc<dyn Runner>) -> Result<Arc<Tree>, CodecError> {
    let doc = parse_tree_document(xml)?;
    build_tree(&doc, runner)
}

/// Serialize a live [`Tree`] back into an `execTree` XML document.
pub fn dump_tree(tree: &Tree) -> Result<String, CodecError> {
    let doc = tree_to_doc(tree);
    write_tree_document(&doc)
}
