// SPDX-License-Identifier: MIT

//! The document model for the `execTree` dialect (spec §6): a plain,
//! serde-free DOM mirroring exactly what `xml.rs` reads and writes. Sitting
//! between the wire format and `jobtree-engine`'s live `Tree`/`Job` graph
//! keeps the recursive sub-tree structure (and the free-form legend map)
//! simple to walk in both directions.

use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeDoc {
    pub uuid: Uuid,
    pub name: String,
    pub href: String,
    pub cwd: String,
    pub waitsuccess: bool,
    pub jobs: Vec<JobDoc>,
    pub dependencies: Vec<DependencyDoc>,
    pub resources: Vec<ResourceDoc>,
    pub subtrees: Vec<TreeDoc>,
    pub legend: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerDoc {
    JobPath(String),
    SubtreeUuid(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDoc {
    pub uuid: Uuid,
    pub name: String,
    pub mustcomplete: bool,
    pub href: String,
    pub tcolor: String,
    pub runner: RunnerDoc,
    pub logfile: Option<String>,
    pub arguments: Vec<String>,
    pub resource_refs: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStateDoc {
    Successful,
    Failed,
}

impl DependencyStateDoc {
    /// The integer encoding the original implementation uses: 2 and 3 map to
    /// its `STATE_SUCCESSFUL`/`STATE_FAILED` ordinals.
    pub fn as_int(self) -> u8 {
        match self {
            DependencyStateDoc::Successful => 2,
            DependencyStateDoc::Failed => 3,
        }
    }

    pub fn from_int(value: u8) -> Option<Self> {
        match value {
            2 => Some(DependencyStateDoc::Successful),
            3 => Some(DependencyStateDoc::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DependencyDoc {
    pub parent: Uuid,
    pub child: Uuid,
    pub state: DependencyStateDoc,
    pub dcolor: String,
    pub ucolor: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDoc {
    pub uuid: Uuid,
    pub name: String,
    pub avail: i64,
}
