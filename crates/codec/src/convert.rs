// SPDX-License-Identifier: MIT

//! Mapping between the document model ([`crate::doc`]) and the live
//! `jobtree-engine` graph. A job or tree's `uuid` is preserved exactly
//! through a parse → run → serialize round-trip (spec §3: identity is
//! stable across the object's lifetime), via the `*_with_id` constructors
//! added to `jobtree-engine` for this purpose.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use jobtree_core::{DependencyState, JobId, Resource, ResourceId, TreeId};
use jobtree_engine::{DependencySpec, Job, Runner, RunnerKind, Tree};
use uuid::Uuid;

use crate::doc::{DependencyDoc, DependencyStateDoc, JobDoc, ResourceDoc, RunnerDoc, TreeDoc};
use crate::errors::CodecError;

/// Build a live [`Tree`] (and, recursively, every nested sub-tree) from a
/// parsed document.
pub fn build_tree(doc: &TreeDoc, runner: Arc<dyn Runner>) -> Result<Arc<Tree>, CodecError> {
    let resources: HashMap<Uuid, Arc<Resource>> = doc
        .resources
        .iter()
        .map(|r| (r.uuid, build_resource(r)))
        .collect();

    let subtrees: Vec<Arc<Tree>> = doc
        .subtrees
        .iter()
        .map(|sub| build_tree(sub, runner.clone()))
        .collect::<Result<_, _>>()?;
    let subtree_ids: HashMap<Uuid, TreeId> =
        subtrees.iter().map(|t| (t.id().as_uuid(), t.id())).collect();

    let jobs: Vec<Arc<Job>> = doc
        .jobs
        .iter()
        .map(|j| build_job(j, &resources, &subtree_ids))
        .collect::<Result<_, _>>()?;

    let dependency_specs: Vec<DependencySpec> = doc
        .dependencies
        .iter()
        .map(build_dependency_spec)
        .collect();

    let tree = Tree::new_with_id(
        TreeId::from_uuid(doc.uuid),
        doc.name.clone(),
        PathBuf::from(&doc.cwd),
        doc.waitsuccess,
        jobs,
        dependency_specs,
        resources.into_values().collect(),
        subtrees,
        None,
        runner,
    )?;

    for (key, value) in &doc.legend {
        tree.set_legend(key.clone(), value.clone());
    }

    Ok(tree)
}

fn build_resource(doc: &ResourceDoc) -> Arc<Resource> {
    Arc::new(
        Resource::builder()
            .id(ResourceId::from_uuid(doc.uuid))
            .name(doc.name.clone())
            .capacity(doc.avail)
            .build(),
    )
}

fn build_job(
    doc: &JobDoc,
    resources: &HashMap<Uuid, Arc<Resource>>,
    subtree_ids: &HashMap<Uuid, TreeId>,
) -> Result<Arc<Job>, CodecError> {
    let resolved_resources = doc
        .resource_refs
        .iter()
        .map(|id| {
            resources
                .get(id)
                .cloned()
                .ok_or(CodecError::InvalidAttribute {
                    element: "execResource",
                    attribute: "uuid",
                    value: id.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let log_path = doc.logfile.as_ref().map(PathBuf::from);
    let id = JobId::from_uuid(doc.uuid);

    match &doc.runner {
        RunnerDoc::JobPath(path) => Ok(Job::command_with_id(
            id,
            doc.name.clone(),
            path.clone(),
            doc.arguments.clone(),
            doc.mustcomplete,
            resolved_resources,
            log_path,
        )),
        RunnerDoc::SubtreeUuid(sub_uuid) => {
            let tree_id = subtree_ids
                .get(sub_uuid)
                .copied()
                .ok_or(CodecError::InvalidAttribute {
                    element: "execJob",
                    attribute: "subtreeuuid",
                    value: sub_uuid.to_string(),
                })?;
            Ok(Job::subtree_with_id(
                id,
                doc.name.clone(),
                tree_id,
                doc.mustcomplete,
                resolved_resources,
                log_path,
            ))
        }
    }
}

fn build_dependency_spec(doc: &DependencyDoc) -> DependencySpec {
    let required_state = match doc.state {
        DependencyStateDoc::Successful => DependencyState::Successful,
        DependencyStateDoc::Failed => DependencyState::Failed,
    };
    DependencySpec {
        parent: JobId::from_uuid(doc.parent),
        child: JobId::from_uuid(doc.child),
        required_state,
    }
}

/// Serialize a live [`Tree`] back into the document model.
pub fn tree_to_doc(tree: &Tree) -> TreeDoc {
    TreeDoc {
        uuid: tree.id().as_uuid(),
        name: tree.name().to_string(),
        href: String::new(),
        cwd: tree.cwd().to_string_lossy().into_owned(),
        waitsuccess: tree.waitsuccess(),
        jobs: tree.jobs().map(|j| job_to_doc(j)).collect(),
        dependencies: tree.dependencies().iter().map(dependency_to_doc).collect(),
        resources: tree.resources().iter().map(|r| resource_to_doc(r)).collect(),
        subtrees: tree.subtrees().map(|t| tree_to_doc(t)).collect(),
        legend: tree.legend(),
    }
}

fn job_to_doc(job: &Job) -> JobDoc {
    let (runner, arguments) = match job.runner_kind() {
        RunnerKind::Command { path, args } => (RunnerDoc::JobPath(path), args),
        RunnerKind::Subtree(id) => (RunnerDoc::SubtreeUuid(id.as_uuid()), Vec::new()),
    };
    JobDoc {
        uuid: job.id().as_uuid(),
        name: job.name().to_string(),
        mustcomplete: job.must_complete(),
        href: String::new(),
        tcolor: job.state().status_color().to_string(),
        runner,
        logfile: job.log_path().map(|p| p.to_string_lossy().into_owned()),
        arguments,
        resource_refs: job.resources().iter().map(|r| r.id().as_uuid()).collect(),
    }
}

fn dependency_to_doc(dependency: &jobtree_core::Dependency) -> DependencyDoc {
    let state = match dependency.required_state {
        DependencyState::Successful => DependencyStateDoc::Successful,
        DependencyState::Failed => DependencyStateDoc::Failed,
    };
    DependencyDoc {
        parent: dependency.parent.as_uuid(),
        child: dependency.child.as_uuid(),
        state,
        dcolor: String::new(),
        ucolor: String::new(),
    }
}

fn resource_to_doc(resource: &Resource) -> ResourceDoc {
    ResourceDoc {
        uuid: resource.id().as_uuid(),
        name: resource.name().to_string(),
        avail: resource.capacity(),
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
