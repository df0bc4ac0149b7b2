// SPDX-License-Identifier: MIT

use super::*;
use jobtree_engine::ProcessRunner;
use std::path::PathBuf;

fn sample_doc() -> TreeDoc {
    let parent = JobDoc {
        uuid: uuid::Uuid::new_v4(),
        name: "parent".to_string(),
        mustcomplete: true,
        href: String::new(),
        tcolor: "white".to_string(),
        runner: RunnerDoc::JobPath("/bin/true".to_string()),
        logfile: None,
        arguments: vec![],
        resource_refs: vec![],
    };
    let child = JobDoc {
        uuid: uuid::Uuid::new_v4(),
        name: "child".to_string(),
        mustcomplete: true,
        href: String::new(),
        tcolor: "white".to_string(),
        runner: RunnerDoc::JobPath("/bin/true".to_string()),
        logfile: None,
        arguments: vec![],
        resource_refs: vec![],
    };
    let dependency = DependencyDoc {
        parent: parent.uuid,
        child: child.uuid,
        state: DependencyStateDoc::Successful,
        dcolor: String::new(),
        ucolor: String::new(),
    };
    TreeDoc {
        uuid: uuid::Uuid::new_v4(),
        name: "root".to_string(),
        href: String::new(),
        cwd: "/tmp".to_string(),
        waitsuccess: true,
        jobs: vec![parent, child],
        dependencies: vec![dependency],
        resources: vec![],
        subtrees: vec![],
        legend: Default::default(),
    }
}

#[test]
fn build_tree_preserves_job_and_tree_identity() {
    let doc = sample_doc();
    let parent_uuid = doc.jobs[0].uuid;
    let tree_uuid = doc.uuid;

    let tree = build_tree(&doc, Arc::new(ProcessRunner)).unwrap();
    assert_eq!(tree.id().as_uuid(), tree_uuid);
    assert!(tree.find_job(jobtree_core::JobId::from_uuid(parent_uuid)).is_some());
    assert_eq!(tree.name(), "root");
    assert_eq!(tree.cwd(), &PathBuf::from("/tmp"));
    assert!(tree.waitsuccess());
}

#[test]
fn build_tree_wires_dependency_from_document() {
    let doc = sample_doc();
    let tree = build_tree(&doc, Arc::new(ProcessRunner)).unwrap();
    let child_id = jobtree_core::JobId::from_uuid(doc.jobs[1].uuid);
    let parents = tree.parents_of(child_id);
    assert_eq!(parents, vec![jobtree_core::JobId::from_uuid(doc.jobs[0].uuid)]);
}

#[test]
fn tree_to_doc_round_trips_through_build_tree() {
    let doc = sample_doc();
    let tree = build_tree(&doc, Arc::new(ProcessRunner)).unwrap();
    let rebuilt = tree_to_doc(&tree);

    assert_eq!(rebuilt.uuid, doc.uuid);
    assert_eq!(rebuilt.name, doc.name);
    assert_eq!(rebuilt.jobs.len(), doc.jobs.len());
    assert_eq!(rebuilt.dependencies.len(), doc.dependencies.len());
}

#[test]
fn load_and_dump_round_trip_via_xml() {
    let doc = sample_doc();
    let xml = crate::write_tree_document(&doc).unwrap();
    let tree = crate::load_tree(&xml, Arc::new(ProcessRunner)).unwrap();
    let dumped = crate::dump_tree(&tree).unwrap();
    let reparsed = crate::parse_tree_document(&dumped).unwrap();
    assert_eq!(reparsed.uuid, doc.uuid);
    assert_eq!(reparsed.jobs.len(), doc.jobs.len());
}

#[test]
fn unknown_resource_reference_is_rejected() {
    let mut doc = sample_doc();
    doc.jobs[0].resource_refs.push(uuid::Uuid::new_v4());
    let err = build_tree(&doc, Arc::new(ProcessRunner)).unwrap_err();
    assert!(matches!(err, CodecError::InvalidAttribute { .. }));
}
