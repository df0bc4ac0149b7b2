// SPDX-License-Identifier: MIT

//! Event-based reader and writer for the `execTree` XML dialect (spec §6),
//! grounded in the teacher pack's `quick-xml` usage (see
//! `adamtc007-ob-poc/bpmn-lite/bpmn-lite-core/src/compiler/parser.rs`): a
//! manual `Reader`/`Event` loop rather than `quick-xml`'s serde-derive mode,
//! since `execTree` nests recursively and `legendItem` uses an arbitrary
//! attribute name as its own key, neither of which maps onto a static
//! `#[derive(Deserialize)]` struct.

use std::collections::HashMap;
use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use uuid::Uuid;

use crate::doc::{DependencyDoc, DependencyStateDoc, JobDoc, ResourceDoc, RunnerDoc, TreeDoc};
use crate::errors::CodecError;

const SUPPORTED_VERSION: &str = "1.0";

pub fn parse_tree_document(xml: &str) -> Result<TreeDoc, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(start) if local_name(&start) == "execTree" => {
                let attrs = attr_map(&start)?;
                return parse_tree_body(&mut reader, &mut buf, attrs);
            }
            Event::Eof => return Err(CodecError::MissingRoot),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_tree_body(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    attrs: HashMap<String, String>,
) -> Result<TreeDoc, CodecError> {
    let version = req(&attrs, "execTree", "version")?;
    if version != SUPPORTED_VERSION {
        return Err(CodecError::UnsupportedVersion(version.to_string()));
    }

    let mut doc = TreeDoc {
        uuid: parse_uuid(&attrs, "execTree", "uuid")?,
        name: req(&attrs, "execTree", "name")?.to_string(),
        href: attrs.get("href").cloned().unwrap_or_default(),
        cwd: req(&attrs, "execTree", "cwd")?.to_string(),
        waitsuccess: parse_bool(&attrs, "execTree", "waitsuccess")?,
        jobs: Vec::new(),
        dependencies: Vec::new(),
        resources: Vec::new(),
        subtrees: Vec::new(),
        legend: HashMap::new(),
    };

    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(start) => match local_name(&start).as_str() {
                "execTree" => {
                    let nested_attrs = attr_map(&start)?;
                    doc.subtrees.push(parse_tree_body(reader, buf, nested_attrs)?);
                }
                "execJob" => {
                    let job_attrs = attr_map(&start)?;
                    doc.jobs.push(parse_job_body(reader, buf, job_attrs)?);
                }
                other => {
                    return Err(CodecError::UnexpectedElement {
                        inside: "execTree",
                        found: other.to_string(),
                    })
                }
            },
            Event::Empty(empty) => match local_name(&empty).as_str() {
                "execJob" => doc.jobs.push(parse_job_attrs(&attr_map(&empty)?)?),
                "execDependency" => doc.dependencies.push(parse_dependency(&attr_map(&empty)?)?),
                "execResource" => doc.resources.push(parse_resource(&attr_map(&empty)?)?),
                "legendItem" => {
                    let (key, value) = first_attribute(&empty)?;
                    doc.legend.insert(key, value);
                }
                other => {
                    return Err(CodecError::UnexpectedElement {
                        inside: "execTree",
                        found: other.to_string(),
                    })
                }
            },
            Event::End(end) if local_name_end(&end) == "execTree" => break,
            Event::Eof => return Err(CodecError::UnexpectedEof("execTree")),
            _ => {}
        }
    }

    Ok(doc)
}

fn parse_job_body(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    attrs: HashMap<String, String>,
) -> Result<JobDoc, CodecError> {
    let mut job = parse_job_attrs(&attrs)?;
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Empty(empty) => match local_name(&empty).as_str() {
                "execArg" => {
                    let arg_attrs = attr_map(&empty)?;
                    job.arguments.push(req(&arg_attrs, "execArg", "value")?.to_string());
                }
                "execResource" => {
                    let ref_attrs = attr_map(&empty)?;
                    job.resource_refs.push(parse_uuid(&ref_attrs, "execResource", "uuid")?);
                }
                other => {
                    return Err(CodecError::UnexpectedElement {
                        inside: "execJob",
                        found: other.to_string(),
                    })
                }
            },
            Event::End(end) if local_name_end(&end) == "execJob" => break,
            Event::Eof => return Err(CodecError::UnexpectedEof("execJob")),
            _ => {}
        }
    }
    Ok(job)
}

fn parse_job_attrs(attrs: &HashMap<String, String>) -> Result<JobDoc, CodecError> {
    let name = req(attrs, "execJob", "name")?.to_string();
    let uuid = parse_uuid(attrs, "execJob", "uuid")?;
    let mustcomplete = parse_bool(attrs, "execJob", "mustcomplete")?;
    let href = attrs.get("href").cloned().unwrap_or_default();
    let tcolor = attrs.get("tcolor").cloned().unwrap_or_default();
    let logfile = attrs.get("logfile").cloned();

    let jobpath = attrs.get("jobpath");
    let subtreeuuid = attrs.get("subtreeuuid");
    let runner = match (jobpath, subtreeuuid) {
        (Some(path), None) => RunnerDoc::JobPath(path.clone()),
        (None, Some(id)) => RunnerDoc::SubtreeUuid(
            Uuid::parse_str(id).map_err(|_| CodecError::InvalidAttribute {
                element: "execJob",
                attribute: "subtreeuuid",
                value: id.clone(),
            })?,
        ),
        (None, None) => return Err(CodecError::AmbiguousJobRunner { name }),
        (Some(_), Some(_)) => return Err(CodecError::ConflictingJobRunner { name }),
    };

    Ok(JobDoc {
        uuid,
        name,
        mustcomplete,
        href,
        tcolor,
        runner,
        logfile,
        arguments: Vec::new(),
        resource_refs: Vec::new(),
    })
}

fn parse_dependency(attrs: &HashMap<String, String>) -> Result<DependencyDoc, CodecError> {
    let parent = parse_uuid(attrs, "execDependency", "parent")?;
    let child = parse_uuid(attrs, "execDependency", "child")?;
    let state_raw = req(attrs, "execDependency", "state")?;
    let state_int: u8 = state_raw.parse().map_err(|_| CodecError::InvalidAttribute {
        element: "execDependency",
        attribute: "state",
        value: state_raw.to_string(),
    })?;
    let state = DependencyStateDoc::from_int(state_int)
        .ok_or(CodecError::UnknownDependencyState(state_int))?;
    Ok(DependencyDoc {
        parent,
        child,
        state,
        dcolor: attrs.get("dcolor").cloned().unwrap_or_default(),
        ucolor: attrs.get("ucolor").cloned().unwrap_or_default(),
    })
}

fn parse_resource(attrs: &HashMap<String, String>) -> Result<ResourceDoc, CodecError> {
    let name = req(attrs, "execResource", "name")?.to_string();
    let uuid = parse_uuid(attrs, "execResource", "uuid")?;
    let avail_raw = req(attrs, "execResource", "avail")?;
    let avail: i64 = avail_raw.parse().map_err(|_| CodecError::InvalidAttribute {
        element: "execResource",
        attribute: "avail",
        value: avail_raw.to_string(),
    })?;
    Ok(ResourceDoc { uuid, name, avail })
}

fn first_attribute(start: &BytesStart) -> Result<(String, String), CodecError> {
    let mut attributes = start.attributes();
    match attributes.next() {
        Some(attr) => {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            Ok((key, value))
        }
        None => Err(CodecError::MissingAttribute {
            element: "legendItem",
            attribute: "<any>",
        }),
    }
}

fn attr_map(start: &BytesStart) -> Result<HashMap<String, String>, CodecError> {
    let mut map = HashMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn req<'a>(
    attrs: &'a HashMap<String, String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, CodecError> {
    attrs
        .get(attribute)
        .map(String::as_str)
        .ok_or(CodecError::MissingAttribute { element, attribute })
}

fn parse_uuid(
    attrs: &HashMap<String, String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<Uuid, CodecError> {
    let raw = req(attrs, element, attribute)?;
    Uuid::parse_str(raw).map_err(|_| CodecError::InvalidAttribute {
        element,
        attribute,
        value: raw.to_string(),
    })
}

fn parse_bool(
    attrs: &HashMap<String, String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<bool, CodecError> {
    let raw = req(attrs, element, attribute)?;
    match raw {
        "1" | "true" | "True" => Ok(true),
        "0" | "false" | "False" => Ok(false),
        other => Err(CodecError::InvalidAttribute {
            element,
            attribute,
            value: other.to_string(),
        }),
    }
}

fn local_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn local_name_end(end: &BytesEnd) -> String {
    String::from_utf8_lossy(end.local_name().as_ref()).into_owned()
}

/// Serialize a [`TreeDoc`] back to the `execTree` schema (spec §6), mirroring
/// the original implementation's `xml()` methods attribute-for-attribute.
pub fn write_tree_document(doc: &TreeDoc) -> Result<String, CodecError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    write_tree(&mut writer, doc)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_tree(writer: &mut Writer<Cursor<Vec<u8>>>, doc: &TreeDoc) -> Result<(), CodecError> {
    let mut start = BytesStart::new("execTree");
    let uuid_hex = doc.uuid.simple().to_string();
    start.push_attribute(("version", SUPPORTED_VERSION));
    start.push_attribute(("name", doc.name.as_str()));
    start.push_attribute(("href", doc.href.as_str()));
    start.push_attribute(("uuid", uuid_hex.as_str()));
    start.push_attribute(("cwd", doc.cwd.as_str()));
    start.push_attribute(("waitsuccess", bool_str(doc.waitsuccess)));
    writer.write_event(Event::Start(start))?;

    for job in &doc.jobs {
        write_job(writer, job)?;
    }
    for dependency in &doc.dependencies {
        write_dependency(writer, dependency)?;
    }
    for resource in &doc.resources {
        write_resource(writer, resource)?;
    }
    for subtree in &doc.subtrees {
        write_tree(writer, subtree)?;
    }
    for (key, value) in &doc.legend {
        let mut item = BytesStart::new("legendItem");
        item.push_attribute((key.as_str(), value.as_str()));
        writer.write_event(Event::Empty(item))?;
    }

    writer.write_event(Event::End(BytesEnd::new("execTree")))?;
    Ok(())
}

fn write_job(writer: &mut Writer<Cursor<Vec<u8>>>, job: &JobDoc) -> Result<(), CodecError> {
    let mut start = BytesStart::new("execJob");
    let uuid_hex = job.uuid.simple().to_string();
    start.push_attribute(("name", job.name.as_str()));
    start.push_attribute(("uuid", uuid_hex.as_str()));
    start.push_attribute(("mustcomplete", bool_str(job.mustcomplete)));
    start.push_attribute(("href", job.href.as_str()));
    start.push_attribute(("tcolor", job.tcolor.as_str()));
    let subtree_hex;
    match &job.runner {
        RunnerDoc::JobPath(path) => start.push_attribute(("jobpath", path.as_str())),
        RunnerDoc::SubtreeUuid(id) => {
            subtree_hex = id.simple().to_string();
            start.push_attribute(("subtreeuuid", subtree_hex.as_str()));
        }
    }
    if let Some(logfile) = &job.logfile {
        start.push_attribute(("logfile", logfile.as_str()));
    }

    if job.arguments.is_empty() && job.resource_refs.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for arg in &job.arguments {
        let mut elem = BytesStart::new("execArg");
        elem.push_attribute(("value", arg.as_str()));
        writer.write_event(Event::Empty(elem))?;
    }
    for resource_id in &job.resource_refs {
        let hex = resource_id.simple().to_string();
        let mut elem = BytesStart::new("execResource");
        elem.push_attribute(("uuid", hex.as_str()));
        writer.write_event(Event::Empty(elem))?;
    }
    writer.write_event(Event::End(BytesEnd::new("execJob")))?;
    Ok(())
}

fn write_dependency(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    dependency: &DependencyDoc,
) -> Result<(), CodecError> {
    let mut elem = BytesStart::new("execDependency");
    let parent_hex = dependency.parent.simple().to_string();
    let child_hex = dependency.child.simple().to_string();
    let state = dependency.state.as_int().to_string();
    elem.push_attribute(("parent", parent_hex.as_str()));
    elem.push_attribute(("child", child_hex.as_str()));
    elem.push_attribute(("state", state.as_str()));
    elem.push_attribute(("dcolor", dependency.dcolor.as_str()));
    elem.push_attribute(("ucolor", dependency.ucolor.as_str()));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_resource(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    resource: &ResourceDoc,
) -> Result<(), CodecError> {
    let mut elem = BytesStart::new("execResource");
    let uuid_hex = resource.uuid.simple().to_string();
    let avail = resource.avail.to_string();
    elem.push_attribute(("name", resource.name.as_str()));
    elem.push_attribute(("uuid", uuid_hex.as_str()));
    elem.push_attribute(("avail", avail.as_str()));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;
