//! Graph construction from nested friend records

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde_json::{Map, Value};

use crate::config::BuildOptions;
use crate::data::records::json_kind;
use crate::data::{RawRecords, UserId};
use crate::graph::{FriendGraph, NameSource};

/// Scope of the visited-set that limits expansion of nested friend lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VisitScope {
    /// Reset for every top-level record, so a friend list nested under two
    /// different users is expanded under both
    #[default]
    PerRoot,
    /// Each id's friend list is expanded at most once for the whole build;
    /// top-level records take precedence over nested copies
    Global,
}

/// How a repeated id merges its name attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum NamePolicy {
    /// Names from the user's own top-level record are never overwritten by
    /// nested references
    #[default]
    TopLevelWins,
    /// The last name seen during traversal is kept
    LastWriteWins,
}

/// A non-fatal problem found in the input; the offending entry is skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralWarning {
    /// Location in the document, e.g. `1.friends[3].friends[0]`
    pub path: String,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Top-level key is not an integer
    InvalidUserKey,
    /// Expected an object, found something else
    NotAnObject(&'static str),
    MissingId,
    InvalidId(String),
    FriendsNotAList(&'static str),
    /// A user listed as their own friend
    SelfLoop(UserId),
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::InvalidUserKey => write!(f, "{}: user key is not an integer id", self.path),
            WarningKind::NotAnObject(found) => write!(f, "{}: expected an object, found {}", self.path, found),
            WarningKind::MissingId => write!(f, "{}: friend entry has no id", self.path),
            WarningKind::InvalidId(raw) => write!(f, "{}: friend id {} is not an integer", self.path, raw),
            WarningKind::FriendsNotAList(found) => {
                write!(f, "{}: friends is {}, expected a list", self.path, found)
            }
            WarningKind::SelfLoop(id) => write!(f, "{}: user {} lists themselves as a friend", self.path, id),
        }
    }
}

/// Output of a build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub graph: FriendGraph,
    pub warnings: Vec<StructuralWarning>,
}

/// A friend list waiting to be expanded under `parent`
struct Pending<'a> {
    parent: UserId,
    list: &'a [Value],
    path: String,
}

/// Builds a [`FriendGraph`] from a raw records document
///
/// Traversal uses an explicit worklist, so nesting depth in the input never
/// turns into call-stack depth.
pub struct GraphBuilder {
    options: BuildOptions,
    graph: FriendGraph,
    warnings: Vec<StructuralWarning>,
}

impl GraphBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            graph: FriendGraph::new(),
            warnings: Vec::new(),
        }
    }

    /// Build the graph
    ///
    /// Top-level records are processed in ascending id order and nested lists
    /// breadth-first, so the same input always yields the same node order.
    pub fn build(mut self, records: &RawRecords) -> BuildReport {
        let roots = self.collect_roots(records);

        let mut visited: HashSet<UserId> = HashSet::new();
        if self.options.scope == VisitScope::Global {
            visited.extend(roots.iter().map(|(id, _)| *id));
        }

        let mut queue: VecDeque<Pending<'_>> = VecDeque::new();
        for &(user_id, user) in &roots {
            self.touch(user_id, user, NameSource::TopLevel);

            if self.options.scope == VisitScope::PerRoot {
                visited.clear();
                visited.insert(user_id);
            }

            let path = user_id.to_string();
            if let Some(list) = self.friend_list(user, &path) {
                queue.push_back(Pending { parent: user_id, list, path });
            }

            while let Some(pending) = queue.pop_front() {
                self.expand(pending, &mut visited, &mut queue);
            }
        }

        log::info!(
            "Built graph with {} nodes and {} edges from {} records ({} structural warnings)",
            self.graph.node_count(),
            self.graph.edge_count(),
            roots.len(),
            self.warnings.len()
        );

        BuildReport {
            graph: self.graph,
            warnings: self.warnings,
        }
    }

    fn collect_roots<'a>(&mut self, records: &'a RawRecords) -> Vec<(UserId, &'a Map<String, Value>)> {
        let mut roots = Vec::with_capacity(records.len());
        for (key, value) in records {
            let Ok(id) = key.trim().parse::<UserId>() else {
                self.warn(key.clone(), WarningKind::InvalidUserKey);
                continue;
            };
            match value.as_object() {
                Some(user) => roots.push((id, user)),
                None => self.warn(key.clone(), WarningKind::NotAnObject(json_kind(value))),
            }
        }
        roots.sort_by_key(|(id, _)| *id);
        roots
    }

    fn expand<'a>(
        &mut self,
        pending: Pending<'a>,
        visited: &mut HashSet<UserId>,
        queue: &mut VecDeque<Pending<'a>>,
    ) {
        for (i, entry) in pending.list.iter().enumerate() {
            let Some(friend) = entry.as_object() else {
                self.warn(entry_path(&pending.path, i), WarningKind::NotAnObject(json_kind(entry)));
                continue;
            };

            let friend_id = match friend.get("id") {
                None | Some(Value::Null) => {
                    self.warn(entry_path(&pending.path, i), WarningKind::MissingId);
                    continue;
                }
                Some(raw) => match parse_id(raw) {
                    Some(id) => id,
                    None => {
                        self.warn(entry_path(&pending.path, i), WarningKind::InvalidId(raw.to_string()));
                        continue;
                    }
                },
            };

            if friend_id == pending.parent {
                self.warn(entry_path(&pending.path, i), WarningKind::SelfLoop(friend_id));
                continue;
            }

            self.touch(friend_id, friend, NameSource::Nested);
            self.graph.connect(pending.parent, friend_id);

            if !friend.contains_key("friends") {
                continue;
            }
            let path = entry_path(&pending.path, i);
            if let Some(list) = self.friend_list(friend, &path) {
                if visited.insert(friend_id) {
                    queue.push_back(Pending { parent: friend_id, list, path });
                } else {
                    log::debug!("Skipping already expanded friend list of {} at {}", friend_id, path);
                }
            }
        }
    }

    /// The entry's `friends` list; absent or null means no friends
    fn friend_list<'a>(&mut self, entry: &'a Map<String, Value>, path: &str) -> Option<&'a [Value]> {
        match entry.get("friends") {
            None | Some(Value::Null) => None,
            Some(Value::Array(list)) => Some(list.as_slice()),
            Some(other) => {
                self.warn(format!("{path}.friends"), WarningKind::FriendsNotAList(json_kind(other)));
                None
            }
        }
    }

    /// Ensure the node exists, count the appearance and merge its names
    fn touch(&mut self, id: UserId, entry: &Map<String, Value>, source: NameSource) {
        let policy = self.options.names;
        let first = entry.get("first_name").and_then(Value::as_str);
        let last = entry.get("last_name").and_then(Value::as_str);

        let person = self.graph.upsert(id);
        person.appearances += 1;

        if first.is_none() && last.is_none() {
            return;
        }
        let overwrite = match policy {
            NamePolicy::LastWriteWins => true,
            NamePolicy::TopLevelWins => {
                !(person.name_source == Some(NameSource::TopLevel) && source == NameSource::Nested)
            }
        };
        if overwrite {
            if let Some(first) = first {
                person.first_name = Some(first.to_string());
            }
            if let Some(last) = last {
                person.last_name = Some(last.to_string());
            }
            person.name_source = Some(source);
        }
    }

    fn warn(&mut self, path: String, kind: WarningKind) {
        let warning = StructuralWarning { path, kind };
        log::warn!("Skipping malformed entry: {}", warning);
        self.warnings.push(warning);
    }
}

/// Build a graph with the given options
pub fn build_graph(records: &RawRecords, options: BuildOptions) -> BuildReport {
    GraphBuilder::new(options).build(records)
}

fn entry_path(parent: &str, index: usize) -> String {
    format!("{parent}.friends[{index}]")
}

fn parse_id(raw: &Value) -> Option<UserId> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
