//! Per-request tag graph
//!
//! Tags live in an arena and refer to each other by index. Adjacency along
//! each relation is fetched the first time it is asked for and kept for the
//! life of the graph, so walking a dependency chain touches each edge set once.

use std::collections::{HashMap, HashSet, VecDeque};

use forum_core::{DomainResult, TagName};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::entities::Tag;
use crate::session::{Connector, Session};

/// A directed tag relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Tags a tag requires
    Dependent,
    /// Tags that cannot co-occur with a tag
    Forbidden,
    /// Tags suggested alongside a tag
    Related,
}

impl Relation {
    /// `(link table, neighbour column, owner column)` of the relation
    pub(crate) fn columns(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Dependent => ("tags_dependent", "parent_tag_id", "child_tag_id"),
            Self::Forbidden => ("tags_forbidden", "forbidden_tag_id", "tag_id"),
            Self::Related => ("tags_related", "parent_tag_id", "child_tag_id"),
        }
    }
}

#[derive(Debug)]
struct Node {
    tag: Tag,
    edges: HashMap<Relation, Vec<usize>>,
}

/// Outcome of checking a proposed tag set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagSetReport {
    /// `(tag, required tag)` pairs where the required tag is absent
    pub missing: Vec<(TagName, TagName)>,
    /// Pairs of tags in the set that forbid each other
    pub conflicts: Vec<(TagName, TagName)>,
}

impl TagSetReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.conflicts.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TagGraph {
    nodes: Vec<Node>,
    index: HashMap<TagName, usize>,
}

impl TagGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, name: &TagName) -> Option<&Tag> {
        self.index.get(name).map(|&idx| &self.nodes[idx].tag)
    }

    /// Add a tag, or fill in what an existing node does not know yet
    pub fn insert(&mut self, tag: Tag) -> usize {
        if let Some(&idx) = self.index.get(tag.name()) {
            let known = &mut self.nodes[idx].tag;
            if known.known_id().is_none() {
                *known = tag;
            }
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(tag.name().clone(), idx);
        self.nodes.push(Node {
            tag,
            edges: HashMap::new(),
        });
        idx
    }

    fn node_for(&mut self, name: &TagName) -> usize {
        match self.index.get(name) {
            Some(&idx) => idx,
            None => self.insert(Tag::new(name.clone())),
        }
    }

    async fn edges<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        idx: usize,
        relation: Relation,
    ) -> DomainResult<Vec<usize>> {
        if let Some(cached) = self.nodes[idx].edges.get(&relation) {
            return Ok(cached.clone());
        }
        let neighbours = self.nodes[idx].tag.fetch_relation(session, relation).await?;
        let targets: Vec<usize> = neighbours.into_iter().map(|tag| self.insert(tag)).collect();
        self.nodes[idx].edges.insert(relation, targets.clone());
        Ok(targets)
    }

    /// Direct neighbours of `name` along `relation`
    pub async fn neighbours<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        name: &TagName,
        relation: Relation,
    ) -> DomainResult<Vec<TagName>> {
        let idx = self.node_for(name);
        let targets = self.edges(session, idx, relation).await?;
        Ok(self.names(&targets))
    }

    /// Every tag `name` requires, directly or through other requirements
    ///
    /// Breadth-first, in discovery order; `name` itself is never included,
    /// even when a cycle leads back to it.
    #[instrument(skip(self, session), fields(tag = %name))]
    pub async fn dependency_closure<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        name: &TagName,
    ) -> DomainResult<Vec<TagName>> {
        let start = self.node_for(name);
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut closure = Vec::new();

        while let Some(idx) = queue.pop_front() {
            for next in self.edges(session, idx, Relation::Dependent).await? {
                if seen.insert(next) {
                    closure.push(next);
                    queue.push_back(next);
                }
            }
        }
        debug!(required = closure.len(), "Resolved dependency closure");
        Ok(self.names(&closure))
    }

    /// Pairs within `names` where one tag forbids the other
    ///
    /// Each unordered pair is reported once, in the order the set lists it.
    pub async fn conflicts<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        names: &[TagName],
    ) -> DomainResult<Vec<(TagName, TagName)>> {
        let members: Vec<usize> = names.iter().map(|name| self.node_for(name)).collect();
        let position: HashMap<usize, usize> =
            members.iter().enumerate().map(|(pos, &idx)| (idx, pos)).collect();

        let mut pairs = HashSet::new();
        for &idx in &members {
            for other in self.edges(session, idx, Relation::Forbidden).await? {
                if other != idx && position.contains_key(&other) {
                    let pair = if position[&idx] <= position[&other] {
                        (idx, other)
                    } else {
                        (other, idx)
                    };
                    pairs.insert(pair);
                }
            }
        }

        let mut pairs: Vec<(usize, usize)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(a, b)| (position[&a], position[&b]));
        Ok(pairs
            .into_iter()
            .map(|(a, b)| (self.nodes[a].tag.name().clone(), self.nodes[b].tag.name().clone()))
            .collect())
    }

    /// Check a proposed tag set for unmet requirements and forbidden pairs
    #[instrument(skip(self, session, names), fields(tags = names.len()))]
    pub async fn check<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        names: &[TagName],
    ) -> DomainResult<TagSetReport> {
        let present: HashSet<&TagName> = names.iter().collect();
        let mut report = TagSetReport::default();
        for name in names {
            for required in self.dependency_closure(session, name).await? {
                if !present.contains(&required) {
                    report.missing.push((name.clone(), required));
                }
            }
        }
        report.conflicts = self.conflicts(session, names).await?;
        Ok(report)
    }

    fn names(&self, indices: &[usize]) -> Vec<TagName> {
        indices
            .iter()
            .map(|&idx| self.nodes[idx].tag.name().clone())
            .collect()
    }
}
