use std::collections::HashMap;

use crate::model::{edge_id, Edge, ModelLink};
use crate::persist::Relationship;

/// Both directions of a relationship share one key.
fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn edge_from_link(link: ModelLink) -> Edge {
    Edge {
        id: edge_id(&link.source, &link.target),
        source: link.source.clone(),
        target: link.target.clone(),
        label: link.label.clone(),
        kind: link.kind,
        label_offset: link.label_offset,
        models: vec![link],
    }
}

/// Collapses raw relationships into one edge per unordered entity pair.
///
/// Edges come out in first-seen order and take their direction, label, type
/// and label offset from the first record of the pair. Every record becomes
/// one link, in input order, remembering where it sat in `relationships`.
pub fn aggregate(relationships: &[Relationship]) -> Vec<Edge> {
    let mut edges: Vec<Edge> = Vec::new();
    let mut by_pair: HashMap<(String, String), usize> = HashMap::new();

    for (index, relationship) in relationships.iter().enumerate() {
        let link = ModelLink {
            record_index: Some(index),
            ..relationship.link()
        };
        let key = pair_key(&relationship.source, &relationship.target);
        match by_pair.get(&key) {
            Some(&edge) => edges[edge].models.push(link),
            None => {
                by_pair.insert(key, edges.len());
                edges.push(edge_from_link(link));
            }
        }
    }
    edges
}

/// Inserts one relationship into an existing edge list.
///
/// A record already present on the pair's edge is skipped, so merging the
/// same relationship twice leaves the list unchanged.
pub fn merge(edges: &[Edge], relationship: &Relationship) -> Vec<Edge> {
    let key = pair_key(&relationship.source, &relationship.target);
    let link = relationship.link();
    let mut merged = edges.to_vec();
    match merged
        .iter_mut()
        .find(|edge| pair_key(&edge.source, &edge.target) == key)
    {
        Some(edge) => {
            if edge.models.is_empty() {
                // Keep the drawn edge as its own record ahead of the new one.
                let drawn = Relationship::from_edge(edge).link();
                edge.models.push(drawn);
            }
            if !edge.models.iter().any(|known| known.same_record(&link)) {
                edge.models.push(link);
            }
        }
        None => merged.push(edge_from_link(link)),
    }
    merged
}

/// Flattens edges back into persisted records, one per link.
///
/// Loaded records come back in their original order and direction; records
/// added since follow in edge order. The edge's own label, type and label
/// offset are written to its first link, which they were taken from.
pub fn disaggregate(edges: &[Edge]) -> Vec<Relationship> {
    let mut records: Vec<(Option<usize>, Relationship)> = Vec::new();
    for edge in edges {
        let Some((first, rest)) = edge.models.split_first() else {
            records.push((None, Relationship::from_edge(edge)));
            continue;
        };
        let mut head = Relationship::from_link(first);
        head.label = edge.label.clone();
        head.kind = edge.kind;
        head.label_offset = edge.label_offset;
        records.push((first.record_index, head));
        for link in rest {
            records.push((link.record_index, Relationship::from_link(link)));
        }
    }
    records.sort_by_key(|(index, _)| index.unwrap_or(usize::MAX));
    records.into_iter().map(|(_, record)| record).collect()
}
