//! Shared utilities used by every pass: name mangling and the
//! connected-component discovery that both implicit-net passes build on.

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

use crate::error::{Error, ErrorKind, Result};

/// Produces `"_seg1_seg2_..._"`, wrapping with extra leading/trailing
/// underscores on collision with `avoid` until unique, up to `maxlen`.
pub fn flatname(segments: &[&str], avoid: &HashSet<ArcStr>, maxlen: usize) -> Result<ArcStr> {
    let mut candidate = format!("_{}_", segments.join("_"));
    loop {
        if candidate.len() > maxlen {
            return Err(Error::new(ErrorKind::NameExhaustion { candidate }));
        }
        if !avoid.iter().any(|n| n.as_str() == candidate) {
            return Ok(ArcStr::from(candidate));
        }
        candidate = format!("_{candidate}_");
    }
}

/// A reference to one instance's port, used as a node in the adjacency graph
/// that the implicit-net passes build over `instance.port = instance.port`
/// style connections.
pub type PortRefKey = (ArcStr, ArcStr);

/// Groups `PortRefKey`s into connected components given a set of undirected
/// edges (each `(a, b)` pair ties `a` and `b` together). Components are
/// discovered in first-seen order, matching declaration order of the edges.
pub fn connected_components(edges: &[(PortRefKey, PortRefKey)]) -> Vec<Vec<PortRefKey>> {
    let mut adjacency: IndexMap<PortRefKey, Vec<PortRefKey>> = IndexMap::new();
    for (a, b) in edges {
        adjacency.entry(a.clone()).or_default().push(b.clone());
        adjacency.entry(b.clone()).or_default().push(a.clone());
    }

    let mut remaining: IndexSet<PortRefKey> = adjacency.keys().cloned().collect();
    let mut components = Vec::new();
    while let Some(start) = remaining.iter().next().cloned() {
        remaining.shift_remove(&start);
        let mut component = vec![start.clone()];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if let Some(neighbors) = adjacency.get(&node) {
                for n in neighbors {
                    if remaining.shift_remove(n) {
                        component.push(n.clone());
                        stack.push(n.clone());
                    }
                }
            }
        }
        components.push(component);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatname_wraps_on_collision() {
        let mut avoid = HashSet::new();
        avoid.insert(ArcStr::from("_a_b_"));
        let name = flatname(&["a", "b"], &avoid, 511).unwrap();
        assert_eq!(name.as_str(), "__a_b__");
    }

    #[test]
    fn flatname_fails_past_maxlen() {
        let avoid = HashSet::new();
        let err = flatname(&["x".repeat(600).as_str()], &avoid, 511);
        assert!(err.is_err());
    }

    #[test]
    fn connected_components_merges_chains() {
        let a: PortRefKey = (ArcStr::from("x"), ArcStr::from("p"));
        let b: PortRefKey = (ArcStr::from("y"), ArcStr::from("q"));
        let c: PortRefKey = (ArcStr::from("z"), ArcStr::from("r"));
        let components = connected_components(&[(a.clone(), b.clone()), (b.clone(), c.clone())]);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 3);
    }

    #[test]
    fn connected_components_keeps_disjoint_groups_separate() {
        let a: PortRefKey = (ArcStr::from("x"), ArcStr::from("p"));
        let b: PortRefKey = (ArcStr::from("y"), ArcStr::from("q"));
        let c: PortRefKey = (ArcStr::from("m"), ArcStr::from("n"));
        let d: PortRefKey = (ArcStr::from("o"), ArcStr::from("p"));
        let components = connected_components(&[(a, b), (c, d)]);
        assert_eq!(components.len(), 2);
    }
}
