//! Recursion Analysis
//!
//! Builds the dependency graph over node ids, computes strongly connected
//! components (Tarjan, input-order tiebreaks), marks the edges that close
//! cycles, and produces the declaration emission order.
//!
//! The analysis only annotates; it never rewrites the IR.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use crate::ir::{Module, NodeId};

/// Result of recursion analysis
#[derive(Debug)]
pub struct Analysis {
    /// Declarations in emission order: SCCs contiguous in reverse topological
    /// order, members of a multi-node SCC in DFS post-order from the member
    /// with the smallest source index
    pub order: Vec<NodeId>,
    /// Edges (from, to) that stay within one SCC and therefore need
    /// forward-reference treatment at emission time
    pub back_edges: HashSet<(NodeId, NodeId)>,
}

pub fn analyze(module: &Module, decls: &[NodeId]) -> Analysis {
    let mut graph: DiGraph<NodeId, ()> = DiGraph::with_capacity(module.len(), module.len() * 2);

    // Node indexes equal ids because nodes are added in id order
    for node in module.iter() {
        graph.add_node(node.id);
    }
    for node in module.iter() {
        for dep in module.deps(node.id) {
            let dep = module.resolve(dep);
            graph.add_edge(
                NodeIndex::new(node.id.index()),
                NodeIndex::new(dep.index()),
                (),
            );
        }
    }

    let sccs = tarjan_scc(&graph);

    // Map each node to its SCC index
    let mut scc_of: HashMap<NodeId, usize> = HashMap::with_capacity(module.len());
    for (scc_index, scc) in sccs.iter().enumerate() {
        for &member in scc {
            scc_of.insert(graph[member], scc_index);
        }
    }

    // Intra-SCC edges (including self loops) close cycles
    let mut back_edges = HashSet::new();
    for edge in graph.edge_indices() {
        let (a, b) = graph.edge_endpoints(edge).expect("edge endpoints");
        let (from, to) = (graph[a], graph[b]);
        if from == to || scc_of.get(&from) == scc_of.get(&to) {
            if scc_len(&sccs, scc_of[&from]) > 1 || from == to {
                back_edges.insert((from, to));
            }
        }
    }

    // tarjan_scc yields SCCs in reverse topological order, so dependencies
    // come before their dependents when flattened
    let decl_set: HashSet<NodeId> = decls.iter().copied().collect();
    let mut order = Vec::with_capacity(decls.len());
    for scc in &sccs {
        let members: Vec<NodeId> = scc.iter().map(|&idx| graph[idx]).collect();
        let sequence = if members.len() == 1 {
            members
        } else {
            scc_post_order(module, &members)
        };
        for id in sequence {
            if decl_set.contains(&id) {
                order.push(id);
            }
        }
    }

    tracing::debug!(
        decls = order.len(),
        back_edges = back_edges.len(),
        sccs = sccs.iter().filter(|s| s.len() > 1).count(),
        "recursion analysis complete"
    );

    Analysis { order, back_edges }
}

fn scc_len(sccs: &[Vec<NodeIndex>], index: usize) -> usize {
    sccs[index].len()
}

/// DFS post-order over one SCC, entered at the member with the smallest
/// source index, following dependency edges in declaration order. This puts
/// synthesized item types ahead of their hosts.
fn scc_post_order(module: &Module, members: &[NodeId]) -> Vec<NodeId> {
    let member_set: HashSet<NodeId> = members.iter().copied().collect();
    let start = *members.iter().min().expect("non-empty SCC");

    let mut visited = HashSet::new();
    let mut order = Vec::with_capacity(members.len());
    post_order(module, start, &member_set, &mut visited, &mut order);

    // A strongly connected component is fully reachable from any member, but
    // guard against the impossible anyway
    for &member in members {
        if !visited.contains(&member) {
            order.push(member);
        }
    }

    order
}

fn post_order(
    module: &Module,
    current: NodeId,
    members: &HashSet<NodeId>,
    visited: &mut HashSet<NodeId>,
    order: &mut Vec<NodeId>,
) {
    if !visited.insert(current) {
        return;
    }
    for dep in module.deps(current) {
        let dep = module.resolve(dep);
        if members.contains(&dep) {
            post_order(module, dep, members, visited, order);
        }
    }
    order.push(current);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Constraints, Extensible, Field, NodeKind, PrimitiveKind};

    fn field(name: &str, ty: NodeId) -> Field {
        Field {
            ir_name: name.to_string(),
            wire_name: name.to_string(),
            ty,
            required: false,
            default: None,
            literal: None,
            nullable: false,
            constraints: Constraints::default(),
            doc: None,
        }
    }

    fn object(module: &mut Module, name: &str, fields: Vec<Field>) -> NodeId {
        module.alloc(
            Some(name.to_string()),
            None,
            String::new(),
            NodeKind::Object {
                fields,
                extends: None,
                extensible: Extensible::Forbid,
            },
        )
    }

    #[test]
    fn test_mutual_recursion_single_scc() {
        let mut module = Module::new();
        let a = object(&mut module, "MutualA", Vec::new());
        let b = object(&mut module, "MutualB", Vec::new());
        match &mut module.node_mut(a).kind {
            NodeKind::Object { fields, .. } => fields.push(field("b", b)),
            _ => unreachable!(),
        }
        match &mut module.node_mut(b).kind {
            NodeKind::Object { fields, .. } => fields.push(field("a", a)),
            _ => unreachable!(),
        }

        let analysis = analyze(&module, &[a, b]);
        // Contiguous, dependency-first post-order from the first-declared member
        assert_eq!(analysis.order, vec![b, a]);
        assert!(analysis.back_edges.contains(&(a, b)));
        assert!(analysis.back_edges.contains(&(b, a)));
    }

    #[test]
    fn test_self_loop_marked() {
        let mut module = Module::new();
        let node = object(&mut module, "LinkedList", Vec::new());
        match &mut module.node_mut(node).kind {
            NodeKind::Object { fields, .. } => fields.push(field("next", node)),
            _ => unreachable!(),
        }

        let analysis = analyze(&module, &[node]);
        assert_eq!(analysis.order, vec![node]);
        assert!(analysis.back_edges.contains(&(node, node)));
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let mut module = Module::new();
        let leaf = module.alloc(
            Some("Leaf".to_string()),
            None,
            String::new(),
            NodeKind::Primitive {
                kind: PrimitiveKind::String,
                format: None,
                constraints: Constraints::default(),
            },
        );
        let parent = object(&mut module, "Parent", vec![field("leaf", leaf)]);

        let analysis = analyze(&module, &[parent, leaf]);
        assert_eq!(analysis.order, vec![leaf, parent]);
        assert!(analysis.back_edges.is_empty());
    }

    #[test]
    fn test_acyclic_edges_not_marked() {
        let mut module = Module::new();
        let a = object(&mut module, "A", Vec::new());
        let b = object(&mut module, "B", vec![field("a", a)]);

        let analysis = analyze(&module, &[a, b]);
        assert!(analysis.back_edges.is_empty());
        assert_eq!(analysis.order, vec![a, b]);
    }
}
