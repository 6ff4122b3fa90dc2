//! Graph views over the model used for cycle and reachability questions.
use super::element::{Element, ElementId};
use super::registry::EdmModel;
use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graphmap::DiGraphMap;
use std::collections::HashSet;

/// Edges point from a derived type to its resolved base type.
pub fn inheritance_graph(model: &EdmModel) -> DiGraphMap<ElementId, ()> {
    let mut graph = DiGraphMap::new();
    for id in (0..model.element_count()).map(ElementId::new) {
        if let Some(base) = model.base_type(id) {
            graph.add_edge(id, base, ());
        }
    }
    graph
}

/// Every structured type that participates in a base-type cycle, including
/// types that are their own base.
pub fn cyclic_base_types(model: &EdmModel) -> HashSet<ElementId> {
    let graph = inheritance_graph(model);
    tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .collect()
}

/// Edges point from a containing entity type to the type it contains.
pub fn containment_graph(model: &EdmModel) -> DiGraphMap<ElementId, ()> {
    let mut graph = DiGraphMap::new();
    for id in (0..model.element_count()).map(ElementId::new) {
        if let Some(Element::NavigationProperty(nav)) = model.element(id) {
            if !nav.contains_target {
                continue;
            }
            if let Some(target) = model.navigation_target(id) {
                graph.add_edge(nav.declaring_type, target, ());
            }
        }
    }
    graph
}

/// Whether `to` is reachable from `from` by following one or more containment edges.
pub fn contains_transitively(graph: &DiGraphMap<ElementId, ()>, from: ElementId, to: ElementId) -> bool {
    if !graph.contains_node(from) || !graph.contains_node(to) {
        return false;
    }
    graph
        .neighbors(from)
        .any(|next| next == to || has_path_connecting(graph, next, to, None))
}
