//! Topological sort and cycle detection over the entity dependency graph
//! (§4.2 "Reference Graph & Topological Build").

use indexmap::{IndexMap, IndexSet};

/// Topologically sort the nodes of `dependencies` (node name -> the set of
/// names it depends on) in deterministic order: nodes with no remaining
/// dependency are emitted in the insertion order of `dependencies`, per
/// §5's ordering guarantee that iteration replays insertion order.
///
/// Returns `Ok(order)` with one entry per node, dependencies before
/// dependents. On a cycle, returns `Err(cycle)` with the cycle's nodes in
/// the order the depth-first search encountered them, starting and ending
/// on the repeated node — this is the shape `BuildError::circular_dependency`
/// (§8 boundary scenario 2) expects.
pub fn topo_sort<I>(dependencies: I) -> Result<Vec<String>, Vec<String>>
where
    I: IntoIterator<Item = (String, IndexSet<String>)>,
{
    let graph: IndexMap<String, IndexSet<String>> = dependencies.into_iter().collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks: IndexMap<&str, Mark> = graph.keys().map(|k| (k.as_str(), Mark::Unvisited)).collect();
    let mut order = Vec::with_capacity(graph.len());
    let mut stack: Vec<&str> = Vec::new();

    fn visit<'a>(
        node: &'a str,
        graph: &'a IndexMap<String, IndexSet<String>>,
        marks: &mut IndexMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<(), Vec<String>> {
        match marks.get(node).copied().unwrap_or(Mark::Done) {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let mut cycle: Vec<String> = stack
                    .iter()
                    .skip_while(|&&n| n != node)
                    .map(|s| s.to_string())
                    .collect();
                cycle.push(node.to_string());
                return Err(cycle);
            }
            Mark::Unvisited => {}
        }

        marks.insert(node, Mark::InProgress);
        stack.push(node);

        if let Some(deps) = graph.get(node) {
            for dep in deps {
                visit(dep.as_str(), graph, marks, stack, order)?;
            }
        }

        stack.pop();
        marks.insert(node, Mark::Done);
        order.push(node.to_string());
        Ok(())
    }

    for node in graph.keys() {
        visit(node.as_str(), &graph, &mut marks, &mut stack, &mut order)?;
    }

    Ok(order)
}
