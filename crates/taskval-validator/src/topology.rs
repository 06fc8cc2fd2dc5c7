use crate::TaskGraph;
use std::collections::VecDeque;

/// Outcome of Kahn's algorithm over the resolved dependency edges of a graph.
///
/// Indices refer to `graph.tasks`. Only the first occurrence of a duplicated
/// `task_id` takes part; later duplicates appear in neither list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Topology {
    /// Tasks in creation order: every task after all of its dependencies.
    pub order: Vec<usize>,
    /// Tasks whose in-degree never reached zero, in document order.
    pub blocked: Vec<usize>,
}

impl Topology {
    pub fn is_acyclic(&self) -> bool {
        self.blocked.is_empty()
    }
}

/// Orders tasks so each follows its dependencies.
///
/// The ready queue is FIFO and seeded in document order; dependents become
/// ready in the order their tasks appear in the document. Dangling references
/// are skipped.
pub fn topological_order(graph: &TaskGraph) -> Topology {
    let index = graph.task_index();
    let canonical: Vec<usize> = graph
        .tasks
        .iter()
        .enumerate()
        .filter(|(position, task)| index.get(task.task_id.as_str()) == Some(position))
        .map(|(position, _)| position)
        .collect();

    let mut in_degree = vec![0usize; graph.tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); graph.tasks.len()];
    for &position in &canonical {
        for dependency in graph.tasks[position].dependencies() {
            let Some(&dependency) = index.get(dependency.as_str()) else {
                continue;
            };
            dependents[dependency].push(position);
            in_degree[position] += 1;
        }
    }

    let mut queue: VecDeque<usize> = canonical
        .iter()
        .copied()
        .filter(|&position| in_degree[position] == 0)
        .collect();
    let mut order = Vec::with_capacity(canonical.len());
    while let Some(position) = queue.pop_front() {
        order.push(position);
        for &dependent in &dependents[position] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    let blocked = canonical
        .into_iter()
        .filter(|&position| in_degree[position] > 0)
        .collect();

    Topology { order, blocked }
}
