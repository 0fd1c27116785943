//! Topological sort with cycle detection.
//!
//! A post-order depth-first search over an explicit stack: a node is emitted
//! after every node reachable from it, so the output lists dependencies
//! before their dependents. The order is deterministic for a deterministic
//! successor function.
//!
//! A node that is reached again while it is still open (visited but not
//! finished) closes a cycle; the open path from that node is returned.

use std::hash::Hash;

use rustc_hash::FxHashSet;

/// The nodes of a cycle, starting and ending at the same node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cycle<N>(pub Vec<N>);

enum Frame<N> {
    Enter(N),
    Exit(N),
}

/// Sort the nodes reachable from `roots`, dependencies first.
pub fn topological_sort<N, I, F>(
    roots: impl IntoIterator<Item = N>,
    successors: F,
) -> Result<Vec<N>, Cycle<N>>
where
    N: Copy + Eq + Hash,
    I: IntoIterator<Item = N>,
    F: Fn(N) -> I,
{
    let mut order = Vec::new();
    let mut visited = FxHashSet::default();
    let mut finished = FxHashSet::default();
    // Nodes entered but not finished, in entry order.
    let mut path: Vec<N> = Vec::new();
    let mut stack: Vec<Frame<N>> = Vec::new();

    for root in roots {
        stack.push(Frame::Enter(root));

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(node) => {
                    if finished.contains(&node) {
                        continue;
                    }
                    if !visited.insert(node) {
                        // Visited and not finished: still open on `path`.
                        let start = path.iter().position(|open| *open == node).unwrap_or(0);
                        let mut cycle = path[start..].to_vec();
                        cycle.push(node);
                        return Err(Cycle(cycle));
                    }

                    path.push(node);
                    stack.push(Frame::Exit(node));

                    let next = successors(node).into_iter().collect::<Vec<_>>();
                    // Reversed so the first successor is explored first.
                    for successor in next.into_iter().rev() {
                        if !finished.contains(&successor) {
                            stack.push(Frame::Enter(successor));
                        }
                    }
                }
                Frame::Exit(node) => {
                    path.pop();
                    finished.insert(node);
                    order.push(node);
                }
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)]) -> impl Fn(u32) -> Vec<u32> + '_ {
        move |node| {
            edges
                .iter()
                .filter(|(from, _)| *from == node)
                .map(|(_, to)| *to)
                .collect()
        }
    }

    #[test]
    fn test_dependencies_come_first() {
        let edges = [(1, 2), (2, 3), (1, 3)];
        let order = topological_sort([1], graph(&edges)).expect("acyclic");
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let edges = [(1, 2), (1, 3), (2, 4), (3, 4)];
        let order = topological_sort([1], graph(&edges)).expect("acyclic");
        assert_eq!(order, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let edges = [(1, 2), (2, 3), (3, 2)];
        let cycle = topological_sort([1], graph(&edges)).expect_err("cycle");
        assert_eq!(cycle, Cycle(vec![2, 3, 2]));
    }

    #[test]
    fn test_self_loop() {
        let edges = [(5, 5)];
        assert_eq!(
            topological_sort([5], graph(&edges)),
            Err(Cycle(vec![5, 5]))
        );
    }

    #[test]
    fn test_multiple_roots_share_finished_nodes() {
        let edges = [(1, 3), (2, 3)];
        let order = topological_sort([1, 2], graph(&edges)).expect("acyclic");
        assert_eq!(order, vec![3, 1, 2]);
    }
}
