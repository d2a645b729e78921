use std::collections::{HashMap, HashSet};

use super::TransactionId;

pub(crate) struct WaitForGraph {
    // key: transaction id, value: the transactions that the key transaction is waiting for
    graph: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl WaitForGraph {
    pub(crate) fn new() -> Self {
        Self {
            graph: HashMap::new(),
        }
    }

    pub(crate) fn add_edge(&mut self, from: TransactionId, to: TransactionId) {
        if from == to {
            return;
        }

        self.graph.entry(from).or_default().insert(to);
    }

    /// Drop every edge going out of `tid`, it's not waiting anymore.
    pub(crate) fn remove_waiter(&mut self, tid: TransactionId) {
        self.graph.remove(&tid);
    }

    /// Forget `tid` entirely, nobody can wait for a finished transaction.
    pub(crate) fn remove_transaction(&mut self, tid: TransactionId) {
        self.graph.remove(&tid);
        for targets in self.graph.values_mut() {
            targets.remove(&tid);
        }
        self.graph.retain(|_, targets| !targets.is_empty());
    }

    /// Return a cycle passing through `start`, if there is one.
    pub(crate) fn find_cycle(&self, start: TransactionId) -> Option<Vec<TransactionId>> {
        let mut path = vec![start];
        let mut visited = HashSet::new();
        if self.search(start, start, &mut path, &mut visited) {
            Some(path)
        } else {
            None
        }
    }

    fn search(
        &self,
        target: TransactionId,
        current: TransactionId,
        path: &mut Vec<TransactionId>,
        visited: &mut HashSet<TransactionId>,
    ) -> bool {
        if !visited.insert(current) {
            return false;
        }

        if let Some(next_hops) = self.graph.get(&current) {
            for &next in next_hops {
                if next == target {
                    return true;
                }

                path.push(next);
                if self.search(target, next, path, visited) {
                    return true;
                }
                path.pop();
            }
        }

        false
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}
