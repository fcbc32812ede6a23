//! Entity dependency graph.
//!
//! An entity depends on every other entity its generated source names: the
//! targets of single references and the elements of collections. Self edges
//! are dropped, since a type can always name itself.

use std::collections::{BTreeSet, HashMap};

use crate::schema::SchemaModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    names: Vec<String>,
    /// `dependencies[i]` holds the indices entity `i` needs, ascending
    dependencies: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Builds the graph over the model's entities, in input order.
    ///
    /// References to undeclared entities are not edges.
    pub fn from_model(model: &SchemaModel) -> Self {
        let index: HashMap<&str, usize> = model
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.as_str(), i))
            .collect();

        let dependencies = model
            .entities
            .iter()
            .map(|entity| {
                let targets: BTreeSet<usize> = entity
                    .referenced_entities()
                    .into_iter()
                    .filter_map(|target| index.get(target).copied())
                    .collect();
                targets.into_iter().collect()
            })
            .collect();

        Self {
            names: model.entities.iter().map(|e| e.name.clone()).collect(),
            dependencies,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn dependencies(&self, index: usize) -> &[usize] {
        &self.dependencies[index]
    }

    /// Deterministic dependency-first order.
    ///
    /// Kahn's algorithm, always taking the ready entity with the lowest input
    /// index. Entities on or behind a cycle never become ready; they are
    /// appended in input order.
    pub fn topological_order(&self) -> Vec<usize> {
        let n = self.len();
        let mut remaining: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (entity, deps) in self.dependencies.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(entity);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        let mut placed = vec![false; n];

        while let Some(next) = ready.pop_first() {
            order.push(next);
            placed[next] = true;
            for &dependent in &dependents[next] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        order.extend((0..n).filter(|&i| !placed[i]));
        order
    }

    /// Entities that cannot be placed without breaking a cycle, in input order.
    pub fn unordered(&self) -> Vec<usize> {
        let order = self.topological_order();
        let mut placed = vec![false; self.len()];
        let mut cut = self.len();
        for (position, &entity) in order.iter().enumerate() {
            if self.dependencies[entity].iter().any(|&dep| !placed[dep]) {
                cut = position;
                break;
            }
            placed[entity] = true;
        }
        let mut rest: Vec<usize> = order[cut..].to_vec();
        rest.sort_unstable();
        rest
    }
}
