//! Dependency ordering.
//!
//! Explicit three-color depth-first search: iterative, with stack depth
//! bounded by plan size. A gray-on-gray edge is a cycle and fails the whole
//! plan before any action runs. Dependencies on ids not present in the plan
//! are left to the dispatch-time gate, which skips the dependent action.

use std::collections::HashMap;

use crate::errors::ExecutorError;
use crate::types::EnhancedAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// A valid topological order over the plan's actions: every dependency
/// appears before its dependents.
pub fn execution_order(actions: &[EnhancedAction]) -> Result<Vec<String>, ExecutorError> {
    let mut index: HashMap<&str, &EnhancedAction> = HashMap::with_capacity(actions.len());
    for action in actions {
        if index.insert(action.id.as_str(), action).is_some() {
            return Err(ExecutorError::DuplicateActionId(action.id.clone()));
        }
    }

    let mut marks: HashMap<&str, Mark> = actions
        .iter()
        .map(|action| (action.id.as_str(), Mark::White))
        .collect();
    let mut order = Vec::with_capacity(actions.len());

    for root in actions {
        if marks[root.id.as_str()] != Mark::White {
            continue;
        }
        marks.insert(root.id.as_str(), Mark::Gray);
        let mut stack: Vec<(&EnhancedAction, usize)> = vec![(root, 0)];

        while let Some((node, dep_idx)) = stack.last_mut() {
            let next_dep = if *dep_idx < node.dependencies.len() {
                let dep = node.dependencies[*dep_idx].clone();
                *dep_idx += 1;
                Some(dep)
            } else {
                None
            };

            match next_dep {
                Some(dep_id) => {
                    let Some(&dep) = index.get(dep_id.as_str()) else {
                        // unknown dependency: can never be satisfied, handled
                        // by the dispatch-time skip
                        continue;
                    };
                    match marks[dep.id.as_str()] {
                        Mark::White => {
                            marks.insert(dep.id.as_str(), Mark::Gray);
                            stack.push((dep, 0));
                        }
                        Mark::Gray => {
                            return Err(ExecutorError::CyclicDependency {
                                action_id: dep.id.clone(),
                            });
                        }
                        Mark::Black => {}
                    }
                }
                None => {
                    if let Some((node, _)) = stack.pop() {
                        marks.insert(node.id.as_str(), Mark::Black);
                        order.push(node.id.clone());
                    }
                }
            }
        }
    }

    Ok(order)
}

/// Group the topological order into dependency levels: every action's
/// dependencies live in strictly earlier levels, so one level can run
/// concurrently.
pub fn execution_levels(actions: &[EnhancedAction]) -> Result<Vec<Vec<String>>, ExecutorError> {
    let order = execution_order(actions)?;
    let index: HashMap<&str, &EnhancedAction> = actions
        .iter()
        .map(|action| (action.id.as_str(), action))
        .collect();

    let mut level_of: HashMap<String, usize> = HashMap::with_capacity(order.len());
    let mut levels: Vec<Vec<String>> = Vec::new();
    for id in order {
        let action = index[id.as_str()];
        let level = action
            .dependencies
            .iter()
            .filter_map(|dep| level_of.get(dep.as_str()))
            .map(|dep_level| dep_level + 1)
            .max()
            .unwrap_or(0);
        level_of.insert(id.clone(), level);
        if levels.len() <= level {
            levels.resize_with(level + 1, Vec::new);
        }
        levels[level].push(id);
    }
    Ok(levels)
}
