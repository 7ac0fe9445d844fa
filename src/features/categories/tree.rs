//! In-memory category forest.
//!
//! A snapshot of category rows indexed by id, with a parent to children index.
//! Every structural write (create, rename, reparent, delete) is validated and
//! applied here first; the service then persists the resulting row values inside
//! the same transaction that loaded the snapshot.
//!
//! Rows whose parent is missing from the snapshot are treated as roots, so a
//! partial snapshot (one subtree loaded by a recursive query) behaves as a
//! forest of its own.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::categories::models::Category;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryTreeError {
    #[error("The name '{0}' has already been taken.")]
    DuplicateName(String),

    #[error("{0}")]
    InvalidParent(&'static str),

    #[error("Cannot set parent to one of its own descendants.")]
    CycleDetected,

    #[error("Category {0} not found")]
    UnknownCategory(Uuid),
}

impl From<CategoryTreeError> for AppError {
    fn from(err: CategoryTreeError) -> Self {
        match err {
            CategoryTreeError::UnknownCategory(_) => {
                AppError::NotFound("Category not found".to_string())
            }
            CategoryTreeError::DuplicateName(_) => AppError::Validation(format!("name: {}", err)),
            CategoryTreeError::InvalidParent(_) | CategoryTreeError::CycleDetected => {
                AppError::Validation(format!("parent_id: {}", err))
            }
        }
    }
}

/// What a delete changed, for the service to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub removed: Category,
    /// Former direct children, now pointing at `removed.parent_id`
    pub reparented: Vec<Uuid>,
}

/// Ordering used at every level of the tree
fn name_key(name: &str) -> (String, &str) {
    (name.to_lowercase(), name)
}

/// Matches the `LOWER(name)` unique index for full-case-only differences:
/// "straße" and "STRASSE" stay distinct in both.
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[derive(Debug, Default, Clone)]
pub struct CategoryForest {
    nodes: HashMap<Uuid, Category>,
    children: HashMap<Uuid, Vec<Uuid>>,
    roots: Vec<Uuid>,
}

impl CategoryForest {
    pub fn from_rows(rows: Vec<Category>) -> Self {
        let mut forest = Self {
            nodes: rows.into_iter().map(|c| (c.id, c)).collect(),
            children: HashMap::new(),
            roots: Vec::new(),
        };
        forest.reindex();
        forest
    }

    /// Rebuild the child lists and root list from the parent pointers
    fn reindex(&mut self) {
        self.children.clear();
        self.roots.clear();

        for category in self.nodes.values() {
            match category.parent_id.filter(|p| self.nodes.contains_key(p)) {
                Some(parent) => self.children.entry(parent).or_default().push(category.id),
                None => self.roots.push(category.id),
            }
        }

        let nodes = &self.nodes;
        let by_name = |a: &Uuid, b: &Uuid| name_key(&nodes[a].name).cmp(&name_key(&nodes[b].name));
        self.roots.sort_by(by_name);
        for list in self.children.values_mut() {
            list.sort_by(by_name);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&Category> {
        self.nodes.get(&id)
    }

    fn require(&self, id: Uuid) -> Result<&Category, CategoryTreeError> {
        self.nodes
            .get(&id)
            .ok_or(CategoryTreeError::UnknownCategory(id))
    }

    /// Snapshot roots, ordered by name
    pub fn roots(&self) -> &[Uuid] {
        &self.roots
    }

    /// Direct children, ordered by name
    pub fn children_of(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent chain of `id`, nearest first.
    ///
    /// The walk stops after `len()` steps, so corrupted data cannot loop forever.
    pub fn ancestors(&self, id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        let mut current = self.nodes.get(&id).and_then(|c| c.parent_id);
        let mut remaining = self.nodes.len();

        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let next = current?;
            remaining -= 1;
            current = self.nodes.get(&next).and_then(|c| c.parent_id);
            Some(next)
        })
    }

    /// True when `candidate` sits strictly below `ancestor`
    pub fn is_descendant_of(&self, candidate: Uuid, ancestor: Uuid) -> bool {
        self.ancestors(candidate).any(|a| a == ancestor)
    }

    /// Case-insensitive name lookup
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        self.nodes.values().find(|c| same_name(&c.name, name))
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    pub fn check_create(&self, name: &str, parent_id: Option<Uuid>) -> Result<(), CategoryTreeError> {
        if self.find_by_name(name).is_some() {
            return Err(CategoryTreeError::DuplicateName(name.to_string()));
        }
        if let Some(parent) = parent_id {
            if !self.nodes.contains_key(&parent) {
                return Err(CategoryTreeError::InvalidParent(
                    "The selected parent category does not exist.",
                ));
            }
        }
        Ok(())
    }

    /// `Ok(false)` when the name is unchanged
    pub fn check_rename(&self, id: Uuid, new_name: &str) -> Result<bool, CategoryTreeError> {
        let current = self.require(id)?;
        if current.name == new_name {
            return Ok(false);
        }
        match self.find_by_name(new_name) {
            Some(other) if other.id != id => {
                Err(CategoryTreeError::DuplicateName(new_name.to_string()))
            }
            _ => Ok(true),
        }
    }

    pub fn check_reparent(
        &self,
        id: Uuid,
        new_parent: Option<Uuid>,
    ) -> Result<(), CategoryTreeError> {
        self.require(id)?;

        let Some(parent) = new_parent else {
            return Ok(());
        };

        if parent == id {
            return Err(CategoryTreeError::InvalidParent(
                "A category cannot be its own parent.",
            ));
        }
        if !self.nodes.contains_key(&parent) {
            return Err(CategoryTreeError::InvalidParent(
                "The selected parent category does not exist.",
            ));
        }
        if self.is_descendant_of(parent, id) {
            return Err(CategoryTreeError::CycleDetected);
        }
        Ok(())
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Validate and add a new category, returning the stored row
    pub fn create(
        &mut self,
        name: &str,
        parent_id: Option<Uuid>,
        image_path: Option<String>,
    ) -> Result<&Category, CategoryTreeError> {
        self.check_create(name, parent_id)?;

        let now = Utc::now();
        let category = Category {
            id: Uuid::now_v7(),
            name: name.to_string(),
            parent_id,
            image_path,
            created_at: now,
            updated_at: now,
        };
        let id = category.id;
        self.nodes.insert(id, category);
        self.reindex();

        self.require(id)
    }

    /// `Ok(false)` when the name is unchanged
    pub fn rename(&mut self, id: Uuid, new_name: &str) -> Result<bool, CategoryTreeError> {
        if !self.check_rename(id, new_name)? {
            return Ok(false);
        }
        if let Some(category) = self.nodes.get_mut(&id) {
            category.name = new_name.to_string();
            category.updated_at = Utc::now();
        }
        self.reindex();
        Ok(true)
    }

    pub fn reparent(&mut self, id: Uuid, new_parent: Option<Uuid>) -> Result<(), CategoryTreeError> {
        self.check_reparent(id, new_parent)?;
        if let Some(category) = self.nodes.get_mut(&id) {
            category.parent_id = new_parent;
            category.updated_at = Utc::now();
        }
        self.reindex();
        Ok(())
    }

    /// Overwrite a node with its persisted row
    pub fn replace(&mut self, category: Category) {
        self.nodes.insert(category.id, category);
        self.reindex();
    }

    /// Remove `id`, handing its children to its own parent
    pub fn remove(&mut self, id: Uuid) -> Result<Removal, CategoryTreeError> {
        let grandparent = self.require(id)?.parent_id;
        let reparented: Vec<Uuid> = self.children_of(id).to_vec();

        let now = Utc::now();
        for child in &reparented {
            if let Some(category) = self.nodes.get_mut(child) {
                category.parent_id = grandparent;
                category.updated_at = now;
            }
        }

        let removed = self
            .nodes
            .remove(&id)
            .ok_or(CategoryTreeError::UnknownCategory(id))?;
        self.reindex();

        Ok(Removal {
            removed,
            reparented,
        })
    }

    // =========================================================================
    // PROJECTION
    // =========================================================================

    /// Build `root` and everything below it.
    ///
    /// Nodes are discovered breadth-first, then assembled in reverse discovery
    /// order so every child is finished before its parent. `build` receives the
    /// node and its already-built children in name order.
    pub fn build_subtree<T>(
        &self,
        root: Uuid,
        build: &mut impl FnMut(&Category, Vec<T>) -> T,
    ) -> Option<T> {
        if !self.nodes.contains_key(&root) {
            return None;
        }

        let mut order = Vec::new();
        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for child in self.children_of(id) {
                if seen.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }

        let mut built: HashMap<Uuid, T> = HashMap::with_capacity(order.len());
        for id in order.iter().rev() {
            let children = self
                .children_of(*id)
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(*id, build(&self.nodes[id], children));
        }

        built.remove(&root)
    }

    /// Subtrees for `roots`, in the given order; unknown ids are skipped
    pub fn build_forest<T>(
        &self,
        roots: &[Uuid],
        mut build: impl FnMut(&Category, Vec<T>) -> T,
    ) -> Vec<T> {
        roots
            .iter()
            .filter_map(|root| self.build_subtree(*root, &mut build))
            .collect()
    }

    /// Every category ordered by name, optionally filtered by a
    /// case-insensitive substring
    pub fn flat(&self, search: Option<&str>) -> Vec<&Category> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut list: Vec<&Category> = self
            .nodes
            .values()
            .filter(|c| match &needle {
                Some(n) => c.name.to_lowercase().contains(n),
                None => true,
            })
            .collect();
        list.sort_by(|a, b| name_key(&a.name).cmp(&name_key(&b.name)));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::lorem::en::Word;
    use fake::Fake;

    #[derive(Debug, PartialEq)]
    struct Node {
        name: String,
        children: Vec<Node>,
    }

    fn shape(forest: &CategoryForest) -> Vec<Node> {
        forest.build_forest(forest.roots(), |c, children| Node {
            name: c.name.clone(),
            children,
        })
    }

    fn leaf(name: &str) -> Node {
        Node {
            name: name.to_string(),
            children: vec![],
        }
    }

    fn node(name: &str, children: Vec<Node>) -> Node {
        Node {
            name: name.to_string(),
            children,
        }
    }

    /// A -> B -> C
    fn chain() -> (CategoryForest, Uuid, Uuid, Uuid) {
        let mut forest = CategoryForest::default();
        let a = forest.create("A", None, None).unwrap().id;
        let b = forest.create("B", Some(a), None).unwrap().id;
        let c = forest.create("C", Some(b), None).unwrap().id;
        (forest, a, b, c)
    }

    /// Every acyclic parent assignment over `n` nodes
    fn all_forests(n: usize) -> Vec<(CategoryForest, Vec<Uuid>)> {
        let ids: Vec<Uuid> = (0..n).map(|_| Uuid::now_v7()).collect();
        let choices = n + 1; // index n means "no parent"
        let mut result = Vec::new();

        for code in 0..choices.pow(n as u32) {
            let mut rest = code;
            let parents: Vec<Option<Uuid>> = (0..n)
                .map(|_| {
                    let pick = rest % choices;
                    rest /= choices;
                    (pick < n).then(|| ids[pick])
                })
                .collect();

            let now = Utc::now();
            let rows: Vec<Category> = ids
                .iter()
                .zip(&parents)
                .enumerate()
                .map(|(i, (id, parent))| Category {
                    id: *id,
                    name: format!("node-{}", i),
                    parent_id: *parent,
                    image_path: None,
                    created_at: now,
                    updated_at: now,
                })
                .collect();

            let forest = CategoryForest::from_rows(rows);
            // Keep only acyclic shapes: every walk must end at a root
            let acyclic = ids.iter().all(|id| {
                let last = forest.ancestors(*id).last().unwrap_or(*id);
                forest.get(last).map(|c| c.parent_id.is_none()).unwrap_or(false)
                    && forest.ancestors(*id).count() < n
            });
            if acyclic {
                result.push((forest, ids.clone()));
            }
        }
        result
    }

    fn terminates_at_root(forest: &CategoryForest, id: Uuid) -> bool {
        let steps = forest.ancestors(id).count();
        let top = forest.ancestors(id).last().unwrap_or(id);
        steps < forest.len() && forest.get(top).is_some_and(|c| c.parent_id.is_none())
    }

    #[test]
    fn test_reparent_into_own_descendant_is_a_cycle() {
        let (mut forest, a, _, c) = chain();
        assert_eq!(forest.reparent(a, Some(c)), Err(CategoryTreeError::CycleDetected));
    }

    #[test]
    fn test_promote_to_root_splits_the_chain() {
        let (mut forest, _, _, c) = chain();
        forest.reparent(c, None).unwrap();
        assert_eq!(
            shape(&forest),
            vec![node("A", vec![leaf("B")]), leaf("C")]
        );
    }

    #[test]
    fn test_delete_middle_node_reparents_child_to_grandparent() {
        let (mut forest, a, b, c) = chain();
        let removal = forest.remove(b).unwrap();
        assert_eq!(removal.reparented, vec![c]);
        assert_eq!(forest.get(c).unwrap().parent_id, Some(a));
        assert_eq!(shape(&forest), vec![node("A", vec![leaf("C")])]);
    }

    #[test]
    fn test_delete_root_promotes_children() {
        let (mut forest, a, b, _) = chain();
        forest.remove(a).unwrap();
        assert_eq!(forest.get(b).unwrap().parent_id, None);
        assert_eq!(forest.roots(), &[b]);
    }

    #[test]
    fn test_self_parent_is_invalid() {
        let (forest, _, b, _) = chain();
        assert!(matches!(
            forest.check_reparent(b, Some(b)),
            Err(CategoryTreeError::InvalidParent(_))
        ));
    }

    #[test]
    fn test_unknown_parent_is_invalid() {
        let (forest, a, _, _) = chain();
        assert!(matches!(
            forest.check_reparent(a, Some(Uuid::now_v7())),
            Err(CategoryTreeError::InvalidParent(_))
        ));
        assert!(matches!(
            forest.check_create("D", Some(Uuid::now_v7())),
            Err(CategoryTreeError::InvalidParent(_))
        ));
    }

    #[test]
    fn test_unknown_target_is_reported() {
        let (forest, _, _, _) = chain();
        let ghost = Uuid::now_v7();
        assert_eq!(
            forest.check_reparent(ghost, None),
            Err(CategoryTreeError::UnknownCategory(ghost))
        );
    }

    #[test]
    fn test_duplicate_names_are_rejected_across_subtrees() {
        let mut forest = CategoryForest::default();
        let science = forest.create("Science", None, None).unwrap().id;
        forest.create("Math", Some(science), None).unwrap();

        assert_eq!(
            forest.check_create("Math", None),
            Err(CategoryTreeError::DuplicateName("Math".to_string()))
        );
        assert!(matches!(
            forest.check_create("MATH", Some(science)),
            Err(CategoryTreeError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_lowercase_does_not_fold_sharp_s() {
        let mut forest = CategoryForest::default();
        forest.create("straße", None, None).unwrap();
        assert_eq!(forest.check_create("STRASSE", None), Ok(()));
        assert!(forest.check_create("STRAßE", None).is_err());
    }

    #[test]
    fn test_replace_keeps_subtree_and_takes_new_row() {
        let (mut forest, a, b, c) = chain();
        let mut row = forest.get(b).unwrap().clone();
        row.image_path = Some("public/categories/b.png".to_string());
        forest.replace(row);

        assert_eq!(forest.children_of(a), &[b]);
        assert_eq!(forest.children_of(b), &[c]);
        assert_eq!(
            forest.get(b).unwrap().image_path.as_deref(),
            Some("public/categories/b.png")
        );
    }

    #[test]
    fn test_rename_rules() {
        let (mut forest, a, b, _) = chain();
        assert_eq!(forest.rename(a, "A"), Ok(false));
        assert!(matches!(forest.rename(a, "b"), Err(CategoryTreeError::DuplicateName(_))));
        // Changing only the case of its own name is allowed
        assert_eq!(forest.rename(b, "b"), Ok(true));
        assert_eq!(forest.get(b).unwrap().name, "b");
    }

    #[test]
    fn test_flat_search_is_filtered_and_sorted() {
        let mut forest = CategoryForest::default();
        for name in ["Graph Algorithms", "Calculus", "algorithms 101", "Algebra", "Sorting Algos"] {
            forest.create(name, None, None).unwrap();
        }
        let names: Vec<&str> = forest
            .flat(Some("algo"))
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["algorithms 101", "Graph Algorithms", "Sorting Algos"]);
        assert_eq!(forest.flat(None).len(), 5);
        assert_eq!(forest.flat(Some("  ")).len(), 5);
    }

    #[test]
    fn test_children_are_ordered_by_name() {
        let mut forest = CategoryForest::default();
        let root = forest.create("Root", None, None).unwrap().id;
        let mut names: Vec<String> = (0..6)
            .map(|i| format!("{}-{}", Word().fake::<String>(), i))
            .collect();
        for name in &names {
            forest.create(name, Some(root), None).unwrap();
        }
        names.sort_by(|a, b| name_key(a).cmp(&name_key(b)));

        let built = forest.build_subtree(root, &mut |c, children: Vec<String>| {
            if children.is_empty() {
                c.name.clone()
            } else {
                children.join(",")
            }
        });
        assert_eq!(built, Some(names.join(",")));
    }

    #[test]
    fn test_deep_chain_builds_without_recursion_limits() {
        let now = Utc::now();
        let ids: Vec<Uuid> = (0..5_000).map(|_| Uuid::now_v7()).collect();
        let rows = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Category {
                id: *id,
                name: format!("level-{}", i),
                parent_id: i.checked_sub(1).map(|p| ids[p]),
                image_path: None,
                created_at: now,
                updated_at: now,
            })
            .collect();
        let forest = CategoryForest::from_rows(rows);

        let depth = forest.build_subtree(ids[0], &mut |_, children: Vec<usize>| {
            children.first().copied().unwrap_or(0) + 1
        });
        assert_eq!(depth, Some(5_000));
        assert!(terminates_at_root(&forest, ids[4_999]));
    }

    #[test]
    fn test_partial_snapshot_treats_orphans_as_roots() {
        let (forest, _, b, c) = chain();
        let rows: Vec<Category> = [b, c]
            .iter()
            .map(|id| forest.get(*id).unwrap().clone())
            .collect();
        let subtree = CategoryForest::from_rows(rows);
        assert_eq!(subtree.roots(), &[b]);
        assert_eq!(subtree.children_of(b), &[c]);
    }

    #[test]
    fn test_corrupted_cycle_walk_is_bounded() {
        let now = Utc::now();
        let (x, y) = (Uuid::now_v7(), Uuid::now_v7());
        let row = |id, parent, name: &str| Category {
            id,
            name: name.to_string(),
            parent_id: Some(parent),
            image_path: None,
            created_at: now,
            updated_at: now,
        };
        let forest = CategoryForest::from_rows(vec![row(x, y, "x"), row(y, x, "y")]);
        assert_eq!(forest.ancestors(x).count(), 2);
        assert!(forest.roots().is_empty());
    }

    #[test]
    fn test_reparent_fails_exactly_for_self_and_descendants() {
        for (forest, ids) in all_forests(4) {
            for &c in &ids {
                let descendants: HashSet<Uuid> = ids
                    .iter()
                    .copied()
                    .filter(|p| forest.is_descendant_of(*p, c))
                    .collect();

                for &p in &ids {
                    let result = forest.check_reparent(c, Some(p));
                    if p == c {
                        assert!(matches!(result, Err(CategoryTreeError::InvalidParent(_))));
                    } else if descendants.contains(&p) {
                        assert_eq!(result, Err(CategoryTreeError::CycleDetected));
                    } else {
                        assert_eq!(result, Ok(()));
                        let mut after = forest.clone();
                        after.reparent(c, Some(p)).unwrap();
                        assert!(ids.iter().all(|id| terminates_at_root(&after, *id)));
                    }
                }
                assert_eq!(forest.check_reparent(c, None), Ok(()));
            }
        }
    }

    #[test]
    fn test_delete_only_moves_direct_children() {
        for (forest, ids) in all_forests(4) {
            for &victim in &ids {
                let before: HashMap<Uuid, Option<Uuid>> = ids
                    .iter()
                    .map(|id| (*id, forest.get(*id).unwrap().parent_id))
                    .collect();
                let grandparent = before[&victim];

                let mut after = forest.clone();
                let removal = after.remove(victim).unwrap();
                assert!(after.get(victim).is_none());

                for &id in ids.iter().filter(|id| **id != victim) {
                    let parent = after.get(id).unwrap().parent_id;
                    if before[&id] == Some(victim) {
                        assert_eq!(parent, grandparent);
                        assert!(removal.reparented.contains(&id));
                    } else {
                        assert_eq!(parent, before[&id]);
                    }
                    assert!(terminates_at_root(&after, id));
                }
            }
        }
    }
}
