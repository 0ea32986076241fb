//! Folder lookup, on-demand creation and ordering.
//!
//! Sibling folder names are treated as unique within one parent: lookup takes
//! the first folder child whose name is exactly equal to the segment.

use collmerge_core::model::{Folder, Item};

use crate::walk::NodePath;

/// `"A / B//C"` → `["A", "B", "C"]`.
pub fn split_folder_path(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn folder_position(items: &[Item], name: &str) -> Option<usize> {
    items
        .iter()
        .position(|it| matches!(it, Item::Folder(f) if f.name == name))
}

/// Resolve a folder path without creating anything.
pub fn find_folder_path(root: &[Item], segments: &[String]) -> Option<NodePath> {
    let mut positions = Vec::new();
    let mut cur = root;
    for seg in segments.iter().filter(|s| !s.trim().is_empty()) {
        let pos = folder_position(cur, seg)?;
        positions.push(pos);
        cur = match &cur[pos] {
            Item::Folder(f) => f.item.as_slice(),
            _ => return None,
        };
    }
    Some(positions)
}

/// Resolve a folder path, appending any missing folder (with an empty child
/// list) as the last child of its parent. Returns the positions walked.
///
/// Idempotent: a second call with the same segments creates nothing and
/// returns the same positions.
pub fn ensure_folder_path(root: &mut Vec<Item>, segments: &[String]) -> NodePath {
    let mut positions = Vec::new();
    let mut cur = root;
    for seg in segments.iter().filter(|s| !s.trim().is_empty()) {
        let pos = match folder_position(cur.as_slice(), seg) {
            Some(p) => p,
            None => {
                cur.push(Item::Folder(Folder::new(seg.clone())));
                cur.len() - 1
            }
        };
        positions.push(pos);
        cur = match cur.get_mut(pos) {
            Some(Item::Folder(f)) => &mut f.item,
            _ => break,
        };
    }
    positions
}

/// Recursively sort every folder's children by name (case-sensitive, stable).
pub fn sort_alpha(items: &mut [Item]) {
    items.sort_by(|a, b| a.name().cmp(b.name()));
    for item in items.iter_mut() {
        if let Item::Folder(f) = item {
            sort_alpha(&mut f.item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(s: &[&str]) -> Vec<String> {
        s.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn ensure_creates_once() {
        let mut root = Vec::new();
        let a = ensure_folder_path(&mut root, &segs(&["A", "B"]));
        let b = ensure_folder_path(&mut root, &segs(&["A", "", "B"]));
        assert_eq!(a, vec![0, 0]);
        assert_eq!(a, b);
        assert_eq!(root.len(), 1);
        assert_eq!(find_folder_path(&root, &segs(&["A", "B"])), Some(vec![0, 0]));
        assert_eq!(find_folder_path(&root, &segs(&["A", "C"])), None);
    }

    #[test]
    fn empty_path_is_root() {
        let mut root = vec![Item::Folder(Folder::new("X"))];
        assert!(ensure_folder_path(&mut root, &[]).is_empty());
        assert_eq!(root.len(), 1);
    }
}
