//! Depth-first traversal and the endpoint index built from it.

use std::collections::{BTreeMap, BTreeSet};

use collmerge_core::identity::{item_key, IdentityKey};
use collmerge_core::model::{Item, RequestItem};
use log::debug;

/// Child positions from a scope root down to a node.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: IdentityKey,
    /// Position of the request relative to the walked root.
    pub path: NodePath,
    /// Ancestor folder names, outermost first (the walked root excluded).
    pub trail: Vec<String>,
    pub name: String,
    /// The request sits somewhere under a `_retired` folder.
    pub retired: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Descend into `_retired` folders.
    pub include_retired: bool,
    pub prefer_operation_id: bool,
}

/// Visit every request under `root` in depth-first, child order.
///
/// The callback receives the request, its position path, its folder trail and
/// whether it is inside a retirement subtree. Opaque leaves are skipped.
pub fn walk_requests<'a, F>(root: &'a [Item], include_retired: bool, mut f: F)
where
    F: FnMut(&'a RequestItem, &[usize], &[String], bool),
{
    let mut path = Vec::new();
    let mut trail = Vec::new();
    walk_inner(root, include_retired, false, &mut path, &mut trail, &mut f);
}

fn walk_inner<'a, F>(
    items: &'a [Item],
    include_retired: bool,
    in_retired: bool,
    path: &mut Vec<usize>,
    trail: &mut Vec<String>,
    f: &mut F,
) where
    F: FnMut(&'a RequestItem, &[usize], &[String], bool),
{
    for (i, item) in items.iter().enumerate() {
        path.push(i);
        match item {
            Item::Folder(folder) => {
                let retired = in_retired || folder.is_retired();
                if include_retired || !retired {
                    trail.push(folder.name.clone());
                    walk_inner(&folder.item, include_retired, retired, path, trail, f);
                    trail.pop();
                }
            }
            Item::Request(req) => f(req, path.as_slice(), trail.as_slice(), in_retired),
            Item::Opaque(_) => {}
        }
        path.pop();
    }
}

/// Identity key → request location, with DFS iteration order.
///
/// Duplicate keys resolve last-write-wins for lookups; every entry stays in
/// iteration order.
#[derive(Debug, Clone, Default)]
pub struct EndpointIndex {
    entries: Vec<IndexEntry>,
    by_key: BTreeMap<IdentityKey, usize>,
}

impl EndpointIndex {
    pub fn build(root: &[Item], opts: WalkOptions) -> Self {
        let mut index = Self::default();
        walk_requests(root, opts.include_retired, |req, path, trail, retired| {
            match item_key(req, opts.prefer_operation_id) {
                Ok(key) => index.insert(IndexEntry {
                    key,
                    path: path.to_vec(),
                    trail: trail.to_vec(),
                    name: req.name.clone(),
                    retired,
                }),
                Err(e) => debug!("not indexing '{}': {e}", req.name),
            }
        });
        index
    }

    pub fn insert(&mut self, entry: IndexEntry) {
        self.by_key.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&IndexEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// All entries in traversal order, shadowed duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.by_key.keys()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// A reference collection split into live endpoints and the endpoints it
/// itself files under `_retired`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    pub live: EndpointIndex,
    pub retired: BTreeSet<IdentityKey>,
}

impl ReferenceIndex {
    pub fn build(root: &[Item], prefer_operation_id: bool) -> Self {
        let all = EndpointIndex::build(
            root,
            WalkOptions {
                include_retired: true,
                prefer_operation_id,
            },
        );

        let mut out = Self::default();
        for entry in all.entries {
            if entry.retired {
                out.retired.insert(entry.key);
            } else {
                out.live.insert(entry);
            }
        }
        out
    }

    /// Retired in the reference and not live anywhere in it.
    pub fn is_confirmed_retirement(&self, key: &IdentityKey) -> bool {
        self.retired.contains(key) && !self.live.contains(key)
    }
}

pub fn item_at<'a>(root: &'a [Item], path: &[usize]) -> Option<&'a Item> {
    let (last, parents) = path.split_last()?;
    children_at(root, parents)?.get(*last)
}

pub fn item_at_mut<'a>(root: &'a mut Vec<Item>, path: &[usize]) -> Option<&'a mut Item> {
    let (last, parents) = path.split_last()?;
    children_at_mut(root, parents)?.get_mut(*last)
}

/// Children of the folder at `path`; the root itself for an empty path.
pub fn children_at<'a>(root: &'a [Item], path: &[usize]) -> Option<&'a [Item]> {
    let mut cur = root;
    for &i in path {
        cur = match cur.get(i) {
            Some(Item::Folder(f)) => f.item.as_slice(),
            _ => return None,
        };
    }
    Some(cur)
}

pub fn children_at_mut<'a>(root: &'a mut Vec<Item>, path: &[usize]) -> Option<&'a mut Vec<Item>> {
    let mut cur = root;
    for &i in path {
        cur = match cur.get_mut(i) {
            Some(Item::Folder(f)) => &mut f.item,
            _ => return None,
        };
    }
    Some(cur)
}
