//! Nesting of flat, slash-named top-level folders.
//!
//! Some generators emit one top-level folder per resource path, named like
//! `sites/{site Id}/views`. This pass turns each of them into a nested chain
//! of folders, merging chains that share a prefix.

use once_cell::sync::Lazy;
use regex::Regex;

use collmerge_core::model::{Collection, Folder, Item};
use log::debug;

use crate::folders::ensure_folder_path;
use crate::walk::item_at_mut;

static BRACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"));

/// `{site Id}` → `{siteId}`; whitespace outside braces is kept.
pub fn clean_segment(segment: &str) -> String {
    BRACED
        .replace_all(segment.trim(), |caps: &regex::Captures<'_>| {
            caps[0].chars().filter(|c| !c.is_whitespace()).collect::<String>()
        })
        .into_owned()
}

/// Nest every top-level folder whose name contains `/`. Returns how many
/// folders were restructured.
///
/// Unaffected top-level items keep their relative order and come first; the
/// nested chains follow in first-seen order.
pub fn nest_flat_folders(collection: &mut Collection) -> usize {
    let (flat, kept): (Vec<Item>, Vec<Item>) = std::mem::take(&mut collection.item)
        .into_iter()
        .partition(|it| matches!(it, Item::Folder(f) if f.name.contains('/')));

    collection.item = kept;
    let mut nested: Vec<Item> = Vec::new();
    let mut count = 0;

    for item in flat {
        let Item::Folder(folder) = item else {
            continue;
        };
        let segments: Vec<String> = folder
            .name
            .split('/')
            .map(clean_segment)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            collection.item.push(Item::Folder(folder));
            continue;
        }
        debug!("nesting '{}' as {}", folder.name, segments.join(" > "));

        let path = ensure_folder_path(&mut nested, &segments);
        if let Some(Item::Folder(leaf)) = item_at_mut(&mut nested, &path) {
            absorb_leaf(leaf, folder);
            count += 1;
        }
    }

    collection.item.extend(nested);
    count
}

/// Move the flat folder's content into its nested leaf. The leaf's own
/// description, auth and events win when already set.
fn absorb_leaf(leaf: &mut Folder, flat: Folder) {
    // Leaf content first, nested subfolders after.
    let (subfolders, mut content): (Vec<Item>, Vec<Item>) = std::mem::take(&mut leaf.item)
        .into_iter()
        .partition(|it| matches!(it, Item::Folder(_)));
    content.extend(flat.item);
    content.extend(subfolders);
    leaf.item = content;

    if leaf.description.is_none() {
        leaf.description = flat.description;
    }
    if leaf.auth.is_none() {
        leaf.auth = flat.auth;
    }
    if leaf.event.is_none() {
        leaf.event = flat.event;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_whitespace_inside_braces_only() {
        assert_eq!(clean_segment(" {site Id} "), "{siteId}");
        assert_eq!(clean_segment("custom views"), "custom views");
    }
}
