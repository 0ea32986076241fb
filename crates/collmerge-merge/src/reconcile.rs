//! The reconciliation driver.
//!
//! One pass per configured service, strictly in configuration order. Every
//! pass reads and writes the same working tree, so a later pass observes
//! folders and items placed by earlier ones.
//!
//! Per service:
//! 1. look up the reference collection (missing ⇒ the service is skipped)
//! 2. materialize the service folder under the merge scope
//! 3. index the working scope (without `_retired`) and the reference
//! 4. merge matched endpoints, insert unmatched reference endpoints
//! 5. sweep orphans in the service folder per the retire mode

use std::collections::{BTreeMap, BTreeSet};

use collmerge_core::identity::{item_key, IdentityKey};
use collmerge_core::model::{Collection, Item, RequestItem, RETIRED_FOLDER};
use log::{debug, info, warn};

use crate::error::MergeError;
use crate::fields::{merge_request_item, FieldPolicy};
use crate::folders::{ensure_folder_path, find_folder_path, sort_alpha, split_folder_path};
use crate::options::{FolderOrder, MergeConfig, MergeOptions, RetireMode, ServiceConfig};
use crate::report::{MergeReport, ServiceReport, ServiceStatus};
use crate::walk::{
    children_at_mut, item_at, item_at_mut, EndpointIndex, IndexEntry, NodePath, ReferenceIndex,
    WalkOptions,
};

/// Reconcile `working` against one reference collection per service.
///
/// `references` is keyed by service name. Configuration problems (invalid
/// options, missing required target folder) are returned before the working
/// tree is touched; a missing reference only skips its service.
pub fn reconcile(
    working: &mut Collection,
    references: &BTreeMap<String, Collection>,
    config: &MergeConfig,
) -> Result<MergeReport, MergeError> {
    config.validate()?;

    let target = &config.collection.target_folder;
    let scope_segments = split_folder_path(target);
    let scope_path = match find_folder_path(&working.item, &scope_segments) {
        Some(p) => p,
        None if config.options.create_target_folder => {
            info!("creating target folder \"{target}\"");
            ensure_folder_path(&mut working.item, &scope_segments)
        }
        None => {
            return Err(MergeError::TargetFolderNotFound {
                path: target.clone(),
            });
        }
    };
    if scope_segments.is_empty() {
        info!("merging at collection root level");
    } else {
        info!("merging into target folder \"{target}\"");
    }

    // Endpoints live in any configured reference are never orphans, so
    // services sharing a folder do not retire each other's endpoints.
    let claimed: BTreeSet<IdentityKey> = config
        .services
        .iter()
        .filter_map(|s| references.get(&s.name))
        .flat_map(|r| {
            ReferenceIndex::build(&r.item, config.options.prefer_operation_id)
                .live
                .keys()
                .cloned()
                .collect::<Vec<_>>()
        })
        .collect();

    let scope = children_at_mut(&mut working.item, &scope_path).ok_or_else(|| {
        MergeError::TargetFolderNotFound {
            path: target.clone(),
        }
    })?;

    let mut report = MergeReport::default();
    for service in &config.services {
        let Some(reference) = references.get(&service.name) else {
            warn!(
                "service '{}': missing reference collection '{}'; skipped",
                service.name,
                service.spec_base_name()
            );
            report.absorb(ServiceReport::new(
                &service.name,
                ServiceStatus::SkippedMissingReference,
            ));
            continue;
        };

        let svc = reconcile_service(scope, reference, service, &config.options, &claimed);
        info!(
            "service '{}': updated {}, added {}, retired {}",
            svc.name, svc.updated, svc.added, svc.retired
        );
        report.absorb(svc);
    }

    if config.options.order == FolderOrder::Alpha {
        sort_alpha(&mut working.item);
    }

    Ok(report)
}

/// Run one service pass against the merge scope.
///
/// Reads and writes nodes placed by earlier passes.
pub fn reconcile_service(
    scope: &mut Vec<Item>,
    reference: &Collection,
    service: &ServiceConfig,
    options: &MergeOptions,
    claimed: &BTreeSet<IdentityKey>,
) -> ServiceReport {
    let prefer = options.prefer_operation_id;
    let retire_mode = service.retire_mode.unwrap_or(options.retire_mode);
    let policy = FieldPolicy {
        delimiter: &options.description_delimiter,
        keep_working_name: options.keep_working_item_name,
        keep_operation_marker: prefer,
    };
    let mut out = ServiceReport::new(&service.name, ServiceStatus::Merged);

    let service_segments = service.working_folder_segments();
    let service_path = ensure_folder_path(scope, &service_segments);

    let mut working_index = EndpointIndex::build(
        scope,
        WalkOptions {
            include_retired: false,
            prefer_operation_id: prefer,
        },
    );
    let reference_index = ReferenceIndex::build(&reference.item, prefer);
    // Positions merged or inserted by this pass. A merge may change the key a
    // request derives, so the sweep must not re-key these.
    let mut seen: BTreeSet<NodePath> = BTreeSet::new();

    for entry in reference_index.live.iter() {
        let Some(incoming) = item_at(&reference.item, &entry.path).and_then(Item::as_request) else {
            continue;
        };

        let matched = working_index.get(&entry.key).map(|e| e.path.clone());
        match matched {
            Some(path) => {
                if let Some(existing) = item_at_mut(scope, &path).and_then(Item::as_request_mut) {
                    merge_request_item(existing, incoming, &policy);
                    seen.insert(path);
                    out.updated += 1;
                    debug!("updated {}", entry.key);
                }
            }
            None => {
                let mut trail = service_segments.clone();
                trail.extend(entry.trail.iter().cloned());
                if let Some(path) = insert_new(scope, &trail, incoming, &options.tag_new_marker) {
                    seen.insert(path.clone());
                    working_index.insert(IndexEntry {
                        key: entry.key.clone(),
                        path,
                        trail,
                        name: incoming.name.clone(),
                        retired: false,
                    });
                    out.added += 1;
                    out.added_keys.push(entry.key.to_string());
                    debug!("added {}", entry.key);
                }
            }
        }
    }

    let Some(service_root) = children_at_mut(scope, &service_path) else {
        return out;
    };

    let is_live = |key: &IdentityKey| claimed.contains(key) || reference_index.live.contains(key);
    let sweep = Sweep {
        is_live: &is_live,
        seen: &seen,
        prefer_operation_id: prefer,
        remove: retire_mode != RetireMode::Skip,
    };
    let mut orphans = Vec::new();
    let mut at = service_path.clone();
    sweep.collect(service_root, &mut at, &mut orphans, &mut out.orphans_kept);

    if !orphans.is_empty() {
        let mut retired_keys = Vec::with_capacity(orphans.len());
        match retire_mode {
            RetireMode::Move => {
                let retired_path = ensure_folder_path(service_root, &[RETIRED_FOLDER.to_string()]);
                if let Some(retired_folder) = children_at_mut(service_root, &retired_path) {
                    for (key, item) in orphans {
                        file_retired(retired_folder, &key, item, prefer);
                        retired_keys.push(key);
                    }
                }
            }
            RetireMode::Delete => retired_keys.extend(orphans.into_iter().map(|(k, _)| k)),
            RetireMode::Skip => {}
        }

        for key in retired_keys {
            debug!("retired {key}");
            out.retired += 1;
            if reference_index.is_confirmed_retirement(&key) {
                out.confirmed_retirements.push(key.to_string());
            }
            out.retired_keys.push(key.to_string());
        }
    }

    if out.orphans_kept > 0 {
        info!(
            "service '{}': {} orphaned endpoint(s) left in place",
            service.name, out.orphans_kept
        );
    }

    out
}

/// Clone a reference endpoint into the folder mirroring its trail and return
/// its position.
fn insert_new(
    scope: &mut Vec<Item>,
    trail: &[String],
    incoming: &RequestItem,
    tag: &str,
) -> Option<NodePath> {
    let mut path = ensure_folder_path(scope, trail);
    let parent = children_at_mut(scope, &path)?;

    let mut clone = incoming.clone();
    if !tag.is_empty() {
        clone.set_status_tag(tag);
    }
    parent.push(Item::Request(clone));
    path.push(parent.len() - 1);
    Some(path)
}

/// Orphan sweep over one service folder.
struct Sweep<'a> {
    is_live: &'a dyn Fn(&IdentityKey) -> bool,
    seen: &'a BTreeSet<NodePath>,
    prefer_operation_id: bool,
    /// Take orphans out; otherwise only count them.
    remove: bool,
}

impl Sweep<'_> {
    /// Collect every request at or below `items` that this pass did not touch
    /// and whose key is not live. `at` is the scope position of `items`.
    /// `_retired` subtrees are left alone.
    fn collect(
        &self,
        items: &mut Vec<Item>,
        at: &mut NodePath,
        orphans: &mut Vec<(IdentityKey, RequestItem)>,
        kept: &mut usize,
    ) {
        let mut remaining = Vec::with_capacity(items.len());
        for (i, item) in std::mem::take(items).into_iter().enumerate() {
            at.push(i);
            match item {
                Item::Folder(mut folder) => {
                    if !folder.is_retired() {
                        self.collect(&mut folder.item, at, orphans, kept);
                    }
                    remaining.push(Item::Folder(folder));
                }
                Item::Request(req) if self.seen.contains(&*at) => remaining.push(Item::Request(req)),
                Item::Request(req) => match item_key(&req, self.prefer_operation_id) {
                    Ok(key) if !(self.is_live)(&key) => {
                        if self.remove {
                            orphans.push((key, req));
                        } else {
                            *kept += 1;
                            remaining.push(Item::Request(req));
                        }
                    }
                    _ => remaining.push(Item::Request(req)),
                },
                other => remaining.push(other),
            }
            at.pop();
        }
        *items = remaining;
    }
}

/// Put a retired request into the retirement folder, replacing an earlier
/// retired copy of the same endpoint instead of duplicating it.
fn file_retired(retired: &mut Vec<Item>, key: &IdentityKey, item: RequestItem, prefer_operation_id: bool) {
    let existing = retired.iter().position(|it| {
        it.as_request()
            .is_some_and(|r| item_key(r, prefer_operation_id).is_ok_and(|k| &k == key))
    });
    match existing {
        Some(pos) => retired[pos] = Item::Request(item),
        None => retired.push(Item::Request(item)),
    }
}
