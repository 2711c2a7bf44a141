//! Graph collection: discovers every page and collection reachable from the
//! root through tree nesting or relation properties.
//!
//! The walk is an explicit worklist:
//!
//! - `Scan` lists a container's children. Child pages and child databases
//!   are registered under the nearest enclosing entity; other blocks with
//!   children (toggles, columns, synced blocks) are scanned in turn.
//! - `Expand` reads a collection's schema and registers every collection a
//!   relation property points at, whether or not it is tree-reachable.
//!
//! Registry membership and the scanned set bound the walk on cycles.

use std::collections::{HashSet, VecDeque};

use nw_notion::types::{BlockKind, UNTITLED};
use nw_notion::{EntityId, FetchError, Fetcher};
use tracing::{debug, info};

use crate::error::{Failure, MirrorError, Stage};
use crate::registry::{EntityKind, Registry};

/// Output of the collection phase.
#[derive(Debug)]
pub struct Collected {
    pub registry: Registry,
    pub failures: Vec<Failure>,
}

enum Task {
    /// List the children of `container`, registering them under `owner`.
    Scan {
        container: EntityId,
        owner: EntityId,
    },
    /// Follow the relation properties of a collection.
    Expand(EntityId),
}

struct Walk<'a> {
    fetcher: &'a Fetcher,
    registry: Registry,
    queue: VecDeque<Task>,
    scanned: HashSet<EntityId>,
    failures: Vec<Failure>,
}

/// Collect every entity reachable from `root`.
///
/// # Errors
///
/// Returns [`MirrorError::RootUnavailable`] if the root is neither a
/// retrievable page nor a retrievable database. Every other fetch failure is
/// recorded and the walk continues.
pub fn collect(fetcher: &Fetcher, root: EntityId) -> Result<Collected, MirrorError> {
    let (kind, title) = identify_root(fetcher, root)?;
    info!("collecting from {kind:?} \"{title}\" ({root})");

    let mut walk = Walk {
        fetcher,
        registry: Registry::new(root, kind, title),
        queue: VecDeque::new(),
        scanned: HashSet::new(),
        failures: Vec::new(),
    };
    walk.enqueue(root, kind);
    walk.run();

    info!("collected {} entities", walk.registry.len());
    Ok(Collected {
        registry: walk.registry,
        failures: walk.failures,
    })
}

/// Decide whether the root is a page or a database, and read its title.
fn identify_root(fetcher: &Fetcher, root: EntityId) -> Result<(EntityKind, String), MirrorError> {
    let block_error = match fetcher.block(&root) {
        Ok(block) => match block.kind {
            BlockKind::ChildPage { title } => {
                return Ok((EntityKind::Page, title_or_untitled(&title)));
            }
            BlockKind::ChildDatabase { .. } => {
                let title = fetcher
                    .database(&root)
                    .map_or_else(|_| UNTITLED.to_owned(), |db| db.title());
                return Ok((EntityKind::Collection, title));
            }
            other => FetchError::Decode(format!("root block is not a page: {other:?}")),
        },
        Err(e) => e,
    };
    debug!("root {root} is not a block ({block_error}), trying page and database");

    if let Ok(page) = fetcher.page(&root) {
        return Ok((EntityKind::Page, page.title()));
    }
    match fetcher.database(&root) {
        Ok(db) => Ok((EntityKind::Collection, db.title())),
        Err(source) => Err(MirrorError::RootUnavailable { id: root, source }),
    }
}

fn title_or_untitled(title: &str) -> String {
    if title.trim().is_empty() {
        UNTITLED.to_owned()
    } else {
        title.to_owned()
    }
}

impl Walk<'_> {
    fn enqueue(&mut self, id: EntityId, kind: EntityKind) {
        self.queue.push_back(match kind {
            EntityKind::Page => Task::Scan {
                container: id,
                owner: id,
            },
            EntityKind::Collection => Task::Expand(id),
        });
    }

    fn run(&mut self) {
        while let Some(task) = self.queue.pop_front() {
            match task {
                Task::Scan { container, owner } => self.scan(container, owner),
                Task::Expand(collection) => self.expand(collection),
            }
        }
    }

    fn scan(&mut self, container: EntityId, owner: EntityId) {
        if !self.scanned.insert(container) {
            return;
        }
        let children = match self.fetcher.children(&container) {
            Ok(children) => children,
            Err(e) => {
                self.failures.push(Failure::new(
                    container,
                    Stage::Collect,
                    format!("cannot list children: {e}"),
                ));
                return;
            }
        };

        for child in children {
            let (kind, title) = match child.kind {
                BlockKind::ChildPage { title } => (EntityKind::Page, title),
                BlockKind::ChildDatabase { title } => (EntityKind::Collection, title),
                _ => {
                    if child.has_children {
                        self.queue.push_back(Task::Scan {
                            container: child.id,
                            owner,
                        });
                    }
                    continue;
                }
            };
            let title = title_or_untitled(&title);
            if self
                .registry
                .register(child.id, kind, title.clone(), Some(owner))
            {
                debug!("found {kind:?} \"{title}\" ({}) under {owner}", child.id);
                self.enqueue(child.id, kind);
            }
        }
    }

    fn expand(&mut self, collection: EntityId) {
        let database = match self.fetcher.database(&collection) {
            Ok(database) => database,
            Err(e) => {
                self.failures.push(Failure::new(
                    collection,
                    Stage::Collect,
                    format!("cannot read collection schema: {e}"),
                ));
                return;
            }
        };

        for related in database.related_databases() {
            if self.registry.contains(&related) {
                continue;
            }
            match self.fetcher.database(&related) {
                Ok(target) => {
                    let title = target.title();
                    debug!("found collection \"{title}\" ({related}) through {collection}");
                    self.registry
                        .register(related, EntityKind::Collection, title, None);
                    self.enqueue(related, EntityKind::Collection);
                }
                Err(e) => self.failures.push(Failure::new(
                    related,
                    Stage::Collect,
                    format!("related collection of {collection} is unavailable: {e}"),
                )),
            }
        }
    }
}
