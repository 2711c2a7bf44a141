//! Output paths.
//!
//! Every entity gets a location built from the slugs of its tree ancestors,
//! root excluded:
//!
//! - page: `<location>/index.md` (the root page lives at `<slug>/index.md`)
//! - collection: `<location>.md`
//! - row with content: `<collection location>/<row slug>.md`
//!
//! Entities without a tree parent are placed at the top level. Slugs are
//! claimed per directory in a deterministic order (shallow entities first,
//! then discovery order, then query order for rows); a slug already claimed
//! in the same directory gets a `-2`, `-3`, ... suffix. A page reserves
//! `index` in its own directory, so children never land on its document.

use std::collections::{HashMap, HashSet};

use nw_notion::EntityId;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::materialize::Materialized;
use crate::registry::{EntityKind, Registry};

/// Extension of every generated document.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Slug used for titles without any letters or digits.
const EMPTY_SLUG: &str = "untitled";

/// File stem of a page's own document inside its directory.
const PAGE_DOCUMENT_STEM: &str = "index";

/// Convert a title to a filesystem-safe slug.
///
/// Letters are folded to ASCII (accents dropped) and lowercased; every run of
/// other characters becomes a single dash. Apostrophes are dropped so that
/// "Team's" becomes `teams`.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut result = String::new();
    let mut pending_dash = false;

    for c in title.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.push(c.to_ascii_lowercase());
        } else if c != '\'' && c != '\u{2019}' {
            pending_dash = true;
        }
    }

    if result.is_empty() {
        EMPTY_SLUG.to_owned()
    } else {
        result
    }
}

/// Compute a relative path from one document to another.
///
/// Both paths are relative to the output root. The last segment of `from` is
/// the document itself, so links are resolved against its directory.
///
/// ```
/// use nw_mirror::relative_path;
///
/// assert_eq!(relative_path("c/alpha.md", "c.md"), "../c.md");
/// assert_eq!(relative_path("c.md", "c/alpha.md"), "c/alpha.md");
/// assert_eq!(relative_path("home/index.md", "guide/index.md"), "../guide/index.md");
/// ```
#[must_use]
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();
    let from_dir = &from_segs[..from_segs.len().saturating_sub(1)];

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = "../".repeat(from_dir.len() - common);
    result.push_str(&to_segs[common..].join("/"));
    result
}

/// Directory namespaces with the slugs already claimed in each.
#[derive(Default)]
struct Claims(HashMap<String, HashSet<String>>);

impl Claims {
    fn claim(&mut self, dir: &str, slug: String) -> String {
        let taken = self.0.entry(dir.to_owned()).or_default();
        let mut candidate = slug.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{slug}-{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        candidate
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

/// Output document of every entity and of every row with content.
#[derive(Debug, Clone, Default)]
pub struct PathTable {
    entities: HashMap<EntityId, String>,
    rows: HashMap<EntityId, String>,
    /// Collection table for every row, with or without content.
    row_tables: HashMap<EntityId, EntityId>,
}

impl PathTable {
    /// Compute every output path.
    #[must_use]
    pub fn build(registry: &Registry, materialized: &Materialized) -> Self {
        let root = registry.root();
        let mut claims = Claims::default();
        let mut locations: HashMap<EntityId, String> = HashMap::new();
        let mut table = Self::default();

        for id in claim_order(registry) {
            let Some(entity) = registry.get(&id) else {
                continue;
            };
            // The root's children share the top level with the root itself.
            let dir = match entity.tree_parent {
                Some(parent) if parent != root => {
                    locations.get(&parent).cloned().unwrap_or_default()
                }
                _ => String::new(),
            };
            let slug = claims.claim(&dir, slugify(&entity.title));
            let location = join(&dir, &slug);

            let document = match entity.kind {
                EntityKind::Page => {
                    claims.claim(&location, PAGE_DOCUMENT_STEM.to_owned());
                    format!("{location}/{PAGE_DOCUMENT_STEM}.{DOCUMENT_EXTENSION}")
                }
                EntityKind::Collection => format!("{location}.{DOCUMENT_EXTENSION}"),
            };
            table.entities.insert(id, document);
            locations.insert(id, location);
        }

        // Rows: after every entity has its location.
        for entity in registry.entities() {
            if entity.kind != EntityKind::Collection {
                continue;
            }
            let Some(location) = locations.get(&entity.id) else {
                continue;
            };
            for row in materialized.collection_rows(&entity.id) {
                table.row_tables.insert(row.id, entity.id);
                if row.has_content() {
                    let slug = claims.claim(location, slugify(&row.title));
                    table.rows.insert(
                        row.id,
                        format!("{}.{DOCUMENT_EXTENSION}", join(location, &slug)),
                    );
                }
            }
        }

        table
    }

    /// Document of a registered entity.
    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&str> {
        self.entities.get(id).map(String::as_str)
    }

    /// Document of a row with content.
    #[must_use]
    pub fn row(&self, id: &EntityId) -> Option<&str> {
        self.rows.get(id).map(String::as_str)
    }

    /// Where a link to `id` should point: the entity's document, the row's
    /// document, or for a row without content its collection's table.
    #[must_use]
    pub fn link_target(&self, id: &EntityId) -> Option<&str> {
        self.entity(id).or_else(|| self.row(id)).or_else(|| {
            self.row_tables
                .get(id)
                .and_then(|collection| self.entity(collection))
        })
    }

    /// Every linkable id with its target document.
    pub fn link_targets(&self) -> impl Iterator<Item = (&EntityId, &str)> {
        self.entities
            .keys()
            .chain(self.row_tables.keys())
            .filter_map(|id| self.link_target(id).map(|target| (id, target)))
    }
}

/// Entities ordered by tree depth, then discovery order.
///
/// Parents always precede their children, so a child's directory is known
/// when it claims its slug.
fn claim_order(registry: &Registry) -> Vec<EntityId> {
    let limit = registry.len();
    let mut ordered: Vec<(usize, usize, EntityId)> = registry
        .entities()
        .iter()
        .enumerate()
        .map(|(position, entity)| {
            let mut depth = 0;
            let mut current = entity.tree_parent;
            while let Some(parent) = current {
                if parent == registry.root() || depth > limit {
                    break;
                }
                depth += 1;
                current = registry.get(&parent).and_then(|p| p.tree_parent);
            }
            (depth, position, entity.id)
        })
        .collect();
    ordered.sort_unstable_by_key(|&(depth, position, _)| (depth, position));
    ordered.into_iter().map(|(_, _, id)| id).collect()
}
