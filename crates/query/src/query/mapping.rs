//! Entity-to-schema mapping.
//!
//! Models describe their table, columns, sortable fields and relations through
//! these traits; the builder, loader and executor are generic over them.

use std::fmt::Debug;

use sqlx::any::AnyRow;
use sqlx::{Any, Row};

/// Separator between a relation name and a column in joined column aliases
/// (`user__id`, `items__quantity`).
pub const ALIAS_SEPARATOR: &str = "__";

/// Name of a possibly-prefixed column in a result row.
pub fn column_name(prefix: &str, column: &str) -> String {
    format!("{prefix}{column}")
}

/// Column prefix used for a relation's joined columns.
pub fn relation_prefix(relation: &str) -> String {
    format!("{relation}{ALIAS_SEPARATOR}")
}

/// Read a possibly-prefixed column.
pub fn get<'r, T>(row: &'r AnyRow, prefix: &str, column: &str) -> Result<T, sqlx::Error>
where
    T: sqlx::Decode<'r, Any> + sqlx::Type<Any>,
{
    row.try_get(column_name(prefix, column).as_str())
}

/// Read a 0/1 flag column.
pub fn get_flag(row: &AnyRow, prefix: &str, column: &str) -> Result<bool, sqlx::Error> {
    let value: i64 = get(row, prefix, column)?;
    Ok(value != 0)
}

/// A row shape that can be decoded from a (possibly joined) result row.
pub trait Record: Sized {
    /// Columns selected for this record, in table order.
    const COLUMNS: &'static [&'static str];

    /// Decode from a row whose columns carry `prefix`.
    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error>;

    /// Decode from the nullable side of a left join; `None` when no row matched.
    fn from_joined_row(row: &AnyRow, prefix: &str) -> Result<Option<Self>, sqlx::Error> {
        let id: Option<i64> = get(row, prefix, "id")?;
        match id {
            Some(_) => Self::from_row(row, prefix).map(Some),
            None => Ok(None),
        }
    }
}

/// Whether a relation yields at most one row or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// Join path for a relation.
///
/// The join condition is `base.local_field = relation.foreign_field`, with the
/// relation name used as the joined table's alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    /// Relation name (used as table alias and column prefix).
    pub name: &'static str,

    /// Target table to join.
    pub target_table: &'static str,

    /// Columns of the target record to select.
    pub columns: &'static [&'static str],

    /// Column on the base table.
    pub local_field: &'static str,

    /// Column on the target table.
    pub foreign_field: &'static str,

    pub cardinality: Cardinality,
}

impl RelationDef {
    pub fn is_to_many(&self) -> bool {
        self.cardinality == Cardinality::ToMany
    }

    /// Prefix carried by this relation's columns in result rows.
    pub fn prefix(&self) -> String {
        relation_prefix(self.name)
    }
}

/// A named relation of an entity that can be eagerly loaded.
pub trait Relation: Copy + Eq + Ord + Debug + Send + Sync + 'static {
    /// Every relation of the entity.
    const ALL: &'static [Self];

    /// Join path and cardinality.
    fn definition(self) -> RelationDef;

    /// The "load all details" set: every to-one relation plus the one
    /// collection that may be joined alongside them.
    fn all_details() -> Vec<Self>;

    fn name(self) -> &'static str {
        self.definition().name
    }

    /// Look a relation up by name (case-insensitive).
    fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// A whitelisted sort key: the caller-facing name and the column it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

impl SortField {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }
}

/// A root entity the composer can search, sort, page and eager-load.
pub trait Entity: Record + Send {
    type Relation: Relation;

    /// Human-readable entity name for errors and logs.
    const NAME: &'static str;

    /// Base table.
    const TABLE: &'static str;

    /// Sort allow-list. Must include the primary key.
    const SORT_FIELDS: &'static [SortField];

    fn id(&self) -> i64;

    /// Populate `relation` from the joined columns of `row`.
    ///
    /// Called once per result row: to-one relations are simply (re)assigned,
    /// to-many relations append the child when present and otherwise leave an
    /// empty, loaded collection.
    fn attach(&mut self, relation: Self::Relation, row: &AnyRow) -> Result<(), sqlx::Error>;
}

/// Append the child carried by `row` to a lazily-initialised collection.
pub fn push_joined<T: Record>(
    collection: &mut Option<Vec<T>>,
    row: &AnyRow,
    prefix: &str,
) -> Result<(), sqlx::Error> {
    let children = collection.get_or_insert_with(Vec::new);
    if let Some(child) = T::from_joined_row(row, prefix)? {
        children.push(child);
    }
    Ok(())
}
