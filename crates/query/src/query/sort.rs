//! Sort resolution against per-entity allow-lists.
//!
//! Caller strings never reach the SQL text: a sort key is only ever turned
//! into one of the `&'static str` columns listed in [`Entity::SORT_FIELDS`].

use sea_query::Order;
use serde::Serialize;

use super::mapping::Entity;
use super::types::SortSpec;

/// Primary key column every entity sorts by when nothing else applies.
pub const ID_COLUMN: &str = "id";

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse; anything other than `desc` is ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn order(self) -> Order {
        match self {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// A sort key resolved to a whitelisted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl ResolvedSort {
    /// `id ASC`.
    pub fn by_id() -> Self {
        Self {
            column: ID_COLUMN,
            direction: SortDirection::Asc,
        }
    }

    /// ORDER BY terms on the base table: the sort itself, then `id ASC` as a
    /// tie-break unless the sort is already on `id`.
    pub fn terms(&self) -> Vec<(&'static str, Order)> {
        let mut terms = vec![(self.column, self.direction.order())];
        if self.column != ID_COLUMN {
            terms.push((ID_COLUMN, Order::Asc));
        }
        terms
    }
}

/// Resolve a caller's sort request for entity `E`.
///
/// `sort_by` may be the field's API name (`orderDate`) or its column
/// (`order_date`). Empty, absent or unknown fields fall back to `id ASC`
/// regardless of the requested direction.
pub fn resolve<E: Entity>(spec: &SortSpec) -> ResolvedSort {
    let requested = spec
        .sort_by
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let Some(requested) = requested else {
        return ResolvedSort::by_id();
    };

    match E::SORT_FIELDS
        .iter()
        .find(|f| f.name == requested || f.column == requested)
    {
        Some(field) => ResolvedSort {
            column: field.column,
            direction: SortDirection::parse(spec.sort_direction.as_deref()),
        },
        None => {
            tracing::debug!(entity = E::NAME, sort_by = requested, "unknown sort field, using id");
            ResolvedSort::by_id()
        }
    }
}
