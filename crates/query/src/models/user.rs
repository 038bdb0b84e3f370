//! User model with its profile and addresses.

use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;

use crate::query::mapping::{
    Cardinality, Entity, Record, Relation, RelationDef, SortField, get, get_flag, push_joined,
};

use super::order::Order;

/// User record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,

    /// Eagerly loaded profile (`None` when not requested or absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,

    /// Eagerly loaded addresses (`None` when not requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<Address>>,

    /// Orders placed by this user. Not owned; only loaded on request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<Order>>,
}

impl User {
    /// The address flagged as default, if addresses were loaded.
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses
            .as_deref()
            .and_then(|addresses| addresses.iter().find(|a| a.is_default))
    }
}

/// Optional per-user profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub nickname: Option<String>,
    pub gender: Option<String>,
    pub user_id: Option<i64>,
}

/// Postal address owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub id: i64,
    pub zipcode: Option<String>,
    pub detail: Option<String>,

    /// Default shipping address flag.
    pub is_default: bool,

    pub user_id: Option<i64>,
}

/// Relations of [`User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRelation {
    Profile,
    Addresses,
    Orders,
}

impl Relation for UserRelation {
    const ALL: &'static [Self] = &[
        UserRelation::Profile,
        UserRelation::Addresses,
        UserRelation::Orders,
    ];

    fn definition(self) -> RelationDef {
        match self {
            UserRelation::Profile => RelationDef {
                name: "profile",
                target_table: "user_profiles",
                columns: UserProfile::COLUMNS,
                local_field: "id",
                foreign_field: "user_id",
                cardinality: Cardinality::ToOne,
            },
            UserRelation::Addresses => RelationDef {
                name: "addresses",
                target_table: "addresses",
                columns: Address::COLUMNS,
                local_field: "id",
                foreign_field: "user_id",
                cardinality: Cardinality::ToMany,
            },
            UserRelation::Orders => RelationDef {
                name: "orders",
                target_table: "orders",
                columns: Order::COLUMNS,
                local_field: "id",
                foreign_field: "user_id",
                cardinality: Cardinality::ToMany,
            },
        }
    }

    fn all_details() -> Vec<Self> {
        vec![UserRelation::Profile, UserRelation::Addresses]
    }
}

impl Record for User {
    const COLUMNS: &'static [&'static str] = &["id", "username", "email"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            username: get(row, prefix, "username")?,
            email: get(row, prefix, "email")?,
            profile: None,
            addresses: None,
            orders: None,
        })
    }
}

impl Entity for User {
    type Relation = UserRelation;

    const NAME: &'static str = "user";
    const TABLE: &'static str = "users";
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("username", "username"),
        SortField::new("email", "email"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn attach(&mut self, relation: UserRelation, row: &AnyRow) -> Result<(), sqlx::Error> {
        let prefix = relation.definition().prefix();
        match relation {
            UserRelation::Profile => self.profile = UserProfile::from_joined_row(row, &prefix)?,
            UserRelation::Addresses => push_joined(&mut self.addresses, row, &prefix)?,
            UserRelation::Orders => push_joined(&mut self.orders, row, &prefix)?,
        }
        Ok(())
    }
}

impl Record for UserProfile {
    const COLUMNS: &'static [&'static str] = &["id", "nickname", "gender", "user_id"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            nickname: get(row, prefix, "nickname")?,
            gender: get(row, prefix, "gender")?,
            user_id: get(row, prefix, "user_id")?,
        })
    }
}

impl Record for Address {
    const COLUMNS: &'static [&'static str] = &["id", "zipcode", "detail", "is_default", "user_id"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            zipcode: get(row, prefix, "zipcode")?,
            detail: get(row, prefix, "detail")?,
            is_default: get_flag(row, prefix, "is_default")?,
            user_id: get(row, prefix, "user_id")?,
        })
    }
}
