//! Product catalogue models.

use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;

use crate::query::mapping::{
    Cardinality, Entity, Record, Relation, RelationDef, SortField, get, get_flag, push_joined,
};

/// Product record. Prices are integer amounts in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ProductImage>>,
}

impl Product {
    /// The image flagged as thumbnail, if images were loaded.
    pub fn thumbnail(&self) -> Option<&ProductImage> {
        self.images
            .as_deref()
            .and_then(|images| images.iter().find(|i| i.is_thumbnail))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

/// Product category. Categories form a tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductImage {
    pub id: i64,
    pub url: String,
    pub is_thumbnail: bool,
    pub product_id: Option<i64>,
}

/// Relations of [`Product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductRelation {
    Brand,
    Category,
    Images,
}

impl Relation for ProductRelation {
    const ALL: &'static [Self] = &[
        ProductRelation::Brand,
        ProductRelation::Category,
        ProductRelation::Images,
    ];

    fn definition(self) -> RelationDef {
        match self {
            ProductRelation::Brand => RelationDef {
                name: "brand",
                target_table: "brands",
                columns: Brand::COLUMNS,
                local_field: "brand_id",
                foreign_field: "id",
                cardinality: Cardinality::ToOne,
            },
            ProductRelation::Category => RelationDef {
                name: "category",
                target_table: "categories",
                columns: Category::COLUMNS,
                local_field: "category_id",
                foreign_field: "id",
                cardinality: Cardinality::ToOne,
            },
            ProductRelation::Images => RelationDef {
                name: "images",
                target_table: "product_images",
                columns: ProductImage::COLUMNS,
                local_field: "id",
                foreign_field: "product_id",
                cardinality: Cardinality::ToMany,
            },
        }
    }

    fn all_details() -> Vec<Self> {
        Self::ALL.to_vec()
    }
}

impl Record for Product {
    const COLUMNS: &'static [&'static str] = &["id", "name", "price", "brand_id", "category_id"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            name: get(row, prefix, "name")?,
            price: get(row, prefix, "price")?,
            brand_id: get(row, prefix, "brand_id")?,
            category_id: get(row, prefix, "category_id")?,
            brand: None,
            category: None,
            images: None,
        })
    }
}

impl Entity for Product {
    type Relation = ProductRelation;

    const NAME: &'static str = "product";
    const TABLE: &'static str = "products";
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("name", "name"),
        SortField::new("price", "price"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn attach(&mut self, relation: ProductRelation, row: &AnyRow) -> Result<(), sqlx::Error> {
        let prefix = relation.definition().prefix();
        match relation {
            ProductRelation::Brand => self.brand = Brand::from_joined_row(row, &prefix)?,
            ProductRelation::Category => self.category = Category::from_joined_row(row, &prefix)?,
            ProductRelation::Images => push_joined(&mut self.images, row, &prefix)?,
        }
        Ok(())
    }
}

impl Record for Brand {
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            name: get(row, prefix, "name")?,
        })
    }
}

impl Record for Category {
    const COLUMNS: &'static [&'static str] = &["id", "name", "parent_id"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            name: get(row, prefix, "name")?,
            parent_id: get(row, prefix, "parent_id")?,
        })
    }
}

impl Record for ProductImage {
    const COLUMNS: &'static [&'static str] = &["id", "url", "is_thumbnail", "product_id"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            url: get(row, prefix, "url")?,
            is_thumbnail: get_flag(row, prefix, "is_thumbnail")?,
            product_id: get(row, prefix, "product_id")?,
        })
    }
}
