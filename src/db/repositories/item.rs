use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use std::collections::HashMap;
use tracing::warn;

use crate::db::now_timestamp;
use crate::domain::{ItemId, ItemStatus, Money, UserId};
use crate::entities::items;

/// An item as stored, with typed columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub status: ItemStatus,
    pub image: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<items::Model> for Item {
    fn from(model: items::Model) -> Self {
        let status = model.status.parse().unwrap_or_else(|e| {
            warn!(item_id = model.id, error = %e, "Stored item has unknown status");
            ItemStatus::Pending
        });

        Self {
            id: ItemId::new(model.id),
            user_id: UserId::new(model.user_id),
            title: model.title,
            description: model.description,
            amount: Money::from_minor_units(model.amount_minor),
            status,
            image: model.image,
            customer_email: model.customer_email,
            customer_name: model.customer_name,
            customer_address: model.customer_address,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Complete set of mutable fields for a new item.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub status: ItemStatus,
    pub image: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
}

/// Replacement values for an existing item. Outer `None` keeps the stored
/// value, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: String,
    pub amount: Money,
    pub status: Option<ItemStatus>,
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub customer_email: Option<Option<String>>,
    pub customer_name: Option<Option<String>>,
    pub customer_address: Option<Option<String>>,
}

impl ItemPatch {
    /// The row `item` becomes once this patch is written at `updated_at`.
    #[must_use]
    pub fn apply(self, item: Item, updated_at: String) -> Item {
        Item {
            title: self.title,
            amount: self.amount,
            status: self.status.unwrap_or(item.status),
            description: self.description.unwrap_or(item.description),
            image: self.image.unwrap_or(item.image),
            customer_email: self.customer_email.unwrap_or(item.customer_email),
            customer_name: self.customer_name.unwrap_or(item.customer_name),
            customer_address: self.customer_address.unwrap_or(item.customer_address),
            updated_at,
            ..item
        }
    }
}

pub struct ItemRepository {
    conn: DatabaseConnection,
}

impl ItemRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, owner: UserId, fields: ItemFields) -> Result<Item> {
        let now = now_timestamp();

        let active = items::ActiveModel {
            user_id: Set(owner.value()),
            title: Set(fields.title),
            description: Set(fields.description),
            amount_minor: Set(fields.amount.minor_units()),
            status: Set(fields.status.as_str().to_string()),
            image: Set(fields.image),
            customer_email: Set(fields.customer_email),
            customer_name: Set(fields.customer_name),
            customer_address: Set(fields.customer_address),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert item")?;

        Ok(Item::from(model))
    }

    /// Newest first
    pub async fn list_for_user(&self, owner: UserId) -> Result<Vec<Item>> {
        let rows = items::Entity::find()
            .filter(items::Column::UserId.eq(owner.value()))
            .order_by_desc(items::Column::CreatedAt)
            .order_by_desc(items::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list items")?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn get_for_user(&self, id: ItemId, owner: UserId) -> Result<Option<Item>> {
        let row = items::Entity::find()
            .filter(items::Column::Id.eq(id.value()))
            .filter(items::Column::UserId.eq(owner.value()))
            .one(&self.conn)
            .await
            .context("Failed to query item")?;

        Ok(row.map(Item::from))
    }

    /// Single write scoped by `(current.id, current.user_id)`. Returns the
    /// updated row, or `None` when it no longer exists.
    pub async fn update_for_user(&self, current: Item, patch: ItemPatch) -> Result<Option<Item>> {
        let updated_at = now_timestamp();

        let mut update = items::Entity::update_many()
            .col_expr(items::Column::Title, Expr::value(patch.title.clone()))
            .col_expr(
                items::Column::AmountMinor,
                Expr::value(patch.amount.minor_units()),
            )
            .col_expr(items::Column::UpdatedAt, Expr::value(updated_at.clone()));

        if let Some(status) = patch.status {
            update = update.col_expr(items::Column::Status, Expr::value(status.as_str()));
        }

        let optional = [
            (items::Column::Description, &patch.description),
            (items::Column::Image, &patch.image),
            (items::Column::CustomerEmail, &patch.customer_email),
            (items::Column::CustomerName, &patch.customer_name),
            (items::Column::CustomerAddress, &patch.customer_address),
        ];
        for (column, value) in optional {
            if let Some(value) = value {
                update = update.col_expr(column, Expr::value(value.clone()));
            }
        }

        let result = update
            .filter(items::Column::Id.eq(current.id.value()))
            .filter(items::Column::UserId.eq(current.user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update item")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Ok(Some(patch.apply(current, updated_at)))
    }

    /// Scoped hard delete. Returns `false` when no row matched `(id, owner)`.
    pub async fn delete_for_user(&self, id: ItemId, owner: UserId) -> Result<bool> {
        let result = items::Entity::delete_many()
            .filter(items::Column::Id.eq(id.value()))
            .filter(items::Column::UserId.eq(owner.value()))
            .exec(&self.conn)
            .await
            .context("Failed to delete item")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_for_user(&self, owner: UserId) -> Result<u64> {
        items::Entity::find()
            .filter(items::Column::UserId.eq(owner.value()))
            .count(&self.conn)
            .await
            .context("Failed to count items")
    }

    /// Sum of the owner's item amounts, saturating at the largest `Money`.
    pub async fn revenue_for_user(&self, owner: UserId) -> Result<Money> {
        let amounts: Vec<i64> = items::Entity::find()
            .select_only()
            .column(items::Column::AmountMinor)
            .filter(items::Column::UserId.eq(owner.value()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query item amounts")?;

        Ok(amounts.into_iter().map(Money::from_minor_units).sum())
    }

    /// Titles of the caller's items among `ids`. Missing ids are absent.
    pub async fn titles_for_user(
        &self,
        owner: UserId,
        ids: &[i32],
    ) -> Result<HashMap<i32, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, String)> = items::Entity::find()
            .select_only()
            .column(items::Column::Id)
            .column(items::Column::Title)
            .filter(items::Column::UserId.eq(owner.value()))
            .filter(items::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query item titles")?;

        Ok(rows.into_iter().collect())
    }
}
