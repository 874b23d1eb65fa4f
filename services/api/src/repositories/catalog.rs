//! Catalog repository for categories and menu items
//!
//! Menu items are owned by vendors; every vendor-side mutation is scoped by
//! ownership in the WHERE clause, so acting on someone else's item is
//! indistinguishable from acting on a missing one.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::menu::{
    MenuItem, MenuItemDetail, MenuItemWithCategory, NewMenuItem, UpdateMenuItem,
};
use crate::models::{Category, VendorSummary};

/// Catalog repository
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all categories ordered by name
    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name
            FROM categories
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Create a menu item for a vendor
    pub async fn create_menu_item(
        &self,
        vendor_id: Uuid,
        new_item: &NewMenuItem,
    ) -> ApiResult<MenuItem> {
        info!("Creating menu item '{}' for vendor {}", new_item.name, vendor_id);

        let row = sqlx::query(
            r#"
            INSERT INTO menu_items (vendor_id, category_id, name, description, price, image_url, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, vendor_id, category_id, name, description, price, image_url, available,
                      created_at, updated_at
            "#,
        )
        .bind(vendor_id)
        .bind(new_item.category_id)
        .bind(&new_item.name)
        .bind(&new_item.description)
        .bind(new_item.price)
        .bind(&new_item.image_url)
        .bind(new_item.available.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(menu_item_from_row(&row))
    }

    /// List a vendor's own menu items with categories
    pub async fn list_vendor_menu(&self, vendor_id: Uuid) -> ApiResult<Vec<MenuItemWithCategory>> {
        let rows = sqlx::query(
            r#"
            SELECT mi.id, mi.vendor_id, mi.category_id, mi.name, mi.description, mi.price,
                   mi.image_url, mi.available, mi.created_at, mi.updated_at,
                   c.name AS category_name
            FROM menu_items mi
            JOIN categories c ON c.id = mi.category_id
            WHERE mi.vendor_id = $1
            ORDER BY mi.created_at ASC, mi.id ASC
            "#,
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(menu_item_with_category_from_row).collect())
    }

    /// Find one of a vendor's own menu items
    pub async fn find_vendor_menu_item(
        &self,
        menu_id: Uuid,
        vendor_id: Uuid,
    ) -> ApiResult<Option<MenuItemWithCategory>> {
        let row = sqlx::query(
            r#"
            SELECT mi.id, mi.vendor_id, mi.category_id, mi.name, mi.description, mi.price,
                   mi.image_url, mi.available, mi.created_at, mi.updated_at,
                   c.name AS category_name
            FROM menu_items mi
            JOIN categories c ON c.id = mi.category_id
            WHERE mi.id = $1 AND mi.vendor_id = $2
            "#,
        )
        .bind(menu_id)
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(menu_item_with_category_from_row))
    }

    /// Update a vendor's own menu item; absent fields keep their values
    pub async fn update_menu_item(
        &self,
        menu_id: Uuid,
        vendor_id: Uuid,
        update: &UpdateMenuItem,
    ) -> ApiResult<Option<MenuItem>> {
        let row = sqlx::query(
            r#"
            UPDATE menu_items
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                image_url = COALESCE($6, image_url),
                available = COALESCE($7, available),
                category_id = COALESCE($8, category_id),
                updated_at = now()
            WHERE id = $1 AND vendor_id = $2
            RETURNING id, vendor_id, category_id, name, description, price, image_url, available,
                      created_at, updated_at
            "#,
        )
        .bind(menu_id)
        .bind(vendor_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price)
        .bind(&update.image_url)
        .bind(update.available)
        .bind(update.category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(menu_item_from_row))
    }

    /// Delete a vendor's own menu item; returns whether a row was removed
    pub async fn delete_menu_item(&self, menu_id: Uuid, vendor_id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM menu_items
            WHERE id = $1 AND vendor_id = $2
            "#,
        )
        .bind(menu_id)
        .bind(vendor_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List every available menu item with vendor and category, for browsing
    pub async fn list_available(&self) -> ApiResult<Vec<MenuItemDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT mi.id, mi.vendor_id, mi.category_id, mi.name, mi.description, mi.price,
                   mi.image_url, mi.available, mi.created_at, mi.updated_at,
                   c.name AS category_name,
                   v.name AS vendor_name, v.location AS vendor_location
            FROM menu_items mi
            JOIN categories c ON c.id = mi.category_id
            JOIN vendors v ON v.id = mi.vendor_id
            WHERE mi.available = TRUE
            ORDER BY mi.created_at ASC, mi.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(menu_item_detail_from_row).collect())
    }

    /// List one vendor's available menu, optionally filtered by category
    pub async fn list_vendor_available(
        &self,
        vendor_id: Uuid,
        category_id: Option<Uuid>,
    ) -> ApiResult<Vec<MenuItemWithCategory>> {
        let rows = sqlx::query(
            r#"
            SELECT mi.id, mi.vendor_id, mi.category_id, mi.name, mi.description, mi.price,
                   mi.image_url, mi.available, mi.created_at, mi.updated_at,
                   c.name AS category_name
            FROM menu_items mi
            JOIN categories c ON c.id = mi.category_id
            WHERE mi.vendor_id = $1
              AND mi.available = TRUE
              AND ($2::uuid IS NULL OR mi.category_id = $2)
            ORDER BY mi.created_at ASC, mi.id ASC
            "#,
        )
        .bind(vendor_id)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(menu_item_with_category_from_row).collect())
    }

    /// Find one available menu item with vendor and category
    pub async fn find_available(&self, menu_id: Uuid) -> ApiResult<Option<MenuItemDetail>> {
        let row = sqlx::query(
            r#"
            SELECT mi.id, mi.vendor_id, mi.category_id, mi.name, mi.description, mi.price,
                   mi.image_url, mi.available, mi.created_at, mi.updated_at,
                   c.name AS category_name,
                   v.name AS vendor_name, v.location AS vendor_location
            FROM menu_items mi
            JOIN categories c ON c.id = mi.category_id
            JOIN vendors v ON v.id = mi.vendor_id
            WHERE mi.id = $1 AND mi.available = TRUE
            "#,
        )
        .bind(menu_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(menu_item_detail_from_row))
    }
}

/// Build a MenuItem from a row carrying the menu_items columns
pub(crate) fn menu_item_from_row(row: &PgRow) -> MenuItem {
    MenuItem {
        id: row.get("id"),
        vendor_id: row.get("vendor_id"),
        category_id: row.get("category_id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        image_url: row.get("image_url"),
        available: row.get("available"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn menu_item_with_category_from_row(row: &PgRow) -> MenuItemWithCategory {
    let item = menu_item_from_row(row);
    let category = Category {
        id: item.category_id,
        name: row.get("category_name"),
    };

    MenuItemWithCategory { item, category }
}

fn menu_item_detail_from_row(row: &PgRow) -> MenuItemDetail {
    let item = menu_item_from_row(row);
    let category = Category {
        id: item.category_id,
        name: row.get("category_name"),
    };
    let vendor = VendorSummary {
        id: item.vendor_id,
        name: row.get("vendor_name"),
        location: row.get("vendor_location"),
    };

    MenuItemDetail {
        item,
        category,
        vendor,
    }
}
