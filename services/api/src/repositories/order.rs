//! Order repository: the stateful core of the system
//!
//! Order creation resolves every requested menu item, snapshots unit prices,
//! and writes the order and all of its lines inside one transaction; a
//! failure at any point leaves zero rows behind. Retrieval is always scoped
//! by ownership in the WHERE clause, so another party's order is
//! indistinguishable from a missing one.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::order::{
    CreateOrderRequest, CreatedOrder, Order, OrderDetail, OrderItem, OrderItemWithMenu,
    OrderStatus, OrderTracking, PricedOrderLine, order_total,
};
use crate::models::{Role, StudentPublic, VendorPublic};

/// Order repository
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with all of its lines in one transaction
    ///
    /// Every menu item is resolved before anything is written; an
    /// unresolvable item aborts the whole operation with `NotFound` and no
    /// rows persisted. Each line snapshots the menu item's price at this
    /// instant.
    pub async fn create_order(
        &self,
        student_id: Uuid,
        request: &CreateOrderRequest,
    ) -> ApiResult<CreatedOrder> {
        let mut tx = self.pool.begin().await?;

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let row = sqlx::query(
                r#"
                SELECT price
                FROM menu_items
                WHERE id = $1
                "#,
            )
            .bind(item.menu_item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Menu item not found".to_string()))?;

            lines.push(PricedOrderLine {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                unit_price: row.get("price"),
            });
        }

        let total_amount = order_total(&lines);

        let order_row = sqlx::query(
            r#"
            INSERT INTO orders (student_id, vendor_id, total_amount, delivery_location, delivery_notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                      status, created_at, updated_at
            "#,
        )
        .bind(student_id)
        .bind(request.vendor_id)
        .bind(total_amount)
        .bind(&request.delivery_location)
        .bind(&request.delivery_notes)
        .fetch_one(&mut *tx)
        .await?;

        let order = order_from_row(&order_row)?;

        let mut order_items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = sqlx::query_as::<_, OrderItem>(
                r#"
                INSERT INTO order_items (order_id, menu_item_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, menu_item_id, quantity, unit_price
                "#,
            )
            .bind(order.id)
            .bind(line.menu_item_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await?;

            order_items.push(item);
        }

        tx.commit().await?;

        info!(
            "Order {} created for student {} at vendor {} ({} lines, total {})",
            order.id,
            student_id,
            request.vendor_id,
            order_items.len(),
            total_amount
        );

        Ok(CreatedOrder { order, order_items })
    }

    /// List a student's orders, newest first, with lines and vendor profile
    pub async fn list_for_student(&self, student_id: Uuid) -> ApiResult<Vec<OrderDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                   status, created_at, updated_at
            FROM orders
            WHERE student_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order = self.load_items(&order_ids).await?;

        let vendor_ids: Vec<Uuid> = orders.iter().map(|o| o.vendor_id).collect();
        let vendors = self.load_vendors(&vendor_ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let order_items = items_by_order.remove(&order.id).unwrap_or_default();
                let vendor = vendors.get(&order.vendor_id).cloned();
                OrderDetail {
                    order_items,
                    vendor,
                    student: None,
                    order,
                }
            })
            .collect())
    }

    /// List a vendor's received orders, newest first, with student profile
    pub async fn list_for_vendor(&self, vendor_id: Uuid) -> ApiResult<Vec<OrderDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                   status, created_at, updated_at
            FROM orders
            WHERE vendor_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order = self.load_items(&order_ids).await?;

        let student_ids: Vec<Uuid> = orders.iter().map(|o| o.student_id).collect();
        let students = self.load_students(&student_ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let order_items = items_by_order.remove(&order.id).unwrap_or_default();
                let student = students.get(&order.student_id).cloned();
                OrderDetail {
                    order_items,
                    vendor: None,
                    student,
                    order,
                }
            })
            .collect())
    }

    /// Find one of a student's own orders
    pub async fn find_for_student(
        &self,
        order_id: Uuid,
        student_id: Uuid,
    ) -> ApiResult<Option<OrderDetail>> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                   status, created_at, updated_at
            FROM orders
            WHERE id = $1 AND student_id = $2
            "#,
        )
        .bind(order_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = order_from_row(&row)?;
        let mut items_by_order = self.load_items(&[order.id]).await?;
        let vendors = self.load_vendors(&[order.vendor_id]).await?;

        Ok(Some(OrderDetail {
            order_items: items_by_order.remove(&order.id).unwrap_or_default(),
            vendor: vendors.get(&order.vendor_id).cloned(),
            student: None,
            order,
        }))
    }

    /// Find one of a vendor's received orders
    pub async fn find_for_vendor(
        &self,
        order_id: Uuid,
        vendor_id: Uuid,
    ) -> ApiResult<Option<OrderDetail>> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                   status, created_at, updated_at
            FROM orders
            WHERE id = $1 AND vendor_id = $2
            "#,
        )
        .bind(order_id)
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = order_from_row(&row)?;
        let mut items_by_order = self.load_items(&[order.id]).await?;
        let students = self.load_students(&[order.student_id]).await?;

        Ok(Some(OrderDetail {
            order_items: items_by_order.remove(&order.id).unwrap_or_default(),
            vendor: None,
            student: students.get(&order.student_id).cloned(),
            order,
        }))
    }

    /// Minimal status projection of a student's own order
    pub async fn track_status(
        &self,
        order_id: Uuid,
        student_id: Uuid,
    ) -> ApiResult<Option<OrderTracking>> {
        let row = sqlx::query(
            r#"
            SELECT id, status, updated_at
            FROM orders
            WHERE id = $1 AND student_id = $2
            "#,
        )
        .bind(order_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(OrderTracking {
            id: row.get("id"),
            status: parse_status(row.get("status"))?,
            updated_at: row.get("updated_at"),
        }))
    }

    /// Vendor-driven status update
    ///
    /// Fails `NotFound` unless the order belongs to the vendor, and
    /// `InvalidState` once the order is terminal. Beyond the terminal
    /// guard the vendor picks the next status freely.
    pub async fn update_status(
        &self,
        order_id: Uuid,
        vendor_id: Uuid,
        new_status: OrderStatus,
    ) -> ApiResult<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                   status, created_at, updated_at
            FROM orders
            WHERE id = $1 AND vendor_id = $2
            "#,
        )
        .bind(order_id)
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

        let order = order_from_row(&row)?;

        if !order.status.can_transition_to(new_status) {
            return Err(ApiError::InvalidState(format!(
                "Order is already {} and cannot be updated",
                order.status.as_str().to_lowercase()
            )));
        }

        let updated_row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                      status, created_at, updated_at
            "#,
        )
        .bind(order_id)
        .bind(new_status.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!("Order {} moved to {}", order_id, new_status);

        order_from_row(&updated_row)
    }

    /// Cancel an order on behalf of its student or its vendor
    ///
    /// A caller matching neither foreign key gets `Forbidden`. There is no
    /// terminal-state guard on this path: a completed order can still be
    /// cancelled.
    pub async fn cancel(
        &self,
        order_id: Uuid,
        caller_id: Uuid,
        caller_role: Role,
    ) -> ApiResult<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                   status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

        let order = order_from_row(&row)?;

        let is_owner = match caller_role {
            Role::Student => order.student_id == caller_id,
            Role::Vendor => order.vendor_id == caller_id,
            Role::Admin => false,
        };

        if !is_owner {
            return Err(ApiError::Forbidden(
                "You are not authorized to cancel this order".to_string(),
            ));
        }

        let cancelled_row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, student_id, vendor_id, total_amount, delivery_location, delivery_notes,
                      status, created_at, updated_at
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Cancelled.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Order {} cancelled by {} {}",
            order_id,
            caller_role.as_str(),
            caller_id
        );

        order_from_row(&cancelled_row)
    }

    /// Load the lines of the given orders, keyed by order id
    async fn load_items(
        &self,
        order_ids: &[Uuid],
    ) -> ApiResult<HashMap<Uuid, Vec<OrderItemWithMenu>>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT oi.id, oi.order_id, oi.menu_item_id, oi.quantity, oi.unit_price,
                   mi.id AS mi_id, mi.vendor_id AS mi_vendor_id, mi.category_id AS mi_category_id,
                   mi.name AS mi_name, mi.description AS mi_description, mi.price AS mi_price,
                   mi.image_url AS mi_image_url, mi.available AS mi_available,
                   mi.created_at AS mi_created_at, mi.updated_at AS mi_updated_at
            FROM order_items oi
            JOIN menu_items mi ON mi.id = oi.menu_item_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<Uuid, Vec<OrderItemWithMenu>> = HashMap::new();
        for row in &rows {
            let item = order_item_with_menu_from_row(row);
            items_by_order
                .entry(item.item.order_id)
                .or_default()
                .push(item);
        }

        Ok(items_by_order)
    }

    /// Load public vendor profiles, keyed by id
    async fn load_vendors(&self, vendor_ids: &[Uuid]) -> ApiResult<HashMap<Uuid, VendorPublic>> {
        if vendor_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let vendors = sqlx::query_as::<_, VendorPublic>(
            r#"
            SELECT id, email, name, phone, location, created_at, updated_at
            FROM vendors
            WHERE id = ANY($1)
            "#,
        )
        .bind(vendor_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(vendors.into_iter().map(|v| (v.id, v)).collect())
    }

    /// Load public student profiles, keyed by id
    async fn load_students(&self, student_ids: &[Uuid]) -> ApiResult<HashMap<Uuid, StudentPublic>> {
        if student_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let students = sqlx::query_as::<_, StudentPublic>(
            r#"
            SELECT id, email, name, phone, created_at, updated_at
            FROM students
            WHERE id = ANY($1)
            "#,
        )
        .bind(student_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(students.into_iter().map(|s| (s.id, s)).collect())
    }
}

/// Build an Order from a row carrying the orders columns
fn order_from_row(row: &PgRow) -> Result<Order, ApiError> {
    Ok(Order {
        id: row.get("id"),
        student_id: row.get("student_id"),
        vendor_id: row.get("vendor_id"),
        total_amount: row.get("total_amount"),
        delivery_location: row.get("delivery_location"),
        delivery_notes: row.get("delivery_notes"),
        status: parse_status(row.get("status"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn order_item_with_menu_from_row(row: &PgRow) -> OrderItemWithMenu {
    let item = OrderItem {
        id: row.get("id"),
        order_id: row.get("order_id"),
        menu_item_id: row.get("menu_item_id"),
        quantity: row.get("quantity"),
        unit_price: row.get("unit_price"),
    };

    let menu_item = crate::models::menu::MenuItem {
        id: row.get("mi_id"),
        vendor_id: row.get("mi_vendor_id"),
        category_id: row.get("mi_category_id"),
        name: row.get("mi_name"),
        description: row.get("mi_description"),
        price: row.get("mi_price"),
        image_url: row.get("mi_image_url"),
        available: row.get("mi_available"),
        created_at: row.get("mi_created_at"),
        updated_at: row.get("mi_updated_at"),
    };

    OrderItemWithMenu { item, menu_item }
}

fn parse_status(raw: String) -> Result<OrderStatus, ApiError> {
    raw.parse().map_err(|e| {
        error!("Corrupt order status in store: {}", e);
        ApiError::Internal
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderLineRequest;

    struct Fixtures {
        student_id: Uuid,
        vendor_id: Uuid,
        rice_id: Uuid,
        drink_id: Uuid,
    }

    async fn test_pool() -> PgPool {
        let config = common::database::DatabaseConfig::from_env().unwrap();
        let pool = common::database::init_pool(&config).await.unwrap();
        common::database::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed(pool: &PgPool) -> Fixtures {
        let tag = Uuid::new_v4();

        let student_id: Uuid = sqlx::query(
            "INSERT INTO students (email, password_hash, name, phone)
             VALUES ($1, 'x', 'Test Student', '0800') RETURNING id",
        )
        .bind(format!("{}@student.babcock.edu.ng", tag))
        .fetch_one(pool)
        .await
        .unwrap()
        .get("id");

        let vendor_id: Uuid = sqlx::query(
            "INSERT INTO vendors (email, password_hash, name, location)
             VALUES ($1, 'x', 'Test Vendor', 'Cafeteria 2') RETURNING id",
        )
        .bind(format!("{}@vendors.example.com", tag))
        .fetch_one(pool)
        .await
        .unwrap()
        .get("id");

        let category_id: Uuid = sqlx::query("SELECT id FROM categories WHERE name = 'Rice'")
            .fetch_one(pool)
            .await
            .unwrap()
            .get("id");

        let rice_id: Uuid = sqlx::query(
            "INSERT INTO menu_items (vendor_id, category_id, name, price)
             VALUES ($1, $2, 'Jollof Rice', 1500) RETURNING id",
        )
        .bind(vendor_id)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .unwrap()
        .get("id");

        let drink_id: Uuid = sqlx::query(
            "INSERT INTO menu_items (vendor_id, category_id, name, price)
             VALUES ($1, $2, 'Zobo', 500) RETURNING id",
        )
        .bind(vendor_id)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .unwrap()
        .get("id");

        Fixtures {
            student_id,
            vendor_id,
            rice_id,
            drink_id,
        }
    }

    fn request(f: &Fixtures, items: Vec<OrderLineRequest>) -> CreateOrderRequest {
        CreateOrderRequest {
            vendor_id: f.vendor_id,
            items,
            delivery_location: "Samuel Akande Hall".to_string(),
            delivery_notes: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_missing_menu_item_leaves_no_rows() {
        let pool = test_pool().await;
        let repo = OrderRepository::new(pool.clone());
        let f = seed(&pool).await;

        let result = repo
            .create_order(
                f.student_id,
                &request(
                    &f,
                    vec![
                        OrderLineRequest {
                            menu_item_id: f.rice_id,
                            quantity: 2,
                        },
                        OrderLineRequest {
                            menu_item_id: Uuid::new_v4(),
                            quantity: 1,
                        },
                    ],
                ),
            )
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let order_count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM orders WHERE student_id = $1")
                .bind(f.student_id)
                .fetch_one(&pool)
                .await
                .unwrap()
                .get("count");
        assert_eq!(order_count, 0, "order row persisted despite failed line");

        let item_count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM order_items WHERE menu_item_id = $1")
                .bind(f.rice_id)
                .fetch_one(&pool)
                .await
                .unwrap()
                .get("count");
        assert_eq!(item_count, 0, "order line persisted despite failed sibling");
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_price_snapshot_survives_menu_price_change() {
        let pool = test_pool().await;
        let repo = OrderRepository::new(pool.clone());
        let f = seed(&pool).await;

        let created = repo
            .create_order(
                f.student_id,
                &request(
                    &f,
                    vec![
                        OrderLineRequest {
                            menu_item_id: f.rice_id,
                            quantity: 2,
                        },
                        OrderLineRequest {
                            menu_item_id: f.drink_id,
                            quantity: 3,
                        },
                    ],
                ),
            )
            .await
            .unwrap();

        assert_eq!(created.order.total_amount, 2 * 1500 + 3 * 500);

        sqlx::query("UPDATE menu_items SET price = 9999 WHERE id = $1")
            .bind(f.rice_id)
            .execute(&pool)
            .await
            .unwrap();

        let reread = repo
            .find_for_student(created.order.id, f.student_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reread.order.total_amount, 2 * 1500 + 3 * 500);
        let rice_line = reread
            .order_items
            .iter()
            .find(|l| l.item.menu_item_id == f.rice_id)
            .unwrap();
        assert_eq!(rice_line.item.unit_price, 1500);
        assert_eq!(rice_line.menu_item.price, 9999);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_terminal_order_rejects_status_update() {
        let pool = test_pool().await;
        let repo = OrderRepository::new(pool.clone());
        let f = seed(&pool).await;

        let created = repo
            .create_order(
                f.student_id,
                &request(
                    &f,
                    vec![OrderLineRequest {
                        menu_item_id: f.rice_id,
                        quantity: 1,
                    }],
                ),
            )
            .await
            .unwrap();

        repo.update_status(created.order.id, f.vendor_id, OrderStatus::Completed)
            .await
            .unwrap();

        let result = repo
            .update_status(created.order.id, f.vendor_id, OrderStatus::Ready)
            .await;
        assert!(matches!(result, Err(ApiError::InvalidState(_))));

        let tracked = repo
            .track_status(created.order.id, f.student_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracked.status, OrderStatus::Completed);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_other_parties_cannot_see_or_cancel_order() {
        let pool = test_pool().await;
        let repo = OrderRepository::new(pool.clone());
        let f = seed(&pool).await;
        let stranger = seed(&pool).await;

        let created = repo
            .create_order(
                f.student_id,
                &request(
                    &f,
                    vec![OrderLineRequest {
                        menu_item_id: f.rice_id,
                        quantity: 1,
                    }],
                ),
            )
            .await
            .unwrap();

        // Ownership mismatch reads as nonexistence
        assert!(
            repo.find_for_student(created.order.id, stranger.student_id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repo.find_for_vendor(created.order.id, stranger.vendor_id)
                .await
                .unwrap()
                .is_none()
        );

        // A third party cannot cancel
        let result = repo
            .cancel(created.order.id, stranger.student_id, Role::Student)
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        let result = repo
            .cancel(created.order.id, stranger.vendor_id, Role::Vendor)
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        // The owning student can
        let cancelled = repo
            .cancel(created.order.id, f.student_id, Role::Student)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }
}
