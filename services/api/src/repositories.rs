//! Repositories for database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{StudentPublic, UpdateStudentProfile, UpdateVendorProfile, VendorPublic};

pub mod catalog;
pub mod order;

pub use catalog::CatalogRepository;
pub use order::OrderRepository;

/// Repository for self-service profile reads and updates
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a student's public profile by ID
    pub async fn find_student(&self, id: Uuid) -> ApiResult<Option<StudentPublic>> {
        let student = sqlx::query_as::<_, StudentPublic>(
            r#"
            SELECT id, email, name, phone, created_at, updated_at
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Update a student's own profile
    pub async fn update_student(
        &self,
        id: Uuid,
        update: &UpdateStudentProfile,
    ) -> ApiResult<Option<StudentPublic>> {
        let student = sqlx::query_as::<_, StudentPublic>(
            r#"
            UPDATE students
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, name, phone, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Find a vendor's public profile by ID
    pub async fn find_vendor(&self, id: Uuid) -> ApiResult<Option<VendorPublic>> {
        let vendor = sqlx::query_as::<_, VendorPublic>(
            r#"
            SELECT id, email, name, phone, location, created_at, updated_at
            FROM vendors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vendor)
    }

    /// Update a vendor's own profile
    pub async fn update_vendor(
        &self,
        id: Uuid,
        update: &UpdateVendorProfile,
    ) -> ApiResult<Option<VendorPublic>> {
        let vendor = sqlx::query_as::<_, VendorPublic>(
            r#"
            UPDATE vendors
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                location = COALESCE($4, location),
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, name, phone, location, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.location)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vendor)
    }
}
