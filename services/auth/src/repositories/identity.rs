//! Identity repository for principal registration and lookup
//!
//! Principals live in three disjoint tables (students, vendors, admins).
//! Email uniqueness spans all three, so registration checks the union
//! inside the same transaction that performs the insert.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgConnection, PgPool, Row};
use tracing::info;

use crate::error::{AuthError, AuthResult};
use crate::models::{NewStudent, NewVendor, Principal, Student, Vendor};

/// Identity repository
#[derive(Clone)]
pub struct IdentityRepository {
    pool: PgPool,
}

impl IdentityRepository {
    /// Create a new identity repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new student
    ///
    /// Returns `Ok(None)` when the email is already registered under any
    /// principal kind.
    pub async fn create_student(&self, new_student: &NewStudent) -> AuthResult<Option<Student>> {
        info!("Registering student: {}", new_student.email);

        let password_hash = hash_password(&new_student.password)?;

        let mut tx = self.pool.begin().await?;

        if email_taken(&mut tx, &new_student.email).await? {
            return Ok(None);
        }

        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (email, password_hash, name, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, phone, created_at, updated_at
            "#,
        )
        .bind(&new_student.email)
        .bind(&password_hash)
        .bind(&new_student.name)
        .bind(&new_student.phone)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(student))
    }

    /// Register a new vendor
    ///
    /// Returns `Ok(None)` when the email is already registered under any
    /// principal kind.
    pub async fn create_vendor(&self, new_vendor: &NewVendor) -> AuthResult<Option<Vendor>> {
        info!("Registering vendor: {}", new_vendor.email);

        let password_hash = hash_password(&new_vendor.password)?;

        let mut tx = self.pool.begin().await?;

        if email_taken(&mut tx, &new_vendor.email).await? {
            return Ok(None);
        }

        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            INSERT INTO vendors (email, password_hash, name, phone, location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, name, phone, location, created_at, updated_at
            "#,
        )
        .bind(&new_vendor.email)
        .bind(&password_hash)
        .bind(&new_vendor.name)
        .bind(&new_vendor.phone)
        .bind(&new_vendor.location)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(vendor))
    }

    /// Find a principal of any kind by email, trying students, then
    /// vendors, then admins
    pub async fn find_by_email(&self, email: &str) -> AuthResult<Option<Principal>> {
        info!("Looking up principal by email: {}", email);

        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, email, password_hash, name, phone, created_at, updated_at
            FROM students
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(student) = student {
            return Ok(Some(Principal::Student(student)));
        }

        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            SELECT id, email, password_hash, name, phone, location, created_at, updated_at
            FROM vendors
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(vendor) = vendor {
            return Ok(Some(Principal::Vendor(vendor)));
        }

        let admin = sqlx::query_as::<_, crate::models::Admin>(
            r#"
            SELECT id, email, password_hash, name, created_at, updated_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin.map(Principal::Admin))
    }

    /// Verify a password against a stored argon2 hash
    pub fn verify_password(&self, password_hash: &str, password: &str) -> AuthResult<bool> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
            tracing::error!("Failed to parse password hash: {}", e);
            AuthError::Internal
        })?;

        let argon2 = Argon2::default();
        let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }
}

/// Hash a password with argon2 and a fresh random salt
fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AuthError::Internal
        })?
        .to_string();

    Ok(password_hash)
}

/// Check whether an email exists under any principal kind
async fn email_taken(conn: &mut PgConnection, email: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT (
            EXISTS (SELECT 1 FROM students WHERE email = $1)
            OR EXISTS (SELECT 1 FROM vendors WHERE email = $1)
            OR EXISTS (SELECT 1 FROM admins WHERE email = $1)
        ) AS taken
        "#,
    )
    .bind(email)
    .fetch_one(conn)
    .await?;

    Ok(row.get("taken"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_produces_verifiable_hash() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"battery staple", &parsed)
                .is_err()
        );
    }
}
