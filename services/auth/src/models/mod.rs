//! Authentication service models

pub mod admin;
pub mod role;
pub mod student;
pub mod vendor;

// Re-export for convenience
pub use admin::Admin;
pub use role::Role;
pub use student::{NewStudent, Student};
pub use vendor::{NewVendor, Vendor};

use uuid::Uuid;

/// A principal of any kind, resolved by email lookup at login time.
///
/// The three kinds are disjoint entities; an email is unique across the
/// union of all of them.
#[derive(Debug, Clone)]
pub enum Principal {
    Student(Student),
    Vendor(Vendor),
    Admin(Admin),
}

impl Principal {
    pub fn id(&self) -> Uuid {
        match self {
            Principal::Student(s) => s.id,
            Principal::Vendor(v) => v.id,
            Principal::Admin(a) => a.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Student(_) => Role::Student,
            Principal::Vendor(_) => Role::Vendor,
            Principal::Admin(_) => Role::Admin,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::Student(s) => &s.email,
            Principal::Vendor(v) => &v.email,
            Principal::Admin(a) => &a.email,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::Student(s) => &s.name,
            Principal::Vendor(v) => &v.name,
            Principal::Admin(a) => &a.name,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Principal::Student(s) => &s.password_hash,
            Principal::Vendor(v) => &v.password_hash,
            Principal::Admin(a) => &a.password_hash,
        }
    }
}
