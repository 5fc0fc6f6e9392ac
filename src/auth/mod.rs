//! Authentication and authorization for gene-curator
//!
//! Provides:
//! - JWT token generation and validation
//! - Role model with static capability sets
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod roles;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};
pub use password::{hash_password, verify_password};
pub use roles::{default_role_for_registration, Role, RoleCapabilities};
