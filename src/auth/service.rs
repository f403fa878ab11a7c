//! Account registration and login

use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::ServiceError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User, UserResponse, UserRole};

pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(db_pool: PgPool, jwt_secret: String) -> Self {
        Self {
            db_pool,
            jwt_secret,
        }
    }

    /// Register a new buyer or seller account. Admin accounts are seeded
    /// out of band, never self-registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, ServiceError> {
        let role = match request.role.unwrap_or(UserRole::Buyer) {
            UserRole::Admin => UserRole::Buyer,
            role => role,
        };

        let taken: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&request.email)
                .fetch_one(&self.db_pool)
                .await?;
        if taken.0 {
            return Err(ServiceError::Validation(
                "email is already registered".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .context("failed to hash password")?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, is_pro, deletion_requested, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(password_hash)
        .bind(&request.name)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user.into())
    }

    /// Verify credentials and issue an access token.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&request.email)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(ServiceError::Unauthorized)?;

        let valid = bcrypt::verify(&request.password, &user.password_hash)
            .context("failed to verify password")?;
        if !valid {
            return Err(ServiceError::Unauthorized);
        }

        let token = jwt::generate_token(&self.jwt_secret, user.id, user.role)
            .context("failed to issue token")?;

        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    /// Current-user lookup for the profile surface.
    pub async fn me(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(ServiceError::NotFound)?;

        Ok(user.into())
    }
}
