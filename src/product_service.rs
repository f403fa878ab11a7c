//! Product catalog service layer
//!
//! The storefront surface is intentionally thin: the interesting state
//! lives on orders and inventory, not the catalog.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{CreateProductRequest, ListProductsQuery, Product};

pub struct ProductService {
    db_pool: PgPool,
}

impl ProductService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create(
        &self,
        seller_id: Uuid,
        request: CreateProductRequest,
    ) -> Result<Product, ServiceError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, seller_id, title, description, price, product_type, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.product_type)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(product)
    }

    pub async fn get(&self, product_id: Uuid) -> Result<Option<Product>, ServiceError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(product)
    }

    /// Active products only; the storefront never sees retired listings.
    pub async fn list(&self, query: ListProductsQuery) -> Result<Vec<Product>, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM products WHERE active = TRUE");

        if let Some(seller_id) = query.seller_id {
            query_builder.push(" AND seller_id = ");
            query_builder.push_bind(seller_id);
        }
        if let Some(product_type) = query.product_type {
            query_builder.push(" AND product_type = ");
            query_builder.push_bind(product_type);
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let products = query_builder
            .build_query_as::<Product>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(products)
    }

    /// Retire a listing. Sellers can only retire their own products.
    pub async fn deactivate(&self, product_id: Uuid, seller_id: Uuid) -> Result<(), ServiceError> {
        let updated = sqlx::query(
            "UPDATE products SET active = FALSE, updated_at = $1 WHERE id = $2 AND seller_id = $3",
        )
        .bind(Utc::now())
        .bind(product_id)
        .bind(seller_id)
        .execute(&self.db_pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }

        Ok(())
    }
}
