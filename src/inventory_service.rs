//! Inventory pool service layer - seller-owned fulfilment assets
//!
//! Items are editable only while unassigned; once assigned they are frozen
//! server-side (the original relied on hiding the edit controls). Bulk
//! import parses one item per line and reports every malformed line back
//! to the caller instead of counting silently.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{
    BulkImportReport, ImportLineError, InventoryItem, InventoryItemType, ItemCredentials,
    ListInventoryQuery, UpdateItemRequest,
};

/// Inventory service for the seller fulfilment pool
pub struct InventoryService {
    db_pool: PgPool,
}

impl InventoryService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Add a single unassigned item. The credential payload must match the
    /// declared item type.
    pub async fn add_item(
        &self,
        seller_id: Uuid,
        product_id: Uuid,
        item_type: InventoryItemType,
        credentials: ItemCredentials,
        display_order: Option<i32>,
    ) -> Result<InventoryItem, ServiceError> {
        validate_credentials(item_type, &credentials)?;

        let mut tx = self.db_pool.begin().await?;
        verify_product_owner(&mut tx, product_id, seller_id).await?;

        let item = insert_item(
            &mut tx,
            seller_id,
            product_id,
            item_type,
            credentials,
            display_order.unwrap_or(0),
        )
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    /// Bulk import, one item per line. Malformed lines are skipped but each
    /// is reported with its line number; valid items are inserted in one
    /// transaction, so a partial item is never persisted.
    pub async fn bulk_import(
        &self,
        seller_id: Uuid,
        product_id: Uuid,
        item_type: InventoryItemType,
        raw_lines: &str,
    ) -> Result<BulkImportReport, ServiceError> {
        let mut parsed = Vec::new();
        let mut errors = Vec::new();

        for (index, line) in raw_lines.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_import_line(item_type, line) {
                Ok(credentials) => parsed.push(credentials),
                Err(reason) => errors.push(ImportLineError {
                    line: index + 1,
                    reason,
                }),
            }
        }

        let mut tx = self.db_pool.begin().await?;
        verify_product_owner(&mut tx, product_id, seller_id).await?;

        let (next_order,): (i32,) = sqlx::query_as(
            r#"
            SELECT COALESCE(MAX(display_order), -1) + 1
            FROM inventory_items
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        let imported = parsed.len();
        for (offset, credentials) in parsed.into_iter().enumerate() {
            insert_item(
                &mut tx,
                seller_id,
                product_id,
                item_type,
                credentials,
                next_order + offset as i32,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(BulkImportReport {
            imported,
            skipped: errors.len(),
            errors,
        })
    }

    /// Assign an item to an order. Guarded on the unassigned state;
    /// assigning twice surfaces `AlreadyProcessed`.
    pub async fn assign(
        &self,
        item_id: Uuid,
        seller_id: Uuid,
        order_id: Uuid,
    ) -> Result<InventoryItem, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let item = fetch_item_for_update(&mut tx, item_id).await?;
        if item.seller_id != seller_id {
            return Err(ServiceError::Unauthorized);
        }
        if item.assigned {
            return Err(ServiceError::AlreadyProcessed);
        }

        let order_product: Option<(Uuid,)> =
            sqlx::query_as("SELECT product_id FROM orders WHERE id = $1 AND seller_id = $2")
                .bind(order_id)
                .bind(seller_id)
                .fetch_optional(&mut *tx)
                .await?;
        match order_product {
            None => return Err(ServiceError::NotFound),
            Some((product_id,)) if product_id != item.product_id => {
                return Err(ServiceError::Validation(
                    "item belongs to a different product".to_string(),
                ))
            }
            Some(_) => {}
        }

        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET assigned = TRUE, assigned_order_id = $1, assigned_at = $2, updated_at = $2
            WHERE id = $3 AND assigned = FALSE
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(Utc::now())
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    /// Edit an unassigned item. Assigned items are read-only for sellers.
    pub async fn update_item(
        &self,
        item_id: Uuid,
        seller_id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<InventoryItem, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let item = fetch_item_for_update(&mut tx, item_id).await?;
        if item.seller_id != seller_id {
            return Err(ServiceError::Unauthorized);
        }
        if item.assigned {
            return Err(ServiceError::AlreadyProcessed);
        }

        let credentials = match request.credentials {
            Some(credentials) => {
                validate_credentials(item.item_type, &credentials)?;
                credentials
            }
            None => item.credentials.0,
        };
        let display_order = request.display_order.unwrap_or(item.display_order);

        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET credentials = $1, display_order = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(Json(credentials))
        .bind(display_order)
        .bind(Utc::now())
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    /// Delete an unassigned item.
    pub async fn delete_item(&self, item_id: Uuid, seller_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let item = fetch_item_for_update(&mut tx, item_id).await?;
        if item.seller_id != seller_id {
            return Err(ServiceError::Unauthorized);
        }
        if item.assigned {
            return Err(ServiceError::AlreadyProcessed);
        }

        sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List a seller's items, pool order first.
    pub async fn list(
        &self,
        seller_id: Uuid,
        query: ListInventoryQuery,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM inventory_items WHERE seller_id = ");
        query_builder.push_bind(seller_id);

        if let Some(product_id) = query.product_id {
            query_builder.push(" AND product_id = ");
            query_builder.push_bind(product_id);
        }
        if let Some(assigned) = query.assigned {
            query_builder.push(" AND assigned = ");
            query_builder.push_bind(assigned);
        }

        query_builder.push(" ORDER BY display_order ASC, created_at DESC");

        let items = query_builder
            .build_query_as::<InventoryItem>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(items)
    }
}

async fn insert_item(
    conn: &mut PgConnection,
    seller_id: Uuid,
    product_id: Uuid,
    item_type: InventoryItemType,
    credentials: ItemCredentials,
    display_order: i32,
) -> Result<InventoryItem, sqlx::Error> {
    sqlx::query_as::<_, InventoryItem>(
        r#"
        INSERT INTO inventory_items (
            id, product_id, seller_id, item_type, credentials,
            assigned, display_order, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(seller_id)
    .bind(item_type)
    .bind(Json(credentials))
    .bind(display_order)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
}

async fn fetch_item_for_update(
    conn: &mut PgConnection,
    item_id: Uuid,
) -> Result<InventoryItem, ServiceError> {
    let item =
        sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1 FOR UPDATE")
            .bind(item_id)
            .fetch_optional(&mut *conn)
            .await?;

    item.ok_or(ServiceError::NotFound)
}

async fn verify_product_owner(
    conn: &mut PgConnection,
    product_id: Uuid,
    seller_id: Uuid,
) -> Result<(), ServiceError> {
    let owner: Option<(Uuid,)> = sqlx::query_as("SELECT seller_id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match owner {
        None => Err(ServiceError::NotFound),
        Some((owner_id,)) if owner_id != seller_id => Err(ServiceError::Unauthorized),
        Some(_) => Ok(()),
    }
}

/// Required fields per item type.
fn validate_credentials(
    item_type: InventoryItemType,
    credentials: &ItemCredentials,
) -> Result<(), ServiceError> {
    match (item_type, credentials) {
        (InventoryItemType::Account, ItemCredentials::Account { email, password, .. }) => {
            if email.trim().is_empty() || password.trim().is_empty() {
                Err(ServiceError::Validation(
                    "account items require an email and a password".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        (InventoryItemType::LicenseKey, ItemCredentials::LicenseKey { key }) => {
            if key.trim().is_empty() {
                Err(ServiceError::Validation(
                    "license key items require a key".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        (InventoryItemType::Download, ItemCredentials::Download { url }) => {
            if url.trim().is_empty() {
                Err(ServiceError::Validation(
                    "download items require a file URL".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        _ => Err(ServiceError::Validation(
            "credential payload does not match the item type".to_string(),
        )),
    }
}

/// Parse one bulk-import line.
///
/// Formats: `email:password[:notes]` for accounts, the raw key string for
/// license keys, a URL for downloads.
pub fn parse_import_line(
    item_type: InventoryItemType,
    line: &str,
) -> Result<ItemCredentials, String> {
    match item_type {
        InventoryItemType::Account => {
            let mut parts = line.splitn(3, ':');
            let email = parts.next().unwrap_or("").trim();
            let password = parts.next().map(str::trim);
            let notes = parts.next().map(str::trim);

            if email.is_empty() || !email.contains('@') {
                return Err("missing or malformed email".to_string());
            }
            let password = match password {
                Some(password) if !password.is_empty() => password,
                _ => return Err("missing password".to_string()),
            };

            Ok(ItemCredentials::Account {
                email: email.to_string(),
                password: password.to_string(),
                notes: notes.filter(|n| !n.is_empty()).map(str::to_string),
            })
        }
        InventoryItemType::LicenseKey => Ok(ItemCredentials::LicenseKey {
            key: line.to_string(),
        }),
        InventoryItemType::Download => {
            if line.starts_with("http://") || line.starts_with("https://") {
                Ok(ItemCredentials::Download {
                    url: line.to_string(),
                })
            } else {
                Err("not a valid URL".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_lines_parse_with_and_without_notes() {
        let creds = parse_import_line(InventoryItemType::Account, "a@b.test:pw123").unwrap();
        assert_eq!(
            creds,
            ItemCredentials::Account {
                email: "a@b.test".into(),
                password: "pw123".into(),
                notes: None,
            }
        );

        let creds =
            parse_import_line(InventoryItemType::Account, "a@b.test:pw123:backup codes saved")
                .unwrap();
        assert_eq!(
            creds,
            ItemCredentials::Account {
                email: "a@b.test".into(),
                password: "pw123".into(),
                notes: Some("backup codes saved".into()),
            }
        );
    }

    #[test]
    fn malformed_account_lines_are_rejected_with_a_reason() {
        assert!(parse_import_line(InventoryItemType::Account, "no-at-sign:pw").is_err());
        assert!(parse_import_line(InventoryItemType::Account, "a@b.test").is_err());
        assert!(parse_import_line(InventoryItemType::Account, "a@b.test:").is_err());
    }

    #[test]
    fn license_keys_are_taken_verbatim() {
        let creds = parse_import_line(InventoryItemType::LicenseKey, "XXXX-YYYY-ZZZZ").unwrap();
        assert_eq!(
            creds,
            ItemCredentials::LicenseKey {
                key: "XXXX-YYYY-ZZZZ".into()
            }
        );
    }

    #[test]
    fn downloads_must_be_urls() {
        assert!(parse_import_line(InventoryItemType::Download, "https://cdn.test/file.zip").is_ok());
        assert!(parse_import_line(InventoryItemType::Download, "file.zip").is_err());
    }

    #[test]
    fn type_mismatched_payloads_fail_validation() {
        let key = ItemCredentials::LicenseKey { key: "k".into() };
        assert!(validate_credentials(InventoryItemType::Account, &key).is_err());
        assert!(validate_credentials(InventoryItemType::LicenseKey, &key).is_ok());
    }
}
