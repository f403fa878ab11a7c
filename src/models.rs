//! Data models for the Vendora backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub is_pro: bool,
    pub deletion_requested: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            is_pro: user.is_pro,
            created_at: user.created_at,
        }
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Seller,
    Admin,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub is_pro: bool,
    pub created_at: DateTime<Utc>,
}

/// Product model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub product_type: ProductType,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product categories
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "product_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    AiAccount,
    Prompt,
    Course,
    Download,
}

/// Order model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Order {
    pub id: Uuid,
    pub reference: String,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub amount: i64,
    pub seller_earning: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub gateway_ref: Option<String>,
    pub credentials: Option<String>,
    pub buyer_approved: bool,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Order status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Delivered,
    Completed,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status, tracked separately from delivery status for flows that
/// settle through an external gateway instead of the wallet.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Wallet model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wallet transaction model (append-only audit ledger)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tx_type: WalletTxType,
    pub amount: i64,
    pub status: WalletTxStatus,
    pub gateway_ref: Option<String>,
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Wallet transaction types
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "wallet_tx_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WalletTxType {
    Topup,
    Purchase,
    Payout,
    Refund,
}

/// Wallet transaction status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "wallet_tx_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WalletTxStatus {
    Pending,
    Completed,
    Failed,
}

/// Wallet read model: balance plus derived aggregates over the ledger
#[derive(Debug, Serialize)]
pub struct WalletSummary {
    pub user_id: Uuid,
    pub balance: i64,
    pub total_topup: i64,
    pub total_spent: i64,
}

/// Dispute request model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct DisputeRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub request_type: DisputeType,
    pub amount: Option<i64>,
    pub purchase_type: Option<String>,
    pub order_id: Option<Uuid>,
    pub reason: Option<String>,
    pub admin_notes: Option<String>,
    pub status: DisputeStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Dispute request variants
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "dispute_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeType {
    Refund,
    Cancellation,
    AccountDeletion,
}

/// Dispute status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "dispute_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Pending,
    Approved,
    Rejected,
}

/// Inventory pool item model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct InventoryItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub item_type: InventoryItemType,
    pub credentials: sqlx::types::Json<ItemCredentials>,
    pub assigned: bool,
    pub assigned_order_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inventory item types
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "inventory_item_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InventoryItemType {
    Account,
    LicenseKey,
    Download,
}

/// Credential payload, shape depends on the item type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemCredentials {
    Account {
        email: String,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    LicenseKey {
        key: String,
    },
    Download {
        url: String,
    },
}

impl ItemCredentials {
    /// Flatten to the delivery text attached to an order on fulfilment.
    pub fn render(&self) -> String {
        match self {
            ItemCredentials::Account {
                email,
                password,
                notes,
            } => match notes {
                Some(notes) => format!("{}:{} ({})", email, password, notes),
                None => format!("{}:{}", email, password),
            },
            ItemCredentials::LicenseKey { key } => key.clone(),
            ItemCredentials::Download { url } => url.clone(),
        }
    }
}

/// Admin audit record for privileged override operations
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct AdminAudit {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_id: Option<Uuid>,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Outbound notification row, drained by the notifier worker
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub audience: NotificationAudience,
    pub user_id: Option<Uuid>,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Notification target audience
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "notification_audience", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationAudience {
    All,
    Pro,
    Sellers,
    User,
}

/// Notification delivery status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

// ===== Request / response DTOs =====

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Request DTO for creating a product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub price: i64,
    pub product_type: ProductType,
}

/// Query parameters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub seller_id: Option<Uuid>,
    pub product_type: Option<ProductType>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request DTO for a wallet-funded purchase
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: Uuid,
}

/// Request DTO for a gateway-funded purchase
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGatewayOrderRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1))]
    pub gateway_ref: String,
}

/// Request DTO for seller delivery
#[derive(Debug, Deserialize, Validate)]
pub struct DeliverOrderRequest {
    #[validate(length(min = 1))]
    pub credentials: String,
}

/// Request DTO for an admin order override. All fields optional; whatever is
/// present is applied verbatim, no transition rules.
#[derive(Debug, Deserialize)]
pub struct AdminOverrideRequest {
    pub status: Option<OrderStatus>,
    pub amount: Option<i64>,
    pub credentials: Option<String>,
}

/// Query parameters for listing orders
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub buyer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request DTO for starting a wallet top-up through the gateway
#[derive(Debug, Deserialize, Validate)]
pub struct TopupRequest {
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(length(min = 1))]
    pub gateway_ref: String,
}

/// Admin balance override
#[derive(Debug, Deserialize)]
pub struct SetBalanceRequest {
    pub user_id: Uuid,
    pub balance: i64,
}

/// Request DTO for submitting a dispute request
#[derive(Debug, Deserialize)]
pub struct SubmitDisputeRequest {
    pub request_type: DisputeType,
    pub amount: Option<i64>,
    pub purchase_type: Option<String>,
    pub order_id: Option<Uuid>,
    pub reason: Option<String>,
}

/// Admin resolution decision
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisputeDecision {
    Approved,
    Rejected,
}

/// Request DTO for resolving a dispute request
#[derive(Debug, Deserialize)]
pub struct ResolveDisputeRequest {
    pub decision: DisputeDecision,
    pub notes: Option<String>,
}

/// Query parameters for the unified dispute read model
#[derive(Debug, Default, Deserialize)]
pub struct ListDisputesQuery {
    pub request_type: Option<DisputeType>,
    pub status: Option<DisputeStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request DTO for adding a single inventory item
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub item_type: InventoryItemType,
    pub credentials: ItemCredentials,
    pub display_order: Option<i32>,
}

/// Request DTO for bulk-importing inventory items, one per line
#[derive(Debug, Deserialize, Validate)]
pub struct BulkImportRequest {
    pub product_id: Uuid,
    pub item_type: InventoryItemType,
    #[validate(length(min = 1))]
    pub lines: String,
}

/// Per-line diagnostic from a bulk import
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImportLineError {
    pub line: usize,
    pub reason: String,
}

/// Bulk import result
#[derive(Debug, Serialize)]
pub struct BulkImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportLineError>,
}

/// Request DTO for assigning an inventory item to an order
#[derive(Debug, Deserialize)]
pub struct AssignItemRequest {
    pub order_id: Uuid,
}

/// Request DTO for editing an unassigned inventory item
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub credentials: Option<ItemCredentials>,
    pub display_order: Option<i32>,
}

/// Query parameters for listing inventory items
#[derive(Debug, Default, Deserialize)]
pub struct ListInventoryQuery {
    pub product_id: Option<Uuid>,
    pub assigned: Option<bool>,
}

/// Admin push broadcast request, forwarded to the push side-channel
#[derive(Debug, Deserialize, Validate)]
pub struct PushBroadcastRequest {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub message: String,
    pub link: Option<String>,
    pub audience: NotificationAudience,
}

/// Admin SEO submission request
#[derive(Debug, Deserialize, Validate)]
pub struct SeoSubmitRequest {
    #[validate(length(min = 1))]
    pub urls: Vec<String>,
}

/// Payment gateway webhook payload
#[derive(Debug, Deserialize)]
pub struct GatewayWebhookPayload {
    pub gateway_ref: String,
    pub event: GatewayEvent,
}

/// Gateway webhook event kinds
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEvent {
    PaymentCompleted,
    PaymentFailed,
}

/// Pagination parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_payloads_round_trip_as_tagged_json() {
        let creds = ItemCredentials::Account {
            email: "a@b.test".into(),
            password: "hunter2".into(),
            notes: None,
        };
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["type"], "account");
        assert!(json.get("notes").is_none());

        let back: ItemCredentials = serde_json::from_value(json).unwrap();
        assert_eq!(back, creds);
    }

    #[test]
    fn rendered_credentials_match_delivery_format() {
        let creds = ItemCredentials::Account {
            email: "a@b.test".into(),
            password: "pw".into(),
            notes: Some("2fa off".into()),
        };
        assert_eq!(creds.render(), "a@b.test:pw (2fa off)");

        let key = ItemCredentials::LicenseKey {
            key: "AAAA-BBBB".into(),
        };
        assert_eq!(key.render(), "AAAA-BBBB");
    }
}
