use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// 外部比价采集方的投递契约
#[derive(Debug, Deserialize)]
pub struct CreatePriceRequest {
    /// 商品ID
    pub product: String,
    pub store: String,
    pub city: String,
    pub price: f64,
    #[serde(default)]
    pub discount: bool,
    #[serde(default)]
    pub discount_price: f64,
    #[serde(default)]
    pub discount_end: Option<DateTime<Utc>>,
    /// 采集时间（epoch秒），缺省为服务端当前时间
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PriceInfo {
    pub price_id: String,
    pub product_id: String,
    pub store: String,
    pub city: String,
    pub price: f64,
    pub discount: bool,
    pub discount_price: f64,
    pub discount_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PriceInfo {
    /// 追加一条价格记录，历史不做覆盖
    pub async fn create(pool: &PgPool, req: CreatePriceRequest) -> Result<Self, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE product_id = $1)")
                .bind(&req.product)
                .fetch_one(pool)
                .await?;

        if !exists {
            return Err(sqlx::Error::Protocol("Product not found".into()));
        }

        let created_at = match req.created_at {
            Some(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| sqlx::Error::Protocol("Invalid createdAt timestamp".into()))?,
            None => Utc::now(),
        };

        let price_id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, PriceInfo>(
            r#"
            INSERT INTO prices (
                price_id, product_id, store, city, price,
                discount, discount_price, discount_end, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                price_id, product_id, store, city, price,
                discount, discount_price, discount_end, created_at
            "#,
        )
        .bind(&price_id)
        .bind(&req.product)
        .bind(&req.store)
        .bind(&req.city)
        .bind(req.price)
        .bind(req.discount)
        .bind(req.discount_price)
        .bind(req.discount_end)
        .bind(created_at)
        .fetch_one(pool)
        .await
    }
}
