use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub country: String,
    pub trademark: String,
    pub weight: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: String,
    pub image: String,
    pub country: String,
    pub trademark: String,
    pub weight: f64,
    pub unit: String,
}

impl Product {
    pub async fn create(pool: &PgPool, req: CreateProductRequest) -> Result<Self, sqlx::Error> {
        let product_id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (product_id, name, slug, image, country, trademark, weight, unit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING product_id, name, slug, image, country, trademark, weight, unit
            "#,
        )
        .bind(&product_id)
        .bind(&req.name)
        .bind(&req.slug)
        .bind(&req.image)
        .bind(&req.country)
        .bind(&req.trademark)
        .bind(req.weight)
        .bind(&req.unit)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, name, slug, image, country, trademark, weight, unit
            FROM products
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }
}
