use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use super::aggregate::{self, PriceRow, ProductPage, Sort};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct CategorySlug {
    pub category_id: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
}

/// 外部采集方构建好的批量更新指令：整体替换各分类引用的商品ID集合
#[derive(Debug, Deserialize)]
pub struct CategoryProductsUpdate {
    pub category_id: String,
    pub product_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductsRequest {
    pub updates: Vec<CategoryProductsUpdate>,
}

// 缓存相关常量
const CATEGORY_CACHE_EXPIRE: u64 = 600; // 分类缓存过期时间，单位秒
const CATEGORY_SLUG_CACHE_PREFIX: &str = "category:slug:"; // 分类slug缓存前缀
const PRODUCTS_CACHE_PREFIX: &str = "category:products:"; // 商品列表页缓存前缀
const PRODUCTS_CACHE_EXPIRE: u64 = 120; // 价格随采集频繁变化，列表页只缓存2分钟

impl Category {
    pub async fn create(pool: &PgPool, req: CreateCategoryRequest) -> Result<Self, sqlx::Error> {
        let category_id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (category_id, name, slug)
            VALUES ($1, $2, $3)
            RETURNING category_id, name, slug
            "#,
        )
        .bind(&category_id)
        .bind(&req.name)
        .bind(&req.slug)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        redis: &Arc<RedisClient>,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        // 先查缓存
        let cache_key = format!("{}{}", CATEGORY_SLUG_CACHE_PREFIX, slug);

        if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
            let cached: redis::RedisResult<String> = conn.get(&cache_key).await;

            if let Ok(json_str) = cached {
                if let Ok(category) = serde_json::from_str::<Category>(&json_str) {
                    tracing::debug!("Get category from cache: {}", cache_key);
                    return Ok(Some(category));
                }
            }
        }

        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, name, slug
            FROM categories
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        // 缓存结果
        if let Some(ref c) = category {
            if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
                if let Ok(json_str) = serde_json::to_string(c) {
                    let _: Result<(), redis::RedisError> =
                        conn.set_ex(&cache_key, json_str, CATEGORY_CACHE_EXPIRE).await;
                    tracing::debug!("Set category to cache: {}", cache_key);
                }
            }
        }

        Ok(category)
    }

    /// 只返回引用了至少一个商品的分类
    pub async fn list_non_empty(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT c.category_id, c.name, c.slug
            FROM categories c
            WHERE EXISTS (
                SELECT 1 FROM category_products cp
                WHERE cp.category_id = c.category_id
            )
            ORDER BY c.name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn ids_and_slugs(pool: &PgPool) -> Result<Vec<CategorySlug>, sqlx::Error> {
        sqlx::query_as::<_, CategorySlug>(
            r#"
            SELECT category_id, slug
            FROM categories
            ORDER BY slug
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// 批量替换分类的商品引用，单个事务内完成，失败整体回滚
    pub async fn update_products(
        pool: &PgPool,
        updates: Vec<CategoryProductsUpdate>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        for update in &updates {
            sqlx::query("DELETE FROM category_products WHERE category_id = $1")
                .bind(&update.category_id)
                .execute(&mut *tx)
                .await?;

            for product_id in &update.product_ids {
                sqlx::query(
                    r#"
                    INSERT INTO category_products (category_id, product_id)
                    VALUES ($1, $2)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(&update.category_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!("Replaced product references for {} categories", updates.len());
        Ok(())
    }

    /// 分类商品列表：slug不存在时返回空页，count缺省
    pub async fn get_products(
        pool: &PgPool,
        redis: &Arc<RedisClient>,
        slug: &str,
        page: u32,
        sort: Sort,
        store: Option<&str>,
        city: Option<&str>,
    ) -> Result<ProductPage, sqlx::Error> {
        let cache_key = format!(
            "{}{}:{}:{}:{}:{}",
            PRODUCTS_CACHE_PREFIX,
            slug,
            page,
            sort.as_str(),
            store.unwrap_or("-"),
            city.unwrap_or("-"),
        );

        if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
            let cached: redis::RedisResult<String> = conn.get(&cache_key).await;

            if let Ok(json_str) = cached {
                if let Ok(page) = serde_json::from_str::<ProductPage>(&json_str) {
                    tracing::debug!("Get product page from cache: {}", cache_key);
                    return Ok(page);
                }
            }
        }

        let category = match Self::find_by_slug(pool, redis, slug).await? {
            Some(category) => category,
            None => return Ok(ProductPage::empty()),
        };

        // 展开该分类引用的所有商品及其价格历史
        let rows = sqlx::query_as::<_, PriceRow>(
            r#"
            SELECT
                p.name, p.slug, p.image, p.country, p.trademark, p.weight, p.unit,
                pr.store, pr.city, pr.price, pr.discount, pr.discount_price,
                pr.discount_end, pr.created_at
            FROM category_products cp
            JOIN products p ON p.product_id = cp.product_id
            JOIN prices pr ON pr.product_id = p.product_id
            WHERE cp.category_id = $1
            "#,
        )
        .bind(&category.category_id)
        .fetch_all(pool)
        .await?;

        let result = aggregate::aggregate(rows, store, city, sort, page);

        if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
            if let Ok(json_str) = serde_json::to_string(&result) {
                let _: Result<(), redis::RedisError> =
                    conn.set_ex(&cache_key, json_str, PRODUCTS_CACHE_EXPIRE).await;
                tracing::debug!("Set product page to cache: {}", cache_key);
            }
        }

        Ok(result)
    }
}
