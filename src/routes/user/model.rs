use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub name: String,
    #[serde(rename = "googleId")]
    pub google_id: String,
    pub avatar: String,
}

/// 对外返回的用户信息，带收藏的商品ID列表
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub user_id: String,
    pub name: String,
    #[serde(rename = "googleId")]
    pub google_id: String,
    pub avatar: String,
    pub favorites: Vec<String>,
}

/// 登录请求体，身份信息由调用方（前端的OAuth流程）预先校验
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    #[serde(rename = "googleId")]
    pub google_id: String,
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserInfo,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckTokenResponse {
    pub user_id: String,
}

impl User {
    pub async fn find_by_id(pool: &PgPool, user_id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, google_id, avatar
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_google_id(
        pool: &PgPool,
        google_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, google_id, avatar
            FROM users
            WHERE google_id = $1
            "#,
        )
        .bind(google_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, req: &LoginRequest) -> Result<Self, sqlx::Error> {
        let user_id = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, name, google_id, avatar)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, name, google_id, avatar
            "#,
        )
        .bind(&user_id)
        .bind(&req.name)
        .bind(&req.google_id)
        .bind(&req.avatar)
        .fetch_one(pool)
        .await?;

        tracing::info!("Created user {} for google id {}", user.user_id, user.google_id);
        Ok(user)
    }

    /// 按google_id查找，不存在则创建。并发下撞到唯一约束时回退为再查一次
    pub async fn find_or_create(pool: &PgPool, req: &LoginRequest) -> Result<Self, sqlx::Error> {
        if let Some(user) = Self::find_by_google_id(pool, &req.google_id).await? {
            return Ok(user);
        }

        match Self::create(pool, req).await {
            Ok(user) => Ok(user),
            Err(e) if e.to_string().contains("unique constraint") => {
                Self::find_by_google_id(pool, &req.google_id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn favorites(pool: &PgPool, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT product_id
            FROM user_favorites
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn add_favorite(
        pool: &PgPool,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE product_id = $1)")
                .bind(product_id)
                .fetch_one(pool)
                .await?;

        if !exists {
            return Err(sqlx::Error::Protocol("Product not found".into()));
        }

        sqlx::query(
            r#"
            INSERT INTO user_favorites (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn remove_favorite(
        pool: &PgPool,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM user_favorites
            WHERE user_id = $1 AND product_id = $2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn into_info(self, pool: &PgPool) -> Result<UserInfo, sqlx::Error> {
        let favorites = Self::favorites(pool, &self.user_id).await?;
        Ok(UserInfo {
            user_id: self.user_id,
            name: self.name,
            google_id: self.google_id,
            avatar: self.avatar,
            favorites,
        })
    }
}
