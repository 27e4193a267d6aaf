// src/db.rs

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::{Design, Purchase, User};

fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        email: r.get("email"),
        role: r.get("role"),
        avatar_url: r.get("avatar_url"),
        created_at: r.get("created_at"),
    }
}

fn design_from_row(r: &PgRow) -> Design {
    Design {
        id: r.get("id"),
        designer_id: r.get("designer_id"),
        title: r.get("title"),
        description: r.get("description"),
        image_url: r.get("image_url"),
        price: r.get("price"),
        tags: r.get("tags"),
        created_at: r.get("created_at"),
    }
}

fn purchase_from_row(r: &PgRow) -> Purchase {
    Purchase {
        id: r.get("id"),
        buyer_id: r.get("buyer_id"),
        design_id: r.get("design_id"),
        payment_id: r.get("payment_id"),
        order_id: r.get("order_id"),
        amount: r.get("amount"),
        currency: r.get("currency"),
        status: r.get("status"),
        created_at: r.get("created_at"),
    }
}

pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    avatar_url: Option<&str>,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO users (username, email, password_hash, role, avatar_url)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING id, username, email, role, avatar_url, created_at"#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(avatar_url)
    .fetch_one(pool)
    .await?;

    Ok(user_from_row(&row))
}

/// Credential lookup for login. The only query that reads `password_hash`.
pub async fn find_user_credentials(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(i32, String)>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT id, password_hash FROM users WHERE email = $1"#)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| (r.get("id"), r.get("password_hash"))))
}

pub async fn get_user(pool: &PgPool, user_id: i32) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, username, email, role, avatar_url, created_at
           FROM users
           WHERE id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn update_user_profile(
    pool: &PgPool,
    user_id: i32,
    username: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"UPDATE users
           SET username = COALESCE($1, username),
               avatar_url = COALESCE($2, avatar_url)
           WHERE id = $3
           RETURNING id, username, email, role, avatar_url, created_at"#,
    )
    .bind(username)
    .bind(avatar_url)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn list_designs(pool: &PgPool) -> Result<Vec<Design>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, designer_id, title, description, image_url, price::text as price,
                  tags, created_at
           FROM designs
           ORDER BY created_at DESC"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(design_from_row).collect())
}

pub async fn get_design(pool: &PgPool, design_id: i32) -> Result<Option<Design>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, designer_id, title, description, image_url, price::text as price,
                  tags, created_at
           FROM designs
           WHERE id = $1"#,
    )
    .bind(design_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(design_from_row))
}

pub async fn insert_design(
    pool: &PgPool,
    designer_id: i32,
    title: &str,
    description: &str,
    image_url: &str,
    price: &str,
    tags: &[String],
) -> Result<Design, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO designs (designer_id, title, description, image_url, price, tags)
           VALUES ($1, $2, $3, $4, $5::numeric, $6)
           RETURNING id, designer_id, title, description, image_url, price::text as price,
                     tags, created_at"#,
    )
    .bind(designer_id)
    .bind(title)
    .bind(description)
    .bind(image_url)
    .bind(price)
    .bind(tags)
    .fetch_one(pool)
    .await?;

    Ok(design_from_row(&row))
}

/// Inserts a `paid` purchase for a verified payment.
///
/// Gateway callbacks are delivered at least once, so the insert races with
/// retries of itself. The unique index on `payment_id` makes the first
/// writer win; later calls get the original row back with `inserted = false`
/// and must not treat it as an error.
pub async fn record_paid_purchase(
    pool: &PgPool,
    buyer_id: i32,
    design_id: i32,
    payment_id: &str,
    order_id: &str,
    amount: i64,
    currency: &str,
) -> Result<(Purchase, bool), sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO purchases (buyer_id, design_id, payment_id, order_id, amount, currency, status)
           VALUES ($1, $2, $3, $4, $5, $6, 'paid')
           ON CONFLICT (payment_id) DO NOTHING
           RETURNING id, buyer_id, design_id, payment_id, order_id, amount, currency, status, created_at"#,
    )
    .bind(buyer_id)
    .bind(design_id)
    .bind(payment_id)
    .bind(order_id)
    .bind(amount)
    .bind(currency)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        return Ok((purchase_from_row(&row), true));
    }

    // Conflict: the payment was already recorded by an earlier delivery.
    let existing = find_purchase_by_payment_id(pool, payment_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok((existing, false))
}

pub async fn find_purchase_by_payment_id(
    pool: &PgPool,
    payment_id: &str,
) -> Result<Option<Purchase>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, buyer_id, design_id, payment_id, order_id, amount, currency, status, created_at
           FROM purchases
           WHERE payment_id = $1"#,
    )
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(purchase_from_row))
}

pub async fn list_purchases_for_buyer(
    pool: &PgPool,
    buyer_id: i32,
) -> Result<Vec<Purchase>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, buyer_id, design_id, payment_id, order_id, amount, currency, status, created_at
           FROM purchases
           WHERE buyer_id = $1
           ORDER BY created_at DESC"#,
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(purchase_from_row).collect())
}

/// Lifecycle guard: only a purchase still in `created` may move.
/// `paid` and `failed` are terminal, so a record transitions at most once.
pub async fn set_purchase_status(
    pool: &PgPool,
    purchase_id: i32,
    status: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE purchases
           SET status = $1
           WHERE id = $2 AND status = 'created'"#,
    )
    .bind(status)
    .bind(purchase_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
