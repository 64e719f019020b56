use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use storefront_checkout_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    seed_catalog(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products: Vec<(&str, &str, Vec<(&str, Decimal, i32)>)> = vec![
        (
            "Classic Tee",
            "Everyday cotton t-shirt",
            vec![("black", dec!(29.90), 120), ("white", dec!(29.90), 80)],
        ),
        (
            "Denim Jacket",
            "Heavyweight denim jacket",
            vec![("indigo", dec!(119.00), 35)],
        ),
        (
            "Canvas Sneakers",
            "Low-top canvas sneakers",
            vec![("offwhite", dec!(64.50), 60), ("navy", dec!(64.50), 45)],
        ),
    ];

    for (name, description, variants) in products {
        let product_id: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(pool)
        .await?;

        for (color, price, stock) in variants {
            sqlx::query(
                r#"
                INSERT INTO product_variants (id, product_id, color, price, stock, sizes)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id.0)
            .bind(color)
            .bind(price)
            .bind(stock)
            .bind(serde_json::json!(["S", "M", "L", "XL"]))
            .execute(pool)
            .await?;
        }
        println!("Seeded product {name}");
    }

    Ok(())
}
