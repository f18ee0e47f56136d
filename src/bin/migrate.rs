use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;

    let applied = run_migrations(&orm).await?;
    if applied.is_empty() {
        println!("Schema is up to date");
    }
    for name in applied {
        println!("Applied {name}");
    }
    Ok(())
}
