use colserv::config::env_or;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    colserv::logging::init();
    dotenvy::dotenv().ok();

    colserv::instance::run(
        "accounts",
        vec![
            (
                "customers".to_string(),
                env_or("CUSTOMER_SERVICE_URL", "http://customer-service"),
            ),
            (
                "transactions".to_string(),
                env_or("TRANSACTIONS_SERVICE_URL", "http://transactions-service"),
            ),
        ],
    )
    .await?;

    Ok(())
}
