use colserv::config::env_or;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    colserv::logging::init();
    dotenvy::dotenv().ok();

    colserv::instance::run(
        "contacts",
        vec![(
            "customers".to_string(),
            env_or("CUSTOMER_SERVICE_URL", "http://customer-service"),
        )],
    )
    .await?;

    Ok(())
}
