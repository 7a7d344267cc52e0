use colserv::config::env_or;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    colserv::logging::init();
    dotenvy::dotenv().ok();

    colserv::instance::run(
        "transactions",
        vec![(
            "accounts".to_string(),
            env_or("ACCOUNTS_SERVICE_URL", "http://accounts-service"),
        )],
    )
    .await?;

    Ok(())
}
