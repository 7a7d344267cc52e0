use colserv::config::env_or;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    colserv::logging::init();
    dotenvy::dotenv().ok();

    colserv::instance::run(
        "customers",
        vec![
            (
                "accounts".to_string(),
                env_or("ACCOUNTS_SERVICE_URL", "http://accounts-service"),
            ),
            (
                "contacts".to_string(),
                env_or("CONTACTS_SERVICE_URL", "http://contacts-service"),
            ),
        ],
    )
    .await?;

    Ok(())
}
