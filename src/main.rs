use webcall_lib::config::WebCallConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    webcall_lib::init_logging();

    // Page-URL aus dem ersten Argument überschreibt WEBCALL_PAGE_URL
    let mut config = WebCallConfig::from_env()?;
    if let Some(page_url) = std::env::args().nth(1) {
        config = config.with_page_url(&page_url)?;
    }

    webcall_lib::run(config).await
}
