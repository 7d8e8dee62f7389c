use imgflux_core::Config;

// Use mimalloc as the global allocator; decoded images churn through large buffers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = imgflux_api::setup::initialize_app(config.clone()).await?;

    imgflux_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
