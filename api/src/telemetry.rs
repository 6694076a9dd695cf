use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化 Tracing。預設 JSON 輸出；`LOG_FORMAT=pretty` 改為人類可讀格式
pub fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let pretty = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("pretty"))
        .unwrap_or(false);

    let registry = Registry::default().with(env_filter);
    if pretty {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init()?;
    }

    Ok(())
}
