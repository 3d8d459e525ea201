use resilient_http::{
    CacheOptions, ExecutorOptions, FallbackCoordinator, RateLimitPolicy, RequestExecutor,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("RESILIENT_HTTP_BASE_URL")?;

    let executor = RequestExecutor::new().with_options(ExecutorOptions {
        timeout_ms: 5_000,
        max_retries: 1,
        base_delay_ms: 250,
        rate_limit: RateLimitPolicy::Unlimited,
    });
    let api = FallbackCoordinator::new(executor).with_cache_options(CacheOptions {
        max_entries: Some(64),
        ttl_ms: Some(30_000),
    });

    api.set_fallback_data(url.clone(), json!({ "status": "offline", "items": [] }));

    let first = api.get_with_cache(url.clone(), (), ()).await;
    println!("first:  {first}");

    let second = api.get_with_cache(url, (), ()).await;
    println!("second (cached): {second}");

    let unreachable = "http://127.0.0.1:1/items";
    api.set_fallback_data(unreachable, json!({ "status": "offline", "items": [] }));
    let degraded = api.get_with_cache(unreachable, (), ()).await;
    println!("degraded: {degraded}");

    Ok(())
}
