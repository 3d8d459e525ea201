use resilient_http::{ExecutorOptions, RateLimitPolicy, RequestExecutor, RequestSpec};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("RESILIENT_HTTP_BASE_URL")?;

    let executor = RequestExecutor::new().with_options(ExecutorOptions {
        timeout_ms: 5_000,
        max_retries: 2,
        base_delay_ms: 500,
        rate_limit: RateLimitPolicy::Unlimited,
    });

    let spec = RequestSpec::get(url).param("verbose", "1");
    match executor.try_execute(&spec).await {
        Ok(body) => println!("{body}"),
        Err(failure) => eprintln!("request failed: {failure}"),
    }

    Ok(())
}
