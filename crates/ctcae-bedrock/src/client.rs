use aws_sdk_bedrockruntime::Client;

/// Load the default AWS config chain pinned to `region`.
pub async fn build_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await
}

/// Build a Bedrock Runtime client with a specific region.
pub async fn build_client(region: &str) -> Client {
    let config = build_config(region).await;
    Client::new(&config)
}
