use crate::auth::credentials::{AuthError, CredentialsProvider};
use crate::fetch::types::Headers;

pub const HARVEST_ACCESS_TOKEN: &str = "HARVEST_ACCESS_TOKEN";
pub const HARVEST_ACCOUNT_ID: &str = "HARVEST_ACCOUNT_ID";
pub const BOB_ACCESS_TOKEN: &str = "BOB_ACCESS_TOKEN";
pub const PIPEDRIVE_ACCESS_TOKEN: &str = "PIPEDRIVE_ACCESS_TOKEN";
pub const FORECAST_ACCOUNT_ID: &str = "FORECAST_ACCOUNT_ID";
pub const FORECAST_ACCESS_TOKEN: &str = "FORECAST_ACCESS_TOKEN";

const USER_AGENT: &str = concat!("pipeline-tools/", env!("CARGO_PKG_VERSION"));

fn headers<const N: usize>(pairs: [(&str, String); N]) -> Headers {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Headers for the Harvest v2 API
pub async fn harvest_headers<P: CredentialsProvider + ?Sized>(
    provider: &P,
    service: &str,
) -> Result<Headers, AuthError> {
    let token = provider.secret(HARVEST_ACCESS_TOKEN).await?;
    let account_id = provider.secret(HARVEST_ACCOUNT_ID).await?;
    Ok(headers([
        ("Authorization", format!("Bearer {}", token)),
        ("Harvest-Account-ID", account_id),
        ("service", service.to_string()),
        ("Content-Type", "application/json".to_string()),
    ]))
}

/// Headers for the Hibob API; the token is sent without a scheme
pub async fn hibob_headers<P: CredentialsProvider + ?Sized>(
    provider: &P,
    service: &str,
) -> Result<Headers, AuthError> {
    let token = provider.secret(BOB_ACCESS_TOKEN).await?;
    Ok(headers([
        ("accept", "application/json".to_string()),
        ("Authorization", token),
        ("service", service.to_string()),
    ]))
}

/// Pipedrive authenticates with an `api_token` query parameter rather than headers
pub async fn pipedrive_access_token<P: CredentialsProvider + ?Sized>(provider: &P) -> Result<String, AuthError> {
    provider.secret(PIPEDRIVE_ACCESS_TOKEN).await
}

/// Headers for the Forecast API
pub async fn forecast_headers<P: CredentialsProvider + ?Sized>(provider: &P) -> Result<Headers, AuthError> {
    let token = provider.secret(FORECAST_ACCESS_TOKEN).await?;
    let account_id = provider.secret(FORECAST_ACCOUNT_ID).await?;
    Ok(headers([
        ("Authorization", format!("Bearer {}", token)),
        ("Forecast-Account-ID", account_id),
        ("User-Agent", USER_AGENT.to_string()),
    ]))
}
