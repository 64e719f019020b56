use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub payment_api_url: String,
    pub payment_secret_key: String,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: i64,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let payment_api_url =
            env::var("PAYMENT_API_URL").unwrap_or_else(|_| "https://api.stripe.com".to_string());
        let payment_secret_key = env::var("PAYMENT_SECRET_KEY")?;
        let webhook_secret = env::var("PAYMENT_WEBHOOK_SECRET")?;
        let webhook_tolerance_secs = env::var("PAYMENT_WEBHOOK_TOLERANCE_SECS")
            .ok()
            .and_then(|t| t.parse::<i64>().ok())
            .unwrap_or(300);
        let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            payment_api_url,
            payment_secret_key,
            webhook_secret,
            webhook_tolerance_secs,
            currency,
        })
    }
}
