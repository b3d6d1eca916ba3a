use crate::hub::outbox::OverflowPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bbb_url: String,
    pub bbb_secret: String,
    pub outbox_capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        let bbb_url =
            std::env::var("CONCLAVE_BBB_URL").expect("CONCLAVE_BBB_URL is required");
        let bbb_secret =
            std::env::var("CONCLAVE_BBB_SECRET").expect("CONCLAVE_BBB_SECRET is required");

        let overflow = match std::env::var("CONCLAVE_OVERFLOW_POLICY")
            .unwrap_or_else(|_| "drop-new".to_string())
            .to_lowercase()
            .as_str()
        {
            "drop-oldest" => OverflowPolicy::DropOldest,
            _ => OverflowPolicy::DropNew,
        };

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(39100),
            bbb_url,
            bbb_secret,
            outbox_capacity: std::env::var("CONCLAVE_OUTBOX_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
            overflow,
        }
    }
}
