use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

const DEFAULT_TARGET_BUCKET: &str = "doordash-target-demo-1";
const DEFAULT_SNS_TOPIC_ARN: &str = "arn:aws:sns:ap-south-1:674938244258:doordash-raw-data";

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Config {
    pub target_bucket: String,
    pub sns_topic_arn: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_bucket: DEFAULT_TARGET_BUCKET.to_string(),
            sns_topic_arn: DEFAULT_SNS_TOPIC_ARN.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["TARGET_BUCKET", "SNS_TOPIC_ARN"]))
            .extract()?;

        if config.target_bucket.is_empty() {
            return Err(figment::Error::from("TARGET_BUCKET must not be empty".to_string()));
        }
        if config.sns_topic_arn.is_empty() {
            return Err(figment::Error::from("SNS_TOPIC_ARN must not be empty".to_string()));
        }

        Ok(config)
    }
}
