use anyhow::Context as _;

/// Selects the log line format; `json` suits log shippers that alert on the
/// composer's `outcome` field.
pub const LOG_FORMAT_ENV: &str = "PRESSFRONT_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unsupported log format: {other}"),
        }
    }

    fn from_env() -> anyhow::Result<Self> {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(Self::Text),
        }
    }
}

pub fn init() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("build log filter")?;
    let format = LogFormat::from_env().context("read log format")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
