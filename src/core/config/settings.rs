use super::parsing::{
    env_optional, env_or_default, normalize_host, parse_bool, parse_cors_origins,
    parse_environment, parse_u64,
};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, ProbeSettings, RuntimeSettings, S3Settings,
    ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("ASSIGNMENTS_HOST", "0.0.0.0");
        let port = env_or_default("ASSIGNMENTS_PORT", "8000");

        let environment = parse_environment(
            env_optional("ASSIGNMENTS_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("ASSIGNMENTS_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Assignments API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");
        let public_base_url = env_or_default("PUBLIC_BASE_URL", "http://localhost:8000")
            .trim_end_matches('/')
            .to_string();

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://s3.amazonaws.com");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "assignments-storage");
        let s3_region = env_or_default("S3_REGION", "us-west-1");

        let interactivities_host =
            normalize_host(env_or_default("INTERACTIVITIES_HOST", "www.interactivities.ws"));
        let repository_host =
            normalize_host(env_or_default("PROBLEM_REPOSITORY_HOST", "codecheck.it"));
        let probe_timeout_seconds =
            parse_u64("PROBE_TIMEOUT_SECONDS", env_or_default("PROBE_TIMEOUT_SECONDS", "10"))?;

        let log_level = env_or_default("ASSIGNMENTS_LOG_LEVEL", "info");
        let json =
            env_optional("ASSIGNMENTS_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str, public_base_url },
            cors: CorsSettings { origins: cors_origins },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            probe: ProbeSettings {
                interactivities_host,
                repository_host,
                timeout_seconds: probe_timeout_seconds,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn probe(&self) -> &ProbeSettings {
        &self.probe
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.public_base_url.starts_with("http://")
            && !self.api.public_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "PUBLIC_BASE_URL",
                value: self.api.public_base_url.clone(),
            });
        }

        if self.probe.interactivities_host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "INTERACTIVITIES_HOST",
                value: String::from("<empty>"),
            });
        }

        if self.probe.repository_host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "PROBLEM_REPOSITORY_HOST",
                value: String::from("<empty>"),
            });
        }

        if self.probe.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "PROBE_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if !self.s3.has_credentials() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }

        Ok(())
    }
}
