use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub crm: CrmDefaults,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Application-wide CRM defaults. These replace the original per-model
/// class-level settings with one explicit struct handed to callers.
#[derive(Clone, Debug)]
pub struct CrmDefaults {
    pub per_page: i64,
    pub outline: &'static str,
    pub first_name_position: &'static str,
}

impl Default for CrmDefaults {
    fn default() -> Self {
        Self {
            per_page: 20,
            outline: "long",
            first_name_position: "before",
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://crm:@localhost:5432/crmserver".to_string());

        Self {
            server: ServerConfig { host, port },
            database_url,
            crm: CrmDefaults::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crm_defaults_match_documented_values() {
        let defaults = CrmDefaults::default();
        assert_eq!(defaults.per_page, 20);
        assert_eq!(defaults.outline, "long");
        assert_eq!(defaults.first_name_position, "before");
    }
}
