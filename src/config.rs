use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub upload_dir: String,
    pub cors_origins: Vec<String>,
    pub cloudinary: Option<CloudinaryConfig>,
}

/// Unsigned-upload credentials for the cloud image store.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub folder: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let cors_origins = parse_origins(env::var("CORS_ORIGINS").ok().as_deref());

        let cloudinary = match (
            env::var("CLOUDINARY_CLOUD_NAME").ok().filter(|v| !v.is_empty()),
            env::var("CLOUDINARY_UPLOAD_PRESET").ok().filter(|v| !v.is_empty()),
        ) {
            (Some(cloud_name), Some(upload_preset)) => Some(CloudinaryConfig {
                cloud_name,
                upload_preset,
                folder: env::var("CLOUDINARY_FOLDER")
                    .unwrap_or_else(|_| "toko-oleh-oleh".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours,
            upload_dir,
            cors_origins,
            cloudinary,
        })
    }
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::parse_origins;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        let origins = parse_origins(Some(" http://localhost:3001, ,https://toko.id "));
        assert_eq!(origins, vec!["http://localhost:3001", "https://toko.id"]);
    }

    #[test]
    fn missing_origins_means_none_configured() {
        assert!(parse_origins(None).is_empty());
    }
}
