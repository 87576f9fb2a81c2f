use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub ytmusic_access_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            spotify_client_id: std::env::var("SPOTIFY_CLIENT_ID").unwrap_or_default(),
            spotify_client_secret: std::env::var("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
            ytmusic_access_token: std::env::var("YTMUSIC_ACCESS_TOKEN").unwrap_or_default(),
        }
    }

    pub fn missing_spotify_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.spotify_client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID".to_string());
        }
        if self.spotify_client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET".to_string());
        }

        missing
    }

    pub fn missing_ytmusic_config(&self) -> Vec<String> {
        if self.ytmusic_access_token.is_empty() {
            vec!["YTMUSIC_ACCESS_TOKEN".to_string()]
        } else {
            Vec::new()
        }
    }

    pub fn spotify_credentials(&self) -> HashMap<String, String> {
        HashMap::from([
            ("client_id".to_string(), self.spotify_client_id.clone()),
            ("client_secret".to_string(), self.spotify_client_secret.clone()),
        ])
    }

    pub fn ytmusic_credentials(&self) -> HashMap<String, String> {
        HashMap::from([(
            "access_token".to_string(),
            self.ytmusic_access_token.clone(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_reports_empty_keys() {
        let config = Config {
            spotify_client_id: "id".to_string(),
            spotify_client_secret: String::new(),
            ytmusic_access_token: String::new(),
        };

        assert_eq!(config.missing_spotify_config(), vec!["SPOTIFY_CLIENT_SECRET"]);
        assert_eq!(config.missing_ytmusic_config(), vec!["YTMUSIC_ACCESS_TOKEN"]);
    }

    #[test]
    fn test_credentials_maps() {
        let config = Config {
            spotify_client_id: "id".to_string(),
            spotify_client_secret: "secret".to_string(),
            ytmusic_access_token: "token".to_string(),
        };

        assert_eq!(config.spotify_credentials()["client_id"], "id");
        assert_eq!(config.ytmusic_credentials()["access_token"], "token");
    }
}
