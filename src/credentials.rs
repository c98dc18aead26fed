// Import necessary crates and modules
use crate::error::{Result, RubricError};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use keyring::Entry;
use serde::{Deserialize, Serialize};

/// Environment variable holding the backend base URL.
pub const ENV_URL: &str = "RUBROS_API_URL";
/// Environment variable holding the authentication token.
pub const ENV_TOKEN: &str = "RUBROS_API_TOKEN";

const KEYRING_URL: &str = "URL_API";
const KEYRING_TOKEN: &str = "TOKEN_API";

/// Structure to hold the backend credentials.
///
/// Fields:
/// - `url_api`: Base URL of the school-administration API.
/// - `token_api`: Token sent with every request.
///
/// Example usage:
/// ```
/// let credentials = rubros_connector::ApiCredentials {
///     url_api: "https://school.example.com/api".to_string(),
///     token_api: "your_api_token".to_string(),
/// };
/// assert!(credentials.has_token());
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ApiCredentials {
    pub url_api: String,
    pub token_api: String,
}

// Source the credentials were loaded from.
enum CredentialSource {
    None,
    EnvVariables(ApiCredentials),
    SystemKeyring(ApiCredentials),
}

impl ApiCredentials {
    /// True when a non-blank token is available.
    pub fn has_token(&self) -> bool {
        !self.token_api.trim().is_empty()
    }

    /// Loads the credentials from `RUBROS_API_URL` and `RUBROS_API_TOKEN`.
    ///
    /// Only available with the `use_env_credentials` feature; otherwise always fails.
    pub fn load_credentials_from_env() -> std::result::Result<ApiCredentials, String> {
        #[cfg(not(feature = "use_env_credentials"))]
        {
            return Err("Feature not enabled".to_string());
        }

        #[cfg(feature = "use_env_credentials")]
        {
            let url = std::env::var(ENV_URL)
                .map_err(|_| "Error retrieving URL from environment".to_string())?;
            let token = std::env::var(ENV_TOKEN)
                .map_err(|_| "Error retrieving token from environment".to_string())?;
            log::info!("Credentials loaded from environment -> {}", url);
            Ok(ApiCredentials {
                url_api: url,
                token_api: token,
            })
        }
    }

    /// Loads the credentials from the system's keyring.
    ///
    /// Returns:
    /// - `Ok(ApiCredentials)`: both entries were found.
    /// - `Err(String)`: the keyring is unavailable or an entry is missing.
    pub fn load_credentials_from_system() -> std::result::Result<ApiCredentials, String> {
        let app_name = env!("CARGO_PKG_NAME");
        let url = Entry::new(app_name, KEYRING_URL)
            .and_then(|entry| entry.get_password())
            .map_err(|_| "Error retrieving URL from system".to_string())?;
        let token = Entry::new(app_name, KEYRING_TOKEN)
            .and_then(|entry| entry.get_password())
            .map_err(|_| "Error retrieving token from system".to_string())?;
        Ok(ApiCredentials {
            url_api: url,
            token_api: token,
        })
    }

    /// Stores both values in the system's keyring.
    pub fn store_in_system(&self) -> Result<()> {
        let app_name = env!("CARGO_PKG_NAME");
        Entry::new(app_name, KEYRING_URL)
            .and_then(|entry| entry.set_password(&self.url_api))
            .map_err(|e| RubricError::Credentials(format!("Error saving URL: {}", e)))?;
        Entry::new(app_name, KEYRING_TOKEN)
            .and_then(|entry| entry.set_password(&self.token_api))
            .map_err(|e| RubricError::Credentials(format!("Error saving token: {}", e)))?;
        Ok(())
    }

    // Environment first, then keyring.
    fn load_credentials() -> CredentialSource {
        match Self::load_credentials_from_env() {
            Ok(credentials) => CredentialSource::EnvVariables(credentials),
            Err(_) => match Self::load_credentials_from_system() {
                Ok(credentials) => CredentialSource::SystemKeyring(credentials),
                Err(_) => CredentialSource::None,
            },
        }
    }

    /// Asks the user for the URL and token, then stores them in the keyring.
    fn prompt_system_credentials() -> Result<ApiCredentials> {
        let theme = ColorfulTheme::default();
        let url = Input::<String>::with_theme(&theme)
            .with_prompt("API URL")
            .interact_text()
            .map_err(|e| RubricError::Credentials(e.to_string()))?;
        let token = Password::with_theme(&theme)
            .with_prompt("API token")
            .interact()
            .map_err(|e| RubricError::Credentials(e.to_string()))?;

        let credentials = ApiCredentials {
            url_api: url.trim().to_string(),
            token_api: token.trim().to_string(),
        };
        credentials.store_in_system()?;
        Ok(credentials)
    }

    /// Retrieves the credentials, prompting the user when none are stored.
    ///
    /// Returns `RubricError::AuthorizationMissing` when the resulting token is blank.
    pub fn credentials() -> Result<ApiCredentials> {
        let credentials = match Self::load_credentials() {
            CredentialSource::EnvVariables(credentials)
            | CredentialSource::SystemKeyring(credentials) => credentials,
            CredentialSource::None => Self::prompt_system_credentials()?,
        };
        if credentials.has_token() {
            Ok(credentials)
        } else {
            Err(RubricError::AuthorizationMissing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_credentials_initialization() {
        let credentials = ApiCredentials {
            url_api: String::from("https://example.com"),
            token_api: String::from("secret-token"),
        };

        assert_eq!(credentials.url_api, "https://example.com");
        assert_eq!(credentials.token_api, "secret-token");
        assert!(credentials.has_token());
    }

    #[test]
    fn test_blank_token_is_not_a_token() {
        let credentials = ApiCredentials {
            url_api: String::from("https://example.com"),
            token_api: String::from("   "),
        };
        assert!(!credentials.has_token());
        assert!(!ApiCredentials::default().has_token());
    }

    #[test]
    #[cfg(not(feature = "use_env_credentials"))]
    fn test_env_loading_requires_feature() {
        assert_eq!(
            ApiCredentials::load_credentials_from_env(),
            Err("Feature not enabled".to_string())
        );
    }

    #[test]
    #[cfg(feature = "use_env_credentials")]
    fn test_load_credentials_from_env() {
        use std::collections::HashMap;
        use std::env;

        let mut map: HashMap<String, String> = HashMap::new();
        fn set_new_key(map: &mut HashMap<String, String>, key: &str, value: &str) {
            if let Ok(value) = env::var(key) {
                map.insert(key.to_string(), value);
            }
            env::set_var(key, value);
        }

        fn restore_key(map: &HashMap<String, String>, key: &str) {
            if let Some(value) = map.get(key) {
                env::set_var(key, value);
            } else {
                env::remove_var(key);
            }
        }

        set_new_key(&mut map, ENV_URL, "https://example.com");
        set_new_key(&mut map, ENV_TOKEN, "secret-token");

        let both_credentials = ApiCredentials::load_credentials_from_env();

        env::remove_var(ENV_TOKEN);
        let only_url = ApiCredentials::load_credentials_from_env();

        env::remove_var(ENV_URL);
        env::set_var(ENV_TOKEN, "secret-token");
        let only_token = ApiCredentials::load_credentials_from_env();

        env::remove_var(ENV_TOKEN);
        let no_credentials = ApiCredentials::load_credentials_from_env();

        restore_key(&map, ENV_TOKEN);
        restore_key(&map, ENV_URL);

        assert_eq!(
            both_credentials,
            Ok(ApiCredentials {
                url_api: "https://example.com".to_string(),
                token_api: "secret-token".to_string(),
            })
        );
        assert!(only_url.is_err());
        assert!(only_token.is_err());
        assert!(no_credentials.is_err());
    }
}
