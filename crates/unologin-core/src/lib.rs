use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "unologin.toml";
pub const DEFAULT_LOGIN_PATH: &str = "/unologin/login";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("environment variable {0} is not set")]
    EnvVarNotFound(String),
    #[error("environment variable {0} is empty")]
    EnvVarEmpty(String),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Provider endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    pub api_url: String,
    pub frontend_url: String,
}

impl Default for Realm {
    fn default() -> Self {
        Self {
            api_url: "https://v1.unolog.in".to_string(),
            frontend_url: "https://login.unolog.in".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

/// Attributes shared by both login cookies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

/// Local verification material. Exactly one key source must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySettings {
    /// HMAC secret. Accepts `env:VAR_NAME`.
    pub secret: Option<String>,
    /// PEM encoded public key (RSA, EC or Ed25519).
    pub public_key_pem: Option<String>,
    /// Path to a PEM encoded public key.
    pub public_key_file: Option<PathBuf>,
    /// JWKS endpoint.
    pub jwks_url: Option<String>,
    /// Allowed algorithm names, e.g. `RS256`.
    pub algorithms: Vec<String>,
    pub leeway_seconds: u64,
    pub max_jwks_age_seconds: u64,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            secret: None,
            public_key_pem: None,
            public_key_file: None,
            jwks_url: None,
            algorithms: vec!["RS256".to_string(), "ES256".to_string(), "EdDSA".to_string()],
            leeway_seconds: 0,
            max_jwks_age_seconds: 300,
        }
    }
}

impl KeySettings {
    /// The PEM public key: inline `public_key_pem`, else the contents of
    /// `public_key_file`, else `None`.
    pub fn load_public_key_pem(&self) -> Result<Option<String>, ConfigError> {
        if let Some(pem) = &self.public_key_pem {
            return Ok(Some(pem.clone()));
        }
        match &self.public_key_file {
            Some(file) => fs::read_to_string(file)
                .map(Some)
                .map_err(|source| ConfigError::Read {
                    path: file.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn source_count(&self) -> usize {
        [
            self.secret.is_some(),
            self.public_key_pem.is_some(),
            self.public_key_file.is_some(),
            self.jwks_url.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// How login tokens are verified.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VerificationMode {
    /// Ask the provider's API for every token.
    #[default]
    Provider,
    /// Check the signature locally.
    Key(KeySettings),
}

/// Process-wide configuration. Built once, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnologinConfig {
    pub api_key: String,
    pub cookies_domain: Option<String>,
    pub realm: Realm,
    pub app_id: Option<String>,
    pub login_path: String,
    pub request_timeout_ms: u64,
    pub cookies: CookieSettings,
    pub verification: VerificationMode,
}

impl UnologinConfig {
    pub fn new(api_key: impl Into<String>, realm: Realm) -> Self {
        Self {
            api_key: api_key.into(),
            cookies_domain: None,
            realm,
            app_id: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            cookies: CookieSettings::default(),
            verification: VerificationMode::Provider,
        }
    }

    #[must_use]
    pub fn with_cookies_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookies_domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_verification(mut self, verification: VerificationMode) -> Self {
        self.verification = verification;
        self
    }

    /// The app this deployment belongs to: the explicit `app_id`, else the
    /// `appId` claim embedded in the API key.
    pub fn app_id(&self) -> Option<String> {
        self.app_id
            .clone()
            .or_else(|| app_id_from_api_key(&self.api_key))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Validation("api_key is empty".to_string()));
        }
        for (name, url) in [
            ("realm.api_url", &self.realm.api_url),
            ("realm.frontend_url", &self.realm.frontend_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        if !self.login_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "login_path must start with '/', got {:?}",
                self.login_path
            )));
        }
        if !self.cookies.path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "cookies.path must start with '/', got {:?}",
                self.cookies.path
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if let VerificationMode::Key(key) = &self.verification {
            match key.source_count() {
                1 => {}
                0 => {
                    return Err(ConfigError::Validation(
                        "verification mode \"key\" needs one of secret, public_key_pem, public_key_file, jwks_url"
                            .to_string(),
                    ));
                }
                _ => {
                    return Err(ConfigError::Validation(
                        "verification mode \"key\" takes exactly one key source".to_string(),
                    ));
                }
            }
            if key.algorithms.is_empty() {
                return Err(ConfigError::Validation(
                    "verification.algorithms is empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    api_key: String,
    cookies_domain: Option<String>,
    #[serde(default)]
    realm: Realm,
    app_id: Option<String>,
    login_path: Option<String>,
    request_timeout_ms: Option<u64>,
    #[serde(default)]
    cookies: CookieSettings,
    #[serde(default)]
    verification: VerificationMode,
}

/// Resolve `env:VAR_NAME` references, passing other values through.
pub fn resolve_secret(value: &str) -> Result<String, ConfigError> {
    match value.strip_prefix("env:") {
        Some(var_name) => match std::env::var(var_name) {
            Ok(secret) if !secret.is_empty() => Ok(secret),
            Ok(_) => Err(ConfigError::EnvVarEmpty(var_name.to_string())),
            Err(_) => Err(ConfigError::EnvVarNotFound(var_name.to_string())),
        },
        None => Ok(value.to_string()),
    }
}

pub fn default_config_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config").join("unologin")
    } else {
        PathBuf::from(".unologin")
    }
}

pub fn load_config_from_dir(dir: &Path) -> Result<UnologinConfig, ConfigError> {
    load_config_from_file(&dir.join(CONFIG_FILE_NAME))
}

pub fn load_config_from_file(path: &Path) -> Result<UnologinConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_relative_to(&content, path.parent()).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// Parse and validate a TOML document, resolving `env:` references.
///
/// A relative `public_key_file` is read from the working directory.
pub fn parse_config(content: &str) -> Result<UnologinConfig, ConfigError> {
    parse_config_relative_to(content, None)
}

fn parse_config_relative_to(
    content: &str,
    base_dir: Option<&Path>,
) -> Result<UnologinConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: PathBuf::from("<inline>"),
        message: e.to_string(),
    })?;

    let verification = match raw.verification {
        VerificationMode::Key(mut key) => {
            if let Some(secret) = &key.secret {
                key.secret = Some(resolve_secret(secret)?);
            }
            if let Some(base) = base_dir {
                key.public_key_file = key
                    .public_key_file
                    .map(|file| if file.is_relative() { base.join(file) } else { file });
            }
            if key.public_key_file.is_some() && key.public_key_pem.is_none() {
                key.public_key_pem = key.load_public_key_pem()?;
                key.public_key_file = None;
            }
            VerificationMode::Key(key)
        }
        VerificationMode::Provider => VerificationMode::Provider,
    };

    let config = UnologinConfig {
        api_key: resolve_secret(&raw.api_key)?,
        cookies_domain: raw.cookies_domain.filter(|d| !d.trim().is_empty()),
        realm: raw.realm,
        app_id: raw.app_id,
        login_path: raw
            .login_path
            .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
        request_timeout_ms: raw
            .request_timeout_ms
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        cookies: raw.cookies,
        verification,
    };
    config.validate()?;
    Ok(config)
}

/// Write the commented example config to `path`, creating parent
/// directories. An existing file is kept unless `force` is set.
pub fn write_default_config_file(path: &Path, force: bool) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    if force || !path.exists() {
        fs::write(
            path,
            include_str!("../../../docs/unologin/unologin.toml.example"),
        )
        .map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Read the `appId` claim out of an API key without checking its signature.
///
/// API keys are JWTs signed by the provider; only the provider can verify
/// them, but the app id they carry is needed locally.
pub fn app_id_from_api_key(api_key: &str) -> Option<String> {
    let mut parts = api_key.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims
        .get("appId")
        .and_then(|v| v.as_str())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_segment(value: &serde_json::Value) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(r#"api_key = "abc123""#).unwrap();
        assert_eq!(cfg.login_path, DEFAULT_LOGIN_PATH);
        assert_eq!(cfg.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(cfg.realm, Realm::default());
        assert_eq!(cfg.verification, VerificationMode::Provider);
        assert!(cfg.cookies.secure);
        assert_eq!(cfg.cookies.same_site, SameSite::Lax);
    }

    #[test]
    fn full_config_parses() {
        let cfg = parse_config(
            r#"
api_key = "abc123"
cookies_domain = ".example.com"
login_path = "/auth/callback"
request_timeout_ms = 2500

[realm]
api_url = "https://mock-api.unolog.in"
frontend_url = "https://mock-frontend.unolog.in"

[cookies]
same_site = "strict"

[verification]
mode = "key"
secret = "s3cret"
algorithms = ["HS256"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.cookies_domain.as_deref(), Some(".example.com"));
        assert_eq!(cfg.login_path, "/auth/callback");
        assert_eq!(cfg.request_timeout_ms, 2500);
        assert_eq!(cfg.realm.api_url, "https://mock-api.unolog.in");
        assert_eq!(cfg.cookies.same_site, SameSite::Strict);
        assert_eq!(cfg.cookies.path, "/");
        match cfg.verification {
            VerificationMode::Key(key) => {
                assert_eq!(key.secret.as_deref(), Some("s3cret"));
                assert_eq!(key.algorithms, vec!["HS256".to_string()]);
                assert_eq!(key.max_jwks_age_seconds, 300);
            }
            VerificationMode::Provider => panic!("expected key mode"),
        }
    }

    #[test]
    fn env_reference_must_resolve() {
        let err = parse_config(r#"api_key = "env:UNOLOGIN_TEST_SURELY_UNSET_VAR""#).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "UNOLOGIN_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse_config(r#"api_key = """#),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config(
                r#"
api_key = "k"
[realm]
api_url = "ftp://nope"
frontend_url = "https://ok"
"#
            ),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config("api_key = \"k\"\nlogin_path = \"login\""),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config("api_key = \"k\"\n[verification]\nmode = \"key\""),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config(
                "api_key = \"k\"\n[verification]\nmode = \"key\"\nsecret = \"a\"\njwks_url = \"https://x\""
            ),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config("api_key = 1"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn app_id_from_key_claims() {
        let key = format!(
            "{}.{}.sig",
            encode_segment(&serde_json::json!({"alg": "HS256"})),
            encode_segment(&serde_json::json!({"appId": "app-42"}))
        );
        assert_eq!(app_id_from_api_key(&key).as_deref(), Some("app-42"));
        assert_eq!(app_id_from_api_key("abc123"), None);

        let mut cfg = UnologinConfig::new(key, Realm::default());
        assert_eq!(cfg.app_id().as_deref(), Some("app-42"));
        cfg.app_id = Some("explicit".to_string());
        assert_eq!(cfg.app_id().as_deref(), Some("explicit"));
    }

    #[test]
    fn default_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        write_default_config_file(&path, false).unwrap();

        fs::write(&path, "api_key = \"kept\"").unwrap();
        write_default_config_file(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "api_key = \"kept\"");

        write_default_config_file(&path, true).unwrap();
        // The example references an env var for the key, so swap it out.
        let content = fs::read_to_string(&path)
            .unwrap()
            .replace("env:UNOLOGIN_API_KEY", "abc123");
        let cfg = parse_config(&content).unwrap();
        assert_eq!(cfg.api_key, "abc123");
    }

    #[test]
    fn relative_public_key_file_is_read_next_to_the_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("keys")).unwrap();
        fs::write(dir.path().join("keys").join("login.pem"), "PEM CONTENT").unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "api_key = \"k\"\n[verification]\nmode = \"key\"\npublic_key_file = \"keys/login.pem\"\n",
        )
        .unwrap();

        let cfg = load_config_from_file(&path).unwrap();
        match cfg.verification {
            VerificationMode::Key(key) => {
                assert_eq!(key.public_key_pem.as_deref(), Some("PEM CONTENT"));
                assert_eq!(key.public_key_file, None);
            }
            VerificationMode::Provider => panic!("expected key mode"),
        }
    }

    #[test]
    fn public_key_pem_prefers_inline_then_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("login.pem");
        fs::write(&file, "FROM FILE").unwrap();

        let mut key = KeySettings {
            public_key_file: Some(file),
            ..KeySettings::default()
        };
        assert_eq!(key.load_public_key_pem().unwrap().as_deref(), Some("FROM FILE"));

        key.public_key_pem = Some("INLINE".to_string());
        assert_eq!(key.load_public_key_pem().unwrap().as_deref(), Some("INLINE"));

        key.public_key_pem = None;
        key.public_key_file = Some(dir.path().join("missing.pem"));
        assert!(matches!(key.load_public_key_pem(), Err(ConfigError::Read { .. })));

        assert_eq!(KeySettings::default().load_public_key_pem().unwrap(), None);
    }
}
