use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ImpactError;

/// Top-level configuration loaded from `.lhimpact.toml`.
///
/// Supports layered resolution: CLI flags > env vars > config file > defaults.
/// The file only provides the lower layers; merging happens in the binary.
///
/// # Examples
///
/// ```
/// use lhimpact_core::ImpactConfig;
///
/// let config = ImpactConfig::default();
/// assert_eq!(config.commands.install, "npm install");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// GitHub credential settings.
    #[serde(default)]
    pub github: GithubConfig,
    /// Shell commands the pipeline runs in the project directory.
    #[serde(default)]
    pub commands: CommandConfig,
}

impl ImpactConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::Io`] if the file cannot be read, or
    /// [`ImpactError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lhimpact_core::ImpactConfig;
    /// use std::path::Path;
    ///
    /// let config = ImpactConfig::from_file(Path::new(".lhimpact.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, ImpactError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use lhimpact_core::ImpactConfig;
    ///
    /// let toml = r#"
    /// [commands]
    /// install = "pnpm install"
    /// "#;
    /// let config = ImpactConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.commands.install, "pnpm install");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ImpactError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// GitHub tokens used by the pipeline.
///
/// The primary `token` covers both uses; `gist_token` and `comment_token`
/// override it when gists and comments must be published under different
/// identities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Token used wherever a more specific one is not set.
    pub token: Option<String>,
    /// Token for gist creation and updates.
    pub gist_token: Option<String>,
    /// Token for pull-request comment creation and updates.
    pub comment_token: Option<String>,
}

impl GithubConfig {
    /// Resolve the effective credentials, failing fast on a missing or blank
    /// token so no network call is attempted with a bad credential.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::Config`] naming the credential that is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use lhimpact_core::GithubConfig;
    ///
    /// let github = GithubConfig {
    ///     token: Some("ghp_xxxx".into()),
    ///     gist_token: None,
    ///     comment_token: None,
    /// };
    /// let creds = github.credentials().unwrap();
    /// assert_eq!(creds.gist_token, "ghp_xxxx");
    /// assert_eq!(creds.comment_token, "ghp_xxxx");
    /// ```
    pub fn credentials(&self) -> Result<Credentials, ImpactError> {
        let gist_token = resolve_token(&self.gist_token, &self.token)
            .ok_or_else(|| missing_credential("gist token", "gist_token"))?;
        let comment_token = resolve_token(&self.comment_token, &self.token)
            .ok_or_else(|| missing_credential("comment token", "comment_token"))?;
        Ok(Credentials {
            gist_token,
            comment_token,
        })
    }
}

/// Validated, ready-to-use GitHub tokens.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Token for the gist store.
    pub gist_token: String,
    /// Token for the comment store.
    pub comment_token: String,
}

fn resolve_token(specific: &Option<String>, fallback: &Option<String>) -> Option<String> {
    [specific, fallback]
        .into_iter()
        .flatten()
        .map(|t| t.trim())
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

fn missing_credential(label: &str, key: &str) -> ImpactError {
    ImpactError::Config(format!(
        "GitHub {label} is missing or blank; pass --github-token, set GITHUB_TOKEN, \
         or set [github].{key} in .lhimpact.toml"
    ))
}

/// Shell commands run inside the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Dependency installation command, run after each checkout.
    #[serde(default = "default_install_command")]
    pub install: String,
    /// Command that produces a Lighthouse report.
    pub report: Option<String>,
    /// File the report command writes its JSON to; when unset, the command's
    /// stdout is parsed instead.
    pub report_path: Option<PathBuf>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            install: default_install_command(),
            report: None,
            report_path: None,
        }
    }
}

fn default_install_command() -> String {
    "npm install".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ImpactConfig::from_toml("").unwrap();
        assert_eq!(config.commands.install, "npm install");
        assert!(config.github.token.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let config = ImpactConfig::from_toml(
            r#"
            [github]
            token = "ghp_primary"
            gist_token = "ghp_gists"

            [commands]
            install = "yarn install"
            report = "node ./generate-report.mjs"
            report_path = "lighthouse-report.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.github.gist_token.as_deref(), Some("ghp_gists"));
        assert_eq!(config.commands.install, "yarn install");
        assert_eq!(
            config.commands.report_path.as_deref(),
            Some(Path::new("lighthouse-report.json"))
        );
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let err = ImpactConfig::from_toml("github = 3").unwrap_err();
        assert!(matches!(err, ImpactError::Toml(_)));
    }

    #[test]
    fn specific_token_wins_over_primary() {
        let github = GithubConfig {
            token: Some("primary".into()),
            gist_token: Some("gists".into()),
            comment_token: None,
        };
        let creds = github.credentials().unwrap();
        assert_eq!(creds.gist_token, "gists");
        assert_eq!(creds.comment_token, "primary");
    }

    #[test]
    fn blank_token_fails_naming_the_credential() {
        let github = GithubConfig {
            token: Some("   ".into()),
            gist_token: None,
            comment_token: Some("ok".into()),
        };
        let err = github.credentials().unwrap_err();
        assert!(err.to_string().contains("gist token"));
    }
}
