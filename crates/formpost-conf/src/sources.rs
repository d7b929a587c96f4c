//! Loading settings from TOML and the environment

use crate::settings::{EmailBackendKind, Settings, SmtpSecurityKind};
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Environment variables overriding file settings.
pub const ENV_SMTP_HOST: &str = "FORMPOST_SMTP_HOST";
pub const ENV_SMTP_PORT: &str = "FORMPOST_SMTP_PORT";
pub const ENV_SMTP_USERNAME: &str = "FORMPOST_SMTP_USERNAME";
pub const ENV_SMTP_PASSWORD: &str = "FORMPOST_SMTP_PASSWORD";
pub const ENV_SMTP_SECURITY: &str = "FORMPOST_SMTP_SECURITY";
pub const ENV_EMAIL_BACKEND: &str = "FORMPOST_EMAIL_BACKEND";
pub const ENV_FROM_EMAIL: &str = "FORMPOST_FROM_EMAIL";
pub const ENV_BIND: &str = "FORMPOST_BIND";

impl Settings {
	/// Parse settings from TOML text.
	///
	/// # Examples
	///
	/// ```
	/// use formpost_conf::Settings;
	///
	/// let settings = Settings::from_toml_str(r#"
	///     [email]
	///     host = "smtp.example.com"
	///
	///     [[forms]]
	///     path = "/register"
	///     recipients = [{ email = "office@example.com", name = "Office" }]
	/// "#).unwrap();
	///
	/// assert_eq!(settings.email.port, 587);
	/// assert_eq!(settings.forms[0].reply_to_field, "person-email");
	/// ```
	pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
		Ok(toml::from_str(content)?)
	}

	/// Read and parse a TOML settings file.
	pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
		let path = path.as_ref();
		let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.display().to_string(),
			source,
		})?;
		let mut settings = Self::from_toml_str(&content)?;
		settings.resolve_relative_paths(path.parent().unwrap_or(Path::new(".")));
		Ok(settings)
	}

	/// Read the file, apply environment overrides and validate.
	pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
		let mut settings = Self::from_file(path)?;
		settings.apply_env_overrides()?;
		settings.validate()?;
		Ok(settings)
	}

	/// Apply `FORMPOST_*` overrides from the process environment.
	pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
		self.apply_overrides_from(|key| std::env::var(key).ok())
	}

	/// Apply overrides using `lookup` to read variables.
	pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(host) = lookup(ENV_SMTP_HOST) {
			self.email.host = host;
		}
		if let Some(port) = lookup(ENV_SMTP_PORT) {
			self.email.port = port.trim().parse().map_err(|_| {
				ConfigError::Invalid(format!("{ENV_SMTP_PORT} is not a port: {port}"))
			})?;
		}
		if let Some(username) = lookup(ENV_SMTP_USERNAME) {
			self.email.username = Some(username);
		}
		if let Some(password) = lookup(ENV_SMTP_PASSWORD) {
			self.email.password = Some(password);
		}
		if let Some(security) = lookup(ENV_SMTP_SECURITY) {
			self.email.security = match security.trim().to_lowercase().as_str() {
				"none" => SmtpSecurityKind::None,
				"starttls" => SmtpSecurityKind::StartTls,
				"tls" | "ssl" => SmtpSecurityKind::Tls,
				other => {
					return Err(ConfigError::Invalid(format!(
						"{ENV_SMTP_SECURITY} must be none, starttls or tls (got {other})"
					)));
				}
			};
		}
		if let Some(backend) = lookup(ENV_EMAIL_BACKEND) {
			self.email.backend = match backend.trim().to_lowercase().as_str() {
				"smtp" => EmailBackendKind::Smtp,
				"console" => EmailBackendKind::Console,
				"memory" => EmailBackendKind::Memory,
				other => {
					return Err(ConfigError::Invalid(format!(
						"{ENV_EMAIL_BACKEND} must be smtp, console or memory (got {other})"
					)));
				}
			};
		}
		if let Some(from) = lookup(ENV_FROM_EMAIL) {
			self.email.from_email = from;
		}
		if let Some(bind) = lookup(ENV_BIND) {
			self.server.bind = bind;
		}
		Ok(())
	}

	/// Check the settings for deployment defects.
	///
	/// Every endpoint needs a unique path starting with `/`, at least one
	/// recipient and a primary template source whose files exist.
	pub fn validate(&self) -> ConfigResult<()> {
		if self.email.from_email.trim().is_empty() {
			return Err(ConfigError::Invalid("email.from_email is empty".into()));
		}

		let mut seen = HashSet::new();
		for form in &self.forms {
			if !form.path.starts_with('/') {
				return Err(ConfigError::Invalid(format!(
					"form path must start with '/': {}",
					form.path
				)));
			}
			if !seen.insert(form.path.as_str()) {
				return Err(ConfigError::DuplicatePath(form.path.clone()));
			}
			if form.recipients.is_empty() {
				return Err(ConfigError::NoRecipients(form.path.clone()));
			}
			let ar_template = form.autoresponder.as_ref().and_then(|ar| ar.template.as_ref());
			if form.template.is_none() && ar_template.is_none() {
				return Err(ConfigError::MissingTemplate(format!(
					"{}: no template configured",
					form.path
				)));
			}
			for path in form.template_paths() {
				if !path.is_file() {
					return Err(ConfigError::MissingTemplate(path.display().to_string()));
				}
			}
			if let Some(uploads) = &form.uploads
				&& (uploads.max_files == 0 || uploads.max_file_size_mb <= 0.0)
			{
				return Err(ConfigError::Invalid(format!(
					"{}: upload limits must be positive",
					form.path
				)));
			}
		}
		tracing::debug!(forms = self.forms.len(), "settings validated");
		Ok(())
	}

	fn resolve_relative_paths(&mut self, base: &Path) {
		for form in &mut self.forms {
			if let Some(template) = form.template.as_mut()
				&& template.is_relative()
			{
				*template = base.join(&*template);
			}
			if let Some(template) = form
				.autoresponder
				.as_mut()
				.and_then(|ar| ar.template.as_mut())
				&& template.is_relative()
			{
				*template = base.join(&*template);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| map.get(key).cloned()
	}

	#[rstest]
	fn test_env_overrides_replace_file_values() {
		// Arrange
		let mut settings = Settings::default();
		let lookup = lookup_from(&[
			(ENV_SMTP_HOST, "mail.example.org"),
			(ENV_SMTP_PORT, "2525"),
			(ENV_SMTP_PASSWORD, "secret"),
			(ENV_SMTP_SECURITY, "TLS"),
			(ENV_BIND, "0.0.0.0:9000"),
		]);

		// Act
		settings.apply_overrides_from(lookup).unwrap();

		// Assert
		assert_eq!(settings.email.host, "mail.example.org");
		assert_eq!(settings.email.port, 2525);
		assert_eq!(settings.email.password.as_deref(), Some("secret"));
		assert_eq!(settings.email.security, SmtpSecurityKind::Tls);
		assert_eq!(settings.server.bind, "0.0.0.0:9000");
	}

	#[rstest]
	#[case(ENV_SMTP_PORT, "smtp")]
	#[case(ENV_SMTP_SECURITY, "ssl3")]
	#[case(ENV_EMAIL_BACKEND, "sendmail")]
	fn test_invalid_override_is_rejected(#[case] key: &str, #[case] value: &str) {
		// Arrange
		let mut settings = Settings::default();

		// Act
		let result = settings.apply_overrides_from(lookup_from(&[(key, value)]));

		// Assert
		assert!(matches!(result, Err(ConfigError::Invalid(_))));
	}

	#[rstest]
	fn test_unknown_backend_in_toml_is_parse_error() {
		let result = Settings::from_toml_str("[email]\nbackend = \"pigeon\"\n");
		assert!(matches!(result, Err(ConfigError::Parse(_))));
	}
}
