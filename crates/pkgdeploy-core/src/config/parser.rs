//! TOML parser with helpful error messages

use std::path::Path;

use super::schema::RawSettings;
use super::settings::Settings;
use crate::error::DeployError;

/// Load and validate deploy.toml
pub fn load_settings(path: &Path) -> Result<Settings, DeployError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DeployError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;

    parse_settings_str(&content).map_err(|e| match e {
        DeployError::Config(msg) => DeployError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Parse and validate deploy.toml content from a string
pub fn parse_settings_str(content: &str) -> Result<Settings, DeployError> {
    let raw: RawSettings =
        toml::from_str(content).map_err(|e| enhance_toml_error(&e, content))?;
    Settings::from_raw(raw)
}

/// Attach the offending source lines to a TOML error
fn enhance_toml_error(error: &toml::de::Error, content: &str) -> DeployError {
    let message = error.message();
    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())]
                .matches('\n')
                .count()
                + 1;
            DeployError::Config(format!(
                "TOML parsing error at line {line_num}:\n{}\n\nError: {message}",
                get_line_context(content, line_num)
            ))
        }
        None => DeployError::Config(format!("TOML parsing error: {message}")),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{marker} {num:4} | {line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[package_manager]
credentials = "admin:admin"

[package]
filter_reference_root = "/var/lib/build/workspace"
"#;

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let settings = parse_settings_str(MINIMAL).unwrap();
        assert_eq!(settings.ports.author, 4502);
        assert_eq!(settings.ports.publish, 4503);
        assert_eq!(settings.package_manager.package_base_path, "/etc/packages");
        assert_eq!(settings.package_manager.timeout.as_secs(), 300);
        assert!(settings.package.max_size_mb.is_none());
    }

    #[test]
    fn test_missing_required_key_is_config_error() {
        let err = parse_settings_str("[package_manager]\ncredentials = \"a:b\"\n").unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
        assert!(err.to_string().contains("package"));
    }

    #[test]
    fn test_syntax_error_points_at_line() {
        let content = format!("{MINIMAL}\n[ports\nauthor = 1\n");
        let err = parse_settings_str(&content).unwrap_err();
        assert!(err.to_string().contains("TOML parsing error"), "{err}");
    }

    #[test]
    fn test_unreadable_file_names_path() {
        let err = load_settings(Path::new("/nonexistent/pkgdeploy/deploy.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pkgdeploy/deploy.toml"));
    }
}
