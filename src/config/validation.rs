use crate::config::types::{CrawlerSection, EmailConfiguration};
use crate::output::SinkSpec;
use crate::ConfigError;
use lettre::Address;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Upper bound on the worker pool
const MAX_CONCURRENCY: usize = 64;

/// Validates crawler settings
///
/// Limits must be positive when present; depth 0 is a real limit.
pub fn validate_crawler_section(section: &CrawlerSection) -> Result<(), ConfigError> {
    if section.maximum_crawl_count == Some(0) {
        return Err(ConfigError::Validation(
            "maximum_crawl_count must be >= 1 (omit it for no limit)".to_string(),
        ));
    }

    if section.maximum_response_size == Some(0) {
        return Err(ConfigError::Validation(
            "maximum_response_size must be >= 1 byte (omit it for no limit)".to_string(),
        ));
    }

    if let Some(concurrency) = section.concurrency {
        if concurrency < 1 || concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Validation(format!(
                "concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY, concurrency
            )));
        }
    }

    for (name, value) in [
        ("request_timeout", section.request_timeout),
        ("robots_timeout", section.robots_timeout),
        ("run_timeout", section.run_timeout),
    ] {
        if value == Some(0) {
            return Err(ConfigError::Validation(format!("{} must be >= 1 second", name)));
        }
    }

    if let Some(user_agent) = &section.user_agent {
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates that every sink identifier resolves to a destination
pub fn validate_outputs(outputs: &BTreeSet<String>) -> Result<(), ConfigError> {
    for output in outputs {
        SinkSpec::parse(output)?;
    }
    Ok(())
}

/// Validates SMTP settings
pub fn validate_email_configuration(config: &EmailConfiguration) -> Result<(), ConfigError> {
    if config.smtp_host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "smtp_host cannot be empty".to_string(),
        ));
    }

    validate_email(&config.from_address)?;

    for recipient in &config.recipients {
        validate_email(recipient)?;
    }

    Ok(())
}

/// Validates an email address with the same parser the SMTP transport uses
///
/// Anything accepted here is accepted when the report message is built.
pub fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::InvalidEmail(
            "email address cannot be empty".to_string(),
        ));
    }

    Address::from_str(email)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidEmail(format!("{}: {}", email, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
    }

    #[test]
    fn test_validate_email_matches_transport_parser() {
        // Split-on-@ checks accept these; the SMTP message builder does not
        assert!(validate_email("john doe@example.com").is_err());
        assert!(validate_email("ops@exa mple.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());

        for address in ["ops+smoke@example.com", "first.last@sub.example.org"] {
            assert!(validate_email(address).is_ok(), "{}", address);
            assert!(address.parse::<lettre::message::Mailbox>().is_ok());
        }
    }

    #[test]
    fn test_zero_limits_rejected() {
        let section = CrawlerSection {
            maximum_crawl_count: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            validate_crawler_section(&section),
            Err(ConfigError::Validation(_))
        ));

        let section = CrawlerSection {
            maximum_response_size: Some(0),
            ..Default::default()
        };
        assert!(validate_crawler_section(&section).is_err());
    }

    #[test]
    fn test_zero_depth_allowed() {
        let section = CrawlerSection {
            maximum_crawl_depth: Some(0),
            ..Default::default()
        };
        assert!(validate_crawler_section(&section).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        for (value, ok) in [(0, false), (1, true), (64, true), (65, false)] {
            let section = CrawlerSection {
                concurrency: Some(value),
                ..Default::default()
            };
            assert_eq!(validate_crawler_section(&section).is_ok(), ok, "concurrency {}", value);
        }
    }

    #[test]
    fn test_blank_user_agent_rejected() {
        let section = CrawlerSection {
            user_agent: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(validate_crawler_section(&section).is_err());
    }

    #[test]
    fn test_validate_outputs() {
        let good: BTreeSet<String> = ["stdout", "json:report.json"].iter().map(|s| s.to_string()).collect();
        assert!(validate_outputs(&good).is_ok());

        let bad: BTreeSet<String> = ["json:".to_string()].into_iter().collect();
        assert!(matches!(validate_outputs(&bad), Err(ConfigError::InvalidSink(_))));
    }

    #[test]
    fn test_validate_email_configuration() {
        let mut config = EmailConfiguration {
            from_address: "noreply@example.com".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: true,
            recipients: vec!["ops@example.com".to_string()],
        };
        assert!(validate_email_configuration(&config).is_ok());

        config.recipients.push("not-an-address".to_string());
        assert!(matches!(
            validate_email_configuration(&config),
            Err(ConfigError::InvalidEmail(_))
        ));
    }
}
