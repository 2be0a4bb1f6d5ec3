/// Email template with simple `{{name}}` substitution
///
/// Unknown placeholders are left in place. Substituted values are never
/// scanned again, so a value containing `{{...}}` is emitted as-is.
#[derive(Debug, Clone, Copy)]
pub struct EmailTemplate {
    content: &'static str,
}

impl EmailTemplate {
    pub const fn new(content: &'static str) -> Self {
        Self { content }
    }

    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut result = String::with_capacity(self.content.len());
        let mut rest = self.content;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];

            let Some(close) = after_open.find("}}") else {
                result.push_str(&rest[open..]);
                return result;
            };

            let key = &after_open[..close];
            match vars.iter().find(|(name, _)| *name == key) {
                Some((_, value)) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(key);
                    result.push_str("}}");
                }
            }
            rest = &after_open[close + 2..];
        }

        result.push_str(rest);
        result
    }
}

// Bundled at compile time
pub const REPORT_TEMPLATE: EmailTemplate =
    EmailTemplate::new(include_str!("../../templates/email_report.txt"));
