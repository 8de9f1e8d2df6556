//! Template rendering - personalization of message bodies

use regex::Regex;
use serde_json::Value;
use textblast_storage::models::Contact;

/// Renders `{{placeholder}}` templates against a contact
pub struct TemplateRenderer {
    placeholder_re: Regex,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            placeholder_re: Regex::new(r"\{\{[^}]+\}\}").unwrap(),
        }
    }

    /// Render a template with contact data
    ///
    /// Supported placeholders: `{{name}}`, `{{first_name}}`, `{{last_name}}`,
    /// `{{phone}}`, and `{{attributes.<key>}}`. Unresolved placeholders are
    /// stripped from the output.
    pub fn render(&self, template: &str, contact: &Contact) -> String {
        let mut result = template.to_string();

        result = result.replace("{{phone}}", &contact.phone);
        result = result.replace("{{name}}", contact.name.as_deref().unwrap_or(""));

        // Split name into first/last (simple heuristic)
        if let Some(name) = &contact.name {
            let parts: Vec<&str> = name.split_whitespace().collect();
            let first_name = parts.first().unwrap_or(&"");
            let last_name = if parts.len() > 1 {
                parts[1..].join(" ")
            } else {
                String::new()
            };
            result = result.replace("{{first_name}}", first_name);
            result = result.replace("{{last_name}}", &last_name);
        } else {
            result = result.replace("{{first_name}}", "");
            result = result.replace("{{last_name}}", "");
        }

        // Custom attributes
        if let Some(attrs) = contact.attributes.as_object() {
            for (key, value) in attrs {
                let placeholder = format!("{{{{attributes.{}}}}}", key);
                let value_str = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => value.to_string(),
                };
                result = result.replace(&placeholder, &value_str);
            }
        }

        self.placeholder_re.replace_all(&result, "").to_string()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn create_test_contact() -> Contact {
        Contact {
            id: Uuid::new_v4(),
            phone: "+15551234567".to_string(),
            name: Some("John Doe".to_string()),
            attributes: serde_json::json!({
                "company": "Acme Corp",
                "plan": "premium"
            }),
            group_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_basic_template() {
        let renderer = TemplateRenderer::new();
        let contact = create_test_contact();

        let template = "Hello {{name}}, we have your number as {{phone}}";
        let result = renderer.render(template, &contact);

        assert_eq!(
            result,
            "Hello John Doe, we have your number as +15551234567"
        );
    }

    #[test]
    fn test_render_with_attributes() {
        let renderer = TemplateRenderer::new();
        let contact = create_test_contact();

        let template = "Welcome {{first_name}} from {{attributes.company}}!";
        let result = renderer.render(template, &contact);

        assert_eq!(result, "Welcome John from Acme Corp!");
    }

    #[test]
    fn test_render_removes_unused() {
        let renderer = TemplateRenderer::new();
        let contact = create_test_contact();

        let template = "Hello {{name}}, {{unknown_var}} test";
        let result = renderer.render(template, &contact);

        assert_eq!(result, "Hello John Doe,  test");
    }

    #[test]
    fn test_render_without_name() {
        let renderer = TemplateRenderer::new();
        let mut contact = create_test_contact();
        contact.name = None;

        let result = renderer.render("Hi {{first_name}}{{last_name}}!", &contact);
        assert_eq!(result, "Hi !");
    }
}
