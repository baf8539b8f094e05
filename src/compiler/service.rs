use serde::{Deserialize, Serialize};
use std::fmt;

/// External service a clause refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Service {
    Slack,
    GoogleSheets,
    Email,
    Http,
    #[serde(rename = "openai")]
    OpenAi,
    Airtable,
    Notion,
    Shopify,
    Stripe,
    Github,
    Trello,
    Discord,
    Twilio,
    Sendgrid,
    Mailchimp,
    Hubspot,
    Salesforce,
}

/// Keyword table scanned top to bottom; the first service with any keyword
/// contained in the text wins. Order is the tie-break for overlapping
/// keywords ("mail" inside "gmail", "sheet" vs "email"), so entries must not
/// be reordered casually.
pub const SERVICE_KEYWORDS: &[(Service, &[&str])] = &[
    (Service::Slack, &["slack", "channel", "message to slack"]),
    (Service::GoogleSheets, &["google sheets", "spreadsheet", "sheet", "gsheet"]),
    (Service::Email, &["email", "mail", "smtp"]),
    (Service::Http, &["api", "webhook", "http", "request"]),
    (Service::OpenAi, &["openai", "gpt", "chatgpt", "ai"]),
    (Service::Airtable, &["airtable", "base"]),
    (Service::Notion, &["notion", "page"]),
    (Service::Shopify, &["shopify", "order", "product"]),
    (Service::Stripe, &["stripe", "payment", "charge"]),
    (Service::Github, &["github", "issue", "pull request"]),
    (Service::Trello, &["trello", "card", "board"]),
    (Service::Discord, &["discord"]),
    (Service::Twilio, &["sms", "text message", "twilio"]),
    (Service::Sendgrid, &["sendgrid"]),
    (Service::Mailchimp, &["mailchimp", "newsletter"]),
    (Service::Hubspot, &["hubspot", "contact", "deal"]),
    (Service::Salesforce, &["salesforce", "lead", "opportunity"]),
];

/// Substring scan over [`SERVICE_KEYWORDS`] in declared order.
pub fn detect_service(text: &str) -> Option<Service> {
    let text = text.to_lowercase();
    SERVICE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(service, _)| *service)
}

impl Service {
    /// Service prefix used in module identifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Slack => "slack",
            Service::GoogleSheets => "google-sheets",
            Service::Email => "email",
            Service::Http => "http",
            Service::OpenAi => "openai",
            Service::Airtable => "airtable",
            Service::Notion => "notion",
            Service::Shopify => "shopify",
            Service::Stripe => "stripe",
            Service::Github => "github",
            Service::Trello => "trello",
            Service::Discord => "discord",
            Service::Twilio => "twilio",
            Service::Sendgrid => "sendgrid",
            Service::Mailchimp => "mailchimp",
            Service::Hubspot => "hubspot",
            Service::Salesforce => "salesforce",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
