use crate::blueprint::ROUTER_MODULE;
use crate::catalog::Catalog;
use crate::compiler::service::{detect_service, Service};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

pub const WEBHOOK_TRIGGER: &str = "webhook.customWebhook";
pub const HTTP_REQUEST: &str = "http.makeRequest";
pub const SLEEP: &str = "flow.sleep";
pub const JSON_PARSER: &str = "util.jsonParser";

/// A concrete module picked for a clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleChoice {
    pub module: String,
    pub version: u32,
    pub parameters: Map<String, Value>,
}

/// Module id plus default parameters, before the catalog supplies a version.
struct Template {
    module: &'static str,
    parameters: Value,
}

fn template(module: &'static str, parameters: Value) -> Template {
    Template { module, parameters }
}

/// 模块解析器
///
/// Maps clause text to a module. Never fails: anything unrecognised gets a
/// generic default.
pub struct Resolver {
    catalog: Arc<Catalog>,
}

impl Resolver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn resolve_trigger(&self, clause: &str) -> ModuleChoice {
        let clause = clause.to_lowercase();
        let service = detect_service(&clause);
        let chosen = service
            .and_then(|s| trigger_template(s, &clause))
            .unwrap_or_else(webhook_template);
        debug!(?service, module = chosen.module, "Resolved trigger");
        self.choose(chosen)
    }

    /// Trigger used when the description names none.
    pub fn fallback_trigger(&self) -> ModuleChoice {
        self.choose(webhook_template())
    }

    pub fn resolve_action(&self, clause: &str) -> ModuleChoice {
        let clause = clause.to_lowercase();
        let service = detect_service(&clause);
        let chosen = match service {
            Some(s) => action_template(s, &clause),
            None => generic_action(&clause),
        };
        debug!(?service, module = chosen.module, "Resolved action");
        self.choose(chosen)
    }

    pub fn router_version(&self) -> u32 {
        self.catalog.version_of(ROUTER_MODULE)
    }

    fn choose(&self, template: Template) -> ModuleChoice {
        let parameters = match template.parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ModuleChoice {
            module: template.module.to_string(),
            version: self.catalog.version_of(template.module),
            parameters,
        }
    }
}

// --- Triggers ---

fn trigger_template(service: Service, clause: &str) -> Option<Template> {
    let chosen = match service {
        Service::Slack => template(
            "slack.watchMessages",
            json!({ "channel": "#general", "botMention": clause.contains("mention") }),
        ),
        Service::GoogleSheets => template(
            "google-sheets.watchRows",
            json!({ "spreadsheetId": "{{spreadsheetId}}", "sheetId": "Sheet1", "limit": 10 }),
        ),
        Service::Shopify => template(
            "shopify.watchOrders",
            json!({ "status": "any", "limit": 10 }),
        ),
        Service::Email => template(
            "email.watchEmails",
            json!({ "folder": "INBOX", "criteria": { "unseen": true } }),
        ),
        Service::Stripe => template(
            "stripe.watchEvents",
            json!({ "events": ["payment_intent.succeeded"] }),
        ),
        Service::Salesforce => template(
            "salesforce.watchRecords",
            json!({ "object": "Lead", "query": "SELECT Id, Name, Email FROM Lead" }),
        ),
        _ => return None,
    };
    Some(chosen)
}

fn webhook_template() -> Template {
    template(
        WEBHOOK_TRIGGER,
        json!({
            "name": "Automated Trigger",
            "dataStructure": {
                "type": "collection",
                "spec": [{ "name": "data", "type": "text", "required": true }]
            }
        }),
    )
}

// --- Actions ---

fn action_template(service: Service, clause: &str) -> Template {
    match service {
        Service::Slack => slack_action(clause),
        Service::GoogleSheets => sheets_action(clause),
        Service::Email | Service::Sendgrid => email_action(clause),
        Service::Http => http_action(clause),
        Service::OpenAi => openai_action(clause),
        Service::Airtable => airtable_action(clause),
        Service::Notion => notion_action(clause),
        Service::Shopify => shopify_action(clause),
        Service::Stripe => stripe_action(clause),
        Service::Github => github_action(clause),
        Service::Trello => trello_action(clause),
        Service::Discord => discord_action(clause),
        Service::Twilio => twilio_action(clause),
        Service::Mailchimp => mailchimp_action(clause),
        Service::Hubspot => hubspot_action(clause),
        Service::Salesforce => salesforce_action(clause),
    }
}

fn has_any(clause: &str, words: &[&str]) -> bool {
    words.iter().any(|w| clause.contains(w))
}

/// No service detected: sleep, JSON parse, or a plain outbound request.
fn generic_action(clause: &str) -> Template {
    if has_any(clause, &["wait", "delay"]) {
        template(SLEEP, json!({ "delay": 5 }))
    } else if clause.contains("parse") {
        template(JSON_PARSER, json!({ "jsonString": "{{previousModule.data}}" }))
    } else {
        template(
            HTTP_REQUEST,
            json!({
                "url": "https://api.example.com/webhook",
                "method": "POST",
                "headers": [],
                "body": null
            }),
        )
    }
}

fn slack_action(clause: &str) -> Template {
    if has_any(clause, &["upload", "file"]) && !has_any(clause, &["message", "post", "send"]) {
        template(
            "slack.uploadFile",
            json!({
                "channels": ["#general"],
                "filename": "report.pdf",
                "data": "{{previousModule.file}}"
            }),
        )
    } else if clause.contains("create") && clause.contains("channel") {
        template("slack.createChannel", json!({ "name": "{{channelName}}" }))
    } else {
        template(
            "slack.postMessage",
            json!({
                "channel": "#general",
                "text": "Automated message: {{trigger.data}}",
                "attachments": []
            }),
        )
    }
}

fn sheets_action(clause: &str) -> Template {
    let sheet = |module: &'static str, extra: Value| {
        let mut parameters = json!({ "spreadsheetId": "{{spreadsheetId}}", "sheetId": "Sheet1" });
        if let (Some(base), Value::Object(extra)) = (parameters.as_object_mut(), extra) {
            base.extend(extra);
        }
        template(module, parameters)
    };

    if has_any(clause, &["add", "create", "new"]) {
        sheet(
            "google-sheets.addRow",
            json!({ "values": { "Column A": "{{trigger.field1}}", "Column B": "{{trigger.field2}}" } }),
        )
    } else if clause.contains("update") {
        sheet(
            "google-sheets.updateRow",
            json!({ "rowNumber": "{{previousModule.rowNumber}}", "values": { "Status": "Updated" } }),
        )
    } else if has_any(clause, &["search", "find"]) {
        sheet(
            "google-sheets.searchRows",
            json!({
                "filter": {
                    "conditions": [[{ "a": "Column A", "b": "{{trigger.searchTerm}}", "o": "contains" }]]
                }
            }),
        )
    } else if has_any(clause, &["delete", "remove"]) {
        sheet(
            "google-sheets.deleteRow",
            json!({ "rowNumber": "{{previousModule.rowNumber}}" }),
        )
    } else {
        // Logging/recording into a sheet means appending a row.
        sheet(
            "google-sheets.addRow",
            json!({ "values": { "Column A": "{{previousModule.data}}" } }),
        )
    }
}

fn email_action(clause: &str) -> Template {
    let body_key = if has_any(clause, &["html", "formatted"]) { "html" } else { "text" };
    let mut parameters = json!({
        "to": "{{trigger.email}}",
        "from": "noreply@example.com",
        "subject": "Automated Email"
    });
    if let Some(map) = parameters.as_object_mut() {
        map.insert(body_key.to_string(), json!("This is an automated message."));
    }
    template("sendgrid.sendEmail", parameters)
}

fn http_action(clause: &str) -> Template {
    let method = if clause.contains("get") {
        "GET"
    } else if clause.contains("post") {
        "POST"
    } else if clause.contains("put") {
        "PUT"
    } else if clause.contains("delete") {
        "DELETE"
    } else {
        "POST"
    };
    template(
        HTTP_REQUEST,
        json!({
            "url": "https://api.example.com/endpoint",
            "method": method,
            "headers": [],
            "body": { "data": "{{trigger.data}}" }
        }),
    )
}

fn openai_action(clause: &str) -> Template {
    if has_any(clause, &["image", "picture", "illustration"]) {
        template(
            "openai.createImage",
            json!({ "prompt": "{{trigger.prompt}}", "size": "1024x1024", "n": 1 }),
        )
    } else {
        template(
            "openai.createCompletion",
            json!({
                "model": "gpt-4",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "{{trigger.prompt}}" }
                ],
                "temperature": 0.7,
                "max_tokens": 2000
            }),
        )
    }
}

fn airtable_action(clause: &str) -> Template {
    let create_record = || {
        template(
            "airtable.createRecord",
            json!({
                "baseId": "{{baseId}}",
                "tableId": "Table 1",
                "fields": { "Name": "{{trigger.name}}", "Status": "New" }
            }),
        )
    };

    if has_any(clause, &["create", "add"]) {
        create_record()
    } else if clause.contains("update") {
        template(
            "airtable.updateRecord",
            json!({
                "baseId": "{{baseId}}",
                "tableId": "Table 1",
                "recordId": "{{previousModule.id}}",
                "fields": { "Status": "Updated" }
            }),
        )
    } else if has_any(clause, &["search", "find"]) {
        template(
            "airtable.searchRecords",
            json!({ "baseId": "{{baseId}}", "tableId": "Table 1", "formula": "{{trigger.searchTerm}}" }),
        )
    } else {
        create_record()
    }
}

fn notion_action(_clause: &str) -> Template {
    template(
        "notion.createPage",
        json!({
            "databaseId": "{{databaseId}}",
            "properties": {
                "Name": { "title": [{ "text": { "content": "{{trigger.title}}" } }] }
            }
        }),
    )
}

fn shopify_action(clause: &str) -> Template {
    let create_order = || {
        template(
            "shopify.createOrder",
            json!({
                "line_items": [{ "variant_id": "{{trigger.variant_id}}", "quantity": 1 }],
                "customer": { "email": "{{trigger.email}}" }
            }),
        )
    };

    if clause.contains("order") {
        create_order()
    } else if clause.contains("inventory") {
        template(
            "shopify.updateInventory",
            json!({ "inventory_item_id": "{{trigger.item_id}}", "quantity": "{{trigger.quantity}}" }),
        )
    } else {
        create_order()
    }
}

fn stripe_action(clause: &str) -> Template {
    if clause.contains("customer") && !has_any(clause, &["charge", "payment"]) {
        template(
            "stripe.createCustomer",
            json!({ "email": "{{trigger.email}}", "name": "{{trigger.name}}" }),
        )
    } else {
        template(
            "stripe.createPaymentIntent",
            json!({ "amount": "{{trigger.amount}}", "currency": "usd", "customer": "{{trigger.customer_id}}" }),
        )
    }
}

fn github_action(_clause: &str) -> Template {
    template(
        "github.createIssue",
        json!({
            "owner": "{{owner}}",
            "repo": "{{repository}}",
            "title": "{{trigger.title}}",
            "body": "{{trigger.description}}"
        }),
    )
}

fn trello_action(_clause: &str) -> Template {
    template(
        "trello.createCard",
        json!({ "list_id": "{{listId}}", "name": "{{trigger.title}}", "desc": "{{trigger.description}}" }),
    )
}

fn discord_action(_clause: &str) -> Template {
    template(
        "discord.sendMessage",
        json!({ "channelId": "{{channelId}}", "content": "Automated message: {{trigger.data}}" }),
    )
}

fn twilio_action(_clause: &str) -> Template {
    template(
        "twilio.sendSMS",
        json!({ "to": "{{trigger.phone}}", "from": "+1234567890", "body": "Automated SMS: {{trigger.message}}" }),
    )
}

fn mailchimp_action(_clause: &str) -> Template {
    template(
        "mailchimp.addSubscriber",
        json!({
            "list_id": "{{listId}}",
            "email_address": "{{trigger.email}}",
            "merge_fields": { "FNAME": "{{trigger.firstName}}", "LNAME": "{{trigger.lastName}}" }
        }),
    )
}

fn hubspot_action(clause: &str) -> Template {
    if clause.contains("deal") && !clause.contains("contact") {
        template(
            "hubspot.createDeal",
            json!({ "properties": { "dealname": "{{trigger.dealName}}", "amount": "{{trigger.amount}}" } }),
        )
    } else {
        template(
            "hubspot.createContact",
            json!({
                "email": "{{trigger.email}}",
                "properties": { "firstname": "{{trigger.firstName}}", "lastname": "{{trigger.lastName}}" }
            }),
        )
    }
}

fn salesforce_action(clause: &str) -> Template {
    let object = if clause.contains("lead") {
        "Lead"
    } else if clause.contains("contact") {
        "Contact"
    } else if clause.contains("opportunity") {
        "Opportunity"
    } else {
        "Lead"
    };
    template(
        "salesforce.createRecord",
        json!({
            "object": object,
            "fields": {
                "LastName": "{{trigger.lastName}}",
                "Company": "{{trigger.company}}",
                "Email": "{{trigger.email}}"
            }
        }),
    )
}
