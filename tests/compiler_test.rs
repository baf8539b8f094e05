use flowsketch::blueprint::Blueprint;
use flowsketch::catalog::Catalog;
use flowsketch::compiler::core::{scenario_name, CompileOptions, Compiler};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

const SHEETS_TO_WEBHOOK: &str = "When a new row is added to Google Sheets, send the data to a webhook URL, and log the response to another sheet";

fn assert_well_formed(blueprint: &Blueprint) {
    let ids: Vec<u32> = blueprint.modules.iter().map(|m| m.id).collect();
    let expected: Vec<u32> = (1..=blueprint.modules.len() as u32).collect();
    assert_eq!(ids, expected, "ids must run 1..=N in order");

    let known: HashSet<u32> = ids.into_iter().collect();
    for conn in &blueprint.connections {
        assert!(known.contains(&conn.source), "dangling source {}", conn.source);
        assert!(known.contains(&conn.target), "dangling target {}", conn.target);
    }
}

fn modules(blueprint: &Blueprint) -> Vec<&str> {
    blueprint.modules.iter().map(|m| m.module.as_str()).collect()
}

fn edges(blueprint: &Blueprint) -> Vec<(u32, u32)> {
    blueprint.connections.iter().map(|c| (c.source, c.target)).collect()
}

#[test]
fn test_compile_sheets_to_webhook() {
    let compiler = Compiler::builtin().expect("Builtin catalog failed to load");
    let blueprint = compiler.compile(SHEETS_TO_WEBHOOK).expect("Compilation failed");

    assert_well_formed(&blueprint);
    assert!(blueprint.modules.len() >= 3);
    assert_eq!(
        modules(&blueprint),
        vec![
            "google-sheets.watchRows",
            "http.makeRequest",
            "google-sheets.addRow",
            "flow.router",
        ]
    );
    assert_eq!(edges(&blueprint), vec![(1, 2), (2, 3), (3, 4)]);

    let trigger = blueprint.module(1).unwrap();
    assert_eq!(trigger.version, 2);
    assert_eq!(trigger.parameters.get("sheetId"), Some(&json!("Sheet1")));
    assert_eq!(blueprint.module(2).unwrap().parameters.get("method"), Some(&json!("POST")));

    assert_eq!(blueprint.metadata.name, "When a new row is");
    assert_eq!(blueprint.metadata.description, SHEETS_TO_WEBHOOK);
    assert_eq!(blueprint.metadata.version, 2);
}

#[test]
fn test_missing_trigger_uses_webhook() {
    let compiler = Compiler::builtin().unwrap();
    let blueprint = compiler.compile("Send a message to Slack").expect("Compilation failed");

    assert_well_formed(&blueprint);
    assert_eq!(modules(&blueprint), vec!["webhook.customWebhook", "slack.postMessage"]);
    assert_eq!(edges(&blueprint), vec![(1, 2)]);
    assert_eq!(blueprint.module(2).unwrap().version, 4);
    assert_eq!(blueprint.routers().count(), 0);
}

#[test]
fn test_keyword_order_breaks_ties() {
    let compiler = Compiler::builtin().unwrap();
    // "email" also contains "ai"; email is declared first
    let blueprint = compiler
        .compile("Add a row to the sheet and email the team")
        .expect("Compilation failed");

    assert_eq!(
        modules(&blueprint),
        vec!["webhook.customWebhook", "google-sheets.addRow", "sendgrid.sendEmail"]
    );
    assert_eq!(blueprint.module(3).unwrap().version, 3);
}

#[test]
fn test_blank_input_fails() {
    let compiler = Compiler::builtin().unwrap();
    for text in ["", "   \n\t "] {
        let err = compiler.compile(text).unwrap_err();
        assert!(err.to_string().contains("at least one module"));
    }
}

#[test]
fn test_conditions_add_router() {
    let compiler = Compiler::builtin().unwrap();
    let blueprint = compiler
        .compile("When an order is placed in Shopify, if the total is greater than 100 then notify the team on slack")
        .expect("Compilation failed");

    assert_well_formed(&blueprint);
    assert_eq!(
        modules(&blueprint),
        vec!["shopify.watchOrders", "slack.postMessage", "flow.router"]
    );
    assert_eq!(edges(&blueprint), vec![(1, 2), (2, 3)]);

    let router = blueprint.routers().next().unwrap();
    let routes = router.routes.as_ref().unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].label, "Route 1");
    assert_eq!(routes[1].label, "Route 2");
}

#[test]
fn test_checks_clause_adds_no_action_node() {
    let compiler = Compiler::builtin().unwrap();
    let blueprint = compiler
        .compile("Send a message to Slack then checks whether the amount is large")
        .expect("Compilation failed");

    assert_eq!(
        modules(&blueprint),
        vec!["webhook.customWebhook", "slack.postMessage", "flow.router"]
    );
    assert_eq!(edges(&blueprint), vec![(1, 2), (2, 3)]);
}

#[test]
fn test_schedule_phrase() {
    let compiler = Compiler::builtin().unwrap();
    let text = "Every hour fetch data from the API and post a message to slack";

    let blueprint = compiler.compile(text).unwrap();
    let scheduling = blueprint.settings.as_ref().and_then(|s| s.scheduling).unwrap();
    assert_eq!(scheduling.interval, 3600);
    assert_eq!(blueprint.modules[0].module, "webhook.customWebhook");

    let options = CompileOptions {
        schedule_interval: Some(60),
        ..Default::default()
    };
    let blueprint = compiler.compile_with(text, &options).unwrap();
    assert_eq!(blueprint.settings.unwrap().scheduling.unwrap().interval, 60);
}

#[test]
fn test_compile_options() {
    let compiler = Compiler::builtin().unwrap();
    let options = CompileOptions {
        name: Some("Nightly sync".to_string()),
        variables: vec![("env".to_string(), json!("prod"))],
        schedule_interval: None,
    };
    let blueprint = compiler.compile_with("Send a message to Slack", &options).unwrap();

    assert_eq!(blueprint.metadata.name, "Nightly sync");
    assert_eq!(blueprint.variables.len(), 1);
    assert_eq!(blueprint.variables[0].name, "env");
    assert_eq!(blueprint.variables[0].value, json!("prod"));
    assert!(blueprint.settings.is_none());
    // Variables never take a module id
    assert_eq!(blueprint.modules.len(), 2);
}

#[test]
fn test_custom_catalog_versions() {
    let catalog = Catalog::new().with_module("slack.postMessage", 9);
    let compiler = Compiler::new(Arc::new(catalog));
    let blueprint = compiler.compile("Send a message to Slack").unwrap();

    assert_eq!(blueprint.module(1).unwrap().version, 1);
    assert_eq!(blueprint.module(2).unwrap().version, 9);
}

#[test]
fn test_scenario_name() {
    assert_eq!(
        scenario_name("Every hour, fetch the rates!"),
        Some("Every hour fetch the rates".to_string())
    );
    assert_eq!(scenario_name("  "), None);
    assert_eq!(scenario_name("!!! ???"), None);
}

#[test]
fn test_shared_compiler_across_threads() {
    let compiler = Compiler::builtin().unwrap();
    let texts = [
        SHEETS_TO_WEBHOOK,
        "Send a message to Slack",
        "Add a row to the sheet and email the team",
    ];

    let results: Vec<Blueprint> = std::thread::scope(|scope| {
        let handles: Vec<_> = texts
            .iter()
            .map(|text| {
                let compiler = &compiler;
                scope.spawn(move || compiler.compile(text).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (text, blueprint) in texts.iter().zip(&results) {
        assert_well_formed(blueprint);
        assert_eq!(blueprint, &compiler.compile(text).unwrap());
    }
}
