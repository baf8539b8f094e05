use flowsketch::compiler::extractor::{
    extract_schedule, normalize, ClauseKind, ClausePattern, Extractor,
};
use flowsketch::compiler::service::{detect_service, Service};

const SHEETS_TO_WEBHOOK: &str = "When a new row is added to Google Sheets, send the data to a webhook URL, and log the response to another sheet";

#[test]
fn test_extract_trigger_and_actions() {
    let extraction = Extractor::new().extract(SHEETS_TO_WEBHOOK);

    let trigger = extraction.trigger.expect("Trigger not found");
    assert_eq!(trigger.kind, ClauseKind::Trigger);
    assert_eq!(trigger.text, "a new row is added to google sheets");
    assert_eq!(trigger.service, Some(Service::GoogleSheets));

    let actions: Vec<&str> = extraction.actions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(actions, vec!["send the data to a webhook url", "log the response to another sheet"]);
    assert_eq!(extraction.actions[0].service, Some(Service::Http));
    assert_eq!(extraction.actions[1].service, Some(Service::GoogleSheets));
    assert!(extraction.actions.iter().all(|c| c.kind == ClauseKind::Action));
}

#[test]
fn test_no_trigger_keeps_leading_segment() {
    let extraction = Extractor::new().extract("Send a message to Slack and update the spreadsheet");

    assert!(extraction.trigger.is_none());
    let actions: Vec<&str> = extraction.actions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(actions, vec!["send a message to slack", "update the spreadsheet"]);
    assert!(extraction.conditions.is_empty());
}

#[test]
fn test_condition_segments_are_not_actions() {
    let extraction = Extractor::new()
        .extract("When an order arrives then check if status is paid then email the customer");

    assert_eq!(extraction.trigger.as_ref().map(|c| c.text.as_str()), Some("an order arrives"));

    // "check if ..." is a condition lead-in and must not double as an action
    let actions: Vec<&str> = extraction.actions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(actions, vec!["email the customer"]);

    // The same span may be captured by several patterns; each capture counts
    let conditions: Vec<&str> = extraction.conditions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        conditions,
        vec![
            "status is paid",
            "an order arrives then check if status",
            "status is paid then email the customer",
        ]
    );
    assert!(extraction.conditions.iter().all(|c| c.kind == ClauseKind::Condition));
}

#[test]
fn test_checks_segment_is_condition_only() {
    let extraction = Extractor::new().extract("Send a message to Slack then checks whether the amount is large");

    let actions: Vec<&str> = extraction.actions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(actions, vec!["send a message to slack"]);

    let conditions: Vec<&str> = extraction.conditions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(conditions, vec!["the amount is large"]);
}

#[test]
fn test_condition_pattern_matches_globally() {
    let extraction = Extractor::new().extract("if a is 1 then x and if b is 2 then y");

    let conditions: Vec<&str> = extraction.conditions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(conditions, vec!["a is 1", "b is 2"]);

    let actions: Vec<&str> = extraction.actions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(actions, vec!["x", "y"]);
}

#[test]
fn test_trigger_patterns_first_match_wins() {
    let extraction = Extractor::new().extract("Watches for new payments then notify the team on Slack");

    let trigger = extraction.trigger.expect("Trigger not found");
    assert_eq!(trigger.text, "new payments");
    assert_eq!(trigger.service, Some(Service::Stripe));
}

#[test]
fn test_custom_trigger_pattern() {
    let mut extractor = Extractor::new();
    assert!(extractor.extract("on new invoice, notify slack").trigger.is_none());

    extractor.push_trigger_pattern(
        ClausePattern::new("on-new", r"\bon\s+new\s+(.+?)(?:,|$)").expect("Invalid pattern"),
    );
    let extraction = extractor.extract("On new invoice, notify Slack");

    assert_eq!(extraction.trigger.map(|c| c.text), Some("invoice".to_string()));
    let actions: Vec<&str> = extraction.actions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(actions, vec!["notify slack"]);
}

#[test]
fn test_empty_text_extracts_nothing() {
    let extraction = Extractor::new().extract("   ");
    assert!(extraction.trigger.is_none());
    assert!(extraction.actions.is_empty());
    assert!(extraction.conditions.is_empty());
}

#[test]
fn test_normalize_collapses_whitespace() {
    assert_eq!(normalize("  When A\n  new   Order\tarrives "), "when a new order arrives");
}

#[test]
fn test_detect_service_declared_order_breaks_ties() {
    // google-sheets is declared before email
    assert_eq!(detect_service("add a row to the sheet and email the team"), Some(Service::GoogleSheets));
    // slack is declared before http
    assert_eq!(detect_service("post the api response to the slack channel"), Some(Service::Slack));
    // "mail" inside "gmail"
    assert_eq!(detect_service("forward gmail messages"), Some(Service::Email));
    assert_eq!(detect_service("hello world"), None);
}

#[test]
fn test_extract_schedule() {
    assert_eq!(extract_schedule("Every 15 minutes fetch new data"), Some(900));
    assert_eq!(extract_schedule("every 2 hours sync contacts"), Some(7_200));
    assert_eq!(extract_schedule("Every hour, post a summary"), Some(3_600));
    assert_eq!(extract_schedule("send a daily report"), Some(86_400));
    assert_eq!(extract_schedule("send an email"), None);
}
