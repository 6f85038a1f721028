use rs_chatscrape::message::{handle_request, PageResponse};
use rs_chatscrape::{DynamicSelectorConfig, Options};
use serde_json::Value;

const PAGE: &str = r#"<html><head><title>Rust question</title></head><body>
    <div data-testid="user-message">Why is my iterator lazy?</div>
    <div class="font-claude-message">Iterator adapters do nothing until consumed, so call collect() or a for loop.</div>
</body></html>"#;

fn respond(request: &str, html: &str, url: &str) -> Value {
    let response = handle_request(
        request,
        html,
        &Options::default().with_url(url),
        &DynamicSelectorConfig::empty(),
    );
    serde_json::to_value(response).unwrap()
}

#[test]
fn content_response_is_camel_case() {
    let json = respond(r#"{"action":"getPageContent","includeImages":false}"#, PAGE, "https://claude.ai/chat/42");

    assert_eq!(json["platform"], "claude");
    assert_eq!(json["title"], "Rust question");
    assert_eq!(json["extractionStage"], "structured");
    assert_eq!(json["conversation"][0]["role"], "user");
    assert_eq!(json["conversation"][1]["role"], "assistant");
    assert!(json["rawText"].as_str().is_some_and(|t| t.contains("lazy")));
    assert_eq!(json["images"], Value::Array(Vec::new()));
    assert!(json.get("error").is_none());
    assert!(json.get("warnings").is_none());
}

#[test]
fn failure_response_carries_kind_and_suggestion() {
    let json = respond(r#"{"action":"getPageContent"}"#, "<body><p>hi</p></body>", "https://claude.ai/chat/42");

    assert_eq!(json["kind"], "NoContent");
    assert_eq!(json["platform"], "claude");
    assert!(json["suggestion"].as_str().is_some_and(|s| s.contains("conversation")));
}

#[test]
fn unknown_action_is_an_error_envelope() {
    let json = respond(r#"{"action":"summarize","content":"x"}"#, PAGE, "https://claude.ai/chat/42");
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["error"]);
}

#[test]
fn response_round_trips_as_content() {
    let response = handle_request(
        r#"{"action":"getPageContent"}"#,
        PAGE,
        &Options::default().with_url("https://claude.ai/chat/42"),
        &DynamicSelectorConfig::empty(),
    );
    let json = serde_json::to_string(&response).unwrap();
    let back: PageResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(back, response);
    assert!(matches!(back, PageResponse::Content(_)));
}
