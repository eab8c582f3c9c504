use super::*;

#[test]
fn prompt_names_topic_and_constraints() {
    let p = quote_prompt("hope");
    assert!(p.contains("in Urdu about \"hope\""));
    assert!(p.contains("Do not include English translation"));
    assert!(p.contains("under 25 words"));
}

#[test]
fn request_body_shape() {
    let body = GenerateRequest {
        contents: [Content {
            parts: [RequestPart { text: "hi" }],
        }],
    };
    assert_eq!(
        serde_json::to_value(&body).unwrap(),
        serde_json::json!({ "contents": [{ "parts": [{ "text": "hi" }] }] })
    );
}

#[test]
fn response_parts_are_joined_and_trimmed() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"  محنت "},{"text":"کامیابی\n"}]}}]}"#;
    assert_eq!(response_text(body).as_deref(), Some("محنت کامیابی"));
}

#[test]
fn empty_or_malformed_responses_have_no_text() {
    assert_eq!(response_text(r#"{"candidates":[]}"#), None);
    assert_eq!(
        response_text(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#),
        None
    );
    assert_eq!(response_text("not json"), None);
}

#[test]
fn url_joins_endpoint_and_model() {
    let g = GeminiGenerator::new(
        reqwest::Client::new(),
        "https://x.test/v1/",
        "m1",
        Some("secret".into()),
    );
    assert_eq!(g.url(), "https://x.test/v1/models/m1:generateContent");
    assert!(!format!("{g:?}").contains("secret"));
}

#[tokio::test]
async fn missing_key_fails_with_user_message() {
    let g = GeminiGenerator::new(reqwest::Client::new(), DEFAULT_ENDPOINT, DEFAULT_MODEL, None);
    let err = g.generate("hope").await.unwrap_err();
    match err {
        PostError::Generation(msg) => assert_eq!(msg, GENERATION_FAILED),
        other => panic!("unexpected error: {other}"),
    }
}
