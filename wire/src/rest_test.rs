use serde_json::json;

use super::*;

#[test]
fn session_info_with_question() {
    let info: SessionInfo = serde_json::from_value(json!({"question_id": 3})).expect("decode");
    assert_eq!(info.question_id.as_deref(), Some("3"));
}

#[test]
fn session_info_null_or_missing_question() {
    let null: SessionInfo = serde_json::from_value(json!({"question_id": null})).expect("decode");
    let missing: SessionInfo = serde_json::from_value(json!({"status": "waiting"})).expect("decode");
    assert_eq!(null, SessionInfo::default());
    assert_eq!(missing, SessionInfo::default());
}

#[test]
fn question_record_accepts_numeric_id() {
    let q: QuestionRecord = serde_json::from_value(json!({
        "id": 9,
        "prompt": "Best season?",
        "answers": ["Spring", "Summer", "Autumn", "Winter"]
    }))
    .expect("decode");
    assert_eq!(q.id, "9");
    assert_eq!(q.answers.len(), 4);
}

#[test]
fn question_record_rejects_null_id() {
    let result = serde_json::from_value::<QuestionRecord>(json!({"id": null, "prompt": "", "answers": []}));
    assert!(result.is_err());
}

#[test]
fn participant_decodes_join_response() {
    let p: Participant = serde_json::from_value(json!({"username": "test.user1", "id": 17})).expect("decode");
    assert_eq!(p, Participant { username: "test.user1".into(), id: "17".into() });
}

#[test]
fn join_request_wire_shape() {
    let body = serde_json::to_value(JoinRequest { user: "ada".into() }).expect("encode");
    assert_eq!(body, json!({"user": "ada"}));
}

#[test]
fn paths() {
    assert_eq!(session_path("4"), "/api/session/4");
    assert_eq!(participants_path("4"), "/api/session/4/participants");
    assert_eq!(question_path("9"), "/api/question/9");
    assert_eq!(question_image_path("9"), "/api/question/9/image");
}
