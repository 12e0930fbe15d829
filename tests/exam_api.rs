//! Integration tests for exam submission and grading endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_demo_app, get, post_json};
use serde_json::json;

// Demo exam 1: questions 101..=105, 20 marks each, option `q * 10 + 1` correct.

#[tokio::test]
async fn submit_grades_the_exam() {
    let app = build_demo_app();

    let response = post_json(
        app.clone(),
        "/v1/exams/1/submit",
        json!({
            "studentId": 100,
            "answers": [
                {"questionId": 101, "selectedOptionIds": [1011]},
                {"questionId": 102, "selectedOptionIds": [1021]},
                {"questionId": 103, "selectedOptionIds": [1032]},
            ]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Exam submitted successfully.");
    assert_eq!(json["result"]["marksObtained"], 40);
    assert_eq!(json["result"]["marksPossible"], 60);
    assert_eq!(json["result"]["percentage"], 66.67);
    assert_eq!(json["result"]["passed"], true);

    let stored = body_json(get(app, "/v1/exams/1/results?studentId=100").await).await;
    assert_eq!(stored["totalMarksObtained"], 40);
    assert_eq!(stored["isPassed"], true);
}

#[tokio::test]
async fn second_submission_is_rejected() {
    let app = build_demo_app();
    let body = json!({"studentId": 100, "answers": [{"questionId": 101, "selectedOptionIds": [1011]}]});
    post_json(app.clone(), "/v1/exams/1/submit", body.clone()).await;

    let response = post_json(app, "/v1/exams/1/submit", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Exam already submitted.");
}

#[tokio::test]
async fn unknown_exam_returns_404() {
    let response = post_json(
        build_demo_app(),
        "/v1/exams/42/submit",
        json!({"studentId": 100, "answers": []}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_result_returns_404() {
    let response = get(build_demo_app(), "/v1/exams/1/results?studentId=100").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Results not available yet.");
}

#[tokio::test]
async fn regrade_without_answers_scores_zero() {
    let app = build_demo_app();

    let response = post_json(app.clone(), "/v1/exams/2/grade/105", json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["totalMarksPossible"], 0);
    assert_eq!(json["percentage"], 0.0);
    assert_eq!(json["isPassed"], false);

    let all = body_json(get(app, "/v1/exams/2/results").await).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}
