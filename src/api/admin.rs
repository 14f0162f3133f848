//! Moderation endpoints. Every one of them checks the admin secret before doing anything else.
use crate::api::{observe, AdminQuery, State};
use crate::datastore::Post;
use crate::ledger::{join_posts, Flag, Report, WithPost};
use crate::twoface::{ExternalError, Fallible, TfError};
use actix_web::web;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Success {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Success {
    fn new() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn with_message(message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
        }
    }
}

// Every post, flagged or not
pub async fn list_all_posts(
    state: web::Data<State>,
    query: web::Query<AdminQuery>,
) -> Fallible<web::Json<Vec<Post>>> {
    observe("list_all_posts", move || async move {
        if state.protect_all_posts {
            state.admin.check(&query)?;
        }
        Ok(web::Json(state.posts.list_posts().await))
    })
    .await
}

pub async fn list_reports(
    state: web::Data<State>,
    query: web::Query<AdminQuery>,
) -> Fallible<web::Json<Vec<WithPost<Report>>>> {
    observe("list_reports", move || async move {
        state.admin.check(&query)?;
        let reports = state.ledger.reports.list_active();
        let posts = state.posts.post_index().await;
        Ok(web::Json(join_posts(reports, &posts)))
    })
    .await
}

pub async fn delete_report(
    state: web::Data<State>,
    query: web::Query<AdminQuery>,
    report_id: web::Path<String>,
) -> Fallible<web::Json<Success>> {
    observe("delete_report", move || async move {
        state.admin.check(&query)?;
        let report_id = report_id.into_inner();
        if !state.ledger.reports.soft_delete(&report_id)? {
            return Err(TfError::user(ExternalError::REPORT_NOT_FOUND));
        }
        info!(report_id = %report_id, "deleted report");
        Ok(web::Json(Success::new()))
    })
    .await
}

pub async fn list_flagged(
    state: web::Data<State>,
    query: web::Query<AdminQuery>,
) -> Fallible<web::Json<Vec<WithPost<Flag>>>> {
    observe("list_flagged", move || async move {
        state.admin.check(&query)?;
        let flags = state.ledger.flags.list_active();
        let posts = state.posts.post_index().await;
        Ok(web::Json(join_posts(flags, &posts)))
    })
    .await
}

/// Removes the post from both stores and closes its flag. Succeeds for any post id once the
/// secret checks out; store failures and missing flags are only logged.
pub async fn delete_flagged(
    state: web::Data<State>,
    query: web::Query<AdminQuery>,
    post_id: web::Path<String>,
) -> Fallible<web::Json<Success>> {
    observe("delete_flagged", move || async move {
        state.admin.check(&query)?;
        let post_id = post_id.into_inner();
        info!(post_id = %post_id, "deleting flagged post");

        state.posts.delete_post(&post_id).await;
        match state.ledger.flags.soft_delete(&post_id) {
            Ok(true) => info!(post_id = %post_id, "marked flag as deleted"),
            Ok(false) => warn!(post_id = %post_id, "deleted post had no flag record"),
            Err(e) => {
                warn!(post_id = %post_id, error = %format!("{:#}", e.internal), "failed to mark flag as deleted")
            }
        }

        Ok(web::Json(Success::with_message(format!(
            "Deleted post {}",
            post_id
        ))))
    })
    .await
}

pub async fn restore_flagged(
    state: web::Data<State>,
    query: web::Query<AdminQuery>,
    post_id: web::Path<String>,
) -> Fallible<web::Json<Success>> {
    observe("restore_flagged", move || async move {
        state.admin.check(&query)?;
        let post_id = post_id.into_inner();
        if !state.ledger.flags.restore(&post_id)? {
            return Err(TfError::user(ExternalError::FLAG_NOT_FOUND));
        }
        info!(post_id = %post_id, "restored flagged post");
        Ok(web::Json(Success::new()))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing;
    use crate::api::userfacing::{CreatedPost, CreatedReport};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_rt::test]
    async fn test_admin_routes_reject_bad_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app =
            test::init_service(App::new().data(testing::state(dir.path(), &[])).configure(testing::routes))
                .await;

        let suffixes = [
            "",
            "?adminPassword=",
            "?adminPassword=wrong",
            "?adminpassword=admin123",
            "?adminPassword=admin123&adminPassword=admin123",
        ];
        for suffix in &suffixes {
            let requests = vec![
                test::TestRequest::get().uri(&format!("/reports{}", suffix)),
                test::TestRequest::delete().uri(&format!("/reports/1{}", suffix)),
                test::TestRequest::get().uri(&format!("/flagged{}", suffix)),
                test::TestRequest::delete().uri(&format!("/flagged/1{}", suffix)),
                test::TestRequest::put().uri(&format!("/flagged/1/restore{}", suffix)),
            ];
            for req in requests {
                let resp = test::call_service(&mut app, req.to_request()).await;
                assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "suffix {:?}", suffix);
            }
        }
    }

    #[actix_rt::test]
    async fn test_flag_review_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test::init_service(
            App::new()
                .data(testing::state(dir.path(), &["buy now"]))
                .configure(testing::routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(&json!({"text": "buy now!!"}))
            .to_request();
        let created: CreatedPost = test::read_response_json(&mut app, req).await;

        let req = test::TestRequest::get()
            .uri("/flagged?adminPassword=admin123")
            .to_request();
        let flagged: Vec<Value> = test::read_response_json(&mut app, req).await;
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0]["postId"], json!(created.id));
        assert_eq!(flagged[0]["post"]["text"], json!("buy now!!"));

        let req = test::TestRequest::put()
            .uri(&format!("/flagged/{}/restore?adminPassword=admin123", created.id))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/posts").to_request();
        let feed: Vec<Post> = test::read_response_json(&mut app, req).await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, created.id);

        let req = test::TestRequest::get()
            .uri("/flagged?adminPassword=admin123")
            .to_request();
        let flagged: Vec<Value> = test::read_response_json(&mut app, req).await;
        assert!(flagged.is_empty());
    }

    #[actix_rt::test]
    async fn test_restoring_unflagged_post_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut app =
            test::init_service(App::new().data(testing::state(dir.path(), &[])).configure(testing::routes))
                .await;

        let req = test::TestRequest::put()
            .uri("/flagged/12345/restore?adminPassword=admin123")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_deleting_flagged_post_removes_it_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test::init_service(
            App::new()
                .data(testing::state(dir.path(), &["casino"]))
                .configure(testing::routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(&json!({"text": "Online casino bonus"}))
            .to_request();
        let created: CreatedPost = test::read_response_json(&mut app, req).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/flagged/{}?adminPassword=admin123", created.id))
            .to_request();
        let body: Success = test::read_response_json(&mut app, req).await;
        assert_eq!(
            body,
            Success::with_message(format!("Deleted post {}", created.id))
        );

        let req = test::TestRequest::get().uri("/posts/all").to_request();
        let all: Vec<Post> = test::read_response_json(&mut app, req).await;
        assert!(all.is_empty());

        let req = test::TestRequest::get()
            .uri("/flagged?adminPassword=admin123")
            .to_request();
        let flagged: Vec<Value> = test::read_response_json(&mut app, req).await;
        assert!(flagged.is_empty());
    }

    #[actix_rt::test]
    async fn test_repeated_secret_gets_json_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let mut app =
            test::init_service(App::new().data(testing::state(dir.path(), &[])).configure(testing::routes))
                .await;

        let req = test::TestRequest::get()
            .uri("/flagged?adminPassword=x&adminPassword=y")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "UserBadAuth: Unauthorized"}));
    }

    #[actix_rt::test]
    async fn test_delete_succeeds_when_flag_cannot_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let state = testing::state(dir.path(), &[]);
        state.ledger.flags.flag("42", "spam");
        let path = dir.path().join("flaggedPosts.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        let mut app = test::init_service(App::new().data(state).configure(testing::routes)).await;

        let req = test::TestRequest::delete()
            .uri("/flagged/42?adminPassword=admin123")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Success = test::read_body_json(resp).await;
        assert!(body.success);
        assert_eq!(body.message.as_deref(), Some("Deleted post 42"));
    }

    #[actix_rt::test]
    async fn test_deleting_unknown_post_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut app =
            test::init_service(App::new().data(testing::state(dir.path(), &[])).configure(testing::routes))
                .await;

        let req = test::TestRequest::delete()
            .uri("/flagged/does-not-exist?adminPassword=admin123")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_report_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut app =
            test::init_service(App::new().data(testing::state(dir.path(), &[])).configure(testing::routes))
                .await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .set_json(&json!({"postId": "123", "reason": "spam"}))
            .to_request();
        let created: CreatedReport = test::read_response_json(&mut app, req).await;

        let req = test::TestRequest::get()
            .uri("/reports?adminPassword=admin123")
            .to_request();
        let reports: Vec<Value> = test::read_response_json(&mut app, req).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0]["id"], json!(created.report_id));
        assert_eq!(reports[0]["post"], Value::Null);

        let req = test::TestRequest::delete()
            .uri(&format!("/reports/{}?adminPassword=wrong", created.report_id))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::delete()
            .uri(&format!("/reports/{}?adminPassword=admin123", created.report_id))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/reports/unknown?adminPassword=admin123")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/reports?adminPassword=admin123")
            .to_request();
        let reports: Vec<Value> = test::read_response_json(&mut app, req).await;
        assert!(reports.is_empty());
    }

    #[actix_rt::test]
    async fn test_all_posts_can_require_the_secret() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = testing::state(dir.path(), &[]);
        state.protect_all_posts = true;
        let mut app = test::init_service(App::new().data(state).configure(testing::routes)).await;

        let req = test::TestRequest::get().uri("/posts/all").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/posts/all?adminPassword=admin123")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
