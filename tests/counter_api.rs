mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use counter_server::counter::{self, CounterResponse};
use counter_server::AppState;
use serde_json::json;
use uuid::Uuid;

use common::{bearer, valid_token, InMemoryCounterStore};

macro_rules! init_app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($store)))
                .configure(|cfg| counter::configure(cfg, &common::gate())),
        )
        .await
    };
}

#[actix_web::test]
async fn test_counter_lifecycle() {
    let store = Arc::new(InMemoryCounterStore::default());
    let app = init_app!(store.clone());
    let token = valid_token();

    let resp = test::TestRequest::post()
        .uri("/counter/create")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "testCounter" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CounterResponse = test::read_body_json(resp).await;
    assert_eq!(created.name, "testCounter");
    assert_eq!(created.value, 0);

    let mut last = None;
    for _ in 0..2 {
        let resp = test::TestRequest::post()
            .uri("/counter/increment")
            .insert_header(bearer(&token))
            .set_json(json!({ "id": created.id }))
            .send_request(&app)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        last = Some(test::read_body_json::<CounterResponse, _>(resp).await);
    }
    assert_eq!(
        last.unwrap(),
        CounterResponse { id: created.id, name: "testCounter".into(), value: 2 }
    );

    for _ in 0..2 {
        let resp = test::TestRequest::delete()
            .uri(&format!("/counter/delete?id={}", created.id))
            .insert_header(bearer(&token))
            .send_request(&app)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(test::read_body(resp).await.is_empty());
    }
    assert!(store.get(created.id).unwrap().is_deleted());

    // A deleted counter no longer increments.
    let resp = test::TestRequest::post()
        .uri("/counter/increment")
        .insert_header(bearer(&token))
        .set_json(json!({ "id": created.id }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.get(created.id).unwrap().value, 2);
}

#[actix_web::test]
async fn test_routes_require_bearer_token() {
    let app = init_app!(Arc::new(InMemoryCounterStore::default()));
    let id = Uuid::new_v4();

    let requests = vec![
        test::TestRequest::post().uri("/counter/create").set_json(json!({ "name": "x" })),
        test::TestRequest::post().uri("/counter/increment").set_json(json!({ "id": id })),
        test::TestRequest::delete().uri(&format!("/counter/delete?id={}", id)),
    ];
    for req in requests {
        let resp = req.send_request(&app).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Unauthorized");
    }

    let double_space = format!("Bearer  {}", valid_token());
    for header in ["InvalidTokenFormat", "Bearer ", "Bearer invalid-token", double_space.as_str()] {
        let resp = test::TestRequest::post()
            .uri("/counter/create")
            .insert_header(("Authorization", header))
            .set_json(json!({ "name": "x" }))
            .send_request(&app)
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "header {:?}", header);
    }
}

#[actix_web::test]
async fn test_bad_input_is_bad_request() {
    let app = init_app!(Arc::new(InMemoryCounterStore::default()));
    let token = valid_token();

    let resp = test::TestRequest::post()
        .uri("/counter/create")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["status"], 400);

    let resp = test::TestRequest::post()
        .uri("/counter/create")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::TestRequest::post()
        .uri("/counter/increment")
        .insert_header(bearer(&token))
        .set_json(json!({ "id": "not-a-uuid" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::TestRequest::delete()
        .uri("/counter/delete?id=not-a-uuid")
        .insert_header(bearer(&token))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_increment_unknown_counter_is_bad_request() {
    let app = init_app!(Arc::new(InMemoryCounterStore::default()));

    let resp = test::TestRequest::post()
        .uri("/counter/increment")
        .insert_header(bearer(&valid_token()))
        .set_json(json!({ "id": Uuid::new_v4() }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Counter not found");
}

#[actix_web::test]
async fn test_delete_unknown_counter_is_ok() {
    let app = init_app!(Arc::new(InMemoryCounterStore::default()));

    let resp = test::TestRequest::delete()
        .uri(&format!("/counter/delete?id={}", Uuid::new_v4()))
        .insert_header(bearer(&valid_token()))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = init_app!(Arc::new(InMemoryCounterStore::default()));

    let resp = test::TestRequest::get().uri("/health").send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
