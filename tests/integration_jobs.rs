mod common;

use axum::http::StatusCode;
use carenet::router::init_router;
use carenet_core::Role;
use common::{
    body_json, get, post_json, seed_company, seed_employee, seed_user, send, test_state, token_for,
};
use serde_json::json;

#[tokio::test]
async fn test_guardian_creates_and_reads_own_job() {
    let (state, store) = test_state();
    let guardian = seed_user(&store, Role::Guardian).await;
    let token = token_for(&state, &guardian);
    let app = init_router(state);

    let response = send(
        &app,
        post_json(
            "/api/jobs",
            Some(&token),
            json!({ "title": "Overnight care", "description": "Two nights a week" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job = body_json(response).await;
    assert_eq!(job["guardian_id"], guardian.id.to_string());
    assert_eq!(job["status"], "OPEN");

    let uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());
    let response = send(&app, get(&uri, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let list = body_json(send(&app, get("/api/jobs", Some(&token))).await).await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn test_create_job_validates_body() {
    let (state, store) = test_state();
    let guardian = seed_user(&store, Role::Guardian).await;
    let token = token_for(&state, &guardian);
    let app = init_router(state);

    let response = send(&app, post_json("/api/jobs", Some(&token), json!({ "title": "" }))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(&app, post_json("/api/jobs", Some(&token), json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "title is required");
}

#[tokio::test]
async fn test_caregiver_and_patient_cannot_post_jobs() {
    let (state, store) = test_state();
    let caregiver = seed_user(&store, Role::Caregiver).await;
    let patient = seed_user(&store, Role::Patient).await;
    let app = init_router(state.clone());

    for user in [caregiver, patient] {
        let response = send(
            &app,
            post_json(
                "/api/jobs",
                Some(&token_for(&state, &user)),
                json!({ "title": "Not allowed" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "FORBIDDEN_ROLE");
    }
}

#[tokio::test]
async fn test_job_access_by_ownership_assignment_and_tenant() {
    let (state, store) = test_state();
    let (agency, company) = seed_company(&store).await;
    let (rival, _) = seed_company(&store).await;
    let guardian = seed_user(&store, Role::Guardian).await;
    let stranger = seed_user(&store, Role::Guardian).await;
    let caregiver = seed_employee(&store, &company).await;
    let moderator = seed_user(&store, Role::Moderator).await;
    let app = init_router(state.clone());

    let agency_token = token_for(&state, &agency);
    let response = send(
        &app,
        post_json(
            "/api/jobs",
            Some(&agency_token),
            json!({ "title": "Weekday care", "guardian_id": guardian.id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job = body_json(response).await;
    assert_eq!(job["company_id"], company.id.to_string());
    let job_uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());

    let response = send(
        &app,
        post_json(
            &format!("{job_uri}/assign"),
            Some(&agency_token),
            json!({ "caregiver_id": caregiver.id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ASSIGNED");

    let expect = [
        (&guardian, StatusCode::OK),
        (&caregiver, StatusCode::OK),
        (&agency, StatusCode::OK),
        (&moderator, StatusCode::OK),
        (&stranger, StatusCode::FORBIDDEN),
        (&rival, StatusCode::FORBIDDEN),
    ];
    for (user, status) in expect {
        let response = send(&app, get(&job_uri, Some(&token_for(&state, user)))).await;
        assert_eq!(response.status(), status, "{} reading job", user.role);
    }

    let response = send(&app, get(&job_uri, Some(&token_for(&state, &stranger)))).await;
    assert_eq!(body_json(response).await["code"], "FORBIDDEN_OWNERSHIP");
    let response = send(&app, get(&job_uri, Some(&token_for(&state, &rival)))).await;
    assert_eq!(body_json(response).await["code"], "FORBIDDEN_TENANT");

    // Assignment is done; a second attempt conflicts.
    let response = send(
        &app,
        post_json(
            &format!("{job_uri}/assign"),
            Some(&agency_token),
            json!({ "caregiver_id": caregiver.id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_job_lookup_errors() {
    let (state, store) = test_state();
    let guardian = seed_user(&store, Role::Guardian).await;
    let patient = seed_user(&store, Role::Patient).await;
    let app = init_router(state.clone());
    let token = token_for(&state, &guardian);

    let missing = format!("/api/jobs/{}", uuid::Uuid::new_v4());
    let response = send(&app, get(&missing, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Job not found");

    let response = send(&app, get("/api/jobs/not-a-uuid", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Ineligible roles are refused before the lookup, so ids cannot be probed.
    let response = send(&app, get(&missing, Some(&token_for(&state, &patient)))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, get(&missing, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_is_scoped_per_role() {
    let (state, store) = test_state();
    let (agency, _company) = seed_company(&store).await;
    let (rival, _) = seed_company(&store).await;
    let guardian = seed_user(&store, Role::Guardian).await;
    let other_guardian = seed_user(&store, Role::Guardian).await;
    let admin = seed_user(&store, Role::SuperAdmin).await;
    let app = init_router(state.clone());

    send(
        &app,
        post_json(
            "/api/jobs",
            Some(&token_for(&state, &agency)),
            json!({ "title": "Agency job", "guardian_id": guardian.id }),
        ),
    )
    .await;
    send(
        &app,
        post_json(
            "/api/jobs",
            Some(&token_for(&state, &other_guardian)),
            json!({ "title": "Private job" }),
        ),
    )
    .await;

    let total = |value: serde_json::Value| value["total"].as_u64().unwrap();
    let list = |user| {
        let app = app.clone();
        let token = token_for(&state, user);
        async move { body_json(send(&app, get("/api/jobs", Some(&token))).await).await }
    };

    assert_eq!(total(list(&admin).await), 2);
    assert_eq!(total(list(&agency).await), 1);
    assert_eq!(total(list(&rival).await), 0);
    assert_eq!(total(list(&guardian).await), 1);
    assert_eq!(total(list(&other_guardian).await), 1);
}
