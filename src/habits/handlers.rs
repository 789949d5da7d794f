use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    habits::{
        dto::{CompleteHabitRequest, CreateHabitRequest, UpdateHabitRequest},
        repo_types::{Habit, HabitCompletion},
        services,
    },
    state::AppState,
};

pub fn habit_routes() -> Router<AppState> {
    Router::new()
        .route("/habits", get(list_habits).post(create_habit))
        .route(
            "/habits/:id",
            get(get_habit).put(update_habit).delete(delete_habit),
        )
        .route("/habits/:id/complete", post(complete_habit))
        .route("/habits/:id/completions", get(list_completions))
}

fn not_found() -> AppError {
    AppError::NotFound("Habit not found".into())
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_habits(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Habit>>> {
    Ok(Json(services::list(state.store()?, user.id).await?))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Habit>> {
    services::get(state.store()?, user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn create_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<CreateHabitRequest>,
) -> AppResult<(StatusCode, Json<Habit>)> {
    let habit = services::create(state.store()?, user.id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn update_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateHabitRequest>,
) -> AppResult<Json<Habit>> {
    services::update(state.store()?, user.id, id, payload.into())
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Habit>> {
    services::delete(state.store()?, user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn complete_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<CompleteHabitRequest>,
) -> AppResult<(StatusCode, Json<HabitCompletion>)> {
    let completion = services::complete(state.store()?, user.id, id, payload.time_spent)
        .await?
        .ok_or_else(not_found)?;
    Ok((StatusCode::CREATED, Json(completion)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_completions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<HabitCompletion>>> {
    services::list_completions(state.store()?, user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, email: &str, username: &str) -> (String, i64) {
        let (status, body) = call(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": email, "username": username, "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    fn read_habit() -> Value {
        json!({ "title": "Read", "category": "study", "is_public": false, "track_time": false })
    }

    #[tokio::test]
    async fn other_users_habit_is_not_found() {
        let app = build_app(AppState::fake());
        let (alice, alice_id) = register(&app, "a@x.com", "alice").await;
        let (bob, _) = register(&app, "b@x.com", "bob").await;

        let (status, habit) =
            call(&app, Method::POST, "/habits", Some(&alice), Some(read_habit())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(habit["id"], 1);
        assert_eq!(habit["user_id"], alice_id);
        assert_eq!(habit["category"], "study");

        let (status, _) = call(&app, Method::GET, "/habits/1", Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (missing, missing_body) =
            call(&app, Method::GET, "/habits/42", Some(&bob), None).await;
        let (status, body) = call(
            &app,
            Method::PUT,
            "/habits/1",
            Some(&bob),
            Some(json!({ "title": "Mine now" })),
        )
        .await;
        assert_eq!((status, &body), (missing, &missing_body));
        let (status, body) = call(&app, Method::DELETE, "/habits/1", Some(&bob), None).await;
        assert_eq!((status, &body), (missing, &missing_body));

        let (status, habit) = call(&app, Method::GET, "/habits/1", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habit["title"], "Read");
    }

    #[tokio::test]
    async fn malformed_habit_id_is_a_json_validation_error() {
        let app = build_app(AppState::fake());
        let (token, _) = register(&app, "a@x.com", "alice").await;

        for (method, uri) in [
            (Method::GET, "/habits/abc"),
            (Method::DELETE, "/habits/abc"),
            (Method::GET, "/habits/1.5/completions"),
        ] {
            let (status, body) = call(&app, method, uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            assert_eq!(body["detail"][0]["loc"], json!(["path", "id"]));
            assert_eq!(body["detail"][0]["type"], "type_error");
        }
    }

    #[tokio::test]
    async fn habits_require_a_valid_token() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/habits", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Not authenticated");

        let (status, body) = call(&app, Method::GET, "/habits", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn crud_roundtrip_with_partial_update() {
        let app = build_app(AppState::fake());
        let (token, _) = register(&app, "a@x.com", "alice").await;

        let mut payload = read_habit();
        payload["description"] = json!("20 pages");
        let (_, created) = call(&app, Method::POST, "/habits", Some(&token), Some(payload)).await;

        let (status, updated) = call(
            &app,
            Method::PUT,
            "/habits/1",
            Some(&token),
            Some(json!({ "title": "New" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "New");
        assert_eq!(updated["description"], "20 pages");
        assert_eq!(updated["category"], created["category"]);
        assert_eq!(updated["is_public"], created["is_public"]);

        let (_, list) = call(&app, Method::GET, "/habits", Some(&token), None).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let (status, deleted) = call(&app, Method::DELETE, "/habits/1", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["title"], "New");

        let (status, _) = call(&app, Method::GET, "/habits/1", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn completing_habits() {
        let app = build_app(AppState::fake());
        let (token, user_id) = register(&app, "a@x.com", "alice").await;
        call(&app, Method::POST, "/habits", Some(&token), Some(read_habit())).await;

        let (status, completion) = call(
            &app,
            Method::POST,
            "/habits/1/complete",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(completion["habit_id"], 1);
        assert_eq!(completion["user_id"], user_id);
        assert_eq!(completion["points_earned"], 1);

        let (status, body) = call(
            &app,
            Method::POST,
            "/habits/1/complete",
            Some(&token),
            Some(json!({ "time_spent": 15 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"], json!(["body", "time_spent"]));

        let (status, list) =
            call(&app, Method::GET, "/habits/1/completions", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let (status, _) = call(
            &app,
            Method::POST,
            "/habits/9/complete",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
