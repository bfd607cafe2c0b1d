mod common;

use axum::http::StatusCode;
use common::{
    build_test_context, character_body, create_character, register_and_get_token, send,
};
use serde_json::json;

#[tokio::test]
async fn new_user_lists_empty_array() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "newbie").await;

    let (status, body, _) = send(&ctx.app, "GET", "/api/characters/get", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], false);
    assert_eq!(body["data"]["characters"], json!([]));
}

#[tokio::test]
async fn character_routes_require_token() {
    let ctx = build_test_context();

    let (status, body, _) = send(&ctx.app, "GET", "/api/characters/get", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_ERROR");

    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/api/characters/create",
        None,
        Some(character_body("Nobody")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_returns_full_character_owned_by_caller() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "maker").await;
    let owner_id = ctx.state.tokens.verify(&token).unwrap().user_id;

    let mut body = character_body("Aldric");
    // A body-supplied owner is ignored.
    body["ownerId"] = json!("someone-else");
    let (status, resp, _) =
        send(&ctx.app, "POST", "/api/characters/create", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    let character = &resp["data"];
    assert!(character["id"].is_string());
    assert_eq!(character["ownerId"], owner_id.as_str());
    assert_eq!(character["name"], "Aldric");
    assert_eq!(character["race"], "human");
    assert_eq!(character["stats"]["maxHealth"], 100.0);
    assert_eq!(character["equipment"]["weapon"], "rusty_sword");
    assert_eq!(character["appearance"]["hairStyle"], "short");
    assert_eq!(character["createdAt"], character["updatedAt"]);
}

#[tokio::test]
async fn item_objects_and_extra_stats_survive_a_reload() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "hoarder").await;

    let mut body = character_body("Gearhead");
    body["equipment"]["weapon"] = json!({"id": "iron_sword", "damage": 5});
    body["stats"]["mana"] = json!(50);
    body["stats"]["experience"] = json!(120);
    let (status, resp, _) =
        send(&ctx.app, "POST", "/api/characters/create", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");

    let (status, list, _) = send(&ctx.app, "GET", "/api/characters/get", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let stored = &list["data"]["characters"][0];
    assert_eq!(stored["equipment"]["weapon"], json!({"id": "iron_sword", "damage": 5}));
    assert_eq!(stored["equipment"]["armor"], json!(null));
    assert_eq!(stored["stats"]["mana"], 50);
    assert_eq!(stored["stats"]["experience"], 120);
    assert_eq!(stored["stats"]["strength"], 12.0);
}

#[tokio::test]
async fn create_rejects_invalid_payloads() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "sloppy").await;

    let mut no_gender = character_body("Genderless");
    no_gender.as_object_mut().unwrap().remove("gender");
    let mut bad_race = character_body("Orcish");
    bad_race["race"] = json!("orc");
    let mut negative = character_body("Weakling");
    negative["stats"]["defense"] = json!(-1);

    for payload in [no_gender, bad_race, negative, json!({})] {
        let (status, body, _) = send(
            &ctx.app,
            "POST",
            "/api/characters/create",
            Some(&token),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn duplicate_names_are_scoped_per_owner() {
    let ctx = build_test_context();
    let alice = register_and_get_token(&ctx.app, "alice").await;
    let bruno = register_and_get_token(&ctx.app, "bruno").await;

    create_character(&ctx.app, &alice, "X").await;

    let (status, body, _) = send(
        &ctx.app,
        "POST",
        "/api/characters/create",
        Some(&alice),
        Some(character_body("X")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    create_character(&ctx.app, &bruno, "X").await;
}

#[tokio::test]
async fn elevated_stats_need_admin_role() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "cheater").await;

    let mut body = character_body("Titan");
    body["stats"]["strength"] = json!(9999);
    let (status, resp, _) = send(
        &ctx.app,
        "POST",
        "/api/characters/create",
        Some(&token),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["code"], "AUTHORIZATION_ERROR");

    assert!(ctx.state.db.set_role("cheater", "admin").unwrap());
    let (status, login, _) = send(
        &ctx.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "cheater", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin_token = login["data"]["token"].as_str().unwrap().to_string();

    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/api/characters/create",
        Some(&admin_token),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn list_is_newest_first_and_only_own() {
    let ctx = build_test_context();
    let alice = register_and_get_token(&ctx.app, "alice").await;
    let bruno = register_and_get_token(&ctx.app, "bruno").await;

    create_character(&ctx.app, &alice, "First").await;
    create_character(&ctx.app, &alice, "Second").await;
    create_character(&ctx.app, &bruno, "Intruder").await;

    let (status, body, _) = send(&ctx.app, "GET", "/api/characters/get", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["data"]["characters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[tokio::test]
async fn update_applies_partial_changes() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "editor").await;
    let created = create_character(&ctx.app, &token, "Mira").await;
    let id = created["id"].as_str().unwrap();

    let (status, body, _) = send(
        &ctx.app,
        "PUT",
        &format!("/api/characters/update?id={id}"),
        Some(&token),
        Some(json!({"name": "Mira the Swift", "equipment": {"weapon": "bow"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let updated = &body["data"];
    assert_eq!(updated["id"], id);
    assert_eq!(updated["name"], "Mira the Swift");
    assert_eq!(updated["race"], created["race"]);
    assert_eq!(updated["stats"], created["stats"]);
    assert_eq!(updated["appearance"], created["appearance"]);
    assert_eq!(updated["equipment"]["weapon"], "bow");
    assert_eq!(updated["equipment"]["armor"], json!(null));
    assert_eq!(updated["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn update_takes_id_from_body() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "bodyid").await;
    let created = create_character(&ctx.app, &token, "Rowan").await;

    let (status, body, _) = send(
        &ctx.app,
        "PUT",
        "/api/characters/update",
        Some(&token),
        Some(json!({"id": created["id"], "gender": "female"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["gender"], "female");
}

#[tokio::test]
async fn update_without_changes_still_returns_document() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "idle").await;
    let created = create_character(&ctx.app, &token, "Same").await;
    let id = created["id"].as_str().unwrap();

    let (status, body, _) = send(
        &ctx.app,
        "PUT",
        &format!("/api/characters/update?id={id}"),
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Same");
    assert_eq!(body["data"]["stats"], created["stats"]);
}

#[tokio::test]
async fn update_rejects_rename_onto_sibling() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "twins").await;
    create_character(&ctx.app, &token, "Castor").await;
    let pollux = create_character(&ctx.app, &token, "Pollux").await;

    let (status, body, _) = send(
        &ctx.app,
        "PUT",
        &format!("/api/characters/update?id={}", pollux["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({"name": "Castor"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn update_validates_merged_payload() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "strict").await;
    let created = create_character(&ctx.app, &token, "Valid").await;

    let (status, body, _) = send(
        &ctx.app,
        "PUT",
        &format!("/api/characters/update?id={}", created["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({"race": "goblin"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_and_delete_require_id() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "noid").await;

    let (status, _, _) = send(
        &ctx.app,
        "PUT",
        "/api/characters/update",
        Some(&token),
        Some(json!({"name": "Whoever"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body, _) =
        send(&ctx.app, "DELETE", "/api/characters/delete", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Character ID is required");
}

#[tokio::test]
async fn cross_owner_access_is_not_found() {
    let ctx = build_test_context();
    let alice = register_and_get_token(&ctx.app, "alice").await;
    let mallory = register_and_get_token(&ctx.app, "mallory").await;
    let created = create_character(&ctx.app, &alice, "Precious").await;
    let id = created["id"].as_str().unwrap();

    let (status, body, _) = send(
        &ctx.app,
        "PUT",
        &format!("/api/characters/update?id={id}"),
        Some(&mallory),
        Some(json!({"name": "Stolen"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body, _) = send(
        &ctx.app,
        "DELETE",
        &format!("/api/characters/delete?id={id}"),
        Some(&mallory),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    // Untouched for the real owner.
    let (_, body, _) = send(&ctx.app, "GET", "/api/characters/get", Some(&alice), None).await;
    assert_eq!(body["data"]["characters"][0]["name"], "Precious");
}

#[tokio::test]
async fn delete_removes_character_once() {
    let ctx = build_test_context();
    let token = register_and_get_token(&ctx.app, "cleaner").await;
    let created = create_character(&ctx.app, &token, "Ephemeral").await;
    let id = created["id"].as_str().unwrap();

    let (status, body, _) = send(
        &ctx.app,
        "DELETE",
        "/api/characters/delete",
        Some(&token),
        Some(json!({"id": id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let (status, _, _) = send(
        &ctx.app,
        "DELETE",
        &format!("/api/characters/delete?id={id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body, _) = send(&ctx.app, "GET", "/api/characters/get", Some(&token), None).await;
    assert_eq!(body["data"]["characters"], json!([]));
}
