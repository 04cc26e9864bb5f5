//! Video upload pipeline integration tests.
//!
//! Run with: `cargo test -p clipvault-api --test upload_test`

mod helpers;

use bytes::Bytes;
use clipvault_core::ReferenceMode;
use helpers::{
    fake_mp4, seed_user, setup_test_app, setup_test_app_with_mode, video_form, MAX_VIDEO_SIZE,
};
use std::sync::atomic::Ordering;
use uuid::Uuid;

fn upload_path(id: Uuid) -> String {
    format!("/api/video_upload/{}", id)
}

/// `<namespace>/<uuid>.mp4` → (namespace, uuid)
fn split_key(key: &str) -> (&str, Uuid) {
    let (namespace, file) = key.split_once('/').expect("namespaced key");
    let id = file.strip_suffix(".mp4").expect("mp4 key");
    (namespace, Uuid::parse_str(id).expect("uuid file name"))
}

#[tokio::test]
async fn test_owner_uploads_landscape_video() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(4096), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let returned_url = body["video_url"].as_str().expect("video_url set");

    // Exactly one object, under the landscape namespace.
    let puts = app.storage.puts();
    assert_eq!(puts.len(), 1);
    let (namespace, _) = split_key(&puts[0]);
    assert_eq!(namespace, "landscape");
    assert_eq!(app.stored_files("landscape").len(), 1);

    // The record keeps the token; only the response carries the signed URL.
    let stored = app.videos.get(video.id).expect("record");
    assert_eq!(stored.video_url.as_deref(), Some(format!("local,{}", puts[0]).as_str()));
    assert!(returned_url.contains(&puts[0]));
    assert!(returned_url.contains("expires=300"));

    assert_eq!(app.staging_entries(), 0, "staging dir must be released");
}

#[tokio::test]
async fn test_portrait_video_is_filed_under_portrait() {
    let app = setup_test_app().await;
    app.prober.set(720, 1280);
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(2048), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 200);
    let puts = app.storage.puts();
    let (namespace, _) = split_key(&puts[0]);
    assert_eq!(namespace, "portrait");
}

#[tokio::test]
async fn test_unclassified_ratio_folds_into_portrait() {
    let app = setup_test_app().await;
    app.prober.set(1366, 768);
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(2048), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 200);
    let puts = app.storage.puts();
    let (namespace, _) = split_key(&puts[0]);
    assert_eq!(namespace, "portrait");
}

#[tokio::test]
async fn test_each_upload_gets_a_fresh_key() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);
    let token = app.token_for(owner.id);

    for _ in 0..2 {
        let response = app
            .client()
            .put(&upload_path(video.id))
            .add_header("Authorization", format!("Bearer {}", token))
            .multipart(video_form(&fake_mp4(1024), "video/mp4"))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let puts = app.storage.puts();
    assert_eq!(puts.len(), 2);
    assert_ne!(split_key(&puts[0]).1, split_key(&puts[1]).1);
}

#[tokio::test]
async fn test_raw_mp4_body_is_accepted() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .put(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .content_type("video/mp4")
        .bytes(Bytes::from(fake_mp4(1024)))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(app.storage.puts().len(), 1);
}

#[tokio::test]
async fn test_direct_mode_stores_and_returns_the_public_url() {
    let app = setup_test_app_with_mode(ReferenceMode::Direct).await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 200);
    let key = app.storage.puts()[0].clone();
    let expected = format!("http://localhost:8091/media/{}", key);

    let body: serde_json::Value = response.json();
    assert_eq!(body["video_url"], expected.as_str());
    assert_eq!(
        app.videos.get(video.id).unwrap().video_url.as_deref(),
        Some(expected.as_str())
    );
}

#[tokio::test]
async fn test_non_owner_is_rejected_without_side_effects() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let intruder = seed_user(&app, "intruder@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(intruder.id)))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 401);
    assert_eq!(app.staging_entries(), 0);
    assert_eq!(app.prober.calls(), 0);
    assert_eq!(app.normalizer.calls(), 0);
    assert!(app.storage.puts().is_empty());
    assert_eq!(app.videos.updates(), 0);
    assert!(app.videos.get(video.id).unwrap().video_url.is_none());
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_rejected() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let no_token = app
        .client()
        .post(&upload_path(video.id))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;
    assert_eq!(no_token.status_code(), 401);

    let bad_token = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", "Bearer not-a-token")
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;
    assert_eq!(bad_token.status_code(), 401);

    assert!(app.storage.puts().is_empty());
}

#[tokio::test]
async fn test_bad_id_and_unknown_video() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let token = app.token_for(owner.id);

    let bad_id = app
        .client()
        .post("/api/video_upload/not-a-uuid")
        .add_header("Authorization", format!("Bearer {}", token))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;
    assert_eq!(bad_id.status_code(), 400);

    let unknown = app
        .client()
        .post(&upload_path(Uuid::new_v4()))
        .add_header("Authorization", format!("Bearer {}", token))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;
    assert_eq!(unknown.status_code(), 404);
}

#[tokio::test]
async fn test_wrong_media_type_is_rejected_before_staging() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);
    let token = app.token_for(owner.id);

    for mime in ["video/quicktime", "video/mpeg", "application/octet-stream"] {
        let response = app
            .client()
            .post(&upload_path(video.id))
            .add_header("Authorization", format!("Bearer {}", token))
            .multipart(video_form(&fake_mp4(1024), mime))
            .await;

        assert_eq!(response.status_code(), 400, "{mime} must be rejected");
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    assert_eq!(app.staging_entries(), 0);
    assert_eq!(app.prober.calls(), 0);
}

#[tokio::test]
async fn test_missing_video_field_is_rejected() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let form = axum_test::multipart::MultipartForm::new().add_text("title", "no file here");
    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn test_oversized_upload_fails_with_size_error() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(MAX_VIDEO_SIZE as usize + 1), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 413);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(app.staging_entries(), 0);
    assert_eq!(app.prober.calls(), 0);
}

#[tokio::test]
async fn test_probe_failure_stops_before_normalize() {
    let app = setup_test_app().await;
    app.prober.set(0, 0);
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "MEDIA_PROBE_FAILED");
    assert_eq!(app.normalizer.calls(), 0);
    assert!(app.storage.puts().is_empty());
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn test_normalize_failure_skips_upload_and_record_write() {
    let app = setup_test_app().await;
    app.normalizer.fail.store(true, Ordering::SeqCst);
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "FAST_START_FAILED");
    assert!(app.storage.puts().is_empty());
    assert_eq!(app.videos.updates(), 0);
    assert_eq!(app.videos.get(video.id).unwrap(), video);
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn test_store_failure_skips_record_write() {
    let app = setup_test_app().await;
    app.storage.fail_puts.store(true, Ordering::SeqCst);
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "STORE_UPLOAD_FAILED");
    assert_eq!(app.storage.puts().len(), 1);
    assert_eq!(app.videos.updates(), 0);
    assert!(app.videos.get(video.id).unwrap().video_url.is_none());
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn test_record_write_failure_discards_orphan() {
    let app = setup_test_app().await;
    app.videos.fail_updates.store(true, Ordering::SeqCst);
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;

    assert_eq!(response.status_code(), 500);
    let puts = app.storage.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(app.storage.deletes(), puts);
    assert!(app.stored_files("landscape").is_empty());
    assert!(app.videos.get(video.id).unwrap().video_url.is_none());
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn test_edits_made_during_upload_survive_the_record_write() {
    let app = setup_test_app().await;
    let owner = seed_user(&app, "owner@example.com").await;
    let video = app.seed_video(owner.id);

    // The thumbnail lands and the title changes while the video is being probed.
    let videos = app.videos.clone();
    let id = video.id;
    app.prober.on_next_probe(move || {
        let mut current = videos.get(id).expect("record");
        current.thumbnail_url = Some("http://localhost:8091/assets/cover.png".to_string());
        current.title = "Renamed".to_string();
        videos.insert(current);
    });

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(owner.id)))
        .multipart(video_form(&fake_mp4(1024), "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 200);

    let stored = app.videos.get(video.id).unwrap();
    assert_eq!(
        stored.thumbnail_url.as_deref(),
        Some("http://localhost:8091/assets/cover.png")
    );
    assert_eq!(stored.title, "Renamed");
    assert!(stored.video_url.is_some());

    let body: serde_json::Value = response.json();
    assert_eq!(body["thumbnail_url"], "http://localhost:8091/assets/cover.png");
}
