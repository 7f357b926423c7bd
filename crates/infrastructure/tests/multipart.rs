//! Multipart forms sent through a live server.

#![allow(clippy::unwrap_used)]

mod common;

use std::io::Write;

use common::{app, init_tracing};
use courier_domain::{FileOptions, MultipartForm};
use courier_infrastructure::HttpContext;

#[tokio::test]
async fn test_form_with_text_and_file_sections() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.txt");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"file content")
        .unwrap();

    let context = HttpContext::start(app).await.unwrap();
    let form = MultipartForm::new()
        .with_boundary("B")
        .section("field", "hello-world")
        .file(&path, "file");

    context
        .post_form("/echo-body", form)
        .assert(("content-type", "multipart/form-data; boundary=B"))
        .assert_fn(|response| {
            let body = &response.body;
            assert!(body.starts_with("--B\r\n"));
            assert!(body.contains("Content-Disposition: form-data; name=\"field\"\r\n"));
            assert!(body.contains("hello-world"));
            assert!(body.contains("name=\"file\"; filename=\"test.txt\""));
            assert!(body.contains("Content-Type: application/octet-stream"));
            assert!(body.ends_with("--B--\r\n"));
            Ok(())
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_file_options_override_name_and_type() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.bin");
    std::fs::write(&path, [0_u8, 1, 2]).unwrap();

    let context = HttpContext::start(app).await.unwrap();
    let form = MultipartForm::new().file_with(
        &path,
        "image",
        FileOptions {
            filename: Some("avatar.png".to_string()),
            content_type: Some("image/png".to_string()),
        },
    );

    context
        .post_form("/echo-body", form)
        .assert_fn(|response| {
            assert!(response.body.contains("filename=\"avatar.png\""));
            assert!(response.body.contains("Content-Type: image/png"));
            Ok(())
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_file_fails_the_request_step() {
    init_tracing();
    let context = HttpContext::start(app).await.unwrap();
    let form = MultipartForm::new().file("/definitely/not/here.txt", "file");

    let err = context.post_form("/echo-body", form).await.unwrap_err();

    assert!(err.to_string().contains("/definitely/not/here.txt"));
    assert_eq!(context.request_count(), 0);
}
