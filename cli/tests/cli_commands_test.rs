// Integration tests for CLI commands
// Run with: cargo test --test cli_commands_test

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the binary with config and data isolated in `dir`.
fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pwa-push"))
        .args(args)
        .env("PWA_PUSH_CONFIG_DIR", dir.join("config"))
        .env("PWA_PUSH_DATA_DIR", dir.join("data"))
        .env("RUST_LOG", "warn")
        .env_remove("NEXT_PUBLIC_VAPID_PUBLIC_KEY")
        .env_remove("VAPID_PRIVATE_KEY")
        .env_remove("PWA_PUSH_LOG_FILE")
        .env_remove("PWA_PUSH_ENV")
        .output()
        .expect("Failed to execute pwa-push")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn subscription_json(endpoint: &str) -> String {
    let browser_key = pwa_push::VapidKeys::generate();
    format!(
        r#"{{"endpoint":"{}","expirationTime":null,"keys":{{"p256dh":"{}","auth":"AAAAAAAAAAAAAAAAAAAAAA"}}}}"#,
        endpoint,
        browser_key.public_key_base64url()
    )
}

/// Test decoding the literal fixture
#[test]
fn test_decode_key_command() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["decode-key", "FPQxkY"]);

    assert!(output.status.success(), "Command should succeed");
    let out = stdout(&output);
    assert!(out.contains("4 bytes"), "{out}");
    assert!(out.contains("14f43191"), "{out}");
}

/// Test that malformed keys fail loudly
#[test]
fn test_decode_key_rejects_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["decode-key", "abc!def"]);
    assert!(!output.status.success(), "Malformed key must fail");
}

/// Test that a missing application server key is a configuration error
#[test]
fn test_decode_key_without_configuration() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["decode-key"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing application server key"), "{stderr}");
}

/// Test generating keys and decoding the stored public key
#[test]
fn test_vapid_generate_then_decode() {
    let temp_dir = TempDir::new().unwrap();

    let output = run(temp_dir.path(), &["vapid", "generate"]);
    assert!(output.status.success(), "generate should succeed");
    assert!(stdout(&output).contains("NEXT_PUBLIC_VAPID_PUBLIC_KEY="));

    let again = run(temp_dir.path(), &["vapid", "generate"]);
    assert!(!again.status.success(), "second generate needs --force");

    let decoded = run(temp_dir.path(), &["decode-key"]);
    assert!(decoded.status.success());
    let out = stdout(&decoded);
    assert!(out.contains("65 bytes"), "{out}");
    assert!(out.contains("Valid P-256 application server key"), "{out}");
}

/// Test subscribe, list, unsubscribe
#[test]
fn test_subscription_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let sub_file = temp_dir.path().join("subscription.json");
    std::fs::write(&sub_file, subscription_json("https://push.example.com/abc")).unwrap();

    let output = run(
        temp_dir.path(),
        &["subscribe", "--id", "alice", "--file", sub_file.to_str().unwrap()],
    );
    assert!(output.status.success(), "subscribe should succeed");

    let listed = stdout(&run(temp_dir.path(), &["list"]));
    assert!(listed.contains("alice"), "{listed}");
    assert!(listed.contains("https://push.example.com/abc"), "{listed}");

    let output = run(temp_dir.path(), &["unsubscribe", "--id", "alice"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Removed 1"));

    let listed = stdout(&run(temp_dir.path(), &["list"]));
    assert!(listed.contains("No subscriptions"), "{listed}");
}

/// Test doctor exit codes
#[test]
fn test_doctor_command() {
    let temp_dir = TempDir::new().unwrap();
    let site = temp_dir.path().join("public");
    std::fs::create_dir_all(&site).unwrap();
    let manifest = site.join("manifest.json");
    std::fs::write(
        &manifest,
        r#"{"name":"Demo","short_name":"Demo","start_url":"/","display":"standalone",
            "icons":[{"src":"/icon-192x192.png","sizes":"192x192"},{"src":"/icon-512x512.png","sizes":"512x512"}]}"#,
    )
    .unwrap();
    std::fs::write(site.join("sw.js"), "").unwrap();

    let ok = run(
        temp_dir.path(),
        &["doctor", "--manifest", manifest.to_str().unwrap(), "--origin", "http://localhost:3000"],
    );
    assert!(ok.status.success(), "{}", stdout(&ok));
    assert!(stdout(&ok).contains("Install prompt tips"));

    let insecure = run(
        temp_dir.path(),
        &["doctor", "--manifest", manifest.to_str().unwrap(), "--origin", "http://example.com"],
    );
    assert!(!insecure.status.success());
    assert!(stdout(&insecure).contains("[FAIL] secure context"));
}

/// Test sending prunes subscriptions the push service reports as gone
#[tokio::test(flavor = "multi_thread")]
async fn test_send_prunes_expired_subscriptions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push/gone"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_path_buf();
    let endpoint = format!("{}/push/gone", server.uri());

    let (send_out, listed) = tokio::task::spawn_blocking(move || {
        assert!(run(&dir, &["vapid", "generate"]).status.success());

        let sub_file = dir.join("subscription.json");
        std::fs::write(&sub_file, subscription_json(&endpoint)).unwrap();
        assert!(run(&dir, &["subscribe", "--id", "bob", "--file", sub_file.to_str().unwrap()])
            .status
            .success());

        let sent = run(&dir, &["send", "--title", "Hi", "--body", "There"]);
        assert!(sent.status.success(), "{}", String::from_utf8_lossy(&sent.stderr));
        (stdout(&sent), stdout(&run(&dir, &["list"])))
    })
    .await
    .unwrap();

    assert!(send_out.contains("expired 1"), "{send_out}");
    assert!(listed.contains("No subscriptions"), "{listed}");
}
