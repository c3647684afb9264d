mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

use common::{HEALTHY, MockBackend, Reply, hsmctl};

#[test]
fn help_lists_commands() {
    cargo_bin_cmd!("hsmctl")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("hsm"))
        .stdout(predicate::str::contains("keys"));
}

#[test]
fn invalid_api_url_is_rejected() {
    let home = assert_fs::TempDir::new().unwrap();
    cargo_bin_cmd!("hsmctl")
        .env("HSMCTL_HOME", home.path())
        .args(["--api-url", "localhost:8000", "hsm", "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start with http://"));
}

#[test]
fn health_of_ready_hsm() {
    let home = assert_fs::TempDir::new().unwrap();
    let backend = MockBackend::start(|_| Reply::json(200, HEALTHY));

    hsmctl(&home, &backend)
        .args(["hsm", "health"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready for key management"));

    assert_eq!(backend.calls(), vec!["GET /api/v1/hsm/health"]);
}

#[test]
fn health_of_unconfigured_hsm_suggests_configure() {
    let home = assert_fs::TempDir::new().unwrap();
    let backend = MockBackend::start(|_| {
        Reply::json(
            200,
            r#"{"connected":false,"configured":false,"certificate_exists":false,"error":"HSM not configured"}"#,
        )
    });

    hsmctl(&home, &backend)
        .args(["hsm", "health"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HSM not configured"))
        .stdout(predicate::str::contains("hsmctl hsm configure"));
}

#[test]
fn unreachable_backend_is_a_network_failure() {
    let home = assert_fs::TempDir::new().unwrap();
    // Bind then drop so the port is closed.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    cargo_bin_cmd!("hsmctl")
        .env("HSMCTL_HOME", home.path())
        .args(["--api-url", &format!("http://{addr}"), "hsm", "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request failed"));
}

#[test]
fn configure_rejects_invalid_ip() {
    let home = assert_fs::TempDir::new().unwrap();
    home.child("customerCA.crt").write_str("-----BEGIN CERTIFICATE-----\n").unwrap();
    let backend = MockBackend::start(|_| Reply::json(200, "{}"));

    hsmctl(&home, &backend)
        .args(["hsm", "configure", "--ip", "10.0.0.256", "--cert"])
        .arg(home.child("customerCA.crt").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid IP address format"));

    assert!(backend.requests().is_empty());
}

#[test]
fn configure_rejects_missing_certificate() {
    let home = assert_fs::TempDir::new().unwrap();
    let backend = MockBackend::start(|_| Reply::json(200, "{}"));

    hsmctl(&home, &backend)
        .args(["hsm", "configure", "--ip", "10.0.0.100", "--cert"])
        .arg(home.child("missing.crt").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Certificate file not found"));

    assert!(backend.requests().is_empty());
}

#[test]
fn configure_uploads_certificate() {
    let home = assert_fs::TempDir::new().unwrap();
    home.child("customerCA.crt").write_str("-----BEGIN CERTIFICATE-----\n").unwrap();
    let backend = MockBackend::start(|_| {
        Reply::json(200, r#"{"success":true,"message":"HSM configured successfully"}"#)
    });

    hsmctl(&home, &backend)
        .args(["hsm", "configure", "--ip", "10.0.0.100", "--cert"])
        .arg(home.child("customerCA.crt").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("HSM configured successfully"));

    let upload = &backend.requests()[0];
    assert_eq!(upload.path, "/api/v1/hsm/configure");
    assert!(upload.body.contains("10.0.0.100"));
    assert!(upload.body.contains("customerCA.crt"));
    assert!(upload.body.contains("BEGIN CERTIFICATE"));
}

#[test]
fn failed_connection_test_is_an_error() {
    let home = assert_fs::TempDir::new().unwrap();
    let backend = MockBackend::start(|_| {
        Reply::json(200, r#"{"success":false,"message":"Connection refused by HSM"}"#)
    });

    hsmctl(&home, &backend)
        .args(["hsm", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Connection refused by HSM"));

    assert_eq!(backend.calls(), vec!["POST /api/v1/hsm/test-connection"]);
}
