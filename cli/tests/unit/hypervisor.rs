//! `virsh` adapter with a recording command runner.

#![allow(clippy::expect_used)]

use vbmc_cli::application::ports::{HypervisorAdapter, check_connection_and_domain};
use vbmc_cli::infra::hypervisor::VirshHypervisor;
use vbmc_common::{FleetError, HypervisorAuth};

use crate::helpers::{RecordingRunner, err_output, ok_output};

fn args(call: &(String, Vec<String>, Vec<(String, String)>)) -> Vec<&str> {
    call.1.iter().map(String::as_str).collect()
}

#[tokio::test]
async fn test_probe_connects_read_only_then_looks_up_domain() {
    let runner = RecordingRunner::replying(vec![ok_output(b"qemu:///system\n"), ok_output(b"uuid\n")]);
    let hv = VirshHypervisor::new(runner.clone());

    check_connection_and_domain(&hv, "qemu:///system", "vm1", None)
        .await
        .expect("probe");

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "virsh");
    assert_eq!(args(&calls[0]), ["--readonly", "-c", "qemu:///system", "uri"]);
    assert_eq!(args(&calls[1]), ["--readonly", "-c", "qemu:///system", "domuuid", "vm1"]);
    assert!(calls[0].2.is_empty());
}

#[tokio::test]
async fn test_failed_connect_is_connection_error_with_stderr() {
    let runner = RecordingRunner::replying(vec![err_output(1, b"error: failed to connect\n")]);
    let hv = VirshHypervisor::new(runner);

    let err = hv
        .connect("qemu+ssh://nowhere/system", None, true)
        .await
        .expect_err("must fail");

    let FleetError::Connection { uri, reason } = err else {
        panic!("expected a connection error");
    };
    assert_eq!(uri, "qemu+ssh://nowhere/system");
    assert_eq!(reason, "error: failed to connect");
}

#[tokio::test]
async fn test_unknown_domain_is_not_found() {
    let runner = RecordingRunner::replying(vec![ok_output(b""), err_output(1, b"error: no domain")]);
    let hv = VirshHypervisor::new(runner);

    let err = check_connection_and_domain(&hv, "qemu:///system", "ghost", None)
        .await
        .expect_err("must fail");

    assert!(matches!(err, FleetError::NotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn test_sasl_credentials_go_through_auth_file() {
    let runner = RecordingRunner::replying(vec![ok_output(b"")]);
    let hv = VirshHypervisor::new(runner.clone());
    let auth = HypervisorAuth {
        username: "sasl-user".to_string(),
        password: "sasl-secret".to_string(),
    };

    hv.connect("qemu+tcp://host/system", Some(&auth), true)
        .await
        .expect("connect");

    let calls = runner.calls();
    assert!(!args(&calls[0]).iter().any(|a| a.contains("sasl-secret")));
    assert_eq!(calls[0].2.len(), 1);
    assert_eq!(calls[0].2[0].0, "LIBVIRT_AUTH_FILE");
}

#[tokio::test]
async fn test_domain_state_maps_to_activity() {
    for (state, active) in [
        (&b"running\n"[..], true),
        (&b"paused\n"[..], true),
        (&b"shut off\n"[..], false),
        (&b"crashed\n"[..], false),
    ] {
        let runner = RecordingRunner::replying(vec![ok_output(b""), ok_output(b"uuid"), ok_output(state)]);
        let hv = VirshHypervisor::new(runner.clone());
        let conn = hv.connect("qemu:///system", None, true).await.expect("connect");
        let domain = hv.lookup(&conn, "vm1").await.expect("lookup");

        assert_eq!(hv.is_active(&domain).await.expect("state"), active, "{state:?}");
        assert_eq!(args(&runner.calls()[2])[3..], ["domstate", "vm1"]);
    }
}

#[tokio::test]
async fn test_failed_state_query_carries_stderr() {
    let runner = RecordingRunner::replying(vec![
        ok_output(b""),
        ok_output(b"uuid"),
        err_output(1, b"error: failed to get domain state"),
    ]);
    let hv = VirshHypervisor::new(runner.clone());
    let conn = hv.connect("qemu:///system", None, false).await.expect("connect");
    let domain = hv.lookup(&conn, "vm1").await.expect("lookup");

    let err = hv.is_active(&domain).await.expect_err("must fail");

    assert!(format!("{err:#}").contains("failed to get domain state"));
    assert_eq!(args(&runner.calls()[2]), ["-c", "qemu:///system", "domstate", "vm1"]);
}
