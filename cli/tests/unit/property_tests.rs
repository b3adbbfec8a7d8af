//! Property-based tests for fleet invariants.
//!
//! Uses `proptest` to drive random command sequences and random secrets.

#![allow(clippy::expect_used)]

use proptest::prelude::*;
use tempfile::TempDir;
use vbmc_cli::application::ports::EntryStore;
use vbmc_cli::domain::BmcView;
use vbmc_common::{BmcStatus, SECRET_MASK};

use crate::helpers::{add_request, entry, manager};

const NAMES: [&str; 3] = ["vm1", "vm2", "vm3"];

#[derive(Debug, Clone)]
enum Op {
    Start(usize),
    Stop(usize),
    Crash(usize),
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NAMES.len()).prop_map(Op::Start),
        (0..NAMES.len()).prop_map(Op::Stop),
        (0..NAMES.len()).prop_map(Op::Crash),
        Just(Op::Tick),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever happens, a name never has two live workers, and one tick
    /// brings every name to exactly its stored flag.
    #[test]
    fn prop_tick_converges_to_stored_flags(ops in proptest::collection::vec(op(), 1..40)) {
        let dir = TempDir::new().expect("tempdir");
        let (mut mgr, sup, store) = manager(dir.path());
        runtime().block_on(async {
            for name in NAMES {
                mgr.add(add_request(name)).await.expect("add");
            }
            for op in &ops {
                match op {
                    Op::Start(i) => mgr.start(NAMES[*i]).await.expect("start"),
                    Op::Stop(i) => mgr.stop(NAMES[*i]).await.expect("stop"),
                    Op::Crash(i) => sup.kill_out_of_band(NAMES[*i]),
                    Op::Tick => mgr.periodic(false).await,
                }
                for name in NAMES {
                    assert!(sup.live(name) <= 1, "{name} has several live workers");
                }
            }
            mgr.periodic(false).await;
            let after_one = sup.spawned().len();
            mgr.periodic(false).await;
            assert_eq!(sup.spawned().len(), after_one, "second tick changed something");

            for name in NAMES {
                let active = store.get(name).expect("stored").active;
                let status = mgr.status_of(name);
                assert_eq!(sup.live(name), usize::from(active), "{name}");
                let expected = if active { BmcStatus::Running } else { BmcStatus::Down };
                assert_eq!(status, expected, "{name}");
            }
        });
    }

    /// No secret survives into a masked `show` table.
    #[test]
    fn prop_masked_show_rows_hide_secrets(
        password in "pw-[a-zA-Z0-9!@#%^&]{4,24}",
        auth_password in "sasl-[a-zA-Z0-9!@#%^&]{4,24}",
    ) {
        let mut request = add_request("vm1");
        request.password.clone_from(&password);
        request.auth_username = Some("sasl".to_string());
        request.auth_password = Some(auth_password.clone());
        let entry = request.into_entry().expect("valid");

        let rows = BmcView::new(entry.masked(), BmcStatus::Down).show_rows();

        for row in &rows {
            prop_assert!(!row[1].contains(&password), "{:?}", row);
            prop_assert!(!row[1].contains(&auth_password), "{:?}", row);
        }
        let value = |key: &str| rows.iter().find(|r| r[0] == key).map(|r| r[1].clone());
        prop_assert_eq!(value("password"), Some(SECRET_MASK.to_string()));
        prop_assert_eq!(value("auth_password"), Some(SECRET_MASK.to_string()));
    }

    /// Stored records read back equal to what was written.
    #[test]
    fn prop_store_round_trips_entries(port in 1u16.., active in any::<bool>(), user in "[a-z]{1,12}") {
        let dir = TempDir::new().expect("tempdir");
        let store = vbmc_cli::infra::entry_store::FileEntryStore::new(dir.path());
        let mut original = entry("vm1", active);
        original.port = port;
        original.username = user;

        store.create(&original).expect("create");

        prop_assert_eq!(store.get("vm1").expect("get"), original);
    }
}
