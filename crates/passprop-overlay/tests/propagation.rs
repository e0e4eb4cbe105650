//! End-to-end interceptor behavior with a stubbed realm branch.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use passprop_core::prelude::*;
use passprop_overlay::{PasswordChangeRequest, PasswordPropagator};
use passprop_realm::supervisor::RealmBranch;

/// Realm branch double returning a preset outcome and recording calls.
#[derive(Clone)]
struct StubRealm {
    outcome: PropagationOutcome,
    calls: Arc<Mutex<Vec<Option<String>>>>,
}

impl StubRealm {
    fn returning(outcome: PropagationOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RealmBranch for StubRealm {
    async fn propagate(&self, identity: Option<&str>, _password: &str) -> PropagationOutcome {
        self.calls
            .lock()
            .unwrap()
            .push(identity.map(str::to_string));
        self.outcome
    }
}

const JDOE: &str = "uid=jdoe,ou=people,dc=example,dc=org";

fn samba_entry() -> DirectoryEntry {
    DirectoryEntry::new(JDOE)
        .with_object_class("person")
        .with_object_class("posixAccount")
        .with_object_class("sambaSamAccount")
        .with_attribute("uid", ["jdoe"])
        .with_attribute("userPassword", ["{SASL}jdoe@EXAMPLE.ORG"])
}

fn directory_with(entry: DirectoryEntry) -> MemoryDirectory {
    let mut directory = MemoryDirectory::new();
    directory.insert(entry);
    directory
}

fn snapshot(options: &[(&str, &[&str])]) -> Arc<ConfigSnapshot> {
    let mut registry = ConfigRegistry::new(MemorySchema::new());
    for (option, args) in options {
        registry.set_option(option, args).unwrap();
    }
    registry.snapshot().unwrap()
}

fn value_of(mods: &ModificationList, attribute: &str) -> String {
    mods.find(attribute)
        .unwrap_or_else(|| panic!("no modification for {attribute}"))
        .values()[0]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn hash_branch_only_end_to_end() {
    // Realm disabled, both windows off, credential "hunter2": exactly the
    // hash and the last-set timestamp.
    let propagator = PasswordPropagator::new(
        snapshot(&[("enable", &["samba"])]),
        directory_with(samba_entry()),
        StubRealm::returning(PropagationOutcome::LocalError),
    );

    let mut mods = ModificationList::new();
    let now = 1_700_000_000;
    propagator
        .propagate_at(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods, now)
        .await
        .unwrap();

    assert_eq!(mods.len(), 2);
    assert_eq!(value_of(&mods, "sambaNTPassword"), nt_hash("hunter2"));
    assert_eq!(value_of(&mods, "sambaPwdLastSet"), now.to_string());
    assert!(mods.find("sambaPwdMustChange").is_none());
    assert!(mods.find("sambaPwdCanChange").is_none());
}

#[tokio::test]
async fn timing_windows_are_offsets_from_now() {
    let propagator = PasswordPropagator::new(
        snapshot(&[
            ("enable", &["samba"]),
            ("must-change-seconds", &["86400"]),
            ("can-change-seconds", &["3600"]),
        ]),
        directory_with(samba_entry()),
        StubRealm::returning(PropagationOutcome::Success),
    );

    let mut mods = ModificationList::new();
    let now = 1_700_000_000;
    propagator
        .propagate_at(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods, now)
        .await
        .unwrap();

    assert_eq!(value_of(&mods, "sambaPwdMustChange"), (now + 86400).to_string());
    assert_eq!(value_of(&mods, "sambaPwdCanChange"), (now + 3600).to_string());
}

#[tokio::test]
async fn realm_failure_queues_no_hash_modifications() {
    // Abort-on-first-failure must hold across every failure kind.
    let failures = [
        PropagationOutcome::AccessDenied,
        PropagationOutcome::IdentityNotFound,
        PropagationOutcome::ConnectError,
        PropagationOutcome::AdminRejected,
        PropagationOutcome::LocalError,
    ];

    for outcome in failures {
        let stub = StubRealm::returning(outcome);
        let propagator = PasswordPropagator::new(
            snapshot(&[("realm-name", &["EXAMPLE.ORG"]), ("keep-identity-scheme", &["on"])]),
            directory_with(samba_entry()),
            stub.clone(),
        );

        let mut mods = ModificationList::new();
        let err = propagator
            .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
            .await
            .unwrap_err();

        assert_eq!(err.outcome(), outcome, "wrong error for {outcome}");
        assert!(mods.is_empty(), "side effects leaked for {outcome}");
        assert_eq!(stub.call_count(), 1, "retried for {outcome}");
    }
}

#[tokio::test]
async fn missing_required_class_gates_before_any_branch() {
    let stub = StubRealm::returning(PropagationOutcome::Success);
    let entry = DirectoryEntry::new(JDOE)
        .with_object_class("person")
        .with_attribute("uid", ["jdoe"]);
    let propagator = PasswordPropagator::new(
        snapshot(&[
            ("realm-name", &["EXAMPLE.ORG"]),
            ("required-object-class", &["posixAccount"]),
        ]),
        directory_with(entry),
        stub.clone(),
    );

    let mut mods = ModificationList::new();
    let err = propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap_err();

    assert!(matches!(err, PropagationError::RequiredClassMissing { .. }));
    assert!(mods.is_empty());
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn denied_write_access_stops_everything() {
    let stub = StubRealm::returning(PropagationOutcome::Success);
    let mut directory = directory_with(samba_entry());
    directory.deny_credential_write(JDOE);
    let propagator = PasswordPropagator::new(
        snapshot(&[("realm-name", &["EXAMPLE.ORG"])]),
        directory,
        stub.clone(),
    );

    let mut mods = ModificationList::new();
    let err = propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap_err();

    assert!(matches!(err, PropagationError::AccessDenied { .. }));
    assert!(mods.is_empty());
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn identity_scheme_marker_is_reinstated_verbatim() {
    let propagator = PasswordPropagator::new(
        snapshot(&[
            ("realm-name", &["EXAMPLE.ORG"]),
            ("keep-identity-scheme", &["on"]),
        ]),
        directory_with(samba_entry()),
        StubRealm::returning(PropagationOutcome::Success),
    );

    let mut mods = ModificationList::new();
    propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap();

    assert_eq!(value_of(&mods, "userPassword"), "{SASL}jdoe@EXAMPLE.ORG");

    // Realm-branch modifications precede hash-branch modifications.
    let names: Vec<_> = mods
        .iter()
        .map(|m| m.attribute().name().to_string())
        .collect();
    assert_eq!(names[0], "userPassword");
    assert!(names[1..].iter().any(|n| n == "sambaNTPassword"));
}

#[tokio::test]
async fn non_sasl_credential_is_not_reinstated() {
    let entry = DirectoryEntry::new(JDOE)
        .with_object_class("sambaSamAccount")
        .with_attribute("uid", ["jdoe"])
        .with_attribute("userPassword", ["{SSHA}Zm9vYmFy"]);
    let propagator = PasswordPropagator::new(
        snapshot(&[
            ("realm-name", &["EXAMPLE.ORG"]),
            ("keep-identity-scheme", &["on"]),
        ]),
        directory_with(entry),
        StubRealm::returning(PropagationOutcome::Success),
    );

    let mut mods = ModificationList::new();
    propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap();

    assert!(mods.find("userPassword").is_none());
}

#[tokio::test]
async fn retention_disabled_leaves_marker_alone() {
    let propagator = PasswordPropagator::new(
        snapshot(&[("realm-name", &["EXAMPLE.ORG"])]),
        directory_with(samba_entry()),
        StubRealm::returning(PropagationOutcome::Success),
    );

    let mut mods = ModificationList::new();
    propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap();

    assert!(mods.find("userPassword").is_none());
    assert!(mods.find("sambaNTPassword").is_some());
}

#[tokio::test]
async fn realm_branch_receives_the_entry_identity() {
    let stub = StubRealm::returning(PropagationOutcome::Success);
    let propagator = PasswordPropagator::new(
        snapshot(&[("realm-name", &["EXAMPLE.ORG"])]),
        directory_with(samba_entry()),
        stub.clone(),
    );

    let mut mods = ModificationList::new();
    propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap();

    assert_eq!(
        *stub.calls.lock().unwrap(),
        [Some("jdoe".to_string())]
    );
}

#[tokio::test]
async fn entry_without_identity_still_reaches_the_worker() {
    // Identity absence is the worker's call to report; the interceptor
    // passes it through as None.
    let stub = StubRealm::returning(PropagationOutcome::IdentityNotFound);
    let entry = DirectoryEntry::new(JDOE).with_object_class("sambaSamAccount");
    let propagator = PasswordPropagator::new(
        snapshot(&[("realm-name", &["EXAMPLE.ORG"])]),
        directory_with(entry),
        stub.clone(),
    );

    let mut mods = ModificationList::new();
    let err = propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap_err();

    assert!(matches!(err, PropagationError::IdentityNotFound { .. }));
    assert_eq!(*stub.calls.lock().unwrap(), [None]);
}

#[tokio::test]
async fn unknown_entry_is_not_found() {
    let propagator = PasswordPropagator::new(
        snapshot(&[("enable", &["samba"])]),
        MemoryDirectory::new(),
        StubRealm::returning(PropagationOutcome::Success),
    );

    let mut mods = ModificationList::new();
    let err = propagator
        .propagate(&PasswordChangeRequest::new("uid=ghost", "hunter2"), &mut mods)
        .await
        .unwrap_err();

    assert!(matches!(err, PropagationError::EntryNotFound { .. }));
}

#[tokio::test]
async fn non_samba_entry_gets_no_hash_modifications() {
    let entry = DirectoryEntry::new(JDOE)
        .with_object_class("person")
        .with_attribute("uid", ["jdoe"]);
    let propagator = PasswordPropagator::new(
        snapshot(&[("realm-name", &["EXAMPLE.ORG"])]),
        directory_with(entry),
        StubRealm::returning(PropagationOutcome::Success),
    );

    let mut mods = ModificationList::new();
    propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap();

    assert!(mods.is_empty());
}

#[tokio::test]
async fn every_modification_is_internally_originated() {
    let propagator = PasswordPropagator::new(
        snapshot(&[
            ("realm-name", &["EXAMPLE.ORG"]),
            ("keep-identity-scheme", &["on"]),
            ("must-change-seconds", &["86400"]),
        ]),
        directory_with(samba_entry()),
        StubRealm::returning(PropagationOutcome::Success),
    );

    let mut mods = ModificationList::new();
    propagator
        .propagate(&PasswordChangeRequest::new(JDOE, "hunter2"), &mut mods)
        .await
        .unwrap();

    assert!(!mods.is_empty());
    for modification in &mods {
        assert!(modification.is_internal());
        assert_eq!(modification.op(), ModOp::Replace);
    }
}
