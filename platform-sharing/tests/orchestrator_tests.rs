//! Share orchestration tests against a recording propagation engine.

mod common;

use common::{users, Call, RecordingPort};
use platform_sharing::{
    AudienceType, SharingConfig, BatchStatus, DispatchConfig, GeneralUnshareUnit, OrganizationShare,
    PropagationError, RoleAudienceSpec, SelectiveShareUnit, SelectiveUnshareUnit,
    ShareOrchestrator, SharedRole, SharingError, SharingOperation, SharingPolicy,
};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(port: Arc<RecordingPort>) -> ShareOrchestrator {
    ShareOrchestrator::with_dispatch(port, DispatchConfig::sequential())
}

fn editor() -> RoleAudienceSpec {
    RoleAudienceSpec::new("editor", "Console", AudienceType::Application)
}

fn viewer() -> RoleAudienceSpec {
    RoleAudienceSpec::new("viewer", "Branch", AudienceType::Organization)
}

#[tokio::test]
async fn test_selective_share_one_unit_per_user_and_org() {
    let port = Arc::new(RecordingPort::new());
    let orgs = vec![
        OrganizationShare::new("o1", vec![editor(), viewer()]),
        OrganizationShare::new("o2", vec![]),
    ];

    let outcome = orchestrator(port.clone())
        .share_selective(&users(&["u1", "u2"]), &orgs)
        .await
        .unwrap();

    assert_eq!(outcome.operation, SharingOperation::SelectiveShare);
    assert_eq!(outcome.total(), 4);
    assert!(outcome.is_complete_success());

    let calls = port.calls().await;
    assert_eq!(calls.len(), 4);

    let editor_role = SharedRole {
        role_name: "editor".to_string(),
        audience_name: "Console".to_string(),
        audience_type: AudienceType::Application,
    };
    let viewer_role = SharedRole {
        role_name: "viewer".to_string(),
        audience_name: "Branch".to_string(),
        audience_type: AudienceType::Organization,
    };
    assert_eq!(
        calls[0],
        Call::SelectiveShare(SelectiveShareUnit {
            user_id: "u1".to_string(),
            organization_id: "o1".to_string(),
            roles: vec![editor_role, viewer_role],
        })
    );
    assert_eq!(
        calls[1],
        Call::SelectiveShare(SelectiveShareUnit {
            user_id: "u1".to_string(),
            organization_id: "o2".to_string(),
            roles: vec![],
        })
    );
}

#[tokio::test]
async fn test_two_users_into_one_org() {
    let port = Arc::new(RecordingPort::new());
    let orgs = vec![OrganizationShare::new("o1", vec![editor()])];

    orchestrator(port.clone())
        .share_selective(&users(&["u1", "u2"]), &orgs)
        .await
        .unwrap();

    let targets: Vec<(String, String)> = port
        .calls()
        .await
        .into_iter()
        .map(|call| match call {
            Call::SelectiveShare(unit) => (unit.user_id, unit.organization_id),
            other => panic!("unexpected call {:?}", other),
        })
        .collect();

    assert_eq!(
        targets,
        vec![
            ("u1".to_string(), "o1".to_string()),
            ("u2".to_string(), "o1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_share_with_all_gives_every_user_the_same_roles() {
    let port = Arc::new(RecordingPort::new());

    let outcome = orchestrator(port.clone())
        .share_with_all(
            &users(&["u1", "u2", "u3"]),
            SharingPolicy::AllExistingAndFutureOrgs,
            &[viewer(), editor()],
        )
        .await
        .unwrap();

    assert_eq!(outcome.total(), 3);

    let calls = port.calls().await;
    assert_eq!(calls.len(), 3);
    for call in &calls {
        match call {
            Call::GeneralShare(unit) => {
                assert_eq!(unit.sharing_policy, SharingPolicy::AllExistingAndFutureOrgs);
                let names: Vec<_> = unit.roles.iter().map(|r| r.role_name.as_str()).collect();
                assert_eq!(names, ["viewer", "editor"]);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_selective_unshare_carries_all_orgs_per_user() {
    let port = Arc::new(RecordingPort::new());
    let orgs = vec!["o1".to_string(), "o2".to_string()];

    let outcome = orchestrator(port.clone())
        .unshare_selective(&users(&["u1", "u2"]), &orgs)
        .await
        .unwrap();

    assert_eq!(outcome.total(), 2);
    assert_eq!(
        port.calls().await,
        vec![
            Call::SelectiveUnshare(SelectiveUnshareUnit {
                user_id: "u1".to_string(),
                organization_ids: orgs.clone(),
            }),
            Call::SelectiveUnshare(SelectiveUnshareUnit {
                user_id: "u2".to_string(),
                organization_ids: orgs.clone(),
            }),
        ]
    );
}

#[tokio::test]
async fn test_unshare_with_all_carries_only_the_user() {
    let port = Arc::new(RecordingPort::new());

    orchestrator(port.clone())
        .unshare_with_all(&users(&["u1"]))
        .await
        .unwrap();

    assert_eq!(
        port.calls().await,
        vec![Call::GeneralUnshare(GeneralUnshareUnit {
            user_id: "u1".to_string(),
        })]
    );
}

#[tokio::test]
async fn test_partial_failure_is_attributed_to_the_failing_unit() {
    let port = Arc::new(RecordingPort::new().failing("u2/o2"));
    let orgs = vec![
        OrganizationShare::new("o1", vec![]),
        OrganizationShare::new("o2", vec![]),
    ];

    let outcome = orchestrator(port.clone())
        .share_selective(&users(&["u1", "u2"]), &orgs)
        .await
        .unwrap();

    // Every unit is still attempted.
    assert_eq!(port.calls().await.len(), 4);
    assert_eq!(outcome.status(), BatchStatus::PartiallyFailed);
    assert_eq!(outcome.succeeded_count(), 3);

    let failures: Vec<_> = outcome.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].key.user_id, "u2");
    assert_eq!(failures[0].key.organization_id.as_deref(), Some("o2"));
    assert!(matches!(
        failures[0].error(),
        Some(PropagationError::Rejected(_))
    ));

    let report = outcome.report();
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].org_id.as_deref(), Some("o2"));
    assert_eq!(report.failures[0].code, "PROPAGATION_REJECTED");
}

#[tokio::test]
async fn test_total_failure() {
    let port = Arc::new(RecordingPort::new().failing("u1").failing("u2"));

    let outcome = orchestrator(port)
        .unshare_with_all(&users(&["u1", "u2"]))
        .await
        .unwrap();

    assert_eq!(outcome.status(), BatchStatus::Failed);
    assert!(outcome.is_total_failure());
}

#[tokio::test]
async fn test_stalled_unit_times_out_without_blocking_others() {
    let port = Arc::new(RecordingPort::new().stalling("u1"));
    let dispatch = DispatchConfig {
        max_concurrency: 2,
        unit_timeout: Duration::from_millis(50),
    };

    let outcome = ShareOrchestrator::with_dispatch(port, dispatch)
        .unshare_with_all(&users(&["u1", "u2"]))
        .await
        .unwrap();

    assert_eq!(outcome.results[0].error(), Some(&PropagationError::Timeout(50)));
    assert!(outcome.results[1].is_success());
}

#[tokio::test]
async fn test_duplicate_users_produce_duplicate_units() {
    let port = Arc::new(RecordingPort::new());

    let outcome = orchestrator(port.clone())
        .unshare_with_all(&users(&["u1", "u1"]))
        .await
        .unwrap();

    assert_eq!(outcome.total(), 2);
    assert_eq!(port.calls().await.len(), 2);
}

#[tokio::test]
async fn test_invalid_role_rejects_before_any_call() {
    let port = Arc::new(RecordingPort::new());
    let orgs = vec![
        OrganizationShare::new("o1", vec![editor()]),
        OrganizationShare::new(
            "o2",
            vec![RoleAudienceSpec {
                display_name: "auditor".to_string(),
                audience: None,
            }],
        ),
    ];

    let err = orchestrator(port.clone())
        .share_selective(&users(&["u1"]), &orgs)
        .await
        .unwrap_err();

    assert!(matches!(err, SharingError::InvalidRole { ref role, .. } if role == "auditor"));
    assert!(port.calls().await.is_empty());
}

#[tokio::test]
async fn test_share_with_all_invalid_role_rejects_before_any_call() {
    let port = Arc::new(RecordingPort::new());
    let blank = RoleAudienceSpec::new(" ", "Console", AudienceType::Application);

    let err = orchestrator(port.clone())
        .share_with_all(&users(&["u1"]), SharingPolicy::AllExistingOrgsOnly, &[blank])
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "USM-60005");
    assert!(port.calls().await.is_empty());
}

#[tokio::test]
async fn test_organization_validation() {
    let port = Arc::new(RecordingPort::new());
    let orchestrator = orchestrator(port.clone());
    let users = users(&["u1"]);

    assert_eq!(
        orchestrator.share_selective(&users, &[]).await.unwrap_err(),
        SharingError::MissingOrganizations
    );
    assert_eq!(
        orchestrator
            .unshare_selective(&users, &["o1".to_string(), "".to_string()])
            .await
            .unwrap_err(),
        SharingError::BlankOrganizationId(String::new())
    );
    assert_eq!(
        orchestrator.unshare_selective(&users, &[]).await.unwrap_err(),
        SharingError::MissingOrganizations
    );
    assert!(port.calls().await.is_empty());
}

#[test]
fn test_from_config_rejects_zero_concurrency() {
    let config = SharingConfig {
        max_concurrency: 0,
        ..SharingConfig::default()
    };

    assert!(ShareOrchestrator::from_config(Arc::new(RecordingPort::new()), &config).is_err());
    assert!(
        ShareOrchestrator::from_config(Arc::new(RecordingPort::new()), &SharingConfig::default())
            .is_ok()
    );
}
