//! Scope, ACL and admin tests against the in-memory cluster.

mod common;

use authctl::{AccessGrant, AuthError, Scope};

#[tokio::test]
async fn granted_scope_is_visible_and_implies_lower_scopes() {
    let ctx = common::setup(&[]);
    ctx.activate_as_robot("robot:admin").await;

    ctx.authz.set_scope("alice", Scope::Writer, "repo1").await.unwrap();
    assert_eq!(ctx.authz.get_scope("alice", "repo1").await.unwrap(), Scope::Writer);

    ctx.login_as("alice").await;
    assert!(ctx.authz.check(Scope::Reader, "repo1").await.unwrap());
    assert!(ctx.authz.check(Scope::Writer, "repo1").await.unwrap());
    assert!(!ctx.authz.check(Scope::Owner, "repo1").await.unwrap());
    assert!(!ctx.authz.check(Scope::Reader, "repo2").await.unwrap());
}

#[tokio::test]
async fn acl_lists_every_grant() {
    let ctx = common::setup(&[]);
    ctx.activate_as_robot("robot:admin").await;

    ctx.authz.set_scope("alice", Scope::Owner, "repo1").await.unwrap();
    ctx.authz.set_scope("bob", Scope::Reader, "repo1").await.unwrap();

    let acl = ctx.authz.get_acl("repo1").await.unwrap();
    assert_eq!(
        acl,
        vec![
            AccessGrant {
                username: "alice".into(),
                repo: "repo1".into(),
                scope: Scope::Owner,
            },
            AccessGrant {
                username: "bob".into(),
                repo: "repo1".into(),
                scope: Scope::Reader,
            },
        ]
    );
}

#[tokio::test]
async fn revoking_twice_is_idempotent() {
    let ctx = common::setup(&[]);
    ctx.activate_as_robot("robot:admin").await;
    ctx.authz.set_scope("alice", Scope::Reader, "repo1").await.unwrap();

    ctx.authz.set_scope("alice", Scope::None, "repo1").await.unwrap();
    ctx.authz.set_scope("alice", Scope::None, "repo1").await.unwrap();

    assert_eq!(ctx.authz.get_scope("alice", "repo1").await.unwrap(), Scope::None);
    assert!(ctx.authz.get_acl("repo1").await.unwrap().is_empty());
}

#[tokio::test]
async fn owner_may_manage_acl_but_reader_may_not() {
    let ctx = common::setup(&[]);
    ctx.activate_as_robot("robot:admin").await;
    ctx.authz.set_scope("alice", Scope::Owner, "repo1").await.unwrap();
    ctx.authz.set_scope("bob", Scope::Reader, "repo1").await.unwrap();

    ctx.login_as("alice").await;
    ctx.authz.set_scope("carol", Scope::Writer, "repo1").await.unwrap();

    ctx.login_as("bob").await;
    let err = ctx
        .authz
        .set_scope("carol", Scope::Owner, "repo1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied(_)), "got {:?}", err);
    assert_eq!(ctx.authz.get_acl("repo1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn admins_can_be_added_and_removed() {
    let ctx = common::setup(&[]);
    ctx.activate_as_robot("robot:admin").await;

    ctx.authz
        .modify_admins(&["alice".into(), "bob".into()], &[])
        .await
        .unwrap();
    let admins = ctx.authz.list_admins().await.unwrap();
    assert!(admins.contains("alice"));
    assert!(admins.contains("bob"));
    assert!(admins.contains("robot:admin"));

    ctx.authz.modify_admins(&[], &["bob".into()]).await.unwrap();
    let admins = ctx.authz.list_admins().await.unwrap();
    assert!(admins.contains("alice"));
    assert!(!admins.contains("bob"));
}

#[tokio::test]
async fn non_admin_cannot_mint_tokens_or_modify_admins() {
    let ctx = common::setup(&[]);
    ctx.activate_as_robot("robot:admin").await;
    ctx.login_as("alice").await;

    let err = ctx.authz.get_auth_token("robot:build").await.unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied(_)), "got {:?}", err);

    let err = ctx
        .authz
        .modify_admins(&["alice".into()], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied(_)), "got {:?}", err);
}

#[tokio::test]
async fn inactive_cluster_reports_not_activated() {
    let ctx = common::setup(&[]);
    let err = ctx.authz.check(Scope::Reader, "repo1").await.unwrap_err();
    assert!(matches!(err, AuthError::NotActivated(_)), "got {:?}", err);
}

#[tokio::test]
async fn modify_admins_on_partially_activated_cluster_reports_recovery_commands() {
    let ctx = common::setup(&[]);
    ctx.activate_as_robot("robot:admin").await;
    ctx.api.set_partially_activated(true).await;

    let err = ctx
        .authz
        .modify_admins(&["alice".into()], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PartiallyActivated(_)), "got {:?}", err);

    let message = err.to_string();
    assert!(message.contains("authctl auth deactivate"));
    assert!(message.contains("authctl auth activate"));
}
