use lenddesk_core::errors::Error;
use lenddesk_core::users::{NewUser, Role, UserError, UserServiceTrait};

mod common;

#[test]
fn externally_assigned_ids_are_kept() {
    let ctx = common::setup();
    let users = common::user_service(&ctx);

    let created = users
        .create_user(NewUser {
            id: Some("idp-7f3a".to_string()),
            email: "mirrored@example.com".to_string(),
            name: "Mirrored".to_string(),
            role: Role::User,
        })
        .unwrap();
    assert_eq!(created.id, "idp-7f3a");

    let fetched = users.get_user("idp-7f3a").unwrap();
    assert_eq!(fetched.email, "mirrored@example.com");

    // Without one, an id is generated
    let generated = users
        .create_user(NewUser {
            id: None,
            email: "local@example.com".to_string(),
            name: "Local".to_string(),
            role: Role::User,
        })
        .unwrap();
    assert!(!generated.id.is_empty());
    assert_ne!(generated.id, created.id);
}

#[test]
fn duplicate_emails_are_refused() {
    let ctx = common::setup();
    let users = common::user_service(&ctx);

    common::create_user(&ctx, "taken@example.com", Role::User);

    let err = users
        .create_user(NewUser {
            id: None,
            email: "taken@example.com".to_string(),
            name: "Second".to_string(),
            role: Role::User,
        })
        .unwrap_err();
    assert!(matches!(err, Error::User(UserError::DuplicateEmail(_))));
}

#[test]
fn set_verified_is_idempotent_and_checks_existence() {
    let ctx = common::setup();
    let users = common::user_service(&ctx);
    let user = common::create_user(&ctx, "flip@example.com", Role::User);

    assert!(!user.account_verified);
    let verified = users.set_verified(&user.id, true).unwrap();
    assert!(verified.account_verified);

    // Writing the same value again changes nothing
    let again = users.set_verified(&user.id, true).unwrap();
    assert!(again.account_verified);

    let err = users.set_verified("ghost", true).unwrap_err();
    assert!(matches!(err, Error::User(UserError::NotFound(_))));
}

#[test]
fn lookup_by_email_and_role_check() {
    let ctx = common::setup();
    let users = common::user_service(&ctx);
    let admin = common::create_user(&ctx, "ops@example.com", Role::Admin);
    let member = common::create_user(&ctx, "member@example.com", Role::User);

    let found = users.get_user_by_email("ops@example.com").unwrap();
    assert_eq!(found.id, admin.id);

    assert!(users.is_admin(&admin.id).unwrap());
    assert!(!users.is_admin(&member.id).unwrap());
    assert!(users.is_admin("ghost").is_err());

    assert_eq!(users.list_users().unwrap().len(), 2);
}
