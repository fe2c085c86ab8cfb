mod common;

use common::{setup_with_user, EMAIL, PASSWORD, USERNAME};
use liftlog_identity::{
    authenticate, is_admin, login, register_user, resolve_session, user_details, IdentityError,
};
use liftlog_types::Location;

#[test]
fn register_rejects_duplicate_username_or_email() {
    let (conn, _) = setup_with_user();

    let dup_name = register_user(&conn, USERNAME, "other@teszt.com", "pw123456");
    assert!(matches!(dup_name, Err(IdentityError::AlreadyExists)));

    let dup_email = register_user(&conn, "someone_else", EMAIL, "pw123456");
    assert!(matches!(dup_email, Err(IdentityError::AlreadyExists)));
}

#[test]
fn login_by_username_or_email() {
    let (conn, id) = setup_with_user();

    assert_eq!(authenticate(&conn, USERNAME, PASSWORD).expect("by username"), id);
    assert_eq!(authenticate(&conn, EMAIL, PASSWORD).expect("by email"), id);
}

#[test]
fn wrong_password_and_unknown_user_look_the_same() {
    let (conn, _) = setup_with_user();

    let wrong = authenticate(&conn, USERNAME, "not-the-password");
    let unknown = authenticate(&conn, "nobody_here", PASSWORD);
    assert!(matches!(wrong, Err(IdentityError::InvalidCredentials)));
    assert!(matches!(unknown, Err(IdentityError::InvalidCredentials)));
}

#[test]
fn second_login_for_same_location_invalidates_first_token() {
    let (conn, id) = setup_with_user();

    let first = login(&conn, USERNAME, PASSWORD, Location::Web).expect("first login");
    assert!(!first.is_empty());
    assert_eq!(resolve_session(&conn, &first).expect("lookup"), Some(id));

    let second = login(&conn, USERNAME, PASSWORD, Location::Web).expect("second login");
    assert_ne!(first, second);
    assert_eq!(resolve_session(&conn, &first).expect("lookup"), None);
    assert_eq!(resolve_session(&conn, &second).expect("lookup"), Some(id));
}

#[test]
fn admin_flag_is_coerced_from_stored_value() {
    let (conn, id) = setup_with_user();
    assert!(!is_admin(&conn, id).expect("flag lookup"));

    // A loosely typed value written through the admin console still counts.
    conn.execute("UPDATE user SET is_admin = '1' WHERE id = ?1", [id])
        .expect("failed to promote user");
    assert!(is_admin(&conn, id).expect("flag lookup"));

    let details = user_details(&conn, id)
        .expect("details lookup")
        .expect("user exists");
    assert_eq!(details.username, USERNAME);
    assert!(details.is_admin);
    assert_eq!(
        serde_json::to_value(&details).expect("serialize")["isAdmin"],
        serde_json::json!(true)
    );

    assert!(!is_admin(&conn, id + 100).expect("unknown user lookup"));
}
