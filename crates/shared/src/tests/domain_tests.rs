use super::*;
use serde_json::json;

#[test]
fn rider_without_driver_fields_has_no_extension() {
    let user: User = serde_json::from_value(json!({
        "id": 4,
        "name": "Ada",
        "email": "ada@example.com",
        "phone": "+1555",
        "country": "NG",
        "verified": 1,
        "account_balance": 12.5
    }))
    .expect("decode rider");

    assert_eq!(user.id, UserId(4));
    assert!(user.is_verified());
    assert_eq!(user.account_balance, 12.5);
    assert!(user.driver.is_none());
    assert_eq!(user.account_status(), None);
}

#[test]
fn driver_status_lands_in_extension() {
    let user: User = serde_json::from_value(json!({
        "id": 9,
        "name": "Bola",
        "email": "bola@example.com",
        "phone": "",
        "country": "NG",
        "verified": 0,
        "account_balance": "40.25",
        "status": 2
    }))
    .expect("decode driver");

    assert_eq!(user.driver, Some(DriverDetails { status: 2 }));
    assert_eq!(user.account_status(), Some(2));
    assert_eq!(user.account_balance, 40.25);
    assert!(!user.is_verified());
}

#[test]
fn non_numeric_balance_is_rejected() {
    let result = serde_json::from_value::<User>(json!({
        "id": 1,
        "account_balance": "lots"
    }));
    assert!(result.is_err());
}

#[test]
fn booking_accepts_legacy_pickup_spelling() {
    let booking: Booking = serde_json::from_value(json!({
        "id": 3,
        "booking_code": "BK-3",
        "pickuptype": "scheduled",
        "place": "Airport",
        "destination_place": "Harbour",
        "status": "Pending"
    }))
    .expect("decode booking");

    assert_eq!(booking.pickup_type.as_deref(), Some("scheduled"));
    assert!(booking.has_status("pending"));
    assert!(!booking.has_status("accepted"));
}

#[test]
fn kyc_files_keep_only_real_uploads() {
    let files = KycFiles::parse(
        r#"[{"image":"https://cdn.example.com/a.png"},{"image":"n/a"},{"other":1},null]"#,
    );
    assert_eq!(
        files,
        KycFiles::Documents(vec!["https://cdn.example.com/a.png".to_string()])
    );
    assert!(!files.is_invalid());
}

#[test]
fn kyc_files_degrade_to_invalid_marker() {
    let files = KycFiles::parse("{not json");
    assert!(files.is_invalid());
    assert!(files.documents().is_empty());
}

#[test]
fn kyc_document_with_bad_files_still_decodes() {
    let doc: KycDocument = serde_json::from_value(json!({
        "id": 5,
        "driver_id": 9,
        "name": "Bola",
        "email": "bola@example.com",
        "files": "oops"
    }))
    .expect("decode kyc");

    assert_eq!(doc.driver_id, UserId(9));
    assert_eq!(
        doc.files,
        KycFiles::Invalid {
            raw: "oops".to_string()
        }
    );
}

#[test]
fn kyc_document_accepts_decoded_array() {
    let doc: KycDocument = serde_json::from_value(json!({
        "id": 5,
        "driver_id": 9,
        "files": [{"image": "https://cdn.example.com/licence.jpg"}]
    }))
    .expect("decode kyc");

    assert_eq!(
        doc.files.documents(),
        &["https://cdn.example.com/licence.jpg".to_string()]
    );
}

#[test]
fn account_type_matches_query_values() {
    assert_eq!(AccountType::Passenger.as_str(), "passenger");
    assert_eq!(AccountType::Driver.as_str(), "driver");
    assert_eq!(AccountType::default(), AccountType::Passenger);
}
