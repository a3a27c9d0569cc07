use loppis_client::error::ServiceError;
use loppis_client::{ClientConfig, ListingService};
use loppis_common::category::{self, Category};
use loppis_common::listing::{Condition, ListingId, ListingStatus, ListingUpdate, NewListing, UserId};
use loppis_service_integration::{listing, FakeService};
use reqwest::StatusCode;

fn category(id: u32, slug: &str, children: Vec<Category>) -> Category {
    Category {
        id,
        name: slug.to_uppercase(),
        slug: slug.to_string(),
        sort_order: 0,
        icon: None,
        children,
    }
}

#[tokio::test]
async fn lists_and_gets_listings() {
    let service = FakeService::start(vec![listing(1, "Sofa", 1200, 4), listing(2, "Lamp", 119, 5)]).await;
    let client = service.client();

    let all = client.list_listings().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].title, "Sofa");

    let lamp = client.get_listing(ListingId(2)).await.unwrap();
    assert_eq!(lamp.price_sek, 119);
}

#[tokio::test]
async fn missing_listing_is_a_404_status() {
    let service = FakeService::start(Vec::new()).await;
    let err = service.client().get_listing(ListingId(99)).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
    match err {
        ServiceError::Status { body, .. } => assert!(body.contains("Listing not found")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn create_update_delete_round_trip() {
    let service = FakeService::start(vec![listing(1, "Sofa", 1200, 4)]).await;
    let client = service.client();

    let created = client
        .create_listing(&NewListing {
            user_id: UserId(6),
            title: "Mountain Bike".into(),
            description: "27.5 inch".into(),
            price_sek: 500,
            condition: Condition::Used,
            category_id: Some(7),
            city: Some("Malmö".into()),
            latitude: None,
            longitude: None,
            status: ListingStatus::Published,
        })
        .await
        .unwrap();
    assert_eq!(created.id, ListingId(2));
    assert_eq!(created.user_id, Some(UserId(6)));

    let updated = client
        .update_listing(
            created.id,
            &ListingUpdate {
                price_sek: Some(450),
                ..ListingUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price_sek, 450);
    assert_eq!(updated.title, "Mountain Bike");
    assert_eq!(updated.city.as_deref(), Some("Malmö"));

    client.delete_listing(created.id).await.unwrap();
    assert!(client.get_listing(created.id).await.unwrap_err().is_not_found());
    assert!(client.delete_listing(created.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn non_success_list_surfaces_status_and_body() {
    let service = FakeService::start(vec![listing(1, "Sofa", 1200, 4)]).await;
    service.fail_list(Some(StatusCode::INTERNAL_SERVER_ERROR)).await;

    match service.client().list_listings().await {
        Err(ServiceError::Status { status, body }) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("unavailable"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ListingService::new(ClientConfig::new(format!("http://{addr}"))).unwrap();
    let err = client.list_listings().await.unwrap_err();
    assert!(matches!(err, ServiceError::Http(_)), "{err}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn unexpected_body_is_a_decode_error() {
    let service = FakeService::start(Vec::new()).await;
    service.garble_categories().await;
    match service.client().categories().await {
        Err(ServiceError::Decode { path, .. }) => assert_eq!(path, "/categories/"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn category_tree_supports_path_lookup() {
    let service = FakeService::start(Vec::new()).await;
    service
        .set_categories(vec![
            category(1, "electronics", vec![category(10, "phones", Vec::new())]),
            category(2, "furniture", Vec::new()),
        ])
        .await;

    let tree = service.client().categories().await.unwrap();
    let phones = category::find_by_path(&tree, &["electronics", "phones"]).unwrap();
    assert_eq!(phones.id, 10);
    let crumbs: Vec<_> = category::path_to(&tree, 10)
        .unwrap()
        .iter()
        .map(|c| c.slug.as_str())
        .collect();
    assert_eq!(crumbs, ["electronics", "phones"]);
}

#[tokio::test]
async fn account_calls() {
    use loppis_client::auth::{Credentials, EmailVerification, Registration};

    let service = FakeService::start(Vec::new()).await;
    let client = service.client();
    let credentials = Credentials {
        email: "mirza@example.se".into(),
        password: "hunter22".into(),
    };

    let receipt = client
        .register(&Registration {
            email: "mirza@example.se".into(),
            password: "hunter22".into(),
            name: "Mirza".into(),
            city: "Uppsala".into(),
        })
        .await
        .unwrap();
    let verification_token = receipt.verification_token.expect("token in reply");

    let unverified = client.login(&credentials).await.unwrap_err();
    assert_eq!(unverified.status(), Some(StatusCode::FORBIDDEN));

    let wrong = client
        .verify_email(&EmailVerification {
            email: "mirza@example.se".into(),
            token: "guess".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(wrong.status(), Some(StatusCode::BAD_REQUEST));

    client
        .verify_email(&EmailVerification {
            email: "mirza@example.se".into(),
            token: verification_token,
        })
        .await
        .unwrap();

    let bad = client
        .login(&Credentials {
            email: "mirza@example.se".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(bad.status(), Some(StatusCode::UNAUTHORIZED));

    let token = client.login(&credentials).await.unwrap();
    let me = client.me(&token.access_token).await.unwrap();
    assert_eq!(me.email, "mirza@example.se");
    assert!(me.email_verified);

    assert_eq!(
        client.me("forged").await.unwrap_err().status(),
        Some(StatusCode::UNAUTHORIZED)
    );
}
