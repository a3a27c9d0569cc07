use std::time::Duration;

use loppis_client::{CheckoutDriver, ListingService, LocalStore};
use loppis_common::cart::CartItem;
use loppis_common::catalog::ListingFilter;
use loppis_common::checkout::{CheckoutAction, CheckoutError, CheckoutStep, ContactForm};
use loppis_common::delivery::{DeliveryType, ShippingProvider};
use loppis_common::listing::{Condition, ListingId, ListingStatus, NewListing, UserId};
use loppis_common::payment::SimulatedPayment;
use loppis_service_integration::{listing, FakeService};
use reqwest::StatusCode;

const BUYER: UserId = UserId(3);

fn contact() -> ContactForm {
    ContactForm {
        name: "Ekaterina".into(),
        email: "ek@example.se".into(),
        address: "Storgatan 1, 111 22 Stockholm".into(),
    }
}

async fn driver(service: &FakeService) -> CheckoutDriver<ListingService, SimulatedPayment> {
    let mut driver = CheckoutDriver::new(service.client(), SimulatedPayment::seeded(42), Some(BUYER));
    driver.load_catalog().await;
    driver
}

fn run(driver: &mut CheckoutDriver<ListingService, SimulatedPayment>, actions: Vec<CheckoutAction>) {
    for action in actions {
        let state = driver.dispatch(action.clone());
        assert!(state.error.is_none(), "{action:?}: {:?}", state.error);
    }
}

#[tokio::test]
async fn shipped_purchase_marks_listing_sold_everywhere() {
    let service = FakeService::start(vec![listing(1, "iPhone 13 Pro Max", 9500, 2), listing(2, "Sofa", 1200, 4)]).await;
    let mut driver = driver(&service).await;
    assert_eq!(driver.state().catalog.len(), 2);

    run(
        &mut driver,
        vec![
            CheckoutAction::SelectListing(ListingId(1)),
            CheckoutAction::BuyNow,
            CheckoutAction::ChooseDelivery(DeliveryType::Flat),
            CheckoutAction::ChooseProvider(ShippingProvider::Postnord),
            CheckoutAction::ContinueToContact,
            CheckoutAction::SubmitContact(contact()),
        ],
    );
    let state = driver.pay().await.unwrap();
    assert_eq!(state.step, CheckoutStep::Confirmation);

    let order = driver.order().unwrap();
    assert!(order.id.as_str().starts_with("ORDER-"));
    assert_eq!(order.shipping_provider, Some(ShippingProvider::Postnord));
    assert_eq!(order.delivery_address.as_deref(), Some("Storgatan 1, 111 22 Stockholm"));

    assert_eq!(service.listing(ListingId(1)).await.unwrap().status, ListingStatus::Sold);

    // A fresh fetch now carries the sold status, so the overlay entry goes away
    driver.dispatch(CheckoutAction::Reset);
    driver.load_catalog().await;
    assert!(driver.state().catalog.overlay().is_empty());
    assert!(!driver.state().can_buy(ListingId(1)));
    assert!(driver.state().can_buy(ListingId(2)));
}

#[tokio::test]
async fn pickup_purchase_needs_no_provider_or_address() {
    let service = FakeService::start(vec![listing(2, "Sofa", 1200, 4)]).await;
    let mut driver = driver(&service).await;

    run(
        &mut driver,
        vec![
            CheckoutAction::SelectListing(ListingId(2)),
            CheckoutAction::BuyNow,
            CheckoutAction::EditPickupMessage("Can I come Saturday?".into()),
            CheckoutAction::SubmitPickupRequest,
            CheckoutAction::ContinueToContact,
            CheckoutAction::SubmitContact(contact()),
        ],
    );
    driver.pay().await.unwrap();

    let order = driver.order().unwrap();
    assert_eq!(order.delivery_type, DeliveryType::Pickup);
    assert_eq!(order.shipping_provider, None);
    assert_eq!(order.delivery_address, None);
    assert_eq!(order.message.as_deref(), Some("Can I come Saturday?"));
}

#[tokio::test]
async fn failed_fetch_shows_error_and_no_listings() {
    let service = FakeService::start(vec![listing(1, "Sofa", 1200, 4)]).await;
    service.fail_list(Some(StatusCode::SERVICE_UNAVAILABLE)).await;

    let driver = driver(&service).await;
    let view = driver.state().browse(&ListingFilter::default());
    assert!(view.listings.is_empty());
    assert!(view.error.unwrap().contains("503"));
    assert_eq!(service.list_requests().await, 1);
}

#[tokio::test]
async fn own_listing_cannot_be_bought() {
    let service = FakeService::start(vec![listing(5, "Bike", 500, BUYER.0)]).await;
    let mut driver = driver(&service).await;
    driver.dispatch(CheckoutAction::SelectListing(ListingId(5)));
    let state = driver.dispatch(CheckoutAction::BuyNow);
    assert_eq!(state.step, CheckoutStep::ListingDetail);
    assert_eq!(state.error, Some(CheckoutError::OwnListing));
}

#[tokio::test]
async fn listing_created_by_viewer_is_their_own() {
    let service = FakeService::start(vec![listing(1, "Lamp", 119, 2)]).await;
    let created = service
        .client()
        .create_listing(&NewListing {
            user_id: BUYER,
            title: "Rocking chair".into(),
            description: "Oak".into(),
            price_sek: 800,
            condition: Condition::Good,
            category_id: None,
            city: Some("Lund".into()),
            latitude: None,
            longitude: None,
            status: ListingStatus::Published,
        })
        .await
        .unwrap();

    let mut driver = driver(&service).await;
    assert!(!driver.state().can_buy(created.id));
    driver.dispatch(CheckoutAction::SelectListing(created.id));
    let state = driver.dispatch(CheckoutAction::BuyNow);
    assert_eq!(state.step, CheckoutStep::ListingDetail);
    assert_eq!(state.error, Some(CheckoutError::OwnListing));
}

#[tokio::test]
async fn rejected_sync_keeps_overlay_until_service_accepts() {
    let service = FakeService::start(vec![listing(1, "Lamp", 119, 2)]).await;
    service.fail_updates(Some(StatusCode::BAD_GATEWAY)).await;
    let mut driver = driver(&service).await;

    run(
        &mut driver,
        vec![
            CheckoutAction::SelectListing(ListingId(1)),
            CheckoutAction::BuyNow,
            CheckoutAction::ContinueToContact,
            CheckoutAction::SubmitContact(contact()),
        ],
    );
    assert_eq!(driver.pay().await.unwrap().step, CheckoutStep::Confirmation);
    assert_eq!(driver.state().catalog.pending_sync(), vec![(ListingId(1), ListingStatus::Sold)]);

    // Refetch still reports it published; the local sold status survives
    driver.dispatch(CheckoutAction::Reset);
    driver.load_catalog().await;
    assert!(!driver.state().can_buy(ListingId(1)));

    service.fail_updates(None).await;
    assert_eq!(driver.sync_sold().await, 1);
    assert_eq!(service.listing(ListingId(1)).await.unwrap().status, ListingStatus::Sold);
}

#[tokio::test]
async fn abandoned_fetch_result_is_discarded() {
    let service = FakeService::start(vec![listing(1, "Lamp", 119, 2)]).await;
    service.delay_list(Duration::from_millis(300)).await;

    let mut driver = CheckoutDriver::new(service.client(), SimulatedPayment::seeded(1), None);
    let fetch = driver.start_catalog_fetch().unwrap();
    let ticket = fetch.ticket();
    let abandoned = fetch.abandon();
    driver.dispatch(abandoned);

    // Even if a result for the old ticket shows up, it is ignored
    let state = driver.dispatch(CheckoutAction::CatalogFetched {
        ticket,
        outcome: Ok(vec![listing(1, "Lamp", 119, 2)]),
    });
    assert!(state.catalog.is_empty());
    assert!(state.pending_fetch.is_none());
}

#[tokio::test]
async fn cart_lines_persist_across_store_reopen() {
    let service = FakeService::start(vec![listing(1, "Lamp", 119, 2)]).await;
    let lamp = service.client().get_listing(ListingId(1)).await.unwrap();
    let dir = tempfile::tempdir().unwrap();

    let store = LocalStore::open(dir.path()).unwrap();
    let mut cart = store.load_cart();
    cart.add(
        CartItem {
            id: lamp.id.to_string(),
            title: lamp.title.clone(),
            price: lamp.price_sek,
            image: String::new(),
            quantity: 1,
        },
        3,
    );
    store.save_cart(&cart);

    let reopened = LocalStore::open(dir.path()).unwrap().load_cart();
    assert_eq!(reopened.count(), 3);
    assert_eq!(reopened.total(), 357);
}
