use anyhow::{bail, Context};
use clap::Args;
use loppis_client::CheckoutDriver;
use loppis_common::checkout::{CheckoutAction, CheckoutStep, ContactForm};
use loppis_common::currency::format_sek;
use loppis_common::delivery::{DeliveryType, ShippingProvider};
use loppis_common::listing::{ListingId, UserId};
use loppis_common::payment::SimulatedPayment;

use super::GlobalArgs;

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Listing to buy
    listing_id: u64,

    /// Your user id, used to refuse buying your own listing
    #[arg(long, env = "LOPPIS_USER_ID")]
    user_id: Option<u64>,

    /// pickup or flat
    #[arg(long, default_value = "pickup")]
    delivery: DeliveryType,

    /// Carrier for flat delivery: postnord or instabox
    #[arg(long)]
    provider: Option<ShippingProvider>,

    /// Pickup request sent to the seller
    #[arg(long)]
    message: Option<String>,

    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    address: String,

    /// Make the simulated payment decline with this reason
    #[arg(long)]
    decline: Option<String>,
}

pub(crate) async fn run(global: &GlobalArgs, args: CheckoutArgs) -> anyhow::Result<()> {
    let mut payment = SimulatedPayment::new();
    if let Some(reason) = &args.decline {
        payment.decline_next(reason.clone());
    }
    let mut driver = CheckoutDriver::new(global.service()?, payment, args.user_id.map(UserId));

    let state = driver.load_catalog().await;
    if let Some(error) = state.browse(&Default::default()).error {
        bail!("{error}");
    }

    let mut actions = vec![
        CheckoutAction::SelectListing(ListingId(args.listing_id)),
        CheckoutAction::BuyNow,
        CheckoutAction::ChooseDelivery(args.delivery),
    ];
    if let Some(provider) = args.provider {
        actions.push(CheckoutAction::ChooseProvider(provider));
    }
    if let Some(message) = args.message {
        actions.push(CheckoutAction::EditPickupMessage(message));
        actions.push(CheckoutAction::SubmitPickupRequest);
        actions.push(CheckoutAction::DismissPickupAck);
    }
    actions.push(CheckoutAction::ContinueToContact);
    actions.push(CheckoutAction::SubmitContact(ContactForm {
        name: args.name,
        email: args.email,
        address: args.address,
    }));

    for action in actions {
        let name = action.name();
        let state = driver.dispatch(action);
        if let Some(error) = &state.error {
            bail!("{name} failed at the {} step: {error}", state.step);
        }
    }

    let amount = driver.state().draft.amount_sek;
    println!("paying {}", format_sek(amount));
    let step = driver.pay().await.context("payment could not start")?.step;

    match step {
        CheckoutStep::Confirmation => {
            let order = driver.order().context("confirmed order is missing")?;
            println!("order_id: {}", order.id);
            println!("delivery: {}", order.delivery_type);
            if let Some(provider) = order.shipping_provider {
                println!("carrier:  {provider}");
            }
            if let Some(address) = &order.delivery_address {
                println!("ship to:  {address}");
            }
            if !driver.state().catalog.pending_sync().is_empty() {
                eprintln!("warning: the listing could not be marked sold on the service yet");
            }
            Ok(())
        }
        step => {
            let reason = driver.state().error.as_ref().map(ToString::to_string).unwrap_or_default();
            bail!("checkout ended at the {step} step: {reason}")
        }
    }
}
