use anyhow::Context;
use clap::{Args, Subcommand};
use loppis_common::cart::CartItem;
use loppis_common::currency::format_sek;
use loppis_common::listing::ListingId;

use super::GlobalArgs;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: Option<CartSubcommand>,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Print the cart (default)
    Show,
    /// Add a listing, looked up on the service
    Add {
        listing_id: u64,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line
    Remove { listing_id: u64 },
    /// Set a line's quantity (clamped to 1..=99)
    Set { listing_id: u64, quantity: u32 },
    /// Empty the cart
    Clear,
}

pub(crate) async fn cart(global: &GlobalArgs, command: CartCommand) -> anyhow::Result<()> {
    let store = global.store()?;
    let mut cart = store.load_cart();

    match command.command.unwrap_or(CartSubcommand::Show) {
        CartSubcommand::Show => {}
        CartSubcommand::Add { listing_id, quantity } => {
            let listing = global
                .service()?
                .get_listing(ListingId(listing_id))
                .await
                .with_context(|| format!("could not load listing {listing_id}"))?;
            let item = CartItem {
                id: listing.id.to_string(),
                title: listing.title.clone(),
                price: listing.price_sek,
                image: listing.card_image().unwrap_or_default().to_string(),
                quantity,
            };
            cart.add(item, quantity);
            store.save_cart(&cart);
        }
        CartSubcommand::Remove { listing_id } => {
            cart.remove(&listing_id.to_string());
            store.save_cart(&cart);
        }
        CartSubcommand::Set { listing_id, quantity } => {
            cart.set_quantity(&listing_id.to_string(), quantity);
            store.save_cart(&cart);
        }
        CartSubcommand::Clear => {
            cart.clear();
            store.save_cart(&cart);
        }
    }

    if cart.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }
    for item in cart.items() {
        println!(
            "{:>6}  {:<40}  {:>3} x {:>10}",
            item.id,
            item.title,
            item.quantity,
            format_sek(item.price)
        );
    }
    println!("{} items, total {}", cart.count(), format_sek(cart.total()));
    Ok(())
}

#[derive(Debug, Args)]
pub(crate) struct FavoritesCommand {
    #[command(subcommand)]
    command: Option<FavoritesSubcommand>,
}

#[derive(Debug, Subcommand)]
enum FavoritesSubcommand {
    /// Print favorites (default)
    Show,
    /// Add or remove a listing id
    Toggle { listing_id: u64 },
    Clear,
}

pub(crate) fn favorites(global: &GlobalArgs, command: FavoritesCommand) -> anyhow::Result<()> {
    let store = global.store()?;
    let mut favorites = store.load_favorites();

    match command.command.unwrap_or(FavoritesSubcommand::Show) {
        FavoritesSubcommand::Show => {}
        FavoritesSubcommand::Toggle { listing_id } => {
            let added = favorites.toggle(&listing_id.to_string());
            store.save_favorites(&favorites);
            println!("{} {listing_id}", if added { "saved" } else { "removed" });
        }
        FavoritesSubcommand::Clear => {
            favorites.clear();
            store.save_favorites(&favorites);
        }
    }

    if favorites.ids().is_empty() {
        println!("No favorites yet.");
    } else {
        println!("{}", favorites.ids().join(", "));
    }
    Ok(())
}
