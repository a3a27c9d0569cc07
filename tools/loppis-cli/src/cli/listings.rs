use anyhow::{bail, Context};
use clap::Args;
use loppis_common::catalog::{Catalog, CategoryFilter, ListingFilter};
use loppis_common::category::{self, Category};
use loppis_common::currency::format_sek;
use loppis_common::listing::{Condition, Listing, ListingId, ListingStatus, ListingUpdate, NewListing, UserId};
use loppis_common::location::GeoLocation;

use super::GlobalArgs;

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    /// Category label (case-insensitive) or numeric category id
    #[arg(long)]
    category: Option<String>,

    /// Highest price in SEK, inclusive
    #[arg(long)]
    max_price: Option<u64>,

    /// Text to look for in title or city
    #[arg(long, short)]
    query: Option<String>,

    /// Only listings near this point, as "LAT,LON"
    #[arg(long, requires = "radius_km")]
    near: Option<String>,

    /// Radius for --near, in km
    #[arg(long, requires = "near")]
    radius_km: Option<f64>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl ListArgs {
    fn filter(&self) -> anyhow::Result<ListingFilter> {
        let category = self.category.as_deref().map(|raw| match raw.parse::<u32>() {
            Ok(id) => CategoryFilter::Id(id),
            Err(_) => CategoryFilter::Label(raw.to_string()),
        });
        let near = match (&self.near, self.radius_km) {
            (Some(point), Some(radius)) => Some((parse_point(point)?, radius)),
            _ => None,
        };
        Ok(ListingFilter {
            category,
            max_price_sek: self.max_price,
            query: self.query.clone(),
            near,
        })
    }
}

fn parse_point(raw: &str) -> anyhow::Result<GeoLocation> {
    let (lat, lon) = raw
        .split_once(',')
        .with_context(|| format!("expected LAT,LON but got {raw:?}"))?;
    let lat: f64 = lat.trim().parse().context("invalid latitude")?;
    let lon: f64 = lon.trim().parse().context("invalid longitude")?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("coordinates out of range: {lat},{lon}");
    }
    Ok(GeoLocation::new(lat, lon))
}

pub(crate) async fn list(global: &GlobalArgs, args: ListArgs) -> anyhow::Result<()> {
    let filter = args.filter()?;
    let service = global.service()?;
    let catalog = Catalog::new(service.list_listings().await.context("could not load listings")?);
    let matches: Vec<_> = catalog.filter(&filter).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }
    if matches.is_empty() {
        println!("No listings found.");
        return Ok(());
    }
    for listing in &matches {
        print_row(listing);
    }
    Ok(())
}

fn print_row(listing: &Listing) {
    let sold = if listing.is_sold() { "  [sold]" } else { "" };
    println!(
        "{:>6}  {:<40}  {:>12}  {}{}",
        listing.id,
        listing.teaser(40),
        format_sek(listing.price_sek),
        listing.city.as_deref().unwrap_or("-"),
        sold
    );
}

#[derive(Debug, Args)]
pub(crate) struct ShowArgs {
    id: u64,
}

pub(crate) async fn show(global: &GlobalArgs, args: ShowArgs) -> anyhow::Result<()> {
    let listing = global
        .service()?
        .get_listing(ListingId(args.id))
        .await
        .with_context(|| format!("could not load listing {}", args.id))?;

    println!("{}", listing.title);
    println!("  price:     {}", format_sek(listing.price_sek));
    println!("  condition: {}", listing.condition.map_or("-", Condition::label));
    println!("  status:    {}", listing.status);
    if let Some(city) = &listing.city {
        println!("  city:      {city}");
    }
    if let Some(category) = &listing.category {
        println!("  category:  {category}");
    }
    if let Some(image) = listing.card_image() {
        println!("  image:     {image}");
    }
    if !listing.description.is_empty() {
        println!();
        println!("{}", listing.description);
    }
    Ok(())
}

#[derive(Debug, Args)]
pub(crate) struct CreateArgs {
    /// Seller account publishing the listing
    #[arg(long, env = "LOPPIS_USER_ID")]
    user_id: u64,

    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Price in whole SEK
    #[arg(long)]
    price: u64,

    /// new, like_new, good, used or needs_repair
    #[arg(long, default_value = "good")]
    condition: Condition,

    #[arg(long)]
    category_id: Option<u32>,

    #[arg(long)]
    city: Option<String>,

    /// Save as draft instead of publishing
    #[arg(long)]
    draft: bool,
}

pub(crate) async fn create(global: &GlobalArgs, args: CreateArgs) -> anyhow::Result<()> {
    if args.title.trim().is_empty() {
        bail!("title cannot be empty");
    }
    let new = NewListing {
        user_id: UserId(args.user_id),
        title: args.title,
        description: args.description,
        price_sek: args.price,
        condition: args.condition,
        category_id: args.category_id,
        city: args.city,
        latitude: None,
        longitude: None,
        status: if args.draft {
            ListingStatus::Draft
        } else {
            ListingStatus::Published
        },
    };
    let listing = global
        .service()?
        .create_listing(&new)
        .await
        .context("could not create listing")?;
    println!("listing_id: {}", listing.id);
    Ok(())
}

#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    id: u64,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    price: Option<u64>,

    #[arg(long)]
    condition: Option<Condition>,

    #[arg(long)]
    category_id: Option<u32>,

    #[arg(long)]
    city: Option<String>,

    /// draft, published, paused, sold or removed
    #[arg(long)]
    status: Option<ListingStatus>,
}

pub(crate) async fn update(global: &GlobalArgs, args: UpdateArgs) -> anyhow::Result<()> {
    let update = ListingUpdate {
        title: args.title,
        description: args.description,
        price_sek: args.price,
        condition: args.condition,
        category_id: args.category_id,
        city: args.city,
        status: args.status,
    };
    if update.is_empty() {
        bail!("nothing to update");
    }
    let listing = global
        .service()?
        .update_listing(ListingId(args.id), &update)
        .await
        .with_context(|| format!("could not update listing {}", args.id))?;
    print_row(&listing);
    Ok(())
}

#[derive(Debug, Args)]
pub(crate) struct DeleteArgs {
    id: u64,
}

pub(crate) async fn delete(global: &GlobalArgs, args: DeleteArgs) -> anyhow::Result<()> {
    global
        .service()?
        .delete_listing(ListingId(args.id))
        .await
        .with_context(|| format!("could not delete listing {}", args.id))?;
    println!("deleted {}", args.id);
    Ok(())
}

#[derive(Debug, Args)]
pub(crate) struct CategoriesArgs {
    /// Only print the subtree at this slug path, e.g. "electronics/phones"
    #[arg(long)]
    path: Option<String>,
}

pub(crate) async fn categories(global: &GlobalArgs, args: CategoriesArgs) -> anyhow::Result<()> {
    let mut tree = global
        .service()?
        .categories()
        .await
        .context("could not load categories")?;
    category::sort_tree(&mut tree);

    match args.path {
        Some(path) => {
            let slugs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let node = category::find_by_path(&tree, &slugs).with_context(|| format!("no category at {path}"))?;
            let crumbs: Vec<&str> = category::path_to(&tree, node.id)
                .unwrap_or_default()
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            println!("{}", crumbs.join(" > "));
            print_tree(&node.children, 1);
        }
        None => print_tree(&tree, 0),
    }
    Ok(())
}

fn print_tree(categories: &[Category], depth: usize) {
    for c in categories {
        println!("{:indent$}{} ({})", "", c.name, c.slug, indent = depth * 2);
        print_tree(&c.children, depth + 1);
    }
}
