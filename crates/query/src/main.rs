//! Shopfront query CLI
//!
//! Runs searches, lookups and aggregates against the configured store and
//! prints the results as JSON.
//!
//! Usage:
//!   shopfront products --keyword lamp --min-price 1000 --sort-by price --sort-direction desc
//!   shopfront orders --user-id 1 --with user,items --page 0 --size 10
//!   shopfront top-products --limit 5

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use shopfront_query::config::Config;
use shopfront_query::db::{self, Store};
use shopfront_query::models::OrderStatus;
use shopfront_query::query::{
    OrderItemSearch, OrderSearch, PageRequest, ProductSearch, QueryOptions, Relation, SortSpec,
    UserSearch,
};
use shopfront_query::repository::{
    OrderItemRepository, OrderRepository, ProductRepository, Repository, UserRepository,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the store connection.
    Health,

    /// Search products.
    Products {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        min_price: Option<i64>,
        #[arg(long)]
        max_price: Option<i64>,
        #[arg(long)]
        brand_id: Option<i64>,
        #[arg(long)]
        category_id: Option<i64>,
        #[command(flatten)]
        common: SearchArgs,
    },

    /// Search orders.
    Orders {
        #[arg(long)]
        user_id: Option<i64>,
        /// Only orders containing this product.
        #[arg(long)]
        product_id: Option<i64>,
        #[arg(long)]
        status: Option<OrderStatus>,
        /// RFC 3339 timestamp, inclusive.
        #[arg(long)]
        start_date: Option<DateTime<Utc>>,
        /// RFC 3339 timestamp, inclusive.
        #[arg(long)]
        end_date: Option<DateTime<Utc>>,
        #[command(flatten)]
        common: SearchArgs,
    },

    /// Search users.
    Users {
        /// Matches username or email.
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[command(flatten)]
        common: SearchArgs,
    },

    /// Search order items.
    OrderItems {
        #[arg(long)]
        order_id: Option<i64>,
        #[arg(long)]
        product_id: Option<i64>,
        #[arg(long)]
        min_price: Option<i64>,
        #[arg(long)]
        max_price: Option<i64>,
        #[arg(long)]
        min_quantity: Option<i64>,
        #[command(flatten)]
        common: SearchArgs,
    },

    /// Total price of one order.
    OrderTotal {
        #[arg(long)]
        order_id: i64,
    },

    /// Total quantity ordered of one product.
    ProductQuantity {
        #[arg(long)]
        product_id: i64,
    },

    /// Most-ordered products by quantity.
    TopProducts {
        #[arg(long, default_value = "10")]
        limit: i64,
    },

    /// Most recently placed orders.
    RecentOrders {
        #[arg(long, default_value = "10")]
        limit: i64,
    },

    /// Change an order's status.
    SetStatus {
        #[arg(long)]
        order_id: i64,
        #[arg(long)]
        status: OrderStatus,
    },
}

/// Relations, sorting and paging shared by the search subcommands.
#[derive(Args, Debug)]
struct SearchArgs {
    /// Comma-separated relations to load eagerly.
    #[arg(long = "with", value_delimiter = ',')]
    with: Vec<String>,

    /// Load every to-one relation plus the default collection.
    #[arg(long, conflicts_with = "with")]
    all_details: bool,

    #[arg(long)]
    sort_by: Option<String>,

    /// `asc` or `desc`.
    #[arg(long)]
    sort_direction: Option<String>,

    /// Page index (0-based).
    #[arg(long)]
    page: Option<i64>,

    #[arg(long)]
    size: Option<i64>,
}

impl SearchArgs {
    fn relations<R: Relation>(&self) -> Result<Vec<R>> {
        if self.all_details {
            return Ok(R::all_details());
        }
        self.with
            .iter()
            .map(|name| R::parse(name).with_context(|| format!("unknown relation: {name}")))
            .collect()
    }

    fn sort(&self) -> SortSpec {
        SortSpec {
            sort_by: self.sort_by.clone(),
            sort_direction: self.sort_direction.clone(),
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            size: self.size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    let database = db::create_pool(&config)
        .await
        .context("failed to initialize the store")?;
    info!(dialect = ?database.dialect(), "store connected");

    let store: Arc<dyn Store> = Arc::new(database);
    let options = QueryOptions::from(&config);

    run(cli.command, store, options).await
}

async fn run(command: Command, store: Arc<dyn Store>, options: QueryOptions) -> Result<()> {
    match command {
        Command::Health => {
            let healthy = db::check_health(store.as_ref()).await;
            print_json(&serde_json::json!({ "healthy": healthy }))?;
            if !healthy {
                anyhow::bail!("store health check failed");
            }
        }
        Command::Products {
            keyword,
            min_price,
            max_price,
            brand_id,
            category_id,
            common,
        } => {
            let criteria = ProductSearch {
                keyword,
                min_price,
                max_price,
                brand_id,
                category_id,
                relations: common.relations()?,
                sort: common.sort(),
                page: common.page(),
            };
            let repository: ProductRepository = Repository::new(store, options);
            print_json(&repository.search(&criteria).await?)?;
        }
        Command::Orders {
            user_id,
            product_id,
            status,
            start_date,
            end_date,
            common,
        } => {
            let criteria = OrderSearch {
                user_id,
                product_id,
                status,
                start_date,
                end_date,
                relations: common.relations()?,
                sort: common.sort(),
                page: common.page(),
            };
            let repository: OrderRepository = Repository::new(store, options);
            print_json(&repository.search(&criteria).await?)?;
        }
        Command::Users {
            keyword,
            username,
            email,
            common,
        } => {
            let criteria = UserSearch {
                keyword,
                username,
                email,
                relations: common.relations()?,
                sort: common.sort(),
                page: common.page(),
            };
            let repository: UserRepository = Repository::new(store, options);
            print_json(&repository.search(&criteria).await?)?;
        }
        Command::OrderItems {
            order_id,
            product_id,
            min_price,
            max_price,
            min_quantity,
            common,
        } => {
            let criteria = OrderItemSearch {
                order_id,
                product_id,
                min_price,
                max_price,
                min_quantity,
                relations: common.relations()?,
                sort: common.sort(),
                page: common.page(),
            };
            let repository: OrderItemRepository = Repository::new(store, options);
            print_json(&repository.search(&criteria).await?)?;
        }
        Command::OrderTotal { order_id } => {
            let repository: OrderItemRepository = Repository::new(store, options);
            let total = repository.total_for_order(order_id).await?;
            print_json(&serde_json::json!({ "order_id": order_id, "total": total }))?;
        }
        Command::ProductQuantity { product_id } => {
            let repository: OrderItemRepository = Repository::new(store, options);
            let quantity = repository.total_quantity_for_product(product_id).await?;
            print_json(&serde_json::json!({ "product_id": product_id, "quantity": quantity }))?;
        }
        Command::TopProducts { limit } => {
            let repository: OrderItemRepository = Repository::new(store, options);
            print_json(&repository.top_ordered_products(limit).await?)?;
        }
        Command::RecentOrders { limit } => {
            let repository: OrderRepository = Repository::new(store, options);
            print_json(&repository.recent(limit).await?)?;
        }
        Command::SetStatus { order_id, status } => {
            let repository: OrderRepository = Repository::new(store, options);
            print_json(&repository.update_status(order_id, status).await?)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
