//! List command implementation.

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use colored::Colorize;
use tracing::debug;

use rxstorage_http::{
    ApiClient, Author, Category, Entity, EntityList, Item, ItemFilter, Location, PositionSchema,
    Visibility,
};
use rxstorage_search::{LoadOutcome, SearchConfig, SearchController};

use crate::cli::{ApiArgs, EntityKind};
use crate::output;
use crate::session::Connection;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Entity to list
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Free-text search
    #[arg(long, short)]
    pub search: Option<String>,

    /// Page size requested from the server
    #[arg(long)]
    pub limit: Option<u32>,

    /// Number of pages to fetch
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pub pages: u32,

    /// Follow cursors until the last page
    #[arg(long)]
    pub all: bool,

    /// Only items in this category
    #[arg(long)]
    pub category: Option<i64>,

    /// Only items at this location
    #[arg(long)]
    pub location: Option<i64>,

    /// Only items by this author
    #[arg(long)]
    pub author: Option<i64>,

    /// Only items with this visibility
    #[arg(long, value_enum)]
    pub visibility: Option<VisibilityArg>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum VisibilityArg {
    Public,
    Private,
}

impl From<VisibilityArg> for Visibility {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::Public => Visibility::Public,
            VisibilityArg::Private => Visibility::Private,
        }
    }
}

impl ListArgs {
    fn item_filter(&self) -> ItemFilter {
        ItemFilter {
            category_id: self.category,
            location_id: self.location,
            author_id: self.author,
            visibility: self.visibility.map(Visibility::from),
        }
    }

    fn has_item_filters(&self) -> bool {
        self.item_filter() != ItemFilter::default()
    }
}

pub async fn run(args: ListArgs, api: &ApiArgs) -> Result<()> {
    if args.entity != EntityKind::Items && args.has_item_filters() {
        bail!("--category, --location, --author and --visibility only apply to items");
    }
    if !args.all && args.pages == 0 {
        bail!("--pages must be at least 1");
    }

    let conn = Connection::open(api)?;
    let client = conn.client.clone();

    let result = match args.entity {
        EntityKind::Items => {
            let filter = args.item_filter();
            list::<Item>(client, filter, &args).await
        }
        EntityKind::Categories => list::<Category>(client, (), &args).await,
        EntityKind::Locations => list::<Location>(client, (), &args).await,
        EntityKind::Authors => list::<Author>(client, (), &args).await,
        EntityKind::PositionSchemas => list::<PositionSchema>(client, (), &args).await,
    };

    conn.finish(result).await
}

async fn list<E: Entity>(client: ApiClient, filter: E::Filter, args: &ListArgs) -> Result<()> {
    let config = SearchConfig::default().with_page_limit(args.limit);
    let controller = SearchController::with_filter(EntityList::<E>::new(client), config, filter);

    let outcome = controller
        .submit_query(args.search.clone().unwrap_or_default())
        .await;
    check(outcome)?;

    let mut printed = print_new(&controller, 0, args.pretty)?;
    let mut pages = 1;

    while (args.all || pages < args.pages) && controller.state().has_next_page {
        let outcome = controller.load_more().await;
        if !outcome.is_applied() {
            check(outcome)?;
            break;
        }
        pages += 1;
        printed = print_new(&controller, printed, args.pretty)?;
    }

    debug!(pages, items = printed, "Listing finished");

    if printed == 0 {
        eprintln!("{}", "No results found.".dimmed());
    } else if controller.state().has_next_page {
        output::hint("More results available; use --pages or --all to fetch them.");
    }

    Ok(())
}

fn check(outcome: LoadOutcome) -> Result<()> {
    match outcome {
        LoadOutcome::Failed(err) => Err(err).context("Failed to load results"),
        LoadOutcome::Cancelled => bail!("Request was cancelled"),
        LoadOutcome::Applied { .. } | LoadOutcome::Skipped | LoadOutcome::Stale => Ok(()),
    }
}

/// Print the items after the first `from`; returns the new total.
fn print_new<E: Entity>(
    controller: &SearchController<EntityList<E>>,
    from: usize,
    pretty: bool,
) -> Result<usize> {
    let state = controller.state();
    for item in state.items.iter().skip(from) {
        if pretty {
            output::json_pretty(item)?;
        } else {
            output::json(item)?;
        }
    }
    Ok(state.items.len())
}
