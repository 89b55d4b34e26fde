use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use yield_scout::scrapers::{self, HttpFetcher, SearchParams};
use yield_scout::{logging, rank, table, Assumptions, EvaluatedListing, ListingRecord, Source};

#[derive(Parser)]
#[command(
    name = "yield-scout",
    about = "Buy-to-let evaluator from scraped listings or CSV",
    group(ArgGroup::new("input").required(true).args(["source", "csv"]))
)]
struct Cli {
    /// Listing site to scrape
    #[arg(long, value_enum, requires = "url")]
    source: Option<SourceArg>,

    /// CSV with columns: price,area_m2,bedrooms,city,url
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Search/result URL to scrape
    #[arg(long)]
    url: Option<String>,

    /// How many result pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Seconds between requests (at least 0.3)
    #[arg(long, default_value_t = 2.0)]
    pause: f64,

    /// Allow a headless browser for pages that need JavaScript or block plain requests
    #[arg(long)]
    render: bool,

    /// Keep only listings whose city contains this text
    #[arg(long)]
    city: Option<String>,

    #[command(flatten)]
    assumptions: AssumptionArgs,

    /// Evaluated listings CSV
    #[arg(long, default_value = "listings_evaluated.csv")]
    out: PathBuf,

    /// Also save the canonical listings as JSON
    #[arg(long)]
    raw_out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Immoweb,
    Zimmo,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Immoweb => Source::Immoweb,
            SourceArg::Zimmo => Source::Zimmo,
        }
    }
}

#[derive(Args)]
struct AssumptionArgs {
    #[arg(long, default_value_t = 10.0)]
    rent_per_m2: f64,
    #[arg(long, default_value_t = 1000.0)]
    fallback_rent: f64,
    #[arg(long)]
    min_rent: Option<f64>,
    #[arg(long)]
    max_rent: Option<f64>,

    #[arg(long, default_value_t = 0.8)]
    ltv: f64,
    #[arg(long, default_value_t = 0.036)]
    mortgage_rate: f64,
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(1..))]
    mortgage_years: u32,

    #[arg(long, default_value_t = 0.10)]
    registration_rate: f64,
    #[arg(long, default_value_t = 0.03)]
    notary_rate: f64,
    #[arg(long, default_value_t = 10000.0)]
    renovation_buffer: f64,

    #[arg(long, default_value_t = 0.05)]
    vacancy_rate: f64,
    #[arg(long, default_value_t = 0.05)]
    maintenance_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    management_rate: f64,

    #[arg(long, default_value_t = 75.0)]
    property_tax_monthly: f64,
    #[arg(long, default_value_t = 25.0)]
    insurance_monthly: f64,
}

impl From<AssumptionArgs> for Assumptions {
    fn from(a: AssumptionArgs) -> Self {
        Self {
            rent_per_m2: a.rent_per_m2,
            fallback_rent: a.fallback_rent,
            min_rent: a.min_rent,
            max_rent: a.max_rent,
            ltv: a.ltv,
            mortgage_rate: a.mortgage_rate,
            mortgage_years: a.mortgage_years,
            registration_rate: a.registration_rate,
            notary_rate: a.notary_rate,
            renovation_buffer: a.renovation_buffer,
            vacancy_rate: a.vacancy_rate,
            maintenance_rate: a.maintenance_rate,
            management_rate: a.management_rate,
            property_tax_monthly: a.property_tax_monthly,
            insurance_monthly: a.insurance_monthly,
        }
    }
}

#[cfg(feature = "browser")]
fn attach_renderer(fetcher: HttpFetcher) -> HttpFetcher {
    use std::sync::Arc;
    use yield_scout::scrapers::ChromeRenderer;

    match ChromeRenderer::new() {
        Ok(renderer) => fetcher.with_renderer(Arc::new(renderer)),
        Err(e) => {
            warn!("{}; continuing without browser rendering", e);
            fetcher
        }
    }
}

#[cfg(not(feature = "browser"))]
fn attach_renderer(fetcher: HttpFetcher) -> HttpFetcher {
    warn!("Built without the `browser` feature; continuing without browser rendering");
    fetcher
}

async fn scrape_listings(source: Source, cli: &Cli) -> Result<Vec<ListingRecord>> {
    let url = cli.url.clone().context("--url is required with --source")?;
    let site = scrapers::site_for(source);

    let mut fetcher = HttpFetcher::new(&format!("{}/", site.url_scheme().base))
        .context("Failed to create HTTP client")?;
    if cli.render {
        fetcher = attach_renderer(fetcher);
    }

    let params = SearchParams {
        url,
        pages: cli.pages,
        pause_secs: cli.pause,
        allow_render: cli.render,
    };

    let report = scrapers::scrape(site.as_ref(), &fetcher, &params).await;
    if report.stop.is_abort() {
        warn!("Scrape of {} stopped early: {:?}", source, report.stop);
    }
    info!(
        "Scraped {} listings from {} page(s) in {}s",
        report.records.len(),
        report.pages_scraped,
        (report.finished_at - report.started_at).num_seconds()
    );
    Ok(report.records)
}

fn load_csv(path: &Path) -> Result<Vec<ListingRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let listings = table::read_listings(file)
        .with_context(|| format!("Failed to read listings from {}", path.display()))?;
    info!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(listings)
}

fn print_summary(ranked: &[EvaluatedListing]) {
    for (i, e) in ranked.iter().take(10).enumerate() {
        println!(
            "{}. {} ({:.0} €)",
            i + 1,
            e.city.as_deref().unwrap_or("unknown city"),
            e.price
        );
        let area = e.area_m2.map(|a| format!("{a:.0} m²")).unwrap_or_else(|| "? m²".into());
        let beds = e.bedrooms.map(|b| b.to_string()).unwrap_or_else(|| "?".into());
        let ppsqm = e.ppsqm.map(|p| format!("{p:.0} €/m²")).unwrap_or_else(|| "-".into());
        println!("   {area}, {beds} bedrooms, {ppsqm}");
        println!(
            "   rent {:.0} €/month, gross {:.2}%, net on equity {:.2}%, cash flow {:.0} €/month",
            e.est_rent_month,
            e.gross_yield * 100.0,
            e.net_yield_on_equity * 100.0,
            e.monthly_net_cashflow
        );
        if let Some(url) = &e.url {
            println!("   {url}");
        }
        println!();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    info!("🏠 yield-scout - buy-to-let evaluator");

    let mut listings = match (&cli.csv, cli.source) {
        (Some(path), _) => load_csv(path)?,
        (None, Some(source)) => scrape_listings(source.into(), &cli).await?,
        (None, None) => anyhow::bail!("Provide --source immoweb|zimmo or --csv <file>"),
    };

    if let Some(city) = &cli.city {
        listings.retain(|l| l.city_matches(city));
        info!("{} listings match city filter {:?}", listings.len(), city);
    }

    if listings.is_empty() {
        anyhow::bail!("No listings fetched. Check your URL/CSV/filters.");
    }

    if let Some(path) = &cli.raw_out {
        let json = serde_json::to_string_pretty(&listings)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Saved {} listings to {}", listings.len(), path.display());
    }

    let ranked = rank(&listings, &cli.assumptions.into());

    let file = File::create(&cli.out)
        .with_context(|| format!("Failed to create {}", cli.out.display()))?;
    table::write_evaluated(BufWriter::new(file), &ranked)
        .with_context(|| format!("Failed to write {}", cli.out.display()))?;
    info!("✅ Saved {} evaluated listings to {}", ranked.len(), cli.out.display());

    print_summary(&ranked);

    Ok(())
}
