mod display;

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use nomina_core::identity::{DEFAULT_YEAR_PIVOT, normalize_id};
use nomina_core::loan::convert_term;
use nomina_core::{
    BandSet, EmploymentStatus, FilterState, IdentityConfig, LoanInput, PageRequest,
    PaymentFrequency, RateType, SelectionBus, SelectionData, Sex, SortCapabilities, SortField,
    Snapshot, TableSort, dedupe, payroll, simulate, snapshots_to_csv,
};
use nomina_sync::http::DEFAULT_BASE_URL;
use nomina_sync::{ClientConfig, PayrollClient, StaticToken, fetch_all};
use nomina_views::{
    Aggregate, CompareSeries, CrossFilter, Positions, Presenter, Pyramid, Render, SalaryBands,
    SeniorityByBranch, load_table_page, refresh,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nomina", version, about = "Payroll demographics from the command line")]
struct Cli {
    #[command(flatten)]
    conn: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// Payroll API base URL.
    #[arg(long, env = "NOMINA_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    api_url: String,

    /// Bearer token. Requests go out unauthenticated without one.
    #[arg(long, env = "NOMINA_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Records per request when gathering every page.
    #[arg(long, env = "NOMINA_PAGE_SIZE", default_value_t = 1000, global = true)]
    page_size: u32,

    /// Two-digit birth years up to this value are read as 20xx.
    #[arg(long, env = "NOMINA_YEAR_PIVOT", default_value_t = DEFAULT_YEAR_PIVOT, global = true)]
    year_pivot: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Population pyramid by age and sex.
    Pyramid {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Seniority bands per branch.
    Seniority {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Salary bands by sex, with an age breakdown.
    Salary {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Headcount and mean salary per job title.
    Positions {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Only show titles in this job category.
        #[arg(long)]
        category: Option<String>,
    },
    /// One page of the employee table.
    Table {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "rows", default_value_t = 50)]
        rows: u32,
        /// Column header clicks, in order. Repeating a column flips its direction.
        #[arg(long = "sort")]
        sort: Vec<SortField>,
        /// Sort every column locally, as when the server cannot order.
        #[arg(long)]
        local_sort: bool,
    },
    /// Earnings per employee and month.
    Compare {
        #[command(flatten)]
        filters: FilterArgs,
        /// Column header clicks, in order. Only numeric columns reorder the chart.
        #[arg(long = "sort")]
        sort: Vec<SortField>,
    },
    /// Write deduplicated employees to CSV.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output file. Defaults to empleados_<date>.csv.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print deduplicated employees as an Arrow table.
    Snapshot {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// Show one employee as a card.
    Show {
        /// Personal ID (CURP).
        curp: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Filter values the API offers, with counts.
    Options,
    /// Amortization schedule for a payroll loan. Runs offline.
    Loan {
        #[arg(long, default_value_t = 50_000.0)]
        amount: f64,
        /// Annual rate in percent.
        #[arg(long, default_value_t = 12.0)]
        rate: f64,
        /// Number of payments.
        #[arg(long, default_value_t = 12)]
        term: u32,
        /// monthly, biweekly or weekly.
        #[arg(long, default_value = "monthly")]
        frequency: PaymentFrequency,
        /// fixed or variable.
        #[arg(long = "rate-type", default_value = "fixed")]
        rate_type: RateType,
        /// First disbursement date, to print due dates.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Read --term in this frequency and convert it.
        #[arg(long = "term-in")]
        term_in: Option<PaymentFrequency>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Branch (repeatable).
    #[arg(long = "branch")]
    branches: Vec<String>,
    /// Job title (repeatable).
    #[arg(long = "job")]
    job_titles: Vec<String>,
    /// Job category (repeatable).
    #[arg(long = "job-category")]
    job_categories: Vec<String>,
    /// Status code: A, B, F (repeatable). Defaults to active only.
    #[arg(long = "status")]
    statuses: Vec<String>,
    /// Reporting period, YYYY-MM. Defaults to the latest one.
    #[arg(long)]
    period: Option<String>,
    /// Do not restrict to a period.
    #[arg(long, conflicts_with = "period")]
    all_periods: bool,
    /// Search by name or personal ID.
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn into_state(self, period: Option<String>) -> FilterState {
        FilterState {
            branches: self.branches,
            job_titles: self.job_titles,
            job_categories: self.job_categories,
            statuses: self
                .statuses
                .iter()
                .filter_map(|s| EmploymentStatus::from_code(s))
                .collect(),
            period,
            search: self.search,
        }
    }
}

/// A chart selection to narrow the data by, as if clicked.
#[derive(Args, Debug, Clone, Default)]
struct SelectionArgs {
    #[arg(long)]
    age: Option<u32>,
    /// H (male) or M (female).
    #[arg(long, value_parser = parse_sex, requires = "age")]
    sex: Option<Sex>,
    /// Salary band name, e.g. Medio.
    #[arg(long = "salary-band", requires = "sex")]
    salary_band: Option<String>,
}

impl SelectionArgs {
    fn data(self) -> Option<SelectionData> {
        match (self.age, self.sex, self.salary_band) {
            (Some(age), Some(gender), Some(band)) => {
                Some(SelectionData::SalaryAgeGenderBand { age, gender, band })
            }
            (Some(age), Some(gender), None) => Some(SelectionData::PyramidAgeGender { age, gender }),
            _ => None,
        }
    }
}

fn parse_sex(s: &str) -> Result<Sex, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "h" | "m" => Ok(Sex::from_code(s.trim().chars().next().unwrap_or_default())),
        "male" | "hombre" => Ok(Sex::Male),
        "female" | "mujer" => Ok(Sex::Female),
        other => Err(format!("unknown sex: {other}")),
    }
}

/// Connection and parsing settings shared by every remote command.
struct Session {
    client: PayrollClient,
    page_size: u32,
    identity: IdentityConfig,
    today: NaiveDate,
    bus: SelectionBus,
    salary_bands: BandSet,
}

impl Session {
    fn connect(conn: &ConnectionArgs) -> anyhow::Result<Self> {
        let mut client = PayrollClient::new(ClientConfig::new(&conn.api_url))
            .context("failed to build HTTP client")?;
        if let Some(token) = &conn.token {
            client = client.with_tokens(Arc::new(StaticToken(token.clone())));
        }
        info!(url = client.base_url(), "connecting");
        Ok(Self {
            client,
            page_size: conn.page_size,
            identity: IdentityConfig::with_year_pivot(conn.year_pivot),
            today: Local::now().date_naive(),
            bus: SelectionBus::new(),
            salary_bands: BandSet::salary(),
        })
    }

    /// Filters with the period resolved: explicit, none, or the latest reported.
    async fn filters(&self, args: FilterArgs) -> FilterState {
        let period = if args.all_periods {
            None
        } else if let Some(period) = args.period.clone() {
            Some(period)
        } else {
            Some(self.client.latest_period().await)
        };
        args.into_state(period)
    }

    /// Every page for `filters`, deduplicated, then narrowed by `selection`.
    async fn snapshots(
        &mut self,
        filters: &FilterState,
        selection: SelectionArgs,
    ) -> anyhow::Result<Vec<Snapshot>> {
        let (gathered, unique) = futures::join!(
            fetch_all(&self.client, filters, self.page_size),
            self.client.unique_count(filters)
        );
        if let Some(e) = &gathered.error {
            warn!(
                pages = gathered.pages_fetched,
                records = gathered.records.len(),
                error = %e,
                "showing partial data"
            );
        }
        let records = gathered
            .into_result()
            .context("failed to load payroll records")?;
        let snapshots = dedupe(records);
        match unique {
            Ok(server) => info!(local = snapshots.len(), server, "unique employees"),
            Err(e) => warn!(error = %e, "could not load server-side unique count"),
        }

        let Some(data) = selection.data() else {
            return Ok(snapshots);
        };
        self.bus.publish("cli", data);
        let current = self.bus.current().map(|s| s.data);
        let cross = CrossFilter {
            today: self.today,
            identity: &self.identity,
            salary_bands: &self.salary_bands,
        };
        let selected: Vec<Snapshot> = cross
            .apply(current.as_ref(), &snapshots)
            .into_iter()
            .cloned()
            .collect();
        info!(before = snapshots.len(), after = selected.len(), "applied selection");
        Ok(selected)
    }
}

/// Load one view through its presenter and print whatever it renders.
async fn run_view<T, F, Fut>(name: &'static str, load: F, show: impl FnOnce(&T)) -> anyhow::Result<()>
where
    T: Aggregate,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let presenter = Mutex::new(Presenter::new(name));
    refresh(&presenter, || async move { load().await.map_err(|e| format!("{e:#}")) }).await;
    let presenter = presenter.into_inner().unwrap_or_else(PoisonError::into_inner);
    match presenter.render() {
        Render::Data(data) => show(data),
        Render::EmptyState => println!("No data for the selected filters."),
        Render::Failed(message) => bail!("{name}: {message}"),
        Render::Nothing | Render::Spinner => {}
    }
    Ok(())
}

fn table_sort(clicks: &[SortField], caps: &SortCapabilities) -> TableSort {
    let mut sort = TableSort::default();
    for &field in clicks {
        sort.toggle(field, caps);
    }
    sort
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_loan(input: LoanInput, start: Option<NaiveDate>) -> anyhow::Result<()> {
    let result = simulate(&input).context("invalid loan")?;
    display::loan(&input, &result, start);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let Cli { conn, command } = Cli::parse();
    info!("nomina v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Command::Loan {
            amount,
            rate,
            term,
            frequency,
            rate_type,
            start,
            term_in,
        } => {
            let term = match term_in {
                Some(from) => convert_term(term, from, frequency),
                None => term,
            };
            let input = LoanInput {
                amount,
                annual_rate: rate,
                term,
                frequency,
                rate_type,
            };
            run_loan(input, start)?;
        }
        Command::Pyramid { filters, selection } => {
            let mut session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let (today, identity) = (session.today, session.identity);
            let session = &mut session;
            run_view(
                "pyramid",
                move || async move {
                    let snapshots = session.snapshots(&filters, selection).await?;
                    Ok::<_, anyhow::Error>(Pyramid::build(&snapshots, today, &identity))
                },
                display::pyramid,
            )
            .await?;
        }
        Command::Seniority { filters, selection } => {
            let mut session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let today = session.today;
            let session = &mut session;
            run_view(
                "seniority",
                move || async move {
                    let snapshots = session.snapshots(&filters, selection).await?;
                    Ok::<_, anyhow::Error>(SeniorityByBranch::build(
                        &snapshots,
                        today,
                        BandSet::seniority(),
                    ))
                },
                display::seniority,
            )
            .await?;
        }
        Command::Salary { filters, selection } => {
            let mut session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let (today, identity) = (session.today, session.identity);
            let salary_bands = session.salary_bands.clone();
            let session = &mut session;
            run_view(
                "salary",
                move || async move {
                    let snapshots = session.snapshots(&filters, selection).await?;
                    Ok::<_, anyhow::Error>(SalaryBands::build(
                        &snapshots,
                        today,
                        &identity,
                        &salary_bands,
                        &BandSet::age(),
                    ))
                },
                display::salary,
            )
            .await?;
        }
        Command::Positions {
            filters,
            selection,
            category,
        } => {
            let mut session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let session = &mut session;
            run_view(
                "positions",
                move || async move {
                    let snapshots = session.snapshots(&filters, selection).await?;
                    Ok::<_, anyhow::Error>(Positions::build(&snapshots))
                },
                |view| display::positions(view, category.as_deref()),
            )
            .await?;
        }
        Command::Table {
            filters,
            page,
            rows,
            sort,
            local_sort,
        } => {
            let session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let caps = if local_sort {
                SortCapabilities::all_client()
            } else {
                SortCapabilities::default()
            };
            let sort = table_sort(&sort, &caps);
            let client = &session.client;
            run_view(
                "table",
                move || async move {
                    let request = PageRequest::new(page, rows);
                    let table = load_table_page(client, &filters, request, &sort, &caps).await?;
                    Ok::<_, anyhow::Error>(table)
                },
                display::table,
            )
            .await?;
        }
        Command::Compare { filters, sort } => {
            let session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let caps = SortCapabilities::default();
            let client_sort = table_sort(&sort, &caps).client_spec(&caps);
            let (client, page_size) = (&session.client, session.page_size);
            run_view(
                "compare",
                move || async move {
                    let records = fetch_all(client, &filters, page_size)
                        .await
                        .into_result()
                        .context("failed to load payroll records")?;
                    Ok::<_, anyhow::Error>(CompareSeries::build(&records, client_sort))
                },
                display::compare,
            )
            .await?;
        }
        Command::Export {
            filters,
            selection,
            output,
        } => {
            let mut session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let snapshots = session.snapshots(&filters, selection).await?;
            let csv = snapshots_to_csv(&snapshots).context("failed to write CSV")?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(format!("empleados_{}.csv", session.today.format("%Y-%m-%d")))
            });
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = snapshots.len(), "exported");
        }
        Command::Snapshot {
            filters,
            selection,
            limit,
        } => {
            let mut session = Session::connect(&conn)?;
            let filters = session.filters(filters).await;
            let snapshots = session.snapshots(&filters, selection).await?;
            let batch = payroll::snapshots_to_batch(&snapshots, session.today, &session.identity)
                .context("failed to build snapshot batch")?;
            let shown = limit.min(batch.num_rows());
            let table = arrow::util::pretty::pretty_format_batches(&[batch.slice(0, shown)])
                .context("failed to format snapshot table")?;
            println!("{table}");
            println!("{shown} of {} employees", batch.num_rows());
        }
        Command::Show { curp, filters } => {
            let Some(key) = normalize_id(&curp) else {
                bail!("not a usable personal ID: {curp}");
            };
            let mut session = Session::connect(&conn)?;
            let mut filters = session.filters(filters).await;
            filters.search = Some(key.clone());
            let snapshots = session
                .snapshots(&filters, SelectionArgs::default())
                .await?;
            let Some(found) = snapshots.into_iter().find(|s| s.key == key) else {
                bail!("no employee with personal ID {key}");
            };
            let batch = payroll::snapshots_to_batch(&[found], session.today, &session.identity)
                .context("failed to build snapshot batch")?;
            display::print_card(&batch, 0);
        }
        Command::Options => {
            let session = Session::connect(&conn)?;
            let options = session
                .client
                .filter_options()
                .await
                .context("failed to load filter options")?;
            display::filter_options(&options);
        }
    }

    Ok(())
}
