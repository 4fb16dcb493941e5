//! Terminal rendering for the demographic views.
//!
//! Aggregates print as aligned text tables. Single employees print as a
//! vertical card grouped by section, read straight from the snapshot batch.

use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::NaiveDate;
use nomina_core::loan::{LoanInput, LoanResult};
use nomina_sync::options::{FilterOptions, OptionCount};
use nomina_views::{
    CompareSeries, PageItem, PositionRow, Positions, Pyramid, SalaryBands, SeniorityByBranch,
    TablePage,
};

const MAX_OPTION_ITEMS: usize = 15;
const BAR_WIDTH: u64 = 30;

// ── Card sections ──

const IDENTITY: &[&str] = &["curp", "rfc", "nombre", "sexo", "edad"];
const EMPLOYMENT: &[&str] = &[
    "sucursal",
    "puesto",
    "categoria",
    "estado",
    "fecha_antiguedad",
    "periodo",
];
const EARNINGS: &[&str] = &["salario", "comisiones", "percepciones_totales"];

/// Print row `row` of a snapshot batch as a card.
pub fn print_card(batch: &RecordBatch, row: usize) {
    println!();
    print_section(batch, row, "Identity", IDENTITY);
    print_section(batch, row, "Employment", EMPLOYMENT);
    print_section(batch, row, "Earnings", EARNINGS);
}

fn print_section(batch: &RecordBatch, row: usize, header: &str, cols: &[&str]) {
    let schema = batch.schema();
    let present: Vec<(&str, usize)> = cols
        .iter()
        .filter_map(|&name| schema.index_of(name).ok().map(|i| (name, i)))
        .filter(|&(_, i)| !batch.column(i).is_null(row))
        .collect();
    if present.is_empty() {
        return;
    }

    println!("{header}");
    let options = FormatOptions::default();
    for (name, idx) in present {
        match ArrayFormatter::try_new(batch.column(idx).as_ref(), &options) {
            Ok(fmt) => println!("  {:<22} {}", name, fmt.value(row)),
            Err(_) => println!("  {:<22} ?", name),
        }
    }
    println!();
}

// ── Aggregates ──

fn bar(count: u64, limit: u64) -> String {
    if limit == 0 {
        return String::new();
    }
    "#".repeat((count * BAR_WIDTH / limit) as usize)
}

pub fn pyramid(p: &Pyramid) {
    let limit = p.axis_limit();
    println!(
        "{:>width$} {:>5} | {:<5} {}",
        "male",
        "age",
        "female",
        "",
        width = BAR_WIDTH as usize
    );
    for (age, counts) in p.rows() {
        println!(
            "{:>width$} {:>5} | {:<5} {}",
            bar(counts.male, limit),
            age,
            counts.female,
            bar(counts.female, limit),
            width = BAR_WIDTH as usize
        );
    }
    let s = &p.stats;
    println!();
    println!(
        "employees {}  male {} ({:.1}%)  female {} ({:.1}%)  unknown {}",
        s.total_employees,
        s.total_male,
        s.male_percentage,
        s.total_female,
        s.female_percentage,
        s.total_unknown
    );
    println!(
        "with age {}  average age {:.1}  axis limit {}",
        s.total_in_pyramid, s.average_age, limit
    );
}

pub fn seniority(view: &SeniorityByBranch) {
    print!("{:<28}", "branch");
    for band in view.bands.bands() {
        print!(" {:>10}", band.name);
    }
    println!(" {:>8}", "total");
    for branch in &view.branches {
        print!("{:<28}", branch.branch);
        for count in &branch.bands {
            print!(" {count:>10}");
        }
        println!(" {:>8}", branch.total);
    }
    let s = &view.stats;
    println!();
    println!(
        "employees {}  branches {}  valid seniority {}  invalid {}",
        s.total_employees, s.total_branches, s.valid_seniority, s.invalid_seniority
    );
}

pub fn salary(view: &SalaryBands) {
    println!(
        "{:<12} {:<16} {:>8} {:>8} {:>8} {:>8}",
        "band", "range", "male", "female", "unknown", "avg age"
    );
    for row in &view.rows {
        let avg = row
            .average_age
            .map(|a| format!("{a:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<16} {:>8} {:>8} {:>8} {:>8}",
            row.band.name, row.band.label, row.male, row.female, row.unknown, avg
        );
    }
    if view.without_salary > 0 {
        println!("without salary: {}", view.without_salary);
    }

    println!();
    print!("{:<8}", "age");
    for row in &view.rows {
        print!(" {:>12}", row.band.name);
    }
    println!();
    for row in &view.by_age {
        if row.salary_bands.iter().all(|c| c.total() == 0) {
            continue;
        }
        print!("{:<8}", row.age_band.name);
        for counts in &row.salary_bands {
            print!(" {:>12}", format!("{}/{}", counts.male, counts.female));
        }
        println!();
    }
}

pub fn positions(view: &Positions, category: Option<&str>) {
    println!(
        "{:<36} {:<22} {:>6} {:>6} {:>6} {:>12}",
        "job title", "category", "male", "female", "unk", "avg salary"
    );
    let rows: Box<dyn Iterator<Item = &PositionRow>> = match category {
        Some(c) => Box::new(view.in_category(c)),
        None => Box::new(view.rows.iter()),
    };
    for row in rows {
        println!(
            "{:<36} {:<22} {:>6} {:>6} {:>6} {:>12}",
            row.job_title,
            row.category,
            row.male,
            row.female,
            row.unknown,
            money(row.average_salary)
        );
    }
    if view.untitled > 0 {
        println!("without job title: {}", view.untitled);
    }
}

pub fn table(page: &TablePage) {
    println!(
        "{:<32} {:<18} {:<24} {:<20} {:<7} {:>10} {:>10} {:<10}",
        "name", "curp", "job title", "branch", "period", "salary", "total", "status"
    );
    for row in &page.rows {
        println!(
            "{:<32} {:<18} {:<24} {:<20} {:<7} {:>10.2} {:>10.2} {:<10}",
            row.name,
            row.personal_id,
            row.job_title,
            row.branch,
            row.period,
            row.salary,
            row.total_earnings,
            row.status
        );
    }
    let buttons: Vec<String> = page
        .window()
        .into_iter()
        .map(|item| match item {
            PageItem::Page(n) if n == page.page => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect();
    println!();
    println!(
        "page {} of {} ({} rows)   {}",
        page.page,
        page.total_pages,
        page.total,
        buttons.join(" ")
    );
    if let Some(spec) = page.client_sort {
        println!("sorted locally by {} {}", spec.field, spec.direction.as_str());
    }
}

pub fn compare(series: &CompareSeries) {
    println!(
        "{:<44} {:>12} {:>12} {:>12} {:>5}",
        "employee", "salary", "commissions", "total", "rows"
    );
    for entry in &series.entries {
        println!(
            "{:<44} {:>12.2} {:>12.2} {:>12.2} {:>5}",
            entry.display_name(),
            entry.salary,
            entry.commissions,
            entry.total,
            entry.record_count
        );
    }
}

pub fn filter_options(options: &FilterOptions) {
    print_options("Branches", &options.branches);
    print_options("Job categories", &options.job_categories);
    print_options("Job titles", &options.job_titles);
    print_options("Statuses", &options.statuses);

    let months = options.months();
    if !months.is_empty() {
        println!("Periods");
        for month in months.iter().take(MAX_OPTION_ITEMS) {
            println!("  {:<10} {:<14} {:>8}", month.value, month.label, month.count);
        }
        if months.len() > MAX_OPTION_ITEMS {
            println!("  ... and {} more", months.len() - MAX_OPTION_ITEMS);
        }
        println!();
    }
}

fn print_options(header: &str, options: &[OptionCount]) {
    if options.is_empty() {
        return;
    }
    println!("{header}");
    for option in options.iter().take(MAX_OPTION_ITEMS) {
        println!("  {:<40} {:>8}", option.value, option.count);
    }
    if options.len() > MAX_OPTION_ITEMS {
        println!("  ... and {} more", options.len() - MAX_OPTION_ITEMS);
    }
    println!();
}

pub fn loan(input: &LoanInput, result: &LoanResult, start: Option<NaiveDate>) {
    println!(
        "amount {:.2}  rate {:.2}%  term {} {}  ({})",
        input.amount,
        input.annual_rate,
        input.term,
        input.frequency.term_unit(),
        input.frequency.label()
    );
    println!(
        "payment {:.2}  total paid {:.2}  interest {:.2}  effective rate {:.2}%",
        result.payment, result.total_payment, result.total_interest, result.effective_rate
    );
    println!();
    println!(
        "{:>4} {:<12} {:>12} {:>12} {:>12} {:>14} {:>7}",
        "#", "due", "payment", "principal", "interest", "balance", "rate"
    );
    for row in &result.schedule {
        let due = start
            .and_then(|s| input.frequency.due_date(s, row.number))
            .map(|d| d.to_string())
            .unwrap_or_default();
        println!(
            "{:>4} {:<12} {:>12.2} {:>12.2} {:>12.2} {:>14.2} {:>6.2}%",
            row.number, due, row.payment, row.principal, row.interest, row.balance, row.rate
        );
    }
}

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string())
}
