//! Loan amortization schedules for fixed and variable rates.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Floor for a variable period rate so payments never amortize at zero or below.
const MIN_VARIABLE_PERIOD_RATE: f64 = 0.001;

/// Amplitude, in annual percentage points, of the simulated rate swing.
const VARIABLE_SWING: f64 = 2.5;

/// Longest schedule accepted: 100 years of monthly payments.
pub const MAX_TERM: u32 = 1_200;

#[derive(Debug, Error, PartialEq)]
pub enum LoanError {
    #[error("loan amount must be positive, got {0}")]
    Amount(f64),

    #[error("loan term must be between 1 and {} payments", MAX_TERM)]
    Term,

    #[error("interest rate must be a non-negative finite number, got {0}")]
    Rate(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Biweekly,
    Weekly,
}

impl PaymentFrequency {
    pub fn payments_per_year(&self) -> u32 {
        match self {
            Self::Monthly => 12,
            Self::Biweekly => 24,
            Self::Weekly => 52,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Monthly => "Mensual",
            Self::Biweekly => "Quincenal",
            Self::Weekly => "Semanal",
        }
    }

    /// Unit name for a term in this frequency.
    pub fn term_unit(&self) -> &'static str {
        match self {
            Self::Monthly => "meses",
            Self::Biweekly => "quincenas",
            Self::Weekly => "semanas",
        }
    }

    /// Date of payment `n` (1-based) counted from `start`.
    pub fn due_date(&self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Self::Monthly => start.checked_add_months(Months::new(n)),
            Self::Biweekly => start.checked_add_days(Days::new(u64::from(n) * 15)),
            Self::Weekly => start.checked_add_days(Days::new(u64::from(n) * 7)),
        }
    }
}

impl std::str::FromStr for PaymentFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" | "mensual" => Ok(Self::Monthly),
            "biweekly" | "quincenal" => Ok(Self::Biweekly),
            "weekly" | "semanal" => Ok(Self::Weekly),
            other => Err(format!("unknown payment frequency: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    #[default]
    Fixed,
    Variable,
}

impl std::str::FromStr for RateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" | "fija" => Ok(Self::Fixed),
            "variable" => Ok(Self::Variable),
            other => Err(format!("unknown rate type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    pub amount: f64,
    /// Annual nominal rate in percent.
    pub annual_rate: f64,
    /// Number of payments, in units of `frequency`.
    pub term: u32,
    pub frequency: PaymentFrequency,
    pub rate_type: RateType,
}

impl Default for LoanInput {
    fn default() -> Self {
        Self {
            amount: 50_000.0,
            annual_rate: 12.0,
            term: 12,
            frequency: PaymentFrequency::Monthly,
            rate_type: RateType::Fixed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub number: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    /// Remaining balance, clamped at zero.
    pub balance: f64,
    /// Annual rate in percent applied to this period.
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanResult {
    /// Constant payment for fixed loans, mean payment for variable ones.
    pub payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub effective_rate: f64,
    pub schedule: Vec<ScheduleRow>,
}

/// Build the amortization schedule for `input`.
pub fn simulate(input: &LoanInput) -> Result<LoanResult, LoanError> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(LoanError::Amount(input.amount));
    }
    if input.term == 0 || input.term > MAX_TERM {
        return Err(LoanError::Term);
    }
    if !input.annual_rate.is_finite() || input.annual_rate < 0.0 {
        return Err(LoanError::Rate(input.annual_rate));
    }

    let result = match input.rate_type {
        RateType::Fixed => fixed(input),
        RateType::Variable => variable(input),
    };
    tracing::debug!(
        amount = input.amount,
        term = input.term,
        payment = result.payment,
        total_interest = result.total_interest,
        "loan simulated"
    );
    Ok(result)
}

fn fixed(input: &LoanInput) -> LoanResult {
    let n = input.term;
    let r = input.annual_rate / 100.0 / f64::from(input.frequency.payments_per_year());
    let payment = amortized_payment(input.amount, r, n);

    let mut balance = input.amount;
    let mut schedule = Vec::with_capacity(n as usize);
    let (mut total_payment, mut total_interest) = (0.0, 0.0);
    for number in 1..=n {
        let interest = balance * r;
        let principal = payment - interest;
        balance -= principal;
        total_payment += payment;
        total_interest += interest;
        schedule.push(ScheduleRow {
            number,
            payment,
            principal,
            interest,
            balance: balance.max(0.0),
            rate: input.annual_rate,
        });
    }

    LoanResult {
        payment,
        total_payment,
        total_interest,
        effective_rate: input.annual_rate,
        schedule,
    }
}

fn variable(input: &LoanInput) -> LoanResult {
    let n = input.term;
    let ppy = f64::from(input.frequency.payments_per_year());

    let mut balance = input.amount;
    let mut schedule = Vec::with_capacity(n as usize);
    let (mut total_payment, mut total_interest) = (0.0, 0.0);
    for number in 1..=n {
        let annual = variable_rate(input.annual_rate, number);
        let r = (annual / 100.0 / ppy).max(MIN_VARIABLE_PERIOD_RATE);
        let remaining = n - number + 1;
        let payment = if remaining > 1 {
            amortized_payment(balance, r, remaining)
        } else {
            balance * (1.0 + r)
        };
        let interest = balance * r;
        let principal = payment - interest;
        balance -= principal;
        total_payment += payment;
        total_interest += interest;
        schedule.push(ScheduleRow {
            number,
            payment,
            principal,
            interest,
            balance: balance.max(0.0),
            rate: annual,
        });
    }

    let effective_rate = if total_interest > 0.0 {
        total_interest / input.amount * (12.0 / f64::from(n)) * 100.0
    } else {
        input.annual_rate
    };
    LoanResult {
        payment: total_payment / f64::from(n),
        total_payment,
        total_interest,
        effective_rate,
        schedule,
    }
}

/// Simulated annual rate for period `i`.
pub fn variable_rate(base: f64, i: u32) -> f64 {
    let i = f64::from(i);
    let swing = 0.5 * (i * 0.5).sin() + 0.5 * (i * 0.2).sin();
    base + swing * VARIABLE_SWING
}

/// French constant payment; straight-line when the rate is zero.
fn amortized_payment(principal: f64, r: f64, n: u32) -> f64 {
    if r == 0.0 {
        return principal / f64::from(n);
    }
    let growth = (1.0 + r).powi(n as i32);
    principal * r * growth / (growth - 1.0)
}

/// Convert a term between frequencies, going through whole months.
pub fn convert_term(term: u32, from: PaymentFrequency, to: PaymentFrequency) -> u32 {
    if from == to {
        return term;
    }
    let months = match from {
        PaymentFrequency::Monthly => f64::from(term),
        PaymentFrequency::Biweekly => (f64::from(term) / 2.0).round(),
        PaymentFrequency::Weekly => (f64::from(term) / (52.0 / 12.0)).round(),
    };
    let converted = match to {
        PaymentFrequency::Monthly => months,
        PaymentFrequency::Biweekly => months * 2.0,
        PaymentFrequency::Weekly => (months * 52.0 / 12.0).round(),
    };
    converted as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn fixed_monthly_payment() {
        let result = simulate(&LoanInput::default()).unwrap();
        // 50k at 12% over 12 months.
        assert!(close(result.payment, 4442.44, 0.01), "{}", result.payment);
        assert_eq!(result.schedule.len(), 12);
        assert!(result.schedule.iter().all(|row| row.payment == result.payment));
        assert!(close(result.schedule[0].interest, 500.0, 1e-9));
        assert!(close(result.schedule[11].balance, 0.0, 1e-6));
        assert!(close(result.total_payment - result.total_interest, 50_000.0, 1e-6));
        assert_eq!(result.effective_rate, 12.0);
    }

    #[test]
    fn zero_rate_is_straight_line() {
        let result = simulate(&LoanInput {
            amount: 1200.0,
            annual_rate: 0.0,
            term: 12,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(result.payment, 100.0);
        assert_eq!(result.total_interest, 0.0);
        assert!(close(result.schedule[11].balance, 0.0, 1e-9));
    }

    #[test]
    fn variable_pays_off_principal() {
        let input = LoanInput {
            term: 24,
            frequency: PaymentFrequency::Biweekly,
            rate_type: RateType::Variable,
            ..Default::default()
        };
        let result = simulate(&input).unwrap();
        assert_eq!(result.schedule.len(), 24);
        let principal: f64 = result.schedule.iter().map(|r| r.principal).sum();
        assert!(close(principal, 50_000.0, 1e-6));
        assert!(close(result.schedule[23].balance, 0.0, 1e-6));
        assert!(close(result.schedule[0].rate, variable_rate(12.0, 1), 1e-12));
        let expected = result.total_interest / 50_000.0 * (12.0 / 24.0) * 100.0;
        assert!(close(result.effective_rate, expected, 1e-12));
    }

    #[test]
    fn variable_rate_floor() {
        let result = simulate(&LoanInput {
            annual_rate: 0.0,
            rate_type: RateType::Variable,
            ..Default::default()
        })
        .unwrap();
        assert!(result.schedule.iter().all(|r| r.interest > 0.0));
    }

    #[test]
    fn invalid_inputs() {
        let base = LoanInput::default();
        let bad_amount = LoanInput { amount: 0.0, ..base.clone() };
        let bad_term = LoanInput { term: 0, ..base.clone() };
        let bad_rate = LoanInput { annual_rate: -1.0, ..base };
        assert_eq!(simulate(&bad_amount).unwrap_err(), LoanError::Amount(0.0));
        assert_eq!(simulate(&bad_term).unwrap_err(), LoanError::Term);
        assert_eq!(simulate(&bad_rate).unwrap_err(), LoanError::Rate(-1.0));
    }

    #[test]
    fn oversized_terms_rejected() {
        for rate_type in [RateType::Fixed, RateType::Variable] {
            let huge = LoanInput {
                term: u32::MAX,
                rate_type,
                ..LoanInput::default()
            };
            assert_eq!(simulate(&huge).unwrap_err(), LoanError::Term);
        }
        let longest = LoanInput {
            term: MAX_TERM,
            ..LoanInput::default()
        };
        assert_eq!(simulate(&longest).unwrap().schedule.len(), MAX_TERM as usize);
    }

    #[test]
    fn term_conversion() {
        use PaymentFrequency::*;
        assert_eq!(convert_term(12, Monthly, Biweekly), 24);
        assert_eq!(convert_term(12, Monthly, Weekly), 52);
        assert_eq!(convert_term(52, Weekly, Monthly), 12);
        assert_eq!(convert_term(25, Biweekly, Monthly), 13);
        assert_eq!(convert_term(7, Weekly, Weekly), 7);
    }

    #[test]
    fn due_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            PaymentFrequency::Monthly.due_date(start, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            PaymentFrequency::Biweekly.due_date(start, 2),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            PaymentFrequency::Weekly.due_date(start, 1),
            NaiveDate::from_ymd_opt(2024, 2, 7)
        );
    }

    #[test]
    fn parses_frequency_names() {
        assert_eq!("quincenal".parse::<PaymentFrequency>(), Ok(PaymentFrequency::Biweekly));
        assert_eq!("Variable".parse::<RateType>(), Ok(RateType::Variable));
        assert!("daily".parse::<PaymentFrequency>().is_err());
    }
}
