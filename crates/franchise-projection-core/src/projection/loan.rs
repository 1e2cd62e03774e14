use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::inputs::NormalizedAssumptions;
use crate::types::*;

const MONTHS_PER_YEAR_DEC: Decimal = dec!(12);
const HALF_CENT: Decimal = dec!(0.5);

/// Financed portion of the startup loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Cents,
    pub annual_rate: Rate,
    pub term_months: u32,
}

/// A single month in the amortization schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanPeriod {
    pub month: u32,
    pub opening_balance: Cents,
    pub interest: Cents,
    pub principal: Cents,
    pub payment: Cents,
    pub closing_balance: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub terms: LoanTerms,
    pub monthly_payment: Cents,
    pub periods: Vec<LoanPeriod>,
    pub total_interest_paid: Cents,
    pub total_principal_paid: Cents,
}

impl LoanSchedule {
    /// The period for a 1-based month, if inside the schedule horizon.
    pub fn period(&self, month: u32) -> Option<&LoanPeriod> {
        month
            .checked_sub(1)
            .and_then(|idx| self.periods.get(idx as usize))
    }
}

impl LoanTerms {
    /// `loan_amount × (1 − down_payment_pct)` at the plan's rate and term.
    pub fn from_assumptions(a: &NormalizedAssumptions) -> Self {
        LoanTerms {
            principal: apply_rate(a.loan_amount, Decimal::ONE - a.down_payment_pct),
            annual_rate: a.interest_rate,
            term_months: a.loan_term_months,
        }
    }

    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / MONTHS_PER_YEAR_DEC
    }

    /// Level monthly payment `L·r / (1 − (1+r)^−n)`, rounded to cents.
    /// With a zero rate the principal is spread evenly; with a zero term
    /// the whole principal is due at once. When `(1+r)^n` overflows the
    /// payment is the interest-only limit `L·r`.
    pub fn level_payment(&self) -> Cents {
        if self.principal == 0 || self.term_months == 0 {
            return self.principal;
        }
        let r = self.monthly_rate();
        let principal = Decimal::from(self.principal);
        let even = || to_cents(principal / Decimal::from(self.term_months));
        if r.is_zero() {
            return even();
        }
        let discount = compound(Decimal::ONE + r, self.term_months)
            .and_then(|growth| Decimal::ONE.checked_div(growth))
            .unwrap_or(Decimal::ZERO);
        principal
            .checked_mul(r)
            .and_then(|interest| interest.checked_div(Decimal::ONE - discount))
            .map(to_cents)
            .unwrap_or_else(even)
    }

    /// Closed-form annuity balance after `months_elapsed` level payments of
    /// `payment`: `L(1+r)^k − P((1+r)^k − 1)/r`. Zero once the term is over;
    /// the principal if the annuity terms overflow.
    pub fn closed_form_balance(&self, payment: Cents, months_elapsed: u32) -> Decimal {
        if months_elapsed >= self.term_months {
            return Decimal::ZERO;
        }
        let r = self.monthly_rate();
        let principal = Decimal::from(self.principal);
        let payment = Decimal::from(payment);
        if r.is_zero() {
            return principal - payment * Decimal::from(months_elapsed);
        }
        compound(Decimal::ONE + r, months_elapsed)
            .and_then(|growth| {
                let accrued = principal.checked_mul(growth)?;
                let repaid = payment.checked_mul(growth - Decimal::ONE)?.checked_div(r)?;
                accrued.checked_sub(repaid)
            })
            .unwrap_or(principal)
    }

    /// How far the cent-rounded schedule can drift from the closed form
    /// after `months_elapsed` months. Each month's interest is off by at
    /// most half a cent and that error compounds at `1+r`, giving
    /// `0.5·((1+r)^k − 1)/r`.
    pub fn rounding_drift_bound(&self, months_elapsed: u32) -> Decimal {
        let r = self.monthly_rate();
        if r.is_zero() {
            return HALF_CENT * Decimal::from(months_elapsed);
        }
        compound(Decimal::ONE + r, months_elapsed)
            .and_then(|growth| (growth - Decimal::ONE).checked_div(r))
            .and_then(|factor| factor.checked_mul(HALF_CENT))
            .unwrap_or(Decimal::MAX)
    }
}

/// `base^n` by square-and-multiply; `None` on overflow.
fn compound(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut square = base;
    let mut exp = n;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(square)?;
        }
        exp >>= 1;
        if exp > 0 {
            square = square.checked_mul(square)?;
        }
    }
    Some(result)
}

/// Build the month-by-month amortization schedule over `horizon` months.
///
/// Interest accrues on the opening balance at `rate/12` and is rounded to
/// cents; the rest of the level payment retires principal. The final
/// scheduled month retires whatever balance remains, absorbing rounding.
pub fn build_loan_schedule(terms: &LoanTerms, horizon: u32) -> LoanSchedule {
    let payment = terms.level_payment();
    let r = terms.monthly_rate();
    let final_month = terms.term_months.max(1);

    let mut periods = Vec::with_capacity(horizon as usize);
    let mut balance = terms.principal;
    let mut total_interest_paid = 0;
    let mut total_principal_paid = 0;

    for month in 1..=horizon {
        let opening = balance;

        let (interest, principal) = if opening == 0 || month > final_month {
            (0, 0)
        } else if terms.term_months == 0 {
            (0, opening)
        } else {
            let interest = apply_rate(opening, r);
            let principal = if month == final_month {
                opening
            } else {
                (payment - interest).min(opening)
            };
            (interest, principal)
        };

        balance -= principal;
        total_interest_paid += interest;
        total_principal_paid += principal;

        periods.push(LoanPeriod {
            month,
            opening_balance: opening,
            interest,
            principal,
            payment: interest + principal,
            closing_balance: balance,
        });
    }

    LoanSchedule {
        terms: *terms,
        monthly_payment: payment,
        periods,
        total_interest_paid,
        total_principal_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> LoanTerms {
        LoanTerms {
            principal: 12_000_000,
            annual_rate: dec!(0.065),
            term_months: 84,
        }
    }

    #[test]
    fn test_level_payment_known_answer() {
        // $120,000 at 6.5% over 84 months => $1,781.93/month
        assert_eq!(terms().level_payment(), 178_193);
    }

    #[test]
    fn test_zero_rate_spreads_principal() {
        let t = LoanTerms {
            annual_rate: Decimal::ZERO,
            ..terms()
        };
        assert_eq!(t.level_payment(), 142_857);
    }

    #[test]
    fn test_schedule_interest_and_principal_split() {
        let schedule = build_loan_schedule(&terms(), MONTHS);
        let first = schedule.period(1).unwrap();
        // 12,000,000 × 0.065 / 12 = 65,000
        assert_eq!(first.interest, 65_000);
        assert_eq!(first.principal, 178_193 - 65_000);
        assert_eq!(first.closing_balance, 12_000_000 - 113_193);
        assert_eq!(schedule.periods.len(), 60);
    }

    #[test]
    fn test_schedule_tracks_closed_form() {
        let t = terms();
        let schedule = build_loan_schedule(&t, MONTHS);
        for period in &schedule.periods {
            let expected = t.closed_form_balance(schedule.monthly_payment, period.month);
            let diff = (expected - Decimal::from(period.closing_balance)).abs();
            assert!(
                diff <= t.rounding_drift_bound(period.month),
                "Month {}: balance {} vs closed form {}",
                period.month,
                period.closing_balance,
                expected
            );
        }
    }

    #[test]
    fn test_short_loan_fully_retired() {
        let t = LoanTerms {
            term_months: 36,
            ..terms()
        };
        let schedule = build_loan_schedule(&t, MONTHS);
        assert_eq!(schedule.period(36).unwrap().closing_balance, 0);
        assert_eq!(schedule.total_principal_paid, t.principal);
        assert!(schedule.periods[36..].iter().all(|p| p.payment == 0));
    }

    #[test]
    fn test_zero_term_repaid_in_first_month() {
        let t = LoanTerms {
            term_months: 0,
            ..terms()
        };
        let schedule = build_loan_schedule(&t, MONTHS);
        assert_eq!(schedule.period(1).unwrap().principal, t.principal);
        assert_eq!(schedule.period(1).unwrap().closing_balance, 0);
        assert_eq!(schedule.total_interest_paid, 0);
    }

    #[test]
    fn test_no_loan() {
        let t = LoanTerms {
            principal: 0,
            ..terms()
        };
        let schedule = build_loan_schedule(&t, MONTHS);
        assert_eq!(schedule.monthly_payment, 0);
        assert!(schedule.periods.iter().all(|p| p.closing_balance == 0));
    }

    #[test]
    fn test_principal_from_down_payment() {
        let a = NormalizedAssumptions {
            loan_amount: 15_000_000,
            down_payment_pct: dec!(0.20),
            interest_rate: dec!(0.065),
            loan_term_months: 84,
            ..Default::default()
        };
        assert_eq!(LoanTerms::from_assumptions(&a), terms());
    }

    #[test]
    fn test_high_rate_schedule_within_drift_bound() {
        let t = LoanTerms {
            annual_rate: dec!(0.60),
            ..terms()
        };
        let schedule = build_loan_schedule(&t, MONTHS);
        for period in &schedule.periods {
            let expected = t.closed_form_balance(schedule.monthly_payment, period.month);
            let diff = (expected - Decimal::from(period.closing_balance)).abs();
            assert!(
                diff <= t.rounding_drift_bound(period.month),
                "Month {}: drift {} exceeds bound",
                period.month,
                diff
            );
        }
    }

    #[test]
    fn test_overflowing_term_pays_interest_only() {
        // 1.03^2400 does not fit in a Decimal
        let t = LoanTerms {
            annual_rate: dec!(0.36),
            term_months: 2400,
            ..terms()
        };
        assert_eq!(t.level_payment(), 360_000);

        let schedule = build_loan_schedule(&t, MONTHS);
        assert!(schedule.periods.iter().all(|p| p.interest == 360_000));
        assert_eq!(schedule.period(60).unwrap().closing_balance, t.principal);
        let closed = t.closed_form_balance(360_000, 60);
        assert!((closed - Decimal::from(t.principal)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_compound_reports_overflow() {
        assert_eq!(compound(dec!(1.5), 3), Some(dec!(3.375)));
        assert_eq!(compound(dec!(2), 0), Some(Decimal::ONE));
        assert_eq!(compound(dec!(1.03), 2400), None);
    }
}
