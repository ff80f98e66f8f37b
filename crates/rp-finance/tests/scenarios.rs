//! Worked examples for rate resolution and rollup

use chrono::NaiveDate;
use rp_core::config::EmployeeCostPolicy;
use rp_core::types::{CurrencyCode, RecordId};
use rp_finance::{resolve_rates, rollup_line_item, CostSource, CurrencyRates, RateInputs, Reference};
use rp_models::{DeliveryCenter, DeliveryCenterDirectory, Employee, LineItem, Role, RoleRate};
use rust_decimal_macros::dec;

struct Setup {
    role: Role,
    centers: DeliveryCenterDirectory,
    rates: CurrencyRates,
    role_id: RecordId,
    c1: RecordId,
}

impl Setup {
    fn new() -> Self {
        Self {
            role: Role::new("R1", "Engineer", "USD")
                .with_rate(RoleRate::new("C1", dec!(50), dec!(100), "USD")),
            centers: DeliveryCenterDirectory::new(vec![
                DeliveryCenter::new("C1", "c1", "Center 1", "USD"),
                DeliveryCenter::new("C2", "c2", "Center 2", "USD"),
            ]),
            rates: CurrencyRates::new(
                "USD",
                [
                    (CurrencyCode::new("USD"), dec!(1.0)),
                    (CurrencyCode::new("EUR"), dec!(0.92)),
                ],
            )
            .unwrap(),
            role_id: RecordId::from("R1"),
            c1: RecordId::from("C1"),
        }
    }

    fn inputs<'a>(&'a self, target: &'a CurrencyCode) -> RateInputs<'a> {
        RateInputs {
            role_id: &self.role_id,
            role: Reference::Loaded(&self.role),
            employee_id: None,
            employee: Reference::Loading,
            context_center_id: Some(&self.c1),
            target_currency: target,
            centers: Reference::Loaded(&self.centers),
            currency_rates: &self.rates,
            policy: EmployeeCostPolicy::CenterMatchSensitive,
        }
    }
}

#[test]
fn center_rate_in_plan_currency() {
    let setup = Setup::new();
    let usd = CurrencyCode::usd();
    let resolved = resolve_rates(&setup.inputs(&usd)).unwrap();
    assert_eq!(resolved.cost.to_string(), "50.00");
    assert_eq!(resolved.rate.to_string(), "100.00");
}

#[test]
fn center_rate_converted_to_eur() {
    let setup = Setup::new();
    let eur = CurrencyCode::new("EUR");
    let resolved = resolve_rates(&setup.inputs(&eur)).unwrap();
    assert_eq!(resolved.cost, dec!(46.00));
    assert_eq!(resolved.rate, dec!(92.00));
}

#[test]
fn employee_from_other_center_costs_bill_rate() {
    let setup = Setup::new();
    let usd = CurrencyCode::usd();
    let employee = Employee::new("E1", "Grace", "USD")
        .with_home_center("C2")
        .with_rates(dec!(40), dec!(60), dec!(150));
    let inputs = RateInputs {
        employee_id: Some(&employee.id),
        employee: Reference::Loaded(&employee),
        ..setup.inputs(&usd)
    };

    let resolved = resolve_rates(&inputs).unwrap();
    assert_eq!(resolved.cost, dec!(60));
    assert_eq!(resolved.cost_source, CostSource::EmployeeInternalBill);
    assert_eq!(resolved.rate, dec!(100));
}

#[test]
fn two_week_rollup_with_expenses() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
    let item = LineItem::new("USD", d(10), d(23))
        .with_rates(dec!(50), dec!(100))
        .with_expense_percentage(dec!(10))
        .with_hours(d(10), "20".parse().unwrap())
        .with_hours(d(17), "20".parse().unwrap());

    let f = rollup_line_item(&item, &[d(10), d(17)]).unwrap();
    assert_eq!(f.total_hours, dec!(40));
    assert_eq!(f.total_cost, dec!(2000));
    assert_eq!(f.total_revenue, dec!(4000));
    assert_eq!(f.billable_expense_amount, dec!(400));
    assert_eq!(f.margin_amount, dec!(2000));
    assert_eq!(f.margin_percent_without_expenses, dec!(50.0));
    assert_eq!(f.margin_percent_with_expenses, dec!(45.45));
}
