/// lifecycle - one loan from declaration to withdrawal
use chrono::{Duration, TimeZone, Utc};
use loan_ledger_rs::{
    CallContext, Caller, CollateralId, CollateralTerms, Currency, Ledger, LedgerConfig, LoanId,
    LoanTerms, Money, Party, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let owner = Caller::new("platform-owner");
    let ledger = Ledger::new(LedgerConfig::new("p2p", owner.clone()));

    let loan_id = LoanId::new();
    let terms = LoanTerms::collateralized(
        Money::new(1_000_000),
        Currency::Usdc,
        CollateralTerms {
            collateral_id: CollateralId::new(),
            amount: Money::new(50_000_000),
            currency: Currency::Btc,
        },
        Duration::days(30),
        Rate::from_percentage(5),
    );

    // 1. declaration
    ledger.declare(&CallContext::new(owner.clone(), &time), loan_id, &terms)?;
    println!("1. declared, stage {:?}", ledger.stage(&loan_id));
    println!("   amount due: {}", ledger.amount_due(&loan_id)?);

    // 2. participants
    ledger.bind_participants(
        &CallContext::new(owner.clone(), &time),
        loan_id,
        false,
        Party::new(17, "alice"),
        Party::new(42, "bob"),
    )?;
    println!("2. signed, status {:?}", ledger.status(&loan_id, &time)?);

    // 3. repayments
    for installment in [400_000u128, 400_000, 250_000] {
        controller.advance(Duration::days(7));
        ledger.record_payment(
            &CallContext::new(owner.clone(), &time),
            loan_id,
            Money::new(installment),
        )?;
        println!(
            "3. {} paid {}, remaining {}, status {:?}",
            time.now().format("%Y-%m-%d"),
            installment,
            ledger.remaining_due(&loan_id)?,
            ledger.status(&loan_id, &time)?
        );
    }

    // 4. collateral back to the borrower
    ledger.mark_withdrawn(&CallContext::new(owner, &time), loan_id)?;
    println!("4. withdrawn, status {:?}\n", ledger.status(&loan_id, &time)?);

    println!("{}", ledger.loan_view(&loan_id, &time)?.to_json_pretty()?);
    Ok(())
}
