/// shared collateral - several loans behind one pledged asset
use chrono::{Duration, TimeZone, Utc};
use loan_ledger_rs::{
    CallContext, Caller, CollateralId, CollateralTerms, Currency, Ledger, LedgerConfig, LoanId,
    LoanTerms, Money, Party, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    println!("=== shared collateral ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let owner = Caller::new("platform-owner");
    let ledger = Ledger::new(LedgerConfig::new("p2p", owner.clone()));
    let bucket = CollateralId::new();

    let mut loans = Vec::new();
    for (i, days) in [10i64, 20, 40].into_iter().enumerate() {
        let loan_id = LoanId::new();
        let terms = LoanTerms::collateralized(
            Money::new(10_000),
            Currency::Eur,
            CollateralTerms {
                collateral_id: bucket,
                amount: Money::new(1),
                currency: Currency::Eth,
            },
            Duration::days(days),
            Rate::from_bps(250),
        );
        let ctx = CallContext::new(owner.clone(), &time);
        ledger.declare(&ctx, loan_id, &terms)?;
        ledger.bind_participants(
            &ctx,
            loan_id,
            i == 0,
            Party::new(i as u64 + 1, format!("borrower-{}", i)),
            Party::new(100, "lender"),
        )?;
        loans.push(loan_id);
    }

    // first loan repaid in full and released
    controller.advance(Duration::days(5));
    let ctx = CallContext::new(owner.clone(), &time);
    ledger.record_payment(&ctx, loans[0], Money::new(10_250))?;
    ledger.mark_withdrawn(&ctx, loans[0])?;

    // second loan only partly repaid before its period runs out
    ledger.record_payment(&ctx, loans[1], Money::new(3_000))?;
    controller.advance(Duration::days(25));

    // late payments are refused
    let late = ledger.record_payment(
        &CallContext::new(owner, &time),
        loans[1],
        Money::new(7_250),
    );
    if let Err(e) = late {
        println!("late payment rejected: [{}] {}\n", e.code(), e);
    }

    println!("bucket {} backs {} loans", bucket, ledger.collateral_count(&bucket));
    for (loan_id, status) in ledger.collateral_statuses(&bucket, &time)? {
        println!("  {} -> {:?}", loan_id, status);
    }

    Ok(())
}
