/// snapshot - persist a ledger to json and bring it back
use chrono::{Duration, TimeZone, Utc};
use loan_ledger_rs::{
    CallContext, Caller, Currency, Ledger, LedgerConfig, LedgerSnapshot, LoanId, LoanTerms,
    Party, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== snapshot and restore ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let config = LedgerConfig::from_json(r#"{"name": "p2p", "controller": "platform-owner"}"#)?;
    let owner = config.controller.clone();
    let ledger = Ledger::new(config.clone());

    let terms = LoanTerms::from_json(
        r#"{
            "principal_amount": "25000",
            "principal_currency": "USD",
            "collateral": null,
            "period": 1209600,
            "fee": 300
        }"#,
    )?;
    assert_eq!(terms.principal_currency, Currency::Usd);

    let loan_id = LoanId::new();
    let ctx = CallContext::new(owner.clone(), &time);
    ledger.declare(&ctx, loan_id, &terms)?;
    ledger.bind_participants(&ctx, loan_id, true, Party::new(1, "carol"), Party::new(0, "platform"))?;
    ledger.record_payment(&ctx, loan_id, "5000".parse()?)?;

    let json = ledger.snapshot(&time).to_json()?;
    println!("snapshot: {} bytes\n{}\n", json.len(), json);

    let restored = Ledger::restore(config, LedgerSnapshot::from_json(&json)?)?;
    controller.advance(Duration::days(15));
    println!(
        "restored loan after 15 days: status {:?}, paid {} of {}",
        restored.status(&loan_id, &time)?,
        restored.total_paid(&loan_id)?,
        restored.amount_due(&loan_id)?
    );

    // the stranger cannot touch the restored ledger either
    let stranger = CallContext::new(Caller::new("stranger"), &time);
    if let Err(e) = restored.mark_withdrawn(&stranger, loan_id) {
        println!("stranger rejected: {}", e.code());
    }

    Ok(())
}
