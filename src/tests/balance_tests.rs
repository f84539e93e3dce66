use super::*;
use crate::core::errors::LedgerError;
use crate::core::models::SuggestedTransfer;
use rust_decimal_macros::dec;

fn transfer(from: &str, to: &str, amount: Decimal) -> SuggestedTransfer {
    SuggestedTransfer {
        from_user_id: from.to_string(),
        to_user_id: to.to_string(),
        amount,
    }
}

#[tokio::test]
async fn test_three_way_split_suggests_two_transfers() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob", "carol"]).await;
    let alice = ctx(&trip, "alice");

    service
        .create_expense(&alice, expense("Dinner", dec!(90), "alice"))
        .await
        .unwrap();

    let balance = service.compute_balance(&alice, None).await.unwrap();
    assert_eq!(balance.paid["alice"], dec!(90));
    assert_eq!(balance.owed["alice"], dec!(30));
    assert_eq!(balance.net["alice"], dec!(60));
    assert_eq!(balance.net["bob"], dec!(-30));
    assert_eq!(balance.net["carol"], dec!(-30));
    assert_eq!(
        balance.transfers,
        vec![transfer("bob", "alice", dec!(30)), transfer("carol", "alice", dec!(30))]
    );
}

#[tokio::test]
async fn test_balance_reads_leave_no_log_entries() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");
    service
        .create_expense(&alice, expense("Museum", dec!(40), "alice"))
        .await
        .unwrap();

    let logs_before = service.get_app_logs().await.unwrap().len();
    let audits_before = service.get_trip_audits(&alice).await.unwrap().len();
    for _ in 0..5 {
        service.compute_balance(&alice, None).await.unwrap();
    }
    assert_eq!(service.get_app_logs().await.unwrap().len(), logs_before);
    assert_eq!(service.get_trip_audits(&alice).await.unwrap().len(), audits_before);
}

#[tokio::test]
async fn test_confirmed_settlement_offsets_balance() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob", "carol"]).await;
    let alice = ctx(&trip, "alice");

    service
        .create_expense(&alice, expense("Dinner", dec!(90), "alice"))
        .await
        .unwrap();
    let pending = service
        .create_settlement(&ctx(&trip, "bob"), settlement("bob", "alice", dec!(30)))
        .await
        .unwrap();

    let balance = service.compute_balance(&alice, None).await.unwrap();
    assert_eq!(balance.net["bob"], dec!(-30), "pending settlements do not move balances");

    service.confirm_settlement(&alice, &pending.id, None).await.unwrap();

    let balance = service.compute_balance(&alice, None).await.unwrap();
    assert_eq!(balance.net["alice"], dec!(30));
    assert_eq!(balance.net["bob"], dec!(0));
    assert_eq!(balance.net["carol"], dec!(-30));
    assert_eq!(balance.transfers, vec![transfer("carol", "alice", dec!(30))]);
}

#[tokio::test]
async fn test_rounding_keeps_nets_balanced() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob", "carol"]).await;
    let alice = ctx(&trip, "alice");

    service
        .create_expense(&alice, expense("Boat", dec!(100), "alice"))
        .await
        .unwrap();

    let balance = service.compute_balance(&alice, None).await.unwrap();
    assert_eq!(balance.net["alice"], dec!(66.66));
    assert_eq!(balance.net["bob"], dec!(-33.33));
    assert_eq!(balance.net["carol"], dec!(-33.33));
    assert_eq!(balance.net.values().copied().sum::<Decimal>(), Decimal::ZERO);
    for (user, net) in &balance.net {
        assert_eq!(balance.paid[user] - balance.owed[user], *net);
    }
}

#[tokio::test]
async fn test_empty_trip_has_zero_balance() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;

    let balance = service.compute_balance(&ctx(&trip, "bob"), None).await.unwrap();
    assert_eq!(balance.currency, rub());
    assert_eq!(balance.revision, 0);
    assert!(balance.net.values().all(|n| n.is_zero()));
    assert!(balance.transfers.is_empty());
}

#[tokio::test]
async fn test_mixed_currencies_require_explicit_currency() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");
    let eur = Currency::parse("EUR").unwrap();

    service
        .create_expense(&alice, expense("Dinner", dec!(100), "alice"))
        .await
        .unwrap();
    let mut abroad = expense("Museum", dec!(20), "bob");
    abroad.currency = Some(eur.clone());
    service.create_expense(&alice, abroad).await.unwrap();

    let result = service.compute_balance(&alice, None).await;
    assert!(matches!(result, Err(LedgerError::MixedCurrency(codes)) if codes == vec!["EUR", "RUB"]));

    let in_euros = service.compute_balance(&alice, Some(eur)).await.unwrap();
    assert_eq!(in_euros.net["alice"], dec!(-10));
    assert_eq!(in_euros.net["bob"], dec!(10));

    let in_rubles = service.compute_balance(&alice, Some(rub())).await.unwrap();
    assert_eq!(in_rubles.net["alice"], dec!(50));
    assert_eq!(in_rubles.transfers, vec![transfer("bob", "alice", dec!(50))]);
}

#[tokio::test]
async fn test_single_foreign_currency_is_picked_up() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");

    let mut request = expense("Ramen", dec!(3000), "bob");
    request.currency = Some(Currency::parse("JPY").unwrap());
    service.create_expense(&alice, request).await.unwrap();

    let balance = service.compute_balance(&alice, None).await.unwrap();
    assert_eq!(balance.currency.code(), "JPY");
    assert_eq!(balance.net["bob"], dec!(1500));
}

#[tokio::test]
async fn test_balance_requires_membership() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;

    let result = service.compute_balance(&ctx(&trip, "mallory"), None).await;
    assert!(matches!(result, Err(LedgerError::NotTripMember(_))));
}
