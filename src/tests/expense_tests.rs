use super::*;
use crate::constants::UNCATEGORIZED;
use crate::core::errors::LedgerError;
use crate::core::models::ExpensePatch;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_default_shares_split_equally_over_members() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob", "carol"]).await;

    let view = service
        .create_expense(&ctx(&trip, "alice"), expense("Taxi", dec!(100), "alice"))
        .await
        .unwrap();

    assert_eq!(view.expense.currency, rub());
    assert_eq!(view.expense.shares.len(), 3);
    let amounts: Vec<_> = view.allocations.iter().map(|a| a.amount).collect();
    assert_eq!(amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    assert_eq!(amounts.iter().copied().sum::<rust_decimal::Decimal>(), dec!(100));
}

#[tokio::test]
async fn test_weighted_allocation() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;

    let mut request = expense("Hotel", dec!(300), "alice");
    request.shares = shares(&[("alice", dec!(2)), ("bob", dec!(1))]);
    let view = service.create_expense(&ctx(&trip, "alice"), request).await.unwrap();

    assert_eq!(view.allocations[0].amount, dec!(200));
    assert_eq!(view.allocations[1].amount, dec!(100));
}

#[tokio::test]
async fn test_payer_defaults_to_acting_user() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;

    let mut request = expense("Snacks", dec!(12.50), "alice");
    request.payer_id = None;
    let view = service.create_expense(&ctx(&trip, "bob"), request).await.unwrap();
    assert_eq!(view.expense.payer_id, "bob");
    assert_eq!(view.expense.created_by, "bob");
}

#[tokio::test]
async fn test_rejects_invalid_shares() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");

    let mut request = expense("Dinner", dec!(50), "alice");
    request.shares = Some(vec![]);
    let result = service.create_expense(&alice, request).await;
    assert!(matches!(result, Err(LedgerError::EmptyShares)));

    let mut request = expense("Dinner", dec!(50), "alice");
    request.shares = shares(&[("bob", dec!(1)), ("bob", dec!(2))]);
    let result = service.create_expense(&alice, request).await;
    assert!(matches!(result, Err(LedgerError::DuplicateShare(id)) if id == "bob"));

    let mut request = expense("Dinner", dec!(50), "alice");
    request.shares = shares(&[("bob", dec!(1)), ("zoe", dec!(1))]);
    let result = service.create_expense(&alice, request).await;
    assert!(matches!(result, Err(LedgerError::InvalidParticipant(id)) if id == "zoe"));

    let mut request = expense("Dinner", dec!(50), "alice");
    request.shares = shares(&[("bob", dec!(0))]);
    let result = service.create_expense(&alice, request).await;
    assert!(matches!(result, Err(LedgerError::InvalidInput(field, _)) if field == "weight"));

    let result = service.create_expense(&alice, expense("Dinner", dec!(50), "zoe")).await;
    assert!(matches!(result, Err(LedgerError::InvalidParticipant(id)) if id == "zoe"));

    let trip = service.get_trip(&alice).await.unwrap();
    assert_eq!(trip.revision, 0);
}

#[tokio::test]
async fn test_rejects_invalid_amounts() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");

    for amount in [dec!(0), dec!(-5), dec!(10.001), dec!(1000000000.01)] {
        let result = service.create_expense(&alice, expense("Bad", amount, "alice")).await;
        assert!(
            matches!(result, Err(LedgerError::InvalidInput(ref field, _)) if field == "amount"),
            "amount {} should be rejected",
            amount
        );
    }

    let mut request = expense("Sushi", dec!(1500.5), "alice");
    request.currency = Some(Currency::parse("JPY").unwrap());
    let result = service.create_expense(&alice, request).await;
    assert!(matches!(result, Err(LedgerError::InvalidInput(..))));
}

#[tokio::test]
async fn test_non_member_cannot_add_expense() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;

    let result = service
        .create_expense(&ctx(&trip, "mallory"), expense("Dinner", dec!(10), "alice"))
        .await;
    assert!(matches!(result, Err(LedgerError::NotTripMember(_))));
}

#[tokio::test]
async fn test_update_expense_changes_balance_and_revision() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");

    let view = service
        .create_expense(&alice, expense("Fuel", dec!(40), "alice"))
        .await
        .unwrap();

    let patch = ExpensePatch {
        amount: Some(dec!(60)),
        category: Some("Transport".to_string()),
        ..Default::default()
    };
    let updated = service
        .update_expense(&ctx(&trip, "bob"), &view.expense.id, patch)
        .await
        .unwrap();
    assert_eq!(updated.expense.amount, dec!(60));
    assert_eq!(updated.expense.category.as_deref(), Some("Transport"));

    let balance = service.compute_balance(&alice, None).await.unwrap();
    assert_eq!(balance.revision, 2);
    assert_eq!(balance.net["alice"], dec!(30));
    assert_eq!(balance.net["bob"], dec!(-30));
}

#[tokio::test]
async fn test_update_missing_expense() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;

    let result = service
        .update_expense(&ctx(&trip, "alice"), "nope", ExpensePatch::default())
        .await;
    assert!(matches!(result, Err(LedgerError::ExpenseNotFound(_))));
}

#[tokio::test]
async fn test_delete_expense_restores_balance() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");

    let view = service
        .create_expense(&alice, expense("Museum", dec!(20), "alice"))
        .await
        .unwrap();
    service.delete_expense(&alice, &view.expense.id).await.unwrap();

    let balance = service.compute_balance(&alice, None).await.unwrap();
    assert_eq!(balance.net["alice"], dec!(0));
    assert!(balance.transfers.is_empty());

    let result = service.delete_expense(&alice, &view.expense.id).await;
    assert!(matches!(result, Err(LedgerError::ExpenseNotFound(_))));
}

#[tokio::test]
async fn test_list_expenses_newest_first() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");

    service
        .create_expense(&alice, expense("First", dec!(10), "alice"))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    service
        .create_expense(&alice, expense("Second", dec!(20), "bob"))
        .await
        .unwrap();

    let listed = service.list_expenses(&alice).await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|v| v.expense.title.as_str()).collect();
    assert_eq!(titles, vec!["Second", "First"]);
    assert_eq!(listed[0].allocations.len(), 2);
}

#[tokio::test]
async fn test_trip_stats_by_category_and_payer() {
    let service = create_test_service();
    let trip = create_trip_with(&service, &["alice", "bob"]).await;
    let alice = ctx(&trip, "alice");

    let mut food = expense("Lunch", dec!(30), "alice");
    food.category = Some("Food".to_string());
    service.create_expense(&alice, food).await.unwrap();
    let mut dinner = expense("Dinner", dec!(45.50), "bob");
    dinner.category = Some("Food".to_string());
    service.create_expense(&alice, dinner).await.unwrap();
    service
        .create_expense(&alice, expense("Souvenirs", dec!(10), "bob"))
        .await
        .unwrap();

    let stats = service.trip_stats(&alice, None).await.unwrap();
    assert_eq!(stats.total, dec!(85.50));
    assert_eq!(stats.by_category.len(), 2);
    assert_eq!(stats.by_category[0].category, "Food");
    assert_eq!(stats.by_category[0].amount, dec!(75.50));
    assert_eq!(stats.by_category[1].category, UNCATEGORIZED);
    assert_eq!(stats.by_payer[0].user_id, "alice");
    assert_eq!(stats.by_payer[0].amount, dec!(30));
    assert_eq!(stats.by_payer[1].amount, dec!(55.50));
}
