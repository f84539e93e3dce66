mod balance_tests;
mod expense_tests;

use crate::core::context::RequestContext;
use crate::core::models::{NewExpense, NewSettlement, Share, Trip};
use crate::core::money::Currency;
use crate::core::services::TripLedgerService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use rust_decimal::Decimal;

pub type TestService = TripLedgerService<InMemoryLogging, InMemoryStorage>;

pub fn create_test_service() -> TestService {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    TripLedgerService::new(storage, logging, "test-secret".to_string())
}

pub fn rub() -> Currency {
    Currency::parse("RUB").unwrap()
}

pub fn ctx(trip: &Trip, user: &str) -> RequestContext {
    RequestContext::new(trip.id.clone(), user)
}

/// Trip owned by the first user with every other user added as a member.
pub async fn create_trip_with(service: &TestService, members: &[&str]) -> Trip {
    let owner = members[0];
    let mut trip = service
        .create_trip(owner, "Weekend in Kazan".to_string(), rub())
        .await
        .unwrap();
    for member in &members[1..] {
        trip = service.add_member(&ctx(&trip, owner), member).await.unwrap();
    }
    trip
}

pub fn expense(title: &str, amount: Decimal, payer: &str) -> NewExpense {
    NewExpense {
        title: title.to_string(),
        amount,
        payer_id: Some(payer.to_string()),
        ..Default::default()
    }
}

pub fn shares(weights: &[(&str, Decimal)]) -> Option<Vec<Share>> {
    Some(
        weights
            .iter()
            .map(|(user_id, weight)| Share {
                user_id: user_id.to_string(),
                weight: *weight,
            })
            .collect(),
    )
}

pub fn settlement(from: &str, to: &str, amount: Decimal) -> NewSettlement {
    NewSettlement {
        from_user_id: from.to_string(),
        to_user_id: to.to_string(),
        amount,
        currency: None,
        proof: None,
        expected_revision: None,
    }
}
