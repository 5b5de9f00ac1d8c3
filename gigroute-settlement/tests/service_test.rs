use chrono::NaiveDate;
use gigroute_core::{
    ExpenseCategory, PromoterExpense, TourStop, TourStopRepository, TourStopStatus, VenueRef,
};
use gigroute_settlement::{
    PaymentType, ServiceError, SettlementCalculator, SettlementError, SettlementService,
};
use gigroute_store::MemoryTourStopRepository;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

fn show(org: Uuid, tour: Uuid, day: u32, status: TourStopStatus) -> TourStop {
    let mut stop = TourStop::new(org, NaiveDate::from_ymd_opt(2026, 3, day).unwrap());
    stop.tour_id = Some(tour);
    stop.venue = Some(VenueRef {
        id: None,
        name: "Le Trabendo".to_string(),
        city: Some("Paris".to_string()),
        country: Some("FR".to_string()),
        capacity: Some(250),
    });
    stop.ticket_price = Some(dec!(30));
    stop.ticket_fee_percent = Some(dec!(10));
    stop.guarantee = Some(dec!(2000));
    stop.door_deal_percent = Some(dec!(80));
    stop.currency = Some("EUR".to_string());
    stop.tickets_sold = 200;
    stop.status = status;
    stop
}

async fn setup() -> (Arc<MemoryTourStopRepository>, SettlementService) {
    let repo = Arc::new(MemoryTourStopRepository::new());
    let service = SettlementService::new(repo.clone(), SettlementCalculator::default());
    (repo, service)
}

#[tokio::test]
async fn test_preview_does_not_change_status() {
    let (repo, service) = setup().await;
    let org = Uuid::new_v4();
    let stop = show(org, Uuid::new_v4(), 7, TourStopStatus::Played);
    let id = stop.id;
    repo.insert_tour_stop(stop).await;
    repo.insert_expense(PromoterExpense::new(id, "security", ExpenseCategory::Security, dec!(500), "EUR"))
        .await;

    let sheet = service.preview(org, id).await.unwrap();

    assert_eq!(sheet.settlement.promoter_net, dec!(580));
    assert_eq!(sheet.settlement.payment_type, PaymentType::DoorDeal);
    assert_eq!(sheet.venue_name.as_deref(), Some("Le Trabendo"));
    let stored = repo.get_tour_stop(org, id).await.unwrap().unwrap();
    assert_eq!(stored.status, TourStopStatus::Played);
}

#[tokio::test]
async fn test_settle_moves_stop_to_settled() {
    let (repo, service) = setup().await;
    let org = Uuid::new_v4();
    let stop = show(org, Uuid::new_v4(), 7, TourStopStatus::Played);
    let id = stop.id;
    repo.insert_tour_stop(stop).await;

    let sheet = service.settle(org, id).await.unwrap();
    assert_eq!(sheet.status, TourStopStatus::Settled);

    let stored = repo.get_tour_stop(org, id).await.unwrap().unwrap();
    assert_eq!(stored.status, TourStopStatus::Settled);
    assert!(stored.settled_at.is_some());

    // Already settled: still viewable, not settleable twice
    assert!(service.preview(org, id).await.is_ok());
    let err = service.settle(org, id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotSettleable { status: TourStopStatus::Settled, .. }));
}

#[tokio::test]
async fn test_unplayed_stop_is_not_settleable() {
    let (repo, service) = setup().await;
    let org = Uuid::new_v4();
    let stop = show(org, Uuid::new_v4(), 7, TourStopStatus::Confirmed);
    let id = stop.id;
    repo.insert_tour_stop(stop).await;

    let err = service.preview(org, id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotSettleable { status: TourStopStatus::Confirmed, .. }));
}

#[tokio::test]
async fn test_other_tenant_sees_not_found() {
    let (repo, service) = setup().await;
    let stop = show(Uuid::new_v4(), Uuid::new_v4(), 7, TourStopStatus::Played);
    let id = stop.id;
    repo.insert_tour_stop(stop).await;

    let err = service.preview(Uuid::new_v4(), id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(found) if found == id));
}

#[tokio::test]
async fn test_invalid_data_leaves_stop_played() {
    let (repo, service) = setup().await;
    let org = Uuid::new_v4();
    let stop = show(org, Uuid::new_v4(), 7, TourStopStatus::Played);
    let id = stop.id;
    repo.insert_tour_stop(stop).await;
    repo.insert_expense(PromoterExpense::new(id, "backline", ExpenseCategory::Production, dec!(300), "USD"))
        .await;

    let err = service.settle(org, id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(SettlementError::CurrencyMismatch { .. })));

    let stored = repo.get_tour_stop(org, id).await.unwrap().unwrap();
    assert_eq!(stored.status, TourStopStatus::Played);
    assert!(stored.settled_at.is_none());
}

#[tokio::test]
async fn test_tour_report_skips_unplayed_and_invalid_stops() {
    let (repo, service) = setup().await;
    let org = Uuid::new_v4();
    let tour = Uuid::new_v4();

    let paris = show(org, tour, 1, TourStopStatus::Played);
    let mut london = show(org, tour, 3, TourStopStatus::Settled);
    london.currency = Some("GBP".to_string());
    london.tickets_sold = 50;
    let upcoming = show(org, tour, 9, TourStopStatus::Confirmed);
    let mut oversold = show(org, tour, 5, TourStopStatus::Played);
    oversold.tickets_sold = 300;

    let (upcoming_id, oversold_id) = (upcoming.id, oversold.id);
    for stop in [paris, london, upcoming, oversold] {
        repo.insert_tour_stop(stop).await;
    }

    let report = service.tour_report(org, tour).await.unwrap();

    assert_eq!(report.stops.len(), 2);
    assert_eq!(report.stops[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].tour_stop_id, oversold_id);
    assert!(report.skipped[0].reason.contains("capacity"));
    assert_eq!(report.skipped[1].tour_stop_id, upcoming_id);
    assert_eq!(report.summary.by_currency.len(), 2);
    assert_eq!(report.summary.stops(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_settles_settle_once() {
    for _ in 0..50 {
        let (repo, service) = setup().await;
        let service = Arc::new(service);
        let org = Uuid::new_v4();
        let stop = show(org, Uuid::new_v4(), 7, TourStopStatus::Played);
        let id = stop.id;
        repo.insert_tour_stop(stop).await;

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.settle(org, id).await }
        });
        let second = tokio::spawn({
            let service = service.clone();
            async move { service.settle(org, id).await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let refused = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(refused, ServiceError::NotSettleable { status: TourStopStatus::Settled, .. }));
    }
}

#[tokio::test]
async fn test_tour_report_skips_stop_with_foreign_expense() {
    let (repo, service) = setup().await;
    let org = Uuid::new_v4();
    let tour = Uuid::new_v4();

    let paris = show(org, tour, 1, TourStopStatus::Played);
    let lyon = show(org, tour, 2, TourStopStatus::Played);
    let lyon_id = lyon.id;
    repo.insert_tour_stop(paris).await;
    repo.insert_tour_stop(lyon).await;
    repo.insert_expense(PromoterExpense::new(lyon_id, "rider", ExpenseCategory::Catering, dec!(240), "CHF"))
        .await;

    let report = service.tour_report(org, tour).await.unwrap();

    assert_eq!(report.stops.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].tour_stop_id, lyon_id);
    assert!(report.skipped[0].reason.contains("CHF"));

    let eur = report.summary.by_currency.values().next().unwrap();
    assert_eq!(eur.stops, 1);
    assert_eq!(eur.gbor, dec!(6000));
}

#[tokio::test]
async fn test_tour_report_overflow_is_an_error() {
    let (repo, service) = setup().await;
    let org = Uuid::new_v4();
    let tour = Uuid::new_v4();
    let huge = Decimal::MAX / dec!(2) + dec!(1);

    for day in [1, 2] {
        let mut stop = show(org, tour, day, TourStopStatus::Played);
        stop.ticket_price = Some(huge);
        stop.tickets_sold = 1;
        repo.insert_tour_stop(stop).await;
    }

    let err = service.tour_report(org, tour).await.unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(SettlementError::Overflow { .. })));
}
