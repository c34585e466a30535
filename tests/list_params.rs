use cinema_booking_api::routes::params::{
    CouponListQuery, MAX_PAGE, MAX_PER_PAGE, OrderListQuery, Pagination,
};

#[test]
fn defaults_to_first_page_of_twenty() {
    assert_eq!(Pagination::default().normalize(), (1, 20, 0));
}

#[test]
fn page_and_per_page_are_clamped() {
    let low = Pagination {
        page: Some(-3),
        per_page: Some(0),
    };
    assert_eq!(low.normalize(), (1, 1, 0));

    let high = Pagination {
        page: Some(3),
        per_page: Some(500),
    };
    assert_eq!(high.normalize(), (3, MAX_PER_PAGE, 2 * MAX_PER_PAGE));
}

#[test]
fn huge_page_numbers_do_not_overflow() {
    let query = OrderListQuery {
        page: Some(i64::MAX),
        per_page: Some(20),
        ..Default::default()
    };
    let (page, per_page, offset) = query.pagination().normalize();
    assert_eq!(page, MAX_PAGE);
    assert_eq!(per_page, 20);
    assert_eq!(offset, (MAX_PAGE - 1) * 20);

    let query = CouponListQuery {
        page: Some(i64::MAX),
        per_page: Some(i64::MAX),
        status: None,
    };
    let (_, _, offset) = query.pagination().normalize();
    assert!(offset >= 0);
}
