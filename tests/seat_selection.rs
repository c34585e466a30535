use std::collections::BTreeSet;

use cinema_booking_api::{
    error::BookingError,
    services::seat_service::{MAX_SEATS_PER_ORDER, conflicting_seats, parse_seat_selection},
};

fn invalid(raw: &str, capacity: i32) -> String {
    match parse_seat_selection(raw, capacity) {
        Err(BookingError::InvalidSeatSelection(reason)) => reason,
        other => panic!("expected InvalidSeatSelection for {raw:?}, got {other:?}"),
    }
}

#[test]
fn parses_and_sorts_seats() {
    let seats = parse_seat_selection(" 12, 3,7 ", 50).expect("valid seats");
    assert_eq!(seats.to_vec(), vec![3, 7, 12]);
    assert_eq!(seats.len(), 3);
}

#[test]
fn accepts_capacity_bounds() {
    let seats = parse_seat_selection("1,50", 50).expect("bounds are inclusive");
    assert_eq!(seats.to_vec(), vec![1, 50]);
}

#[test]
fn rejects_empty_input() {
    invalid("", 50);
    invalid("   ", 50);
}

#[test]
fn rejects_duplicate_seats() {
    let reason = invalid("1,1,2", 50);
    assert!(reason.contains("more than once"), "{reason}");
}

#[test]
fn rejects_out_of_range_seats() {
    invalid("0", 50);
    invalid("51", 50);
    invalid("-3", 50);
    let reason = invalid("2,99", 50);
    assert!(reason.contains("99"), "{reason}");
}

#[test]
fn rejects_malformed_tokens() {
    invalid("a,b", 50);
    invalid("1,,2", 50);
    invalid("1.5", 50);
    invalid("1;2", 50);
}

#[test]
fn rejects_more_than_four_seats() {
    let err = parse_seat_selection("1,2,3,4,5", 50).unwrap_err();
    assert_eq!(
        err,
        BookingError::TooManySeats {
            max: MAX_SEATS_PER_ORDER
        }
    );
    assert!(parse_seat_selection("1,2,3,4", 50).is_ok());
}

#[test]
fn range_problems_win_over_seat_count() {
    // An out-of-range seat is reported even when the list is also too long.
    invalid("1,2,3,4,99", 50);
}

#[test]
fn finds_conflicts_in_ascending_order() {
    let reserved: BTreeSet<i32> = [2, 5, 9].into_iter().collect();
    let requested = parse_seat_selection("9,1,5", 50).expect("valid seats");
    assert_eq!(conflicting_seats(&reserved, &requested), vec![5, 9]);

    let free = parse_seat_selection("1,3", 50).expect("valid seats");
    assert!(conflicting_seats(&reserved, &free).is_empty());
}
