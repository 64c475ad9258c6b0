use super::*;
use proptest::prelude::*;

#[test]
fn window_is_centred_when_there_is_room() {
    assert_eq!(compute_window(5, 10, 5), vec![3, 4, 5, 6, 7]);
    assert_eq!(compute_window(3, 10, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(compute_window(6, 10, 5), vec![4, 5, 6, 7, 8]);
}

#[test]
fn window_is_pinned_at_the_edges() {
    assert_eq!(compute_window(1, 10, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(compute_window(2, 10, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(compute_window(9, 10, 5), vec![6, 7, 8, 9, 10]);
    assert_eq!(compute_window(10, 10, 5), vec![6, 7, 8, 9, 10]);
}

#[test]
fn fewer_pages_than_window() {
    assert_eq!(compute_window(2, 3, 5), vec![1, 2, 3]);
    assert_eq!(compute_window(1, 1, 5), vec![1]);
}

#[test]
fn even_window_leans_right_of_current() {
    assert_eq!(compute_window(5, 10, 4), vec![3, 4, 5, 6]);
}

#[test]
fn degenerate_inputs_give_empty_window() {
    assert!(compute_window(1, 0, 5).is_empty());
    assert!(compute_window(3, 10, 0).is_empty());
}

#[test]
fn out_of_range_current_page_is_clamped() {
    assert_eq!(compute_window(0, 10, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(compute_window(42, 10, 5), vec![6, 7, 8, 9, 10]);
}

#[test]
fn page_state_from_response_clamps_to_total() {
    let state = PageState::from_response(
        7,
        Some(Pagination {
            current_page: 7,
            total_pages: 4,
            total_items: 40,
        }),
    );
    assert_eq!(state.current_page, 4);
    assert_eq!(state.total_pages, 4);
    assert_eq!(state.total_items, 40);
    assert!(!state.has_next());
    assert_eq!(state.previous(), Some(3));
}

#[test]
fn missing_pagination_means_a_single_page() {
    let state = PageState::from_response(3, None);
    assert_eq!(state, PageState::default());
    assert_eq!(state.window(DEFAULT_WINDOW_SIZE), vec![1]);
    assert_eq!(state.next(), None);
    assert_eq!(state.previous(), None);
}

#[test]
fn zero_total_pages_from_server_is_treated_as_one() {
    let state = PageState::from_response(
        1,
        Some(Pagination {
            current_page: 1,
            total_pages: 0,
            total_items: 0,
        }),
    );
    assert_eq!(state.total_pages, 1);
    assert!(state.contains(1));
    assert!(!state.contains(2));
    assert!(!state.contains(0));
}

proptest! {
    #[test]
    fn small_totals_show_every_page(total in 1u32..=5, current in 1u32..=5) {
        let current = current.min(total);
        let expected: Vec<u32> = (1..=total).collect();
        prop_assert_eq!(compute_window(current, total, DEFAULT_WINDOW_SIZE), expected);
    }

    #[test]
    fn window_is_idempotent(total in 0u32..200, current in 0u32..250, window in 0u32..12) {
        prop_assert_eq!(
            compute_window(current, total, window),
            compute_window(current, total, window)
        );
    }

    #[test]
    fn window_is_contiguous_and_bounded(
        total in 1u32..500,
        current in 0u32..600,
        window in 1u32..20,
    ) {
        let pages = compute_window(current, total, window);

        prop_assert_eq!(pages.len() as u32, window.min(total));
        prop_assert!(pages.windows(2).all(|pair| pair[1] == pair[0] + 1));
        prop_assert!(pages.first().copied().unwrap_or(0) >= 1);
        prop_assert!(pages.last().copied().unwrap_or(0) <= total);
        prop_assert!(pages.contains(&current.clamp(1, total)));
    }

    #[test]
    fn page_state_keeps_current_within_total(
        requested in 0u32..100,
        total in 0u32..50,
    ) {
        let state = PageState::from_response(
            requested,
            Some(Pagination { current_page: requested, total_pages: total, total_items: 0 }),
        );
        prop_assert!(state.current_page >= 1);
        prop_assert!(state.current_page <= state.total_pages);
    }
}
