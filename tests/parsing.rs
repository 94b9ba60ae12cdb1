use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use loto_features::draw::DrawId;
use loto_features::results_table::{merge_pages, parse_results_page};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn detail_page_yields_one_draw_per_table() {
    let html = read_fixture("loto6_detail_1850-1851.html");
    let draws = parse_results_page(&html).expect("detail fixture should parse");
    assert_eq!(draws.len(), 2);

    assert_eq!(draws[0].draw_id, DrawId(1850));
    assert_eq!(draws[0].draw_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    assert_eq!(draws[0].main_numbers, vec![3, 11, 19, 24, 35, 42]);
    assert_eq!(draws[0].bonus_number, Some(8));

    assert_eq!(draws[1].draw_id, DrawId(1851));
    assert_eq!(draws[1].main_numbers, vec![1, 7, 13, 22, 30, 43]);
    assert_eq!(draws[1].bonus_number, Some(17));
}

#[test]
fn backnumber_page_yields_one_draw_per_row() {
    let html = read_fixture("loto6_backnumber_202401.html");
    let draws = parse_results_page(&html).expect("backnumber fixture should parse");
    let ids: Vec<u32> = draws.iter().map(|d| d.draw_id.0).collect();
    assert_eq!(ids, vec![1851, 1852, 1853]);
    // A blank cell is a missing number, not zero.
    assert_eq!(draws[2].main_numbers, vec![2, 18, 27, 33, 41]);
    assert_eq!(draws[2].bonus_number, Some(12));
}

#[test]
fn pages_merge_into_sorted_unique_history() {
    let pages = vec![
        (
            "202401".to_string(),
            read_fixture("loto6_backnumber_202401.html"),
        ),
        (
            "1850-1851".to_string(),
            read_fixture("loto6_detail_1850-1851.html"),
        ),
    ];
    let history = merge_pages(pages).expect("pages should merge");
    let ids: Vec<u32> = history.draws().iter().map(|d| d.draw_id.0).collect();
    assert_eq!(ids, vec![1850, 1851, 1852, 1853]);
}

#[test]
fn malformed_page_is_rejected() {
    let html = read_fixture("loto6_broken.html");
    let err = parse_results_page(&html).expect_err("garbage number cell must fail");
    assert!(format!("{err:#}").contains("not a number"));

    let merged = merge_pages(vec![("broken".to_string(), html)]);
    let err = merged.expect_err("merge must surface the page error");
    assert!(format!("{err:#}").contains("page broken"));
}
