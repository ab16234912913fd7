//! Integration tests for TreeService: persistence, generation, parsing and rendering.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use btsearch::application::services::TreeService;
use btsearch::application::ApplicationError;
use btsearch::config::Settings;
use btsearch::domain::{DomainError, SearchMiss};
use btsearch::infrastructure::traits::RealFileSystem;
use btsearch::util::testing;

fn service_with(settings: Settings) -> TreeService {
    TreeService::new(Arc::new(RealFileSystem), Arc::new(settings))
}

#[fixture]
fn service() -> TreeService {
    testing::init_test_setup();
    let mut settings = Settings::default();
    settings.generate.autosave = None;
    service_with(settings)
}

// ============================================================
// load / save
// ============================================================

#[rstest]
fn given_saved_tree_when_loading_then_structure_is_identical(service: TreeService) {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("tree.txt");
    let tree = service.build_from_list("1, 2, None, 3, 4").unwrap();

    // Act
    service.save(&tree, &path).unwrap();
    let loaded = service.load(&path).unwrap();

    // Assert
    assert_eq!(loaded, tree);
    assert_eq!(loaded.size(), 4);
}

#[rstest]
fn given_single_left_child_when_saving_then_writes_preorder_tokens(service: TreeService) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tree.txt");
    let tree = service.build_from_list("5, 3").unwrap();

    service.save(&tree, &path).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "5\n3\nNone\nNone\nNone\n"
    );
}

#[rstest]
fn given_missing_file_when_loading_then_file_not_found(service: TreeService) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.txt");

    let result = service.load(&path);

    assert!(matches!(result, Err(ApplicationError::FileNotFound(p)) if p == path));
}

#[rstest]
fn given_non_integer_token_when_loading_then_invalid_token(service: TreeService) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.txt");
    fs::write(&path, "5\nfive\nNone\n").unwrap();

    let result = service.load(&path);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidToken { position: 2, .. }))
    ));
}

#[rstest]
fn given_out_of_range_value_in_file_when_loading_then_rejected(service: TreeService) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("big.txt");
    fs::write(&path, "5\n1001\nNone\nNone\nNone\n").unwrap();

    let result = service.load(&path);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::ValueOutOfRange {
            value: 1001,
            max: 1000
        }))
    ));
}

#[rstest]
fn given_empty_tree_when_saving_then_refused_and_no_file_written(service: TreeService) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.txt");
    let empty = btsearch::domain::BinaryTree::new();

    let result = service.save(&empty, &path);

    assert!(matches!(result, Err(ApplicationError::EmptyTree)));
    assert!(!path.exists());
}

// ============================================================
// generate
// ============================================================

#[rstest]
fn given_same_seed_when_generating_then_trees_are_identical(service: TreeService) {
    let first = service.generate(40, Some(0.3), Some(7)).unwrap();
    let second = service.generate(40, Some(0.3), Some(7)).unwrap();

    assert_eq!(first, second);
    assert!(first.size() >= 1);
    assert!(first.size() <= 40);
    assert!(first.iter().all(|(_, n)| (1..=1000).contains(&n.value)));
}

#[rstest]
fn given_zero_probability_when_generating_then_every_slot_is_filled(service: TreeService) {
    let tree = service.generate(31, Some(0.0), Some(1)).unwrap();
    assert_eq!(tree.size(), 31);
    assert_eq!(tree.depth(), 5);
}

#[rstest]
#[case(0, 0.2)]
#[case(10, 1.5)]
#[case(10, -0.1)]
fn given_bad_parameters_when_generating_then_invalid_parameter(
    service: TreeService,
    #[case] count: usize,
    #[case] probability: f64,
) {
    let result = service.generate(count, Some(probability), None);
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidParameter(_)))
    ));
}

#[rstest]
fn given_autosave_path_when_generating_then_tree_is_written() {
    // Arrange
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let autosave = temp.path().join("generated_tree.txt");
    let mut settings = Settings::default();
    settings.generate.autosave = Some(autosave.clone());
    let service = service_with(settings);

    // Act
    let tree = service.generate(15, None, Some(3)).unwrap();

    // Assert
    assert_eq!(service.load(&autosave).unwrap(), tree);
}

// ============================================================
// build_from_list / parse_blocked
// ============================================================

#[rstest]
fn given_list_with_gaps_when_building_then_gaps_consume_slots(service: TreeService) {
    let tree = service.build_from_list("1, 2, None, 3, 4").unwrap();
    //     1
    //    /
    //   2
    //  / \
    // 3   4
    assert_eq!(
        tree.preorder_tokens(),
        vec![Some(1), Some(2), Some(3), None, None, Some(4), None, None, None]
    );
}

#[rstest]
#[case("", DomainError::EmptyInput)]
#[case("None, 2", DomainError::MissingRoot)]
fn given_unusable_list_when_building_then_errors(
    service: TreeService,
    #[case] input: &str,
    #[case] expected: DomainError,
) {
    let result = service.build_from_list(input);
    assert!(matches!(result, Err(ApplicationError::Domain(e)) if e == expected));
}

#[rstest]
fn given_blocked_values_when_parsing_then_collects_set(service: TreeService) {
    let blocked = service.parse_blocked(" 5  6 7 5 ").unwrap();
    assert_eq!(blocked.sorted(), vec![5, 6, 7]);
    assert!(service.parse_blocked("").unwrap().is_empty());
}

#[rstest]
#[case("5 x")]
#[case("5 0")]
#[case("1001")]
fn given_bad_blocked_values_when_parsing_then_errors(service: TreeService, #[case] input: &str) {
    assert!(service.parse_blocked(input).is_err());
}

#[rstest]
fn given_parsed_values_when_building_blocked_set_then_each_is_range_checked(
    service: TreeService,
) {
    let blocked = service.blocked_from(&[7, 3, 7]).unwrap();
    assert_eq!(blocked.sorted(), vec![3, 7]);

    let result = service.blocked_from(&[3, 0]);
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::ValueOutOfRange { value: 0, max: 1000 }))
    ));
}

// ============================================================
// search / render
// ============================================================

#[rstest]
fn given_configured_strategy_when_scanning_then_result_matches_explicit_strategy(
    service: TreeService,
) {
    let tree = service.build_from_list("1, 2, 3, 4, 5, 6, 7").unwrap();
    let blocked = service.parse_blocked("6 7").unwrap();

    let report = service.find_first_valid(&tree, &blocked, None);

    assert_eq!(report.outcome.tree().unwrap().root_value(), Some(2));
}

#[rstest]
fn given_leaf_root_when_finding_then_reports_miss(service: TreeService) {
    let tree = service.build_from_list("10, None, 20").unwrap();
    let report = service
        .find_with_root(&tree, 20, &Default::default())
        .unwrap();
    assert_eq!(report.outcome.miss(), Some(SearchMiss::NodeIsLeaf(20)));
}

#[rstest]
fn given_small_tree_when_rendering_then_shows_every_value(service: TreeService) {
    let tree = service.build_from_list("1, 2, 3").unwrap();

    let rendered = service.render(&tree).unwrap();

    assert!(rendered.starts_with('1'));
    assert!(rendered.contains("L: 2"));
    assert!(rendered.contains("R: 3"));
}

#[rstest]
fn given_tree_above_render_limit_when_rendering_then_refused() {
    testing::init_test_setup();
    let mut settings = Settings::default();
    settings.generate.autosave = None;
    settings.render_limit = 3;
    let service = service_with(settings);
    let tree = service.build_from_list("1, 2, 3, 4").unwrap();

    let result = service.render(&tree);

    assert!(matches!(
        result,
        Err(ApplicationError::TooLargeToRender { size: 4, limit: 3 })
    ));
}

#[rstest]
fn given_relative_path_without_parent_when_saving_then_written(service: TreeService) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("flat.txt");
    let tree = service.build_from_list("8, 9").unwrap();

    service.save(&tree, Path::new(&path)).unwrap();

    assert!(path.exists());
}
