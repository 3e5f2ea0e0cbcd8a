//! End-to-end test-impact analysis over fixture databases.

mod common;

use common::IndexFixture;
use tempfile::TempDir;

use trailmap::graph::resolve_start_symbols;
use trailmap::{
    run_impact_analysis, EdgeKind, ImpactConfig, ImpactOptions, IndexStorage, StartSpec,
    SymbolGraph, SymbolKind,
};

struct Analyzer {
    storage: IndexStorage,
    graph: SymbolGraph,
}

impl Analyzer {
    fn open(db_path: &std::path::Path) -> Analyzer {
        let storage = IndexStorage::open(db_path).unwrap();
        let nodes = storage.all_nodes().unwrap();
        let edges = storage.all_edges_brief().unwrap();
        let graph = SymbolGraph::build(&nodes, &edges).unwrap();
        Analyzer { storage, graph }
    }

    fn run(&self, config: &ImpactConfig) -> anyhow::Result<trailmap::ImpactResult> {
        let mut options = ImpactOptions::new(&config.test_namespace);
        options.exclude = config.exclude_symbols.clone();
        run_impact_analysis(&self.storage, &self.graph, &config.start_symbols, &options)
    }
}

/// MyNS::Foo::bar (METHOD) called by MyNS::UnitTests::FooTests::testBar,
/// which is a MEMBER of MyNS::UnitTests::FooTests (CLASS).
fn seed_scenario_a(db_path: &std::path::Path) {
    let mut fixture = IndexFixture::create(db_path);
    let ns = fixture.add_symbol(SymbolKind::Namespace, &["MyNS"]);
    let foo = fixture.add_symbol(SymbolKind::Class, &["MyNS", "Foo"]);
    let bar = fixture.add_symbol(SymbolKind::Method, &["MyNS", "Foo", "bar"]);
    let ut = fixture.add_symbol(SymbolKind::Namespace, &["MyNS", "UnitTests"]);
    let foo_tests = fixture.add_symbol(SymbolKind::Class, &["MyNS", "UnitTests", "FooTests"]);
    let test_bar = fixture.add_symbol(
        SymbolKind::Method,
        &["MyNS", "UnitTests", "FooTests", "testBar"],
    );
    fixture.add_edge(ns, foo, EdgeKind::Member);
    fixture.add_edge(foo, bar, EdgeKind::Member);
    fixture.add_edge(ns, ut, EdgeKind::Member);
    fixture.add_edge(ut, foo_tests, EdgeKind::Member);
    fixture.add_edge(foo_tests, test_bar, EdgeKind::Member);
    fixture.add_edge(test_bar, bar, EdgeKind::Call);
    fixture.finish();
}

const SCENARIO_A_CONFIG: &str = "\
[test_namespace]
UnitTests

[start_symbols]
kind=METHOD, MyNS::Foo::bar
";

#[test]
fn test_scenario_finds_test_class_with_path() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    seed_scenario_a(&db_path);

    let analyzer = Analyzer::open(&db_path);
    let config = ImpactConfig::parse(SCENARIO_A_CONFIG).unwrap();
    let result = analyzer.run(&config).unwrap();

    assert_eq!(result.hits.len(), 1);
    let hit = &result.hits[0];
    assert_eq!(hit.class_fqn, "MyNS::UnitTests::FooTests");
    assert_eq!(
        hit.path,
        vec![
            "MyNS::Foo::bar",
            "MyNS::UnitTests::FooTests::testBar",
            "MyNS::UnitTests::FooTests",
        ]
    );
    assert!(!result.truncated);
}

#[test]
fn test_scenario_override_crossing() {
    // I::run overridden by C::run; the test calls C::run only. Starting from
    // I::run must cross the outgoing OVERRIDE edge and find CTests.
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    let mut fixture = IndexFixture::create(&db_path);
    let i_run = fixture.add_symbol(SymbolKind::Method, &["I", "run"]);
    let c_run = fixture.add_symbol(SymbolKind::Method, &["C", "run"]);
    let ut = fixture.add_symbol(SymbolKind::Namespace, &["UnitTests"]);
    let c_tests = fixture.add_symbol(SymbolKind::Class, &["UnitTests", "CTests"]);
    let test_run = fixture.add_symbol(SymbolKind::Method, &["UnitTests", "CTests", "testRun"]);
    fixture.add_edge(c_run, i_run, EdgeKind::Override);
    fixture.add_edge(ut, c_tests, EdgeKind::Member);
    fixture.add_edge(c_tests, test_run, EdgeKind::Member);
    fixture.add_edge(test_run, c_run, EdgeKind::Call);
    fixture.finish();

    let analyzer = Analyzer::open(&db_path);
    let config = ImpactConfig::parse(
        "[test_namespace]\nUnitTests\n\n[start_symbols]\nkind=METHOD, I::run\n",
    )
    .unwrap();
    let result = analyzer.run(&config).unwrap();

    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].class_fqn, "UnitTests::CTests");
    assert_eq!(
        result.hits[0].path,
        vec![
            "I::run",
            "C::run",
            "UnitTests::CTests::testRun",
            "UnitTests::CTests",
        ]
    );
}

#[test]
fn test_scenario_exclude_prunes_hit() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    seed_scenario_a(&db_path);

    let analyzer = Analyzer::open(&db_path);
    let config = ImpactConfig::parse(
        "[test_namespace]\nUnitTests\n\n[start_symbols]\nkind=METHOD, MyNS::Foo::bar\n\n\
         [exclude_symbols]\nFooTests\n",
    )
    .unwrap();
    let result = analyzer.run(&config).unwrap();
    assert!(result.hits.is_empty());
}

#[test]
fn test_unresolved_start_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    seed_scenario_a(&db_path);

    let analyzer = Analyzer::open(&db_path);
    let config = ImpactConfig::parse(
        "[test_namespace]\nUnitTests\n\n[start_symbols]\nNoSuchSymbol\n",
    )
    .unwrap();
    let error = analyzer.run(&config).unwrap_err();
    assert!(error.to_string().contains("NoSuchSymbol"));
}

#[test]
fn test_start_resolution_by_simple_name_and_kind() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    let mut fixture = IndexFixture::create(&db_path);
    let as_method = fixture.add_symbol(SymbolKind::Method, &["A", "poll"]);
    let as_field = fixture.add_symbol(SymbolKind::Field, &["B", "poll"]);
    fixture.finish();

    let storage = IndexStorage::open(&db_path).unwrap();

    let any = resolve_start_symbols(
        &storage,
        &StartSpec {
            kind: None,
            pattern: "poll".to_string(),
        },
    )
    .unwrap();
    let mut ids: Vec<i64> = any.iter().map(|n| n.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![as_method, as_field]);

    let methods_only = resolve_start_symbols(
        &storage,
        &StartSpec {
            kind: Some(SymbolKind::Method),
            pattern: "poll".to_string(),
        },
    )
    .unwrap();
    assert_eq!(methods_only.len(), 1);
    assert_eq!(methods_only[0].id, as_method);
}

#[test]
fn test_start_resolution_qualified_fallback_to_tail() {
    // The stored name carries a signature, so the exact encoded key misses
    // and resolution falls back to the tail LIKE scan.
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    let mut fixture = IndexFixture::create(&db_path);
    let signed = fixture.add_symbol_serialized(
        SymbolKind::Method,
        "::\tmFoo\ts\tp\tnbar\tsvoid\tp(int)",
    );
    fixture.add_symbol(SymbolKind::Method, &["Other", "nope"]);
    fixture.finish();

    let storage = IndexStorage::open(&db_path).unwrap();
    let resolved = resolve_start_symbols(
        &storage,
        &StartSpec {
            kind: None,
            pattern: "Foo::bar".to_string(),
        },
    )
    .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, signed);
}

#[test]
fn test_identical_runs_are_identical() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    seed_scenario_a(&db_path);

    let analyzer = Analyzer::open(&db_path);
    let config = ImpactConfig::parse(SCENARIO_A_CONFIG).unwrap();
    let first = analyzer.run(&config).unwrap();
    let second = analyzer.run(&config).unwrap();

    assert_eq!(first.hits, second.hits);
    assert_eq!(first.visited, second.visited);
    assert_eq!(first.starts, second.starts);
}

#[test]
fn test_multiple_starts_accumulate() {
    // Two independent subsystems, each with its own test class; starting
    // from both finds both, in start order.
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.srctrldb");
    let mut fixture = IndexFixture::create(&db_path);
    let alpha = fixture.add_symbol(SymbolKind::Function, &["Lib", "alpha"]);
    let beta = fixture.add_symbol(SymbolKind::Function, &["Lib", "beta"]);
    let ut = fixture.add_symbol(SymbolKind::Namespace, &["UT"]);
    let a_tests = fixture.add_symbol(SymbolKind::Class, &["UT", "AlphaTests"]);
    let a_test = fixture.add_symbol(SymbolKind::Method, &["UT", "AlphaTests", "testAlpha"]);
    let b_tests = fixture.add_symbol(SymbolKind::Class, &["UT", "BetaTests"]);
    let b_test = fixture.add_symbol(SymbolKind::Method, &["UT", "BetaTests", "testBeta"]);
    fixture.add_edge(ut, a_tests, EdgeKind::Member);
    fixture.add_edge(ut, b_tests, EdgeKind::Member);
    fixture.add_edge(a_tests, a_test, EdgeKind::Member);
    fixture.add_edge(b_tests, b_test, EdgeKind::Member);
    fixture.add_edge(a_test, alpha, EdgeKind::Call);
    fixture.add_edge(b_test, beta, EdgeKind::Call);
    fixture.finish();

    let analyzer = Analyzer::open(&db_path);
    let config = ImpactConfig::parse(
        "[test_namespace]\nUT\n\n[start_symbols]\nLib::alpha\nLib::beta\n",
    )
    .unwrap();
    let result = analyzer.run(&config).unwrap();
    let fqns: Vec<&str> = result.hits.iter().map(|h| h.class_fqn.as_str()).collect();
    assert_eq!(fqns, vec!["UT::AlphaTests", "UT::BetaTests"]);
}
