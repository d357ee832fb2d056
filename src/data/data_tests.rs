use super::*;
use crate::error::AnalyticsError;
use chrono::NaiveDate;
use std::cell::Cell;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date")
}

// ===== ReturnSeries =====

#[test]
fn test_series_rejects_unsorted_dates() {
    let err = ReturnSeries::new(vec![d(3), d(2)], vec![0.0, 0.0]).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidParameter { .. }));
}

#[test]
fn test_series_rejects_duplicate_dates() {
    assert!(ReturnSeries::new(vec![d(2), d(2)], vec![0.0, 0.0]).is_err());
}

#[test]
fn test_series_rejects_non_finite() {
    assert!(ReturnSeries::new(vec![d(2)], vec![f64::NAN]).is_err());
}

#[test]
fn test_series_length_mismatch() {
    let err = ReturnSeries::new(vec![d(2)], vec![0.1, 0.2]).unwrap_err();
    assert!(matches!(err, AnalyticsError::DimensionMismatch { .. }));
}

#[test]
fn test_from_prices_skips_zero_price() {
    let series = ReturnSeries::from_prices(vec![d(1), d(2), d(3), d(4)], &[10.0, 0.0, 5.0, 10.0])
        .expect("valid prices");
    // 10 -> 0 is -100%, 0 -> 5 is infinite and dropped, 5 -> 10 is +100%
    assert_eq!(series.dates(), &[d(2), d(4)]);
    assert!((series.values()[0] + 1.0).abs() < 1e-12);
    assert!((series.values()[1] - 1.0).abs() < 1e-12);
}

#[test]
fn test_from_single_price_is_empty() {
    let series = ReturnSeries::from_prices(vec![d(1)], &[10.0]).expect("valid");
    assert!(series.is_empty());
    assert_eq!(series.span_days(), 0);
}

#[test]
fn test_window_inclusive() {
    let series = ReturnSeries::new(vec![d(1), d(2), d(3), d(4)], vec![0.1, 0.2, 0.3, 0.4])
        .expect("valid");
    let w = series.window(Some(d(2)), Some(d(3)));
    assert_eq!(w.values(), &[0.2, 0.3]);
    assert_eq!(series.window(None, Some(d(1))).len(), 1);
    assert!(series.window(Some(d(5)), None).is_empty());
    assert!(series.window(Some(d(3)), Some(d(2))).is_empty());
}

#[test]
fn test_series_json_roundtrip() {
    let series = ReturnSeries::new(vec![d(1), d(2)], vec![0.1, -0.2]).expect("valid");
    let json = serde_json::to_string(&series).expect("serialize");
    let back: ReturnSeries = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(series, back);
}

// ===== ReturnMatrix =====

#[test]
fn test_inner_join_keeps_common_dates() {
    let a = ReturnSeries::new(vec![d(1), d(2), d(3)], vec![0.1, 0.2, 0.3]).expect("valid");
    let b = ReturnSeries::new(vec![d(2), d(3), d(4)], vec![1.0, 2.0, 3.0]).expect("valid");
    let m = ReturnMatrix::inner_join(&[("A".into(), a), ("B".into(), b)]).expect("join");
    assert_eq!(m.dates(), &[d(2), d(3)]);
    assert_eq!(m.column("A").expect("A"), vec![0.2, 0.3]);
    assert_eq!(m.column("B").expect("B"), vec![1.0, 2.0]);
}

#[test]
fn test_inner_join_disjoint_is_empty() {
    let a = ReturnSeries::new(vec![d(1)], vec![0.1]).expect("valid");
    let b = ReturnSeries::new(vec![d(2)], vec![0.2]).expect("valid");
    let m = ReturnMatrix::inner_join(&[("A".into(), a), ("B".into(), b)]).expect("join");
    assert_eq!(m.shape(), (0, 2));
}

#[test]
fn test_matrix_rejects_duplicate_symbols() {
    let err = ReturnMatrix::from_columns(
        vec![d(1)],
        vec![("A".into(), vec![0.1]), ("A".into(), vec![0.2])],
    )
    .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidParameter { .. }));
}

#[test]
fn test_matrix_rejects_empty_symbol() {
    assert!(ReturnMatrix::from_columns(vec![d(1)], vec![(String::new(), vec![0.1])]).is_err());
}

#[test]
fn test_matrix_unknown_column() {
    let m = ReturnMatrix::from_columns(vec![d(1)], vec![("A".into(), vec![0.1])]).expect("valid");
    assert!(matches!(
        m.column("Z"),
        Err(AnalyticsError::UnknownAsset { .. })
    ));
}

#[test]
fn test_drop_incomplete_rows() {
    let m = ReturnMatrix::from_columns(
        vec![d(1), d(2), d(3)],
        vec![
            ("A".into(), vec![0.1, f64::NAN, 0.3]),
            ("B".into(), vec![1.0, 2.0, 3.0]),
        ],
    )
    .expect("valid");
    assert!(!m.is_complete());
    let clean = m.drop_incomplete_rows();
    assert!(clean.is_complete());
    assert_eq!(clean.dates(), &[d(1), d(3)]);
    assert_eq!(clean.column("B").expect("B"), vec![1.0, 3.0]);
    // Missing values are ignored by the column means
    assert!((m.mean_returns()[0] - 0.2).abs() < 1e-12);
}

#[test]
fn test_series_by_index_skips_missing_and_bounds_checks() {
    let m = ReturnMatrix::from_columns(
        vec![d(1), d(2), d(3)],
        vec![
            ("A".into(), vec![0.1, f64::NAN, 0.3]),
            ("B".into(), vec![1.0, 2.0, 3.0]),
        ],
    )
    .expect("valid");
    let a = m.series(0).expect("in range");
    assert_eq!(a.dates(), &[d(1), d(3)]);
    assert_eq!(a.values(), &[0.1, 0.3]);
    assert!(m.series(2).is_none());
}

#[test]
fn test_select_reorders() {
    let m = ReturnMatrix::from_columns(
        vec![d(1)],
        vec![("A".into(), vec![0.1]), ("B".into(), vec![0.2])],
    )
    .expect("valid");
    let s = m.select(&["B", "A"]).expect("select");
    assert_eq!(s.symbols(), &["B".to_string(), "A".to_string()]);
    assert_eq!(s.matrix().get(0, 0), 0.2);
}

// ===== WeightVector =====

#[test]
fn test_weights_align_fills_missing_with_zero() {
    let w = WeightVector::from_pairs([("B", 0.7)]).expect("valid");
    let symbols = vec!["A".to_string(), "B".to_string()];
    assert_eq!(w.aligned_to(&symbols).expect("aligned"), vec![0.0, 0.7]);
}

#[test]
fn test_weights_align_rejects_unknown() {
    let w = WeightVector::from_pairs([("Z", 1.0)]).expect("valid");
    let err = w.aligned_to(&["A".to_string()]).unwrap_err();
    assert!(matches!(err, AnalyticsError::UnknownAsset { symbol } if symbol == "Z"));
}

#[test]
fn test_weights_reject_duplicates_and_nan() {
    assert!(WeightVector::from_pairs([("A", 0.5), ("A", 0.5)]).is_err());
    assert!(WeightVector::from_pairs([("A", f64::NAN)]).is_err());
}

#[test]
fn test_weights_json_object() {
    let w = WeightVector::from_pairs([("AAA", 0.25), ("BBB", 0.75)]).expect("valid");
    let json = serde_json::to_string(&w).expect("serialize");
    assert_eq!(json, r#"{"AAA":0.25,"BBB":0.75}"#);
    let back: WeightVector = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, w);
}

#[test]
fn test_equal_weights() {
    let symbols: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| (*s).to_string()).collect();
    let w = WeightVector::equal(&symbols).expect("valid");
    assert!(w.iter().all(|(_, x)| (x - 0.25).abs() < 1e-12));
    assert!((w.sum() - 1.0).abs() < 1e-12);
}

// ===== ReturnSeriesStore =====

fn store() -> ReturnSeriesStore {
    let mut store = ReturnSeriesStore::new();
    store
        .insert_prices("A", vec![d(1), d(2), d(3), d(4)], &[100.0, 101.0, 99.0, 100.0])
        .expect("valid");
    store
        .insert_prices("B", vec![d(2), d(3), d(4), d(5)], &[50.0, 51.0, 52.0, 50.0])
        .expect("valid");
    store
}

#[test]
fn test_store_unknown_asset() {
    let err = store().get_returns("Z", None, None).unwrap_err();
    assert!(matches!(err, AnalyticsError::UnknownAsset { .. }));
}

#[test]
fn test_store_return_matrix_aligns() {
    let m = store().return_matrix(&["A", "B"], None, None).expect("matrix");
    assert_eq!(m.dates(), &[d(3), d(4)]);
    assert_eq!(m.n_assets(), 2);
}

#[test]
fn test_store_symbols_sorted() {
    let s = store();
    assert_eq!(s.symbols().collect::<Vec<_>>(), vec!["A", "B"]);
    assert!(s.contains("A"));
    assert_eq!(s.len(), 2);
}

// ===== PriceCsvLoader =====

#[test]
fn test_csv_loader_detects_columns_and_sorts() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "Date,Open,Close").expect("write");
    writeln!(file, "2024-01-03,1,102").expect("write");
    writeln!(file, "2024-01-02,1,100").expect("write");
    writeln!(file, "2024-01-04,1,n/a").expect("write");
    writeln!(file, "2024-01-05,1,104").expect("write");

    let history = PriceCsvLoader::new().load(file.path()).expect("load");
    assert_eq!(history.column_name, "Close");
    assert_eq!(history.dates, vec![d(2), d(3), d(5)]);
    assert_eq!(history.prices, vec![100.0, 102.0, 104.0]);

    let returns = history.returns().expect("returns");
    assert_eq!(returns.len(), 2);
    assert!((returns.values()[0] - 0.02).abs() < 1e-12);
}

#[test]
fn test_csv_loader_explicit_columns() {
    let data = "when,px,adj\n2024-01-01,10,20\n2024-01-02,11,22\n";
    let history = PriceCsvLoader::new()
        .with_date_column("when")
        .with_price_column("adj")
        .load_from_reader(data.as_bytes())
        .expect("load");
    assert_eq!(history.prices, vec![20.0, 22.0]);
}

#[test]
fn test_csv_loader_missing_column() {
    let data = "date,close\n2024-01-01,10\n";
    let err = PriceCsvLoader::new()
        .with_price_column("volume")
        .load_from_reader(data.as_bytes())
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidParameter { .. }));
}

#[test]
fn test_csv_loader_bad_date_reports_line() {
    let data = "date,close\n2024-01-01,10\n01/02/2024,11\n";
    let err = PriceCsvLoader::new().load_from_reader(data.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalyticsError::CsvParse { line: 3, .. }));
}

#[test]
fn test_csv_loader_duplicate_date() {
    let data = "date,close\n2024-01-01,10\n2024-01-01,11\n";
    let err = PriceCsvLoader::new().load_from_reader(data.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalyticsError::CsvParse { .. }));
}

#[test]
fn test_csv_loader_missing_file() {
    let err = PriceCsvLoader::new().load("/nonexistent/prices.csv").unwrap_err();
    assert!(matches!(err, AnalyticsError::Io { .. }));
}

#[test]
fn test_csv_loader_no_prices() {
    let data = "date,close\n2024-01-01,\n";
    let err = PriceCsvLoader::new().load_from_reader(data.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
}

// ===== Caching =====

#[test]
fn test_memory_cache_hit_and_miss() {
    let cache: MemoryCache<String, u32> = MemoryCache::new();
    assert_eq!(cache.get(&"a".to_string()), None);
    cache.put("a".to_string(), 1, None);
    assert_eq!(cache.get(&"a".to_string()), Some(1));
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate() - 0.5).abs() < 1e-12);
}

#[test]
fn test_memory_cache_expiry() {
    let cache: MemoryCache<u8, u8> = MemoryCache::new();
    cache.put(1, 1, Some(Duration::ZERO));
    assert_eq!(cache.get(&1), None);
    assert!(cache.is_empty());
}

#[test]
fn test_memory_cache_put_purges_expired_entries() {
    let cache: MemoryCache<u32, u32> = MemoryCache::new();
    for key in 0..1000 {
        cache.put(key, key, Some(Duration::ZERO));
    }
    cache.put(5000, 1, None);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&5000), Some(1));
}

#[test]
fn test_memory_cache_remove_and_clear() {
    let cache: MemoryCache<u8, u8> = MemoryCache::new();
    cache.put(1, 1, None);
    cache.put(2, 2, None);
    cache.remove(&1);
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}

struct CountingSource {
    inner: ReturnSeriesStore,
    calls: Cell<usize>,
}

impl ReturnSource for CountingSource {
    fn get_returns(
        &self,
        asset_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> crate::error::Result<ReturnSeries> {
        self.calls.set(self.calls.get() + 1);
        self.inner.get_returns(asset_id, start, end)
    }
}

#[test]
fn test_cached_source_memoizes_successes_only() {
    let source = CountingSource {
        inner: store(),
        calls: Cell::new(0),
    };
    let cached = CachedReturnSource::new(source, MemoryCache::new());

    let first = cached.get_returns("A", None, None).expect("known");
    let second = cached.get_returns("A", None, None).expect("known");
    assert_eq!(first, second);
    assert_eq!(cached.source().calls.get(), 1);

    // A different window is a different key
    cached.get_returns("A", Some(d(3)), None).expect("known");
    assert_eq!(cached.source().calls.get(), 2);

    assert!(cached.get_returns("Z", None, None).is_err());
    assert!(cached.get_returns("Z", None, None).is_err());
    assert_eq!(cached.source().calls.get(), 4);
    assert_eq!(cached.cache().stats().hits, 1);
}
