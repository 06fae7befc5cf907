#[cfg(test)]
mod tests {
    use crate::assets::{Asset, AssetKind, AssetRepositoryTrait, NewAsset};
    use crate::errors::{ErrorKind, Result};
    use crate::prices::{
        BackfillConfig, BackfillService, BackfillWorker, CachedPrice, DailyPrice, JobObserver,
        JobStatus, LatestPrice, PriceCacheStore, PriceFeedTrait, PriceJobRepositoryTrait,
        PriceMapping, PriceMappingRepositoryTrait, PricePopulationJob,
    };
    use crate::Error;
    use async_trait::async_trait;
    use chrono::{Datelike, NaiveDate, Utc};
    use ledgerfolio_market_data::MarketDataError;
    use rust_decimal::Decimal;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::watch;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    // --- Mock AssetRepository ---
    #[derive(Clone, Default)]
    struct MockAssetRepository {
        assets: Arc<Mutex<Vec<Asset>>>,
    }

    #[async_trait]
    impl AssetRepositoryTrait for MockAssetRepository {
        async fn create(&self, _new_asset: NewAsset) -> Result<Asset> {
            unimplemented!()
        }

        fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
            self.assets
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == asset_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Asset", asset_id))
        }

        fn list(&self) -> Result<Vec<Asset>> {
            Ok(self.assets.lock().unwrap().clone())
        }

        async fn delete(&self, _asset_id: &str) -> Result<()> {
            unimplemented!()
        }
    }

    // --- Mock PriceMappingRepository ---
    #[derive(Clone, Default)]
    struct MockMappingRepository {
        mappings: Arc<Mutex<Vec<PriceMapping>>>,
    }

    #[async_trait]
    impl PriceMappingRepositoryTrait for MockMappingRepository {
        async fn create(&self, mapping: PriceMapping) -> Result<PriceMapping> {
            self.mappings.lock().unwrap().push(mapping.clone());
            Ok(mapping)
        }

        fn get_by_id(&self, mapping_id: &str) -> Result<PriceMapping> {
            self.mappings
                .lock()
                .unwrap()
                .iter()
                .find(|m| m.id == mapping_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Price mapping", mapping_id))
        }

        fn list_for_asset(&self, asset_id: &str) -> Result<Vec<PriceMapping>> {
            Ok(self
                .mappings
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.asset_id == asset_id)
                .cloned()
                .collect())
        }
    }

    // --- Mock PriceJobRepository ---
    #[derive(Clone, Default)]
    struct MockJobRepository {
        jobs: Arc<Mutex<Vec<PricePopulationJob>>>,
    }

    impl MockJobRepository {
        fn insert(&self, job: PricePopulationJob) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    #[async_trait]
    impl PriceJobRepositoryTrait for MockJobRepository {
        async fn create(&self, job: PricePopulationJob) -> Result<PricePopulationJob> {
            self.jobs.lock().unwrap().push(job.clone());
            Ok(job)
        }

        async fn update(&self, job: PricePopulationJob) -> Result<PricePopulationJob> {
            let mut jobs = self.jobs.lock().unwrap();
            let slot = jobs
                .iter_mut()
                .find(|j| j.id == job.id)
                .ok_or_else(|| Error::not_found("Backfill job", &job.id))?;
            *slot = job.clone();
            Ok(job)
        }

        fn get_by_id(&self, job_id: &str) -> Result<PricePopulationJob> {
            self.jobs
                .lock()
                .unwrap()
                .iter()
                .find(|j| j.id == job_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Backfill job", job_id))
        }

        fn list(&self, asset_id: Option<&str>) -> Result<Vec<PricePopulationJob>> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .filter(|j| asset_id.map_or(true, |id| j.asset_id == id))
                .cloned()
                .collect())
        }

        fn list_by_status(&self, status: JobStatus) -> Result<Vec<PricePopulationJob>> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .filter(|j| j.status == status)
                .cloned()
                .collect())
        }
    }

    // --- Mock PriceCacheStore ---
    // Keyed by row id, so a second write for the same day replaces the first.
    #[derive(Clone, Default)]
    struct MockPriceCache {
        rows: Arc<Mutex<BTreeMap<String, CachedPrice>>>,
    }

    #[async_trait]
    impl PriceCacheStore for MockPriceCache {
        async fn upsert_prices(&self, prices: Vec<CachedPrice>) -> Result<usize> {
            let mut rows = self.rows.lock().unwrap();
            let count = prices.len();
            for price in prices {
                rows.insert(price.id.clone(), price);
            }
            Ok(count)
        }

        fn get_price(
            &self,
            symbol: &str,
            currency: &str,
            date: NaiveDate,
        ) -> Result<Option<CachedPrice>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&crate::prices::cached_price_id(symbol, currency, date))
                .cloned())
        }

        fn get_range(
            &self,
            symbol: &str,
            currency: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<CachedPrice>> {
            let mut rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| {
                    p.symbol == symbol && p.currency == currency && p.date >= start && p.date <= end
                })
                .cloned()
                .collect();
            rows.sort_by_key(|p| p.date);
            Ok(rows)
        }

        fn latest_on_or_before(
            &self,
            _symbol: &str,
            _currency: &str,
            _date: NaiveDate,
        ) -> Result<Option<CachedPrice>> {
            unimplemented!()
        }
    }

    // --- Scripted feed ---
    // Each date maps to a queue of failures served before the price succeeds.
    #[derive(Default)]
    struct ScriptedFeed {
        failures: Mutex<HashMap<NaiveDate, Vec<MarketDataError>>>,
        calls: AtomicUsize,
        cancel_after_first_call: Option<Arc<watch::Sender<bool>>>,
    }

    impl ScriptedFeed {
        fn fail_on(self, date: NaiveDate, errors: Vec<MarketDataError>) -> Self {
            self.failures.lock().unwrap().insert(date, errors);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceFeedTrait for ScriptedFeed {
        async fn get_daily(
            &self,
            _symbol: &str,
            _currency: &str,
            date: NaiveDate,
        ) -> Result<DailyPrice> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                if let Some(cancel) = &self.cancel_after_first_call {
                    cancel.send_replace(true);
                }
            }
            if let Some(queue) = self.failures.lock().unwrap().get_mut(&date) {
                if !queue.is_empty() {
                    return Err(queue.remove(0).into());
                }
            }
            Ok(DailyPrice {
                date,
                price: Decimal::from(100 + date.day()),
                source: "STUB".to_string(),
            })
        }

        async fn get_latest(&self, _symbol: &str, _currency: &str) -> Result<LatestPrice> {
            unimplemented!()
        }
    }

    // --- Observer ---
    #[derive(Default)]
    struct RecordingObserver {
        statuses: Mutex<Vec<(JobStatus, i32)>>,
    }

    impl JobObserver for RecordingObserver {
        fn on_job_update(&self, job: &PricePopulationJob) {
            self.statuses
                .lock()
                .unwrap()
                .push((job.status, job.completed_days));
        }
    }

    struct Fixture {
        service: Arc<BackfillService>,
        jobs: MockJobRepository,
        cache: MockPriceCache,
        feed: Arc<ScriptedFeed>,
        observer: Arc<RecordingObserver>,
    }

    fn mapping(id: &str, asset_id: &str, is_active: bool) -> PriceMapping {
        PriceMapping {
            id: id.to_string(),
            asset_id: asset_id.to_string(),
            provider_symbol: "BTC-USD".to_string(),
            currency: "USD".to_string(),
            provider: "YAHOO".to_string(),
            is_active,
            created_at: Utc::now(),
        }
    }

    fn fixture(feed: ScriptedFeed) -> Fixture {
        let assets = MockAssetRepository::default();
        for id in ["BTC", "ETH"] {
            assets.assets.lock().unwrap().push(Asset {
                id: id.to_string(),
                symbol: id.to_string(),
                kind: AssetKind::Crypto,
                currency: "USD".to_string(),
                ..Default::default()
            });
        }
        let mappings = MockMappingRepository::default();
        mappings.mappings.lock().unwrap().extend([
            mapping("btc-yahoo", "BTC", true),
            mapping("btc-old", "BTC", false),
        ]);

        let jobs = MockJobRepository::default();
        let cache = MockPriceCache::default();
        let feed = Arc::new(feed);
        let observer = Arc::new(RecordingObserver::default());

        let service = BackfillService::new(
            Arc::new(jobs.clone()),
            Arc::new(mappings),
            Arc::new(assets),
            Arc::new(cache.clone()),
            feed.clone(),
        )
        .with_config(BackfillConfig {
            max_retries: 2,
            retry_delay: Duration::ZERO,
        })
        .with_observer(observer.clone());

        Fixture {
            service: Arc::new(service),
            jobs,
            cache,
            feed,
            observer,
        }
    }

    fn not_cancelled() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn test_create_job_validates_references() {
        let f = fixture(ScriptedFeed::default());

        let err = f
            .service
            .create_job("DOGE", "btc-yahoo", d(1), d(2))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = f
            .service
            .create_job("BTC", "missing", d(1), d(2))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        for (asset, mapping_id) in [("ETH", "btc-yahoo"), ("BTC", "btc-old")] {
            let err = f
                .service
                .create_job(asset, mapping_id, d(1), d(2))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let err = f
            .service
            .create_job("BTC", "btc-yahoo", d(3), d(2))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(f.jobs.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_job_fills_every_day() {
        let f = fixture(ScriptedFeed::default());
        let job = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(3))
            .await
            .unwrap();
        assert_eq!(job.total_days, 3);

        let done = f.service.run_job(&job.id, not_cancelled()).await.unwrap();

        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.completed_days, 3);
        assert_eq!(done.current_date, Some(d(3)));
        assert!(done.started_at.is_some());
        assert!(done.completed_at.is_some());

        let range = f
            .service
            .get_cached_range("BTC-USD", "USD", d(1), d(3))
            .unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[1].price, Decimal::from(102));
        assert_eq!(range[1].source, "STUB");

        let statuses = f.observer.statuses.lock().unwrap().clone();
        assert_eq!(statuses.first(), Some(&(JobStatus::Pending, 0)));
        assert_eq!(statuses.last(), Some(&(JobStatus::Completed, 3)));
        assert!(statuses.contains(&(JobStatus::Running, 2)));
    }

    #[tokio::test]
    async fn test_rerunning_a_range_keeps_one_row_per_day() {
        let f = fixture(ScriptedFeed::default());
        for _ in 0..2 {
            let job = f
                .service
                .create_job("BTC", "btc-yahoo", d(1), d(2))
                .await
                .unwrap();
            f.service.run_job(&job.id, not_cancelled()).await.unwrap();
        }

        assert_eq!(f.cache.rows.lock().unwrap().len(), 2);
        assert_eq!(f.feed.calls(), 4);
    }

    #[tokio::test]
    async fn test_terminal_fetch_error_fails_job_and_keeps_cached_days() {
        let f = fixture(ScriptedFeed::default().fail_on(
            d(2),
            vec![MarketDataError::SymbolNotFound("BTC-USD".to_string())],
        ));
        let job = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(3))
            .await
            .unwrap();

        let failed = f.service.run_job(&job.id, not_cancelled()).await.unwrap();

        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("2024-01-02: Symbol not found: BTC-USD")
        );
        assert_eq!(failed.completed_days, 1);
        assert_eq!(f.feed.calls(), 2);
        assert!(f
            .service
            .get_cached_price("BTC-USD", "USD", d(1))
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let f = fixture(ScriptedFeed::default().fail_on(
            d(1),
            vec![
                MarketDataError::Timeout {
                    provider: "YAHOO".to_string(),
                },
                MarketDataError::RateLimited {
                    provider: "YAHOO".to_string(),
                },
            ],
        ));
        let job = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(1))
            .await
            .unwrap();

        let done = f.service.run_job(&job.id, not_cancelled()).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(f.feed.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let timeouts = (0..5)
            .map(|_| MarketDataError::Timeout {
                provider: "YAHOO".to_string(),
            })
            .collect();
        let f = fixture(ScriptedFeed::default().fail_on(d(1), timeouts));
        let job = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(1))
            .await
            .unwrap();

        let failed = f.service.run_job(&job.id, not_cancelled()).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(f.feed.calls(), 3);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("2024-01-01: Timeout: YAHOO")
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start_fetches_nothing() {
        let f = fixture(ScriptedFeed::default());
        let job = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(5))
            .await
            .unwrap();
        let (cancel, rx) = watch::channel(true);

        let failed = f.service.run_job(&job.id, rx).await.unwrap();
        drop(cancel);

        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("cancelled"));
        assert_eq!(failed.completed_days, 0);
        assert_eq!(f.feed.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_stops_before_next_day() {
        let (cancel, rx) = watch::channel(false);
        let f = fixture(ScriptedFeed {
            cancel_after_first_call: Some(Arc::new(cancel)),
            ..Default::default()
        });
        let job = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(5))
            .await
            .unwrap();

        let failed = f.service.run_job(&job.id, rx).await.unwrap();

        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("cancelled"));
        assert_eq!(failed.completed_days, 1);
        assert_eq!(f.cache.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_interrupted_job_resumes_from_cursor() {
        let f = fixture(ScriptedFeed::default());
        let started = Utc::now() - chrono::Duration::hours(1);
        let mut job = PricePopulationJob::new("BTC", "btc-yahoo", d(1), d(4), started).unwrap();
        job.start(started).unwrap();
        job.begin_day(d(2), started);
        job.finish_day(started);
        job.finish_day(started);
        f.jobs.insert(job.clone());

        let done = f.service.run_job(&job.id, not_cancelled()).await.unwrap();

        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.started_at, Some(started));
        assert_eq!(f.feed.calls(), 2);
        assert!(f
            .service
            .get_cached_price("BTC-USD", "USD", d(1))
            .unwrap()
            .is_none());
        assert!(f
            .service
            .get_cached_price("BTC-USD", "USD", d(4))
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_terminal_job_cannot_run_again() {
        let f = fixture(ScriptedFeed::default());
        let job = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(1))
            .await
            .unwrap();
        f.service.run_job(&job.id, not_cancelled()).await.unwrap();

        let err = f
            .service
            .run_job(&job.id, not_cancelled())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert_eq!(f.feed.calls(), 1);
    }

    async fn wait_for_status(
        service: &BackfillService,
        job_id: &str,
        status: JobStatus,
    ) -> PricePopulationJob {
        for _ in 0..200 {
            let job = service.get_job(job_id).unwrap();
            if job.status == status {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {job_id} never reached {status}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_worker_runs_submitted_and_interrupted_jobs() {
        let f = fixture(ScriptedFeed::default());
        let fresh = f
            .service
            .create_job("BTC", "btc-yahoo", d(1), d(2))
            .await
            .unwrap();

        let mut interrupted =
            PricePopulationJob::new("BTC", "btc-yahoo", d(10), d(11), Utc::now()).unwrap();
        interrupted.start(Utc::now()).unwrap();
        f.jobs.insert(interrupted.clone());

        let worker = BackfillWorker::start(f.service.clone(), 2, 4);
        let resumed = worker.resume_interrupted().await.unwrap();
        assert_eq!(resumed.len(), 1);
        assert_eq!(resumed[0].job_id(), interrupted.id);
        let handle = worker.submit(&fresh.id).await.unwrap();
        assert_eq!(handle.job_id(), fresh.id);
        assert!(format!("{handle:?}").contains(&fresh.id));

        wait_for_status(&f.service, &fresh.id, JobStatus::Completed).await;
        wait_for_status(&f.service, &interrupted.id, JobStatus::Completed).await;

        let err = worker.submit(&fresh.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);

        worker.shutdown().await;
        assert_eq!(f.cache.rows.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_submit_unknown_job_is_not_found() {
        let f = fixture(ScriptedFeed::default());
        let worker = BackfillWorker::start(f.service.clone(), 1, 1);
        assert!(worker.submit("nope").await.unwrap_err().is_not_found());
        worker.shutdown().await;
    }
}
