use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerfolio_core::prices::{JobStatus, PriceJobRepositoryTrait, PricePopulationJob};
use ledgerfolio_core::{Error, Result};

use super::model::PriceJobDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::price_population_jobs;

pub struct PriceJobRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PriceJobRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PriceJobRepositoryTrait for PriceJobRepository {
    async fn create(&self, job: PricePopulationJob) -> Result<PricePopulationJob> {
        let row = PriceJobDB::from(&job);
        self.writer
            .exec(move |conn| {
                diesel::insert_into(price_population_jobs::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(job)
            })
            .await
    }

    async fn update(&self, job: PricePopulationJob) -> Result<PricePopulationJob> {
        let row = PriceJobDB::from(&job);
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(price_population_jobs::table.find(&row.id))
                    .set(&row)
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(Error::not_found("Price job", &row.id));
                }
                Ok(job)
            })
            .await
    }

    fn get_by_id(&self, job_id: &str) -> Result<PricePopulationJob> {
        let mut conn = get_connection(&self.pool)?;
        price_population_jobs::table
            .select(PriceJobDB::as_select())
            .find(job_id)
            .first::<PriceJobDB>(&mut conn)
            .optional()
            .into_core()?
            .map(PricePopulationJob::from)
            .ok_or_else(|| Error::not_found("Price job", job_id))
    }

    fn list(&self, asset_id: Option<&str>) -> Result<Vec<PricePopulationJob>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = price_population_jobs::table
            .select(PriceJobDB::as_select())
            .into_boxed();
        if let Some(asset_id) = asset_id {
            query = query.filter(price_population_jobs::asset_id.eq(asset_id.to_string()));
        }
        let rows = query
            .order(price_population_jobs::created_at.desc())
            .load::<PriceJobDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(PricePopulationJob::from).collect())
    }

    /// Oldest first, so interrupted work resumes in submission order.
    fn list_by_status(&self, status: JobStatus) -> Result<Vec<PricePopulationJob>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = price_population_jobs::table
            .select(PriceJobDB::as_select())
            .filter(price_population_jobs::status.eq(status.as_str()))
            .order(price_population_jobs::created_at.asc())
            .load::<PriceJobDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(PricePopulationJob::from).collect())
    }
}
