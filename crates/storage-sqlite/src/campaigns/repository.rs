use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use adsync_core::campaigns::{Campaign, CampaignRepositoryTrait};
use adsync_core::errors::{DatabaseError, Error, Result};

use super::model::CampaignDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{with_unique_value, IntoCore};
use crate::schema::campaigns;
use crate::schema::campaigns::dsl::*;

pub struct CampaignRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CampaignRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        CampaignRepository { pool, writer }
    }
}

#[async_trait]
impl CampaignRepositoryTrait for CampaignRepository {
    fn get(&self, id: &str) -> Result<Option<Campaign>> {
        let mut conn = get_connection(&self.pool)?;
        campaigns
            .find(id)
            .select(CampaignDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?
            .map(CampaignDB::into_domain)
            .transpose()
    }

    async fn create(&self, campaign: Campaign) -> Result<Campaign> {
        let row = CampaignDB::from_domain(&campaign)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Campaign> {
                diesel::insert_into(campaigns::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()
                    .map_err(|e| {
                        with_unique_value(e, &[("campaign_id", row.campaign_id.as_str())])
                    })?;
                Ok(campaign)
            })
            .await
    }

    async fn save(&self, mut campaign: Campaign) -> Result<Campaign> {
        let expected = campaign.version;
        campaign.version = expected + 1;
        let row = CampaignDB::from_domain(&campaign)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Campaign> {
                let updated = diesel::update(
                    campaigns
                        .filter(campaign_id.eq(&row.campaign_id))
                        .filter(version.eq(expected)),
                )
                .set(&row)
                .execute(conn)
                .into_core()?;

                if updated == 0 {
                    let exists = campaigns
                        .find(&row.campaign_id)
                        .count()
                        .get_result::<i64>(conn)
                        .into_core()?
                        > 0;
                    if !exists {
                        return Err(Error::Database(DatabaseError::NotFound(format!(
                            "campaign {}",
                            row.campaign_id
                        ))));
                    }
                    debug!(
                        "Version {} of campaign {} is stale",
                        expected, row.campaign_id
                    );
                    return Err(Error::Database(DatabaseError::WriteConflict(format!(
                        "campaign {} changed since version {}",
                        row.campaign_id, expected
                    ))));
                }
                Ok(campaign)
            })
            .await
    }
}
