use crate::{GroupDirectory, Result as StoreErrorResult, StoreError};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// Upper bound on followed collection pages for a single lookup
const MAX_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
struct Person {
    super_teams_collection_link: String,
}

#[derive(Debug, Deserialize)]
struct TeamPage {
    #[serde(default)]
    entries: Vec<Team>,
    next_collection_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Team {
    name: String,
}

/// Team membership from a Launchpad-style people API.
pub struct LaunchpadDirectory {
    client: reqwest::Client,
    base: Url,
}

impl LaunchpadDirectory {
    pub fn new(base: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    fn person_url(&self, external_id: &str) -> StoreErrorResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::directory(format!("cannot use {} as a base URL", self.base)))?
            .pop_if_empty()
            .push("people");
        url.query_pairs_mut()
            .append_pair("ws.op", "getByOpenIDIdentifier")
            .append_pair("identifier", external_id);
        Ok(url)
    }
}

#[async_trait]
impl GroupDirectory for LaunchpadDirectory {
    async fn lookup(&self, external_id: &str) -> StoreErrorResult<Vec<String>> {
        let response = self.client.get(self.person_url(external_id)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("No directory entry for {}", external_id);
            return Ok(Vec::new());
        }
        let person: Person = response.error_for_status()?.json().await?;

        let mut groups = Vec::new();
        let mut next = Some(person.super_teams_collection_link);
        let mut pages = 0;
        while let Some(link) = next {
            if pages == MAX_PAGES {
                return Err(StoreError::directory(format!(
                    "too many team pages for {}",
                    external_id
                )));
            }
            pages += 1;

            let page: TeamPage = self
                .client
                .get(&link)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            groups.extend(page.entries.into_iter().map(|team| team.name));
            next = page.next_collection_link;
        }

        log::debug!("Directory groups for {}: {:?}", external_id, groups);
        Ok(groups)
    }
}
