//! Trello adapter (board-style tracker).
//!
//! Talks to the public REST API directly with key/token query auth. The
//! fetch walks member → boards → lists → cards → card members; a failure
//! below the board list skips just that board/list/card.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::trackers::{ensure_success, TrelloCredentials};
use crate::types::{BoardTrackerData, TrackerBoard, TrackerCard, TrackerIdentity, TrackerList};

const TRELLO_API_BASE: &str = "https://api.trello.com/1";

pub struct TrelloClient {
    http: reqwest::Client,
    base_url: String,
    credentials: TrelloCredentials,
}

impl TrelloClient {
    pub fn new(credentials: TrelloCredentials) -> Self {
        Self::with_base_url(credentials, TRELLO_API_BASE)
    }

    pub fn with_base_url(credentials: TrelloCredentials, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn auth_params(&self) -> [(&'static str, &str); 2] {
        [
            ("key", self.credentials.api_key.as_str()),
            ("token", self.credentials.token.as_str()),
        ]
    }

    /// Verify credentials against the member endpoint. Key-format problems
    /// are rejected locally before any network call.
    pub async fn connect(&self) -> Result<bool> {
        self.credentials.validate()?;
        self.fetch_member().await?;
        log::info!("Trello connection verified");
        Ok(true)
    }

    /// Fetch the full user/board/list/card graph.
    ///
    /// Member and board-list failures abort; a lists, cards, or card-detail
    /// failure skips that board, list, or card with a warning.
    pub async fn fetch_all(&self) -> Result<BoardTrackerData> {
        self.credentials.validate()?;

        let member = self.fetch_member().await?;
        let api_boards = self.fetch_boards().await?;

        let mut boards = Vec::new();
        let mut cards = Vec::new();

        for api_board in api_boards {
            let api_lists = match self.fetch_lists(&api_board.id).await {
                Ok(lists) => lists,
                Err(e) => {
                    log::warn!("Skipping Trello board '{}': {}", api_board.name, e);
                    continue;
                }
            };

            let mut board = TrackerBoard {
                id: api_board.id,
                name: api_board.name,
                url: api_board.url,
                lists: Vec::new(),
            };

            for api_list in api_lists {
                let api_cards = match self.fetch_cards(&api_list.id).await {
                    Ok(cards) => cards,
                    Err(e) => {
                        log::warn!("Skipping Trello list '{}': {}", api_list.name, e);
                        continue;
                    }
                };

                let mut list = TrackerList {
                    id: api_list.id,
                    name: api_list.name,
                    cards: Vec::new(),
                };

                for api_card in api_cards {
                    let members = match self.fetch_card_members(&api_card.id).await {
                        Ok(members) => members,
                        Err(e) => {
                            log::warn!("Skipping Trello card '{}': {}", api_card.name, e);
                            continue;
                        }
                    };
                    let card = normalize_card(api_card, &members, &list.name, &member.id);
                    list.cards.push(card.clone());
                    cards.push(card);
                }

                board.lists.push(list);
            }

            boards.push(board);
        }

        log::info!(
            "Fetched {} Trello cards across {} boards",
            cards.len(),
            boards.len()
        );
        Ok(BoardTrackerData {
            user: member,
            boards,
            cards,
        })
    }

    async fn fetch_member(&self) -> Result<TrackerIdentity> {
        let response = self
            .http
            .get(self.url("members/me"))
            .query(&self.auth_params())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Auth(format!(
                "Trello credentials rejected (HTTP {})",
                response.status().as_u16()
            )));
        }
        let member: ApiMember = response.json().await?;
        Ok(TrackerIdentity {
            id: member.id,
            username: member.username,
            display_name: member.full_name,
        })
    }

    async fn fetch_boards(&self) -> Result<Vec<ApiBoard>> {
        let response = self
            .http
            .get(self.url("members/me/boards"))
            .query(&self.auth_params())
            .send()
            .await?;
        ensure_success(&response, "Trello boards")?;
        Ok(response.json().await?)
    }

    async fn fetch_lists(&self, board_id: &str) -> Result<Vec<ApiList>> {
        let response = self
            .http
            .get(self.url(&format!("boards/{}/lists", board_id)))
            .query(&self.auth_params())
            .send()
            .await?;
        ensure_success(&response, "Trello lists")?;
        Ok(response.json().await?)
    }

    async fn fetch_cards(&self, list_id: &str) -> Result<Vec<ApiCard>> {
        let response = self
            .http
            .get(self.url(&format!("lists/{}/cards", list_id)))
            .query(&self.auth_params())
            .send()
            .await?;
        ensure_success(&response, "Trello cards")?;
        Ok(response.json().await?)
    }

    async fn fetch_card_members(&self, card_id: &str) -> Result<Vec<ApiMemberRef>> {
        let response = self
            .http
            .get(self.url(&format!("cards/{}", card_id)))
            .query(&self.auth_params())
            .query(&[("fields", "all"), ("members", "true")])
            .send()
            .await?;
        ensure_success(&response, "Trello card detail")?;
        let detail: ApiCardDetail = response.json().await?;
        Ok(detail.members)
    }
}

/// Card completion is the `dueComplete` flag; assignment is membership of
/// the authenticated user among the card's members.
fn normalize_card(
    card: ApiCard,
    members: &[ApiMemberRef],
    list_name: &str,
    caller_id: &str,
) -> TrackerCard {
    let assigned_to_caller = members.iter().any(|m| m.id == caller_id);
    TrackerCard {
        id: card.id,
        name: card.name,
        description: card.desc,
        completed: card.due_complete,
        due_date: card.due,
        list_name: list_name.to_string(),
        assigned_to_caller,
        url: card.url,
    }
}

// =============================================================================
// Wire shapes (Trello REST v1)
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMember {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiMemberRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiBoard {
    id: String,
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiList {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCard {
    id: String,
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    due: Option<String>,
    #[serde(default)]
    due_complete: bool,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiCardDetail {
    #[serde(default)]
    members: Vec<ApiMemberRef>,
}
