//! Person research actions (name keyed).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::AgentRole;
use crate::ports::{ToolResult, Toolbox};
use crate::typed::{Action, ActionError, ActionHandler, ActionRegistry, RegistryError};

use super::ActionAgent;

pub const PERSON_INFO_TOOL: &str = "get_person_info";
pub const CAREER_TOOL: &str = "get_person_career_info";
pub const NEWS_TOOL: &str = "search_person_news";
pub const SOCIAL_MEDIA_TOOL: &str = "get_person_social_media";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPersonInfo {
    pub person_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCareerInfo {
    pub person_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNews {
    pub person_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSocialMedia {
    pub person_name: String,
}

/// `full_research` on the person agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonFullResearch {
    pub person_name: String,
}

/// Executive lookup issued by the coordinator; `title` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchExecutive {
    pub name: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub person_info: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerInfo {
    pub career_info: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsInfo {
    pub news_info: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialMedia {
    pub social_media: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonResearch {
    pub person_name: String,
    pub person_info: ToolResult,
    pub career_info: ToolResult,
    pub news_info: ToolResult,
    pub social_media: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveResearch {
    pub name: String,
    pub title: String,
    pub person_info: ToolResult,
    pub career_info: ToolResult,
}

impl Action for GetPersonInfo {
    const NAME: &'static str = "get_person_info";
    type Output = PersonInfo;
}

impl Action for GetCareerInfo {
    const NAME: &'static str = "get_career_info";
    type Output = CareerInfo;
}

impl Action for GetNews {
    const NAME: &'static str = "get_news";
    type Output = NewsInfo;
}

impl Action for GetSocialMedia {
    const NAME: &'static str = "get_social_media";
    type Output = SocialMedia;
}

impl Action for PersonFullResearch {
    const NAME: &'static str = "full_research";
    type Output = PersonResearch;
}

impl Action for ResearchExecutive {
    const NAME: &'static str = "research_executive";
    type Output = ExecutiveResearch;
}

#[derive(Clone)]
pub struct PersonTools {
    tools: Toolbox,
}

impl PersonTools {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }

    async fn lookup(&self, tool: &str, person_name: &str) -> ToolResult {
        tracing::debug!(tool, person_name, "person lookup");
        self.tools
            .invoke(tool, json!({ "person_name": person_name }))
            .await
    }
}

#[async_trait]
impl ActionHandler<GetPersonInfo> for PersonTools {
    async fn handle(&self, params: GetPersonInfo) -> Result<PersonInfo, ActionError> {
        Ok(PersonInfo {
            person_info: self.lookup(PERSON_INFO_TOOL, &params.person_name).await,
        })
    }
}

#[async_trait]
impl ActionHandler<GetCareerInfo> for PersonTools {
    async fn handle(&self, params: GetCareerInfo) -> Result<CareerInfo, ActionError> {
        Ok(CareerInfo {
            career_info: self.lookup(CAREER_TOOL, &params.person_name).await,
        })
    }
}

#[async_trait]
impl ActionHandler<GetNews> for PersonTools {
    async fn handle(&self, params: GetNews) -> Result<NewsInfo, ActionError> {
        Ok(NewsInfo {
            news_info: self.lookup(NEWS_TOOL, &params.person_name).await,
        })
    }
}

#[async_trait]
impl ActionHandler<GetSocialMedia> for PersonTools {
    async fn handle(&self, params: GetSocialMedia) -> Result<SocialMedia, ActionError> {
        Ok(SocialMedia {
            social_media: self.lookup(SOCIAL_MEDIA_TOOL, &params.person_name).await,
        })
    }
}

#[async_trait]
impl ActionHandler<PersonFullResearch> for PersonTools {
    async fn handle(&self, params: PersonFullResearch) -> Result<PersonResearch, ActionError> {
        tracing::info!(person_name = %params.person_name, "full person research");
        let name = params.person_name.as_str();
        let person_info = self.lookup(PERSON_INFO_TOOL, name).await;
        let career_info = self.lookup(CAREER_TOOL, name).await;
        let news_info = self.lookup(NEWS_TOOL, name).await;
        let social_media = self.lookup(SOCIAL_MEDIA_TOOL, name).await;
        Ok(PersonResearch {
            person_name: params.person_name,
            person_info,
            career_info,
            news_info,
            social_media,
        })
    }
}

#[async_trait]
impl ActionHandler<ResearchExecutive> for PersonTools {
    async fn handle(&self, params: ResearchExecutive) -> Result<ExecutiveResearch, ActionError> {
        tracing::info!(name = %params.name, title = %params.title, "researching executive");
        let person_info = self.lookup(PERSON_INFO_TOOL, &params.name).await;
        let career_info = self.lookup(CAREER_TOOL, &params.name).await;
        Ok(ExecutiveResearch {
            name: params.name,
            title: params.title,
            person_info,
            career_info,
        })
    }
}

pub fn person_actions(tools: Toolbox) -> Result<ActionRegistry, RegistryError> {
    let handler = PersonTools::new(tools);
    ActionRegistry::new()
        .with::<GetPersonInfo, _>(handler.clone())?
        .with::<GetCareerInfo, _>(handler.clone())?
        .with::<GetNews, _>(handler.clone())?
        .with::<GetSocialMedia, _>(handler.clone())?
        .with::<PersonFullResearch, _>(handler.clone())?
        .with::<ResearchExecutive, _>(handler)
}

/// Person agent bound to `role` (`person_agent` or `standard_person_agent`).
pub fn person_agent(role: AgentRole, tools: Toolbox) -> Result<ActionAgent, RegistryError> {
    Ok(ActionAgent::new(role, person_actions(tools)?))
}
